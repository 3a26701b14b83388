use crate::config::database::{Database, DatabaseStatus};
use axum::{response::IntoResponse, Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// ok, degraded or not_configured
    pub status: String,
    /// connected, unreachable or not_configured
    pub database: String,
    pub service: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(Extension(db): Extension<Database>) -> impl IntoResponse {
    let database = db.status().await;

    let status = match database {
        DatabaseStatus::Connected => "ok",
        DatabaseStatus::Unreachable => "degraded",
        DatabaseStatus::NotConfigured => "not_configured",
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: database.as_str().to_string(),
        service: "Campus Complaints API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
