use crate::config::complaints::{complaint_config, PRIORITIES};
use crate::config::database::Database;
use crate::error::{AppError, AppResult};
use crate::response::ApiResponse;
use crate::services::complaint::{validate_submission, ComplaintService, SubmitComplaint};
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintOptions {
    pub categories: Vec<String>,
    pub priorities: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/complaints",
    request_body = SubmitComplaint,
    responses(
        (status = 201, description = "Complaint recorded", body = SubmitResponse),
        (status = 400, description = "Per-field validation errors", body = AppError),
        (status = 503, description = "Store unavailable or not configured", body = AppError),
    ),
    tag = "complaints"
)]
pub async fn submit_complaint(
    Extension(db): Extension<Database>,
    Json(payload): Json<SubmitComplaint>,
) -> AppResult<impl IntoResponse> {
    // Validation never touches the store.
    let draft = validate_submission(&payload, complaint_config())?;

    let service = ComplaintService::new(db.conn()?.clone());
    let complaint = service.create(draft).await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            SubmitResponse {
                id: complaint.id,
                created_at: complaint.created_at,
            },
            "Complaint submitted successfully".to_string(),
        ),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/complaints/options",
    responses(
        (status = 200, description = "Selectable categories and priorities", body = ComplaintOptions),
    ),
    tag = "complaints"
)]
pub async fn complaint_options() -> AppResult<impl IntoResponse> {
    let config = complaint_config();
    Ok(ApiResponse::ok(ComplaintOptions {
        categories: config.categories.clone(),
        priorities: PRIORITIES.iter().map(|p| p.to_string()).collect(),
    }))
}
