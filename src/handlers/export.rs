use crate::config::dashboard::DashboardConfig;
use crate::config::database::Database;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthAdmin;
use crate::services::complaint::{CategoryFilter, ComplaintService, PageRequest};
use crate::services::export::{self, CsvOptions};
use crate::services::stats::{self, RoundingPolicy, StatKey};
use axum::{
    extract::Query,
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;
use utoipa::ToSchema;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComplaintExportQuery {
    pub category: Option<String>,
    /// Export only this page of the listing instead of every match
    pub page: Option<u64>,
    #[serde(alias = "limit", alias = "pageSize")]
    pub per_page: Option<u64>,
    pub bom: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatsExportQuery {
    pub by: Option<StatKey>,
    pub rounding: Option<RoundingPolicy>,
    pub bom: Option<bool>,
}

fn attachment(content_type: &'static str, filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/export/complaints",
    security(("jwt_token" = [])),
    params(
        ("category" = Option<String>, Query, description = "Exact category, or `all`"),
        ("page" = Option<u64>, Query, description = "Export a single page"),
        ("per_page" = Option<u64>, Query, description = "Page size when `page` is set"),
        ("bom" = Option<bool>, Query, description = "Prefix a UTF-8 BOM"),
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv", body = String),
        (status = 503, description = "Store unavailable; safe to retry", body = AppError),
    ),
    tag = "export"
)]
pub async fn export_complaints(
    Extension(db): Extension<Database>,
    Extension(config): Extension<DashboardConfig>,
    admin: AuthAdmin,
    Query(params): Query<ComplaintExportQuery>,
) -> AppResult<Response> {
    let filter = CategoryFilter::parse(params.category.as_deref());
    let service = ComplaintService::new(db.conn()?.clone());

    let complaints = match params.page {
        Some(page) => {
            let request = PageRequest::new(Some(page), config.per_page(params.per_page), filter.clone());
            service.fetch_page(&request).await?.0
        }
        None => service.list_all(&filter).await?,
    };

    let options = CsvOptions {
        bom: params.bom.unwrap_or(config.csv_bom),
    };
    let body = export::complaints_to_csv(&complaints, options)?;
    let filename = export::csv_filename(&filter, params.page.map(|p| p.max(1)));

    tracing::info!(
        admin_id = admin.admin_id,
        category = filter.label().unwrap_or("all"),
        rows = complaints.len(),
        filename = %filename,
        "Complaint CSV exported"
    );
    Ok(attachment(CSV_CONTENT_TYPE, &filename, body))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/export/stats",
    security(("jwt_token" = [])),
    params(
        ("by" = Option<StatKey>, Query, description = "category (default) or priority"),
        ("rounding" = Option<RoundingPolicy>, Query, description = "independent (default) or largest_remainder"),
        ("bom" = Option<bool>, Query, description = "Prefix a UTF-8 BOM"),
    ),
    responses(
        (status = 200, description = "CSV download", content_type = "text/csv", body = String),
        (status = 503, description = "Store unavailable; safe to retry", body = AppError),
    ),
    tag = "export"
)]
pub async fn export_stats(
    Extension(db): Extension<Database>,
    Extension(config): Extension<DashboardConfig>,
    _admin: AuthAdmin,
    Query(params): Query<StatsExportQuery>,
) -> AppResult<Response> {
    let by = params.by.unwrap_or_default();
    let service = ComplaintService::new(db.conn()?.clone());
    let complaints = service.list_all(&CategoryFilter::All).await?;

    let stats = stats::aggregate_with(&complaints, by, params.rounding.unwrap_or_default());
    let body = export::stats_to_csv(
        &stats,
        CsvOptions {
            bom: params.bom.unwrap_or(config.csv_bom),
        },
    )?;

    Ok(attachment(CSV_CONTENT_TYPE, &export::stats_filename(by), body))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/export/summary",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Plain-text summary download", content_type = "text/plain", body = String),
        (status = 503, description = "Store unavailable; safe to retry", body = AppError),
    ),
    tag = "export"
)]
pub async fn export_summary(
    Extension(db): Extension<Database>,
    _admin: AuthAdmin,
) -> AppResult<Response> {
    let service = ComplaintService::new(db.conn()?.clone());
    let complaints = service.list_all(&CategoryFilter::All).await?;

    let now = chrono::Utc::now().naive_utc();
    let body = export::summary_report(&complaints, now);

    Ok(attachment(
        TEXT_CONTENT_TYPE,
        &export::summary_filename(now.date()),
        body,
    ))
}
