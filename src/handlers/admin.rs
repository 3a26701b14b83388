use crate::config::dashboard::DashboardConfig;
use crate::config::database::Database;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthAdmin;
use crate::models::ComplaintModel;
use crate::response::{ApiResponse, PageMeta};
use crate::services::complaint::{CategoryFilter, ComplaintService, PageRequest};
use crate::services::dashboard::{DashboardFeed, DashboardSnapshot};
use crate::services::feed::{FeedError, FeedView, RefreshOutcome};
use crate::services::stats::{self, CategoryStat, RoundingPolicy, StatKey};
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ComplaintListQuery {
    pub page: Option<u64>,
    #[serde(alias = "limit", alias = "pageSize")]
    pub per_page: Option<u64>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintPage {
    pub complaints: Vec<ComplaintModel>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatsQuery {
    pub by: Option<StatKey>,
    pub rounding: Option<RoundingPolicy>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub by: StatKey,
    pub total: u64,
    pub stats: Vec<CategoryStat>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub snapshot: Option<DashboardSnapshot>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<FeedError>,
    pub refreshing: bool,
}

impl From<FeedView<DashboardSnapshot>> for DashboardResponse {
    fn from(view: FeedView<DashboardSnapshot>) -> Self {
        Self {
            snapshot: view.snapshot.as_deref().cloned(),
            refreshed_at: view.refreshed_at,
            last_error: view.last_error,
            refreshing: view.refreshing,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// applied, failed or superseded
    pub outcome: String,
    pub dashboard: DashboardResponse,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/complaints",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number, starting at 1"),
        ("per_page" = Option<u64>, Query, description = "Items per page (alias: limit, pageSize)"),
        ("category" = Option<String>, Query, description = "Exact category, or `all`"),
    ),
    responses(
        (status = 200, description = "One page of complaints, newest first", body = ComplaintPage),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 503, description = "Store unavailable; safe to retry", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_complaints(
    Extension(db): Extension<Database>,
    Extension(config): Extension<DashboardConfig>,
    _admin: AuthAdmin,
    Query(params): Query<ComplaintListQuery>,
) -> AppResult<impl IntoResponse> {
    let request = PageRequest::new(
        params.page,
        config.per_page(params.per_page),
        CategoryFilter::parse(params.category.as_deref()),
    );

    let service = ComplaintService::new(db.conn()?.clone());
    let (complaints, meta) = service.fetch_page(&request).await?;

    Ok(ApiResponse::ok(ComplaintPage { complaints, meta }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/complaints/{id}",
    security(("jwt_token" = [])),
    params(("id" = Uuid, Path, description = "Complaint ID")),
    responses(
        (status = 200, description = "Complaint", body = ComplaintModel),
        (status = 404, description = "No such complaint", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_complaint(
    Extension(db): Extension<Database>,
    _admin: AuthAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let service = ComplaintService::new(db.conn()?.clone());
    let complaint = service.find_by_id(id).await?;
    Ok(ApiResponse::ok(complaint))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    security(("jwt_token" = [])),
    params(
        ("by" = Option<StatKey>, Query, description = "category (default) or priority"),
        ("rounding" = Option<RoundingPolicy>, Query, description = "independent (default) or largest_remainder"),
        ("category" = Option<String>, Query, description = "Restrict to one category"),
    ),
    responses(
        (status = 200, description = "Counts and percentages, largest first", body = StatsResponse),
        (status = 503, description = "Store unavailable; safe to retry", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(db): Extension<Database>,
    _admin: AuthAdmin,
    Query(params): Query<StatsQuery>,
) -> AppResult<impl IntoResponse> {
    let by = params.by.unwrap_or_default();
    let filter = CategoryFilter::parse(params.category.as_deref());

    let service = ComplaintService::new(db.conn()?.clone());
    let complaints = service.list_all(&filter).await?;

    Ok(ApiResponse::ok(StatsResponse {
        by,
        total: complaints.len() as u64,
        stats: stats::aggregate_with(&complaints, by, params.rounding.unwrap_or_default()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/dashboard",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Last good snapshot plus the last refresh error, if any", body = DashboardResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_dashboard(
    Extension(feed): Extension<Arc<DashboardFeed>>,
    _admin: AuthAdmin,
) -> AppResult<impl IntoResponse> {
    let mut view = feed.view().await;
    if view.is_pristine() {
        feed.refresh().await;
        view = feed.view().await;
    }
    Ok(ApiResponse::ok(DashboardResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/dashboard/refresh",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Refresh settled; see outcome", body = RefreshResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "admin"
)]
pub async fn refresh_dashboard(
    Extension(feed): Extension<Arc<DashboardFeed>>,
    admin: AuthAdmin,
) -> AppResult<impl IntoResponse> {
    let outcome = match feed.refresh().await {
        RefreshOutcome::Applied => "applied",
        RefreshOutcome::Failed(_) => "failed",
        RefreshOutcome::Superseded => "superseded",
    };
    tracing::debug!(admin_id = admin.admin_id, outcome, "Dashboard refresh requested");

    Ok(ApiResponse::ok(RefreshResponse {
        outcome: outcome.to_string(),
        dashboard: DashboardResponse::from(feed.view().await),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Uri;

    #[test]
    fn list_query_accepts_page_size_aliases() {
        let uri: Uri = "/admin/complaints?page=2&limit=25&category=Water".parse().unwrap();
        let Query(q) = Query::<ComplaintListQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.page, Some(2));
        assert_eq!(q.per_page, Some(25));
        assert_eq!(q.category.as_deref(), Some("Water"));

        let uri: Uri = "/admin/complaints?pageSize=10".parse().unwrap();
        let Query(q) = Query::<ComplaintListQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.per_page, Some(10));
        assert_eq!(q.page, None);
    }

    #[test]
    fn stats_query_parses_snake_case_enums() {
        let uri: Uri = "/admin/stats?by=priority&rounding=largest_remainder".parse().unwrap();
        let Query(q) = Query::<StatsQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(q.by, Some(StatKey::Priority));
        assert_eq!(q.rounding, Some(RoundingPolicy::LargestRemainder));
    }
}
