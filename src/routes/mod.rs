use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::admin_gate;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public = public_routes(&rate_limit_config);
    let protected = protected_routes(&rate_limit_config).layer(middleware::from_fn(admin_gate));

    auth.merge(public).merge(protected)
}

/// Auth routes: login and the session predicate.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/login", routing::post(handlers::login))
        .route("/auth/session", routing::get(handlers::session_status));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public routes: the student submission form.
fn public_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/complaints",
            routing::post(handlers::complaint::submit_complaint),
        )
        .route(
            "/complaints/options",
            routing::get(handlers::complaint::complaint_options),
        );

    with_optional_rate_limit(router, config.enabled, config.submit)
}

/// Protected routes: everything behind the admin session gate.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_admin))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        // Complaints
        .route(
            "/admin/complaints",
            routing::get(handlers::admin::list_complaints),
        )
        .route(
            "/admin/complaints/{id}",
            routing::get(handlers::admin::get_complaint),
        )
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        // Dashboard
        .route(
            "/admin/dashboard",
            routing::get(handlers::admin::get_dashboard),
        )
        .route(
            "/admin/dashboard/refresh",
            routing::post(handlers::admin::refresh_dashboard),
        )
        // Export
        .route(
            "/admin/export/complaints",
            routing::get(handlers::export::export_complaints),
        )
        .route(
            "/admin/export/stats",
            routing::get(handlers::export::export_stats),
        )
        .route(
            "/admin/export/summary",
            routing::get(handlers::export::export_summary),
        );

    with_optional_rate_limit(router, config.enabled, config.admin)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!(?rule, "Invalid rate limit rule, serving without a limit");
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
