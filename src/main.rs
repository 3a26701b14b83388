use axum::{extract::Extension, routing::get, Router};
use campus_complaints::config::{self, dashboard::DashboardConfig, database::Database};
use campus_complaints::services::{
    auth::AuthService,
    bootstrap_admin,
    dashboard::{DashboardFeed, StoreSnapshotSource},
    feed::{spawn_auto_refresh, AutoRefresh},
};
use campus_complaints::{handlers, middleware, migration, routes, utils};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        // Complaint intake
        handlers::complaint::submit_complaint,
        handlers::complaint::complaint_options,
        // Auth routes
        handlers::auth::login,
        handlers::auth::session_status,
        handlers::auth::get_current_admin,
        handlers::auth::logout,
        // Admin routes
        handlers::admin::list_complaints,
        handlers::admin::get_complaint,
        handlers::admin::get_stats,
        handlers::admin::get_dashboard,
        handlers::admin::refresh_dashboard,
        // Export routes
        handlers::export::export_complaints,
        handlers::export::export_stats,
        handlers::export::export_summary,
    ),
    components(
        schemas(
            campus_complaints::response::ApiResponse<serde_json::Value>,
            campus_complaints::response::PageMeta,
            campus_complaints::error::AppError,
            campus_complaints::models::ComplaintModel,
            handlers::health::HealthResponse,
            // Complaints
            campus_complaints::services::complaint::SubmitComplaint,
            handlers::complaint::SubmitResponse,
            handlers::complaint::ComplaintOptions,
            // Auth
            handlers::auth::LoginRequest,
            handlers::auth::LoginResponse,
            handlers::auth::AdminResponse,
            handlers::auth::SessionResponse,
            // Admin
            handlers::admin::ComplaintListQuery,
            handlers::admin::ComplaintPage,
            handlers::admin::StatsQuery,
            handlers::admin::StatsResponse,
            handlers::admin::DashboardResponse,
            handlers::admin::RefreshResponse,
            campus_complaints::services::stats::CategoryStat,
            campus_complaints::services::stats::StatKey,
            campus_complaints::services::stats::RoundingPolicy,
            campus_complaints::services::dashboard::DashboardSnapshot,
            campus_complaints::services::feed::FeedError,
            // Export
            handlers::export::ComplaintExportQuery,
            handlers::export::StatsExportQuery,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "complaints", description = "Student complaint intake"),
        (name = "auth", description = "Admin session operations"),
        (name = "admin", description = "Dashboard, listing and statistics"),
        (name = "export", description = "CSV and report downloads"),
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campus_complaints=debug,tower_http=debug,axum=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;

    // Initialize JWT config
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Campus Complaints API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    prepare_store(&db).await;

    let dashboard_config = DashboardConfig::from_env();
    let feed: Arc<DashboardFeed> = Arc::new(DashboardFeed::new(StoreSnapshotSource::new(
        db.clone(),
        &dashboard_config,
    )));

    let auto_refresh: Option<AutoRefresh> = match dashboard_config.refresh_interval {
        Some(every) if db.is_configured() => {
            tracing::info!("Dashboard auto-refresh every {}s", every.as_secs());
            Some(spawn_auto_refresh(&feed, every))
        }
        _ => None,
    };

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(feed))
        .layer(Extension(dashboard_config));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(auto_refresh) = auto_refresh {
        auto_refresh.stop();
    }

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // A missing DATABASE_URL is allowed; the API then reports every store
    // operation as "database not configured".
    if env::var("DATABASE_URL").is_err() {
        tracing::warn!("DATABASE_URL is not set, complaint store disabled");
    }

    Ok(jwt_config)
}

/// Migrations, first admin and session cleanup. Failures are logged, not
/// fatal: the pool is lazy and the store may come up after the API does.
async fn prepare_store(db: &Database) {
    let Ok(conn) = db.conn() else {
        return;
    };

    if let Err(e) = migration::Migrator::up(conn, None).await {
        tracing::warn!("Database migrations failed: {}", e);
        return;
    }
    tracing::info!("Database migrations applied successfully");

    match bootstrap_admin::ensure_bootstrap_admin(conn).await {
        Ok(true) => tracing::info!("Bootstrap admin account is ready"),
        Ok(false) => {}
        Err(e) => tracing::warn!("Failed to create bootstrap admin: {}", e),
    }

    match AuthService::new(conn.clone()).purge_expired_sessions().await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Removed {} expired admin sessions", n),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {}", e),
    }
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(handlers::health::health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
