#![allow(dead_code)]

use campus_complaints::config::dashboard::DashboardConfig;
use campus_complaints::config::database::Database;
use campus_complaints::models::{admin, complaint, Complaint};
use campus_complaints::services::dashboard::{DashboardFeed, StoreSnapshotSource};
use reqwest::Client;
use sea_orm::{ActiveValue::Set, ConnectionTrait, DatabaseConnection, EntityTrait, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Once,
};
use tokio::sync::{Mutex, MutexGuard};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
// Tests sharing the database run one at a time.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub const ADMIN_EMAIL: &str = "dss-admin@uni.test";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("DASHBOARD_REFRESH_SECONDS", "0");
        std::env::set_var("ENABLE_HSTS", "false");
        let config = campus_complaints::config::jwt::JwtConfig::from_env().unwrap();
        let _ = campus_complaints::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: Database,
    pub client: Client,
    _guard: Option<MutexGuard<'static, ()>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    pub fn conn(&self) -> &DatabaseConnection {
        self.db.conn().expect("test app has no database")
    }
}

fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
}

/// App backed by the test database, or `None` when no database is
/// configured for this run.
pub async fn spawn_app() -> Option<TestApp> {
    init_env();
    let database_url = test_database_url()?;
    let guard = DB_LOCK.lock().await;

    let conn = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally (using atomic bool for thread safety)
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        campus_complaints::migration::Migrator::up(&conn, None)
            .await
            .expect("Failed to run migrations");
    }

    cleanup_tables(&conn).await;

    Some(serve(Database::connected(conn), Some(guard)).await)
}

/// App running in "database not configured" mode.
pub async fn spawn_app_without_db() -> TestApp {
    init_env();
    serve(Database::not_configured(), None).await
}

async fn serve(db: Database, guard: Option<MutexGuard<'static, ()>>) -> TestApp {
    let config = DashboardConfig::from_env();
    let feed = Arc::new(DashboardFeed::new(StoreSnapshotSource::new(
        db.clone(),
        &config,
    )));

    let app = axum::Router::new()
        .route(
            "/",
            axum::routing::get(campus_complaints::handlers::health::health_check),
        )
        .merge(campus_complaints::routes::create_routes())
        .layer(axum::middleware::from_fn(
            campus_complaints::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(feed))
        .layer(axum::extract::Extension(config));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        _guard: guard,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    for table in ["admin_sessions", "admins", "complaints"] {
        let sql = format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Insert an admin directly and return its id.
pub async fn create_admin(app: &TestApp, email: &str, password: &str) -> i32 {
    let model = admin::ActiveModel {
        name: Set("DSS Admin".to_string()),
        email: Set(email.to_string()),
        password_hash: Set(campus_complaints::utils::hash_password(password).unwrap()),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let res = admin::Entity::insert(model)
        .exec(app.conn())
        .await
        .expect("Failed to insert admin");
    res.last_insert_id
}

/// Create the default admin and log in; returns the session token.
pub async fn admin_token(app: &TestApp) -> String {
    create_admin(app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    login(app, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse login response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Login failed: status={}, body={}", status, body);
    }

    body["data"]["token"]
        .as_str()
        .expect("Login response missing token")
        .to_string()
}

/// Insert `count` complaints in `category`, one minute apart starting at
/// `start_minute`, so the newest-first order is predictable.
pub async fn seed_complaints(app: &TestApp, category: &str, count: usize, start_minute: i64) {
    let base = chrono::NaiveDate::from_ymd_opt(2026, 9, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();

    let models: Vec<complaint::ActiveModel> = (0..count)
        .map(|i| {
            let anonymous = i % 2 == 0;
            complaint::ActiveModel {
                id: Set(uuid::Uuid::new_v4()),
                category: Set(category.to_string()),
                title: Set(format!("{category} complaint {i}")),
                details: Set("Seeded for tests".to_string()),
                priority: Set(None),
                is_anonymous: Set(anonymous),
                student_name: Set((!anonymous).then(|| format!("Student {i}"))),
                student_email: Set((!anonymous).then(|| format!("student{i}@uni.test"))),
                student_id: Set((!anonymous).then(|| format!("S-{i}"))),
                created_at: Set(base + chrono::Duration::minutes(start_minute + i as i64)),
            }
        })
        .collect();

    if models.is_empty() {
        return;
    }
    Complaint::insert_many(models)
        .exec(app.conn())
        .await
        .expect("Failed to seed complaints");
}

pub async fn complaint_count(app: &TestApp) -> u64 {
    use sea_orm::PaginatorTrait;
    Complaint::find().count(app.conn()).await.unwrap()
}
