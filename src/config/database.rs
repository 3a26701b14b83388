use super::parse_env;
use crate::error::{AppError, AppResult};
use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseConnection, DbErr, Statement};
use std::env;
use std::time::Duration;

/// Handle to the complaint store.
///
/// The service still starts when `DATABASE_URL` is absent; every store
/// operation then fails with [`AppError::NotConfigured`] so callers can tell
/// "not set up" apart from "empty" and from "query failed".
#[derive(Clone, Debug)]
pub struct Database {
    conn: Option<DatabaseConnection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Connected,
    Unreachable,
    NotConfigured,
}

impl DatabaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseStatus::Connected => "connected",
            DatabaseStatus::Unreachable => "unreachable",
            DatabaseStatus::NotConfigured => "not_configured",
        }
    }
}

impl Database {
    pub fn connected(conn: DatabaseConnection) -> Self {
        Self { conn: Some(conn) }
    }

    pub fn not_configured() -> Self {
        Self { conn: None }
    }

    pub fn is_configured(&self) -> bool {
        self.conn.is_some()
    }

    pub fn conn(&self) -> AppResult<&DatabaseConnection> {
        self.conn.as_ref().ok_or(AppError::NotConfigured)
    }

    pub async fn status(&self) -> DatabaseStatus {
        let Some(conn) = &self.conn else {
            return DatabaseStatus::NotConfigured;
        };

        let probe = conn
            .query_one(Statement::from_string(
                conn.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await;

        match probe {
            Ok(_) => DatabaseStatus::Connected,
            Err(e) => {
                tracing::warn!("Database health probe failed: {}", e);
                DatabaseStatus::Unreachable
            }
        }
    }
}

/// Builds the pool from `DATABASE_URL`. The pool connects lazily, so an
/// unreachable server surfaces as retryable query errors instead of a
/// startup failure.
pub async fn get_database() -> Result<Database, DbErr> {
    let Ok(database_url) = env::var("DATABASE_URL") else {
        return Ok(Database::not_configured());
    };

    let max_connections: u32 = parse_env("DB_MAX_CONNECTIONS", 10);
    let min_connections: u32 = parse_env("DB_MIN_CONNECTIONS", 1);

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .connect_lazy(true)
        .sqlx_logging(true);

    let conn = sea_orm::Database::connect(opt).await?;
    Ok(Database::connected(conn))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_store_reports_not_configured() {
        let db = Database::not_configured();
        assert!(!db.is_configured());
        assert!(matches!(db.conn(), Err(AppError::NotConfigured)));
        assert_eq!(db.status().await, DatabaseStatus::NotConfigured);
        assert_eq!(DatabaseStatus::NotConfigured.as_str(), "not_configured");
    }
}
