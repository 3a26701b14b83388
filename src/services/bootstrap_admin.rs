use crate::config::parse_bool_env;
use crate::error::AppResult;
use crate::models::{admin, Admin};
use crate::utils::hash_password;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        let name = env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
        let email = env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?;
        let password = env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?;

        Some(Self {
            name,
            email: email.trim().to_lowercase(),
            password,
        })
    }
}

/// 启动时自动创建管理员：
/// - 若库中已存在任意 admin：不做任何事
/// - 否则用配置的 name/email/password 创建第一个 admin
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<bool> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(false);
    };
    create_first_admin(db, cfg).await
}

pub async fn create_first_admin(db: &DatabaseConnection, cfg: BootstrapAdminConfig) -> AppResult<bool> {
    if Admin::find().count(db).await? > 0 {
        return Ok(false);
    }

    let new_admin = admin::ActiveModel {
        name: sea_orm::ActiveValue::Set(cfg.name),
        email: sea_orm::ActiveValue::Set(cfg.email),
        password_hash: sea_orm::ActiveValue::Set(hash_password(&cfg.password)?),
        created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    let admin = new_admin.insert(db).await?;
    tracing::info!(admin_id = admin.id, "Bootstrap admin created");
    Ok(true)
}
