use crate::{
    error::{AppError, AppResult},
    models::{admin, admin_session, Admin, AdminModel, AdminSession},
    utils::{
        decode_session_token, encode_session_token, hash_password, hash_session_id,
        jwt::session_expiry_seconds, verify_password,
    },
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::OnceLock;

/// Hash checked against when the email is unknown, so both login failures
/// pay for one bcrypt verification.
fn decoy_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password("decoy password for unknown admins").unwrap_or_default())
}

/// An admin whose session token was checked against the store.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub admin: AdminModel,
    pub session_id: String,
}

pub struct AuthService {
    db: DatabaseConnection,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Login admin
    /// Returns (admin_model, session_token)
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(AdminModel, String)> {
        let email = email.trim().to_lowercase();

        let Some(admin) = Admin::find()
            .filter(admin::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await?
        else {
            let _ = verify_password(password, decoy_hash());
            tracing::warn!("Admin login failed: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        // A corrupt hash is reported the same way as a wrong password.
        let is_valid = verify_password(password, &admin.password_hash).unwrap_or(false);
        if !is_valid {
            tracing::warn!(admin_id = admin.id, "Admin login failed: wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_session(admin.id).await?;
        tracing::info!(admin_id = admin.id, "Admin logged in");
        Ok((admin, token))
    }

    async fn issue_session(&self, admin_id: i32) -> AppResult<String> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let token = encode_session_token(admin_id, &session_id)?;

        let now = chrono::Utc::now().naive_utc();
        let expires_at = now + chrono::Duration::seconds(session_expiry_seconds() as i64);

        let session = admin_session::ActiveModel {
            admin_id: sea_orm::ActiveValue::Set(admin_id),
            token_hash: sea_orm::ActiveValue::Set(hash_session_id(&session_id)),
            expires_at: sea_orm::ActiveValue::Set(expires_at),
            created_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };
        session.insert(&self.db).await?;

        Ok(token)
    }

    /// Verifies signature and expiry, then confirms the session row still
    /// exists. Store failures propagate so an outage is not mistaken for a
    /// signed-out admin.
    pub async fn authenticate(&self, token: &str) -> AppResult<VerifiedSession> {
        let claims = decode_session_token(token).map_err(|_| AppError::Unauthorized)?;
        let admin_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

        let session = AdminSession::find()
            .filter(admin_session::Column::TokenHash.eq(hash_session_id(&claims.sid)))
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if session.admin_id != admin_id {
            return Err(AppError::Unauthorized);
        }

        let now = chrono::Utc::now().naive_utc();
        if session.expires_at <= now {
            if let Err(e) = AdminSession::delete_by_id(session.id).exec(&self.db).await {
                tracing::warn!(
                    session_row = session.id,
                    "Failed to drop expired session: {}",
                    e
                );
            }
            return Err(AppError::Unauthorized);
        }

        let admin = Admin::find_by_id(admin_id)
            .one(&self.db)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(VerifiedSession {
            admin,
            session_id: claims.sid,
        })
    }

    /// Deletes the session row; the same token fails `authenticate` afterwards.
    pub async fn logout(&self, session_id: &str) -> AppResult<()> {
        let result = AdminSession::delete_many()
            .filter(admin_session::Column::TokenHash.eq(hash_session_id(session_id)))
            .exec(&self.db)
            .await?;
        tracing::info!(revoked = result.rows_affected, "Admin session revoked");
        Ok(())
    }

    /// Drops every expired session row.
    pub async fn purge_expired_sessions(&self) -> AppResult<u64> {
        let now = chrono::Utc::now().naive_utc();
        let result = AdminSession::delete_many()
            .filter(admin_session::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
