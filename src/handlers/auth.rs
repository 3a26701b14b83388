use crate::config::database::Database;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::session_token;
use crate::middleware::AuthAdmin;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::utils::cookie::{build_clear_cookie, build_session_cookie};
use crate::utils::jwt::session_expiry_seconds;
use anyhow::anyhow;
use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Where the dashboard sends a visitor whose session check came back false.
pub const LOGIN_PATH: &str = "/admin/login";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Admin email address
    #[serde(default)]
    pub email: String,
    /// Admin password
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<&AuthAdmin> for AdminResponse {
    fn from(admin: &AuthAdmin) -> Self {
        Self {
            id: admin.admin_id,
            name: admin.name.clone(),
            email: admin.email.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Signed session token, also set as an HttpOnly cookie
    pub token: String,
    pub expires_in: u64,
    pub admin: AdminResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminResponse>,
    pub login_path: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing email or password", body = AppError),
        (status = 401, description = "Invalid credentials", body = AppError),
        (status = 503, description = "Store unavailable", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<Database>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    }

    let service = AuthService::new(db.conn()?.clone());
    let (admin, token) = service.login(&payload.email, &payload.password).await?;

    let expires_in = session_expiry_seconds();
    let response = LoginResponse {
        token: token.clone(),
        expires_in,
        admin: AdminResponse {
            id: admin.id,
            name: admin.name,
            email: admin.email,
        },
    };

    let mut http_response = ApiResponse::ok(response).into_response();
    append_set_cookie(&mut http_response, &build_session_cookie(&token, expires_in))?;
    Ok(http_response)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    responses(
        (status = 200, description = "Whether the caller holds a live admin session", body = SessionResponse),
        (status = 503, description = "Store unavailable", body = AppError),
    ),
    tag = "auth"
)]
pub async fn session_status(
    Extension(db): Extension<Database>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let signed_out = SessionResponse {
        authenticated: false,
        admin: None,
        login_path: LOGIN_PATH.to_string(),
    };

    let Some(token) = session_token(&headers) else {
        return Ok(ApiResponse::ok(signed_out));
    };
    // No store means no admins, so nobody can be signed in.
    let Ok(conn) = db.conn() else {
        return Ok(ApiResponse::ok(signed_out));
    };

    match AuthService::new(conn.clone()).authenticate(&token).await {
        Ok(session) => Ok(ApiResponse::ok(SessionResponse {
            authenticated: true,
            admin: Some(AdminResponse {
                id: session.admin.id,
                name: session.admin.name,
                email: session.admin.email,
            }),
            login_path: LOGIN_PATH.to_string(),
        })),
        Err(AppError::Unauthorized) => Ok(ApiResponse::ok(signed_out)),
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current admin", body = AdminResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_admin(auth_admin: AuthAdmin) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::ok(AdminResponse::from(&auth_admin)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Session revoked", body = String),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<Database>,
    auth_admin: AuthAdmin,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db.conn()?.clone());
    service.logout(&auth_admin.session_id).await?;

    let mut response = ApiResponse::ok("Logout successful").into_response();
    append_set_cookie(&mut response, &build_clear_cookie())?;
    Ok(response)
}

fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}
