use crate::{
    config::database::Database,
    error::AppError,
    services::auth::AuthService,
    utils::cookie::{extract_cookie, SESSION_COOKIE},
};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

/// Admin identity attached to requests that passed the session gate.
#[derive(Debug, Clone)]
pub struct AuthAdmin {
    pub admin_id: i32,
    pub name: String,
    pub email: String,
    pub session_id: String,
}

/// Session gate middleware
///
/// Checks the session token on every request: signature and expiry first,
/// then the server-side session row. Nothing the client stores is trusted
/// on its own.
pub async fn admin_gate(
    Extension(db): Extension<Database>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&headers).ok_or(AppError::Unauthorized)?;

    let service = AuthService::new(db.conn()?.clone());
    let session = service.authenticate(&token).await?;

    request.extensions_mut().insert(AuthAdmin {
        admin_id: session.admin.id,
        name: session.admin.name,
        email: session.admin.email,
        session_id: session.session_id,
    });

    Ok(next.run(request).await)
}

/// Prefer Authorization: Bearer, fallback to HttpOnly cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie(headers, SESSION_COOKIE))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthAdmin>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
