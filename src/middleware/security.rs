use crate::config::parse_bool_env;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::OnceLock;

// JSON and file downloads only; nothing here should ever be rendered as a page.
const API_CSP_POLICY: &str = "default-src 'none'; frame-ancestors 'none'";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

fn hsts_enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| parse_bool_env("ENABLE_HSTS", true))
}

/// Admin and auth responses carry student identity or session tokens.
fn is_private_path(path: &str) -> bool {
    path.starts_with("/api/v1/admin") || path.starts_with("/api/v1/auth")
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let private = is_private_path(request.uri().path());
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));

    if private {
        headers.insert(
            "content-security-policy",
            HeaderValue::from_static(API_CSP_POLICY),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    if hsts_enabled() {
        headers.insert(
            "strict-transport-security",
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}
