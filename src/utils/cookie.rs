use crate::config::parse_bool_env;
use axum::http::{header, HeaderMap};
use std::{env, sync::OnceLock};

pub const SESSION_COOKIE: &str = "admin_session";

#[derive(Debug, Clone)]
struct SessionCookieConfig {
    secure: bool,
    same_site: &'static str,
    domain: Option<String>,
}

impl SessionCookieConfig {
    fn from_env() -> Self {
        let same_site = parse_same_site(
            &env::var("SESSION_COOKIE_SAMESITE").unwrap_or_else(|_| "Lax".to_string()),
        );
        let mut secure = parse_bool_env("SESSION_COOKIE_SECURE", false);
        let domain = env::var("SESSION_COOKIE_DOMAIN")
            .ok()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        // Browsers require SameSite=None cookies to also be Secure.
        if same_site == "None" {
            secure = true;
        }

        Self {
            secure,
            same_site,
            domain,
        }
    }

    fn append_attributes(&self, cookie: &mut String) {
        if self.secure {
            cookie.push_str("; Secure");
        }

        if let Some(domain) = &self.domain {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
    }
}

fn session_cookie_config() -> &'static SessionCookieConfig {
    static CONFIG: OnceLock<SessionCookieConfig> = OnceLock::new();
    CONFIG.get_or_init(SessionCookieConfig::from_env)
}

fn parse_same_site(value: &str) -> &'static str {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

pub fn build_session_cookie(value: &str, max_age_seconds: u64) -> String {
    let config = session_cookie_config();
    let mut cookie = format!(
        "{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age_seconds}; HttpOnly; SameSite={}",
        config.same_site
    );
    config.append_attributes(&mut cookie);
    cookie
}

pub fn build_clear_cookie() -> String {
    let config = session_cookie_config();
    let mut cookie = format!(
        "{SESSION_COOKIE}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; SameSite={}",
        config.same_site
    );
    config.append_attributes(&mut cookie);
    cookie
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie_header| {
            cookie_header.split(';').find_map(|cookie| {
                let (key, value) = cookie.trim().split_once('=')?;
                if key.trim() == name && !value.trim().is_empty() {
                    Some(value.trim().to_string())
                } else {
                    None
                }
            })
        })
}
