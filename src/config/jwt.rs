use super::parse_env;
use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub session_expiry: u64, // 8 hours
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters"
            ));
        }

        let session_expiry = parse_env("JWT_SESSION_EXPIRATION", 28_800u64);

        Ok(Self {
            secret,
            session_expiry,
        })
    }
}
