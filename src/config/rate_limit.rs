use super::parse_bool_env;
use std::{env, str::FromStr};
use thiserror::Error;

/// One token bucket: a token comes back every `per_second` seconds and at
/// most `burst_size` requests may go through back to back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

/// The route groups that get their own bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// Login and the session predicate
    Auth,
    /// Complaint submission and form options
    Submit,
    /// Everything behind the admin session gate
    Admin,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RateLimitParseError {
    #[error("expected <period>:<burst>, got '{0}'")]
    MalformedRule(String),
    #[error("'{0}' is not a positive whole number")]
    NotPositive(String),
    #[error("unknown route group '{0}' (use auth, submit or admin)")]
    UnknownGroup(String),
    #[error("empty value")]
    Empty,
}

fn positive<T: FromStr + PartialEq + Default>(raw: &str) -> Result<T, RateLimitParseError> {
    match raw.trim().parse::<T>() {
        Ok(v) if v != T::default() => Ok(v),
        _ => Err(RateLimitParseError::NotPositive(raw.trim().to_string())),
    }
}

impl FromStr for RateLimitRule {
    type Err = RateLimitParseError;

    /// `"10:20"`: one token every 10 seconds, bursts of 20.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let Some((period, burst)) = raw.trim().split_once(':') else {
            return Err(RateLimitParseError::MalformedRule(raw.trim().to_string()));
        };
        Ok(Self {
            per_second: positive(period)?,
            burst_size: positive(burst)?,
        })
    }
}

impl FromStr for RouteGroup {
    type Err = RateLimitParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auth" | "login" => Ok(RouteGroup::Auth),
            "submit" | "complaints" => Ok(RouteGroup::Submit),
            "admin" | "dashboard" => Ok(RouteGroup::Admin),
            _ => Err(RateLimitParseError::UnknownGroup(raw.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub submit: RateLimitRule,
    pub admin: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            // Slow enough to make password guessing tedious.
            auth: RateLimitRule {
                per_second: 5,
                burst_size: 10,
            },
            // A student filing a few complaints in a row.
            submit: RateLimitRule {
                per_second: 10,
                burst_size: 20,
            },
            // Dashboard polling plus manual refreshes and exports.
            admin: RateLimitRule {
                per_second: 1,
                burst_size: 60,
            },
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply_overrides(&raw) {
                tracing::warn!("Ignoring RATE_LIMIT_CONFIG '{}': {}", raw, err);
            }
        }
        cfg
    }

    pub fn rule_mut(&mut self, group: RouteGroup) -> &mut RateLimitRule {
        match group {
            RouteGroup::Auth => &mut self.auth,
            RouteGroup::Submit => &mut self.submit,
            RouteGroup::Admin => &mut self.admin,
        }
    }

    /// Either a bare `period:burst` applied to every group, or a list such
    /// as `auth=5:10;admin=1:120`. Nothing changes unless the whole value
    /// parses.
    pub fn apply_overrides(&mut self, raw: &str) -> Result<(), RateLimitParseError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RateLimitParseError::Empty);
        }

        if !raw.contains('=') {
            let rule: RateLimitRule = raw.parse()?;
            self.auth = rule;
            self.submit = rule;
            self.admin = rule;
            return Ok(());
        }

        let overrides = raw
            .split([';', ','])
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                let (group, rule) = item
                    .split_once('=')
                    .ok_or_else(|| RateLimitParseError::MalformedRule(item.to_string()))?;
                Ok((group.parse::<RouteGroup>()?, rule.parse::<RateLimitRule>()?))
            })
            .collect::<Result<Vec<_>, RateLimitParseError>>()?;

        for (group, rule) in overrides {
            *self.rule_mut(group) = rule;
        }
        Ok(())
    }
}
