pub mod complaints;
pub mod dashboard;
pub mod database;
pub mod jwt;
pub mod rate_limit;

use std::{env, str::FromStr};

/// Reads a boolean flag, accepting the usual yes/no spellings.
pub(crate) fn parse_bool_env(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(default)
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_env<T: FromStr>(var_name: &str, default: T) -> T {
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn missing_env_falls_back_to_default() {
        assert_eq!(parse_env("CAMPUS_COMPLAINTS_UNSET_FOR_TEST", 42u64), 42);
        assert!(parse_bool_env("CAMPUS_COMPLAINTS_UNSET_FOR_TEST", true));
    }
}
