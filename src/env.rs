//! Environment variable names read by
//! [`FacadeConfig::from_env`](crate::FacadeConfig::from_env).
//!
//! These are purely helpers; facades built with an explicit
//! [`FacadeConfig`](crate::FacadeConfig) never touch the environment.

/// Root logger name, e.g. `myapp`.
pub const NAME_ENV: &str = "TIERED_LOG_NAME";

/// Low-tier threshold, a case-insensitive level name.
pub const LOW_LEVEL_ENV: &str = "TIERED_LOG_LOW_LEVEL";

/// High-tier threshold, a case-insensitive level name.
pub const HIGH_LEVEL_ENV: &str = "TIERED_LOG_HIGH_LEVEL";

/// `true` forces the high tier to DEBUG, `false` to CRITICAL.
pub const VERBOSE_ENV: &str = "TIERED_LOG_VERBOSE";

/// `true` keeps high-tier records out of the low tier.
pub const MONOLOG_ENV: &str = "TIERED_LOG_MONOLOG";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a boolean flag value. `None` for anything unrecognized.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("nah"), None);
    }

    #[test]
    fn test_env_or_default() {
        assert_eq!(env_or("TIERED_LOG_SURELY_UNSET_FOR_TESTS", "fallback"), "fallback");
    }
}
