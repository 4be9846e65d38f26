//! Environment-driven configuration
//!
//! Loads the quote provider credential and HTTP tuning knobs from the
//! process environment, with `.env` file support for development. A missing
//! credential is carried as `None` and surfaced per request as a typed
//! error, never as a startup failure.

use std::env;
use std::time::Duration;

/// Environment variable holding the quote provider credential
pub const API_KEY_VAR: &str = "ALPHA_VANTAGE_API_KEY";

/// Environment variable overriding the HTTP request timeout, in seconds
const HTTP_TIMEOUT_VAR: &str = "NEWSDESK_HTTP_TIMEOUT_SECS";

/// Deadline applied to every outbound HTTP request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration shared by both API clients
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential for the quote provider, if configured
    pub alpha_vantage_api_key: Option<String>,
    /// Timeout for individual HTTP requests
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// Reads a `.env` file first when one exists; variables already set in
    /// the environment take precedence. An empty or whitespace-only API key
    /// is treated as unset.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup
    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let alpha_vantage_api_key = get(API_KEY_VAR).filter(|key| !key.trim().is_empty());
        let http_timeout = get(HTTP_TIMEOUT_VAR)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);

        Self {
            alpha_vantage_api_key,
            http_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_is_none() {
        let config = Config::from_vars(vars(&[]));
        assert!(config.alpha_vantage_api_key.is_none());
    }

    #[test]
    fn test_empty_api_key_is_treated_as_unset() {
        let config = Config::from_vars(vars(&[(API_KEY_VAR, "   ")]));
        assert!(config.alpha_vantage_api_key.is_none());
    }

    #[test]
    fn test_api_key_is_read() {
        let config = Config::from_vars(vars(&[(API_KEY_VAR, "demo")]));
        assert_eq!(config.alpha_vantage_api_key.as_deref(), Some("demo"));
    }

    #[test]
    fn test_http_timeout_defaults() {
        let config = Config::from_vars(vars(&[]));
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }

    #[test]
    fn test_http_timeout_override() {
        let config = Config::from_vars(vars(&[(HTTP_TIMEOUT_VAR, "30")]));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_malformed_http_timeout_falls_back_to_default() {
        let config = Config::from_vars(vars(&[(HTTP_TIMEOUT_VAR, "soon")]));
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
    }
}
