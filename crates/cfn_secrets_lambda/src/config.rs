//! Process configuration, read once from the environment at start-up.

use std::time::Duration;

use thiserror::Error;

pub const LOG_FILTER_ENV: &str = "RUST_LOG";
pub const RESPONSE_TIMEOUT_ENV: &str = "CFN_RESPONSE_TIMEOUT_SECS";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidPositiveInteger { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub log_filter: String,
    pub response_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_filter = lookup(LOG_FILTER_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        let response_timeout = match lookup(RESPONSE_TIMEOUT_ENV) {
            None => defaults.response_timeout,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(seconds) if seconds > 0 => Duration::from_secs(seconds),
                _ => {
                    return Err(ConfigError::InvalidPositiveInteger {
                        name: RESPONSE_TIMEOUT_ENV,
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            log_filter,
            response_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[])).expect("defaults are valid");
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("RUST_LOG", "debug,hyper=warn"),
            ("CFN_RESPONSE_TIMEOUT_SECS", "5"),
        ]))
        .expect("overrides are valid");

        assert_eq!(config.log_filter, "debug,hyper=warn");
        assert_eq!(config.response_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_zero_or_malformed_timeout() {
        for raw in ["0", "soon", "-3"] {
            let error = RuntimeConfig::from_lookup(lookup_from(&[(
                "CFN_RESPONSE_TIMEOUT_SECS",
                raw,
            )]))
            .expect_err("timeout should be rejected");
            assert_eq!(
                error,
                ConfigError::InvalidPositiveInteger {
                    name: RESPONSE_TIMEOUT_ENV,
                    value: raw.to_string(),
                }
            );
        }
    }
}
