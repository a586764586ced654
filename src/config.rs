use crate::config_validator::ConfigValidator;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: SocketAddr,

    /// Redis connection URL; empty selects the in-memory store
    pub redis_url: String,

    /// Shorten operations allowed per client in each 30 minute window
    pub api_quota: u32,

    /// Public host prefixed to every returned short code
    pub domain: String,

    /// Mapping lifetime used when a request does not ask for one
    pub default_expiry_hours: u64,

    /// Take the client id from X-Forwarded-For / X-Real-IP
    pub trust_proxy_headers: bool,

    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            api_quota: 10,
            domain: "localhost:3000".to_string(),
            default_expiry_hours: 24,
            trust_proxy_headers: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            api_quota: parse_var("API_QUOTA", defaults.api_quota)?,
            domain: env::var("DOMAIN").unwrap_or(defaults.domain),
            default_expiry_hours: parse_var("DEFAULT_EXPIRY_HOURS", defaults.default_expiry_hours)?,
            trust_proxy_headers: parse_var("TRUST_PROXY_HEADERS", defaults.trust_proxy_headers)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.redis_url.is_empty() {
            ConfigValidator::validate_redis_url(&self.redis_url)?;
        }
        ConfigValidator::validate_domain(&self.domain)?;
        ConfigValidator::validate_quota(self.api_quota, self.default_expiry_hours)?;
        Ok(())
    }

    /// Whether mappings and counters live in process instead of Redis
    pub fn uses_memory_store(&self) -> bool {
        self.redis_url.is_empty()
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.api_quota, 10);
        assert_eq!(config.default_expiry_hours, 24);
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn test_empty_redis_url_selects_memory() {
        let config = Config {
            redis_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.uses_memory_store());
    }

    #[test]
    fn test_zero_quota_is_rejected() {
        let config = Config {
            api_quota: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
