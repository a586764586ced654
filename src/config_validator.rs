use crate::config::ConfigError;
use crate::validation::MAX_EXPIRY_HOURS;

/// Validates configuration objects for consistency and correctness
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a Redis URL
    pub fn validate_redis_url(url: &str) -> Result<(), ConfigError> {
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ConfigError::Invalid(
                "Redis URL must start with 'redis://' or 'rediss://'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates the public domain used to build short URLs
    pub fn validate_domain(domain: &str) -> Result<(), ConfigError> {
        if domain.trim().is_empty() {
            return Err(ConfigError::Invalid("Domain cannot be empty".to_string()));
        }

        if domain.contains("://") {
            return Err(ConfigError::Invalid(
                "Domain must not include a scheme".to_string(),
            ));
        }

        if domain.ends_with('/') {
            return Err(ConfigError::Invalid(
                "Domain must not end with '/'".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates quota and expiry parameters
    pub fn validate_quota(quota: u32, default_expiry_hours: u64) -> Result<(), ConfigError> {
        if quota == 0 {
            return Err(ConfigError::Invalid(
                "API quota must be greater than 0".to_string(),
            ));
        }

        if default_expiry_hours == 0 {
            return Err(ConfigError::Invalid(
                "Default expiry must be at least one hour".to_string(),
            ));
        }

        if default_expiry_hours > MAX_EXPIRY_HOURS {
            return Err(ConfigError::Invalid(format!(
                "Default expiry must not exceed {} hours",
                MAX_EXPIRY_HOURS
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_redis_url() {
        assert!(ConfigValidator::validate_redis_url("redis://localhost:6379").is_ok());
        assert!(ConfigValidator::validate_redis_url("rediss://localhost:6379").is_ok());
    }

    #[test]
    fn test_invalid_redis_url() {
        assert!(ConfigValidator::validate_redis_url("http://localhost:6379").is_err());
    }

    #[test]
    fn test_domain() {
        assert!(ConfigValidator::validate_domain("localhost:3000").is_ok());
        assert!(ConfigValidator::validate_domain("sho.rt").is_ok());
        assert!(ConfigValidator::validate_domain("").is_err());
        assert!(ConfigValidator::validate_domain("https://sho.rt").is_err());
        assert!(ConfigValidator::validate_domain("sho.rt/").is_err());
    }

    #[test]
    fn test_quota() {
        assert!(ConfigValidator::validate_quota(10, 24).is_ok());
        assert!(ConfigValidator::validate_quota(0, 24).is_err());
        assert!(ConfigValidator::validate_quota(10, 0).is_err());
        assert!(ConfigValidator::validate_quota(10, MAX_EXPIRY_HOURS + 1).is_err());
    }
}
