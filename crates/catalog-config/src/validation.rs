//! Configuration validation.
//!
//! Collects every problem in one pass so startup fails with the full list
//! instead of the first error.

use crate::{AppConfig, CacheConfig, DatabaseConfig, ObservabilityConfig, PaginationConfig, RedisConfig, SecurityConfig, ServerConfig};
use thiserror::Error;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("JWT secret too short: {actual} characters (minimum {minimum})")]
    JwtSecretTooShort { actual: usize, minimum: usize },

    #[error("Invalid port for {name}: {value} (must be 1-65535)")]
    InvalidPort { name: String, value: u16 },

    #[error("Invalid pool size: min ({min}) cannot be greater than max ({max})")]
    InvalidPoolSize { min: u32, max: u32 },

    #[error("Invalid {url_type} URL: {message}")]
    InvalidUrl { url_type: String, message: String },

    #[error("'{name}' must be positive")]
    NonPositive { name: String },

    #[error("Invalid page sizes: default ({default}) exceeds max ({max})")]
    InvalidPageSize { default: u32, max: u32 },

    #[error("Invalid log level: '{value}' (valid: trace, debug, info, warn, error)")]
    InvalidLogLevel { value: String },

    #[error("Invalid log format: '{value}' (valid: json, pretty)")]
    InvalidLogFormat { value: String },
}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    fn require_positive(&mut self, name: &str, value: u64) {
        if value == 0 {
            self.add_error(ConfigValidationError::NonPositive { name: name.to_string() });
        }
    }

    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Minimum JWT secret length enforced in production.
    pub const MIN_JWT_SECRET_LENGTH: usize = 32;
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_security(&config.security, config.is_production(), &mut result);
        Self::validate_server(&config.server, &mut result);
        Self::validate_database(&config.database, &mut result);
        Self::validate_redis(&config.redis, &mut result);
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_pagination(&config.pagination, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_security(config: &SecurityConfig, production: bool, result: &mut ValidationResult) {
        if production && config.jwt_secret.len() < Self::MIN_JWT_SECRET_LENGTH {
            result.add_error(ConfigValidationError::JwtSecretTooShort {
                actual: config.jwt_secret.len(),
                minimum: Self::MIN_JWT_SECRET_LENGTH,
            });
        }
        result.require_positive("security.jwt_access_expiration_secs", config.jwt_access_expiration_secs);
        result.require_positive("security.jwt_refresh_expiration_secs", config.jwt_refresh_expiration_secs);
        result.require_positive(
            "security.password_policy.min_length",
            config.password_policy.min_length as u64,
        );
    }

    fn validate_server(config: &ServerConfig, result: &mut ValidationResult) {
        if config.port == 0 {
            result.add_error(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
        result.require_positive("server.request_timeout_secs", config.request_timeout_secs);
    }

    fn validate_database(config: &DatabaseConfig, result: &mut ValidationResult) {
        if config.url.is_empty() {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !config.url.starts_with("postgres://") && !config.url.starts_with("postgresql://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with postgres:// or postgresql://".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        result.require_positive("database.max_connections", u64::from(config.max_connections));
        result.require_positive("database.connect_timeout_secs", config.connect_timeout_secs);
    }

    fn validate_redis(config: &RedisConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }
        if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }
        result.require_positive("redis.pool_size", config.pool_size as u64);
    }

    fn validate_cache(config: &CacheConfig, result: &mut ValidationResult) {
        for (name, ttl) in config.ttls() {
            result.require_positive(&format!("cache.{name}"), ttl);
        }
    }

    fn validate_pagination(config: &PaginationConfig, result: &mut ValidationResult) {
        result.require_positive("pagination.default_page_size", u64::from(config.default_page_size));
        if config.default_page_size > config.max_page_size {
            result.add_error(ConfigValidationError::InvalidPageSize {
                default: config.default_page_size,
                max: config.max_page_size,
            });
        }
    }

    fn validate_observability(config: &ObservabilityConfig, result: &mut ValidationResult) {
        if !Self::VALID_LOG_LEVELS.contains(&config.log_level.to_lowercase().as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
        if !matches!(config.log_format.as_str(), "json" | "pretty") {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

/// Joins validation errors into a single bullet list.
#[must_use]
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_short_secret_only_rejected_in_production() {
        let mut config = AppConfig::default();
        config.app.environment = "production".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(matches!(errors[0], ConfigValidationError::JwtSecretTooShort { minimum: 32, .. }));

        config.security.jwt_secret = "x".repeat(32);
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_pool_size() {
        let mut config = AppConfig::default();
        config.database.min_connections = 50;
        config.database.max_connections = 10;
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.contains(&ConfigValidationError::InvalidPoolSize { min: 50, max: 10 }));
    }

    #[test]
    fn test_empty_and_foreign_database_url() {
        let mut config = AppConfig::default();
        config.database.url = String::new();
        assert!(ConfigValidator::validate(&config).is_err());

        config.database.url = "mysql://localhost/db".to_string();
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors[0].to_string().contains("postgres://"));
    }

    #[test]
    fn test_redis_url_ignored_when_disabled() {
        let mut config = AppConfig::default();
        config.redis.url = "http://nope".to_string();
        assert!(ConfigValidator::validate(&config).is_err());
        config.redis.enabled = false;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_ttl_and_port() {
        let mut config = AppConfig::default();
        config.cache.ttl_search_results = 0;
        config.server.port = 0;
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("cache.ttl_search_results")));
    }

    #[test]
    fn test_page_size_limits() {
        let mut config = AppConfig::default();
        config.pagination.default_page_size = 500;
        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors, vec![ConfigValidationError::InvalidPageSize { default: 500, max: 100 }]);
    }

    #[test]
    fn test_format_validation_errors() {
        let text = format_validation_errors(&[
            ConfigValidationError::InvalidLogLevel { value: "loud".into() },
            ConfigValidationError::NonPositive { name: "x".into() },
        ]);
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("loud"));
    }
}
