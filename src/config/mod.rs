use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub json: JsonQueryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

/// Tuning for full-scan JSON column queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonQueryConfig {
    /// Skip parsing rows whose raw text cannot contain a value-search needle
    pub raw_precheck: bool,
    pub log_parse_failures: bool,
    pub enable_slow_scan_warning: bool,
    pub slow_scan_threshold_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        AppConfig::development().database
    }
}

impl Default for JsonQueryConfig {
    fn default() -> Self {
        AppConfig::development().json
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Preset first, then individual variables on top
        Self::preset(environment).with_env_overrides()
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_SLOW_QUERY_WARNING") {
            self.database.enable_slow_query_warning = v.parse().unwrap_or(self.database.enable_slow_query_warning);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // JSON query overrides
        if let Ok(v) = env::var("JSON_QUERY_RAW_PRECHECK") {
            self.json.raw_precheck = v.parse().unwrap_or(self.json.raw_precheck);
        }
        if let Ok(v) = env::var("JSON_QUERY_LOG_PARSE_FAILURES") {
            self.json.log_parse_failures = v.parse().unwrap_or(self.json.log_parse_failures);
        }
        if let Ok(v) = env::var("JSON_QUERY_SLOW_SCAN_WARNING") {
            self.json.enable_slow_scan_warning = v.parse().unwrap_or(self.json.enable_slow_scan_warning);
        }
        if let Ok(v) = env::var("JSON_QUERY_SLOW_SCAN_THRESHOLD_MS") {
            self.json.slow_scan_threshold_ms = v.parse().unwrap_or(self.json.slow_scan_threshold_ms);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            json: JsonQueryConfig {
                raw_precheck: true,
                log_parse_failures: true,
                enable_slow_scan_warning: true,
                slow_scan_threshold_ms: 250,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            json: JsonQueryConfig {
                raw_precheck: true,
                log_parse_failures: true,
                enable_slow_scan_warning: true,
                slow_scan_threshold_ms: 1000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            json: JsonQueryConfig {
                raw_precheck: true,
                log_parse_failures: false,
                enable_slow_scan_warning: true,
                slow_scan_threshold_ms: 2000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, Environment::Development);
        assert!(config.json.raw_precheck);
        assert!(config.json.log_parse_failures);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.json.log_parse_failures);
        assert!(!config.database.enable_query_logging);
        assert_eq!(config.json.slow_scan_threshold_ms, 2000);
    }

    #[test]
    fn test_presets_by_environment() {
        for environment in [Environment::Development, Environment::Staging, Environment::Production] {
            assert_eq!(AppConfig::preset(environment).environment, environment);
        }
    }

    #[test]
    fn test_defaults_follow_development() {
        let json = JsonQueryConfig::default();
        assert_eq!(json.slow_scan_threshold_ms, AppConfig::development().json.slow_scan_threshold_ms);
        assert_eq!(DatabaseConfig::default().connection_timeout, 30);
    }
}
