use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// bcrypt accepts costs in this range.
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Longest token lifetime accepted from the environment: one year.
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 366;

/// JWT secret used when nothing is configured. Rejected in production.
pub const DEVELOPMENT_JWT_SECRET: &str = "money-bag-development-secret-change-me";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub avatar: AvatarConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub statement_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub max_upload_size_bytes: usize,
    pub bulk_delete_concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarConfig {
    pub dimension: u32,
    pub jpeg_quality: u8,
    pub max_data_uri_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
    /// Keep a recoverable copy of each password for the admin screen.
    /// Off unless product explicitly signs off on it.
    pub retain_plaintext_passwords: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Refusing to start in production with the development JWT secret")]
    InsecureJwtSecret,

    #[error("Invalid configuration: {name} = {value} ({expected})")]
    OutOfRange {
        name: &'static str,
        value: u64,
        expected: String,
    },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("STORE_BACKEND") {
            self.store = match v.as_str() {
                "memory" => StoreBackend::Memory,
                _ => StoreBackend::Postgres,
            };
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_STATEMENT_TIMEOUT_SECS") {
            self.database.statement_timeout_secs = v.parse().unwrap_or(self.database.statement_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("MONEY_BAG_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_MAX_UPLOAD_SIZE_BYTES") {
            self.api.max_upload_size_bytes = v.parse().unwrap_or(self.api.max_upload_size_bytes);
        }
        if let Ok(v) = env::var("API_BULK_DELETE_CONCURRENCY") {
            self.api.bulk_delete_concurrency = v.parse().unwrap_or(self.api.bulk_delete_concurrency);
        }

        // Avatar overrides
        if let Ok(v) = env::var("AVATAR_DIMENSION") {
            self.avatar.dimension = v.parse().unwrap_or(self.avatar.dimension);
        }
        if let Ok(v) = env::var("AVATAR_JPEG_QUALITY") {
            self.avatar.jpeg_quality = v.parse().unwrap_or(self.avatar.jpeg_quality);
        }
        if let Ok(v) = env::var("AVATAR_MAX_DATA_URI_BYTES") {
            self.avatar.max_data_uri_bytes = v.parse().unwrap_or(self.avatar.max_data_uri_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }
        if let Ok(v) = env::var("SECURITY_RETAIN_PLAINTEXT_PASSWORDS") {
            self.security.retain_plaintext_passwords =
                v.parse().unwrap_or(self.security.retain_plaintext_passwords);
        }

        self
    }

    /// Checks that must pass before the server binds its port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if self.environment == Environment::Production
            && (self.security.jwt_secret.is_empty() || self.security.jwt_secret == DEVELOPMENT_JWT_SECRET)
        {
            return Err(ConfigError::InsecureJwtSecret);
        }
        if !BCRYPT_COST_RANGE.contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::OutOfRange {
                name: "BCRYPT_COST",
                value: u64::from(self.security.bcrypt_cost),
                expected: format!("{}..={}", BCRYPT_COST_RANGE.start(), BCRYPT_COST_RANGE.end()),
            });
        }
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&self.security.jwt_expiry_hours) {
            return Err(ConfigError::OutOfRange {
                name: "SECURITY_JWT_EXPIRY_HOURS",
                value: self.security.jwt_expiry_hours,
                expected: format!("1..={}", MAX_JWT_EXPIRY_HOURS),
            });
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connect_timeout_secs: 30,
                statement_timeout_secs: 60,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 9091,
                max_request_size_bytes: 50 * 1024 * 1024,
                max_upload_size_bytes: 10 * 1024 * 1024,
                bulk_delete_concurrency: 4,
            },
            avatar: AvatarConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7,
                bcrypt_cost: 10,
                retain_plaintext_passwords: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            store: StoreBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connect_timeout_secs: 10,
                statement_timeout_secs: 60,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 9091,
                max_request_size_bytes: 10 * 1024 * 1024,
                max_upload_size_bytes: 10 * 1024 * 1024,
                bulk_delete_concurrency: 4,
            },
            avatar: AvatarConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 10,
                retain_plaintext_passwords: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            store: StoreBackend::Postgres,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connect_timeout_secs: 5,
                statement_timeout_secs: 60,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 9091,
                max_request_size_bytes: 2 * 1024 * 1024,
                max_upload_size_bytes: 10 * 1024 * 1024,
                bulk_delete_concurrency: 8,
            },
            avatar: AvatarConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec![],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bcrypt_cost: 10,
                retain_plaintext_passwords: false,
            },
        }
    }

    /// In-memory store, cheap bcrypt cost. Used by the test suites.
    pub fn test_default() -> Self {
        let mut config = Self::development();
        config.store = StoreBackend::Memory;
        config.database.run_migrations = false;
        config.security.bcrypt_cost = 4;
        config.security.jwt_secret = "test-secret-for-money-bag".to_string();
        config
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            dimension: 200,
            jpeg_quality: 80,
            max_data_uri_bytes: 100 * 1024,
        }
    }
}

// Global singleton config for the binaries - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    ($config:expr) => {
        matches!($config.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.api.port, 9091);
        assert_eq!(config.security.bcrypt_cost, 10);
        assert_eq!(config.database.statement_timeout_secs, 60);
        assert!(!config.security.retain_plaintext_passwords);
    }

    #[test]
    fn test_avatar_defaults() {
        let avatar = AvatarConfig::default();
        assert_eq!(avatar.dimension, 200);
        assert_eq!(avatar.jpeg_quality, 80);
        assert_eq!(avatar.max_data_uri_bytes, 102_400);
    }

    #[test]
    fn production_rejects_development_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/money_bag".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InsecureJwtSecret)));

        config.security.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InsecureJwtSecret)));

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
        assert!(crate::is_production!(config));
    }

    #[test]
    fn postgres_backend_requires_url() {
        let config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(AppConfig::test_default().validate().is_ok());
    }

    #[test]
    fn security_knobs_are_bounded() {
        let mut config = AppConfig::test_default();
        config.security.bcrypt_cost = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "BCRYPT_COST", .. })
        ));

        config.security.bcrypt_cost = 32;
        assert!(config.validate().is_err());

        config.security.bcrypt_cost = 4;
        config.security.jwt_expiry_hours = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "SECURITY_JWT_EXPIRY_HOURS", .. })
        ));

        config.security.jwt_expiry_hours = 0;
        assert!(config.validate().is_err());

        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }
}
