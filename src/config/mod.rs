use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string of the hosted Postgres backend
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the blob storage API, e.g. https://<project>.supabase.co/storage/v1
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub bucket: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        env_parse("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        env_parse("DATABASE_CONNECTION_TIMEOUT", &mut self.database.connection_timeout);
        env_parse("DATABASE_ENABLE_QUERY_LOGGING", &mut self.database.enable_query_logging);

        if let Ok(v) = env::var("STORAGE_URL") {
            self.storage.url = Some(v);
        }
        if let Ok(v) = env::var("STORAGE_API_KEY") {
            self.storage.api_key = Some(v);
        }
        if let Some(bucket) = env::var("STORAGE_BUCKET").ok().filter(|b| !b.trim().is_empty()) {
            self.storage.bucket = bucket.trim().to_string();
        }
        env_parse("STORAGE_MAX_UPLOAD_BYTES", &mut self.storage.max_upload_bytes);

        // REKORD_API_PORT wins over the generic PORT
        env_parse("PORT", &mut self.api.port);
        env_parse("REKORD_API_PORT", &mut self.api.port);
        env_parse("API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);

        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        env_parse("SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            storage: StorageConfig {
                url: None,
                api_key: None,
                bucket: "images".to_string(),
                max_upload_bytes: 2 * 1024 * 1024, // 2MB
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "dev-only-jwt-secret".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            storage: StorageConfig {
                url: None,
                api_key: None,
                bucket: "images".to_string(),
                max_upload_bytes: 2 * 1024 * 1024,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.rekordit.pl".to_string()],
                jwt_secret: String::new(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            storage: StorageConfig {
                url: None,
                api_key: None,
                bucket: "images".to_string(),
                max_upload_bytes: 2 * 1024 * 1024,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://rekordit.pl".to_string()],
                jwt_secret: String::new(),
            },
        }
    }
}

/// Overwrite `target` when `key` is set and parses; unparseable values keep the preset
fn env_parse<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = env::var(key).ok().and_then(|v| v.trim().parse().ok()) {
        *target = value;
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.storage.bucket, "images");
        assert_eq!(config.storage.max_upload_bytes, 2 * 1024 * 1024);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.enable_query_logging);
        // Production refuses to run with a baked-in secret
        assert!(config.security.jwt_secret.is_empty());
    }

    #[test]
    fn unparseable_overrides_keep_the_preset() {
        env::set_var("REKORD_TEST_PORT_GOOD", " 8081 ");
        env::set_var("REKORD_TEST_PORT_BAD", "eighty");

        let mut port: u16 = 3000;
        env_parse("REKORD_TEST_PORT_BAD", &mut port);
        assert_eq!(port, 3000);
        env_parse("REKORD_TEST_PORT_GOOD", &mut port);
        assert_eq!(port, 8081);
    }
}
