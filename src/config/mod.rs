use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub listing: ListingConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub import: ImportConfig,
    pub yahrzeit: YahrzeitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub max_rows: usize,
    pub default_currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YahrzeitConfig {
    pub reminder_days_before: i64,
    pub upcoming_horizon_days: i64,
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
        // Listing overrides
        if let Ok(v) = env::var("LISTING_DEFAULT_PAGE_SIZE") {
            self.listing.default_page_size = v.parse().unwrap_or(self.listing.default_page_size);
        }
        if let Ok(v) = env::var("LISTING_MAX_PAGE_SIZE") {
            self.listing.max_page_size = v.parse().unwrap_or(self.listing.max_page_size);
        }
        if let Ok(v) = env::var("LISTING_DEBUG_LOGGING") {
            self.listing.debug_logging = v.parse().unwrap_or(self.listing.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides (PORT kept for platform deployments)
        if let Ok(v) = env::var("KEHILLA_API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        // Import overrides
        if let Ok(v) = env::var("IMPORT_MAX_ROWS") {
            self.import.max_rows = v.parse().unwrap_or(self.import.max_rows);
        }
        if let Ok(v) = env::var("IMPORT_DEFAULT_CURRENCY") {
            let code = v.trim().to_ascii_uppercase();
            if code.len() == 3 {
                self.import.default_currency = code;
            }
        }

        // Yahrzeit overrides
        if let Ok(v) = env::var("YAHRZEIT_REMINDER_DAYS_BEFORE") {
            self.yahrzeit.reminder_days_before = v.parse().unwrap_or(self.yahrzeit.reminder_days_before);
        }
        if let Ok(v) = env::var("YAHRZEIT_UPCOMING_HORIZON_DAYS") {
            self.yahrzeit.upcoming_horizon_days = v.parse().unwrap_or(self.yahrzeit.upcoming_horizon_days);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            listing: ListingConfig {
                default_page_size: 25,
                max_page_size: 1000,
                debug_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 20 * 1024 * 1024, // 20MB
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            import: ImportConfig {
                max_rows: 50_000,
                default_currency: "USD".to_string(),
            },
            yahrzeit: YahrzeitConfig {
                reminder_days_before: 7,
                upcoming_horizon_days: 60,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            listing: ListingConfig {
                default_page_size: 25,
                max_page_size: 500,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            import: ImportConfig {
                max_rows: 20_000,
                default_currency: "USD".to_string(),
            },
            yahrzeit: YahrzeitConfig {
                reminder_days_before: 7,
                upcoming_horizon_days: 60,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            listing: ListingConfig {
                default_page_size: 25,
                max_page_size: 200,
                debug_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            import: ImportConfig {
                max_rows: 20_000,
                default_currency: "USD".to_string(),
            },
            yahrzeit: YahrzeitConfig {
                reminder_days_before: 10,
                upcoming_horizon_days: 90,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.listing.max_page_size, 1000);
        assert!(config.database.run_migrations);
        assert_eq!(config.import.default_currency, "USD");
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.listing.max_page_size, 200);
        assert!(!config.database.run_migrations);
        assert!(!config.api.enable_request_logging);
    }
}
