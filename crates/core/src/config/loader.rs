#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

use dotenvy::dotenv;
use std::env;

use crate::config::{ApiConfig, AppConfig, DatabaseConfig, LogConfig};
use crate::error::Result;

/// Load application configuration from environment variables.
///
/// # Errors
/// Returns an error if required environment variables are missing or invalid.
pub fn load_app_config() -> Result<AppConfig> {
    dotenv().ok();

    let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    let database = DatabaseConfig {
        connection_string: env::var("DATABASE_URL")
            .map_err(|_| crate::error::Error::Config("DATABASE_URL not set".to_string()))?,
        max_connections: env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10),
        connection_timeout: env::var("DATABASE_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30),
    };

    let api = ApiConfig {
        host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: env::var("API_PORT")
            .unwrap_or_else(|_| "8888".to_string())
            .parse()
            .unwrap_or(8888),
        enable_docs: env::var("API_ENABLE_DOCS")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true),
        cors_origins: env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
    };

    let log = LogConfig {
        level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        file: env::var("LOG_FILE").ok(),
    };

    let control_plane_url = env::var("CONTROL_PLANE_URL").ok();

    Ok(AppConfig {
        environment,
        database,
        api,
        log,
        control_plane_url,
    })
}
