use serde::{Deserialize, Serialize};

use crate::config::{ApiConfig, DatabaseConfig, LogConfig};

/// Top-level application configuration, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment (development, staging, production)
    pub environment: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Ambient HTTP boundary configuration
    pub api: ApiConfig,

    /// Log configuration
    pub log: LogConfig,

    /// URL of the control plane this instance reports to, if any
    pub control_plane_url: Option<String>,
}
