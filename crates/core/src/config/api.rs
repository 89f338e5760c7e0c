use serde::{Deserialize, Serialize};

/// Ambient HTTP boundary configuration (health check only; no tenant data routes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Expose the Swagger/OpenAPI doc route
    pub enable_docs: bool,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}
