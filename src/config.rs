//! Configuration management for the library client

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Hosted library backend the client talks to unless told otherwise
pub const DEFAULT_API_URL: &str = "https://library-management-backend-tawny.vercel.app/api";

/// Cover shown for books without an image
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/150x200/cccccc/333333?text=No+Image";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout; unset leaves the transport default in place
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    /// Bypass cached reads whenever a view mounts
    pub refetch_on_mount: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// Delay before redirecting after a successful form submission
    pub redirect_delay_ms: u64,
    /// Default loan length offered by the borrow dialog
    pub default_loan_days: i64,
    pub placeholder_image_url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (with prefix LIBRARY_)
            .add_source(env_source())
            // Override API URL from LIBRARY_API_URL env var if present
            .set_override_option("api.base_url", env::var("LIBRARY_API_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

    /// Replace the API base URL, e.g. from a command line flag
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.api.base_url = url;
        }
        self
    }
}

/// `LIBRARY_<SECTION>__<KEY>`, e.g. `LIBRARY_CACHE__TTL_SECONDS=30`
fn env_source() -> Environment {
    Environment::with_prefix("LIBRARY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            refetch_on_mount: false,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            redirect_delay_ms: 1500,
            default_loan_days: 7,
            placeholder_image_url: PLACEHOLDER_IMAGE_URL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
