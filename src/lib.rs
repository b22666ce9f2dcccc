//! Library Management Client
//!
//! Typed client for the library REST API (books, borrows, borrow summary)
//! with a tag-invalidated response cache, error normalization, and the
//! views and routes of the library front end rendered as text.

use std::sync::Arc;
use std::time::Duration;

pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod router;
pub mod views;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application context handed to every view
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: api::ApiClient,
}

impl AppState {
    /// Build the context: one cache and one API client for the app's lifetime
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let cache = cache::TagCache::new(Duration::from_secs(config.cache.ttl_seconds));
        let api = api::ApiClient::new(&config.api, cache)?;
        Ok(Self {
            config: Arc::new(config),
            api,
        })
    }
}
