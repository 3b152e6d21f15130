//! Bookshelf
//!
//! An in-memory book catalog served as a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Build the state around a fresh, empty catalog
    pub fn new(config: AppConfig) -> Self {
        let repository = repository::Repository::new(config.catalog.id_length);
        let services = services::Services::new(repository, &config.catalog);

        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
