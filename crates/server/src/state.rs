//! Application state shared across handlers.

use darkroom_core::config::AppConfig;
use darkroom_metadata::ImageMetadataStore;
use darkroom_storage::ObjectStore;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Object storage backend.
    pub storage: Arc<dyn ObjectStore>,
    /// Metadata store facade.
    pub metadata: Arc<ImageMetadataStore>,
    /// Process start, for health reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        storage: Arc<dyn ObjectStore>,
        metadata: Arc<ImageMetadataStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            metadata,
            started_at: Instant::now(),
        }
    }
}
