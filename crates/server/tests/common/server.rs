//! Server test utilities.

use darkroom_core::config::{AppConfig, StorageConfig};
use darkroom_metadata::{ImageMetadataStore, MemoryStore};
use darkroom_server::{AppState, create_router};
use darkroom_storage::{FilesystemBackend, ObjectStore};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server with temporary storage and an in-memory
    /// metadata store.
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

        let storage_path = temp_dir.path().join("storage");
        let storage: Arc<dyn ObjectStore> = Arc::new(
            FilesystemBackend::new(&storage_path)
                .await
                .expect("Failed to create storage backend"),
        );

        let metadata = Arc::new(ImageMetadataStore::new(
            Arc::new(MemoryStore::new()),
            Some("LabelIndex".to_string()),
        ));

        let mut config = AppConfig::for_testing();
        config.storage = StorageConfig::Filesystem {
            path: storage_path,
        };

        let state = AppState::new(config, storage, metadata);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store for seeding.
    pub fn metadata(&self) -> Arc<ImageMetadataStore> {
        self.state.metadata.clone()
    }
}
