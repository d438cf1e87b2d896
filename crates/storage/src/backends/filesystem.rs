//! Local filesystem storage backend.

use crate::error::{StorageError, StorageResult};
use crate::traits::{ByteStream, ObjectDownload, ObjectStore, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::instrument;

/// Local filesystem object store for tests and single-node deployments.
///
/// Content types are recorded in a sidecar file next to each object, since
/// the filesystem itself has nowhere to keep them.
pub struct FilesystemBackend {
    root: PathBuf,
}

/// Sidecar suffix holding an object's content type.
const CONTENT_TYPE_SUFFIX: &str = ".content-type";

impl FilesystemBackend {
    /// Create a new filesystem backend.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Get the full path for a key, rejecting keys that would escape the
    /// storage root.
    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(format!(
                "path traversal not allowed: {key}"
            )));
        }
        for component in Path::new(key).components() {
            match component {
                std::path::Component::Normal(_) => {}
                _ => {
                    return Err(StorageError::InvalidKey(format!(
                        "contains unsafe path component: {key}"
                    )));
                }
            }
        }
        Ok(self.root.join(key))
    }

    fn sidecar_path(path: &Path) -> PathBuf {
        let mut os = path.as_os_str().to_os_string();
        os.push(CONTENT_TYPE_SUFFIX);
        PathBuf::from(os)
    }

    async fn ensure_parent(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn not_found(err: std::io::Error, key: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(key.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl ObjectStore for FilesystemBackend {
    #[instrument(skip(self, data), fields(backend = "filesystem"))]
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<StoredObject> {
        let path = self.key_path(key)?;
        Self::ensure_parent(&path).await?;

        fs::write(&path, &data).await?;
        fs::write(Self::sidecar_path(&path), content_type.as_bytes()).await?;

        Ok(StoredObject {
            key: key.to_string(),
            url: format!("file://{}", path.display()),
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        fs::try_exists(&path).await.map_err(StorageError::Io)
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn get_stream(&self, key: &str) -> StorageResult<ObjectDownload> {
        let path = self.key_path(key)?;
        let file = fs::File::open(&path).await.map_err(|e| not_found(e, key))?;
        let length = file.metadata().await.ok().map(|m| m.len());

        let content_type = match fs::read_to_string(Self::sidecar_path(&path)).await {
            Ok(recorded) => recorded,
            Err(_) => "application/octet-stream".to_string(),
        };

        let stream: ByteStream =
            Box::pin(ReaderStream::new(file).map(|result| result.map_err(StorageError::Io)));

        Ok(ObjectDownload {
            stream,
            content_type,
            length,
        })
    }

    #[instrument(skip(self), fields(backend = "filesystem"))]
    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StorageError::Io(e)),
        }
        // Best effort: the sidecar may predate the content-type tracking.
        let _ = fs::remove_file(Self::sidecar_path(&path)).await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use tempfile::tempdir;

    async fn collect(mut stream: ByteStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.try_next().await.unwrap() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn put_stream_round_trip() {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();

        let stored = backend
            .put(
                "images/img_1.jpg",
                Bytes::from_static(b"jpeg-bytes"),
                "image/jpeg",
            )
            .await
            .unwrap();
        assert_eq!(stored.key, "images/img_1.jpg");
        assert!(stored.url.starts_with("file://"));

        let download = backend.get_stream("images/img_1.jpg").await.unwrap();
        assert_eq!(download.content_type, "image/jpeg");
        assert_eq!(download.length, Some(10));
        assert_eq!(collect(download.stream).await, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn exists_reflects_puts_and_deletes() {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();

        assert!(!backend.exists("images/a.png").await.unwrap());
        backend
            .put("images/a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert!(backend.exists("images/a.png").await.unwrap());

        backend.delete("images/a.png").await.unwrap();
        assert!(!backend.exists("images/a.png").await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_key_is_ok() {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();
        backend.delete("images/never.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn get_stream_missing_key_is_not_found() {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();
        match backend.get_stream("images/missing.jpg").await {
            Err(StorageError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn traversal_keys_are_rejected() {
        let temp = tempdir().unwrap();
        let backend = FilesystemBackend::new(temp.path()).await.unwrap();

        for key in ["../escape", "/absolute", "a/../../b", ""] {
            match backend.exists(key).await {
                Err(StorageError::InvalidKey(_)) => {}
                other => panic!("expected InvalidKey for {key:?}, got {other:?}"),
            }
        }
    }
}
