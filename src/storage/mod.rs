//! File storage collaborator. The core computes paths (see [`path`]) and
//! hands bytes to a [`FileStore`]; it does not manage retries or backend
//! consistency.

pub mod local;
pub mod path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

pub use local::LocalFileStore;
pub use path::{compose_path, pending_path, PENDING_PREFIX};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Stored file not found: {0}")]
    NotFound(String),

    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A stored file's addressable location.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Storage-relative path, used for later move/delete.
    pub path: String,
    /// Public URL under which the file is served.
    pub url: String,
}

/// Blob storage interface. Implementations own naming within a directory;
/// callers own the directory structure (hierarchical paths).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Save bytes under `path_prefix`, deriving a collision-free file name
    /// from `original_name`. Returns the stored location.
    async fn save_file(
        &self,
        bytes: &[u8],
        original_name: &str,
        path_prefix: &str,
    ) -> Result<StoredFile, StorageError>;

    /// Move a stored file to a new directory, keeping its file name.
    async fn move_file(&self, old_path: &str, new_dir: &str) -> Result<StoredFile, StorageError>;

    /// Remove a stored file.
    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    /// Open a stored file for streaming reads, so downloads never buffer
    /// the whole file in memory.
    async fn open_file(
        &self,
        path: &str,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, StorageError>;
}
