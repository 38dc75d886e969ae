use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use crate::config;

use super::{FileStore, StorageError, StoredFile};

/// Local-disk file store rooted at `storage.root_dir`.
pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self { root: root.into(), public_base_url: public_base_url.into() }
    }

    pub fn from_config() -> Self {
        let storage = &config::config().storage;
        Self::new(&storage.root_dir, &storage.public_base_url)
    }

    /// Resolve a storage-relative path against the root, rejecting anything
    /// that could escape it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        if relative.is_empty() {
            return Err(StorageError::InvalidPath("empty path".to_string()));
        }
        let rel = Path::new(relative);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir | std::path::Component::Prefix(_)))
        {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(rel))
    }

    fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.public_base_url.trim_end_matches('/'), relative)
    }

    /// Keep the original name recognizable but safe and collision-free.
    fn derive_file_name(original_name: &str) -> String {
        let safe: String = original_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '-' })
            .collect();
        let safe = safe.trim_matches('-');
        let stem = if safe.is_empty() { "file" } else { safe };
        format!("{}_{}", Uuid::new_v4().simple(), stem)
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save_file(
        &self,
        bytes: &[u8],
        original_name: &str,
        path_prefix: &str,
    ) -> Result<StoredFile, StorageError> {
        let file_name = Self::derive_file_name(original_name);
        let relative = format!("{}/{}", path_prefix.trim_matches('/'), file_name);
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;

        Ok(StoredFile { url: self.url_for(&relative), path: relative })
    }

    async fn move_file(&self, old_path: &str, new_dir: &str) -> Result<StoredFile, StorageError> {
        let source = self.resolve(old_path)?;
        if !source.exists() {
            return Err(StorageError::NotFound(old_path.to_string()));
        }

        let file_name = Path::new(old_path)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidPath(old_path.to_string()))?;
        let relative = format!("{}/{}", new_dir.trim_matches('/'), file_name);
        let target = self.resolve(&relative)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&source, &target).await?;

        Ok(StoredFile { url: self.url_for(&relative), path: relative })
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn open_file(
        &self,
        path: &str,
    ) -> Result<Box<dyn tokio::io::AsyncRead + Send + Unpin>, StorageError> {
        let target = self.resolve(path)?;
        match tokio::fs::File::open(&target).await {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

static STORE: OnceLock<Arc<LocalFileStore>> = OnceLock::new();

/// Shared file store built from configuration.
pub fn store() -> Arc<LocalFileStore> {
    STORE.get_or_init(|| Arc::new(LocalFileStore::from_config())).clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_escaping_paths() {
        let store = LocalFileStore::new("/tmp/studyvault-test", "http://localhost/files");
        assert!(matches!(store.resolve("../etc/passwd"), Err(StorageError::InvalidPath(_))));
        assert!(matches!(store.resolve("/etc/passwd"), Err(StorageError::InvalidPath(_))));
        assert!(store.resolve("cs/S3/algorithms/file.pdf").is_ok());
    }

    #[test]
    fn derives_safe_unique_names() {
        let a = LocalFileStore::derive_file_name("TP Réseaux (final).pdf");
        let b = LocalFileStore::derive_file_name("TP Réseaux (final).pdf");
        assert_ne!(a, b);
        assert!(a.ends_with(".pdf"));
        assert!(!a.contains(' '));
        assert!(!a.contains('('));
    }

    async fn read_all(store: &LocalFileStore, path: &str) -> Result<Vec<u8>, StorageError> {
        use tokio::io::AsyncReadExt;
        let mut reader = store.open_file(path).await?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        Ok(bytes)
    }

    #[tokio::test]
    async fn save_move_read_delete_roundtrip() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("studyvault-{}", Uuid::new_v4().simple()));
        let store = LocalFileStore::new(&dir, "http://localhost/files");

        let saved = store.save_file(b"hello", "notes.txt", "pending/cs/S1/intro").await?;
        assert!(saved.path.starts_with("pending/cs/S1/intro/"));
        assert_eq!(read_all(&store, &saved.path).await?, b"hello");

        let moved = store.move_file(&saved.path, "cs/S1/intro").await?;
        assert!(moved.path.starts_with("cs/S1/intro/"));
        assert!(read_all(&store, &saved.path).await.is_err());
        assert_eq!(read_all(&store, &moved.path).await?, b"hello");

        store.delete_file(&moved.path).await?;
        assert!(matches!(
            read_all(&store, &moved.path).await,
            Err(StorageError::NotFound(_))
        ));

        tokio::fs::remove_dir_all(&dir).await.ok();
        Ok(())
    }
}
