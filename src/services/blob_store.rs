//! Opaque storage for uploaded résumés.
//!
//! Callers hand over bytes and get back a reference; only the reference is
//! persisted. References have the shape `<uuid>.<ext>`, which also keeps
//! filesystem lookups inside the upload directory.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("Invalid blob reference: {0}")]
    InvalidReference(String),
    #[error("Blob not found: {0}")]
    NotFound(String),
    #[error("Blob storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blob store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` and return the reference to retrieve them by.
    async fn put(&self, bytes: Vec<u8>, extension: &str) -> Result<String, BlobError>;
    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, BlobError>;
    async fn delete(&self, reference: &str) -> Result<(), BlobError>;
}

/// Check that a reference is `<uuid>.<ext>` with an alphanumeric extension.
pub fn validate_reference(reference: &str) -> Result<(), BlobError> {
    let invalid = || BlobError::InvalidReference(reference.to_string());

    let (stem, extension) = reference.rsplit_once('.').ok_or_else(invalid)?;
    Uuid::parse_str(stem).map_err(|_| invalid())?;
    if extension.is_empty()
        || extension.len() > 8
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(invalid());
    }
    Ok(())
}

fn new_reference(extension: &str) -> Result<String, BlobError> {
    let extension = extension.trim_start_matches('.').to_ascii_lowercase();
    let reference = format!("{}.{}", Uuid::new_v4(), extension);
    validate_reference(&reference)?;
    Ok(reference)
}

/// Stores blobs as files in a single directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf, BlobError> {
        validate_reference(reference)?;
        Ok(self.root.join(reference))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: Vec<u8>, extension: &str) -> Result<String, BlobError> {
        let reference = new_reference(extension)?;
        let path = self.path_for(&reference)?;

        tokio::fs::create_dir_all(&self.root).await?;
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(reference)
    }

    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.path_for(reference)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::Io(e)),
        }
    }

    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        let path = self.path_for(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(reference.to_string()))
            }
            Err(e) => Err(BlobError::Io(e)),
        }
    }
}

/// In-process blob store for tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn blobs(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, BlobError> {
        self.blobs.lock().map_err(|_| BlobError::Poisoned)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>, extension: &str) -> Result<String, BlobError> {
        let reference = new_reference(extension)?;
        self.blobs()?.insert(reference.clone(), bytes);
        Ok(reference)
    }

    async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, BlobError> {
        validate_reference(reference)?;
        Ok(self.blobs()?.get(reference).cloned())
    }

    async fn delete(&self, reference: &str) -> Result<(), BlobError> {
        validate_reference(reference)?;
        let removed = self.blobs()?.remove(reference);
        match removed {
            Some(_) => Ok(()),
            None => Err(BlobError::NotFound(reference.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reference_validation() {
        let good = format!("{}.pdf", Uuid::new_v4());
        assert!(validate_reference(&good).is_ok());

        for bad in [
            "../../etc/passwd",
            "resume.pdf",
            "",
            &format!("{}", Uuid::new_v4()),
            &format!("{}.p/f", Uuid::new_v4()),
            &format!("../{}.pdf", Uuid::new_v4()),
        ] {
            assert!(validate_reference(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[tokio::test]
    async fn test_fs_store_put_get_delete() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().join("uploads"));

        let reference = store.put(b"%PDF-1.4".to_vec(), "PDF").await.unwrap();
        assert!(reference.ends_with(".pdf"));
        assert!(store.root().join(&reference).exists());

        assert_eq!(
            store.get(&reference).await.unwrap(),
            Some(b"%PDF-1.4".to_vec())
        );

        store.delete(&reference).await.unwrap();
        assert_eq!(store.get(&reference).await.unwrap(), None);
        assert!(matches!(
            store.delete(&reference).await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_store_rejects_traversal() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path());
        assert!(matches!(
            store.get("../secret.txt").await,
            Err(BlobError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryBlobStore::new();
        let reference = store.put(vec![1, 2, 3], "txt").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&reference).await.unwrap(), Some(vec![1, 2, 3]));
        store.delete(&reference).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_reports_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryBlobStore::new());
        let reference = store.put(vec![1], "txt").await.unwrap();

        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.blobs.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(store.put(vec![2], "txt").await, Err(BlobError::Poisoned)));
        assert!(matches!(store.get(&reference).await, Err(BlobError::Poisoned)));
        assert!(matches!(store.delete(&reference).await, Err(BlobError::Poisoned)));
    }
}
