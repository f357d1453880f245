//! store::file_store
//!
//! File-backed store.
//!
//! # Design
//!
//! The whole store is one JSON document (see `store::document`). Every
//! mutation takes an OS-level exclusive lock on a sibling `.lock` file,
//! reads the document, applies the change, and rewrites it atomically
//! (temp file, fsync, rename). Readers take a shared lock. A reader
//! therefore always observes either the document before a replacement or
//! after it — never a partially-replaced entry set.
//!
//! # Security
//!
//! Template entries carry destination credentials, so the document file
//! is created with 0600 permissions on Unix.
//!
//! # Example
//!
//! ```no_run
//! use confcast::store::{FileStore, Store};
//!
//! # tokio_test::block_on(async {
//! let store = FileStore::new("/var/lib/confcast/confcast.json");
//! let namespaces = store.list_namespaces().await.unwrap();
//! # });
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;

use super::document::StoreDocument;
use super::{Store, StoreError};
use crate::core::types::{ConfigEntry, Destination, NamespaceRecord, TemplateEntry};

/// File-backed store over a single JSON document.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Lock guard; the OS lock releases when the file handle drops.
struct LockGuard {
    _file: File,
}

impl FileStore {
    /// Create a store over the given document path. The file and its
    /// parent directory are created lazily on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    /// Path of the document file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<File, StoreError> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: self.lock_path.clone(),
                source,
            })?;
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| StoreError::Io {
                path: self.lock_path.clone(),
                source,
            })
    }

    fn shared_lock(&self) -> Result<LockGuard, StoreError> {
        let file = self.lock_file()?;
        file.lock_shared()
            .map_err(|e| StoreError::Lock(format!("cannot take shared lock: {e}")))?;
        Ok(LockGuard { _file: file })
    }

    fn exclusive_lock(&self) -> Result<LockGuard, StoreError> {
        let file = self.lock_file()?;
        file.lock_exclusive()
            .map_err(|e| StoreError::Lock(format!("cannot take exclusive lock: {e}")))?;
        Ok(LockGuard { _file: file })
    }

    fn read_document(&self) -> Result<StoreDocument, StoreError> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Atomic write: temp file in the same directory, fsync, rename.
    fn write_document(&self, document: &StoreDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;
        }
        let content = serde_json::to_string_pretty(document).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|source| StoreError::Io {
                    path: temp_path.clone(),
                    source,
                })?;

            // Destination credentials live in this document.
            #[cfg(unix)]
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(|source| StoreError::Io {
                    path: temp_path.clone(),
                    source,
                })?;

            file.write_all(content.as_bytes())
                .map_err(|source| StoreError::Io {
                    path: temp_path.clone(),
                    source,
                })?;
            file.sync_all().map_err(|source| StoreError::Io {
                path: temp_path.clone(),
                source,
            })?;
        }
        fs::rename(&temp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Run a read-only operation under a shared lock.
    fn with_document<T>(&self, f: impl FnOnce(&StoreDocument) -> T) -> Result<T, StoreError> {
        let _guard = self.shared_lock()?;
        let document = self.read_document()?;
        Ok(f(&document))
    }

    /// Run a mutation under the exclusive lock and persist the result.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreDocument) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.exclusive_lock()?;
        let mut document = self.read_document()?;
        let result = f(&mut document)?;
        self.write_document(&document)?;
        Ok(result)
    }
}

#[async_trait]
impl Store for FileStore {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>, StoreError> {
        self.with_document(|doc| doc.list_namespaces())
    }

    async fn get_namespace(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError> {
        self.with_document(|doc| doc.get_namespace(namespace))
    }

    async fn upsert_namespace(
        &self,
        namespace: &str,
        version: &str,
    ) -> Result<NamespaceRecord, StoreError> {
        self.mutate(|doc| Ok(doc.upsert_namespace(namespace, version, Utc::now())))
    }

    async fn list_config_entries(
        &self,
        namespace: &str,
        key: Option<&str>,
    ) -> Result<Vec<ConfigEntry>, StoreError> {
        self.with_document(|doc| doc.list_configs(namespace, key))
    }

    async fn replace_config_entries(
        &self,
        namespace: &str,
        entries: Vec<ConfigEntry>,
    ) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.replace_configs(namespace, entries);
            Ok(())
        })
    }

    async fn update_config_value(
        &self,
        namespace: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<ConfigEntry, StoreError> {
        self.mutate(|doc| doc.update_config_value(namespace, key, value))
    }

    async fn list_template_entries(
        &self,
        namespace: &str,
        name: Option<&str>,
    ) -> Result<Vec<TemplateEntry>, StoreError> {
        self.with_document(|doc| doc.list_templates(namespace, name))
    }

    async fn replace_template_entries(
        &self,
        namespace: &str,
        entries: Vec<TemplateEntry>,
    ) -> Result<(), StoreError> {
        self.mutate(|doc| {
            doc.replace_templates(namespace, entries);
            Ok(())
        })
    }

    async fn update_template_destination(
        &self,
        namespace: &str,
        name: &str,
        destination: Destination,
    ) -> Result<TemplateEntry, StoreError> {
        self.mutate(|doc| doc.update_template_destination(namespace, name, destination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(namespace: &str, key: &str, value: &str) -> ConfigEntry {
        ConfigEntry {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value: Some(value.to_string()),
            description: String::new(),
            category: String::new(),
        }
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");

        let store = FileStore::new(&path);
        store
            .replace_config_entries("svc", vec![entry("svc", "PORT", "8080")])
            .await
            .unwrap();
        store.upsert_namespace("svc", "1.0").await.unwrap();

        let reopened = FileStore::new(&path);
        let configs = reopened.list_config_entries("svc", None).await.unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].value.as_deref(), Some("8080"));
        assert_eq!(
            reopened.get_namespace("svc").await.unwrap().unwrap().version,
            "1.0"
        );
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("absent.json"));
        assert!(store.list_namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_document_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        let err = FileStore::new(&path).list_namespaces().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn replacement_does_not_touch_other_namespaces() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));
        store
            .replace_config_entries("a", vec![entry("a", "K", "1")])
            .await
            .unwrap();
        store
            .replace_config_entries("b", vec![entry("b", "K", "2")])
            .await
            .unwrap();
        store
            .replace_config_entries("a", vec![entry("a", "K2", "3")])
            .await
            .unwrap();

        let a = store.list_config_entries("a", None).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].key, "K2");
        assert_eq!(store.list_config_entries("b", None).await.unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn document_is_owner_only() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("store.json"));
        store.upsert_namespace("svc", "1.0").await.unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
