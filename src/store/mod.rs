//! store
//!
//! Persistent-store collaborator trait.
//!
//! # Design
//!
//! The engine treats persistence as an external collaborator behind the
//! [`Store`] trait. The trait is async because store operations may
//! involve network or disk I/O; all methods return `Result` so callers
//! can fail fast on data errors.
//!
//! # Atomic Replacement
//!
//! `replace_config_entries` / `replace_template_entries` are
//! transactional wholesale replacements of one namespace's entry set
//! (delete-all, insert-all). Readers must never observe a
//! partially-replaced set — the atomicity invariant is enforced by the
//! store implementation, not by caller discipline. Both shipped
//! implementations swap a single document under a lock, so there is no
//! intermediate state to observe.
//!
//! # Example
//!
//! ```
//! use confcast::store::{MemoryStore, Store};
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.upsert_namespace("svc", "1.0.0").await.unwrap();
//! let ns = store.get_namespace("svc").await.unwrap().unwrap();
//! assert_eq!(ns.version, "1.0.0");
//! # });
//! ```

mod document;
pub mod file_store;
pub mod memory;

pub use file_store::FileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::types::{ConfigEntry, Destination, NamespaceRecord, TemplateEntry};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying I/O failure.
    #[error("store i/o error at '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The store document exists but cannot be decoded.
    #[error("store document corrupt at '{path}': {message}")]
    Corrupt { path: PathBuf, message: String },

    /// The store's exclusive lock could not be taken or released.
    #[error("store lock error: {0}")]
    Lock(String),
}

/// Key-value persistence for namespaces, config entries, and template
/// entries, keyed by namespace+key, namespace+template, and namespace.
///
/// Implementations must be thread-safe (`Send + Sync`); concurrent
/// operations on different namespaces must not interfere.
#[async_trait]
pub trait Store: Send + Sync {
    /// All namespace rows.
    async fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>, StoreError>;

    /// One namespace row, or `None` when never registered.
    async fn get_namespace(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError>;

    /// Create or update a namespace row.
    ///
    /// The version tag and update time change only when `version`
    /// differs from the stored one, keeping re-registration of an
    /// unchanged catalog idempotent.
    async fn upsert_namespace(
        &self,
        namespace: &str,
        version: &str,
    ) -> Result<NamespaceRecord, StoreError>;

    /// Config entries for a namespace, optionally narrowed to one key.
    ///
    /// Returns an empty vector (not an error) when nothing matches;
    /// presence decisions belong to the caller.
    async fn list_config_entries(
        &self,
        namespace: &str,
        key: Option<&str>,
    ) -> Result<Vec<ConfigEntry>, StoreError>;

    /// Atomically replace every config entry of a namespace.
    async fn replace_config_entries(
        &self,
        namespace: &str,
        entries: Vec<ConfigEntry>,
    ) -> Result<(), StoreError>;

    /// Update one config entry's value in place.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when the (namespace, key) row is absent —
    /// single-key updates never create rows; only registration does.
    async fn update_config_value(
        &self,
        namespace: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<ConfigEntry, StoreError>;

    /// Template entries for a namespace, optionally narrowed to one name.
    async fn list_template_entries(
        &self,
        namespace: &str,
        name: Option<&str>,
    ) -> Result<Vec<TemplateEntry>, StoreError>;

    /// Atomically replace every template entry of a namespace.
    async fn replace_template_entries(
        &self,
        namespace: &str,
        entries: Vec<TemplateEntry>,
    ) -> Result<(), StoreError>;

    /// Update one template entry's destination in place.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` when the (namespace, name) row is absent.
    async fn update_template_destination(
        &self,
        namespace: &str,
        name: &str,
        destination: Destination,
    ) -> Result<TemplateEntry, StoreError>;
}
