//! store::memory
//!
//! In-memory store for deterministic testing and embedding.
//!
//! # Design
//!
//! Thread-safe via an internal `Arc<Mutex<...>>`; clones share state, so
//! a test can hold one handle while the service under test holds
//! another. Every mutation happens under the mutex, which makes the
//! wholesale replacement operations single atomic transitions.
//!
//! # Example
//!
//! ```
//! use confcast::store::{MemoryStore, Store};
//! use confcast::core::types::ConfigEntry;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store
//!     .replace_config_entries(
//!         "svc",
//!         vec![ConfigEntry {
//!             namespace: "svc".into(),
//!             key: "PORT".into(),
//!             value: Some("8080".into()),
//!             description: "listen port".into(),
//!             category: "net".into(),
//!         }],
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(store.list_config_entries("svc", None).await.unwrap().len(), 1);
//! # });
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::document::StoreDocument;
use super::{Store, StoreError};
use crate::core::types::{ConfigEntry, Destination, NamespaceRecord, TemplateEntry};

/// In-memory store; clones share the same underlying document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn document(&self) -> Result<MutexGuard<'_, StoreDocument>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Lock("memory store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>, StoreError> {
        Ok(self.document()?.list_namespaces())
    }

    async fn get_namespace(&self, namespace: &str) -> Result<Option<NamespaceRecord>, StoreError> {
        Ok(self.document()?.get_namespace(namespace))
    }

    async fn upsert_namespace(
        &self,
        namespace: &str,
        version: &str,
    ) -> Result<NamespaceRecord, StoreError> {
        Ok(self
            .document()?
            .upsert_namespace(namespace, version, Utc::now()))
    }

    async fn list_config_entries(
        &self,
        namespace: &str,
        key: Option<&str>,
    ) -> Result<Vec<ConfigEntry>, StoreError> {
        Ok(self.document()?.list_configs(namespace, key))
    }

    async fn replace_config_entries(
        &self,
        namespace: &str,
        entries: Vec<ConfigEntry>,
    ) -> Result<(), StoreError> {
        self.document()?.replace_configs(namespace, entries);
        Ok(())
    }

    async fn update_config_value(
        &self,
        namespace: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<ConfigEntry, StoreError> {
        self.document()?.update_config_value(namespace, key, value)
    }

    async fn list_template_entries(
        &self,
        namespace: &str,
        name: Option<&str>,
    ) -> Result<Vec<TemplateEntry>, StoreError> {
        Ok(self.document()?.list_templates(namespace, name))
    }

    async fn replace_template_entries(
        &self,
        namespace: &str,
        entries: Vec<TemplateEntry>,
    ) -> Result<(), StoreError> {
        self.document()?.replace_templates(namespace, entries);
        Ok(())
    }

    async fn update_template_destination(
        &self,
        namespace: &str,
        name: &str,
        destination: Destination,
    ) -> Result<TemplateEntry, StoreError> {
        self.document()?
            .update_template_destination(namespace, name, destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(namespace: &str, key: &str) -> ConfigEntry {
        ConfigEntry {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value: Some("v".to_string()),
            description: String::new(),
            category: String::new(),
        }
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store
            .replace_config_entries("svc", vec![entry("svc", "K")])
            .await
            .unwrap();
        assert_eq!(handle.list_config_entries("svc", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn key_filter_narrows_listing() {
        let store = MemoryStore::new();
        store
            .replace_config_entries("svc", vec![entry("svc", "A"), entry("svc", "B")])
            .await
            .unwrap();
        let only_a = store.list_config_entries("svc", Some("A")).await.unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].key, "A");
        assert!(store
            .list_config_entries("svc", Some("C"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn update_template_destination_round_trips() {
        let store = MemoryStore::new();
        let dest = Destination {
            address: "h:22".into(),
            path: "/etc/a".into(),
            user: "u".into(),
            secret: "s".into(),
        };
        store
            .replace_template_entries(
                "svc",
                vec![TemplateEntry {
                    namespace: "svc".into(),
                    template_name: "a.conf".into(),
                    destination: dest.clone(),
                }],
            )
            .await
            .unwrap();

        let moved = Destination {
            path: "/etc/b".into(),
            ..dest
        };
        let updated = store
            .update_template_destination("svc", "a.conf", moved)
            .await
            .unwrap();
        assert_eq!(updated.destination.path, "/etc/b");
    }
}
