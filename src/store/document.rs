//! store::document
//!
//! The store's logical document: three row sets and the mutations both
//! shipped backends share. The memory store holds one document behind a
//! mutex; the file store deserializes, mutates, and atomically rewrites
//! one — which is what makes wholesale replacement a single observable
//! transition in both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::core::types::{ConfigEntry, Destination, NamespaceRecord, TemplateEntry};

/// Every persisted row, in one serializable unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreDocument {
    pub namespaces: Vec<NamespaceRecord>,
    pub configs: Vec<ConfigEntry>,
    pub templates: Vec<TemplateEntry>,
}

impl StoreDocument {
    pub fn list_namespaces(&self) -> Vec<NamespaceRecord> {
        self.namespaces.clone()
    }

    pub fn get_namespace(&self, namespace: &str) -> Option<NamespaceRecord> {
        self.namespaces
            .iter()
            .find(|record| record.namespace == namespace)
            .cloned()
    }

    /// Create or update a namespace row. Version and update time change
    /// only when the incoming version differs.
    pub fn upsert_namespace(
        &mut self,
        namespace: &str,
        version: &str,
        now: DateTime<Utc>,
    ) -> NamespaceRecord {
        if let Some(record) = self
            .namespaces
            .iter_mut()
            .find(|record| record.namespace == namespace)
        {
            if record.version != version {
                record.version = version.to_string();
                record.update_time = now;
            }
            return record.clone();
        }
        let record = NamespaceRecord {
            namespace: namespace.to_string(),
            version: version.to_string(),
            update_time: now,
        };
        self.namespaces.push(record.clone());
        record
    }

    pub fn list_configs(&self, namespace: &str, key: Option<&str>) -> Vec<ConfigEntry> {
        self.configs
            .iter()
            .filter(|entry| entry.namespace == namespace)
            .filter(|entry| key.map_or(true, |key| entry.key == key))
            .cloned()
            .collect()
    }

    pub fn replace_configs(&mut self, namespace: &str, entries: Vec<ConfigEntry>) {
        self.configs.retain(|entry| entry.namespace != namespace);
        self.configs.extend(entries);
    }

    pub fn update_config_value(
        &mut self,
        namespace: &str,
        key: &str,
        value: Option<String>,
    ) -> Result<ConfigEntry, StoreError> {
        let entry = self
            .configs
            .iter_mut()
            .find(|entry| entry.namespace == namespace && entry.key == key)
            .ok_or_else(|| {
                StoreError::NotFound(format!("config (namespace: {namespace}, key: {key})"))
            })?;
        entry.value = value;
        Ok(entry.clone())
    }

    pub fn list_templates(&self, namespace: &str, name: Option<&str>) -> Vec<TemplateEntry> {
        self.templates
            .iter()
            .filter(|entry| entry.namespace == namespace)
            .filter(|entry| name.map_or(true, |name| entry.template_name == name))
            .cloned()
            .collect()
    }

    pub fn replace_templates(&mut self, namespace: &str, entries: Vec<TemplateEntry>) {
        self.templates.retain(|entry| entry.namespace != namespace);
        self.templates.extend(entries);
    }

    pub fn update_template_destination(
        &mut self,
        namespace: &str,
        name: &str,
        destination: Destination,
    ) -> Result<TemplateEntry, StoreError> {
        let entry = self
            .templates
            .iter_mut()
            .find(|entry| entry.namespace == namespace && entry.template_name == name)
            .ok_or_else(|| {
                StoreError::NotFound(format!("template (namespace: {namespace}, name: {name})"))
            })?;
        entry.destination = destination;
        Ok(entry.clone())
    }
}
