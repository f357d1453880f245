//! service
//!
//! The operations surface an HTTP façade (or the shipped CLI) calls.
//!
//! # Responsibilities
//!
//! - the registration pipeline: wizard KV parse → catalog load →
//!   resolve → render → atomic replacement → namespace upsert
//! - wizard generation, deployment orchestration, and the single-row
//!   config/template read and update paths
//! - the root-namespace guard: the root namespace registers itself via
//!   [`Service::bootstrap_root`] at process start and is reserved on the
//!   public registration and wizard paths
//!
//! # Concurrency
//!
//! Registrations for different namespaces proceed in parallel.
//! Registrations for the *same* namespace race on the wholesale
//! replacement step, so the service serializes resolve-and-commit per
//! namespace through a namespace-keyed lock registry. Deployments hold
//! no shared state and need no serialization.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{CatalogError, CatalogLoader};
use crate::core::settings::Settings;
use crate::core::types::{
    ConfigEntry, Destination, NamespaceName, NamespaceRecord, TemplateEntry, TypeError,
};
use crate::deploy::{DeployError, DeployReport, Deployer, TransportConnector};
use crate::kv;
use crate::render::{RenderError, RenderScopes, Renderer, ScopeMap};
use crate::resolve;
use crate::store::{Store, StoreError};
use crate::wizard;

/// Errors from service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    /// The root namespace is registered internally at startup, never
    /// through the public surface.
    #[error("namespace '{0}' is the root namespace; use bootstrap instead")]
    RootNamespaceReserved(String),

    #[error("configs not found (namespace: {0})")]
    ConfigsNotFound(String),

    #[error("config not found (namespace: {namespace}, key: {key})")]
    ConfigNotFound { namespace: String, key: String },

    #[error("template not found (namespace: {namespace}, name: {name})")]
    TemplateNotFound { namespace: String, name: String },
}

/// What a registration did.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterOutcome {
    pub namespace: String,
    pub version: String,
    pub configs: usize,
    pub templates: usize,
}

/// Namespace-keyed lock registry serializing same-namespace commits.
#[derive(Default)]
struct NamespaceLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl NamespaceLocks {
    async fn acquire(&self, namespace: &str) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.entry(namespace.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// The configuration-distribution engine's operation surface.
pub struct Service {
    settings: Settings,
    store: Arc<dyn Store>,
    catalogs: CatalogLoader,
    renderer: Renderer,
    deployer: Deployer,
    locks: NamespaceLocks,
}

impl Service {
    pub fn new(
        settings: Settings,
        store: Arc<dyn Store>,
        connector: Arc<dyn TransportConnector>,
    ) -> Self {
        let catalogs = CatalogLoader::new(settings.resources_path.clone());
        Self {
            settings,
            store,
            catalogs,
            renderer: Renderer::new(),
            deployer: Deployer::new(connector),
            locks: NamespaceLocks::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn is_root(&self, namespace: &str) -> bool {
        namespace == self.settings.root_namespace
    }

    fn ensure_not_root(&self, namespace: &str) -> Result<(), ServiceError> {
        if self.is_root(namespace) {
            return Err(ServiceError::RootNamespaceReserved(namespace.to_string()));
        }
        Ok(())
    }

    /// All registered namespaces.
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceRecord>, ServiceError> {
        Ok(self.store.list_namespaces().await?)
    }

    /// Every config entry of a namespace.
    ///
    /// # Errors
    ///
    /// `ConfigsNotFound` when the namespace has no entries at all — an
    /// unregistered namespace is indistinguishable from a missing one.
    pub async fn configs(&self, namespace: &str) -> Result<Vec<ConfigEntry>, ServiceError> {
        let entries = self.store.list_config_entries(namespace, None).await?;
        if entries.is_empty() {
            return Err(ServiceError::ConfigsNotFound(namespace.to_string()));
        }
        Ok(entries)
    }

    /// One config entry.
    pub async fn config(&self, namespace: &str, key: &str) -> Result<ConfigEntry, ServiceError> {
        self.store
            .list_config_entries(namespace, Some(key))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::ConfigNotFound {
                namespace: namespace.to_string(),
                key: key.to_string(),
            })
    }

    /// Update one config value. The raw text is rendered against the
    /// namespace's persisted values (`self`) and the root namespace's
    /// (`peer`) before being stored.
    pub async fn update_config_value(
        &self,
        namespace: &str,
        key: &str,
        raw_value: Option<&str>,
    ) -> Result<ConfigEntry, ServiceError> {
        let scopes = self.persisted_scopes(namespace).await?;
        let rendered = self.renderer.render_value(raw_value, &scopes)?;
        let entry = self
            .store
            .update_config_value(namespace, key, Some(rendered))
            .await?;
        tracing::info!(namespace, key, "config value updated");
        Ok(entry)
    }

    /// Template entries of a namespace (possibly empty).
    pub async fn templates(&self, namespace: &str) -> Result<Vec<TemplateEntry>, ServiceError> {
        Ok(self.store.list_template_entries(namespace, None).await?)
    }

    /// One template entry.
    pub async fn template(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<TemplateEntry, ServiceError> {
        self.store
            .list_template_entries(namespace, Some(name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::TemplateNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    /// Update one template's destination metadata, rendering each field
    /// like [`Service::update_config_value`] renders values.
    pub async fn update_template_destination(
        &self,
        namespace: &str,
        name: &str,
        raw: Destination,
    ) -> Result<TemplateEntry, ServiceError> {
        let scopes = self.persisted_scopes(namespace).await?;
        let destination = self.render_destination(&raw, &scopes)?;
        let entry = self
            .store
            .update_template_destination(namespace, name, destination)
            .await?;
        tracing::info!(namespace, template = name, "template destination updated");
        Ok(entry)
    }

    /// Generate the wizard diff for a namespace.
    ///
    /// Empty output means no customizable key awaits operator input.
    pub async fn wizard(&self, namespace: &str) -> Result<String, ServiceError> {
        self.ensure_not_root(namespace)?;
        let ns = NamespaceName::new(namespace)?;
        let catalog = self.catalogs.load(&ns)?;
        let persisted_keys: HashSet<String> = self
            .store
            .list_config_entries(namespace, None)
            .await?
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        Ok(wizard::diff(&catalog.configs, &persisted_keys))
    }

    /// Register (or re-register) a namespace, optionally with
    /// wizard-filled KV text as overrides.
    pub async fn register(
        &self,
        namespace: &str,
        wizard_text: Option<&str>,
    ) -> Result<RegisterOutcome, ServiceError> {
        self.ensure_not_root(namespace)?;
        self.register_any(namespace, wizard_text).await
    }

    /// Register the root namespace from its own bundle, consuming the
    /// bundle's `wizard.conf` as overrides when present. Run once at
    /// process start, before serving any other operation.
    pub async fn bootstrap_root(&self) -> Result<RegisterOutcome, ServiceError> {
        let root = self.settings.root_namespace.clone();
        let ns = NamespaceName::new(root.as_str())?;
        let wizard_path = self.catalogs.bundle_dir(&ns).join("wizard.conf");
        let wizard_text = match fs::read_to_string(&wizard_path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(ServiceError::Catalog(CatalogError::Io {
                    path: wizard_path,
                    source,
                }))
            }
        };
        self.register_any(&root, wizard_text.as_deref()).await
    }

    /// The full resolve-and-commit sequence, serialized per namespace.
    async fn register_any(
        &self,
        namespace: &str,
        wizard_text: Option<&str>,
    ) -> Result<RegisterOutcome, ServiceError> {
        let ns = NamespaceName::new(namespace)?;
        let _guard = self.locks.acquire(namespace).await;

        let overrides = wizard_text.map(kv::parse).unwrap_or_default();
        let catalog = self.catalogs.load(&ns)?;
        let persisted: HashMap<String, Option<String>> = self
            .store
            .list_config_entries(namespace, None)
            .await?
            .into_iter()
            .map(|entry| (entry.key, entry.value))
            .collect();

        let resolved = resolve::resolve(&catalog.configs, &persisted, &overrides);

        // The just-resolved raw map is its own render input.
        let own: ScopeMap = resolved
            .values()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect();
        let scopes = if self.is_root(namespace) {
            RenderScopes::for_root(own, self.settings.bootstrap_scope())
        } else {
            RenderScopes::for_namespace(own, self.root_scope().await?)
        };

        let mut entries = Vec::with_capacity(resolved.len());
        for item in resolved.values() {
            let value = self.renderer.render_value(item.value.as_deref(), &scopes)?;
            entries.push(ConfigEntry {
                namespace: namespace.to_string(),
                key: item.key.clone(),
                value: Some(value),
                description: item.description.clone(),
                category: item.category.clone(),
            });
        }

        let mut template_entries = Vec::with_capacity(catalog.templates.len());
        for row in &catalog.templates {
            template_entries.push(TemplateEntry {
                namespace: namespace.to_string(),
                template_name: row.template_name.clone(),
                destination: self.render_destination(&row.destination, &scopes)?,
            });
        }

        let config_count = entries.len();
        let template_count = template_entries.len();
        self.store.replace_config_entries(namespace, entries).await?;
        self.store
            .replace_template_entries(namespace, template_entries)
            .await?;
        let record = self
            .store
            .upsert_namespace(namespace, &catalog.version)
            .await?;

        tracing::info!(
            namespace,
            version = %record.version,
            configs = config_count,
            templates = template_count,
            "namespace registered"
        );
        Ok(RegisterOutcome {
            namespace: namespace.to_string(),
            version: record.version,
            configs: config_count,
            templates: template_count,
        })
    }

    /// Render and push one template artifact to its destination.
    pub async fn deploy(
        &self,
        namespace: &str,
        template_name: &str,
    ) -> Result<DeployReport, ServiceError> {
        let ns = NamespaceName::new(namespace)?;
        let template = self.template(namespace, template_name).await?;

        // Deploy-time rendering requires both persisted maps to exist.
        let own = to_scope(self.configs(namespace).await?);
        let peer = to_scope(self.configs(&self.settings.root_namespace).await?);
        let scopes = RenderScopes::for_namespace(own, peer);

        let body = self.catalogs.template_body(&ns, template_name)?;
        let rendered = self.renderer.render(&body, &scopes)?;
        Ok(self.deployer.deploy(&rendered, &template.destination).await?)
    }

    /// Tolerant scopes from persisted state: empty maps for anything not
    /// yet registered. Used by the single-row update paths.
    async fn persisted_scopes(&self, namespace: &str) -> Result<RenderScopes, ServiceError> {
        let own = to_scope(self.store.list_config_entries(namespace, None).await?);
        if self.is_root(namespace) {
            return Ok(RenderScopes::for_root(own, self.settings.bootstrap_scope()));
        }
        Ok(RenderScopes::for_namespace(own, self.root_scope().await?))
    }

    /// The root namespace's persisted map; empty before bootstrap.
    async fn root_scope(&self) -> Result<ScopeMap, ServiceError> {
        Ok(to_scope(
            self.store
                .list_config_entries(&self.settings.root_namespace, None)
                .await?,
        ))
    }

    fn render_destination(
        &self,
        raw: &Destination,
        scopes: &RenderScopes,
    ) -> Result<Destination, RenderError> {
        Ok(Destination {
            address: self.renderer.render(&raw.address, scopes)?,
            path: self.renderer.render(&raw.path, scopes)?,
            user: self.renderer.render(&raw.user, scopes)?,
            secret: self.renderer.render(&raw.secret, scopes)?,
        })
    }
}

fn to_scope(entries: Vec<ConfigEntry>) -> ScopeMap {
    entries
        .into_iter()
        .map(|entry| (entry.key, entry.value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::mock::MockConnector;
    use crate::store::MemoryStore;

    fn service_with(settings: Settings) -> (Service, MemoryStore) {
        let store = MemoryStore::new();
        let service = Service::new(
            settings,
            Arc::new(store.clone()),
            Arc::new(MockConnector::new()),
        );
        (service, store)
    }

    #[tokio::test]
    async fn root_namespace_is_reserved_on_the_public_paths() {
        let (service, _) = service_with(Settings::default());
        let err = service.register("hub", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::RootNamespaceReserved(_)));
        let err = service.wizard("hub").await.unwrap_err();
        assert!(matches!(err, ServiceError::RootNamespaceReserved(_)));
    }

    #[tokio::test]
    async fn invalid_namespace_names_are_rejected_before_io() {
        let (service, _) = service_with(Settings::default());
        let err = service.register("../escape", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidName(_)));
    }

    #[tokio::test]
    async fn configs_of_unknown_namespace_is_not_found() {
        let (service, _) = service_with(Settings::default());
        let err = service.configs("ghost").await.unwrap_err();
        assert!(matches!(err, ServiceError::ConfigsNotFound(_)));
    }

    #[tokio::test]
    async fn update_config_value_renders_against_persisted_state() {
        let (service, store) = service_with(Settings::default());
        store
            .replace_config_entries(
                "svc",
                vec![
                    ConfigEntry {
                        namespace: "svc".into(),
                        key: "HOST".into(),
                        value: Some("db.internal".into()),
                        description: String::new(),
                        category: String::new(),
                    },
                    ConfigEntry {
                        namespace: "svc".into(),
                        key: "URL".into(),
                        value: Some("old".into()),
                        description: String::new(),
                        category: String::new(),
                    },
                ],
            )
            .await
            .unwrap();

        let entry = service
            .update_config_value("svc", "URL", Some("https://{{ self.HOST }}/api"))
            .await
            .unwrap();
        assert_eq!(entry.value.as_deref(), Some("https://db.internal/api"));
    }

    #[tokio::test]
    async fn update_of_missing_config_surfaces_store_not_found() {
        let (service, _) = service_with(Settings::default());
        let err = service
            .update_config_value("svc", "NOPE", Some("v"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
    }
}
