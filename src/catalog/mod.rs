//! catalog
//!
//! Loader and validator for per-namespace resource bundles.
//!
//! # Bundle Layout
//!
//! Each namespace owns one directory under the resource root:
//!
//! ```text
//! <resources>/<namespace>/
//!   VERSION             version marker (trimmed verbatim)
//!   config_meta.tsv     columns: key, level, value, description, category
//!   template_meta.tsv   columns: template_name, dest_address, dest_path,
//!                       dest_user, dest_secret
//!   templates/          one file per template, named as referenced above
//! ```
//!
//! Tabular resources are addressed by their name before the first `.`;
//! the extension selects the delimited format via
//! [`table::TableFormat::for_extension`].
//!
//! # Validation
//!
//! - every config row's `level` must parse into the closed
//!   [`OverrideLevel`] enum (`MetaIllegal` otherwise)
//! - every template row's `template_name` must exist in `templates/`
//!   (`TemplateNotFound` naming the row and the available set)
//!
//! Loading is a pure function of bundle contents: no side effects, safe
//! to call repeatedly and concurrently for different namespaces.

pub mod table;

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::{Destination, NamespaceName, OverrideLevel};
use table::{TableError, TableFormat};

/// Resource names required inside every bundle.
const VERSION_RESOURCE: &str = "VERSION";
const CONFIG_META_RESOURCE: &str = "config_meta";
const TEMPLATE_META_RESOURCE: &str = "template_meta";
const TEMPLATES_DIR: &str = "templates";

/// Errors from catalog loading and validation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The namespace has no bundle directory at all.
    #[error("resource bundle not found for namespace '{namespace}'")]
    BundleNotFound { namespace: String },

    /// A required resource is missing from the bundle.
    #[error("resource '{resource}' not found in bundle for namespace '{namespace}'")]
    ResourceNotFound { namespace: String, resource: String },

    /// A tabular resource has an extension with no registered format.
    #[error("resource '{resource}' has unsupported table format '{extension}'")]
    UnsupportedFormat { resource: String, extension: String },

    /// A tabular resource failed structural parsing.
    #[error("resource '{resource}' is malformed: {source}")]
    Malformed {
        resource: String,
        source: TableError,
    },

    /// A tabular resource's header lacks a required column.
    #[error("resource '{resource}' is missing column '{column}'")]
    MissingColumn { resource: String, column: String },

    /// A config row carries a level outside the closed enum.
    #[error("illegal override level in catalog row: {row}")]
    MetaIllegal { row: String },

    /// A template row references a file absent from `templates/`.
    #[error(
        "template file '{template_name}' not found for namespace '{namespace}' \
         (available: {available:?})"
    )]
    TemplateNotFound {
        namespace: String,
        template_name: String,
        available: Vec<String>,
    },

    /// Underlying filesystem failure.
    #[error("i/o error reading bundle at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// One parsed config-metadata row. Transient: parsed fresh from the
/// bundle on each registration, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfigRow {
    pub key: String,
    pub level: OverrideLevel,
    pub default_value: String,
    pub description: String,
    pub category: String,
}

/// One parsed template-metadata row with raw (unrendered) destination
/// fields. Transient, like [`CatalogConfigRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTemplateRow {
    pub template_name: String,
    pub destination: Destination,
}

/// A fully loaded and validated bundle.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub version: String,
    pub configs: Vec<CatalogConfigRow>,
    pub templates: Vec<CatalogTemplateRow>,
}

/// Raw contents of a bundle directory, keyed by resource name.
struct BundleContents {
    /// File resources: name (before first `.`) → (content, extension).
    files: HashMap<String, (String, String)>,
    /// Directory resources: name → entry file names.
    dirs: HashMap<String, Vec<String>>,
}

/// Reads and validates namespace resource bundles.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    root: PathBuf,
}

impl CatalogLoader {
    /// Create a loader over a resource root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory of one namespace's bundle.
    pub fn bundle_dir(&self, namespace: &NamespaceName) -> PathBuf {
        self.root.join(namespace.as_str())
    }

    /// Load and validate the bundle for one namespace.
    ///
    /// # Errors
    ///
    /// See [`CatalogError`]; every failure names the offending resource,
    /// row, or file.
    pub fn load(&self, namespace: &NamespaceName) -> Result<Catalog, CatalogError> {
        let contents = self.read_bundle(namespace)?;

        let version = contents
            .files
            .get(VERSION_RESOURCE)
            .map(|(content, _)| content.trim().to_string())
            .ok_or_else(|| CatalogError::ResourceNotFound {
                namespace: namespace.to_string(),
                resource: VERSION_RESOURCE.to_string(),
            })?;

        let configs = parse_config_meta(namespace, &contents)?;

        let available = contents
            .dirs
            .get(TEMPLATES_DIR)
            .cloned()
            .ok_or_else(|| CatalogError::ResourceNotFound {
                namespace: namespace.to_string(),
                resource: TEMPLATES_DIR.to_string(),
            })?;
        let templates = parse_template_meta(namespace, &contents, &available)?;

        Ok(Catalog {
            version,
            configs,
            templates,
        })
    }

    /// Read one template artifact's body for deploy-time rendering.
    ///
    /// # Errors
    ///
    /// `TemplateNotFound` when the file is absent; `Io` on any other
    /// filesystem failure.
    pub fn template_body(
        &self,
        namespace: &NamespaceName,
        template_name: &str,
    ) -> Result<String, CatalogError> {
        let dir = self.bundle_dir(namespace).join(TEMPLATES_DIR);
        let path = dir.join(template_name);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CatalogError::TemplateNotFound {
                namespace: namespace.to_string(),
                template_name: template_name.to_string(),
                available: list_dir(&dir).unwrap_or_default(),
            }),
            Err(source) => Err(CatalogError::Io { path, source }),
        }
    }

    /// Collect every resource in the bundle directory.
    fn read_bundle(&self, namespace: &NamespaceName) -> Result<BundleContents, CatalogError> {
        let dir = self.bundle_dir(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CatalogError::BundleNotFound {
                    namespace: namespace.to_string(),
                })
            }
            Err(source) => return Err(CatalogError::Io { path: dir, source }),
        };

        let mut contents = BundleContents {
            files: HashMap::new(),
            dirs: HashMap::new(),
        };
        for entry in entries {
            let entry = entry.map_err(|source| CatalogError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            if path.is_dir() {
                contents.dirs.insert(name, list_dir(&path)?);
            } else {
                let content =
                    fs::read_to_string(&path).map_err(|source| CatalogError::Io { path, source })?;
                let (stem, extension) = match name.split_once('.') {
                    Some((stem, extension)) => (stem.to_string(), extension.to_string()),
                    None => (name, String::new()),
                };
                contents.files.insert(stem, (content, extension));
            }
        }
        Ok(contents)
    }
}

/// List a directory's entry names, sorted for stable error messages.
fn list_dir(path: &Path) -> Result<Vec<String>, CatalogError> {
    let entries = fs::read_dir(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Parse one tabular resource out of the bundle contents.
fn parse_rows(
    namespace: &NamespaceName,
    contents: &BundleContents,
    resource: &str,
) -> Result<Vec<indexmap::IndexMap<String, String>>, CatalogError> {
    let (content, extension) =
        contents
            .files
            .get(resource)
            .ok_or_else(|| CatalogError::ResourceNotFound {
                namespace: namespace.to_string(),
                resource: resource.to_string(),
            })?;
    let format =
        TableFormat::for_extension(extension).ok_or_else(|| CatalogError::UnsupportedFormat {
            resource: resource.to_string(),
            extension: extension.clone(),
        })?;
    format.parse(content).map_err(|source| CatalogError::Malformed {
        resource: resource.to_string(),
        source,
    })
}

/// Address one column of a parsed row by name.
fn column<'a>(
    row: &'a indexmap::IndexMap<String, String>,
    resource: &str,
    name: &str,
) -> Result<&'a str, CatalogError> {
    row.get(name)
        .map(String::as_str)
        .ok_or_else(|| CatalogError::MissingColumn {
            resource: resource.to_string(),
            column: name.to_string(),
        })
}

fn parse_config_meta(
    namespace: &NamespaceName,
    contents: &BundleContents,
) -> Result<Vec<CatalogConfigRow>, CatalogError> {
    let rows = parse_rows(namespace, contents, CONFIG_META_RESOURCE)?;
    let mut configs = Vec::with_capacity(rows.len());
    for row in rows {
        let key = column(&row, CONFIG_META_RESOURCE, "key")?;
        let level_raw = column(&row, CONFIG_META_RESOURCE, "level")?;
        let level: OverrideLevel = level_raw.parse().map_err(|_| CatalogError::MetaIllegal {
            row: format!("key={key} level={level_raw}"),
        })?;
        configs.push(CatalogConfigRow {
            key: key.to_string(),
            level,
            default_value: column(&row, CONFIG_META_RESOURCE, "value")?.to_string(),
            description: column(&row, CONFIG_META_RESOURCE, "description")?.to_string(),
            category: column(&row, CONFIG_META_RESOURCE, "category")?.to_string(),
        });
    }
    Ok(configs)
}

fn parse_template_meta(
    namespace: &NamespaceName,
    contents: &BundleContents,
    available: &[String],
) -> Result<Vec<CatalogTemplateRow>, CatalogError> {
    let rows = parse_rows(namespace, contents, TEMPLATE_META_RESOURCE)?;
    let mut templates = Vec::with_capacity(rows.len());
    for row in rows {
        let template_name = column(&row, TEMPLATE_META_RESOURCE, "template_name")?;
        if !available.iter().any(|name| name == template_name) {
            return Err(CatalogError::TemplateNotFound {
                namespace: namespace.to_string(),
                template_name: template_name.to_string(),
                available: available.to_vec(),
            });
        }
        templates.push(CatalogTemplateRow {
            template_name: template_name.to_string(),
            destination: Destination {
                address: column(&row, TEMPLATE_META_RESOURCE, "dest_address")?.to_string(),
                path: column(&row, TEMPLATE_META_RESOURCE, "dest_path")?.to_string(),
                user: column(&row, TEMPLATE_META_RESOURCE, "dest_user")?.to_string(),
                secret: column(&row, TEMPLATE_META_RESOURCE, "dest_secret")?.to_string(),
            },
        });
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG_META: &str = "key\tlevel\tvalue\tdescription\tcategory\n\
        PORT\tdefault\t8080\tlisten port\tnet\n\
        DB_HOST\tcustomized\t\tdatabase host\tdb\n";
    const TEMPLATE_META: &str = "template_name\tdest_address\tdest_path\tdest_user\tdest_secret\n\
        app.conf\t10.0.0.1:22\t/etc/app.conf\tdeploy\thunter2\n";

    fn namespace() -> NamespaceName {
        NamespaceName::new("svc").unwrap()
    }

    fn write_bundle(root: &Path) {
        let dir = root.join("svc");
        fs::create_dir_all(dir.join("templates")).unwrap();
        fs::write(dir.join("VERSION"), "1.2.0\n").unwrap();
        fs::write(dir.join("config_meta.tsv"), CONFIG_META).unwrap();
        fs::write(dir.join("template_meta.tsv"), TEMPLATE_META).unwrap();
        fs::write(dir.join("templates").join("app.conf"), "port={{ self.PORT }}\n").unwrap();
    }

    #[test]
    fn loads_a_complete_bundle() {
        let tmp = TempDir::new().unwrap();
        write_bundle(tmp.path());
        let catalog = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap();
        assert_eq!(catalog.version, "1.2.0");
        assert_eq!(catalog.configs.len(), 2);
        assert_eq!(catalog.configs[0].key, "PORT");
        assert_eq!(catalog.configs[1].level, OverrideLevel::Customized);
        assert_eq!(catalog.templates.len(), 1);
        assert_eq!(catalog.templates[0].destination.path, "/etc/app.conf");
    }

    #[test]
    fn missing_bundle_directory() {
        let tmp = TempDir::new().unwrap();
        let err = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap_err();
        assert!(matches!(err, CatalogError::BundleNotFound { .. }));
    }

    #[test]
    fn each_missing_resource_is_named() {
        for missing in ["VERSION", "config_meta.tsv", "template_meta.tsv", "templates"] {
            let tmp = TempDir::new().unwrap();
            write_bundle(tmp.path());
            let target = tmp.path().join("svc").join(missing);
            if target.is_dir() {
                fs::remove_dir_all(&target).unwrap();
            } else {
                fs::remove_file(&target).unwrap();
            }
            let err = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap_err();
            match err {
                CatalogError::ResourceNotFound { resource, .. } => {
                    assert_eq!(resource, missing.trim_end_matches(".tsv"));
                }
                other => panic!("expected ResourceNotFound for {missing}, got {other:?}"),
            }
        }
    }

    #[test]
    fn illegal_level_names_the_row() {
        let tmp = TempDir::new().unwrap();
        write_bundle(tmp.path());
        fs::write(
            tmp.path().join("svc").join("config_meta.tsv"),
            "key\tlevel\tvalue\tdescription\tcategory\nPORT\tsometimes\t1\td\tc\n",
        )
        .unwrap();
        let err = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap_err();
        match err {
            CatalogError::MetaIllegal { row } => {
                assert!(row.contains("PORT"));
                assert!(row.contains("sometimes"));
            }
            other => panic!("expected MetaIllegal, got {other:?}"),
        }
    }

    #[test]
    fn dangling_template_reference_names_available_set() {
        let tmp = TempDir::new().unwrap();
        write_bundle(tmp.path());
        fs::remove_file(tmp.path().join("svc/templates/app.conf")).unwrap();
        fs::write(tmp.path().join("svc/templates/other.conf"), "x").unwrap();
        let err = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap_err();
        match err {
            CatalogError::TemplateNotFound {
                template_name,
                available,
                ..
            } => {
                assert_eq!(template_name, "app.conf");
                assert_eq!(available, vec!["other.conf".to_string()]);
            }
            other => panic!("expected TemplateNotFound, got {other:?}"),
        }
    }

    #[test]
    fn unknown_table_extension_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_bundle(tmp.path());
        let dir = tmp.path().join("svc");
        fs::remove_file(dir.join("config_meta.tsv")).unwrap();
        fs::write(dir.join("config_meta.csv"), "key,level\n").unwrap();
        let err = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_column_is_named() {
        let tmp = TempDir::new().unwrap();
        write_bundle(tmp.path());
        fs::write(
            tmp.path().join("svc").join("config_meta.tsv"),
            "key\tlevel\nPORT\tdefault\n",
        )
        .unwrap();
        let err = CatalogLoader::new(tmp.path()).load(&namespace()).unwrap_err();
        match err {
            CatalogError::MissingColumn { column, .. } => assert_eq!(column, "value"),
            other => panic!("expected MissingColumn, got {other:?}"),
        }
    }

    #[test]
    fn template_body_reads_and_reports_missing() {
        let tmp = TempDir::new().unwrap();
        write_bundle(tmp.path());
        let loader = CatalogLoader::new(tmp.path());
        let body = loader.template_body(&namespace(), "app.conf").unwrap();
        assert!(body.contains("{{ self.PORT }}"));
        let err = loader.template_body(&namespace(), "nope.conf").unwrap_err();
        assert!(matches!(err, CatalogError::TemplateNotFound { .. }));
    }
}
