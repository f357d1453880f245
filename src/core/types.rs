//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`NamespaceName`] - Validated namespace identifier
//! - [`OverrideLevel`] - Closed three-variant override policy
//! - [`NamespaceRecord`] - Persisted namespace row (version + update time)
//! - [`ConfigEntry`] - Persisted configuration row
//! - [`TemplateEntry`] / [`Destination`] - Persisted template row
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs: a
//! `NamespaceName` can never escape the resource root via `..` or path
//! separators, and an `OverrideLevel` can never hold an unknown level,
//! so the resolver's level dispatch is exhaustive by construction.
//!
//! # Examples
//!
//! ```
//! use confcast::core::types::{NamespaceName, OverrideLevel};
//!
//! let ns = NamespaceName::new("billing-api").unwrap();
//! assert_eq!(ns.as_str(), "billing-api");
//!
//! assert!(NamespaceName::new("../etc").is_err());
//! assert!("default_overload".parse::<OverrideLevel>().is_ok());
//! assert!("sometimes".parse::<OverrideLevel>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid namespace name: {0}")]
    InvalidNamespace(String),

    #[error("invalid override level: {0}")]
    InvalidOverrideLevel(String),

    #[error("invalid destination address (expected host:port): {0}")]
    InvalidAddress(String),
}

/// A validated namespace identifier.
///
/// Namespace names are used as directory names under the resource root,
/// so the rules exist to keep the bundle-path join safe:
/// - Cannot be empty
/// - Only `[A-Za-z0-9._@-]` characters (no path separators, no spaces)
/// - Cannot be `.` or `..`
///
/// # Example
///
/// ```
/// use confcast::core::types::NamespaceName;
///
/// let ns = NamespaceName::new("payments").unwrap();
/// assert_eq!(ns.as_str(), "payments");
///
/// assert!(NamespaceName::new("").is_err());
/// assert!(NamespaceName::new("a/b").is_err());
/// assert!(NamespaceName::new("..").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Create a new validated namespace name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNamespace` if the name is empty, is a
    /// dot path component, or contains characters outside `[A-Za-z0-9._@-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() || name == "." || name == ".." {
            return Err(TypeError::InvalidNamespace(name));
        }
        let ok = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-'));
        if !ok {
            return Err(TypeError::InvalidNamespace(name));
        }
        Ok(Self(name))
    }

    /// The namespace as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NamespaceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NamespaceName> for String {
    fn from(value: NamespaceName) -> Self {
        value.0
    }
}

/// Per-key override policy declared by the catalog.
///
/// The three variants are a closed set; catalog rows carrying any other
/// level string fail at parse time with a catalog-integrity error. Keeping
/// this a plain enum makes the resolver's per-level dispatch exhaustive at
/// compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideLevel {
    /// Persisted value wins over the catalog default when present.
    Default,
    /// Caller override wins, then persisted value, then catalog default.
    Customized,
    /// The catalog default always wins; overrides and persisted values
    /// are ignored.
    DefaultOverload,
}

impl OverrideLevel {
    /// The catalog string form of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideLevel::Default => "default",
            OverrideLevel::Customized => "customized",
            OverrideLevel::DefaultOverload => "default_overload",
        }
    }
}

impl FromStr for OverrideLevel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(OverrideLevel::Default),
            "customized" => Ok(OverrideLevel::Customized),
            "default_overload" => Ok(OverrideLevel::DefaultOverload),
            other => Err(TypeError::InvalidOverrideLevel(other.to_string())),
        }
    }
}

impl fmt::Display for OverrideLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted namespace row.
///
/// One per namespace; created on first registration. `version` and
/// `update_time` change only when a re-registration carries a different
/// catalog version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRecord {
    pub namespace: String,
    pub version: String,
    pub update_time: DateTime<Utc>,
}

/// Persisted configuration row, unique per (namespace, key).
///
/// `value` is nullable: a key can be declared by the catalog without any
/// value; rendering coerces the null to an empty string where the value
/// is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub namespace: String,
    pub key: String,
    pub value: Option<String>,
    pub description: String,
    pub category: String,
}

/// Where a rendered artifact gets pushed.
///
/// `address` is `host:port` for the remote command channel; `path` is the
/// absolute destination file path on that host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub address: String,
    pub path: String,
    pub user: String,
    pub secret: String,
}

impl Destination {
    /// Split `address` into host and port.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidAddress` if the address is not of the
    /// form `host:port` with a numeric port.
    pub fn host_port(&self) -> Result<(&str, u16), TypeError> {
        let (host, port) = self
            .address
            .rsplit_once(':')
            .ok_or_else(|| TypeError::InvalidAddress(self.address.clone()))?;
        if host.is_empty() {
            return Err(TypeError::InvalidAddress(self.address.clone()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| TypeError::InvalidAddress(self.address.clone()))?;
        Ok((host, port))
    }
}

/// Persisted template row, unique per (namespace, template_name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub namespace: String,
    pub template_name: String,
    #[serde(flatten)]
    pub destination: Destination,
}
