//! resolve
//!
//! The configuration-merge engine.
//!
//! # Policy
//!
//! Each catalog row resolves independently (no cross-key dependencies,
//! order-independent):
//!
//! | Level              | Resolution order                                  |
//! |--------------------|---------------------------------------------------|
//! | `default_overload` | catalog default, always                           |
//! | `customized`       | override → persisted → catalog default            |
//! | `default`          | persisted → catalog default                       |
//!
//! A persisted key that exists with a null value counts as present and
//! resolves to null; the renderer later coerces null to the empty string.
//!
//! The level dispatch matches on [`OverrideLevel`], so an illegal level is
//! unrepresentable here — catalog parsing is the single place that turns
//! raw level strings into the closed enum.
//!
//! Output values are *not yet rendered*: the resolved map becomes its own
//! render input, so values may reference sibling keys, the peer
//! namespace, or (for the root namespace) bootstrap settings.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::catalog::CatalogConfigRow;
use crate::core::types::OverrideLevel;

/// One merged entry, prior to rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub key: String,
    pub value: Option<String>,
    pub description: String,
    pub category: String,
}

/// Merge catalog defaults, persisted values, and caller overrides.
///
/// The returned map preserves catalog row order, which downstream
/// consumers rely on (render scopes, wizard emission, entry insertion).
pub fn resolve(
    rows: &[CatalogConfigRow],
    persisted: &HashMap<String, Option<String>>,
    overrides: &IndexMap<String, String>,
) -> IndexMap<String, ResolvedEntry> {
    let mut resolved = IndexMap::with_capacity(rows.len());
    for row in rows {
        let value = match row.level {
            OverrideLevel::DefaultOverload => Some(row.default_value.clone()),
            OverrideLevel::Customized => match overrides.get(&row.key) {
                Some(override_value) => Some(override_value.clone()),
                None => match persisted.get(&row.key) {
                    Some(persisted_value) => persisted_value.clone(),
                    None => Some(row.default_value.clone()),
                },
            },
            OverrideLevel::Default => match persisted.get(&row.key) {
                Some(persisted_value) => persisted_value.clone(),
                None => Some(row.default_value.clone()),
            },
        };
        resolved.insert(
            row.key.clone(),
            ResolvedEntry {
                key: row.key.clone(),
                value,
                description: row.description.clone(),
                category: row.category.clone(),
            },
        );
    }
    resolved
}
