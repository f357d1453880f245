//! wizard
//!
//! Generator for operator-facing wizard forms.
//!
//! A wizard is the annotated KV block listing every catalog key that is
//! flagged customizable and has no persisted value yet — the keys an
//! operator must fill in before (or while) registering a namespace. An
//! empty result signals "no wizard needed".

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::catalog::CatalogConfigRow;
use crate::core::types::OverrideLevel;
use crate::kv;

/// Compute the wizard diff for a namespace.
///
/// Keeps catalog keys absent from `persisted_keys` whose level is
/// [`OverrideLevel::Customized`] — the only level meaningfully exposed
/// for operator input — and emits them in catalog iteration order as
/// empty `key=` lines, each annotated with the catalog description.
pub fn diff(rows: &[CatalogConfigRow], persisted_keys: &HashSet<String>) -> String {
    let mut pairs = IndexMap::new();
    let mut annotations = IndexMap::new();
    for row in rows {
        if persisted_keys.contains(&row.key) {
            continue;
        }
        if row.level != OverrideLevel::Customized {
            continue;
        }
        pairs.insert(row.key.clone(), String::new());
        annotations.insert(row.key.clone(), row.description.clone());
    }
    if pairs.is_empty() {
        return String::new();
    }
    kv::unparse(&pairs, Some(&annotations), 0)
}
