//! kv
//!
//! Codec for simple `key=value` text blocks.
//!
//! # Format
//!
//! One pair per line. A line is a pair when it starts with a key of
//! `[A-Za-z0-9._@-]` characters followed by `=`; the value is everything
//! after the first `=`. All other lines (comments, blanks, prose) are
//! ignored on parse. On unparse, an optional annotation per key is
//! emitted as a `#` comment line above the pair.
//!
//! Used by the wizard (annotated operator forms) and by raw config
//! ingestion at registration time.
//!
//! # Example
//!
//! ```
//! use confcast::kv;
//!
//! let pairs = kv::parse("# the port\nPORT=8080\nnot a pair\n");
//! assert_eq!(pairs.get("PORT").map(String::as_str), Some("8080"));
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static PAIR_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._@-]+=").expect("pair-line pattern is valid")
});

/// Parse a KV text block into ordered pairs.
///
/// Lines that do not look like `key=value` are skipped. The value is
/// everything after the first `=`, so values may themselves contain `=`.
pub fn parse(text: &str) -> IndexMap<String, String> {
    let mut pairs = IndexMap::new();
    for line in text.lines() {
        if !PAIR_LINE.is_match(line) {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            pairs.insert(key.to_string(), value.to_string());
        }
    }
    pairs
}

/// Serialize ordered pairs back into a KV text block.
///
/// `annotations` maps keys to comment text emitted on the line above the
/// pair; keys without an annotation get a bare `key=value` line. `indent`
/// inserts that many spaces on each side of the `=`.
pub fn unparse(
    pairs: &IndexMap<String, String>,
    annotations: Option<&IndexMap<String, String>>,
    indent: usize,
) -> String {
    let pad = " ".repeat(indent);
    let mut out = String::new();
    for (key, value) in pairs {
        if let Some(annotation) = annotations.and_then(|a| a.get(key)) {
            out.push_str(&format!("# {annotation}\n"));
        }
        out.push_str(&format!("{key}{pad}={pad}{value}\n"));
    }
    out
}
