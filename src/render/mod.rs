//! render
//!
//! The layered template-rendering environment.
//!
//! # Scopes
//!
//! Every render sees two named scopes:
//!
//! - `self` — the namespace's own resolved value map
//! - `peer` — the root namespace's resolved value map, **or**
//! - `bootstrap` — process settings, only when rendering the root
//!   namespace itself (it has no peer above it)
//!
//! # Undefined Coercion
//!
//! The engine tolerates undefined references: an absent key renders as
//! the empty string instead of failing. A field whose entire body is
//! such a reference therefore produces `""` — this distinguishes
//! "optional field omitted" from a real syntax error, which still fails
//! with [`RenderError::Syntax`] carrying the offending raw text. Null
//! values inside a scope behave exactly like absent keys.
//!
//! # Example
//!
//! ```
//! use confcast::render::{Renderer, RenderScopes};
//! use indexmap::IndexMap;
//!
//! let mut own = IndexMap::new();
//! own.insert("PORT".to_string(), Some("8080".to_string()));
//! let scopes = RenderScopes::for_namespace(own, IndexMap::new());
//!
//! let renderer = Renderer::new();
//! let out = renderer.render("port={{ self.PORT }}", &scopes).unwrap();
//! assert_eq!(out, "port=8080");
//! ```

pub mod filters;

use indexmap::IndexMap;
use minijinja::{Environment, ErrorKind, UndefinedBehavior, Value};
use thiserror::Error;

/// Scope name for the namespace's own values.
pub const SELF_SCOPE: &str = "self";
/// Scope name for the root namespace's values.
pub const PEER_SCOPE: &str = "peer";
/// Scope name for process settings (root namespace only).
pub const BOOTSTRAP_SCOPE: &str = "bootstrap";

/// Errors from template rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Malformed template syntax; carries the offending raw text.
    #[error("template syntax error in: {raw}")]
    Syntax { raw: String },

    /// The template parsed but evaluation failed (bad filter arguments,
    /// unknown filter, and the like).
    #[error("template evaluation failed for '{raw}': {message}")]
    Eval { raw: String, message: String },
}

/// A value map as seen by templates: key → nullable string.
pub type ScopeMap = IndexMap<String, Option<String>>;

/// The second scope next to `self`.
#[derive(Debug, Clone)]
enum PartnerScope {
    Peer(ScopeMap),
    Bootstrap(ScopeMap),
}

/// The two-namespace variable scope templates are evaluated against.
#[derive(Debug, Clone)]
pub struct RenderScopes {
    own: ScopeMap,
    partner: PartnerScope,
}

impl RenderScopes {
    /// Scopes for an ordinary namespace: `self` + `peer`.
    pub fn for_namespace(own: ScopeMap, peer: ScopeMap) -> Self {
        Self {
            own,
            partner: PartnerScope::Peer(peer),
        }
    }

    /// Scopes for the root namespace itself: `self` + `bootstrap`.
    pub fn for_root(own: ScopeMap, bootstrap: ScopeMap) -> Self {
        Self {
            own,
            partner: PartnerScope::Bootstrap(bootstrap),
        }
    }

    /// Build the template context. Null values become undefined so they
    /// render as empty rather than as a literal null marker.
    fn to_context(&self) -> Value {
        let (partner_name, partner_map) = match &self.partner {
            PartnerScope::Peer(map) => (PEER_SCOPE, map),
            PartnerScope::Bootstrap(map) => (BOOTSTRAP_SCOPE, map),
        };
        Value::from_iter([
            (SELF_SCOPE.to_string(), scope_value(&self.own)),
            (partner_name.to_string(), scope_value(partner_map)),
        ])
    }
}

fn scope_value(map: &ScopeMap) -> Value {
    Value::from_iter(map.iter().map(|(key, value)| {
        let value = match value {
            Some(s) => Value::from(s.as_str()),
            None => Value::UNDEFINED,
        };
        (key.clone(), value)
    }))
}

/// The template engine with custom filters installed.
///
/// One renderer is built per process and shared; rendering itself is
/// stateless with respect to the environment.
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // Chainable: undefined prints empty AND tolerates attribute
        // access, so `peer.X` stays empty for the root namespace, which
        // has no peer scope at all.
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        filters::register(&mut env);
        Self { env }
    }

    /// Render a template body against the given scopes.
    ///
    /// # Errors
    ///
    /// `RenderError::Syntax` for malformed template text,
    /// `RenderError::Eval` for failures during evaluation. Absent
    /// references are not errors (see module docs).
    pub fn render(&self, template: &str, scopes: &RenderScopes) -> Result<String, RenderError> {
        self.env
            .render_str(template, scopes.to_context())
            .map_err(|e| {
                if e.kind() == ErrorKind::SyntaxError {
                    RenderError::Syntax {
                        raw: template.to_string(),
                    }
                } else {
                    RenderError::Eval {
                        raw: template.to_string(),
                        message: e.to_string(),
                    }
                }
            })
    }

    /// Render a nullable raw value; null coerces to the empty string.
    pub fn render_value(
        &self,
        raw: Option<&str>,
        scopes: &RenderScopes,
    ) -> Result<String, RenderError> {
        match raw {
            None => Ok(String::new()),
            Some(raw) => self.render(raw, scopes),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
