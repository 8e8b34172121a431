//! Catalog value types — resources, references, and parameter maps.
//!
//! Parameters and configuration values are plain YAML values so that a
//! manifest loaded from disk and one built in code share one representation.
//! References are rendered in the canonical `Kind[identity]` form and can be
//! embedded in any parameter (e.g. `require: Package[nginx]`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::fmt;

/// Resource parameters, keyed by parameter name (order-preserving).
pub type Params = IndexMap<String, Value>;

/// Build a parameter map from `(name, value)` pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// ============================================================================
// References
// ============================================================================

/// A lightweight pointer to a resource by `(kind, identity)`.
///
/// References are never stored in the catalog; the target may be declared
/// later, or elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    pub kind: String,
    pub identity: String,
}

impl Reference {
    pub fn new(kind: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            identity: identity.into(),
        }
    }

    /// Parse the canonical `Kind[identity]` form. Kind matching is
    /// case-insensitive; the identity is taken verbatim.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let open = s.find('[')?;
        let inner = s[open + 1..].strip_suffix(']')?;
        let kind = &s[..open];
        if kind.is_empty()
            || inner.is_empty()
            || !kind
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
        {
            return None;
        }
        Some(Self::new(kind.to_ascii_lowercase(), inner))
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self
            .kind
            .split("::")
            .map(capitalize)
            .collect::<Vec<_>>()
            .join("::");
        write!(f, "{}[{}]", kind, self.identity)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::String(r.to_string())
    }
}

impl From<&Reference> for Value {
    fn from(r: &Reference) -> Self {
        Value::String(r.to_string())
    }
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ============================================================================
// Resources
// ============================================================================

/// A single declared unit of desired state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource kind (e.g. "file", "package", "exec")
    pub kind: String,

    /// Title, unique within its kind in one catalog
    pub identity: String,

    /// Declared parameters
    #[serde(default)]
    pub parameters: Params,
}

impl Resource {
    pub fn new(kind: impl Into<String>, identity: impl Into<String>, parameters: Params) -> Self {
        Self {
            kind: kind.into(),
            identity: identity.into(),
            parameters,
        }
    }

    /// A reference pointing at this resource.
    pub fn reference(&self) -> Reference {
        Reference::new(self.kind.clone(), self.identity.clone())
    }

    /// Look up a single parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Look up a string parameter.
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }

    /// Merge parameters from a re-declaration: same-named parameters are
    /// overwritten, parameters not mentioned are kept.
    pub fn merge(&mut self, parameters: Params) {
        for (name, value) in parameters {
            self.parameters.insert(name, value);
        }
    }
}

impl From<&Resource> for Value {
    fn from(r: &Resource) -> Self {
        r.reference().into()
    }
}

impl From<Resource> for Value {
    fn from(r: Resource) -> Self {
        r.reference().into()
    }
}

// ============================================================================
// Template helper
// ============================================================================

/// Convert a YAML value to a string for template resolution.
pub fn yaml_value_to_string(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => format!("{:?}", other),
    }
}
