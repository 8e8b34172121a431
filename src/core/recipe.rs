//! Recipe registry entries and option resolution.
//!
//! A recipe is a named unit of work queued on a manifest definition. Each
//! entry pairs the handler name with the options it will be called with.
//! Options are fixed when the recipe is registered: an explicit mapping wins,
//! otherwise the configuration entry of the same name is used (or nothing).

use super::config::{canonical_key, Configuration};
use super::error::Result;
use super::manifest::Manifest;
use super::types::Params;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::sync::Arc;

/// A queued recipe: handler name plus resolved options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeEntry {
    pub name: String,
    #[serde(default)]
    pub options: Params,
}

impl RecipeEntry {
    pub fn new(name: impl Into<String>, options: Params) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// A recipe body. Every handler takes the same arguments; handlers that need
/// no options ignore them.
pub type RecipeFn = Arc<dyn Fn(&mut Manifest, &Params) -> Result<()> + Send + Sync>;

/// Resolve the options for a recipe registered without explicit options.
/// The recipe name is looked up in canonical form, so `:foo` finds `foo`.
pub fn resolve_options(name: &str, configuration: &Configuration) -> Params {
    let key = canonical_key(&Value::String(name.to_string()));
    match configuration.get(key.as_str()) {
        Some(Value::Mapping(map)) => map
            .iter()
            .map(|(k, v)| (canonical_key(k), v.clone()))
            .collect(),
        _ => Params::new(),
    }
}
