//! Manifest definitions — recipe sequence, handlers, and configuration for
//! one manifest type.
//!
//! Definitions are built once through [`DefinitionBuilder`] and shared behind
//! an `Arc`. Deriving a definition copies the parent's recipe sequence,
//! handlers, and a snapshot of its configuration at derivation time; the
//! result is a plain value with no live link back to the parent.
//!
//! ```
//! use marionette::core::definition::ManifestDefinition;
//! use marionette::core::types::params;
//! use serde_yaml_ng::Value;
//!
//! let motd: Value = serde_yaml_ng::from_str("text: managed").unwrap();
//! let base = ManifestDefinition::builder("base")
//!     .configure([("motd", motd)])
//!     .handler("motd", |m, opts| {
//!         m.declare("file", "/etc/motd", params([("content", opts["text"].clone())]))?;
//!         Ok(())
//!     })
//!     .recipe("motd")
//!     .build();
//! assert_eq!(base.recipe_names(), vec!["motd"]);
//! ```

use super::config::{canonicalize, deep_merge, ConfigStore, Configuration};
use super::error::Result;
use super::manifest::Manifest;
use super::recipe::{resolve_options, RecipeEntry, RecipeFn};
use super::types::Params;
use indexmap::IndexMap;
use serde_yaml_ng::Value;
use std::fmt;
use std::sync::Arc;

/// A manifest type: ordered recipes, their handlers, and shared configuration.
pub struct ManifestDefinition {
    name: String,
    parent: Option<String>,
    recipes: Vec<RecipeEntry>,
    handlers: IndexMap<String, RecipeFn>,
    config: ConfigStore,
}

impl ManifestDefinition {
    /// Start a new root definition.
    pub fn builder(name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder {
            name: name.into(),
            parent: None,
            recipes: Vec::new(),
            handlers: IndexMap::new(),
            config: Configuration::new(),
        }
    }

    /// Start a definition that inherits from this one.
    pub fn derive(self: &Arc<Self>, name: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder {
            name: name.into(),
            parent: Some(self.name.clone()),
            recipes: self.recipes.clone(),
            handlers: self.handlers.clone(),
            config: self.config.configuration(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the definition this one was derived from, if any.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Resolved recipe sequence: inherited entries first.
    pub fn recipes(&self) -> &[RecipeEntry] {
        &self.recipes
    }

    pub fn recipe_names(&self) -> Vec<&str> {
        self.recipes.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn handler(&self, name: &str) -> Option<RecipeFn> {
        self.handlers.get(name).cloned()
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Deep-merge settings into this definition's shared configuration.
    pub fn configure<K, V, I>(&self, settings: I)
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.config.configure(settings);
    }

    /// Snapshot of the resolved configuration.
    pub fn configuration(&self) -> Configuration {
        self.config.configuration()
    }
}

impl fmt::Debug for ManifestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestDefinition")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("recipes", &self.recipe_names())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

/// Registration step for a [`ManifestDefinition`].
pub struct DefinitionBuilder {
    name: String,
    parent: Option<String>,
    recipes: Vec<RecipeEntry>,
    handlers: IndexMap<String, RecipeFn>,
    config: Configuration,
}

impl DefinitionBuilder {
    /// Deep-merge settings over the (possibly inherited) configuration.
    pub fn configure<K, V, I>(mut self, settings: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        deep_merge(&mut self.config, canonicalize(settings));
        self
    }

    /// Queue a recipe whose options come from the configuration entry of the
    /// same name, as it stands now.
    pub fn recipe(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let options = resolve_options(&name, &self.config);
        self.recipes.push(RecipeEntry::new(name, options));
        self
    }

    /// Queue a recipe with explicit options, ignoring configuration.
    pub fn recipe_with(mut self, name: impl Into<String>, options: Params) -> Self {
        self.recipes.push(RecipeEntry::new(name, options));
        self
    }

    /// Queue several recipes, each resolving options from configuration.
    pub fn recipes<S, I>(self, names: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        names.into_iter().fold(self, |b, name| b.recipe(name))
    }

    /// Queue several recipes sharing one explicit options mapping.
    pub fn recipes_with<S, I>(self, names: I, options: Params) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        names
            .into_iter()
            .fold(self, |b, name| b.recipe_with(name, options.clone()))
    }

    /// Register (or override) the handler a recipe name dispatches to.
    pub fn handler<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Manifest, &Params) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(f));
        self
    }

    pub fn build(self) -> Arc<ManifestDefinition> {
        tracing::debug!(
            definition = %self.name,
            parent = ?self.parent,
            recipes = self.recipes.len(),
            handlers = self.handlers.len(),
            "registered manifest definition"
        );
        Arc::new(ManifestDefinition {
            name: self.name,
            parent: self.parent,
            recipes: self.recipes,
            handlers: self.handlers,
            config: ConfigStore::new(self.config),
        })
    }
}
