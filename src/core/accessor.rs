//! Kind dispatch table.
//!
//! Built once from a [`TypeRegistry`]. Callers resolve a kind name (singular
//! `package` or plural `packages`) to its [`KindInfo`] here instead of through
//! per-kind generated methods.

use super::error::{ManifestError, Result};
use crate::resources::{BuiltinTypes, KindInfo, TypeRegistry};
use indexmap::IndexMap;
use std::sync::{Arc, OnceLock};

/// Kind name → kind description, plus plural aliases.
#[derive(Debug, Clone, Default)]
pub struct AccessorTable {
    kinds: IndexMap<String, KindInfo>,
    plurals: IndexMap<String, String>,
}

impl AccessorTable {
    pub fn from_registry(registry: &dyn TypeRegistry) -> Self {
        let mut table = Self::default();
        for info in registry.kinds() {
            table.plurals.insert(pluralize(&info.name), info.name.clone());
            table.kinds.insert(info.name.clone(), info);
        }
        tracing::trace!(kinds = table.kinds.len(), "built kind accessor table");
        table
    }

    /// Shared table for the built-in kinds.
    pub fn builtin() -> Arc<Self> {
        static BUILTIN: OnceLock<Arc<AccessorTable>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| Arc::new(Self::from_registry(&BuiltinTypes)))
            .clone()
    }

    /// Resolve a singular or plural kind name.
    pub fn resolve(&self, name: &str) -> Result<&KindInfo> {
        self.kinds
            .get(name)
            .or_else(|| self.plurals.get(name).and_then(|k| self.kinds.get(k)))
            .ok_or_else(|| ManifestError::UnknownResourceKind(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &KindInfo> {
        self.kinds.values()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// English plural of a kind name (`package` → `packages`, `host` → `hosts`,
/// `mailalias` → `mailaliases`).
pub fn pluralize(name: &str) -> String {
    if name.ends_with('s')
        || name.ends_with('x')
        || name.ends_with("ch")
        || name.ends_with("sh")
    {
        format!("{}es", name)
    } else if name.ends_with('y')
        && !name.ends_with("ay")
        && !name.ends_with("ey")
        && !name.ends_with("oy")
    {
        format!("{}ies", &name[..name.len() - 1])
    } else {
        format!("{}s", name)
    }
}
