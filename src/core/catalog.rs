//! Resource catalog — the declared resources of one manifest instance.
//!
//! Keys are `(kind, identity)` and unique: declaring an existing key merges
//! parameters into the existing entry instead of adding a second one.
//! Iteration follows first-declaration order.

use super::types::{Params, Reference, Resource};
use indexmap::IndexMap;

/// Whether an upsert created a new entry or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Declared resources, keyed by `(kind, identity)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    resources: IndexMap<Reference, Resource>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the resource, or merge `parameters` into the existing one.
    pub fn upsert(&mut self, kind: &str, identity: &str, parameters: Params) -> (Upsert, &Resource) {
        let key = Reference::new(kind, identity);
        match self.resources.entry(key) {
            indexmap::map::Entry::Occupied(entry) => {
                let resource = entry.into_mut();
                resource.merge(parameters);
                (Upsert::Updated, &*resource)
            }
            indexmap::map::Entry::Vacant(entry) => {
                let resource = entry.insert(Resource::new(kind, identity, parameters));
                (Upsert::Created, &*resource)
            }
        }
    }

    /// Add a resource, replacing any entry with the same key.
    pub fn insert(&mut self, resource: Resource) -> &Resource {
        let key = resource.reference();
        let (index, _) = self.resources.insert_full(key, resource);
        &self.resources[index]
    }

    pub fn get(&self, kind: &str, identity: &str) -> Option<&Resource> {
        self.resources.get(&Reference::new(kind, identity))
    }

    /// Resolve a reference to its declared resource, if any.
    pub fn resolve(&self, reference: &Reference) -> Option<&Resource> {
        self.resources.get(reference)
    }

    pub fn contains(&self, kind: &str, identity: &str) -> bool {
        self.get(kind, identity).is_some()
    }

    /// Every resource of one kind, in declaration order.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.resources.values().filter(move |r| r.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::params;
    use proptest::prelude::*;
    use serde_yaml_ng::Value;

    #[test]
    fn test_upsert_creates_then_updates() {
        let mut catalog = Catalog::new();
        let (first, _) = catalog.upsert("package", "curl", params([("ensure", "installed")]));
        assert_eq!(first, Upsert::Created);
        let (second, r) = catalog.upsert("package", "curl", params([("ensure", "latest")]));
        assert_eq!(second, Upsert::Updated);
        assert_eq!(r.param_str("ensure"), Some("latest"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_upsert_merges_parameters() {
        let mut catalog = Catalog::new();
        catalog.upsert("k", "i", params([("a", 1)]));
        catalog.upsert("k", "i", params([("a", 2), ("b", 3)]));
        let r = catalog.get("k", "i").unwrap();
        assert_eq!(r.parameters, params([("a", 2), ("b", 3)]));
    }

    #[test]
    fn test_same_identity_different_kinds_are_distinct() {
        let mut catalog = Catalog::new();
        catalog.upsert("user", "deploy", Params::new());
        catalog.upsert("group", "deploy", Params::new());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.of_kind("user").count(), 1);
    }

    #[test]
    fn test_insert_replaces_same_key() {
        let mut catalog = Catalog::new();
        catalog.insert(Resource::new("file", "/a", params([("mode", "0644")])));
        let r = catalog.insert(Resource::new("file", "/a", params([("owner", "root")])));
        assert!(r.param("mode").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_get_missing_is_none() {
        let catalog = Catalog::new();
        assert!(catalog.get("file", "/etc/motd").is_none());
        assert!(!catalog.contains("file", "/etc/motd"));
    }

    #[test]
    fn test_resolve_reference() {
        let mut catalog = Catalog::new();
        catalog.upsert("service", "sshd", params([("ensure", "running")]));
        let r = catalog.resolve(&Reference::new("service", "sshd")).unwrap();
        assert_eq!(r.param("ensure"), Some(&Value::String("running".into())));
    }

    #[test]
    fn test_iteration_follows_first_declaration() {
        let mut catalog = Catalog::new();
        catalog.upsert("file", "b", Params::new());
        catalog.upsert("file", "a", Params::new());
        catalog.upsert("file", "b", params([("mode", "0644")]));
        let ids: Vec<&str> = catalog.iter().map(|r| r.identity.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    proptest! {
        #[test]
        fn prop_repeated_upsert_keeps_one_entry(values in proptest::collection::vec(0i64..100, 1..20)) {
            let mut catalog = Catalog::new();
            for v in &values {
                catalog.upsert("exec", "foo", params([("n", *v)]));
            }
            prop_assert_eq!(catalog.len(), 1);
            let last = *values.last().unwrap();
            prop_assert_eq!(catalog.get("exec", "foo").unwrap().param("n"), Some(&Value::from(last)));
        }
    }
}
