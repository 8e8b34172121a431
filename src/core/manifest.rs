//! Manifest instances and the per-kind accessor surface.
//!
//! A [`Manifest`] owns one resource catalog and shares its definition's
//! configuration store. Recipe handlers declare resources through
//! [`Manifest::declare`] or the [`KindHandle`] returned by
//! [`Manifest::kind`]; tests and introspection read them back through the
//! same handles.

use super::accessor::AccessorTable;
use super::catalog::Catalog;
use super::config::Configuration;
use super::definition::ManifestDefinition;
use super::error::{ManifestError, Result};
use super::types::{yaml_value_to_string, Params, Reference, Resource};
use crate::realizer::{ApplyReport, DryRunRealizer, Realizer};
use crate::resources::{exec_search_path, KindInfo, TypeRegistry};
use indexmap::IndexMap;
use serde_yaml_ng::Value;
use std::fmt;
use std::sync::Arc;

/// One instance of a manifest definition.
pub struct Manifest {
    pub(crate) definition: Arc<ManifestDefinition>,
    pub(crate) accessors: Arc<AccessorTable>,
    pub(crate) realizer: Box<dyn Realizer>,
    pub(crate) catalog: Catalog,
    pub(crate) executed: bool,
    pub(crate) last_report: Option<ApplyReport>,
}

impl Manifest {
    /// New instance with the built-in kinds and a dry-run realizer.
    pub fn new(definition: Arc<ManifestDefinition>) -> Self {
        Self {
            definition,
            accessors: AccessorTable::builtin(),
            realizer: Box::new(DryRunRealizer::new()),
            catalog: Catalog::new(),
            executed: false,
            last_report: None,
        }
    }

    /// New instance that first merges `settings` into the definition's
    /// shared configuration.
    pub fn with_config<K, V, I>(definition: Arc<ManifestDefinition>, settings: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        definition.configure(settings);
        Self::new(definition)
    }

    /// Replace the realizer the catalog is handed to.
    pub fn with_realizer(mut self, realizer: impl Realizer + 'static) -> Self {
        self.realizer = Box::new(realizer);
        self
    }

    /// Resolve kinds through a different type registry.
    pub fn with_types(mut self, registry: &dyn TypeRegistry) -> Self {
        self.accessors = Arc::new(AccessorTable::from_registry(registry));
        self
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &Arc<ManifestDefinition> {
        &self.definition
    }

    /// The definition's resolved configuration (shared by all instances).
    pub fn configuration(&self) -> Configuration {
        self.definition.configuration()
    }

    /// Write settings through to the definition's configuration.
    pub fn configure<K, V, I>(&self, settings: I)
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.definition.configure(settings);
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    /// Report from the most recent successful or failed realization.
    pub fn last_report(&self) -> Option<&ApplyReport> {
        self.last_report.as_ref()
    }

    /// Every kind this manifest can declare.
    pub fn kinds(&self) -> impl Iterator<Item = &KindInfo> {
        self.accessors.kinds()
    }

    /// Accessor handle for one kind (singular or plural name).
    pub fn kind(&mut self, name: &str) -> Result<KindHandle<'_>> {
        let info = self.accessors.resolve(name)?.clone();
        Ok(KindHandle {
            manifest: self,
            info,
        })
    }

    /// Declare a resource, or merge parameters into an existing declaration.
    pub fn declare(
        &mut self,
        kind: &str,
        identity: impl Into<String>,
        parameters: Params,
    ) -> Result<Resource> {
        let info = self.accessors.resolve(kind)?.clone();
        self.upsert(&info, identity.into(), parameters)
    }

    /// Declare from a parameter mapping alone; the identity is read from the
    /// kind's namevar parameter.
    pub fn declare_named(&mut self, kind: &str, parameters: Params) -> Result<Resource> {
        let info = self.accessors.resolve(kind)?.clone();
        let identity = identity_from(&info, &parameters)?;
        self.upsert(&info, identity, parameters)
    }

    /// Reference a resource without declaring it.
    pub fn reference(&self, kind: &str, identity: impl Into<String>) -> Result<Reference> {
        let info = self.accessors.resolve(kind)?;
        Ok(Reference::new(info.name.clone(), identity))
    }

    /// Lookup only: the declared resource, or `None`. Never creates.
    pub fn resource(&self, kind: &str, identity: &str) -> Option<&Resource> {
        let info = self.accessors.resolve(kind).ok()?;
        self.catalog.get(&info.name, identity)
    }

    /// Every declared resource of one kind, keyed by identity.
    pub fn resources(&self, kind: &str) -> Result<IndexMap<&str, &Resource>> {
        let info = self.accessors.resolve(kind)?;
        Ok(collect_kind(&self.catalog, &info.name))
    }

    fn upsert(&mut self, info: &KindInfo, identity: String, mut parameters: Params) -> Result<Resource> {
        if self.catalog.contains(&info.name, &identity) {
            let (_, resource) = self.catalog.upsert(&info.name, &identity, parameters);
            let resource = resource.clone();
            tracing::trace!(manifest = %self.name(), resource = %resource.reference(), "updated resource");
            return Ok(resource);
        }

        if info.executes_commands && !parameters.contains_key("path") {
            parameters.insert("path".to_string(), Value::String(exec_search_path()));
        }

        // The catalog only holds resources the realizer accepted.
        let resource = Resource::new(info.name.clone(), identity, parameters);
        self.realizer.add_resource(&resource)?;
        let resource = self.catalog.insert(resource).clone();
        tracing::debug!(manifest = %self.name(), resource = %resource.reference(), "declared resource");
        Ok(resource)
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("definition", &self.definition.name())
            .field("resources", &self.catalog.len())
            .field("executed", &self.executed)
            .finish()
    }
}

fn identity_from(info: &KindInfo, parameters: &Params) -> Result<String> {
    match parameters.get(&info.namevar) {
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => Ok(yaml_value_to_string(v)),
        _ => Err(ManifestError::MissingIdentity {
            kind: info.name.clone(),
            namevar: info.namevar.clone(),
        }),
    }
}

fn collect_kind<'a>(catalog: &'a Catalog, kind: &'a str) -> IndexMap<&'a str, &'a Resource> {
    catalog
        .of_kind(kind)
        .map(|r| (r.identity.as_str(), r))
        .collect()
}

/// Declare, reference, and lookup operations for one resolved kind.
pub struct KindHandle<'a> {
    manifest: &'a mut Manifest,
    info: KindInfo,
}

impl KindHandle<'_> {
    pub fn info(&self) -> &KindInfo {
        &self.info
    }

    /// Reference a resource of this kind; the catalog is untouched.
    pub fn reference(&self, identity: impl Into<String>) -> Reference {
        Reference::new(self.info.name.clone(), identity)
    }

    pub fn declare(&mut self, identity: impl Into<String>, parameters: Params) -> Result<Resource> {
        self.manifest.upsert(&self.info, identity.into(), parameters)
    }

    pub fn declare_named(&mut self, parameters: Params) -> Result<Resource> {
        let identity = identity_from(&self.info, &parameters)?;
        self.manifest.upsert(&self.info, identity, parameters)
    }

    pub fn get(&self, identity: &str) -> Option<&Resource> {
        self.manifest.catalog.get(&self.info.name, identity)
    }

    pub fn all(&self) -> IndexMap<&str, &Resource> {
        collect_kind(&self.manifest.catalog, &self.info.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::params;
    use crate::resources::BuiltinTypes;

    fn manifest() -> Manifest {
        Manifest::new(ManifestDefinition::builder("test").build())
    }

    #[test]
    fn test_declare_then_update_keeps_one_entry() {
        let mut m = manifest();
        m.declare("exec", "foo", params([("a", 1)])).unwrap();
        m.declare("exec", "foo", params([("a", 2), ("b", 3)])).unwrap();
        let all = m.resources("exec").unwrap();
        assert_eq!(all.len(), 1);
        let foo = all["foo"];
        assert_eq!(foo.param("a"), Some(&Value::from(2)));
        assert_eq!(foo.param("b"), Some(&Value::from(3)));
    }

    #[test]
    fn test_exec_gets_search_path_on_creation() {
        let mut m = manifest();
        let r = m.declare("exec", "foo", params([("command", "true")])).unwrap();
        assert_eq!(r.param_str("path"), Some(exec_search_path().as_str()));
    }

    #[test]
    fn test_exec_explicit_path_is_kept() {
        let mut m = manifest();
        let r = m.declare("exec", "foo", params([("path", "/opt/bin")])).unwrap();
        assert_eq!(r.param_str("path"), Some("/opt/bin"));
    }

    #[test]
    fn test_non_exec_kinds_get_no_path() {
        let mut m = manifest();
        let r = m.declare("package", "curl", Params::new()).unwrap();
        assert!(r.param("path").is_none());
    }

    #[test]
    fn test_reference_never_touches_catalog() {
        let mut m = manifest();
        let r = m.reference("package", "foo").unwrap();
        assert_eq!(r.to_string(), "Package[foo]");
        let handle_ref = m.kind("packages").unwrap().reference("bar");
        assert_eq!(handle_ref, Reference::new("package", "bar"));
        assert!(m.catalog().is_empty());
        assert!(m.resources("package").unwrap().is_empty());
    }

    #[test]
    fn test_declared_resource_usable_as_reference_target() {
        let mut m = manifest();
        let pkg = m.declare("package", "foo", Params::new()).unwrap();
        let svc = m
            .declare("service", "foo", params([("require", Value::from(&pkg))]))
            .unwrap();
        assert_eq!(svc.param_str("require"), Some("Package[foo]"));
    }

    #[test]
    fn test_declare_named_uses_namevar() {
        let mut m = manifest();
        let r = m
            .declare_named("file", params([("path", "/etc/motd"), ("content", "hi")]))
            .unwrap();
        assert_eq!(r.identity, "/etc/motd");
        assert!(m.resource("file", "/etc/motd").is_some());
    }

    #[test]
    fn test_declare_named_missing_identity() {
        let mut m = manifest();
        let err = m.declare_named("file", params([("content", "hi")])).unwrap_err();
        assert!(matches!(err, ManifestError::MissingIdentity { ref namevar, .. } if namevar == "path"));
        assert!(m.catalog().is_empty());
    }

    #[test]
    fn test_unknown_kind_everywhere() {
        let mut m = manifest();
        assert!(matches!(
            m.declare("gizmo", "x", Params::new()),
            Err(ManifestError::UnknownResourceKind(_))
        ));
        assert!(m.reference("gizmo", "x").is_err());
        assert!(m.resources("gizmos").is_err());
        assert!(m.kind("gizmo").is_err());
        assert!(m.resource("gizmo", "x").is_none());
    }

    #[test]
    fn test_lookup_missing_identity_is_none() {
        let mut m = manifest();
        assert!(m.resource("exec", "nope").is_none());
        assert!(m.kind("exec").unwrap().get("nope").is_none());
        assert!(m.catalog().is_empty());
    }

    #[test]
    fn test_kind_handle_singular_and_plural_views() {
        let mut m = manifest();
        {
            let mut files = m.kind("files").unwrap();
            files.declare("/a", params([("mode", "0644")])).unwrap();
            files.declare("/b", Params::new()).unwrap();
            assert_eq!(files.all().len(), 2);
            assert_eq!(files.get("/a").unwrap().param_str("mode"), Some("0644"));
        }
        m.declare("package", "curl", Params::new()).unwrap();
        assert_eq!(m.kind("file").unwrap().all().len(), 2);
        assert_eq!(m.catalog().len(), 3);
    }

    #[test]
    fn test_instance_configuration_is_shared_per_definition() {
        let def = ManifestDefinition::builder("shared").build();
        let a = Manifest::with_config(def.clone(), [("role", "web")]);
        let b = Manifest::new(def.clone());
        b.configure([("tier", "front")]);
        assert_eq!(a.configuration()["role"], Value::String("web".into()));
        assert_eq!(a.configuration()["tier"], Value::String("front".into()));
        assert_eq!(def.configuration().len(), 2);
    }

    #[test]
    fn test_catalogs_are_per_instance() {
        let def = ManifestDefinition::builder("solo").build();
        let mut a = Manifest::new(def.clone());
        let b = Manifest::new(def);
        a.declare("package", "curl", Params::new()).unwrap();
        assert_eq!(a.catalog().len(), 1);
        assert!(b.catalog().is_empty());
    }

    #[test]
    fn test_rejected_registration_leaves_catalog_untouched() {
        use crate::realizer::Plan;
        use std::sync::Mutex;

        /// Refuses the first registration, accepts the rest.
        struct Flaky {
            refused: bool,
            registered: Arc<Mutex<Vec<Reference>>>,
        }

        impl Realizer for Flaky {
            fn add_resource(&mut self, resource: &Resource) -> Result<()> {
                if !self.refused {
                    self.refused = true;
                    return Err(ManifestError::recipe("realizer", "registration refused"));
                }
                self.registered.lock().unwrap().push(resource.reference());
                Ok(())
            }

            fn apply(&mut self, _plan: &Plan) -> Result<ApplyReport> {
                Ok(ApplyReport::default())
            }
        }

        let registered = Arc::new(Mutex::new(Vec::new()));
        let mut m = manifest().with_realizer(Flaky {
            refused: false,
            registered: Arc::clone(&registered),
        });

        assert!(m.declare("exec", "foo", params([("command", "true")])).is_err());
        assert!(m.catalog().is_empty());
        assert!(m.resource("exec", "foo").is_none());

        let r = m.declare("exec", "foo", params([("command", "true")])).unwrap();
        assert_eq!(r.param_str("path"), Some(exec_search_path().as_str()));
        assert_eq!(*registered.lock().unwrap(), vec![Reference::new("exec", "foo")]);
        assert_eq!(m.catalog().len(), 1);
    }

    #[test]
    fn test_with_types_restricts_kinds() {
        struct OnlyFiles;
        impl TypeRegistry for OnlyFiles {
            fn kinds(&self) -> Vec<KindInfo> {
                vec![KindInfo::new("file", "path")]
            }
        }
        let mut m = manifest().with_types(&OnlyFiles);
        assert_eq!(m.kinds().count(), 1);
        assert!(m.declare("package", "curl", Params::new()).is_err());
        assert!(m.declare("file", "/x", Params::new()).is_ok());
        assert!(manifest().with_types(&BuiltinTypes).kinds().count() > 30);
    }
}
