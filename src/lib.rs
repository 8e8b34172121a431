//! marionette — declarative resource manifests.
//!
//! A manifest definition queues named recipes; a manifest instance runs them
//! once, collecting resource declarations into a catalog that a realizer
//! turns into a plan and applies.
//!
//! ```
//! use marionette::core::definition::ManifestDefinition;
//! use marionette::core::manifest::Manifest;
//! use marionette::core::types::params;
//!
//! let def = ManifestDefinition::builder("web")
//!     .handler("nginx", |m, _| {
//!         let pkg = m.declare("package", "nginx", params([("ensure", "installed")]))?;
//!         m.declare("service", "nginx", params([("require", &pkg)]))?;
//!         Ok(())
//!     })
//!     .recipe("nginx")
//!     .build();
//!
//! let mut manifest = Manifest::new(def);
//! assert!(manifest.execute(false));
//! assert_eq!(manifest.catalog().len(), 2);
//! ```

pub mod cli;
pub mod core;
pub mod realizer;
pub mod resources;
