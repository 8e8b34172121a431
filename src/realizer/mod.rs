//! Realizer abstraction — compile a catalog into a plan and apply it.
//!
//! The engine treats realization as a black box: it registers each newly
//! declared resource, asks for a plan once recipes have run, then applies the
//! plan and inspects the per-resource outcome. How a kind converges on a
//! machine, and in which dependency order, is the realizer's business.

pub mod dry_run;

pub use dry_run::DryRunRealizer;

use crate::core::catalog::Catalog;
use crate::core::error::Result;
use crate::core::types::{Params, Reference, Resource};
use serde::Serialize;
use serde_yaml_ng::Value;
use std::fmt;
use std::time::Duration;

/// Converts declared resources into system changes.
pub trait Realizer: Send {
    /// Called once per newly created catalog entry.
    fn add_resource(&mut self, _resource: &Resource) -> Result<()> {
        Ok(())
    }

    /// Compile the catalog into an applyable plan.
    fn compile(&self, name: &str, catalog: &Catalog) -> Result<Plan> {
        Ok(Plan::from_catalog(name, catalog))
    }

    /// Apply a plan. Per-resource failures belong in the report; an `Err`
    /// means the realizer itself faulted.
    fn apply(&mut self, plan: &Plan) -> Result<ApplyReport>;
}

// ============================================================================
// Plan
// ============================================================================

/// One resource scheduled for realization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedResource {
    pub reference: Reference,
    pub parameters: Params,
    pub description: String,

    /// Resources named by relationship parameters (`require`, `before`, ...)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Reference>,
}

/// Ordered realization plan for one catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    /// Manifest name
    pub name: String,

    /// Resources in catalog declaration order
    pub steps: Vec<PlannedResource>,

    /// BLAKE3 fingerprint of the desired state
    pub fingerprint: String,

    /// Relationship targets that are not declared in the catalog
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<Reference>,
}

impl Plan {
    /// Plan every resource in catalog order.
    pub fn from_catalog(name: &str, catalog: &Catalog) -> Self {
        let steps: Vec<PlannedResource> = catalog
            .iter()
            .map(|r| PlannedResource {
                reference: r.reference(),
                parameters: r.parameters.clone(),
                description: describe(r),
                relationships: relationships(r),
            })
            .collect();

        let mut unresolved: Vec<Reference> = Vec::new();
        for step in &steps {
            for target in &step.relationships {
                if catalog.resolve(target).is_none() && !unresolved.contains(target) {
                    tracing::warn!(resource = %step.reference, target = %target, "relationship target is not declared");
                    unresolved.push(target.clone());
                }
            }
        }

        let fingerprint = fingerprint(&steps);
        Self {
            name: name.to_string(),
            steps,
            fingerprint,
            unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Parameters whose values name other resources.
pub const RELATIONSHIP_PARAMS: &[&str] = &["require", "before", "notify", "subscribe"];

/// References held by a resource's relationship parameters. Values are a
/// single `Kind[id]` string or a sequence of them; anything else is skipped.
fn relationships(resource: &Resource) -> Vec<Reference> {
    RELATIONSHIP_PARAMS
        .iter()
        .filter_map(|name| resource.param(name))
        .flat_map(|value| match value {
            Value::Sequence(items) => items.iter().collect::<Vec<_>>(),
            single => vec![single],
        })
        .filter_map(|value| value.as_str().and_then(Reference::parse))
        .collect()
}

/// Human-readable one-liner for a planned resource.
fn describe(resource: &Resource) -> String {
    match resource.param_str("ensure") {
        Some(ensure) => format!("{} (ensure {})", resource.reference(), ensure),
        None => resource.reference().to_string(),
    }
}

/// Hash the desired state of every step. Returns `"blake3:{hex}"`.
pub fn fingerprint(steps: &[PlannedResource]) -> String {
    let mut hasher = blake3::Hasher::new();
    for step in steps {
        hasher.update(step.reference.to_string().as_bytes());
        hasher.update(b"\0");
        for (name, value) in &step.parameters {
            hasher.update(name.as_bytes());
            hasher.update(b"=");
            hasher.update(format!("{:?}", value).as_bytes());
            hasher.update(b"\0");
        }
        hasher.update(b"\n");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

// ============================================================================
// Outcomes
// ============================================================================

/// Convergence status of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceStatus {
    Converged,
    Failed,
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "CONVERGED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of realizing one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceOutcome {
    pub reference: Reference,
    pub status: ResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceOutcome {
    pub fn converged(reference: Reference) -> Self {
        Self {
            reference,
            status: ResourceStatus::Converged,
            error: None,
        }
    }

    pub fn failed(reference: Reference, error: impl Into<String>) -> Self {
        Self {
            reference,
            status: ResourceStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// Result of applying a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub outcomes: Vec<ResourceOutcome>,
    pub total_duration: Duration,
}

impl ApplyReport {
    pub fn converged(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == ResourceStatus::Converged)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == ResourceStatus::Failed)
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    /// `Kind[id]: error; ...` for every failed resource.
    pub fn failure_detail(&self) -> String {
        self.failures()
            .map(|o| format!("{}: {}", o.reference, o.error.as_deref().unwrap_or("failed")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
