//! Dry-run realizer — records the plan, changes nothing.

use super::{ApplyReport, Plan, Realizer, ResourceOutcome};
use crate::core::error::Result;
use crate::core::types::{Reference, Resource};
use std::time::Instant;

/// Reports every planned resource as converged without touching the system.
#[derive(Debug, Clone, Default)]
pub struct DryRunRealizer {
    registered: Vec<Reference>,
    applied: Vec<Plan>,
}

impl DryRunRealizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources registered through `add_resource`, in order.
    pub fn registered(&self) -> &[Reference] {
        &self.registered
    }

    /// Plans applied so far.
    pub fn applied(&self) -> &[Plan] {
        &self.applied
    }
}

impl Realizer for DryRunRealizer {
    fn add_resource(&mut self, resource: &Resource) -> Result<()> {
        tracing::trace!(resource = %resource.reference(), "registered resource");
        self.registered.push(resource.reference());
        Ok(())
    }

    fn apply(&mut self, plan: &Plan) -> Result<ApplyReport> {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(plan.len());
        for step in &plan.steps {
            tracing::info!(resource = %step.reference, "would apply {}", step.description);
            outcomes.push(ResourceOutcome::converged(step.reference.clone()));
        }
        self.applied.push(plan.clone());
        Ok(ApplyReport {
            outcomes,
            total_duration: start.elapsed(),
        })
    }
}
