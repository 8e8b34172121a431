//! Execution engine — evaluate recipes, realize the catalog, once.
//!
//! evaluate recipes (in order) → compile plan → apply → mark executed
//!
//! A manifest is realized at most once unless the caller forces it. The
//! executed flag is set whatever the outcome. [`Manifest::execute`] folds every
//! fault into `false`; [`Manifest::execute_strict`] hands the fault back.

use super::error::{ManifestError, Result};
use super::manifest::Manifest;
use crate::realizer::{ApplyReport, Plan};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl Manifest {
    /// Recipes whose handler this manifest does not expose.
    pub fn missing_recipes(&self) -> Vec<&str> {
        self.definition
            .recipes()
            .iter()
            .filter(|r| !self.definition.has_handler(&r.name))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// True when every recipe has a handler and the manifest has not run.
    pub fn is_executable(&self) -> bool {
        !self.executed && self.missing_recipes().is_empty()
    }

    /// Run the manifest. Returns `false` if it already ran (and `force` is
    /// not set) or if any recipe or resource failed.
    pub fn execute(&mut self, force: bool) -> bool {
        match self.run(force) {
            Ok(applied) => applied,
            Err(e) => {
                warn!(manifest = %self.name(), error = %e, "manifest execution failed");
                false
            }
        }
    }

    /// Run the manifest, propagating any fault. Returns `Ok(false)` if it
    /// already ran and `force` is not set.
    pub fn execute_strict(&mut self, force: bool) -> Result<bool> {
        self.run(force)
    }

    /// Invoke every registered recipe handler in order with its options.
    pub fn evaluate_recipes(&mut self) -> Result<()> {
        let definition = Arc::clone(&self.definition);
        for entry in definition.recipes() {
            let handler = definition
                .handler(&entry.name)
                .ok_or_else(|| ManifestError::MissingCapability {
                    manifest: definition.name().to_string(),
                    recipe: entry.name.clone(),
                })?;
            debug!(manifest = %definition.name(), recipe = %entry.name, "evaluating recipe");
            handler(self, &entry.options)?;
        }
        Ok(())
    }

    /// Compile the current catalog into a plan without applying it.
    pub fn plan(&self) -> Result<Plan> {
        self.realizer.compile(self.definition.name(), &self.catalog)
    }

    fn run(&mut self, force: bool) -> Result<bool> {
        if self.executed && !force {
            debug!(manifest = %self.name(), "already executed; skipping");
            return Ok(false);
        }

        info!(
            manifest = %self.name(),
            recipes = self.definition.recipes().len(),
            forced = self.executed,
            "executing manifest"
        );
        let outcome = self.evaluate_recipes().and_then(|()| self.realize());
        self.executed = true;

        let report = outcome?;
        info!(
            manifest = %self.name(),
            converged = report.converged(),
            seconds = report.total_duration.as_secs_f64(),
            "manifest applied"
        );
        Ok(true)
    }

    fn realize(&mut self) -> Result<ApplyReport> {
        let plan = self.realizer.compile(self.definition.name(), &self.catalog)?;
        debug!(
            manifest = %self.name(),
            resources = plan.len(),
            fingerprint = %plan.fingerprint,
            "compiled plan"
        );
        let report = self.realizer.apply(&plan)?;
        self.last_report = Some(report.clone());

        if report.success() {
            Ok(report)
        } else {
            Err(ManifestError::RealizationFault {
                failed: report.failed(),
                detail: report.failure_detail(),
            })
        }
    }
}
