//! CLI subcommands — validate, plan, kinds, config.

use crate::core::config::parse_config_file;
use crate::core::manifest::Manifest;
use crate::core::manifest_file::load_manifest_file;
use crate::realizer::Plan;
use crate::resources::{BuiltinTypes, TypeRegistry};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that every recipe in a manifest has a definition
    Validate {
        /// Path to the manifest file
        #[arg(short, long, default_value = "marionette.yaml")]
        file: PathBuf,
    },

    /// Evaluate recipes and show the realization plan (nothing is applied)
    Plan {
        /// Path to the manifest file
        #[arg(short, long, default_value = "marionette.yaml")]
        file: PathBuf,

        /// Extra configuration merged over the manifest's own
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the resource kinds manifests can declare
    Kinds,

    /// Print the resolved configuration of a manifest
    Config {
        /// Path to the manifest file
        #[arg(short, long, default_value = "marionette.yaml")]
        file: PathBuf,

        /// Extra configuration merged over the manifest's own
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan { file, config, json } => cmd_plan(&file, config.as_deref(), json),
        Commands::Kinds => cmd_kinds(),
        Commands::Config { file, config } => cmd_config(&file, config.as_deref()),
    }
}

/// Load a manifest file, optionally merging a configuration overlay.
fn load(file: &Path, overlay: Option<&Path>) -> Result<Manifest> {
    let definition =
        load_manifest_file(file).with_context(|| format!("loading manifest {}", file.display()))?;
    match overlay {
        Some(path) => {
            let settings = parse_config_file(path)
                .with_context(|| format!("loading configuration {}", path.display()))?;
            Ok(Manifest::with_config(definition, settings))
        }
        None => Ok(Manifest::new(definition)),
    }
}

fn cmd_validate(file: &Path) -> Result<()> {
    let manifest = load(file, None)?;
    let missing = manifest.missing_recipes();
    if missing.is_empty() {
        println!(
            "OK: {} ({} recipes)",
            manifest.name(),
            manifest.definition().recipes().len()
        );
        Ok(())
    } else {
        for recipe in &missing {
            eprintln!("  ERROR: recipe '{}' has no definition", recipe);
        }
        bail!("{} validation error(s)", missing.len())
    }
}

fn cmd_plan(file: &Path, overlay: Option<&Path>, json: bool) -> Result<()> {
    let mut manifest = load(file, overlay)?;
    manifest
        .evaluate_recipes()
        .with_context(|| format!("evaluating {}", manifest.name()))?;
    let plan = manifest.plan()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(())
}

fn cmd_kinds() -> Result<()> {
    print!("{}", render_kinds(&BuiltinTypes));
    Ok(())
}

fn cmd_config(file: &Path, overlay: Option<&Path>) -> Result<()> {
    let manifest = load(file, overlay)?;
    print!("{}", serde_yaml_ng::to_string(&manifest.configuration())?);
    Ok(())
}

/// Human-readable plan listing.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = format!("Planning: {} ({} resources)\n\n", plan.name, plan.len());
    for step in &plan.steps {
        let _ = writeln!(out, "  + {}", step.description);
    }
    for target in &plan.unresolved {
        let _ = writeln!(out, "  ! {} is referenced but not declared", target);
    }
    let _ = writeln!(out, "\nFingerprint: {}", plan.fingerprint);
    out
}

/// One line per kind: name, namevar, and whether it runs commands.
pub fn render_kinds(registry: &dyn TypeRegistry) -> String {
    let mut out = String::new();
    for kind in registry.kinds() {
        let marker = if kind.executes_commands { " (exec)" } else { "" };
        let _ = writeln!(out, "{:<24} {}{}", kind.name, kind.namevar, marker);
    }
    out
}
