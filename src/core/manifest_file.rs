//! YAML manifest files.
//!
//! ```yaml
//! name: web
//! configuration:
//!   nginx: { port: 8080 }
//! recipes:
//!   - nginx                       # options from configuration.nginx
//!   - name: motd
//!     options: { message: hello }
//! definitions:
//!   nginx:
//!     - kind: package
//!       identity: nginx
//!       params: { ensure: installed }
//!     - kind: file
//!       identity: /etc/nginx/conf.d/port
//!       params: { content: "listen {{options.port}};" }
//! ```
//!
//! Each entry under `definitions` becomes a recipe handler that declares its
//! resource templates with `{{options.key}}` placeholders filled from the
//! recipe options. A template that omits `identity` is declared by namevar.

use super::definition::ManifestDefinition;
use super::error::{ManifestError, Result};
use super::manifest::Manifest;
use super::types::{yaml_value_to_string, Params};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml_ng::{Mapping, Value};
use std::path::Path;
use std::sync::Arc;

/// Top-level manifest document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFile {
    pub name: String,

    #[serde(default)]
    pub configuration: Mapping,

    #[serde(default)]
    pub recipes: Vec<RecipeSpec>,

    #[serde(default)]
    pub definitions: IndexMap<String, Vec<ResourceTemplate>>,
}

/// A recipe listed in a manifest file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecipeSpec {
    /// Bare name; options come from configuration.
    Name(String),
    /// Name with explicit options (`options` absent behaves like a bare name).
    Entry {
        name: String,
        #[serde(default)]
        options: Option<Params>,
    },
}

impl RecipeSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Entry { name, .. } => name,
        }
    }
}

/// One resource a file-defined recipe declares.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceTemplate {
    pub kind: String,

    #[serde(default)]
    pub identity: Option<String>,

    #[serde(default)]
    pub params: Params,
}

impl ResourceTemplate {
    /// Fill placeholders and declare the resource on `manifest`.
    pub fn declare(&self, manifest: &mut Manifest, options: &Params) -> Result<()> {
        let mut params = Params::with_capacity(self.params.len());
        for (name, value) in &self.params {
            params.insert(name.clone(), resolve_value(value, options)?);
        }
        match &self.identity {
            Some(identity) => {
                let identity = resolve_template(identity, options)?;
                manifest.declare(&self.kind, identity, params)?;
            }
            None => {
                manifest.declare_named(&self.kind, params)?;
            }
        }
        Ok(())
    }
}

/// Load a manifest definition from a YAML file.
pub fn load_manifest_file(path: &Path) -> Result<Arc<ManifestDefinition>> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(&content)
}

/// Parse a manifest definition from a YAML string.
pub fn parse_manifest(yaml: &str) -> Result<Arc<ManifestDefinition>> {
    let file: ManifestFile = serde_yaml_ng::from_str(yaml)?;
    Ok(build_definition(file))
}

/// Register a parsed manifest file as a definition.
pub fn build_definition(file: ManifestFile) -> Arc<ManifestDefinition> {
    let mut builder = ManifestDefinition::builder(file.name).configure(file.configuration);

    for (recipe, templates) in file.definitions {
        let templates = Arc::new(templates);
        builder = builder.handler(recipe, move |manifest: &mut Manifest, options: &Params| {
            templates
                .iter()
                .try_for_each(|t| t.declare(manifest, options))
        });
    }

    for spec in file.recipes {
        builder = match spec {
            RecipeSpec::Name(name) | RecipeSpec::Entry { name, options: None } => builder.recipe(name),
            RecipeSpec::Entry {
                name,
                options: Some(options),
            } => builder.recipe_with(name, options),
        };
    }

    builder.build()
}

/// Resolve placeholders in a parameter value. A string that is exactly one
/// placeholder takes the option's value unchanged; other strings are
/// interpolated. Sequences and mappings are resolved element-wise.
pub fn resolve_value(value: &Value, options: &Params) -> Result<Value> {
    match value {
        Value::String(s) => match whole_placeholder(s) {
            Some(body) => {
                let key = placeholder_key(body)?;
                options
                    .get(key)
                    .cloned()
                    .ok_or_else(|| ManifestError::Template(format!("unknown option: {}", key)))
            }
            None => Ok(Value::String(resolve_template(s, options)?)),
        },
        Value::Sequence(seq) => seq
            .iter()
            .map(|v| resolve_value(v, options))
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, options)?);
            }
            Ok(Value::Mapping(out))
        }
        other => Ok(other.clone()),
    }
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const NAMESPACE: &str = "options.";

/// Interpolate every `{{options.key}}` placeholder in a string. Whitespace
/// inside the braces is ignored; any other `{{ ... }}` is an error.
pub fn resolve_template(template: &str, options: &Params) -> Result<String> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find(OPEN) {
        let after = &rest[open + OPEN.len()..];
        let close = after.find(CLOSE).ok_or_else(|| {
            let position = template.len() - rest.len() + open;
            ManifestError::Template(format!("unclosed placeholder at position {}", position))
        })?;
        let key = placeholder_key(&after[..close])?;
        let value = options
            .get(key)
            .map(yaml_value_to_string)
            .ok_or_else(|| ManifestError::Template(format!("unknown option: {}", key)))?;

        result.push_str(&rest[..open]);
        result.push_str(&value);
        rest = &after[close + CLOSE.len()..];
    }

    result.push_str(rest);
    Ok(result)
}

/// Option key named by the body of one placeholder.
fn placeholder_key(body: &str) -> Result<&str> {
    body.trim()
        .strip_prefix(NAMESPACE)
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            ManifestError::Template(format!("unsupported placeholder: {{{{{}}}}}", body))
        })
}

/// Body of a string that is exactly one placeholder.
fn whole_placeholder(s: &str) -> Option<&str> {
    let body = s.trim().strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    (!body.contains(OPEN) && !body.contains(CLOSE)).then_some(body)
}
