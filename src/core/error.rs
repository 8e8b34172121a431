//! Engine error taxonomy.
//!
//! "Already executed" is deliberately absent: a second run without `force`
//! is reported as a `false` return, never as an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while defining, evaluating, or realizing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A registered recipe names a handler the manifest does not expose.
    #[error("manifest '{manifest}' has no recipe handler named '{recipe}'")]
    MissingCapability { manifest: String, recipe: String },

    /// A declare/reference/lookup call used a kind the type registry lacks.
    #[error("unknown resource kind '{0}'")]
    UnknownResourceKind(String),

    /// A mapping-only declaration did not carry the kind's identity parameter.
    #[error("{kind} declaration is missing its identity parameter '{namevar}'")]
    MissingIdentity { kind: String, namevar: String },

    /// The realizer failed to apply one or more resources.
    #[error("realization failed for {failed} resource(s): {detail}")]
    RealizationFault { failed: usize, detail: String },

    /// A recipe handler reported its own failure.
    #[error("recipe '{recipe}' failed: {message}")]
    Recipe { recipe: String, message: String },

    /// A configuration or manifest document has the wrong shape.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A `{{options.*}}` template could not be resolved.
    #[error("template error: {0}")]
    Template(String),

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

impl ManifestError {
    /// Shorthand for handlers that fail with a plain message.
    pub fn recipe(recipe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Recipe {
            recipe: recipe.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ManifestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_message() {
        let err = ManifestError::MissingCapability {
            manifest: "web".to_string(),
            recipe: "nginx".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "manifest 'web' has no recipe handler named 'nginx'"
        );
    }

    #[test]
    fn test_recipe_shorthand() {
        let err = ManifestError::recipe("motd", "no message configured");
        assert!(matches!(err, ManifestError::Recipe { ref recipe, .. } if recipe == "motd"));
        assert!(err.to_string().contains("no message configured"));
    }

    #[test]
    fn test_parse_error_from_yaml() {
        let yaml_err = serde_yaml_ng::from_str::<serde_yaml_ng::Value>("a: [b: {{")
            .expect_err("invalid yaml");
        let err: ManifestError = yaml_err.into();
        assert!(err.to_string().starts_with("YAML parse error"));
    }
}
