//! Resource type registry — the set of kinds a manifest may declare.
//!
//! The engine never hardcodes a kind. It asks a [`TypeRegistry`] for the
//! available kinds and, per kind, for:
//! 1. the identity ("namevar") parameter used by mapping-only declarations
//! 2. whether the kind runs external commands (and so needs a search path)

pub mod builtin;

pub use builtin::BuiltinTypes;

/// Search path injected into command-running resources when neither the
/// declaration nor the process environment provides one.
pub const DEFAULT_EXEC_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// Static description of one resource kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindInfo {
    /// Kind name as used in declarations (e.g. "package")
    pub name: String,

    /// Parameter that carries the identity in mapping-only declarations
    pub namevar: String,

    /// Runs external commands and gets an implicit `path` parameter
    pub executes_commands: bool,
}

impl KindInfo {
    pub fn new(name: impl Into<String>, namevar: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namevar: namevar.into(),
            executes_commands: false,
        }
    }

    /// Mark this kind as running external commands.
    pub fn executing(mut self) -> Self {
        self.executes_commands = true;
        self
    }
}

/// Source of resource kinds.
pub trait TypeRegistry: Send + Sync {
    /// Every kind this registry knows, in a stable order.
    fn kinds(&self) -> Vec<KindInfo>;

    /// Describe one kind by name.
    fn kind_info(&self, kind: &str) -> Option<KindInfo> {
        self.kinds().into_iter().find(|k| k.name == kind)
    }
}

/// Search path for command-running resources: the process `PATH`, falling
/// back to [`DEFAULT_EXEC_PATH`].
pub fn exec_search_path() -> String {
    std::env::var("PATH")
        .ok()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_EXEC_PATH.to_string())
}
