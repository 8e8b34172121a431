//! Built-in resource kinds.

use super::{KindInfo, TypeRegistry};

/// `(kind, namevar, executes_commands)` for every built-in kind.
const BUILTIN_KINDS: &[(&str, &str, bool)] = &[
    ("augeas", "name", false),
    ("computer", "name", false),
    ("cron", "name", false),
    ("exec", "command", true),
    ("file", "path", false),
    ("filebucket", "name", false),
    ("group", "name", false),
    ("host", "name", false),
    ("interface", "name", false),
    ("k5login", "path", false),
    ("macauthorization", "name", false),
    ("mailalias", "name", false),
    ("maillist", "name", false),
    ("mcx", "name", false),
    ("mount", "name", false),
    ("nagios_command", "command_name", false),
    ("nagios_contact", "contact_name", false),
    ("nagios_host", "host_name", false),
    ("nagios_service", "_naginator_name", false),
    ("notify", "name", false),
    ("package", "name", false),
    ("resources", "name", false),
    ("router", "url", false),
    ("schedule", "name", false),
    ("selboolean", "name", false),
    ("selmodule", "name", false),
    ("service", "name", false),
    ("ssh_authorized_key", "name", false),
    ("sshkey", "name", false),
    ("stage", "name", false),
    ("tidy", "path", false),
    ("user", "name", false),
    ("vlan", "name", false),
    ("yumrepo", "name", false),
    ("zfs", "name", false),
    ("zone", "name", false),
    ("zpool", "pool", false),
];

/// The standard kind set.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTypes;

impl TypeRegistry for BuiltinTypes {
    fn kinds(&self) -> Vec<KindInfo> {
        BUILTIN_KINDS
            .iter()
            .map(|&(name, namevar, executes)| {
                let info = KindInfo::new(name, namevar);
                if executes {
                    info.executing()
                } else {
                    info
                }
            })
            .collect()
    }
}
