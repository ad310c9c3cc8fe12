//! Flag table for the `create-service-push` command.
//!
//! Every flag the plugin understands is described by a [`FlagSpec`] record.
//! The table is plain data: the processor keeps its own per-call state about which flags were seen.

/// Identifies a plugin flag independently of its spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FlagId {
    ServiceManifest,
    NoServiceManifest,
    NoPush,
    PushAsSubprocess,
    Var,
    VarsFile,
    UseEnvVarsPrefixedWith,
}

/// Metadata of a single flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    pub id: FlagId,
    pub name: &'static str,
    pub description: &'static str,
    /// Number of positional arguments consumed after the flag (0 or 1).
    pub arity: usize,
    /// The flag's effect on the forwarded arguments depends on the final state of other flags,
    /// so it is resolved after the whole token list has been scanned.
    pub deferred: bool,
}

/// Prefix that marks a token as a flag.
pub const FLAG_PREFIX: &str = "-";

pub const FLAGS: &[FlagSpec] = &[
    FlagSpec {
        id: FlagId::ServiceManifest,
        name: "--service-manifest",
        description: "Takes one input specifying the fullpath and filename of the services creation manifest. e.g., --service-manifest my-manifest.yml. Defaults to services-manifest.yml.",
        arity: 1,
        deferred: false,
    },
    FlagSpec {
        id: FlagId::NoServiceManifest,
        name: "--no-service-manifest",
        description: "Specifies that there is no service creation manifest",
        arity: 0,
        deferred: false,
    },
    FlagSpec {
        id: FlagId::NoPush,
        name: "--no-push",
        description: "Create the services but do not push the application",
        arity: 0,
        deferred: false,
    },
    FlagSpec {
        id: FlagId::PushAsSubprocess,
        name: "--push-as-subprocess",
        description: "Perform cf push as a sub-process",
        arity: 0,
        deferred: false,
    },
    FlagSpec {
        id: FlagId::Var,
        name: "--var",
        description: "Takes one input being a variable key value pair for variable substitution, (e.g., name=app1); can specify multiple times",
        arity: 1,
        deferred: true,
    },
    FlagSpec {
        id: FlagId::VarsFile,
        name: "--vars-file",
        description: "Takes one input being the path to a variables file; can specify multiple times",
        arity: 1,
        deferred: true,
    },
    FlagSpec {
        id: FlagId::UseEnvVarsPrefixedWith,
        name: "--use-env-vars-prefixed-with",
        description: "Use environment variables that have a given prefix as substitution variables, i.e. --use-env-vars-prefixed-with APP_ will get all environment variables prefixed with APP_",
        arity: 1,
        deferred: false,
    },
];

/// Find the flag spelled exactly as `token`.
pub fn lookup<'a>(flags: &'a [FlagSpec], token: &str) -> Option<&'a FlagSpec> {
    flags.iter().find(|flag| flag.name == token)
}

/// Name of the flag with the given identifier, used in error messages.
pub fn name_of(flags: &[FlagSpec], id: FlagId) -> &'static str {
    flags
        .iter()
        .find(|flag| flag.id == id)
        .map(|flag| flag.name)
        .unwrap_or_default()
}

pub fn looks_like_flag(token: &str) -> bool {
    token.starts_with(FLAG_PREFIX)
}
