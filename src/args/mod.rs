//! CLI argument parsing layer.
//!
//! Two layers live here:
//! - [`cli`] is the clap entry point of the binary. It recognises the plugin's own maintenance
//!   subcommands and hands every other invocation over as a raw token list.
//! - [`processor`] interprets the `create-service-push` token list using the flag table in [`flags`].
//!   clap cannot express it: unknown tokens must be forwarded verbatim and some flags change meaning
//!   depending on flags that appear later.
//!
//! The business logic layer is [`crate::commands`], which receives the parsed arguments.

mod cli;
pub mod flags;
pub mod processor;

pub use cli::{Cli, PluginSubCommands, host_invocation_args};
pub use processor::{DeploymentMode, Invocation, ManifestSelection, process};

use clap::Parser;

use crate::formatting::Format;

/// Print the plugin registration metadata.
///
/// The host CLI requests it when the plugin is installed.
#[derive(Parser)]
pub struct Metadata {
    /// Output format.
    #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
    pub format: Format,
}
