//! Root command for the CLI.
//!
//! The binary is normally started by the cf CLI, which passes the port of its plugin RPC server
//! as the first argument (`cf-create-service-push 51234 create-service-push ...`).
//! It can also be executed directly (`cf-create-service-push create-service-push ...`), which is
//! how it is tested. [`host_invocation_args`] normalises both forms before clap sees them.
use clap::{Args, Parser, Subcommand};

use super::Metadata;

/// Create the services listed in a service manifest, then push the application.
#[derive(Parser)]
#[command(version, about, long_about = None, disable_help_subcommand = true)]
pub struct Cli {
    #[command(flatten)]
    pub global_args: GlobalArgs,

    #[command(subcommand)]
    pub command: PluginSubCommands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Enable debug logging.
    ///
    /// Setting this flag will set the log level to debug and only show logs from this crate.
    /// The log level can also be overridden by setting the `CSP_LOG` environment variable.
    #[arg(hide = true, long, short = 'D', default_value = "false")]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum PluginSubCommands {
    /// Print the plugin metadata registered with the cf CLI.
    #[command(alias = "SendMetadata")]
    Metadata(Metadata),
    /// Any other invocation: `create-service-push`, its alias, or the uninstall message.
    ///
    /// The first token is the command name; all tokens are kept exactly as given.
    #[command(external_subcommand)]
    Invocation(Vec<String>),
}

/// Drop the RPC port the cf CLI puts in front of the command name.
///
/// The first item (the binary path) is always kept.
pub fn host_invocation_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut args: Vec<String> = args.into_iter().collect();

    let is_port = args
        .get(1)
        .is_some_and(|arg| !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()));
    if is_port {
        args.remove(1);
    }

    args
}
