//! Business logic of the plugin.
//!
//! The main entry point is [`command_from_args`], which turns the parsed command line into a command.
use crate::args::PluginSubCommands;

pub use core::{Command, CommandWithOutput, CommandWithOutputExt};

mod core;
pub mod create_service_push;
pub mod deploy;
pub mod metadata;
pub mod reconcile;

use create_service_push::CreateServicePush;
use metadata::Metadata;

/// Convert the parsed command line into a command.
pub fn command_from_args(command: PluginSubCommands) -> Box<dyn Command> {
    match command {
        PluginSubCommands::Metadata(args) => Metadata::new().with_print_to_stdout(args.format),
        PluginSubCommands::Invocation(tokens) => Box::new(CreateServicePush::new(tokens)),
    }
}
