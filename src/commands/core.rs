//! Core command traits.
//!
//! [`Command`] is what the entry point runs. Commands that produce a value implement
//! [`CommandWithOutput`] instead and are turned into a [`Command`] with
//! [`CommandWithOutputExt::with_print_to_stdout`], which renders the value in the requested format.

use anyhow::Result;
use async_trait::async_trait;

use crate::formatting::{Format, Formattable};

/// A unit of work started from the command line.
#[async_trait]
pub trait Command {
    /// Execute the command.
    async fn execute(&mut self) -> Result<()>;
}

/// A command whose result is printed by the caller.
#[async_trait]
pub trait CommandWithOutput {
    type Output;

    /// Execute the command and return its output.
    async fn execute(&mut self) -> Result<Self::Output>;
}

/// Command extensions trait.
pub trait CommandWithOutputExt {
    /// Wrap the command so its output is printed to stdout in `format`.
    fn with_print_to_stdout(self, format: Format) -> Box<dyn Command>;
}

/// Wrapper command that prints the output of a [`CommandWithOutput`] to stdout when executed.
pub struct PrintToStdoutCommand<C> {
    command: C,
    format: Format,
}

#[async_trait]
impl<C, O> Command for PrintToStdoutCommand<C>
where
    C: CommandWithOutput<Output = O> + Send,
    O: Formattable,
{
    async fn execute(&mut self) -> Result<()> {
        // Run the wrapped command, nothing is printed when it fails.
        let output = self.command.execute().await?;

        // Render the output in the requested format.
        println!("{}", output.format(self.format)?);

        Ok(())
    }
}

impl<C, O> CommandWithOutputExt for C
where
    C: CommandWithOutput<Output = O> + Send + 'static,
    O: Formattable + 'static,
{
    fn with_print_to_stdout(self, format: Format) -> Box<dyn Command> {
        Box::new(PrintToStdoutCommand {
            command: self,
            format,
        })
    }
}
