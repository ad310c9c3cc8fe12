use std::{env, process::exit};

use anyhow::Result;
use args::{Cli, host_invocation_args};
use clap::Parser;
use console::style;

use crate::commands::command_from_args;

mod args;
mod commands;
mod dependencies;
mod formatting;
mod interaction;
mod logging;
mod manifest;
mod models;
mod settings;
mod table;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = match Cli::try_parse_from(host_invocation_args(env::args())) {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are not failures.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            exit(code);
        }
    };

    logging::setup_logging(cli.global_args.debug);

    if let Err(e) = run(cli).await {
        println!("{} {e:#}", style("ERROR:").red().bold());
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    command_from_args(cli.command).execute().await
}
