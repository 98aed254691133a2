//! Main CLI application

use crate::cli::completion;
use crate::error::Result;
use clap::Command;

/// Build the root clap command
pub fn build_command() -> Command {
    Command::new("stratus")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cloud automation from the command line")
        .subcommand(completion::command())
}

/// Run the CLI application with command line arguments
pub fn run() -> Result<()> {
    let mut root = build_command();
    let matches = root.clone().get_matches();

    match matches.subcommand() {
        Some(("completion", sub)) => match sub.subcommand() {
            Some(("bash", _)) => completion::run_bash(&mut root),
            Some(("zsh", _)) => completion::run_zsh(&mut root),
            _ => {
                // No shell given, show the group's help
                if let Some(group) = root.find_subcommand_mut("completion") {
                    group.print_help()?;
                    println!();
                }
                Ok(())
            }
        },
        _ => {
            // No subcommand specified, show help
            root.print_help()?;
            println!();
            Ok(())
        }
    }
}
