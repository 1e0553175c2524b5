use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::shells;

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

const BIN_NAME: &str = "mcs";

/// Completion script for `shell`, as the shell expects to source it.
pub fn completion_script(shell: CompletionShell) -> Vec<u8> {
    let mut command = Cli::command();
    let mut script = Vec::new();
    match shell {
        CompletionShell::Bash => {
            clap_complete::generate(shells::Bash, &mut command, BIN_NAME, &mut script);
        }
        CompletionShell::Zsh => {
            clap_complete::generate(shells::Zsh, &mut command, BIN_NAME, &mut script);
        }
        CompletionShell::Fish => {
            clap_complete::generate(shells::Fish, &mut command, BIN_NAME, &mut script);
        }
    }
    script
}

pub fn run_completions(shell: CompletionShell, output: Option<&Path>) -> Result<(), CliError> {
    let script = completion_script(shell);
    match output {
        Some(path) => {
            std::fs::write(path, &script)?;
            println!("{}", path.display());
        }
        None => io::stdout().write_all(&script)?,
    }
    Ok(())
}
