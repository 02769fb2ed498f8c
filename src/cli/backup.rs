//! Backup and restore subcommands.

use clap::Args;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// Arguments for the restore subcommand.
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Backup file to restore from
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Restore without prompting for confirmation.
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Ask a yes/no question; anything but `y` counts as no.
pub fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, out: &mut W) -> std::io::Result<bool> {
    write!(out, "{} [y/N] ", prompt)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
