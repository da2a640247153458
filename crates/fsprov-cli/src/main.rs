//! Filesystem provider CLI
//!
//! Plans and applies a manifest of directories and files against the local
//! filesystem, tracking what it manages in a state file.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { json } => commands::run_plan(&cli, json),
        Commands::Apply { dry_run, json } => commands::run_apply(&cli, dry_run, json),
        Commands::Refresh => commands::run_refresh(&cli),
        Commands::Destroy { dry_run } => commands::run_destroy(&cli, dry_run),
        Commands::Show { json } => commands::run_show(&cli, json),
    }
}
