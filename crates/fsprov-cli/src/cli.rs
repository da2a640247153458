//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Filesystem provider - converge directories and files to a manifest
#[derive(Parser, Debug)]
#[command(name = "fsprov")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Manifest declaring the managed directories and files
    #[arg(short, long, global = true, env = "FSPROV_MANIFEST", default_value = "fsprov.toml")]
    pub manifest: PathBuf,

    /// State file recording what has been created
    #[arg(short, long, global = true, env = "FSPROV_STATE", default_value = "fsprov.state.json")]
    pub state: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show what apply would change
    Plan {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Converge the filesystem to the manifest
    ///
    /// Examples:
    ///   fsprov apply                 # Create, update and delete as planned
    ///   fsprov apply --dry-run       # Report the steps without running them
    Apply {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for CI/CD integration
        #[arg(long)]
        json: bool,
    },

    /// Re-read every tracked resource and save the observed state
    Refresh,

    /// Delete every tracked resource
    Destroy {
        /// Preview deletions without applying them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the recorded state
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}
