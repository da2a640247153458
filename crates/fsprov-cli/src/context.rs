//! Session setup shared by the commands
//!
//! Resolves the manifest, installs logging and wires the engine to the
//! state store.

use std::path::{Path, PathBuf};

use fsprov_core::{
    Declaration, Engine, Manifest, Provider, ProviderConfig, ProviderContext, StateStore, logging,
};

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Everything a manifest-driven command needs.
pub struct Session {
    pub declarations: Vec<Declaration>,
    pub engine: Engine,
    pub store: StateStore,
}

impl Session {
    /// Load the manifest named on the command line and configure the provider.
    pub fn open(cli: &Cli) -> Result<Self> {
        if !cli.manifest.exists() {
            return Err(CliError::user(format!(
                "Manifest not found: {}",
                cli.manifest.display()
            )));
        }
        Self::from_manifest(cli)
    }

    /// Like [`Session::open`], but falls back to default provider settings
    /// and no declarations when the manifest is missing. Commands that only
    /// work from the state file use this.
    pub fn open_for_state(cli: &Cli) -> Result<Self> {
        if cli.manifest.exists() {
            return Self::from_manifest(cli);
        }
        tracing::debug!(manifest = %cli.manifest.display(), "no manifest, using defaults");
        let provider =
            Provider::configure(ProviderConfig::default(), ProviderContext::system(), cli.verbose)?;
        Ok(Self {
            declarations: Vec::new(),
            engine: Engine::new(&provider),
            store: StateStore::new(&cli.state),
        })
    }

    fn from_manifest(cli: &Cli) -> Result<Self> {
        let manifest = Manifest::load(&cli.manifest)?;
        let base_dir = Manifest::base_dir(&cli.manifest)?;
        let config = ProviderConfig {
            log_file: resolve(&base_dir, &manifest.provider.log_file),
            ..manifest.provider.clone()
        };
        let provider = Provider::configure(config, ProviderContext::system(), cli.verbose)?;
        let declarations = manifest.declarations(Some(&base_dir))?;
        tracing::debug!(
            manifest = %cli.manifest.display(),
            declarations = declarations.len(),
            "session opened"
        );

        Ok(Self {
            declarations,
            engine: Engine::new(&provider),
            store: StateStore::new(&cli.state),
        })
    }
}

/// Console logging for commands that never read the manifest.
pub fn init_console_logging(verbose: bool) {
    // A second init only means a subscriber already exists.
    let _ = logging::init(&ProviderConfig::default(), verbose);
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}
