//! Provider configuration and resource registry

use std::path::PathBuf;

use fsprov_fs::EntityKind;
use serde::{Deserialize, Serialize};

use crate::context::ProviderContext;
use crate::directory::DirectoryReconciler;
use crate::file::FileReconciler;
use crate::{Error, Result, logging};

/// Resource type name of managed directories.
pub const DIRECTORY_RESOURCE: &str = "filesystem_directory";

/// Resource type name of managed files.
pub const FILE_RESOURCE: &str = "filesystem_file";

/// Default debug log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "fsprov.log";

/// Provider-level settings, the `[provider]` table of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Write debug-level logs to `log_file`.
    pub debug: bool,
    pub log_file: PathBuf,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            debug: false,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Resource type name for an entity kind.
pub fn resource_type(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Directory => DIRECTORY_RESOURCE,
        EntityKind::File => FILE_RESOURCE,
    }
}

/// Entry point a host configures once and asks for reconcilers.
#[derive(Debug, Clone)]
pub struct Provider {
    config: ProviderConfig,
    ctx: ProviderContext,
}

impl Provider {
    pub fn new(config: ProviderConfig, ctx: ProviderContext) -> Self {
        Self { config, ctx }
    }

    /// Build the provider and install its logging.
    ///
    /// A subscriber installed earlier in the process is kept. A debug log
    /// file that cannot be opened is an error.
    pub fn configure(config: ProviderConfig, ctx: ProviderContext, verbose: bool) -> Result<Self> {
        match logging::init(&config, verbose) {
            Ok(()) => {}
            Err(Error::Logging { message }) => {
                tracing::debug!(%message, "keeping existing subscriber");
            }
            Err(e) => return Err(e),
        }
        tracing::debug!(debug = config.debug, log_file = %config.log_file.display(), "provider configured");
        Ok(Self::new(config, ctx))
    }

    /// Every resource type this provider manages.
    pub fn resource_types() -> &'static [&'static str] {
        &[DIRECTORY_RESOURCE, FILE_RESOURCE]
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn context(&self) -> &ProviderContext {
        &self.ctx
    }

    pub fn directories(&self) -> DirectoryReconciler {
        DirectoryReconciler::new(self.ctx.clone())
    }

    pub fn files(&self) -> FileReconciler {
        FileReconciler::new(self.ctx.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_both_resource_types() {
        assert_eq!(
            Provider::resource_types(),
            &["filesystem_directory", "filesystem_file"]
        );
        assert_eq!(resource_type(EntityKind::File), FILE_RESOURCE);
    }

    #[test]
    fn configure_tolerates_an_existing_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProviderConfig {
            debug: false,
            log_file: dir.path().join("fsprov.log"),
        };
        let first = Provider::configure(config.clone(), ProviderContext::system(), false);
        assert!(first.is_ok());
        let second = Provider::configure(config, ProviderContext::system(), true).unwrap();
        assert!(!second.config().debug);
    }

    #[test]
    fn config_defaults_when_table_is_empty() {
        let config: ProviderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert!(!config.debug);
        assert_eq!(config.log_file, PathBuf::from("fsprov.log"));
    }
}
