use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use fsprov_fs::Error as FsError;

use crate::provider::ProviderConfig;
use crate::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// Console output goes to stderr, filtered by `RUST_LOG` (default `warn`,
/// or `debug` when `verbose`). With `config.debug` set, every debug-level
/// event is also appended to `config.log_file`.
///
/// Only the first call in a process installs a subscriber; later calls
/// return [`Error::Logging`]. A log file that cannot be opened is reported
/// as an I/O error before anything is installed.
pub fn init(config: &ProviderConfig, verbose: bool) -> Result<()> {
    let console_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn"))
            .map_err(|e| Error::Logging {
                message: e.to_string(),
            })?
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact()
        .with_filter(console_filter);

    let file_layer = if config.debug {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .map_err(|e| FsError::io("open", &config.log_file, e))?;
        Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(LevelFilter::DEBUG),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging {
            message: e.to_string(),
        })
}
