//! Atomic document I/O and advisory locking
//!
//! Used by hosts to persist canonical state between runs. Entity content is
//! never written through here; reconcilers write files in place.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, Result};

/// Tuning for atomic writes and lock acquisition.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// How long to keep retrying a contended lock before giving up.
    pub lock_timeout: Duration,
    /// Whether to fsync the temporary file before renaming it into place.
    pub fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(10),
            fsync: true,
        }
    }
}

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename so readers never observe a partial
/// document. The temporary file is removed if any step fails.
pub fn write_atomic(path: &Path, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    ensure_parent(path)?;

    let temp_path = temp_path_for(path);
    let result = write_temp(&temp_path, content, robustness)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| Error::io("rename", path, e)));

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io("mkdir", parent, e))?;
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

fn write_temp(temp_path: &Path, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io("open", temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io("write", temp_path, e))?;

    if robustness.fsync {
        temp_file
            .sync_all()
            .map_err(|e| Error::io("fsync", temp_path, e))?;
    }
    Ok(())
}

/// Read a whole file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io("read", path, e))
}

/// An exclusive advisory lock, released on drop.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
}

impl LockGuard {
    /// Acquire an exclusive lock on `path`, creating the lock file if needed.
    ///
    /// Contended locks are retried with exponential backoff until
    /// `robustness.lock_timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockFailed`] when the lock stays contended.
    pub fn acquire(path: &Path, robustness: RobustnessConfig) -> Result<Self> {
        ensure_parent(path)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::io("open", path, e))?;

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(20))
            .with_max_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(robustness.lock_timeout))
            .build();

        backoff::retry(policy, || {
            file.try_lock_exclusive()
                .map_err(backoff::Error::transient)
        })
        .map_err(|_| Error::LockFailed {
            path: path.to_path_buf(),
        })?;

        tracing::debug!(path = %path.display(), "acquired lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
