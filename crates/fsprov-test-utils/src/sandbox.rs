//! [`Sandbox`] temporary roots for entity paths.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use fsprov_fs::EntityPath;
use tempfile::TempDir;

/// A temporary directory that managed entities are created under.
///
/// Removed with everything inside it when dropped.
///
/// # Example
///
/// ```rust,no_run
/// use fsprov_test_utils::Sandbox;
///
/// let sandbox = Sandbox::new();
/// let target = sandbox.entity("test/testdir");
/// assert!(target.as_str().ends_with("/test/testdir"));
/// sandbox.assert_missing("test");
/// ```
pub struct Sandbox {
    temp_dir: TempDir,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Root of the sandbox.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Host path of `relative` inside the sandbox.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Entity path of `relative` inside the sandbox.
    pub fn entity(&self, relative: &str) -> EntityPath {
        EntityPath::new(self.path(relative))
            .unwrap_or_else(|e| panic!("Sandbox::entity: {relative}: {e}"))
    }

    /// Write a file, creating missing ancestors.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Create a directory, creating missing ancestors.
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Permission bits (`0o7777` mask) of `relative`.
    pub fn permissions(&self, relative: &str) -> u32 {
        let metadata = fs::metadata(self.path(relative))
            .unwrap_or_else(|e| panic!("Could not stat {relative}: {e}"));
        metadata.permissions().mode() & 0o7777
    }

    /// Force the permission bits of `relative`.
    pub fn chmod(&self, relative: &str, bits: u32) {
        fs::set_permissions(self.path(relative), fs::Permissions::from_mode(bits)).unwrap();
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative))
            .unwrap_or_else(|e| panic!("Could not read {relative}: {e}"))
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_exists(&self, relative: &str) {
        let path = self.path(relative);
        assert!(path.exists(), "Expected path to exist: {}", path.display());
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_missing(&self, relative: &str) {
        let path = self.path(relative);
        assert!(
            !path.exists(),
            "Expected path NOT to exist: {}",
            path.display()
        );
    }
}
