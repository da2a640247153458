//! Error types for fsprov-fs

use std::path::PathBuf;

use crate::mode::EntityKind;

/// Result type for fsprov-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fsprov-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid mode {value:?}: {reason}")]
    InvalidMode { value: String, reason: String },

    #[error("path must be absolute: {path}")]
    RelativePath { path: String },

    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("unable to lookup user {name:?}: unknown user")]
    UnknownUser { name: String },

    #[error("unable to lookup group {name:?}: unknown group")]
    UnknownGroup { name: String },

    #[error("unable to lookup user with uid {uid}: unknown uid")]
    UnknownUid { uid: u32 },

    #[error("unable to lookup group with gid {gid}: unknown gid")]
    UnknownGid { gid: u32 },

    #[error("identity lookup failed for {query}: {source}")]
    IdentityLookup {
        query: String,
        #[source]
        source: nix::errno::Errno,
    },

    #[error("{op} {}: {source}", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is a {found}, expected a {expected}", path.display())]
    KindMismatch {
        path: PathBuf,
        expected: EntityKind,
        found: String,
    },

    #[error("Failed to parse {format} document at {}: {message}", path.display())]
    DocumentParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} document for {}: {message}", path.display())]
    DocumentSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported document format: {extension:?}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {}", path.display())]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub fn invalid_mode(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMode {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// True when the error is an OS error reporting that the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_operation_and_path() {
        let err = Error::io(
            "mkdir",
            "/tmp/test/testdir",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let display = err.to_string();
        assert!(display.starts_with("mkdir /tmp/test/testdir: "), "got: {display}");
        assert!(err.is_not_found());
    }

    #[test]
    fn permission_denied_is_not_benign_absence() {
        let err = Error::io(
            "open",
            "/root/secret",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn kind_mismatch_display() {
        let err = Error::KindMismatch {
            path: PathBuf::from("/etc/hosts"),
            expected: EntityKind::Directory,
            found: "file".into(),
        };
        assert_eq!(err.to_string(), "/etc/hosts is a file, expected a directory");
    }
}
