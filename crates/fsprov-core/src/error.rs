//! Error types for fsprov-core

use fsprov_fs::EntityKind;

use crate::field::Field;

/// Result type for fsprov-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fsprov-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A field that can only change by destroying and recreating the entity
    #[error("{field} of a {kind} cannot be changed in place; the {kind} must be replaced")]
    ImmutableField { kind: EntityKind, field: Field },

    /// A manifest entry failed validation
    #[error("Invalid declaration {address}: {message}")]
    InvalidDeclaration { address: String, message: String },

    /// Two manifest entries share an address
    #[error("Duplicate resource address: {address}")]
    DuplicateAddress { address: String },

    /// Logging could not be initialised
    #[error("Unable to init provider logging: {message}")]
    Logging { message: String },

    /// State file written by an incompatible version
    #[error("Unsupported state file version {found}")]
    StateVersion { found: u32 },

    /// A lifecycle step failed for one resource
    #[error("{address}: {source}")]
    Step {
        address: String,
        #[source]
        source: Box<Error>,
    },

    /// Filesystem, identity or mode error from fsprov-fs
    #[error(transparent)]
    Fs(#[from] fsprov_fs::Error),
}

impl Error {
    /// True when the underlying OS error reports a missing path.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Fs(e) => e.is_not_found(),
            Self::Step { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// The error underneath any per-resource context.
    pub fn root(&self) -> &Error {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}
