//! Entity identity and shared read-back helpers

use std::fmt;
use std::fs::Metadata;
use std::path::Path;

use fsprov_fs::{EntityKind, EntityPath, Error as FsError, Mode, fingerprint_str};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Opaque existence marker for a managed entity.
///
/// Derived from the fingerprint of the entity's path at creation. Empty
/// means the entity does not exist and must be recreated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn for_path(path: &EntityPath) -> Self {
        Self(fingerprint_str(path.as_str()))
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mode reported by `metadata`, checked against the expected entity kind.
pub(crate) fn observed_mode(path: &Path, metadata: &Metadata, expected: EntityKind) -> Result<Mode> {
    match Mode::from_metadata(metadata) {
        Some(mode) if mode.kind() == expected => Ok(mode),
        _ => Err(FsError::KindMismatch {
            path: path.to_path_buf(),
            expected,
            found: EntityKind::describe(metadata.file_type()).to_string(),
        }
        .into()),
    }
}

/// Reject a declared mode built for the other entity kind.
pub(crate) fn expect_mode_kind(mode: Mode, expected: EntityKind) -> Result<()> {
    if mode.kind() == expected {
        Ok(())
    } else {
        Err(FsError::invalid_mode(
            mode.canonical(),
            format!("a {} mode cannot be applied to a {expected}", mode.kind()),
        )
        .into())
    }
}
