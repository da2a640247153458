//! Permission mode codec
//!
//! Converts between textual octal permissions (`"0755"`), typed [`Mode`]
//! values and native `st_mode` bit patterns.
//!
//! The canonical text of a directory mode carries a type tag bit
//! (`020000000755` for `0755`). Plain permission text is ambiguous between
//! what a declaration says and what a read-back reports, so both sides are
//! compared in canonical form. File modes are never tagged.

use std::fmt;
use std::fs::{FileType, Metadata, Permissions};
use std::os::unix::fs::PermissionsExt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Type tag carried by canonical directory modes.
pub const TYPE_DIR_TAG: u32 = 1 << 31;

/// Permission, setuid, setgid and sticky bits.
pub const PERMISSION_MASK: u32 = 0o7777;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

/// The kind of filesystem entity being managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Directory,
    File,
}

impl EntityKind {
    /// Classify an OS file type. Anything other than a directory or a
    /// regular file is unmanaged and yields `None`.
    pub fn from_file_type(file_type: FileType) -> Option<Self> {
        if file_type.is_dir() {
            Some(Self::Directory)
        } else if file_type.is_file() {
            Some(Self::File)
        } else {
            None
        }
    }

    /// Human-readable name of an OS file type, for error reporting.
    pub fn describe(file_type: FileType) -> &'static str {
        if file_type.is_dir() {
            "directory"
        } else if file_type.is_file() {
            "file"
        } else if file_type.is_symlink() {
            "symlink"
        } else {
            "special file"
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission bits tagged with the kind of entity they apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    bits: u32,
    kind: EntityKind,
}

impl Mode {
    /// Create a mode from raw permission bits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMode`] if `bits` has anything set outside
    /// [`PERMISSION_MASK`].
    pub fn new(bits: u32, kind: EntityKind) -> Result<Self> {
        if bits & !PERMISSION_MASK != 0 {
            return Err(Error::invalid_mode(
                format!("{bits:o}"),
                "permission bits exceed 07777",
            ));
        }
        Ok(Self { bits, kind })
    }

    /// Create a mode keeping only the bits inside [`PERMISSION_MASK`].
    pub const fn from_bits_truncate(bits: u32, kind: EntityKind) -> Self {
        Self {
            bits: bits & PERMISSION_MASK,
            kind,
        }
    }

    /// Parse octal text for an entity of the given kind.
    ///
    /// Accepts both plain permission text (`"0755"`) and canonical text
    /// (`"020000000755"`), so a stored canonical value parses back to the
    /// same mode.
    pub fn parse(text: &str, kind: EntityKind) -> Result<Self> {
        let raw = decode(text)?;
        if raw & TYPE_DIR_TAG != 0 && kind == EntityKind::File {
            return Err(Error::invalid_mode(
                text,
                "directory type bit set on a file mode",
            ));
        }
        let bits = raw & !TYPE_DIR_TAG;
        if bits & !PERMISSION_MASK != 0 {
            return Err(Error::invalid_mode(text, "permission bits exceed 07777"));
        }
        Ok(Self { bits, kind })
    }

    /// Interpret a native `st_mode`. Returns `None` for entity types other
    /// than directories and regular files.
    pub fn from_native(native: u32) -> Option<Self> {
        let kind = match native & S_IFMT {
            S_IFDIR => EntityKind::Directory,
            S_IFREG => EntityKind::File,
            _ => return None,
        };
        Some(Self {
            bits: native & PERMISSION_MASK,
            kind,
        })
    }

    /// Mode reported by live metadata.
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        let kind = EntityKind::from_file_type(metadata.file_type())?;
        Some(Self {
            bits: metadata.permissions().mode() & PERMISSION_MASK,
            kind,
        })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Native `st_mode` including the file type bits.
    pub fn to_native(&self) -> u32 {
        encode(self.bits, self.kind)
    }

    /// Permissions suitable for `chmod`.
    pub fn permissions(&self) -> Permissions {
        Permissions::from_mode(self.bits)
    }

    /// Canonical octal text used for drift comparison.
    pub fn canonical(&self) -> String {
        let value = match self.kind {
            EntityKind::Directory => TYPE_DIR_TAG | self.bits,
            EntityKind::File => self.bits,
        };
        if value == 0 {
            "0".to_string()
        } else {
            format!("0{value:o}")
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// Combine permission bits with the native type bits for `kind`.
pub fn encode(bits: u32, kind: EntityKind) -> u32 {
    let type_bits = match kind {
        EntityKind::Directory => S_IFDIR,
        EntityKind::File => S_IFREG,
    };
    type_bits | (bits & PERMISSION_MASK)
}

/// Parse unsigned 32-bit octal text.
///
/// The result may still carry [`TYPE_DIR_TAG`]; [`Mode::parse`] is the
/// kind-aware entry point.
pub fn decode(text: &str) -> Result<u32> {
    if text.is_empty() {
        return Err(Error::invalid_mode(text, "empty"));
    }
    if !text.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return Err(Error::invalid_mode(text, "not an octal number"));
    }
    u32::from_str_radix(text, 8)
        .map_err(|_| Error::invalid_mode(text, "out of range for a 32-bit mode"))
}

/// Canonical text of a native `st_mode`.
///
/// Only the directory type bit survives into the text; every other entity
/// type formats like a regular file.
pub fn format(native: u32) -> String {
    let kind = if native & S_IFMT == S_IFDIR {
        EntityKind::Directory
    } else {
        EntityKind::File
    };
    Mode {
        bits: native & PERMISSION_MASK,
        kind,
    }
    .canonical()
}
