//! Declaration manifests
//!
//! A manifest declares the directories and files a host should converge,
//! plus provider settings. It is loaded in any format [`DocumentStore`]
//! understands:
//!
//! ```toml
//! [provider]
//! debug = false
//!
//! [[directory]]
//! name = "work"
//! path = "/tmp/test/testdir"
//! mode = "0700"
//! create_parents = true
//!
//! [[file]]
//! name = "motd"
//! path = "/tmp/testfile"
//! mode = "0600"
//! content = "blah"
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use fsprov_fs::{DocumentStore, EntityKind, EntityPath, Mode};
use serde::{Deserialize, Serialize, Serializer};

use crate::directory::{DEFAULT_DIRECTORY_MODE, DirectorySpec};
use crate::file::{DEFAULT_FILE_MODE, FileSpec};
use crate::provider::{ProviderConfig, resource_type};
use crate::{Error, Result};

/// `<resource type>.<name>`, unique within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub kind: EntityKind,
    pub name: String,
}

impl Address {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Directory, name)
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::new(EntityKind::File, name)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", resource_type(self.kind), self.name)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A `[[directory]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryDecl {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub create_parents: bool,
}

/// A `[[file]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDecl {
    pub name: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// A validated manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Directory { name: String, spec: DirectorySpec },
    File { name: String, spec: FileSpec },
}

impl Declaration {
    pub fn address(&self) -> Address {
        match self {
            Self::Directory { name, .. } => Address::directory(name.clone()),
            Self::File { name, .. } => Address::file(name.clone()),
        }
    }

    pub fn path(&self) -> &EntityPath {
        match self {
            Self::Directory { spec, .. } => &spec.path,
            Self::File { spec, .. } => &spec.path,
        }
    }
}

/// The declared resources and provider settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default, rename = "directory")]
    pub directories: Vec<DirectoryDecl>,
    #[serde(default, rename = "file")]
    pub files: Vec<FileDecl>,
}

impl Manifest {
    /// Load a manifest, detecting the format from the extension.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(DocumentStore::new().load(path)?)
    }

    /// The directory relative entity paths are resolved against: the
    /// canonical parent of the manifest file.
    pub fn base_dir(manifest_path: &Path) -> Result<PathBuf> {
        let parent = match manifest_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        dunce::canonicalize(parent)
            .map_err(|e| fsprov_fs::Error::io("canonicalize", parent, e).into())
    }

    /// Validate every entry into a typed [`Declaration`], directories first.
    ///
    /// Relative paths are joined onto `base_dir` when given and rejected
    /// otherwise.
    pub fn declarations(&self, base_dir: Option<&Path>) -> Result<Vec<Declaration>> {
        let mut seen = BTreeSet::new();
        let mut declarations = Vec::with_capacity(self.directories.len() + self.files.len());

        for decl in &self.directories {
            let address = Address::directory(decl.name.clone());
            let invalid = |message: String| Error::InvalidDeclaration {
                address: address.to_string(),
                message,
            };
            let mode = parse_mode(decl.mode.as_deref(), EntityKind::Directory, DEFAULT_DIRECTORY_MODE)
                .map_err(|e| invalid(e.to_string()))?;
            let spec = DirectorySpec {
                path: resolve_path(&decl.path, base_dir).map_err(|e| invalid(e.to_string()))?,
                mode,
                user: decl.user.clone(),
                group: decl.group.clone(),
                create_parents: decl.create_parents,
            };
            check_unique(&mut seen, &address)?;
            declarations.push(Declaration::Directory {
                name: decl.name.clone(),
                spec,
            });
        }

        for decl in &self.files {
            let address = Address::file(decl.name.clone());
            let invalid = |message: String| Error::InvalidDeclaration {
                address: address.to_string(),
                message,
            };
            let mode = parse_mode(decl.mode.as_deref(), EntityKind::File, DEFAULT_FILE_MODE)
                .map_err(|e| invalid(e.to_string()))?;
            let spec = FileSpec {
                path: resolve_path(&decl.path, base_dir).map_err(|e| invalid(e.to_string()))?,
                mode,
                user: decl.user.clone(),
                group: decl.group.clone(),
                content: decl.content.clone().into_bytes(),
            };
            check_unique(&mut seen, &address)?;
            declarations.push(Declaration::File {
                name: decl.name.clone(),
                spec,
            });
        }

        Ok(declarations)
    }
}

fn parse_mode(text: Option<&str>, kind: EntityKind, default: Mode) -> fsprov_fs::Result<Mode> {
    match text {
        Some(text) => Mode::parse(text, kind),
        None => Ok(default),
    }
}

fn resolve_path(path: &Path, base_dir: Option<&Path>) -> fsprov_fs::Result<EntityPath> {
    match base_dir {
        Some(base) if path.is_relative() => EntityPath::new(base.join(path)),
        _ => EntityPath::new(path),
    }
}

fn check_unique(seen: &mut BTreeSet<Address>, address: &Address) -> Result<()> {
    if seen.insert(address.clone()) {
        Ok(())
    } else {
        Err(Error::DuplicateAddress {
            address: address.to_string(),
        })
    }
}
