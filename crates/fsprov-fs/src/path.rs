//! Validated absolute paths for managed entities

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// An absolute, lexically normalized path to a managed entity.
///
/// Duplicate separators and `.` components are dropped, `..` pops the
/// previous component (never above `/`), and trailing separators are
/// removed. Symlinks are not resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityPath {
    inner: String,
}

impl EntityPath {
    /// Validate and normalize `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonUtf8Path`] for a path that is not valid UTF-8,
    /// and [`Error::RelativePath`] unless `path` starts with `/`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = path.to_str().ok_or_else(|| Error::NonUtf8Path {
            path: path.to_path_buf(),
        })?;
        if !raw.starts_with('/') {
            return Err(Error::RelativePath {
                path: raw.to_string(),
            });
        }

        let mut components: Vec<&str> = Vec::new();
        for component in raw.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    components.pop();
                }
                other => components.push(other),
            }
        }

        Ok(Self {
            inner: format!("/{}", components.join("/")),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.inner)
    }

    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// The parent directory, or `None` for `/`.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Number of components below `/`.
    pub fn depth(&self) -> usize {
        self.inner.split('/').filter(|c| !c.is_empty()).count()
    }
}

impl AsRef<Path> for EntityPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl TryFrom<&str> for EntityPath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<PathBuf> for EntityPath {
    type Error = Error;

    fn try_from(p: PathBuf) -> Result<Self> {
        Self::new(p)
    }
}

impl Serialize for EntityPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for EntityPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
