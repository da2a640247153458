//! Persisted host state
//!
//! The state file records the canonical state of every managed resource,
//! keyed by address. It is the host's source of truth for what was created,
//! and is saved after every successful lifecycle step.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fsprov_fs::io::LockGuard;
use fsprov_fs::{DocumentStore, EntityKind, EntityPath};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::directory::DirectoryState;
use crate::file::FileState;
use crate::manifest::Address;
use crate::{Error, Result};

/// Format version written by this crate.
pub const STATE_VERSION: u32 = 1;

/// Canonical state of one managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceRecord {
    #[serde(rename = "filesystem_directory")]
    Directory { name: String, state: DirectoryState },
    #[serde(rename = "filesystem_file")]
    File { name: String, state: FileState },
}

impl ResourceRecord {
    pub fn address(&self) -> Address {
        match self {
            Self::Directory { name, .. } => Address::directory(name.clone()),
            Self::File { name, .. } => Address::file(name.clone()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Directory { .. } => EntityKind::Directory,
            Self::File { .. } => EntityKind::File,
        }
    }

    pub fn path(&self) -> &EntityPath {
        match self {
            Self::Directory { state, .. } => &state.path,
            Self::File { state, .. } => &state.path,
        }
    }

    /// Whether the last read found the entity on disk.
    pub fn exists(&self) -> bool {
        match self {
            Self::Directory { state, .. } => state.exists(),
            Self::File { state, .. } => state.exists(),
        }
    }
}

/// The state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    /// Fixed for the life of the file.
    pub lineage: Uuid,
    /// Incremented on every save.
    pub serial: u64,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub resources: Vec<ResourceRecord>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

impl StateFile {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            lineage: Uuid::new_v4(),
            serial: 0,
            updated_at: Utc::now(),
            resources: Vec::new(),
        }
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceRecord> {
        self.resources.iter().find(|r| &r.address() == address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut ResourceRecord> {
        self.resources.iter_mut().find(|r| &r.address() == address)
    }

    /// Insert or replace the record at its address, keeping insertion order.
    pub fn upsert(&mut self, record: ResourceRecord) {
        let address = record.address();
        match self.resources.iter_mut().find(|r| r.address() == address) {
            Some(existing) => *existing = record,
            None => self.resources.push(record),
        }
    }

    pub fn remove(&mut self, address: &Address) -> Option<ResourceRecord> {
        let pos = self.resources.iter().position(|r| &r.address() == address)?;
        Some(self.resources.remove(pos))
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.resources.iter().map(ResourceRecord::address).collect()
    }
}

/// Loads and saves a [`StateFile`] at a fixed path.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    documents: DocumentStore,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_documents(path, DocumentStore::new())
    }

    pub fn with_documents(path: impl Into<PathBuf>, documents: DocumentStore) -> Self {
        Self {
            path: path.into(),
            documents,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<state>.lock`, held for the duration of a mutating command.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Load the state, or start a fresh one when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StateVersion`] for a file written by another format
    /// version.
    pub fn load(&self) -> Result<StateFile> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file, starting empty");
            return Ok(StateFile::new());
        }
        let state: StateFile = self.documents.load(&self.path)?;
        if state.version != STATE_VERSION {
            return Err(Error::StateVersion {
                found: state.version,
            });
        }
        debug!(path = %self.path.display(), serial = state.serial, resources = state.resources.len(), "loaded state");
        Ok(state)
    }

    /// Bump the serial and write the state atomically.
    pub fn save(&self, state: &mut StateFile) -> Result<()> {
        state.serial += 1;
        state.updated_at = Utc::now();
        self.documents.save(&self.path, &*state)?;
        debug!(path = %self.path.display(), serial = state.serial, "saved state");
        Ok(())
    }

    /// Take the exclusive state lock, retrying until the configured timeout.
    pub fn lock(&self) -> Result<LockGuard> {
        let lock_path = self.lock_path();
        Ok(LockGuard::acquire(&lock_path, self.documents.robustness())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    fn file_record(name: &str, path: &str) -> ResourceRecord {
        let path = EntityPath::new(path).unwrap();
        ResourceRecord::File {
            name: name.to_string(),
            state: FileState {
                id: EntityId::for_path(&path),
                path,
                mode: "0600".into(),
                user: "alice".into(),
                group: "staff".into(),
                content: fsprov_fs::fingerprint_str("blah"),
            },
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut state = StateFile::new();
        state.upsert(file_record("a", "/tmp/a"));
        state.upsert(file_record("b", "/tmp/b"));
        state.upsert(file_record("a", "/tmp/a2"));

        assert_eq!(state.addresses(), vec![Address::file("a"), Address::file("b")]);
        assert_eq!(
            state.get(&Address::file("a")).unwrap().path().as_str(),
            "/tmp/a2"
        );
    }

    #[test]
    fn record_is_tagged_with_resource_type() {
        let json = serde_json::to_value(file_record("motd", "/tmp/testfile")).unwrap();
        assert_eq!(json["type"], "filesystem_file");
        assert_eq!(json["name"], "motd");
        assert_eq!(json["state"]["mode"], "0600");
    }

    #[test]
    fn lock_path_appends_suffix() {
        let store = StateStore::new("/var/lib/fsprov/state.json");
        assert_eq!(
            store.lock_path(),
            PathBuf::from("/var/lib/fsprov/state.json.lock")
        );
    }
}
