//! File reconciler
//!
//! Like the directory reconciler, plus content. Content is written whole:
//! creation truncates, and a content change truncates to zero and rewrites
//! the full payload. Canonical state carries the content fingerprint only.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::{OpenOptionsExt, fchown};

use fsprov_fs::{EntityKind, EntityPath, Error as FsError, Mode, fingerprint, fingerprint_reader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::ProviderContext;
use crate::entity::{EntityId, expect_mode_kind, observed_mode};
use crate::field::{ChangeSet, Field};
use crate::{Error, Result};

/// Permissions applied when a declaration gives none.
pub const DEFAULT_FILE_MODE: Mode = Mode::from_bits_truncate(0o644, EntityKind::File);

/// Desired state of a regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSpec {
    pub path: EntityPath,
    /// Must be a file mode.
    pub mode: Mode,
    pub user: Option<String>,
    pub group: Option<String>,
    pub content: Vec<u8>,
}

impl FileSpec {
    pub fn new(path: EntityPath) -> Self {
        Self {
            path,
            mode: DEFAULT_FILE_MODE,
            user: None,
            group: None,
            content: Vec::new(),
        }
    }

    /// Set the mode from octal text.
    pub fn with_mode(mut self, text: &str) -> Result<Self> {
        self.mode = Mode::parse(text, EntityKind::File)?;
        Ok(self)
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    pub fn content_fingerprint(&self) -> String {
        fingerprint(&self.content)
    }

    /// Fields whose desired canonical value differs from `state`.
    pub fn drift(&self, state: &FileState, ctx: &ProviderContext) -> Result<ChangeSet> {
        let mut changes = ChangeSet::new();
        if self.path != state.path {
            changes.insert(Field::Path);
        }
        if self.mode.canonical() != state.mode {
            changes.insert(Field::Mode);
        }
        if ctx.user_or_current(self.user.as_deref())? != state.user {
            changes.insert(Field::User);
        }
        if ctx.group_or_current(self.group.as_deref())? != state.group {
            changes.insert(Field::Group);
        }
        if self.content_fingerprint() != state.content {
            changes.insert(Field::Content);
        }
        Ok(changes)
    }
}

/// Canonical state of a regular file as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    pub id: EntityId,
    pub path: EntityPath,
    pub mode: String,
    pub user: String,
    pub group: String,
    /// Fingerprint of the content, never the content itself.
    pub content: String,
}

impl FileState {
    pub fn exists(&self) -> bool {
        self.id.is_present()
    }
}

/// Creates, reads, updates and removes regular files.
#[derive(Debug, Clone)]
pub struct FileReconciler {
    ctx: ProviderContext,
}

impl FileReconciler {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Create the file with its initial content and report canonical state.
    ///
    /// The recorded mode is the one left on disk once the umask and the
    /// ownership change have been applied.
    pub fn create(&self, spec: &FileSpec) -> Result<FileState> {
        debug!(path = %spec.path, mode = %spec.mode, "creating file");
        expect_mode_kind(spec.mode, EntityKind::File)?;

        let owner = self
            .ctx
            .resolve_owner(spec.user.as_deref(), spec.group.as_deref())?;

        let path = spec.path.as_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(spec.mode.bits())
            .open(path)
            .map_err(|e| FsError::io("open", path, e))?;

        file.write_all(&spec.content)
            .map_err(|e| FsError::io("write", path, e))?;

        fchown(&file, Some(owner.uid), Some(owner.gid))
            .map_err(|e| FsError::io("chown", path, e))?;

        // chown of a regular file drops setuid and setgid.
        let metadata = file.metadata().map_err(|e| FsError::io("stat", path, e))?;
        let mode = observed_mode(path, &metadata, EntityKind::File)?;

        info!(path = %spec.path, mode = %mode, user = %owner.user, group = %owner.group, bytes = spec.content.len(), "created file");
        Ok(FileState {
            id: EntityId::for_path(&spec.path),
            path: spec.path.clone(),
            mode: mode.canonical(),
            user: owner.user,
            group: owner.group,
            content: spec.content_fingerprint(),
        })
    }

    /// Refresh `state` from the live file, fingerprinting its content.
    ///
    /// A missing file clears `state.id` and is not an error.
    pub fn read(&self, state: &mut FileState) -> Result<()> {
        debug!(path = %state.path, "reading file");
        let path = state.path.as_path();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %state.path, "file no longer exists");
                state.id.clear();
                return Ok(());
            }
            Err(e) => return Err(FsError::io("open", path, e).into()),
        };

        let metadata = file.metadata().map_err(|e| FsError::io("stat", path, e))?;
        let mode = observed_mode(path, &metadata, EntityKind::File)?;
        let content = fingerprint_reader(&file).map_err(|e| FsError::io("read", path, e))?;
        let (user, group) = self.ctx.owner_names(&metadata)?;

        state.mode = mode.canonical();
        state.content = content;
        state.user = user;
        state.group = group;
        Ok(())
    }

    /// Apply the fields named in `changes`, leaving all others untouched.
    ///
    /// Order: ownership, mode, then content. Ownership goes first because
    /// chown clears setuid and setgid. A content change truncates the file
    /// to zero length before writing the full payload. The recorded mode is
    /// read back from the handle afterwards.
    pub fn update(&self, spec: &FileSpec, changes: &ChangeSet, state: &mut FileState) -> Result<()> {
        if let Some(field) = changes.immutable_field(EntityKind::File) {
            return Err(Error::ImmutableField {
                kind: EntityKind::File,
                field,
            });
        }

        let apply_mode = changes.has_change(Field::Mode);
        let apply_owner = changes.has_owner_change();
        let apply_content = changes.has_change(Field::Content);
        if !apply_mode && !apply_owner && !apply_content {
            debug!(path = %spec.path, "no file fields changed");
            return Ok(());
        }
        debug!(path = %spec.path, changes = %changes, "updating file");
        expect_mode_kind(spec.mode, EntityKind::File)?;

        let owner = if apply_owner {
            Some(
                self.ctx
                    .resolve_owner(spec.user.as_deref(), spec.group.as_deref())?,
            )
        } else {
            None
        };

        let path = spec.path.as_path();
        let mut file = OpenOptions::new()
            .read(!apply_content)
            .write(apply_content)
            .open(path)
            .map_err(|e| FsError::io("open", path, e))?;
        let metadata = file.metadata().map_err(|e| FsError::io("stat", path, e))?;
        observed_mode(path, &metadata, EntityKind::File)?;

        if let Some(owner) = owner {
            fchown(&file, Some(owner.uid), Some(owner.gid))
                .map_err(|e| FsError::io("chown", path, e))?;
            info!(path = %spec.path, user = %owner.user, group = %owner.group, "changed file owner");
            state.user = owner.user;
            state.group = owner.group;
        }

        if apply_mode {
            file.set_permissions(spec.mode.permissions())
                .map_err(|e| FsError::io("chmod", path, e))?;
            info!(path = %spec.path, mode = %spec.mode, "changed file mode");
        }

        if apply_content {
            file.set_len(0)
                .map_err(|e| FsError::io("truncate", path, e))?;
            file.write_all(&spec.content)
                .map_err(|e| FsError::io("write", path, e))?;
            info!(path = %spec.path, bytes = spec.content.len(), "rewrote file content");
            state.content = spec.content_fingerprint();
        }

        let metadata = file.metadata().map_err(|e| FsError::io("stat", path, e))?;
        state.mode = observed_mode(path, &metadata, EntityKind::File)?.canonical();
        Ok(())
    }

    /// Remove the file.
    pub fn delete(&self, path: &EntityPath) -> Result<()> {
        debug!(path = %path, "deleting file");
        fs::remove_file(path).map_err(|e| FsError::io("remove", path.as_path(), e))?;
        info!(path = %path, "deleted file");
        Ok(())
    }
}
