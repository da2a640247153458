//! Directory reconciler
//!
//! Converges a directory entry to a [`DirectorySpec`] and reads it back as
//! a [`DirectoryState`] for drift comparison.

use std::fs::{self, DirBuilder, File};
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, fchown};

use fsprov_fs::{EntityKind, EntityPath, Error as FsError, Mode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::ProviderContext;
use crate::entity::{EntityId, expect_mode_kind, observed_mode};
use crate::field::{ChangeSet, Field};
use crate::{Error, Result};

/// Permissions applied when a declaration gives none.
pub const DEFAULT_DIRECTORY_MODE: Mode = Mode::from_bits_truncate(0o755, EntityKind::Directory);

/// Desired state of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySpec {
    pub path: EntityPath,
    /// Must be a directory mode.
    pub mode: Mode,
    /// Owner user; the current user when `None`.
    pub user: Option<String>,
    /// Owner group; the current user's primary group when `None`.
    pub group: Option<String>,
    /// Create missing ancestors on creation.
    pub create_parents: bool,
}

impl DirectorySpec {
    pub fn new(path: EntityPath) -> Self {
        Self {
            path,
            mode: DEFAULT_DIRECTORY_MODE,
            user: None,
            group: None,
            create_parents: false,
        }
    }

    /// Set the mode from octal text.
    pub fn with_mode(mut self, text: &str) -> Result<Self> {
        self.mode = Mode::parse(text, EntityKind::Directory)?;
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

    pub fn with_create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }

    /// Fields whose desired canonical value differs from `state`.
    pub fn drift(&self, state: &DirectoryState, ctx: &ProviderContext) -> Result<ChangeSet> {
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
        if self.create_parents != state.create_parents {
            changes.insert(Field::CreateParents);
        }
        Ok(changes)
    }
}

/// Canonical state of a directory as last observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryState {
    pub id: EntityId,
    pub path: EntityPath,
    /// Canonical mode text, including the directory type tag.
    pub mode: String,
    pub user: String,
    pub group: String,
    pub create_parents: bool,
}

impl DirectoryState {
    pub fn exists(&self) -> bool {
        self.id.is_present()
    }
}

/// Creates, reads, updates and removes directories.
#[derive(Debug, Clone)]
pub struct DirectoryReconciler {
    ctx: ProviderContext,
}

impl DirectoryReconciler {
    pub fn new(ctx: ProviderContext) -> Self {
        Self { ctx }
    }

    /// Create the directory and report its canonical state.
    ///
    /// Without `create_parents`, a missing ancestor surfaces as the OS
    /// `mkdir` error. On any failure no state is returned, so the entity
    /// stays absent to the caller.
    pub fn create(&self, spec: &DirectorySpec) -> Result<DirectoryState> {
        debug!(path = %spec.path, mode = %spec.mode, "creating directory");
        expect_mode_kind(spec.mode, EntityKind::Directory)?;

        let owner = self
            .ctx
            .resolve_owner(spec.user.as_deref(), spec.group.as_deref())?;

        let path = spec.path.as_path();
        DirBuilder::new()
            .recursive(spec.create_parents)
            .mode(spec.mode.bits())
            .create(path)
            .map_err(|e| FsError::io("mkdir", path, e))?;

        let dir = File::open(path).map_err(|e| FsError::io("open", path, e))?;
        fchown(&dir, Some(owner.uid), Some(owner.gid))
            .map_err(|e| FsError::io("chown", path, e))?;

        let metadata = dir.metadata().map_err(|e| FsError::io("stat", path, e))?;
        let mode = observed_mode(path, &metadata, EntityKind::Directory)?;

        info!(path = %spec.path, mode = %mode, user = %owner.user, group = %owner.group, "created directory");
        Ok(DirectoryState {
            id: EntityId::for_path(&spec.path),
            path: spec.path.clone(),
            mode: mode.canonical(),
            user: owner.user,
            group: owner.group,
            create_parents: spec.create_parents,
        })
    }

    /// Refresh `state` from live metadata.
    ///
    /// A missing directory clears `state.id` and is not an error.
    pub fn read(&self, state: &mut DirectoryState) -> Result<()> {
        debug!(path = %state.path, "reading directory");
        let path = state.path.as_path();

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %state.path, "directory no longer exists");
                state.id.clear();
                return Ok(());
            }
            Err(e) => return Err(FsError::io("stat", path, e).into()),
        };

        let mode = observed_mode(path, &metadata, EntityKind::Directory)?;
        let (user, group) = self.ctx.owner_names(&metadata)?;

        state.mode = mode.canonical();
        state.user = user;
        state.group = group;
        Ok(())
    }

    /// Apply the fields named in `changes`, leaving all others untouched.
    ///
    /// `path` and `create_parents` cannot change in place. Owner lookups
    /// happen before any mutation, and ownership is applied before the mode.
    /// The recorded mode is read back from the open directory.
    pub fn update(
        &self,
        spec: &DirectorySpec,
        changes: &ChangeSet,
        state: &mut DirectoryState,
    ) -> Result<()> {
        if let Some(field) = changes.immutable_field(EntityKind::Directory) {
            return Err(Error::ImmutableField {
                kind: EntityKind::Directory,
                field,
            });
        }

        let apply_mode = changes.has_change(Field::Mode);
        let apply_owner = changes.has_owner_change();
        if !apply_mode && !apply_owner {
            debug!(path = %spec.path, "no directory fields changed");
            return Ok(());
        }
        debug!(path = %spec.path, changes = %changes, "updating directory");
        expect_mode_kind(spec.mode, EntityKind::Directory)?;

        let owner = if apply_owner {
            Some(
                self.ctx
                    .resolve_owner(spec.user.as_deref(), spec.group.as_deref())?,
            )
        } else {
            None
        };

        let path = spec.path.as_path();
        let dir = File::open(path).map_err(|e| FsError::io("open", path, e))?;
        let metadata = dir.metadata().map_err(|e| FsError::io("stat", path, e))?;
        observed_mode(path, &metadata, EntityKind::Directory)?;

        if let Some(owner) = owner {
            fchown(&dir, Some(owner.uid), Some(owner.gid))
                .map_err(|e| FsError::io("chown", path, e))?;
            info!(path = %spec.path, user = %owner.user, group = %owner.group, "changed directory owner");
            state.user = owner.user;
            state.group = owner.group;
        }

        if apply_mode {
            dir.set_permissions(spec.mode.permissions())
                .map_err(|e| FsError::io("chmod", path, e))?;
            info!(path = %spec.path, mode = %spec.mode, "changed directory mode");
        }

        let metadata = dir.metadata().map_err(|e| FsError::io("stat", path, e))?;
        state.mode = observed_mode(path, &metadata, EntityKind::Directory)?.canonical();
        Ok(())
    }

    /// Remove the directory. Non-recursive: a non-empty directory fails.
    pub fn delete(&self, path: &EntityPath) -> Result<()> {
        debug!(path = %path, "deleting directory");
        fs::remove_dir(path).map_err(|e| FsError::io("remove", path.as_path(), e))?;
        info!(path = %path, "deleted directory");
        Ok(())
    }
}
