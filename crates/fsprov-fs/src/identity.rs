//! User and group identity resolution
//!
//! Forward (name to id) and reverse (id to name) lookups against the OS
//! identity database, plus the current process identity used when a
//! declaration leaves ownership unset. Both concerns are traits so callers
//! can inject a substitute database.

use nix::unistd::{Gid, Group, Uid, User};

use crate::{Error, Result};

/// Lookups against a user/group database.
pub trait IdentityResolver: Send + Sync {
    /// Numeric id of the named user.
    fn resolve_user(&self, name: &str) -> Result<u32>;

    /// Numeric id of the named group.
    fn resolve_group(&self, name: &str) -> Result<u32>;

    /// Name of the user with the given id.
    fn user_name(&self, uid: u32) -> Result<String>;

    /// Name of the group with the given id.
    fn group_name(&self, gid: u32) -> Result<String>;
}

/// Default ownership for declarations that leave user or group unset.
pub trait CurrentIdentity: Send + Sync {
    /// Name of the user the process runs as.
    fn current_user(&self) -> Result<String>;

    /// Name of the current user's primary group.
    fn current_group(&self) -> Result<String>;
}

/// The system identity database (`getpwnam`, `getgrnam` and friends).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl SystemIdentity {
    pub fn new() -> Self {
        Self
    }

    fn current_passwd_entry(&self) -> Result<User> {
        let uid = Uid::current();
        User::from_uid(uid)
            .map_err(|source| Error::IdentityLookup {
                query: format!("current user (uid {uid})"),
                source,
            })?
            .ok_or(Error::UnknownUid { uid: uid.as_raw() })
    }
}

impl IdentityResolver for SystemIdentity {
    fn resolve_user(&self, name: &str) -> Result<u32> {
        User::from_name(name)
            .map_err(|source| Error::IdentityLookup {
                query: format!("user {name:?}"),
                source,
            })?
            .map(|user| user.uid.as_raw())
            .ok_or_else(|| Error::UnknownUser {
                name: name.to_string(),
            })
    }

    fn resolve_group(&self, name: &str) -> Result<u32> {
        Group::from_name(name)
            .map_err(|source| Error::IdentityLookup {
                query: format!("group {name:?}"),
                source,
            })?
            .map(|group| group.gid.as_raw())
            .ok_or_else(|| Error::UnknownGroup {
                name: name.to_string(),
            })
    }

    fn user_name(&self, uid: u32) -> Result<String> {
        User::from_uid(Uid::from_raw(uid))
            .map_err(|source| Error::IdentityLookup {
                query: format!("uid {uid}"),
                source,
            })?
            .map(|user| user.name)
            .ok_or(Error::UnknownUid { uid })
    }

    fn group_name(&self, gid: u32) -> Result<String> {
        Group::from_gid(Gid::from_raw(gid))
            .map_err(|source| Error::IdentityLookup {
                query: format!("gid {gid}"),
                source,
            })?
            .map(|group| group.name)
            .ok_or(Error::UnknownGid { gid })
    }
}

impl CurrentIdentity for SystemIdentity {
    fn current_user(&self) -> Result<String> {
        Ok(self.current_passwd_entry()?.name)
    }

    fn current_group(&self) -> Result<String> {
        let gid = self.current_passwd_entry()?.gid;
        self.group_name(gid.as_raw())
    }
}
