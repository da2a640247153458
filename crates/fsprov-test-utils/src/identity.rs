//! A fixed identity database for tests.
//!
//! Ownership can only be applied without privileges when the target ids are
//! the process's own. [`StaticIdentity`] therefore maps stable test names
//! onto the real effective uid and gid, so assertions never depend on the
//! account the suite happens to run under.

use std::collections::BTreeMap;

use fsprov_fs::{CurrentIdentity, Error, IdentityResolver, Result};
use nix::unistd::{Gid, Uid};

/// User name mapped onto the effective uid.
pub const TEST_USER: &str = "alice";

/// Group name mapped onto the effective gid.
pub const TEST_GROUP: &str = "staff";

/// In-memory user and group tables.
///
/// Forward lookups accept every registered name. Reverse lookups return the
/// first name registered for an id.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    users: BTreeMap<String, u32>,
    groups: BTreeMap<String, u32>,
    user_names: BTreeMap<u32, String>,
    group_names: BTreeMap<u32, String>,
    current_user: String,
    current_group: String,
}

impl Default for StaticIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticIdentity {
    /// [`TEST_USER`] and [`TEST_GROUP`] as the current identity.
    pub fn new() -> Self {
        let mut identity = Self {
            users: BTreeMap::new(),
            groups: BTreeMap::new(),
            user_names: BTreeMap::new(),
            group_names: BTreeMap::new(),
            current_user: TEST_USER.to_string(),
            current_group: TEST_GROUP.to_string(),
        };
        identity.add_user(TEST_USER, Uid::effective().as_raw());
        identity.add_group(TEST_GROUP, Gid::effective().as_raw());
        identity
    }

    /// Register another user name.
    pub fn with_user(mut self, name: &str, uid: u32) -> Self {
        self.add_user(name, uid);
        self
    }

    /// Register another group name.
    pub fn with_group(mut self, name: &str, gid: u32) -> Self {
        self.add_group(name, gid);
        self
    }

    /// Register `name` as an alias of the effective gid.
    pub fn with_group_alias(self, name: &str) -> Self {
        self.with_group(name, Gid::effective().as_raw())
    }

    fn add_user(&mut self, name: &str, uid: u32) {
        self.users.insert(name.to_string(), uid);
        self.user_names.entry(uid).or_insert_with(|| name.to_string());
    }

    fn add_group(&mut self, name: &str, gid: u32) {
        self.groups.insert(name.to_string(), gid);
        self.group_names.entry(gid).or_insert_with(|| name.to_string());
    }
}

impl IdentityResolver for StaticIdentity {
    fn resolve_user(&self, name: &str) -> Result<u32> {
        self.users.get(name).copied().ok_or_else(|| Error::UnknownUser {
            name: name.to_string(),
        })
    }

    fn resolve_group(&self, name: &str) -> Result<u32> {
        self.groups.get(name).copied().ok_or_else(|| Error::UnknownGroup {
            name: name.to_string(),
        })
    }

    fn user_name(&self, uid: u32) -> Result<String> {
        self.user_names
            .get(&uid)
            .cloned()
            .ok_or(Error::UnknownUid { uid })
    }

    fn group_name(&self, gid: u32) -> Result<String> {
        self.group_names
            .get(&gid)
            .cloned()
            .ok_or(Error::UnknownGid { gid })
    }
}

impl CurrentIdentity for StaticIdentity {
    fn current_user(&self) -> Result<String> {
        Ok(self.current_user.clone())
    }

    fn current_group(&self) -> Result<String> {
        Ok(self.current_group.clone())
    }
}
