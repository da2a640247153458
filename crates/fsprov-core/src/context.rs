//! Collaborators shared by the reconcilers

use std::fmt;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;
use std::sync::Arc;

use fsprov_fs::{CurrentIdentity, IdentityResolver, SystemIdentity};

use crate::Result;

/// Ownership resolved to both names and numeric ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub user: String,
    pub uid: u32,
    pub group: String,
    pub gid: u32,
}

/// Identity services injected into every reconciler.
#[derive(Clone)]
pub struct ProviderContext {
    identities: Arc<dyn IdentityResolver>,
    current: Arc<dyn CurrentIdentity>,
}

impl ProviderContext {
    pub fn new(identities: Arc<dyn IdentityResolver>, current: Arc<dyn CurrentIdentity>) -> Self {
        Self {
            identities,
            current,
        }
    }

    /// Context backed by the OS identity database and the process identity.
    pub fn system() -> Self {
        let system = Arc::new(SystemIdentity::new());
        Self::new(system.clone(), system)
    }

    pub fn identities(&self) -> &dyn IdentityResolver {
        self.identities.as_ref()
    }

    pub fn current(&self) -> &dyn CurrentIdentity {
        self.current.as_ref()
    }

    /// The declared user, or the current user when unset.
    pub fn user_or_current(&self, user: Option<&str>) -> Result<String> {
        match user {
            Some(name) => Ok(name.to_string()),
            None => Ok(self.current.current_user()?),
        }
    }

    /// The declared group, or the current user's primary group when unset.
    pub fn group_or_current(&self, group: Option<&str>) -> Result<String> {
        match group {
            Some(name) => Ok(name.to_string()),
            None => Ok(self.current.current_group()?),
        }
    }

    /// Resolve declared ownership, defaulting each unset half independently.
    ///
    /// Runs before any OS mutation so a lookup failure aborts cleanly.
    pub fn resolve_owner(&self, user: Option<&str>, group: Option<&str>) -> Result<Owner> {
        let user = self.user_or_current(user)?;
        let group = self.group_or_current(group)?;
        let uid = self.identities.resolve_user(&user)?;
        let gid = self.identities.resolve_group(&group)?;
        Ok(Owner {
            user,
            uid,
            group,
            gid,
        })
    }

    /// Reverse-map the owner recorded in live metadata.
    pub fn owner_names(&self, metadata: &Metadata) -> Result<(String, String)> {
        let user = self.identities.user_name(metadata.uid())?;
        let group = self.identities.group_name(metadata.gid())?;
        Ok((user, group))
    }
}

impl Default for ProviderContext {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext").finish_non_exhaustive()
    }
}
