//! Declared fields and change sets
//!
//! An update is driven by an explicit [`ChangeSet`]: the reconciler touches
//! exactly the fields it names and nothing else.

use std::collections::BTreeSet;
use std::fmt;

use fsprov_fs::EntityKind;
use serde::{Deserialize, Serialize};

/// A declared attribute of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Path,
    Mode,
    User,
    Group,
    Content,
    CreateParents,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Mode => "mode",
            Self::User => "user",
            Self::Group => "group",
            Self::Content => "content",
            Self::CreateParents => "create_parents",
        }
    }

    /// Whether a change to this field forces destroy and recreate.
    pub fn is_immutable_for(&self, kind: EntityKind) -> bool {
        match (self, kind) {
            (Self::Path, _) => true,
            (Self::CreateParents, EntityKind::Directory) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of fields reported as changed since the last known state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet(BTreeSet<Field>);

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: Field) -> Self {
        self.0.insert(field);
        self
    }

    pub fn insert(&mut self, field: Field) {
        self.0.insert(field);
    }

    pub fn has_change(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    /// User and group are applied as a unit: a change to either re-resolves
    /// both.
    pub fn has_owner_change(&self) -> bool {
        self.has_change(Field::User) || self.has_change(Field::Group)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }

    /// The first field in the set that cannot change in place, if any.
    pub fn immutable_field(&self, kind: EntityKind) -> Option<Field> {
        self.iter().find(|f| f.is_immutable_for(kind))
    }

    pub fn requires_replacement(&self, kind: EntityKind) -> bool {
        self.immutable_field(kind).is_some()
    }
}

impl FromIterator<Field> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|field| field.as_str()).collect();
        f.write_str(&names.join(", "))
    }
}
