//! Lifecycle engine
//!
//! The engine hosts the two reconcilers the way a configuration tool would:
//! it refreshes tracked state from disk, diffs declarations against it into
//! a [`Plan`], and applies that plan step by step, saving state after each
//! successful step.

use std::cmp::Reverse;
use std::fmt;

use fsprov_fs::{EntityKind, EntityPath};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::ProviderContext;
use crate::directory::DirectoryReconciler;
use crate::field::ChangeSet;
use crate::file::FileReconciler;
use crate::manifest::{Address, Declaration};
use crate::provider::Provider;
use crate::state::{ResourceRecord, StateFile, StateStore};
use crate::{Error, Result};

/// What a plan will do to one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "changes", rename_all = "snake_case")]
pub enum Action {
    Create,
    Update(ChangeSet),
    /// An immutable field changed: delete, then create.
    Replace(ChangeSet),
    Delete,
    NoOp,
}

impl Action {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update(_) => "~",
            Self::Replace(_) => "-/+",
            Self::Delete => "-",
            Self::NoOp => " ",
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update(_) => "update",
            Self::Replace(_) => "replace",
            Self::Delete => "delete",
            Self::NoOp => "no-op",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update(changes) | Self::Replace(changes) => {
                write!(f, "{} ({changes})", self.verb())
            }
            _ => f.write_str(self.verb()),
        }
    }
}

/// One step of a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub address: Address,
    pub path: EntityPath,
    #[serde(flatten)]
    pub action: Action,
    /// Desired state; absent for deletes.
    #[serde(skip)]
    pub declaration: Option<Declaration>,
}

/// Counts of additions, in-place changes and removals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub add: usize,
    pub change: usize,
    pub destroy: usize,
}

impl Summary {
    fn record(&mut self, action: &Action) {
        match action {
            Action::Create => self.add += 1,
            Action::Update(_) => self.change += 1,
            Action::Replace(_) => {
                self.add += 1;
                self.destroy += 1;
            }
            Action::Delete => self.destroy += 1,
            Action::NoOp => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.add == 0 && self.change == 0 && self.destroy == 0
    }
}

/// Ordered steps: declarations in manifest order, then deletes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for change in &self.changes {
            summary.record(&change.action);
        }
        summary
    }

    pub fn has_changes(&self) -> bool {
        !self.summary().is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = self.summary();
        if summary.is_empty() {
            return writeln!(f, "No changes. The filesystem matches the manifest.");
        }
        for change in &self.changes {
            if change.action == Action::NoOp {
                continue;
            }
            writeln!(
                f,
                "{} {} ({}) {}",
                change.action.symbol(),
                change.address,
                change.path,
                change.action
            )?;
        }
        writeln!(
            f,
            "Plan: {} to add, {} to change, {} to destroy.",
            summary.add, summary.change, summary.destroy
        )
    }
}

/// Options for [`Engine::apply`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Report the steps without touching the filesystem or the state.
    pub dry_run: bool,
}

/// A step that [`Engine::apply`] or [`Engine::destroy`] carried out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedChange {
    pub address: Address,
    pub path: EntityPath,
    #[serde(flatten)]
    pub action: Action,
}

/// Outcome of an apply or destroy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub dry_run: bool,
    pub applied: Vec<AppliedChange>,
}

impl ApplyReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for step in &self.applied {
            summary.record(&step.action);
        }
        summary
    }

    fn push(&mut self, address: Address, path: EntityPath, action: Action) {
        self.applied.push(AppliedChange {
            address,
            path,
            action,
        });
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.dry_run { "[dry-run] Would " } else { "" };
        for step in &self.applied {
            writeln!(f, "{prefix}{} {} ({})", step.action, step.address, step.path)?;
        }
        let summary = self.summary();
        writeln!(
            f,
            "{}: {} added, {} changed, {} destroyed.",
            if self.dry_run { "Dry run" } else { "Apply complete" },
            summary.add,
            summary.change,
            summary.destroy
        )
    }
}

/// Drives both reconcilers against a [`StateFile`].
#[derive(Debug, Clone)]
pub struct Engine {
    ctx: ProviderContext,
    directories: DirectoryReconciler,
    files: FileReconciler,
}

impl Engine {
    pub fn new(provider: &Provider) -> Self {
        Self {
            ctx: provider.context().clone(),
            directories: provider.directories(),
            files: provider.files(),
        }
    }

    /// Read every tracked resource back from disk.
    ///
    /// Records whose entity no longer exists are dropped, so the next plan
    /// recreates them.
    pub fn refresh(&self, state: &mut StateFile) -> Result<()> {
        for record in &mut state.resources {
            let address = record.address();
            let read = match record {
                ResourceRecord::Directory { state, .. } => self.directories.read(state),
                ResourceRecord::File { state, .. } => self.files.read(state),
            };
            read.map_err(|e| step_error(&address, e))?;
        }

        state.resources.retain(|record| {
            if !record.exists() {
                warn!(address = %record.address(), path = %record.path(), "resource vanished from disk");
            }
            record.exists()
        });
        Ok(())
    }

    /// Refresh `state`, then diff `declarations` against it.
    pub fn plan(&self, declarations: &[Declaration], state: &mut StateFile) -> Result<Plan> {
        self.refresh(state)?;

        let mut plan = Plan::default();
        for declaration in declarations {
            let address = declaration.address();
            let action = match state.get(&address) {
                None => Action::Create,
                Some(record) => {
                    let changes = self
                        .drift(declaration, record)
                        .map_err(|e| step_error(&address, e))?;
                    if changes.is_empty() {
                        Action::NoOp
                    } else if changes.requires_replacement(address.kind) {
                        Action::Replace(changes)
                    } else {
                        Action::Update(changes)
                    }
                }
            };
            debug!(address = %address, action = %action, "planned");
            plan.changes.push(PlannedChange {
                address,
                path: declaration.path().clone(),
                action,
                declaration: Some(declaration.clone()),
            });
        }

        let declared: Vec<Address> = declarations.iter().map(Declaration::address).collect();
        let orphans = state
            .resources
            .iter()
            .filter(|record| !declared.contains(&record.address()));
        for record in teardown_order(orphans) {
            plan.changes.push(PlannedChange {
                address: record.address(),
                path: record.path().clone(),
                action: Action::Delete,
                declaration: None,
            });
        }

        Ok(plan)
    }

    /// Execute `plan` in order, saving state after every step.
    ///
    /// The first failing step aborts the run. Steps completed before it stay
    /// recorded in the saved state.
    pub fn apply(
        &self,
        plan: &Plan,
        state: &mut StateFile,
        store: &StateStore,
        options: ApplyOptions,
    ) -> Result<ApplyReport> {
        let mut report = ApplyReport {
            dry_run: options.dry_run,
            applied: Vec::new(),
        };

        for change in &plan.changes {
            if change.action == Action::NoOp {
                continue;
            }
            if !options.dry_run {
                self.apply_step(change, state, store)
                    .map_err(|e| step_error(&change.address, e))?;
            }
            report.push(
                change.address.clone(),
                change.path.clone(),
                change.action.clone(),
            );
        }

        let summary = report.summary();
        info!(
            dry_run = options.dry_run,
            added = summary.add,
            changed = summary.change,
            destroyed = summary.destroy,
            "apply finished"
        );
        Ok(report)
    }

    /// Delete every tracked resource: files first, then directories deepest
    /// first.
    pub fn destroy(
        &self,
        state: &mut StateFile,
        store: &StateStore,
        options: ApplyOptions,
    ) -> Result<ApplyReport> {
        self.refresh(state)?;

        let targets: Vec<(Address, EntityPath)> = teardown_order(state.resources.iter())
            .into_iter()
            .map(|record| (record.address(), record.path().clone()))
            .collect();

        let mut report = ApplyReport {
            dry_run: options.dry_run,
            applied: Vec::new(),
        };
        for (address, path) in targets {
            if !options.dry_run {
                self.delete(&address, &path, state, store)
                    .map_err(|e| step_error(&address, e))?;
            }
            report.push(address, path, Action::Delete);
        }

        info!(dry_run = options.dry_run, destroyed = report.applied.len(), "destroy finished");
        Ok(report)
    }

    fn drift(&self, declaration: &Declaration, record: &ResourceRecord) -> Result<ChangeSet> {
        match (declaration, record) {
            (Declaration::Directory { spec, .. }, ResourceRecord::Directory { state, .. }) => {
                spec.drift(state, &self.ctx)
            }
            (Declaration::File { spec, .. }, ResourceRecord::File { state, .. }) => {
                spec.drift(state, &self.ctx)
            }
            (declaration, record) => Err(kind_conflict(declaration, record)),
        }
    }

    fn apply_step(&self, change: &PlannedChange, state: &mut StateFile, store: &StateStore) -> Result<()> {
        info!(address = %change.address, action = %change.action, "applying");
        match (&change.action, &change.declaration) {
            (Action::Create, Some(declaration)) => self.create(declaration, state, store),
            (Action::Update(changes), Some(declaration)) => {
                self.update(declaration, changes, state, store)
            }
            (Action::Replace(_), Some(declaration)) => {
                if let Some(old_path) = state.get(&change.address).map(|r| r.path().clone()) {
                    self.delete(&change.address, &old_path, state, store)?;
                }
                self.create(declaration, state, store)
            }
            (Action::Delete, _) => self.delete(&change.address, &change.path, state, store),
            _ => Ok(()),
        }
    }

    fn create(&self, declaration: &Declaration, state: &mut StateFile, store: &StateStore) -> Result<()> {
        let record = match declaration {
            Declaration::Directory { name, spec } => ResourceRecord::Directory {
                name: name.clone(),
                state: self.directories.create(spec)?,
            },
            Declaration::File { name, spec } => ResourceRecord::File {
                name: name.clone(),
                state: self.files.create(spec)?,
            },
        };
        state.upsert(record);
        store.save(state)
    }

    fn update(
        &self,
        declaration: &Declaration,
        changes: &ChangeSet,
        state: &mut StateFile,
        store: &StateStore,
    ) -> Result<()> {
        let Some(record) = state.get_mut(&declaration.address()) else {
            return self.create(declaration, state, store);
        };
        match (declaration, record) {
            (Declaration::Directory { spec, .. }, ResourceRecord::Directory { state: current, .. }) => {
                self.directories.update(spec, changes, current)?
            }
            (Declaration::File { spec, .. }, ResourceRecord::File { state: current, .. }) => {
                self.files.update(spec, changes, current)?
            }
            (declaration, record) => return Err(kind_conflict(declaration, &*record)),
        }
        store.save(state)
    }

    fn delete(
        &self,
        address: &Address,
        path: &EntityPath,
        state: &mut StateFile,
        store: &StateStore,
    ) -> Result<()> {
        match address.kind {
            EntityKind::Directory => self.directories.delete(path)?,
            EntityKind::File => self.files.delete(path)?,
        }
        state.remove(address);
        store.save(state)
    }
}

/// Files before directories, deeper directories before their parents.
fn teardown_order<'a>(records: impl Iterator<Item = &'a ResourceRecord>) -> Vec<&'a ResourceRecord> {
    let mut records: Vec<&ResourceRecord> = records.collect();
    records.sort_by_key(|record| {
        (
            record.kind() == EntityKind::Directory,
            Reverse(record.path().depth()),
        )
    });
    records
}

/// A declaration paired with a record of the other entity kind.
fn kind_conflict(declaration: &Declaration, record: &ResourceRecord) -> Error {
    Error::InvalidDeclaration {
        address: declaration.address().to_string(),
        message: format!(
            "declared as a {} but the state records a {}",
            declaration.address().kind,
            record.kind()
        ),
    }
}

fn step_error(address: &Address, source: Error) -> Error {
    match source {
        Error::Step { .. } => source,
        source => Error::Step {
            address: address.to_string(),
            source: Box::new(source),
        },
    }
}
