//! Entity reconcilers and lifecycle engine for the filesystem provider
//!
//! This crate converges individual POSIX directories and regular files to a
//! declared state and hosts them in a small plan/apply engine:
//!
//! - **Reconcilers**: create, read, update and delete for directories
//!   ([`DirectoryReconciler`]) and regular files ([`FileReconciler`])
//! - **Change tracking**: explicit [`ChangeSet`]s drive minimal updates;
//!   immutable fields force replacement
//! - **Manifest**: declarations loaded from TOML, JSON or YAML
//! - **State**: canonical per-resource state persisted atomically under a lock
//! - **Engine**: refresh, plan, apply and destroy over the state file
//!
//! # Architecture
//!
//! ```text
//!                 fsprov-cli
//!                     |
//!                fsprov-core
//!      engine -> reconcilers -> context
//!                     |
//!                 fsprov-fs
//!   mode | identity | fingerprint | path | io
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fsprov_core::{DirectoryReconciler, DirectorySpec, ProviderContext, Result};
//! use fsprov_fs::EntityPath;
//!
//! fn example() -> Result<()> {
//!     let reconciler = DirectoryReconciler::new(ProviderContext::system());
//!     let spec = DirectorySpec::new(EntityPath::new("/tmp/test/testdir")?)
//!         .with_mode("0700")?
//!         .with_create_parents(true);
//!     let state = reconciler.create(&spec)?;
//!     assert_eq!(state.mode, "020000000700");
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod directory;
pub mod engine;
pub mod entity;
pub mod error;
pub mod field;
pub mod file;
pub mod logging;
pub mod manifest;
pub mod provider;
pub mod state;

pub use context::{Owner, ProviderContext};
pub use directory::{DEFAULT_DIRECTORY_MODE, DirectoryReconciler, DirectorySpec, DirectoryState};
pub use engine::{ApplyOptions, ApplyReport, AppliedChange, Action, Engine, Plan, PlannedChange, Summary};
pub use entity::EntityId;
pub use error::{Error, Result};
pub use field::{ChangeSet, Field};
pub use file::{DEFAULT_FILE_MODE, FileReconciler, FileSpec, FileState};
pub use manifest::{Address, Declaration, DirectoryDecl, FileDecl, Manifest};
pub use provider::{DIRECTORY_RESOURCE, FILE_RESOURCE, Provider, ProviderConfig, resource_type};
pub use state::{ResourceRecord, STATE_VERSION, StateFile, StateStore};
