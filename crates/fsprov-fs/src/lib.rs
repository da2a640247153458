//! Filesystem primitives for the filesystem provider
//!
//! Leaf services shared by the entity reconcilers: permission mode encoding,
//! user/group identity resolution, content fingerprints, validated entity
//! paths, and the atomic document I/O used to persist host state.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod identity;
pub mod io;
pub mod mode;
pub mod path;

pub use config::DocumentStore;
pub use error::{Error, Result};
pub use fingerprint::{fingerprint, fingerprint_reader, fingerprint_str};
pub use identity::{CurrentIdentity, IdentityResolver, SystemIdentity};
pub use io::RobustnessConfig;
pub use mode::{EntityKind, Mode};
pub use path::EntityPath;
