//! Command implementations for fsprov-cli

pub mod apply;
pub mod plan;
pub mod state;

pub use apply::{run_apply, run_destroy};
pub use plan::run_plan;
pub use state::{run_refresh, run_show};
