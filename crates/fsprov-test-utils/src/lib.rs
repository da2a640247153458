//! Shared test utilities for the filesystem provider workspace.
//!
//! This crate provides standardised fixtures so the reconciler, engine and
//! CLI suites do not each reinvent them. It is a dev-dependency only, never
//! published.
//!
//! # Modules
//!
//! - [`identity`]: [`StaticIdentity`], a substitutable user/group database
//! - [`sandbox`]: [`Sandbox`], a temporary root for entity paths

pub mod identity;
pub mod sandbox;

pub use identity::{StaticIdentity, TEST_GROUP, TEST_USER};
pub use sandbox::Sandbox;
