//! Drift detection between declarations and canonical state

use std::sync::Arc;

use fsprov_core::{
    ChangeSet, DirectoryReconciler, DirectorySpec, Field, FileReconciler, FileSpec,
    ProviderContext,
};
use fsprov_fs::EntityKind;
use fsprov_test_utils::{Sandbox, StaticIdentity, TEST_GROUP, TEST_USER};
use pretty_assertions::assert_eq;

fn context() -> ProviderContext {
    let identity = Arc::new(StaticIdentity::new().with_group_alias("wheel"));
    ProviderContext::new(identity.clone(), identity)
}

#[test]
fn test_fresh_directory_has_no_drift() {
    let sandbox = Sandbox::new();
    let ctx = context();
    let spec = DirectorySpec::new(sandbox.entity("d")).with_mode("0700").unwrap();
    let state = DirectoryReconciler::new(ctx.clone()).create(&spec).unwrap();

    assert_eq!(spec.drift(&state, &ctx).unwrap(), ChangeSet::new());
}

#[test]
fn test_explicit_owner_matching_defaults_has_no_drift() {
    let sandbox = Sandbox::new();
    let ctx = context();
    let state = DirectoryReconciler::new(ctx.clone())
        .create(&DirectorySpec::new(sandbox.entity("d")))
        .unwrap();

    let spec = DirectorySpec::new(sandbox.entity("d"))
        .with_user(TEST_USER)
        .with_group(TEST_GROUP);

    assert!(spec.drift(&state, &ctx).unwrap().is_empty());
}

#[test]
fn test_directory_mode_and_group_drift() {
    let sandbox = Sandbox::new();
    let ctx = context();
    let reconciler = DirectoryReconciler::new(ctx.clone());
    let mut state = reconciler
        .create(&DirectorySpec::new(sandbox.entity("d")))
        .unwrap();
    sandbox.chmod("d", 0o700);
    reconciler.read(&mut state).unwrap();

    let spec = DirectorySpec::new(sandbox.entity("d")).with_group("wheel");
    let changes = spec.drift(&state, &ctx).unwrap();

    assert_eq!(changes, ChangeSet::new().with(Field::Mode).with(Field::Group));
    assert!(!changes.requires_replacement(EntityKind::Directory));
    assert_eq!(changes.to_string(), "mode, group");
}

#[test]
fn test_create_parents_change_requires_replacement() {
    let sandbox = Sandbox::new();
    let ctx = context();
    let state = DirectoryReconciler::new(ctx.clone())
        .create(&DirectorySpec::new(sandbox.entity("d")))
        .unwrap();

    let spec = DirectorySpec::new(sandbox.entity("d")).with_create_parents(true);
    let changes = spec.drift(&state, &ctx).unwrap();

    assert_eq!(changes, ChangeSet::new().with(Field::CreateParents));
    assert!(changes.requires_replacement(EntityKind::Directory));
}

#[test]
fn test_file_content_drift_uses_fingerprint() {
    let sandbox = Sandbox::new();
    let ctx = context();
    let reconciler = FileReconciler::new(ctx.clone());
    let spec = FileSpec::new(sandbox.entity("f")).with_content("blah");
    let mut state = reconciler.create(&spec).unwrap();

    assert!(spec.drift(&state, &ctx).unwrap().is_empty());

    sandbox.write("f", "blah!");
    reconciler.read(&mut state).unwrap();

    assert_eq!(
        spec.drift(&state, &ctx).unwrap(),
        ChangeSet::new().with(Field::Content)
    );
}

#[test]
fn test_file_path_change_requires_replacement() {
    let sandbox = Sandbox::new();
    let ctx = context();
    let state = FileReconciler::new(ctx.clone())
        .create(&FileSpec::new(sandbox.entity("old")))
        .unwrap();

    let spec = FileSpec::new(sandbox.entity("new"));
    let changes = spec.drift(&state, &ctx).unwrap();

    assert!(changes.has_change(Field::Path));
    assert!(changes.requires_replacement(EntityKind::File));
}
