//! End-to-end reconciliation scenarios against the real identity database
//!
//! Each test drives the reconcilers with `ProviderContext::system()`, so
//! ownership defaults come from the account running the suite.

use std::fs;

use fsprov_core::{
    ChangeSet, DirectoryReconciler, DirectorySpec, Field, FileReconciler, FileSpec,
    ProviderContext,
};
use fsprov_fs::{CurrentIdentity, SystemIdentity, fingerprint_str};
use fsprov_test_utils::Sandbox;
use pretty_assertions::assert_eq;

fn current_owner() -> (String, String) {
    let identity = SystemIdentity::new();
    (
        identity.current_user().unwrap(),
        identity.current_group().unwrap(),
    )
}

// =============================================================================
// Directories
// =============================================================================

#[test]
fn scenario_missing_parent_without_create_parents_fails() {
    let sandbox = Sandbox::new();
    let reconciler = DirectoryReconciler::new(ProviderContext::system());
    let spec = DirectorySpec::new(sandbox.entity("test/testdir"))
        .with_mode("0700")
        .unwrap();

    let err = reconciler.create(&spec).unwrap_err();

    assert!(err.is_not_found(), "expected no such file or directory, got {err}");
    assert!(err.to_string().contains("No such file or directory"), "got {err}");
    sandbox.assert_missing("test/testdir");
}

#[test]
fn scenario_create_parents_uses_current_identity() {
    let sandbox = Sandbox::new();
    let reconciler = DirectoryReconciler::new(ProviderContext::system());
    let spec = DirectorySpec::new(sandbox.entity("test/testdir"))
        .with_mode("0700")
        .unwrap()
        .with_create_parents(true);

    let mut state = reconciler.create(&spec).unwrap();
    reconciler.read(&mut state).unwrap();

    let (user, group) = current_owner();
    assert_eq!(state.user, user);
    assert_eq!(state.group, group);
    assert_eq!(state.mode, "020000000700");
    sandbox.assert_exists("test/testdir");
}

#[test]
fn directory_lifecycle_round_trip() {
    let sandbox = Sandbox::new();
    let reconciler = DirectoryReconciler::new(ProviderContext::system());
    let spec = DirectorySpec::new(sandbox.entity("data"));

    let created = reconciler.create(&spec).unwrap();
    let mut first = created.clone();
    reconciler.read(&mut first).unwrap();
    let mut second = first.clone();
    reconciler.read(&mut second).unwrap();
    assert_eq!(first, created);
    assert_eq!(second, first);

    let spec = spec.with_mode("0711").unwrap();
    let mut updated = second.clone();
    reconciler
        .update(&spec, &ChangeSet::new().with(Field::Mode), &mut updated)
        .unwrap();
    assert_eq!(sandbox.permissions("data"), 0o711);

    reconciler.delete(&spec.path).unwrap();
    reconciler.read(&mut updated).unwrap();
    assert!(!updated.exists());
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn scenario_file_content_fingerprint_and_mode() {
    let sandbox = Sandbox::new();
    let reconciler = FileReconciler::new(ProviderContext::system());
    let spec = FileSpec::new(sandbox.entity("testfile"))
        .with_mode("0600")
        .unwrap()
        .with_content("blah");

    let mut state = reconciler.create(&spec).unwrap();
    reconciler.read(&mut state).unwrap();

    assert_eq!(state.content, fingerprint_str("blah"));
    assert_eq!(state.mode, "0600");
    let (user, group) = current_owner();
    assert_eq!((state.user.as_str(), state.group.as_str()), (user.as_str(), group.as_str()));
}

#[test]
fn scenario_content_update_replaces_payload() {
    let sandbox = Sandbox::new();
    let reconciler = FileReconciler::new(ProviderContext::system());
    let spec = FileSpec::new(sandbox.entity("testfile"))
        .with_mode("0600")
        .unwrap()
        .with_content("blah");
    let mut state = reconciler.create(&spec).unwrap();

    let spec = spec.with_content("yay");
    reconciler
        .update(&spec, &ChangeSet::new().with(Field::Content), &mut state)
        .unwrap();
    reconciler.read(&mut state).unwrap();

    assert_eq!(state.content, fingerprint_str("yay"));
    let on_disk = fs::read(sandbox.path("testfile")).unwrap();
    assert_eq!(on_disk.len(), "yay".len());
    assert_eq!(on_disk, b"yay");
}

#[test]
fn empty_change_set_is_a_no_op() {
    let sandbox = Sandbox::new();
    let reconciler = FileReconciler::new(ProviderContext::system());
    let spec = FileSpec::new(sandbox.entity("testfile")).with_content("blah");
    let mut state = reconciler.create(&spec).unwrap();
    sandbox.chmod("testfile", 0o600);
    let before = state.clone();

    let desired = spec.with_mode("0644").unwrap().with_content("other");
    reconciler
        .update(&desired, &ChangeSet::new(), &mut state)
        .unwrap();

    assert_eq!(state, before);
    assert_eq!(sandbox.permissions("testfile"), 0o600);
    assert_eq!(sandbox.read("testfile"), "blah");
}
