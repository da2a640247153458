//! Tests for the directory reconciler

use std::sync::Arc;

use fsprov_core::{
    ChangeSet, DirectoryReconciler, DirectorySpec, EntityId, Error, Field, ProviderContext,
};
use fsprov_fs::{EntityKind, Error as FsError, Mode};
use fsprov_test_utils::{Sandbox, StaticIdentity, TEST_GROUP, TEST_USER};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn context() -> ProviderContext {
    let identity = Arc::new(StaticIdentity::new().with_group_alias("wheel"));
    ProviderContext::new(identity.clone(), identity)
}

fn reconciler() -> DirectoryReconciler {
    DirectoryReconciler::new(context())
}

#[test]
fn test_create_without_parents_surfaces_os_error() {
    // Scenario: the ancestor is missing and create_parents is off
    let sandbox = Sandbox::new();
    let spec = DirectorySpec::new(sandbox.entity("test/testdir"))
        .with_mode("0700")
        .unwrap();

    let err = reconciler().create(&spec).unwrap_err();

    assert!(err.is_not_found(), "expected ENOENT, got {err}");
    assert!(err.to_string().starts_with("mkdir "), "got {err}");
    sandbox.assert_missing("test");
}

#[test]
fn test_create_with_parents_builds_ancestors() {
    let sandbox = Sandbox::new();
    let spec = DirectorySpec::new(sandbox.entity("test/testdir"))
        .with_mode("0700")
        .unwrap()
        .with_create_parents(true);

    let state = reconciler().create(&spec).unwrap();

    sandbox.assert_exists("test/testdir");
    assert_eq!(sandbox.permissions("test/testdir"), 0o700);
    assert_eq!(state.mode, "020000000700");
    assert_eq!(state.user, TEST_USER);
    assert_eq!(state.group, TEST_GROUP);
    assert!(state.create_parents);
    assert_eq!(state.id, EntityId::for_path(&spec.path));
}

#[rstest]
#[case("0700", "020000000700")]
#[case("0755", "020000000755")]
#[case("0750", "020000000750")]
#[case("020000000711", "020000000711")]
fn test_create_records_tagged_mode(#[case] input: &str, #[case] canonical: &str) {
    let sandbox = Sandbox::new();
    let spec = DirectorySpec::new(sandbox.entity("d"))
        .with_mode(input)
        .unwrap();

    let state = reconciler().create(&spec).unwrap();

    assert_eq!(state.mode, canonical);
}

#[test]
fn test_create_then_read_round_trips() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"))
        .with_user(TEST_USER)
        .with_group(TEST_GROUP);

    let created = reconciler.create(&spec).unwrap();
    let mut read = created.clone();
    reconciler.read(&mut read).unwrap();

    assert_eq!(read, created);
}

#[test]
fn test_read_is_idempotent() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut first = reconciler.create(&spec).unwrap();

    reconciler.read(&mut first).unwrap();
    let mut second = first.clone();
    reconciler.read(&mut second).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_read_reports_external_mode_change() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let mut state = reconciler
        .create(&DirectorySpec::new(sandbox.entity("data")))
        .unwrap();

    sandbox.chmod("data", 0o711);
    reconciler.read(&mut state).unwrap();

    assert_eq!(state.mode, "020000000711");
    assert!(state.exists());
}

#[test]
fn test_read_of_missing_directory_clears_id() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let mut state = reconciler
        .create(&DirectorySpec::new(sandbox.entity("gone")))
        .unwrap();
    std::fs::remove_dir(sandbox.path("gone")).unwrap();

    reconciler.read(&mut state).unwrap();

    assert!(!state.exists());
}

#[test]
fn test_read_of_regular_file_is_kind_mismatch() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let mut state = reconciler
        .create(&DirectorySpec::new(sandbox.entity("swap")))
        .unwrap();
    std::fs::remove_dir(sandbox.path("swap")).unwrap();
    sandbox.write("swap", "now a file");

    let err = reconciler.read(&mut state).unwrap_err();

    assert!(
        matches!(err, Error::Fs(FsError::KindMismatch { expected: EntityKind::Directory, .. })),
        "got {err}"
    );
    assert!(state.exists());
}

#[test]
fn test_update_with_no_changes_touches_nothing() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut state = reconciler.create(&spec).unwrap();
    sandbox.chmod("data", 0o700);
    let before = state.clone();

    reconciler
        .update(&spec, &ChangeSet::new(), &mut state)
        .unwrap();

    assert_eq!(sandbox.permissions("data"), 0o700);
    assert_eq!(state, before);
}

#[test]
fn test_update_mode_only() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut state = reconciler.create(&spec).unwrap();

    let spec = spec.with_mode("0700").unwrap();
    reconciler
        .update(&spec, &ChangeSet::new().with(Field::Mode), &mut state)
        .unwrap();

    assert_eq!(sandbox.permissions("data"), 0o700);
    assert_eq!(state.mode, "020000000700");
}

#[test]
fn test_update_setgid_mode_with_group_matches_read_back() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("shared"));
    let mut state = reconciler.create(&spec).unwrap();

    let spec = spec.with_mode("02775").unwrap().with_group(TEST_GROUP);
    let changes = ChangeSet::new().with(Field::Mode).with(Field::Group);
    reconciler.update(&spec, &changes, &mut state).unwrap();

    let mut read = state.clone();
    reconciler.read(&mut read).unwrap();
    assert_eq!(state, read);
    assert_eq!(sandbox.permissions("shared"), 0o2775);
}

#[test]
fn test_update_group_re_resolves_owner() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut state = reconciler.create(&spec).unwrap();

    let spec = spec.with_group("wheel");
    reconciler
        .update(&spec, &ChangeSet::new().with(Field::Group), &mut state)
        .unwrap();

    assert_eq!(state.user, TEST_USER);
    assert_eq!(state.group, "wheel");
}

#[test]
fn test_update_unknown_group_aborts_before_mode_change() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut state = reconciler.create(&spec).unwrap();
    let before = state.clone();

    let spec = spec.with_mode("0700").unwrap().with_group("nosuchgroup");
    let changes = ChangeSet::new().with(Field::Mode).with(Field::Group);
    let err = reconciler.update(&spec, &changes, &mut state).unwrap_err();

    assert!(matches!(err, Error::Fs(FsError::UnknownGroup { .. })), "got {err}");
    assert_eq!(sandbox.permissions("data"), 0o755);
    assert_eq!(state, before);
}

#[rstest]
#[case(Field::Path)]
#[case(Field::CreateParents)]
fn test_update_rejects_immutable_fields(#[case] field: Field) {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut state = reconciler.create(&spec).unwrap();

    let spec = spec.with_mode("0700").unwrap();
    let changes = ChangeSet::new().with(Field::Mode).with(field);
    let err = reconciler.update(&spec, &changes, &mut state).unwrap_err();

    assert!(
        matches!(err, Error::ImmutableField { kind: EntityKind::Directory, field: f } if f == field),
        "got {err}"
    );
    assert_eq!(sandbox.permissions("data"), 0o755);
}

#[test]
fn test_create_unknown_user_creates_nothing() {
    let sandbox = Sandbox::new();
    let spec = DirectorySpec::new(sandbox.entity("data")).with_user("nosuchuser");

    let err = reconciler().create(&spec).unwrap_err();

    assert!(matches!(err, Error::Fs(FsError::UnknownUser { .. })), "got {err}");
    sandbox.assert_missing("data");
}

#[test]
fn test_create_rejects_file_mode() {
    let sandbox = Sandbox::new();
    let mut spec = DirectorySpec::new(sandbox.entity("data"));
    spec.mode = Mode::parse("0644", EntityKind::File).unwrap();

    let err = reconciler().create(&spec).unwrap_err();

    assert!(matches!(err, Error::Fs(FsError::InvalidMode { .. })), "got {err}");
    sandbox.assert_missing("data");
}

#[test]
fn test_delete_then_read_reports_absence() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    let mut state = reconciler.create(&spec).unwrap();

    reconciler.delete(&spec.path).unwrap();
    reconciler.read(&mut state).unwrap();

    sandbox.assert_missing("data");
    assert!(!state.exists());
}

#[test]
fn test_delete_non_empty_directory_fails() {
    let sandbox = Sandbox::new();
    let reconciler = reconciler();
    let spec = DirectorySpec::new(sandbox.entity("data"));
    reconciler.create(&spec).unwrap();
    sandbox.write("data/keep", "x");

    let err = reconciler.delete(&spec.path).unwrap_err();

    assert!(err.to_string().starts_with("remove "), "got {err}");
    sandbox.assert_exists("data/keep");
}
