//! Checks the sample manifests under `test-fixtures/manifests`

use std::path::{Path, PathBuf};

use fsprov_core::{Address, Declaration, Manifest};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/manifests")
        .join(name)
}

#[rstest]
#[case("basic.toml")]
#[case("basic.json")]
#[case("basic.yaml")]
fn basic_manifest_is_format_independent(#[case] name: &str) {
    let manifest = Manifest::load(&fixture(name)).unwrap();
    let declarations = manifest.declarations(None).unwrap();

    let addresses: Vec<Address> = declarations.iter().map(Declaration::address).collect();
    assert_eq!(
        addresses,
        vec![Address::directory("testdir"), Address::file("testfile")]
    );
    match &declarations[1] {
        Declaration::File { spec, .. } => {
            assert_eq!(spec.path.as_str(), "/tmp/testfile");
            assert_eq!(spec.mode.canonical(), "0600");
            assert_eq!(spec.content, b"blah");
        }
        other => panic!("unexpected declaration {other:?}"),
    }
}

#[test]
fn relative_manifest_resolves_against_its_directory() {
    let path = fixture("relative.toml");
    let base = Manifest::base_dir(&path).unwrap();
    let manifest = Manifest::load(&path).unwrap();

    let declarations = manifest.declarations(Some(&base)).unwrap();

    assert!(manifest.provider.debug);
    for declaration in &declarations {
        assert!(
            declaration.path().as_path().starts_with(&base),
            "{} is outside {}",
            declaration.path(),
            base.display()
        );
    }
}
