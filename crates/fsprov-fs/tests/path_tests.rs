use fsprov_fs::{EntityPath, Error};
use rstest::rstest;

#[rstest]
#[case("/tmp/testfile", "/tmp/testfile")]
#[case("/tmp/test/testdir/", "/tmp/test/testdir")]
#[case("//tmp///test", "/tmp/test")]
#[case("/tmp/./test/.", "/tmp/test")]
#[case("/tmp/a/../test", "/tmp/test")]
#[case("/../../etc", "/etc")]
#[case("/", "/")]
fn test_entity_path_normalization(#[case] input: &str, #[case] expected: &str) {
    let path = EntityPath::new(input).unwrap();
    assert_eq!(path.as_str(), expected);
}

#[rstest]
#[case("tmp/testfile")]
#[case("./testfile")]
#[case("../etc/passwd")]
#[case("")]
fn test_relative_paths_are_rejected(#[case] input: &str) {
    let err = EntityPath::new(input).unwrap_err();
    assert!(matches!(err, Error::RelativePath { .. }), "got {err:?}");
}

#[test]
fn test_equal_after_normalization() {
    let a = EntityPath::new("/tmp//test/").unwrap();
    let b = EntityPath::new("/tmp/test").unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "/tmp/test");
}

#[test]
fn test_non_utf8_path_is_rejected() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let raw = OsStr::from_bytes(b"/tmp/dir\xFF");
    let err = EntityPath::new(raw).unwrap_err();

    assert!(matches!(err, Error::NonUtf8Path { .. }), "got {err:?}");
    assert!(err.to_string().starts_with("path is not valid UTF-8: /tmp/dir"));
}
