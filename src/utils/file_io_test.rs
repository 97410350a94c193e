use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use crate::utils::file_io::atomic_replace;
use crate::utils::file_io::ensure_private_dir;

#[test]
fn test_ensure_private_dir_creates_with_owner_only_mode() {
    let base = tempfile::tempdir().unwrap();
    let dir = base.path().join("nested/.ssh");

    ensure_private_dir(&dir).unwrap();

    let mode = fs::metadata(&dir).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o700);
}

#[test]
fn test_atomic_replace_writes_content_and_mode() {
    let base = tempfile::tempdir().unwrap();
    let path = base.path().join("authorized_keys");

    atomic_replace(&path, b"ssh-ed25519 AAAA key", 0o600).unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"ssh-ed25519 AAAA key");
    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_atomic_replace_overwrites_previous_content() {
    let base = tempfile::tempdir().unwrap();
    let path = base.path().join("authorized_keys");

    atomic_replace(&path, b"old", 0o600).unwrap();
    atomic_replace(&path, b"new", 0o600).unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"new");
}

#[test]
fn test_interrupted_write_leaves_previous_file_intact() {
    let base = tempfile::tempdir().unwrap();
    let path = base.path().join("authorized_keys");
    atomic_replace(&path, b"previous keys", 0o600).unwrap();

    // A write that dies before the rename: the temp file is written but
    // never persisted, which is every error path of atomic_replace
    {
        let mut tmp = tempfile::NamedTempFile::new_in(base.path()).unwrap();
        tmp.write_all(b"half-writ").unwrap();
        // dropped here without persist()
    }

    assert_eq!(fs::read(&path).unwrap(), b"previous keys");
    // and no stray temp file shadows the target
    let visible: Vec<_> = fs::read_dir(base.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(visible, vec![std::ffi::OsString::from("authorized_keys")]);
}
