// tests/filesystem.rs

use std::error::Error;
use std::path::Path;

use relayvisor::fs::{FileSystem, RealFileSystem};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn remove_file_clears_read_only_flag() -> TestResult {
    let dir = TempDir::new()?;
    let key = dir.path().join("private_key");
    std::fs::write(&key, "secret\n")?;

    let mut perms = std::fs::metadata(&key)?.permissions();
    perms.set_readonly(true);
    std::fs::set_permissions(&key, perms)?;

    RealFileSystem.remove_file(&key)?;
    assert!(!key.exists());
    Ok(())
}

#[test]
fn remove_missing_file_reports_the_path() {
    let err = RealFileSystem
        .remove_file(Path::new("/definitely/not/here/hostname"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("hostname"));
}

#[test]
fn write_creates_parent_directories() -> TestResult {
    let dir = TempDir::new()?;
    let out = dir.path().join("Data").join("nested").join("rotrc_0");

    RealFileSystem.write(&out, b"SocksPort 0\n")?;

    assert!(RealFileSystem.is_file(&out));
    assert!(RealFileSystem.is_dir(out.parent().unwrap()));
    assert_eq!(RealFileSystem.read_to_string(&out)?, "SocksPort 0\n");
    Ok(())
}
