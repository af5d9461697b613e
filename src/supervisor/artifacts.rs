// src/supervisor/artifacts.rs

//! Removal of generated hidden-service identity files.
//!
//! The relay regenerates `hostname` and `private_key` in each hidden-service
//! directory and fails to start when a leftover copy cannot be rewritten.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::fs::FileSystem;

pub const HOSTNAME_FILE: &str = "hostname";
pub const PRIVATE_KEY_FILE: &str = "private_key";

/// For every directory that has a `hostname` file, delete `hostname` and
/// `private_key`. Returns the number of files removed. Failures are logged
/// and skipped.
pub fn cleanup_stale_keys(fs: &dyn FileSystem, dirs: &[PathBuf]) -> usize {
    let mut removed = 0;

    for dir in dirs {
        let hostname = dir.join(HOSTNAME_FILE);
        if !fs.exists(&hostname) {
            debug!(dir = ?dir, "no generated identity to clean up");
            continue;
        }

        for path in [hostname, dir.join(PRIVATE_KEY_FILE)] {
            if !fs.exists(&path) {
                continue;
            }
            match fs.remove_file(&path) {
                Ok(()) => {
                    info!(file = ?path, "removed stale identity file");
                    removed += 1;
                }
                Err(e) => {
                    warn!(file = ?path, error = %format!("{e:#}"), "could not remove stale identity file");
                }
            }
        }
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn removes_key_pairs_only_where_hostname_exists() {
        let fs = MockFileSystem::new();
        fs.add_file("/bundle/Data/hs0/hostname", "abc.onion");
        fs.add_file("/bundle/Data/hs0/private_key", "KEY");
        fs.add_file("/bundle/Data/hs1/private_key", "KEY");

        let dirs = vec![
            PathBuf::from("/bundle/Data/hs0"),
            PathBuf::from("/bundle/Data/hs1"),
            PathBuf::from("/bundle/Data/hs2"),
        ];

        assert_eq!(cleanup_stale_keys(&fs, &dirs), 2);
        assert!(!fs.exists(&PathBuf::from("/bundle/Data/hs0/hostname")));
        assert!(!fs.exists(&PathBuf::from("/bundle/Data/hs0/private_key")));
        // hs1 had no hostname, so its key stays.
        assert!(fs.exists(&PathBuf::from("/bundle/Data/hs1/private_key")));
    }
}
