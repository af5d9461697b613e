//! On-disk fixtures: a relay bundle layout and shell scripts standing in
//! for the relay executable.

use std::fs;
use std::path::{Path, PathBuf};

/// Template used by the bundle fixture; contains both default placeholders.
pub const TEMPLATE_TEXT: &str = "SocksPort 0\n\
HiddenServiceDir Data/hs0\n\
HiddenServicePort 80 127.0.0.1:80\n\
HiddenServicePort 443 127.0.0.1:443\n";

/// Create `Data/rotrc_IN_<index>` and `Data/rotrc-defaults` under `base`.
pub fn write_bundle(base: &Path, index: usize) -> PathBuf {
    let data = base.join("Data");
    fs::create_dir_all(&data).expect("create Data dir");
    let template = data.join(format!("rotrc_IN_{index}"));
    fs::write(&template, TEMPLATE_TEXT).expect("write template");
    fs::write(data.join("rotrc-defaults"), "Log notice stdout\n").expect("write defaults");
    template
}

/// Write an executable `/bin/sh` script at `base/<name>` with `body`.
#[cfg(unix)]
pub fn write_stub_relay(base: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = base.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub relay");
    let mut perms = fs::metadata(&path).expect("stat stub relay").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub relay");
    path
}
