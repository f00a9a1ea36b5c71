//! Stable link publishing.
//!
//! After an asset is verified, a fixed-name symlink is (re)pointed at the
//! versioned artifact. Remove-then-symlink is not atomic for concurrent
//! readers; the assets directory is owned by one process for the run.

use crate::error::ProvisionError;
use std::fs;
use std::io;
use std::path::Path;

/// Point `link` at `source`, replacing whatever was there before.
pub fn publish_link(source: &Path, link: &Path) -> Result<(), ProvisionError> {
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(ProvisionError::fs("remove stale link", link, e)),
    }
    symlink(source, link).map_err(|e| ProvisionError::fs("create link", link, e))
}

#[cfg(unix)]
fn symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, link)
}
