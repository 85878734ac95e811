//! Mount operations module.
//!
//! This module answers "is this path mounted" from the kernel mount table and
//! wraps the lifecycle side effects: mount point directories, launching the
//! rclone daemon, and unmounting.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use procfs::process::Process;

use snafu::OptionExt;

use crate::error::{EmptyCommandSnafu, IoResultExt, Result};
use crate::executor::{self, CommandRunner};
use crate::settings::Settings;

/// Live view of the OS mount table.
pub trait MountTable {
    /// Returns true if `path` is currently a mount point.
    fn is_mount_point(&self, path: &Path) -> bool;
}

/// Mount table read from `/proc/self/mountinfo` on every query.
#[derive(Debug, Clone, Copy, Default)]
pub struct MountInfoTable;

impl MountTable for MountInfoTable {
    fn is_mount_point(&self, path: &Path) -> bool {
        let resolved = resolve_parent(path);
        let mounts = Process::myself().and_then(|me| me.mountinfo());
        match mounts {
            Ok(mounts) => mounts
                .0
                .iter()
                .any(|m| m.mount_point == path || m.mount_point == resolved),
            Err(e) => {
                tracing::warn!("Failed to read mount table: {}", e);
                false
            }
        }
    }
}

/// Resolves symlinks in the parent of `path`, as the kernel reports mount
/// points by their real path.
///
/// The last component itself is not resolved: stat'ing a dead FUSE mount
/// fails with `ENOTCONN`, and it must still read as mounted.
fn resolve_parent(path: &Path) -> PathBuf {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return path.to_path_buf();
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match fs::canonicalize(parent) {
        Ok(parent) => parent.join(name),
        Err(_) => path.to_path_buf(),
    }
}

/// Creates a mount point directory if it doesn't exist.
pub fn create_mount_point(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).mount_point_context(path)?;
    }
    Ok(())
}

/// Removes an empty mount point directory.
///
/// A directory that is already gone counts as removed.
pub fn remove_mount_point(path: &Path) -> Result<()> {
    match fs::remove_dir(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        other => other.mount_point_removal_context(path),
    }
}

/// Starts an rclone daemon for a prepared argument vector, program first.
///
/// Blocks until rclone has detached into the background.
pub fn mount_remote(runner: &dyn CommandRunner, args: &[String], path: &Path) -> Result<()> {
    let (program, rest) = args.split_first().context(EmptyCommandSnafu { label: "rclone" })?;

    create_mount_point(path)?;
    executor::run_helper(runner, "rclone", program, rest)?;
    Ok(())
}

/// Unmounts `path` and removes the emptied directory.
///
/// Removal is attempted even when the unmount utility fails, so a stale
/// directory left behind by an exited daemon is cleaned up too. The first
/// error is returned after both steps ran.
pub fn unmount_remote(
    runner: &dyn CommandRunner,
    settings: &Settings,
    path: &Path,
    force: bool,
) -> Result<()> {
    let mut args = if force {
        settings.force_unmount_args.clone()
    } else {
        settings.unmount_args.clone()
    };
    args.push(path.to_string_lossy().to_string());

    let label = if force { "force unmount" } else { "unmount" };
    let unmounted = executor::run_helper(runner, label, &settings.unmount_program, &args);
    let removed = remove_mount_point(path);

    unmounted?;
    removed
}
