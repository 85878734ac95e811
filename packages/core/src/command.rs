//! Rclone mount command construction.
//!
//! The option profiles are plain data. Every mount gets the common profile;
//! remotes whose name ends in `-exclusive` additionally get the exclusive
//! profile, which assumes nothing but this mount ever changes the remote.

use std::path::Path;

use crate::naming;
use crate::registry::{self, RemoteAttributes};
use crate::settings::Settings;

/// Options applied to every mount.
pub const COMMON_OPTIONS: &[&str] = &[
    // Avoid I/O errors on files Google flags as abusive
    "--drive-acknowledge-abuse",
    "--vfs-cache-mode",
    "full",
    "--vfs-cache-max-size",
    "1024G",
    "--vfs-cache-max-age",
    "1000h",
    // Only needed to evict once the size cap is exceeded
    "--vfs-cache-poll-interval",
    "5m",
    // How long the kernel waits before giving up on the daemon
    "--daemon-timeout",
    "599s",
    "--daemon",
    "--stats-one-line",
    "--stats-log-level",
    "NOTICE",
    "--stats",
    "1m",
];

/// Options for remotes that are only ever modified through this mount.
pub const EXCLUSIVE_OPTIONS: &[&str] = &[
    "--attr-timeout",
    "60s",
    // Directory caches are refreshed on demand with SIGHUP
    "--dir-cache-time",
    "1000h",
    "--poll-interval",
    "0",
];

/// Options for remotes that may also change behind the mount's back.
pub const DEFAULT_OPTIONS: &[&str] = &[];

/// Option profile selected by the remote name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountProfile {
    Default,
    Exclusive,
}

impl MountProfile {
    pub fn for_remote(name: &str) -> Self {
        if naming::is_exclusive(name) {
            Self::Exclusive
        } else {
            Self::Default
        }
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            Self::Default => DEFAULT_OPTIONS,
            Self::Exclusive => EXCLUSIVE_OPTIONS,
        }
    }
}

/// Builds the full rclone argument vector, program first.
pub fn build_mount_args(
    settings: &Settings,
    name: &str,
    path: &Path,
    attributes: &RemoteAttributes,
) -> Vec<String> {
    let mut args = vec![
        settings.rclone_binary.to_string_lossy().to_string(),
        "--config".to_string(),
        settings.rclone_config.to_string_lossy().to_string(),
        "mount".to_string(),
        registry::remote_path_of(name, attributes),
        path.to_string_lossy().to_string(),
        "--volname".to_string(),
        naming::make_title(name),
        "--log-file".to_string(),
        naming::make_log_path(name, &settings.log_folder)
            .to_string_lossy()
            .to_string(),
    ];

    args.extend(COMMON_OPTIONS.iter().map(|s| s.to_string()));
    args.extend(
        MountProfile::for_remote(name)
            .options()
            .iter()
            .map(|s| s.to_string()),
    );
    // Last, so they can override the verbosity set above
    args.extend(settings.rclone_logging_flags.iter().cloned());

    args
}
