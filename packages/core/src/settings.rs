//! Per-invocation settings.
//!
//! Defaults are derived from the user's home directory. An optional JSON file
//! (`~/.config/mounter/settings.json`) overrides individual fields, and the
//! CLI can override a few more on top.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use snafu::ResultExt;

use crate::error::{Error, IoResultExt, Result, SettingsParseSnafu};

/// Name of the mounter's own log file inside the log folder.
pub const MOUNTER_LOG_FILE: &str = "Mounter.log";

/// Directory under the config dir holding the settings file.
pub const SETTINGS_DIR: &str = "mounter";

/// Settings file name.
pub const SETTINGS_FILE: &str = "settings.json";

/// Everything an invocation needs to know about the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory under which every remote gets its mount point.
    pub mount_root: PathBuf,
    /// rclone configuration file listing the remotes.
    pub rclone_config: PathBuf,
    /// rclone executable. Its file name identifies running daemons.
    pub rclone_binary: PathBuf,
    /// Directory for the mounter log and the per-remote rclone logs.
    pub log_folder: PathBuf,
    /// Default log filter when `RUST_LOG` is not set.
    pub log_level: String,
    /// Extra rclone flags appended last, e.g. `-v` or `-vv`.
    pub rclone_logging_flags: Vec<String>,
    /// Program used to unmount a mount point.
    pub unmount_program: String,
    /// Arguments placed before the mount point for a regular unmount.
    pub unmount_args: Vec<String>,
    /// Arguments placed before the mount point for a forced unmount.
    pub force_unmount_args: Vec<String>,
    /// Desktop launcher used to show folders and logs.
    pub opener: String,
}

/// Partial settings as read from the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverrides {
    pub mount_root: Option<PathBuf>,
    pub rclone_config: Option<PathBuf>,
    pub rclone_binary: Option<PathBuf>,
    pub log_folder: Option<PathBuf>,
    pub log_level: Option<String>,
    pub rclone_logging_flags: Option<Vec<String>>,
    pub unmount_program: Option<String>,
    pub unmount_args: Option<Vec<String>>,
    pub force_unmount_args: Option<Vec<String>>,
    pub opener: Option<String>,
}

impl Settings {
    /// Builds the default settings for a user whose home is `home`.
    pub fn for_home(home: &Path) -> Self {
        Self {
            mount_root: home.to_path_buf(),
            rclone_config: home.join(".config").join("rclone").join("rclone.conf"),
            rclone_binary: PathBuf::from("rclone"),
            log_folder: home.join(".local").join("state").join(SETTINGS_DIR),
            log_level: "info".to_string(),
            rclone_logging_flags: Vec::new(),
            unmount_program: "fusermount".to_string(),
            unmount_args: vec!["-u".to_string()],
            force_unmount_args: vec!["-u".to_string(), "-z".to_string()],
            opener: "xdg-open".to_string(),
        }
    }

    /// Default settings for the current user, honoring `$XDG_STATE_HOME`.
    pub fn from_environment() -> Result<Self> {
        let home = dirs::home_dir().ok_or(Error::HomeDirNotFound)?;
        let mut settings = Self::for_home(&home);
        if let Some(state_dir) = dirs::state_dir() {
            settings.log_folder = state_dir.join(SETTINGS_DIR);
        }
        Ok(settings)
    }

    /// Location of the settings file, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    /// Applies the settings file at `path`. A missing file changes nothing.
    pub fn with_file(mut self, path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(self),
            Err(e) => return Err(e).settings_read_context(path),
        };

        let overrides: SettingsOverrides =
            serde_json::from_str(&content).context(SettingsParseSnafu { path })?;
        self.apply(overrides);
        Ok(self)
    }

    /// Replaces every field that `overrides` sets.
    pub fn apply(&mut self, overrides: SettingsOverrides) {
        let SettingsOverrides {
            mount_root,
            rclone_config,
            rclone_binary,
            log_folder,
            log_level,
            rclone_logging_flags,
            unmount_program,
            unmount_args,
            force_unmount_args,
            opener,
        } = overrides;

        if let Some(v) = mount_root {
            self.mount_root = v;
        }
        if let Some(v) = rclone_config {
            self.rclone_config = v;
        }
        if let Some(v) = rclone_binary {
            self.rclone_binary = v;
        }
        if let Some(v) = log_folder {
            self.log_folder = v;
        }
        if let Some(v) = log_level {
            self.log_level = v;
        }
        if let Some(v) = rclone_logging_flags {
            self.rclone_logging_flags = v;
        }
        if let Some(v) = unmount_program {
            self.unmount_program = v;
        }
        if let Some(v) = unmount_args {
            self.unmount_args = v;
        }
        if let Some(v) = force_unmount_args {
            self.force_unmount_args = v;
        }
        if let Some(v) = opener {
            self.opener = v;
        }
    }

    /// Executable name rclone daemons show up under in the process table.
    pub fn daemon_name(&self) -> String {
        self.rclone_binary
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.rclone_binary.to_string_lossy().to_string())
    }

    /// Path of the mounter's own log file.
    pub fn mounter_log_path(&self) -> PathBuf {
        self.log_folder.join(MOUNTER_LOG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_for_home() {
        let settings = Settings::for_home(Path::new("/home/deck"));
        assert_eq!(settings.mount_root, PathBuf::from("/home/deck"));
        assert_eq!(
            settings.rclone_config,
            PathBuf::from("/home/deck/.config/rclone/rclone.conf")
        );
        assert_eq!(
            settings.mounter_log_path(),
            PathBuf::from("/home/deck/.local/state/mounter/Mounter.log")
        );
        assert_eq!(settings.daemon_name(), "rclone");
    }

    #[test]
    fn test_daemon_name_from_absolute_binary() {
        let mut settings = Settings::for_home(Path::new("/home/deck"));
        settings.rclone_binary = PathBuf::from("/usr/local/bin/rclone");
        assert_eq!(settings.daemon_name(), "rclone");
    }

    #[test]
    fn test_with_file_overrides_fields() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(br#"{"mount_root": "/mnt/clouds", "rclone_logging_flags": ["-vv"]}"#)
            .unwrap();

        let settings = Settings::for_home(Path::new("/home/deck"))
            .with_file(temp_file.path())
            .unwrap();
        assert_eq!(settings.mount_root, PathBuf::from("/mnt/clouds"));
        assert_eq!(settings.rclone_logging_flags, vec!["-vv"]);
        // Untouched fields keep their defaults
        assert_eq!(settings.opener, "xdg-open");
    }

    #[test]
    fn test_with_missing_file_keeps_defaults() {
        let defaults = Settings::for_home(Path::new("/home/deck"));
        let settings = defaults
            .clone()
            .with_file(Path::new("/nonexistent/settings.json"))
            .unwrap();
        assert_eq!(settings, defaults);
    }

    #[test]
    fn test_with_malformed_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(br#"{"mount_rot": "/x"}"#).unwrap();

        let err = Settings::for_home(Path::new("/home/deck"))
            .with_file(temp_file.path())
            .unwrap_err();
        assert!(matches!(err, Error::SettingsParse { .. }));
    }
}
