//! Unified error types for the rclone-mounter-core library.
//!
//! Uses SNAFU for context-rich error handling, especially useful when the same
//! underlying error type (like `std::io::Error`) appears in different contexts.

use snafu::{ResultExt, Snafu};
use std::path::PathBuf;

/// Result type alias using the library's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for all core library operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Failed to execute a system command.
    #[snafu(display("failed to execute command '{command}'"))]
    CommandExecution {
        command: String,
        source: std::io::Error,
    },

    /// A command line with no program in it.
    #[snafu(display("no program given for {label}"))]
    EmptyCommand { label: String },

    /// Command executed but returned non-zero exit code.
    #[snafu(display("command '{command}' exited with code {code}: {stderr}"))]
    CommandExit {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The rclone configuration could not be read.
    #[snafu(display("failed to read rclone config at {}", path.display()))]
    ConfigNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The rclone configuration is not valid INI.
    #[snafu(display("failed to parse rclone config, line {line}: {message}"))]
    ConfigParse { line: usize, message: String },

    /// No remote with this name exists in the registry.
    #[snafu(display("remote '{name}' not found in rclone config"))]
    RemoteNotFound { name: String },

    /// Two names would be confused by the substring-based action router.
    #[snafu(display("ambiguous names: '{first}' collides with '{second}'"))]
    AmbiguousName { first: String, second: String },

    /// The process table itself could not be enumerated.
    #[snafu(display("failed to enumerate processes: {message}"))]
    ProcessTable { message: String },

    /// Process exited between enumeration and inspection.
    #[snafu(display("process {pid} vanished"))]
    ProcessVanished { pid: i32 },

    /// Process is a zombie and its command line cannot be read.
    #[snafu(display("process {pid} is a zombie"))]
    ZombieProcess { pid: i32 },

    /// Any other failure while inspecting a single process.
    #[snafu(display("failed to inspect process {pid}: {message}"))]
    ProcessIntrospection { pid: i32, message: String },

    /// Mount point creation failed.
    #[snafu(display("failed to create mount point at {}", path.display()))]
    MountPointCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Mount point removal failed.
    #[snafu(display("failed to remove mount point at {}", path.display()))]
    MountPointRemoval {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Signal delivery failed for a reason other than the process being gone.
    #[snafu(display("failed to signal process {pid}"))]
    Signal { pid: i32, source: nix::Error },

    /// Home directory not found.
    #[snafu(display("Could not determine home directory"))]
    HomeDirNotFound,

    /// Settings file exists but cannot be read.
    #[snafu(display("failed to read settings at {}", path.display()))]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Settings file is not valid JSON for [`crate::settings::Settings`].
    #[snafu(display("failed to parse settings at {}", path.display()))]
    SettingsParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Extension trait for adding context to io::Error results.
pub trait IoResultExt<T> {
    /// Add context for command execution errors.
    fn command_context(self, command: impl Into<String>) -> Result<T>;

    /// Add context for rclone config read errors.
    fn config_read_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Add context for settings read errors.
    fn settings_read_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Add context for mount point creation errors.
    fn mount_point_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Add context for mount point removal errors.
    fn mount_point_removal_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn command_context(self, command: impl Into<String>) -> Result<T> {
        self.context(CommandExecutionSnafu {
            command: command.into(),
        })
    }

    fn config_read_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.context(ConfigNotFoundSnafu { path: path.into() })
    }

    fn settings_read_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.context(SettingsReadSnafu { path: path.into() })
    }

    fn mount_point_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.context(MountPointCreationSnafu { path: path.into() })
    }

    fn mount_point_removal_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.context(MountPointRemovalSnafu { path: path.into() })
    }
}
