//! rclone-mounter-core: Core library for menu driven rclone mounts.
//!
//! This library reads the remotes of an rclone config, works out which of
//! them are mounted, and mounts, unmounts or refreshes them on request.
//! Nothing is persisted between invocations; state is reconciled from the
//! kernel mount table and the running rclone daemons every time.
//!
//! # Modules
//!
//! - [`naming`]: Remote name to title, mount path and log path
//! - [`registry`]: Rclone config parsing and remote visibility
//! - [`process`]: Scanning `/proc` for rclone daemons
//! - [`state`]: Mount state reconciliation and cache flushing
//! - [`command`]: Rclone mount argument construction
//! - [`mount`]: Mount point handling, mounting and unmounting
//! - [`action`]: Menu captions and action routing
//! - [`mounter`]: Per-invocation context, menu and dispatch
//! - [`settings`]: Paths and helper programs
//! - [`executor`]: External command execution
//! - [`error`]: Error types
//!
//! # Example
//!
//! ```no_run
//! use rclone_mounter_core::{Mounter, Settings};
//!
//! let settings = Settings::from_environment().unwrap();
//! let mounter = Mounter::from_system(settings);
//!
//! for line in mounter.menu() {
//!     println!("{}", line);
//! }
//! mounter.perform("🎣 Mount Team Drive");
//! ```

pub mod action;
pub mod command;
pub mod error;
pub mod executor;
pub mod mount;
pub mod mounter;
pub mod naming;
pub mod process;
pub mod registry;
pub mod settings;
pub mod state;

// Re-export commonly used types
pub use action::{GlobalCommand, RemoteCommand, Route};
pub use error::{Error, Result};
pub use mounter::{HostServices, Mounter, RemoteStatus};
pub use registry::Registry;
pub use settings::{Settings, SettingsOverrides};
pub use state::RemoteState;
