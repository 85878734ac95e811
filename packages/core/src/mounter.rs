//! Per-invocation context tying registry, daemon snapshot and host together.
//!
//! The binary runs once per menu interaction: once without arguments to
//! print the menu, then once per clicked item to perform a single action.
//! A [`Mounter`] holds everything one such run needs and is built fresh
//! every time.

use std::path::{Path, PathBuf};

use crate::action::{self, GlobalCommand, RemoteCommand, Route};
use crate::command;
use crate::error::{Error, Result};
use crate::executor::{self, CommandRunner, SystemRunner};
use crate::mount::{self, MountInfoTable, MountTable};
use crate::naming;
use crate::process::{self, ActiveDaemons, ProcfsTable};
use crate::registry::Registry;
use crate::settings::Settings;
use crate::state::{self, HangupSignal, RemoteState, SignalSender};

/// Separator line between remote entries and global entries.
pub const MENU_SEPARATOR: &str = "----";

/// Menu line shown instead of the remotes when their names collide.
pub const MENU_CONFLICT: &str = "DISABLED|⚠️ Conflicting remote names, see Mounter Log";

/// OS facilities used to observe and change mount state.
#[derive(Clone, Copy)]
pub struct HostServices<'a> {
    pub mount_table: &'a dyn MountTable,
    pub runner: &'a dyn CommandRunner,
    pub signals: &'a dyn SignalSender,
}

impl HostServices<'static> {
    /// The real system: `/proc`, subprocesses, and SIGHUP.
    pub fn system() -> Self {
        Self {
            mount_table: &MountInfoTable,
            runner: &SystemRunner,
            signals: &HangupSignal,
        }
    }
}

/// Reconciled view of one visible remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    pub name: String,
    pub title: String,
    pub path: PathBuf,
    pub state: RemoteState,
}

impl RemoteStatus {
    /// Menu line for this remote, listing the actions valid in its state.
    pub fn menu_line(&self) -> String {
        let title = &self.title;
        let glyph = self.state.glyph();
        let (header, commands): (String, &[RemoteCommand]) = match self.state {
            RemoteState::Mounted => (
                format!("{} {}", glyph, title),
                &[
                    RemoteCommand::ShowMountedFolder,
                    RemoteCommand::SafeUnmount,
                    RemoteCommand::ForceUnmount,
                    RemoteCommand::FlushCaches,
                    RemoteCommand::ShowLogs,
                ],
            ),
            RemoteState::Mounting => (
                format!("{} {} [Working...]", glyph, title),
                &[RemoteCommand::ShowLogs],
            ),
            RemoteState::Unmounted => (
                format!("{} {}", glyph, title),
                &[RemoteCommand::Mount, RemoteCommand::ShowLogs],
            ),
        };

        let mut line = format!("SUBMENU|{}", header);
        for command in commands {
            line.push('|');
            line.push_str(&command.item(title));
        }
        line
    }
}

/// Everything a single invocation works with.
pub struct Mounter<'a> {
    settings: Settings,
    registry: Registry,
    daemons: ActiveDaemons,
    host: HostServices<'a>,
    conflict: Option<Error>,
}

impl Mounter<'static> {
    /// Builds the context from the live system.
    ///
    /// An unreadable or invalid rclone config is logged and treated as an
    /// empty registry.
    pub fn from_system(settings: Settings) -> Self {
        let registry = match Registry::load(&settings.rclone_config) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!("{}, assuming no remotes", e);
                Registry::empty()
            }
        };
        let daemons = process::scan_active_daemons(&ProcfsTable, &settings.daemon_name());
        Self::new(settings, registry, daemons, HostServices::system())
    }
}

impl<'a> Mounter<'a> {
    /// Assembles a context and checks that remote names route unambiguously.
    pub fn new(
        settings: Settings,
        registry: Registry,
        daemons: ActiveDaemons,
        host: HostServices<'a>,
    ) -> Self {
        let conflict = registry
            .validate_names(
                &settings.mount_root,
                &action::REMOTE_CAPTIONS,
                &action::GLOBAL_CAPTIONS,
            )
            .err();
        if let Some(e) = &conflict {
            tracing::error!("Remote actions disabled: {}", e);
        }

        Self {
            settings,
            registry,
            daemons,
            host,
            conflict,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn daemons(&self) -> &ActiveDaemons {
        &self.daemons
    }

    /// The name collision found at startup, if any.
    pub fn conflict(&self) -> Option<&Error> {
        self.conflict.as_ref()
    }

    /// Remotes that may be shown and acted on; none while names collide.
    fn routable(&self) -> impl Iterator<Item = &str> {
        self.registry
            .list_visible()
            .filter(|_| self.conflict.is_none())
    }

    fn path_of(&self, name: &str) -> PathBuf {
        naming::make_path(name, &self.settings.mount_root)
    }

    /// Current state of every routable remote, in registry order.
    pub fn remotes(&self) -> Vec<RemoteStatus> {
        self.routable()
            .map(|name| {
                let path = self.path_of(name);
                let state = state::resolve_state(&path, &self.daemons, self.host.mount_table);
                RemoteStatus {
                    name: name.to_string(),
                    title: naming::make_title(name),
                    path,
                    state,
                }
            })
            .collect()
    }

    /// Lines for the menu host, one per remote, then the global actions.
    pub fn menu(&self) -> Vec<String> {
        tracing::info!("Populating the menu");

        let mut lines: Vec<String> = if self.conflict.is_some() {
            vec![MENU_CONFLICT.to_string()]
        } else {
            self.remotes().iter().map(RemoteStatus::menu_line).collect()
        };

        lines.push(MENU_SEPARATOR.to_string());
        lines.push(GlobalCommand::FlushAllCaches.caption().to_string());
        lines.push(GlobalCommand::ShowMounterLog.caption().to_string());
        lines
    }

    /// Routes `action` and performs at most one effect.
    ///
    /// Never fails: every error is logged here. Returns the route taken.
    pub fn perform(&self, action: &str) -> Route<'_> {
        tracing::info!("Action received: \"{}\"", action);

        let route = action::route(action, self.routable());
        let result = match route {
            Route::Remote { name, command } => self.perform_for_remote(name, command),
            Route::Global(command) => self.perform_global(command),
            Route::UnrecognizedForRemote { name } => {
                tracing::error!(
                    "Unknown action \"{}\" for \"{}\".",
                    action,
                    naming::make_title(name)
                );
                Ok(())
            }
            Route::Unrecognized => {
                tracing::error!("Action \"{}\" is unrecognized. Doing nothing.", action);
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::error!("Action \"{}\" failed: {}", action, e);
        }
        route
    }

    fn perform_for_remote(&self, name: &str, command: RemoteCommand) -> Result<()> {
        let path = self.path_of(name);
        let runner = self.host.runner;

        match command {
            RemoteCommand::Mount => {
                let current = state::resolve_state(&path, &self.daemons, self.host.mount_table);
                if current != RemoteState::Unmounted {
                    tracing::info!("{} is already {:?}, not mounting again", name, current);
                    return Ok(());
                }
                let attributes = self.registry.attributes_of(name)?;
                let args = command::build_mount_args(&self.settings, name, &path, &attributes);
                mount::mount_remote(runner, &args, &path)
            }
            RemoteCommand::SafeUnmount | RemoteCommand::ForceUnmount => {
                let force = command == RemoteCommand::ForceUnmount;
                let current = state::resolve_state(&path, &self.daemons, self.host.mount_table);
                if current == RemoteState::Unmounted {
                    tracing::info!("{} is not mounted, removing mount point only", name);
                    return mount::remove_mount_point(&path);
                }
                mount::unmount_remote(runner, &self.settings, &path, force)
            }
            RemoteCommand::ShowMountedFolder => self.open(&path),
            RemoteCommand::ShowLogs => {
                self.open(&naming::make_log_path(name, &self.settings.log_folder))
            }
            RemoteCommand::FlushCaches => {
                state::flush_caches(&self.daemons, Some(&path), self.host.signals);
                Ok(())
            }
        }
    }

    fn perform_global(&self, command: GlobalCommand) -> Result<()> {
        match command {
            GlobalCommand::ShowMounterLog => self.open(&self.settings.mounter_log_path()),
            GlobalCommand::FlushAllCaches => {
                state::flush_caches(&self.daemons, None, self.host.signals);
                Ok(())
            }
        }
    }

    /// Opens `path` in the desktop file browser.
    fn open(&self, path: &Path) -> Result<()> {
        let args = [path.to_string_lossy().to_string()];
        executor::run_helper(self.host.runner, "open", &self.settings.opener, &args)?;
        Ok(())
    }
}
