//! Action captions and routing.
//!
//! The menu host hands back a single string per click, built as
//! `"{caption} {title}"`. Routing recovers the (command, remote) pair by
//! substring matching, which only works while no title overlaps another
//! title or a caption; [`crate::registry::Registry::validate_names`] checks
//! exactly that.

use crate::naming;

// User visible captions. Must not overlap each other or any title.
pub const CAPTION_MOUNT: &str = "🎣 Mount";
pub const CAPTION_SAFE_UNMOUNT: &str = "⛔️ Unmount";
pub const CAPTION_FORCE_UNMOUNT: &str = "❌ Force Unmount";
pub const CAPTION_SHOW_FOLDER: &str = "📂 Show Mounted";
pub const CAPTION_SHOW_LOG: &str = "🔍 Show Logs For";
pub const CAPTION_FLUSH_DIRECTORY_CACHES_FOR: &str = "🧹 Flush Dir Caches For";
pub const CAPTION_SHOW_MOUNTER_LOG: &str = "🔍 Show Mounter Log";
pub const CAPTION_FLUSH_DIRECTORY_CACHES_ALL: &str = "🧹 Flush All Dir Caches";

/// Captions that are followed by a remote's title in a menu item.
pub const REMOTE_CAPTIONS: [&str; 6] = [
    CAPTION_MOUNT,
    CAPTION_SAFE_UNMOUNT,
    CAPTION_FORCE_UNMOUNT,
    CAPTION_SHOW_FOLDER,
    CAPTION_SHOW_LOG,
    CAPTION_FLUSH_DIRECTORY_CACHES_FOR,
];

/// Captions that stand alone in the menu.
pub const GLOBAL_CAPTIONS: [&str; 2] = [
    CAPTION_SHOW_MOUNTER_LOG,
    CAPTION_FLUSH_DIRECTORY_CACHES_ALL,
];

/// Action on a single remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    Mount,
    SafeUnmount,
    ForceUnmount,
    ShowMountedFolder,
    ShowLogs,
    FlushCaches,
}

impl RemoteCommand {
    /// Matching order when looking for a caption in an action string.
    pub const ALL: [Self; 6] = [
        Self::Mount,
        Self::SafeUnmount,
        Self::ForceUnmount,
        Self::ShowMountedFolder,
        Self::ShowLogs,
        Self::FlushCaches,
    ];

    pub fn caption(self) -> &'static str {
        match self {
            Self::Mount => CAPTION_MOUNT,
            Self::SafeUnmount => CAPTION_SAFE_UNMOUNT,
            Self::ForceUnmount => CAPTION_FORCE_UNMOUNT,
            Self::ShowMountedFolder => CAPTION_SHOW_FOLDER,
            Self::ShowLogs => CAPTION_SHOW_LOG,
            Self::FlushCaches => CAPTION_FLUSH_DIRECTORY_CACHES_FOR,
        }
    }

    /// Menu item text for this command on the remote titled `title`.
    pub fn item(self, title: &str) -> String {
        format!("{} {}", self.caption(), title)
    }

    fn find(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| action.contains(c.caption()))
    }
}

/// Action that does not target a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalCommand {
    ShowMounterLog,
    FlushAllCaches,
}

impl GlobalCommand {
    pub const ALL: [Self; 2] = [Self::ShowMounterLog, Self::FlushAllCaches];

    pub fn caption(self) -> &'static str {
        match self {
            Self::ShowMounterLog => CAPTION_SHOW_MOUNTER_LOG,
            Self::FlushAllCaches => CAPTION_FLUSH_DIRECTORY_CACHES_ALL,
        }
    }

    fn find(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| action.contains(c.caption()))
    }
}

/// Outcome of routing one action string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// A remote's title and a remote caption both matched.
    Remote {
        name: &'a str,
        command: RemoteCommand,
    },
    /// A remote's title matched but no remote caption did.
    UnrecognizedForRemote { name: &'a str },
    /// No title matched; a global caption did.
    Global(GlobalCommand),
    /// Nothing matched.
    Unrecognized,
}

/// Routes `action` against the given remote names.
///
/// The first remote whose title occurs in `action` takes the action; only
/// when none does are the global captions considered. Callers pass only
/// visible remotes.
pub fn route<'a>(action: &str, remotes: impl IntoIterator<Item = &'a str>) -> Route<'a> {
    for name in remotes {
        if action.contains(naming::make_title(name).as_str()) {
            return match RemoteCommand::find(action) {
                Some(command) => Route::Remote { name, command },
                None => Route::UnrecognizedForRemote { name },
            };
        }
    }

    match GlobalCommand::find(action) {
        Some(command) => Route::Global(command),
        None => Route::Unrecognized,
    }
}
