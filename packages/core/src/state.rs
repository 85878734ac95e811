//! Mount state reconciliation.
//!
//! A remote's lifecycle state is never stored. It is recomputed on every
//! invocation from the kernel mount table and the daemon snapshot:
//!
//! | mount table | daemon mentions path | state       |
//! |-------------|----------------------|-------------|
//! | mounted     | any                  | `Mounted`   |
//! | not mounted | yes                  | `Mounting`  |
//! | not mounted | no                   | `Unmounted` |

use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::error::{Error, Result};
use crate::mount::MountTable;
use crate::process::ActiveDaemons;

/// Lifecycle state of one remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    /// No mount point and no daemon.
    Unmounted,
    /// A daemon exists but the kernel has not registered the mount yet.
    Mounting,
    /// The path is a live mount point.
    Mounted,
}

impl RemoteState {
    /// Status glyph shown in front of the remote's title.
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Unmounted => "🔴",
            Self::Mounting => "🟡",
            Self::Mounted => "🟢",
        }
    }
}

/// Resolves the state of the remote mounted at `path`.
///
/// The mount table is authoritative; daemon bookkeeping only matters when
/// the path is not mounted.
pub fn resolve_state(
    path: &Path,
    daemons: &ActiveDaemons,
    mount_table: &dyn MountTable,
) -> RemoteState {
    if mount_table.is_mount_point(path) {
        RemoteState::Mounted
    } else if daemons.is_serving(path) {
        RemoteState::Mounting
    } else {
        RemoteState::Unmounted
    }
}

/// Delivers the cache-invalidation signal to a process.
pub trait SignalSender {
    /// Signals `pid`. A process that no longer exists is not an error.
    fn hangup(&self, pid: i32) -> Result<()>;
}

/// Sends `SIGHUP`, which makes rclone drop its directory caches.
#[derive(Debug, Clone, Copy, Default)]
pub struct HangupSignal;

impl SignalSender for HangupSignal {
    fn hangup(&self, pid: i32) -> Result<()> {
        match signal::kill(Pid::from_raw(pid), Signal::SIGHUP) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(source) => Err(Error::Signal { pid, source }),
        }
    }
}

/// Asks daemons to flush their directory caches.
///
/// With `path`, only daemons whose command line mentions it are signalled;
/// without, every scanned daemon is. Fire-and-forget: failures are logged
/// and the remaining daemons are still signalled. Returns the pids that
/// were signalled successfully.
pub fn flush_caches(
    daemons: &ActiveDaemons,
    path: Option<&Path>,
    signals: &dyn SignalSender,
) -> Vec<i32> {
    let targets: Vec<i32> = match path {
        Some(path) => daemons.serving(path),
        None => daemons.pids().collect(),
    };

    if targets.is_empty() {
        tracing::info!("No daemons to flush");
    }

    let mut flushed = Vec::with_capacity(targets.len());
    for pid in targets {
        tracing::info!("Flushing directory caches for rclone({})", pid);
        match signals.hangup(pid) {
            Ok(()) => flushed.push(pid),
            Err(e) => tracing::error!("{}", e),
        }
    }
    flushed
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mount::tests::FakeMountTable;
    use std::cell::RefCell;

    /// Records signalled pids; fails for the pids in `failing`.
    #[derive(Debug, Default)]
    pub struct RecordingSignals {
        pub sent: RefCell<Vec<i32>>,
        pub failing: Vec<i32>,
    }

    impl SignalSender for RecordingSignals {
        fn hangup(&self, pid: i32) -> Result<()> {
            if self.failing.contains(&pid) {
                return Err(Error::Signal {
                    pid,
                    source: Errno::EPERM,
                });
            }
            self.sent.borrow_mut().push(pid);
            Ok(())
        }
    }

    fn daemons() -> ActiveDaemons {
        [
            (
                100,
                vec![
                    "rclone".to_string(),
                    "mount".to_string(),
                    "team-drive-exclusive:".to_string(),
                    "/home/u/team-drive".to_string(),
                    "--daemon".to_string(),
                ],
            ),
            (
                200,
                vec![
                    "rclone".to_string(),
                    "mount".to_string(),
                    "photos:".to_string(),
                    "/home/u/photos".to_string(),
                    "--daemon".to_string(),
                ],
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_mounted_wins_over_daemon() {
        let path = Path::new("/home/u/team-drive");
        let table = FakeMountTable::with(&[path]);
        assert_eq!(resolve_state(path, &daemons(), &table), RemoteState::Mounted);
    }

    #[test]
    fn test_mounted_without_daemon() {
        let path = Path::new("/home/u/other");
        let table = FakeMountTable::with(&[path]);
        assert_eq!(resolve_state(path, &daemons(), &table), RemoteState::Mounted);
    }

    #[test]
    fn test_daemon_without_mount_is_mounting() {
        let path = Path::new("/home/u/photos");
        let table = FakeMountTable::default();
        assert_eq!(resolve_state(path, &daemons(), &table), RemoteState::Mounting);
    }

    #[test]
    fn test_neither_is_unmounted() {
        let path = Path::new("/home/u/archive");
        let table = FakeMountTable::default();
        assert_eq!(
            resolve_state(path, &daemons(), &table),
            RemoteState::Unmounted
        );
    }

    #[test]
    fn test_flush_all() {
        let signals = RecordingSignals::default();
        let flushed = flush_caches(&daemons(), None, &signals);
        assert_eq!(flushed, vec![100, 200]);
        assert_eq!(*signals.sent.borrow(), vec![100, 200]);
    }

    #[test]
    fn test_flush_for_path() {
        let signals = RecordingSignals::default();
        let flushed = flush_caches(&daemons(), Some(Path::new("/home/u/photos")), &signals);
        assert_eq!(flushed, vec![200]);
        assert_eq!(*signals.sent.borrow(), vec![200]);
    }

    #[test]
    fn test_flush_continues_after_failure() {
        let signals = RecordingSignals {
            failing: vec![100],
            ..Default::default()
        };
        let flushed = flush_caches(&daemons(), None, &signals);
        assert_eq!(flushed, vec![200]);
    }

    #[test]
    fn test_hangup_exited_process_is_ok() {
        // Above the kernel's pid_max, so no such process
        HangupSignal.hangup(i32::MAX - 1).unwrap();
    }

    #[test]
    fn test_glyphs() {
        assert_eq!(RemoteState::Mounted.glyph(), "🟢");
        assert_eq!(RemoteState::Mounting.glyph(), "🟡");
        assert_eq!(RemoteState::Unmounted.glyph(), "🔴");
    }
}
