//! Rclone daemon discovery.
//!
//! This module scans the process table for rclone instances running in
//! `--daemon` mode and records their command lines. The snapshot is taken
//! fresh on every invocation and is only ever read afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use procfs::ProcError;
use procfs::process::{ProcState, Process};

use crate::error::{Error, Result};

/// Command-line marker of a backgrounded rclone mount.
pub const DAEMON_FLAG: &str = "--daemon";

/// Longest executable name the kernel keeps in `comm`.
const COMM_MAX_LEN: usize = 15;

/// Minimal identity of a running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    /// Executable name as reported by the kernel (`comm`).
    pub name: String,
}

/// Source of process information.
///
/// Per-process failures are expected: processes exit while being scanned,
/// and zombies have no readable command line.
pub trait ProcessTable {
    /// Lists running processes. Entries that could not be read are
    /// reported in place so the caller can skip them.
    fn processes(&self) -> Result<Vec<Result<ProcessInfo>>>;

    /// Reads the argument vector of `pid`.
    fn cmdline(&self, pid: i32) -> Result<Vec<String>>;
}

/// Process table backed by `/proc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcfsTable;

impl ProcessTable for ProcfsTable {
    fn processes(&self) -> Result<Vec<Result<ProcessInfo>>> {
        let all = procfs::process::all_processes().map_err(|e| Error::ProcessTable {
            message: e.to_string(),
        })?;

        Ok(all
            .map(|entry| -> Result<ProcessInfo> {
                let process = entry.map_err(|e| introspection_error(None, e))?;
                let stat = process
                    .stat()
                    .map_err(|e| introspection_error(Some(process.pid()), e))?;
                Ok(ProcessInfo {
                    pid: process.pid(),
                    name: stat.comm,
                })
            })
            .collect())
    }

    fn cmdline(&self, pid: i32) -> Result<Vec<String>> {
        let process = Process::new(pid).map_err(|e| introspection_error(Some(pid), e))?;
        let stat = process
            .stat()
            .map_err(|e| introspection_error(Some(pid), e))?;

        if matches!(stat.state(), Ok(ProcState::Zombie)) {
            return Err(Error::ZombieProcess { pid });
        }

        process
            .cmdline()
            .map_err(|e| introspection_error(Some(pid), e))
    }
}

/// Maps a procfs failure onto the scan error taxonomy.
fn introspection_error(pid: Option<i32>, err: ProcError) -> Error {
    match err {
        ProcError::NotFound(path) => Error::ProcessVanished {
            pid: pid.unwrap_or_else(|| pid_from_path(path.as_deref())),
        },
        other => Error::ProcessIntrospection {
            pid: pid.unwrap_or(0),
            message: other.to_string(),
        },
    }
}

/// Extracts the pid component of a `/proc/<pid>/...` path.
fn pid_from_path(path: Option<&Path>) -> i32 {
    path.and_then(|p| {
        p.components()
            .find_map(|c| c.as_os_str().to_str()?.parse().ok())
    })
    .unwrap_or(0)
}

/// Rclone daemons found by a scan, keyed by pid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveDaemons {
    daemons: BTreeMap<i32, Vec<String>>,
}

impl ActiveDaemons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: i32, cmdline: Vec<String>) {
        self.daemons.insert(pid, cmdline);
    }

    pub fn len(&self) -> usize {
        self.daemons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.daemons.is_empty()
    }

    pub fn get(&self, pid: i32) -> Option<&[String]> {
        self.daemons.get(&pid).map(Vec::as_slice)
    }

    /// All scanned pids in ascending order.
    pub fn pids(&self) -> impl Iterator<Item = i32> + '_ {
        self.daemons.keys().copied()
    }

    /// Pids of daemons whose command line mentions `path`.
    ///
    /// This is a plain substring search over every argument, so it also
    /// matches a path embedded in a longer option value, or a sibling mount
    /// point sharing the same prefix. All path/daemon correlation goes
    /// through here.
    pub fn serving(&self, path: &Path) -> Vec<i32> {
        let needle = path.to_string_lossy();
        self.daemons
            .iter()
            .filter(|(_, cmdline)| cmdline.iter().any(|arg| arg.contains(needle.as_ref())))
            .map(|(pid, _)| *pid)
            .collect()
    }

    /// Returns true if any daemon's command line mentions `path`.
    pub fn is_serving(&self, path: &Path) -> bool {
        !self.serving(path).is_empty()
    }
}

impl FromIterator<(i32, Vec<String>)> for ActiveDaemons {
    fn from_iter<I: IntoIterator<Item = (i32, Vec<String>)>>(iter: I) -> Self {
        Self {
            daemons: iter.into_iter().collect(),
        }
    }
}

/// Returns true if the program in `cmdline` has the file name `name`.
fn invoked_as(cmdline: &[String], name: &str) -> bool {
    cmdline
        .first()
        .and_then(|program| Path::new(program).file_name())
        .is_some_and(|program| program.to_str() == Some(name))
}

/// Collects processes named `daemon_name` that were started with `--daemon`.
///
/// Never fails: unreadable processes are logged and skipped, and a table that
/// cannot be enumerated yields an empty snapshot.
pub fn scan_active_daemons(table: &dyn ProcessTable, daemon_name: &str) -> ActiveDaemons {
    let entries = match table.processes() {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Process scan failed, assuming no daemons: {}", e);
            return ActiveDaemons::new();
        }
    };

    let mut daemons = ActiveDaemons::new();
    for entry in entries {
        let info = match entry {
            Ok(info) => info,
            Err(Error::ProcessVanished { pid }) => {
                tracing::debug!("process {} exited during scan", pid);
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping process: {}", e);
                continue;
            }
        };

        // Long names are cut short in `comm`; confirm those from argv[0]
        let truncated = info.name.len() == COMM_MAX_LEN
            && daemon_name.len() > COMM_MAX_LEN
            && daemon_name.starts_with(info.name.as_str());
        if info.name != daemon_name && !truncated {
            continue;
        }

        let cmdline = match table.cmdline(info.pid) {
            Ok(cmdline) => cmdline,
            Err(Error::ZombieProcess { pid }) => {
                tracing::warn!("{}({}) is a zombie process, skipped", daemon_name, pid);
                continue;
            }
            Err(Error::ProcessVanished { pid }) => {
                tracing::debug!("{}({}) exited during scan", daemon_name, pid);
                continue;
            }
            Err(e) => {
                tracing::warn!("Skipping {}({}): {}", daemon_name, info.pid, e);
                continue;
            }
        };

        if truncated && !invoked_as(&cmdline, daemon_name) {
            continue;
        }

        if cmdline.iter().any(|arg| arg == DAEMON_FLAG) {
            daemons.insert(info.pid, cmdline);
        }
    }

    tracing::debug!("Found {} active {} daemons", daemons.len(), daemon_name);
    daemons
}
