//! Remote name normalization.
//!
//! Rclone remote names double as user-facing titles and local directory
//! names. A few reserved suffixes change how a remote is treated:
//!
//! - `-raw`, `-intermediate`, `-hidden` (and the `DEFAULT` section) hide it.
//! - `-exclusive` mounts it with aggressive caching; the suffix itself is
//!   stripped before anything is shown to the user or touches the filesystem.

use std::path::{Path, PathBuf};

/// Suffixes that keep a remote out of the menu and out of action routing.
pub const HIDDEN_SUFFIXES: [&str; 3] = ["-raw", "-intermediate", "-hidden"];

/// Reserved INI section that is never a real remote.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Suffix selecting the exclusive-mode option profile.
pub const SUFFIX_EXCLUSIVE: &str = "-exclusive";

/// Returns true if the remote must never be shown or mounted.
pub fn is_hidden(name: &str) -> bool {
    name == DEFAULT_SECTION || HIDDEN_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Returns true if the remote should be mounted in exclusive mode.
pub fn is_exclusive(name: &str) -> bool {
    name.ends_with(SUFFIX_EXCLUSIVE)
}

/// Removes the exclusivity modifier from a remote name.
///
/// Repeated suffixes are all removed, so the result never ends with
/// `-exclusive` and a second call is a no-op.
pub fn strip_suffixes(name: &str) -> String {
    let mut stripped = name;
    while let Some(rest) = stripped.strip_suffix(SUFFIX_EXCLUSIVE) {
        stripped = rest;
    }
    stripped.to_string()
}

/// Builds the user-visible title: `team-drive-exclusive` -> `Team Drive`.
pub fn make_title(name: &str) -> String {
    title_case(&strip_suffixes(name).replace('-', " "))
}

/// Mount point for a remote under `mount_root`.
pub fn make_path(name: &str, mount_root: &Path) -> PathBuf {
    mount_root.join(strip_suffixes(name))
}

/// Rclone log file for a remote under `log_folder`.
pub fn make_log_path(name: &str, log_folder: &Path) -> PathBuf {
    log_folder.join(format!("{}.log", strip_suffixes(name)))
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
fn title_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut in_word = false;

    for c in input.chars() {
        if c.is_alphabetic() {
            if in_word {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            result.push(c);
            in_word = false;
        }
    }

    result
}
