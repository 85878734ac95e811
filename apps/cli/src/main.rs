//! Mounter CLI - Menu backend for rclone mounts.
//!
//! Without arguments, prints one menu line per remote followed by the global
//! entries. With an action string (a clicked menu item), performs that
//! action. Both modes always exit with status 0; failures go to the log.

mod logging;

use std::path::PathBuf;

use clap::Parser;
use rclone_mounter_core::{Mounter, Settings};

/// Rclone mount manager for status bar menus.
#[derive(Parser)]
#[command(name = "mounter")]
#[command(about = "Mount, unmount and refresh rclone remotes", long_about = None)]
struct Cli {
    /// Menu item to act on, e.g. "🎣 Mount Team Drive". Prints the menu when absent.
    action: Option<String>,

    /// Settings file [default: ~/.config/mounter/settings.json]
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory holding the mount points.
    #[arg(long)]
    mount_root: Option<PathBuf>,

    /// Rclone configuration file.
    #[arg(long)]
    rclone_config: Option<PathBuf>,

    /// Directory for the mounter and rclone logs.
    #[arg(long)]
    log_folder: Option<PathBuf>,
}

impl Cli {
    /// Resolves settings from defaults, the settings file and the flags.
    fn settings(&self) -> Settings {
        let defaults = match Settings::from_environment() {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("{}, using the current directory", e);
                Settings::for_home(&std::env::current_dir().unwrap_or_default())
            }
        };

        let path = self.settings.clone().or_else(Settings::default_path);
        let mut settings = match path {
            Some(path) => defaults.clone().with_file(&path).unwrap_or_else(|e| {
                eprintln!("{}, using defaults", e);
                defaults
            }),
            None => defaults,
        };

        if let Some(mount_root) = &self.mount_root {
            settings.mount_root = mount_root.clone();
        }
        if let Some(rclone_config) = &self.rclone_config {
            settings.rclone_config = rclone_config.clone();
        }
        if let Some(log_folder) = &self.log_folder {
            settings.log_folder = log_folder.clone();
        }
        settings
    }
}

fn main() {
    let cli = Cli::parse();
    let settings = cli.settings();
    let _guard = logging::init(&settings);

    let mounter = Mounter::from_system(settings);

    match cli.action.as_deref() {
        None => {
            for line in mounter.menu() {
                println!("{}", line);
            }
        }
        Some(action) => {
            mounter.perform(action);
        }
    }
}
