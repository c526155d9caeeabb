//! macOS desktop shell
//!
//! - `open` for launching and `open -R` for revealing in Finder
//! - Symlinks act as link files
//! - Login startup via a LaunchAgent plist

use crate::icons::IconImage;
use crate::platform::{PlatformError, PlatformShell, StartupRegistration};
use crate::resolver::Resolution;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const AGENT_LABEL: &str = "com.drawer.desktop-drawer";

pub struct MacOSShell {
    home_dir: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct LaunchAgent {
    label: String,
    program_arguments: Vec<String>,
    run_at_load: bool,
}

impl MacOSShell {
    pub fn new() -> Self {
        let home_dir = std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/Users"));
        Self { home_dir }
    }

    fn agent_path(&self) -> PathBuf {
        self.home_dir
            .join("Library/LaunchAgents")
            .join(format!("{}.plist", AGENT_LABEL))
    }
}

impl Default for MacOSShell {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupRegistration for MacOSShell {
    fn is_startup_enabled(&self) -> bool {
        self.agent_path().exists()
    }

    fn set_startup_enabled(&self, enabled: bool) -> Result<(), PlatformError> {
        let path = self.agent_path();
        if !enabled {
            if path.exists() {
                fs::remove_file(&path)?;
            }
            return Ok(());
        }

        let exe = std::env::current_exe()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let agent = LaunchAgent {
            label: AGENT_LABEL.to_string(),
            program_arguments: vec![exe.to_string_lossy().to_string()],
            run_at_load: true,
        };
        plist::to_file_xml(&path, &agent).map_err(|e| PlatformError::Startup(e.to_string()))?;
        log::info!("Wrote launch agent {:?}", path);
        Ok(())
    }
}

impl PlatformShell for MacOSShell {
    fn launch(&self, path: &Path, arguments: Option<&str>) -> Result<(), PlatformError> {
        let mut command = Command::new("open");
        command.arg(path);
        if let Some(args) = arguments {
            command.arg("--args").args(args.split_whitespace());
        }
        command.spawn().map_err(|e| PlatformError::Launch {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn reveal(&self, path: &Path) -> Result<(), PlatformError> {
        Command::new("open")
            .arg("-R")
            .arg(path)
            .spawn()
            .map_err(|e| PlatformError::Launch {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn resolve_link(&self, path: &Path) -> Option<Resolution> {
        let meta = path.symlink_metadata().ok()?;
        if !meta.file_type().is_symlink() {
            return None;
        }
        let target = fs::canonicalize(path).ok()?;
        Some(Resolution {
            target_path: target.to_string_lossy().to_string(),
            arguments: None,
        })
    }

    fn shell_icon(&self, _path: &Path, _size: u32) -> Option<IconImage> {
        None
    }

    fn file_icon(&self, _path: &Path) -> Option<IconImage> {
        None
    }
}
