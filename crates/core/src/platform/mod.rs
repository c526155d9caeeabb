//! OS boundary: launching, revealing, link resolution, shell icons and
//! login-startup registration

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "macos")]
pub mod macos;

use crate::icons::IconImage;
use crate::resolver::Resolution;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Name used for the startup registry value / autostart entry
pub const APP_STARTUP_NAME: &str = "DesktopDrawer";

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("failed to launch {path}: {reason}")]
    Launch { path: String, reason: String },
    #[error("startup registration failed: {0}")]
    Startup(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Live login-startup state. The OS is the source of truth, not settings.json.
pub trait StartupRegistration: Send + Sync {
    fn is_startup_enabled(&self) -> bool;

    fn set_startup_enabled(&self, enabled: bool) -> Result<(), PlatformError>;
}

/// Platform-agnostic interface to the desktop shell
pub trait PlatformShell: StartupRegistration {
    /// Open a target with the default handler, passing stored arguments.
    /// Handlers that cannot take arguments (xdg-open) drop them.
    fn launch(&self, path: &Path, arguments: Option<&str>) -> Result<(), PlatformError>;

    /// Show the target in the file browser
    fn reveal(&self, path: &Path) -> Result<(), PlatformError>;

    /// Dereference a link file; `None` when not a link or unresolvable
    fn resolve_link(&self, path: &Path) -> Option<Resolution>;

    /// High-resolution icon from the shell image lists
    fn shell_icon(&self, path: &Path, size: u32) -> Option<IconImage>;

    /// Icon extracted directly from the file
    fn file_icon(&self, path: &Path) -> Option<IconImage>;

    /// Prepare a background thread for icon calls. Returns whether
    /// `exit_worker_thread` must be called on that thread when it stops.
    fn init_worker_thread(&self) -> bool {
        false
    }

    fn exit_worker_thread(&self) {}
}

/// Get the shell for the current OS
#[cfg(target_os = "linux")]
pub fn system_shell() -> Arc<dyn PlatformShell> {
    Arc::new(linux::LinuxShell::new())
}

#[cfg(target_os = "windows")]
pub fn system_shell() -> Arc<dyn PlatformShell> {
    Arc::new(windows::WindowsShell::new())
}

#[cfg(target_os = "macos")]
pub fn system_shell() -> Arc<dyn PlatformShell> {
    Arc::new(macos::MacOSShell::new())
}

/// Trim and drop empty argument strings
pub(crate) fn normalize_arguments(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
