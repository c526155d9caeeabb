//! Link-file resolution

use crate::platform::PlatformShell;
use std::path::Path;
use std::sync::Arc;

/// Where a dropped path really points, and with which arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub target_path: String,
    pub arguments: Option<String>,
}

impl Resolution {
    pub fn passthrough(path: &str) -> Self {
        Self {
            target_path: path.to_string(),
            arguments: None,
        }
    }
}

/// Dereferences link files. Never fails: anything unresolvable comes back as
/// the original path with no arguments.
pub trait ShortcutResolver: Send + Sync {
    fn resolve(&self, path: &str) -> Resolution;
}

/// Whether the path names a link file on this platform
pub fn is_link_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    ext.eq_ignore_ascii_case("lnk") || (cfg!(target_os = "linux") && ext == "desktop")
}

/// Resolver backed by the platform shell
pub struct SystemResolver {
    shell: Arc<dyn PlatformShell>,
}

impl SystemResolver {
    pub fn new(shell: Arc<dyn PlatformShell>) -> Self {
        Self { shell }
    }
}

impl ShortcutResolver for SystemResolver {
    fn resolve(&self, path: &str) -> Resolution {
        let p = Path::new(path);
        let is_symlink = p
            .symlink_metadata()
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);
        if !is_link_path(p) && !is_symlink {
            return Resolution::passthrough(path);
        }
        if !p.exists() && !is_symlink {
            log::debug!("Link {} does not exist, keeping original path", path);
            return Resolution::passthrough(path);
        }

        match self.shell.resolve_link(p) {
            Some(resolution) if !resolution.target_path.trim().is_empty() => Resolution {
                target_path: resolution.target_path.trim().to_string(),
                arguments: resolution
                    .arguments
                    .as_deref()
                    .and_then(crate::platform::normalize_arguments),
            },
            _ => {
                log::warn!("Could not resolve link {}, keeping original path", path);
                Resolution::passthrough(path)
            }
        }
    }
}
