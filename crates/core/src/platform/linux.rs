//! Linux desktop shell
//! - Launch through the target itself or xdg-open
//! - `.desktop` entries and symlinks act as link files
//! - Login startup via an XDG autostart entry

use crate::icons::IconImage;
use crate::platform::{normalize_arguments, PlatformError, PlatformShell, StartupRegistration};
use crate::resolver::Resolution;
use std::fmt::Write as _;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

const AUTOSTART_FILE: &str = "desktop-drawer.desktop";

pub struct LinuxShell {
    home_dir: PathBuf,
}

impl LinuxShell {
    pub fn new() -> Self {
        let home_dir = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/home"));
        Self { home_dir }
    }

    fn autostart_path(&self) -> PathBuf {
        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .unwrap_or_else(|| self.home_dir.join(".config"));
        config_home.join("autostart").join(AUTOSTART_FILE)
    }
}

impl Default for LinuxShell {
    fn default() -> Self {
        Self::new()
    }
}

impl StartupRegistration for LinuxShell {
    fn is_startup_enabled(&self) -> bool {
        match fs::read_to_string(self.autostart_path()) {
            Ok(content) => !parse_desktop_entry(&content).hidden,
            Err(_) => false,
        }
    }

    fn set_startup_enabled(&self, enabled: bool) -> Result<(), PlatformError> {
        let path = self.autostart_path();
        if !enabled {
            if path.exists() {
                fs::remove_file(&path)?;
                log::info!("Removed autostart entry {:?}", path);
            }
            return Ok(());
        }

        let exe = std::env::current_exe()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, autostart_entry(&exe))?;
        log::info!("Wrote autostart entry {:?}", path);
        Ok(())
    }
}

impl PlatformShell for LinuxShell {
    fn launch(&self, path: &Path, arguments: Option<&str>) -> Result<(), PlatformError> {
        launch_command(path, arguments).spawn().map_err(|e| PlatformError::Launch {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn reveal(&self, path: &Path) -> Result<(), PlatformError> {
        let folder = if path.is_dir() {
            path
        } else {
            path.parent().unwrap_or(path)
        };
        Command::new("xdg-open")
            .arg(folder)
            .spawn()
            .map_err(|e| PlatformError::Launch {
                path: folder.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn resolve_link(&self, path: &Path) -> Option<Resolution> {
        if path.extension().is_some_and(|e| e == "desktop") {
            let content = fs::read_to_string(path).ok()?;
            return parse_desktop_entry(&content).resolution();
        }

        let meta = path.symlink_metadata().ok()?;
        if meta.file_type().is_symlink() {
            let target = fs::canonicalize(path).ok()?;
            return Some(Resolution {
                target_path: target.to_string_lossy().to_string(),
                arguments: None,
            });
        }
        None
    }

    fn shell_icon(&self, _path: &Path, _size: u32) -> Option<IconImage> {
        // Icon themes store PNG/SVG; there is no decoder in this crate
        None
    }

    fn file_icon(&self, _path: &Path) -> Option<IconImage> {
        None
    }
}

/// Executables run directly with their arguments; anything else goes
/// through xdg-open, which has no way to forward arguments
fn launch_command(path: &Path, arguments: Option<&str>) -> Command {
    if is_executable(path) {
        let mut command = Command::new(path);
        if let Some(args) = arguments {
            command.args(split_arguments(args));
        }
        return command;
    }

    if let Some(args) = arguments {
        log::warn!("xdg-open cannot pass arguments, dropping '{}' for {:?}", args, path);
    }
    let mut command = Command::new("xdg-open");
    command.arg(path);
    command
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Split an argument string on whitespace, honouring double quotes
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in args.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    out.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        out.push(current);
    }
    out
}

#[derive(Debug, Default)]
struct DesktopEntry {
    exec: String,
    hidden: bool,
}

impl DesktopEntry {
    fn resolution(&self) -> Option<Resolution> {
        let mut parts = split_arguments(&self.exec).into_iter();
        let target = parts.next()?;
        let args: Vec<String> = parts.collect();
        Some(Resolution {
            target_path: target,
            arguments: normalize_arguments(&args.join(" ")),
        })
    }
}

/// Parse the `[Desktop Entry]` group of a .desktop file
fn parse_desktop_entry(content: &str) -> DesktopEntry {
    let mut entry = DesktopEntry::default();
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();

        if line == "[Desktop Entry]" {
            in_desktop_entry = true;
            continue;
        }

        if line.starts_with('[') {
            in_desktop_entry = false;
            continue;
        }

        if !in_desktop_entry {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "Exec" => {
                    // Remove %u, %U, %f, %F, etc. placeholders
                    entry.exec = value
                        .split_whitespace()
                        .filter(|s| !s.starts_with('%'))
                        .collect::<Vec<_>>()
                        .join(" ");
                }
                "Hidden" => entry.hidden = value.trim() == "true",
                _ => {}
            }
        }
    }

    entry
}

fn autostart_entry(exe: &Path) -> String {
    let mut content = String::new();
    let _ = writeln!(content, "[Desktop Entry]");
    let _ = writeln!(content, "Type=Application");
    let _ = writeln!(content, "Name=Desktop Drawer");
    let _ = writeln!(content, "Exec=\"{}\"", exe.display());
    let _ = writeln!(content, "Terminal=false");
    let _ = writeln!(content, "X-GNOME-Autostart-enabled=true");
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_arguments_quotes() {
        assert_eq!(
            split_arguments(r#"--profile "My Profile"  -v"#),
            vec!["--profile", "My Profile", "-v"]
        );
        assert_eq!(split_arguments(r#"a "" b"#), vec!["a", "", "b"]);
        assert!(split_arguments("   ").is_empty());
    }

    #[test]
    fn test_launch_command_by_target_kind() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let doc = dir.path().join("notes.txt");
        fs::write(&doc, "hi").unwrap();

        let command = launch_command(&script, Some(r#"--title "My Notes""#));
        assert_eq!(command.get_program(), script.as_os_str());
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["--title", "My Notes"]);

        let command = launch_command(&doc, Some("--ignored"));
        assert_eq!(command.get_program(), "xdg-open");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, [doc.as_os_str()]);
    }

    #[test]
    fn test_desktop_entry_resolution() {
        let content = "[Desktop Entry]\nName=Firefox\nExec=/usr/bin/firefox --new-window %u\n\n[Desktop Action new]\nExec=/usr/bin/firefox --private\n";
        let resolved = parse_desktop_entry(content).resolution().unwrap();
        assert_eq!(resolved.target_path, "/usr/bin/firefox");
        assert_eq!(resolved.arguments.as_deref(), Some("--new-window"));
    }

    #[test]
    fn test_resolve_desktop_file_and_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("editor.desktop");
        fs::write(&entry, "[Desktop Entry]\nExec=/opt/editor/bin/editor\n").unwrap();
        let target = dir.path().join("notes.txt");
        fs::write(&target, "hi").unwrap();
        let link = dir.path().join("notes-link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let shell = LinuxShell::new();
        let resolved = shell.resolve_link(&entry).unwrap();
        assert_eq!(resolved.target_path, "/opt/editor/bin/editor");
        assert_eq!(resolved.arguments, None);

        let resolved = shell.resolve_link(&link).unwrap();
        assert_eq!(
            PathBuf::from(resolved.target_path),
            fs::canonicalize(&target).unwrap()
        );
        assert!(shell.resolve_link(&target).is_none());
    }

    #[test]
    fn test_autostart_entry_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let shell = LinuxShell {
            home_dir: dir.path().to_path_buf(),
        };
        let path = dir.path().join(".config/autostart").join(AUTOSTART_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, autostart_entry(Path::new("/usr/bin/drawer"))).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let entry = parse_desktop_entry(&content);
        assert_eq!(entry.exec, "\"/usr/bin/drawer\"");
        assert!(!entry.hidden);
        // XDG_CONFIG_HOME may point elsewhere on the test machine
        if std::env::var_os("XDG_CONFIG_HOME").is_none() {
            assert!(shell.is_startup_enabled());
        }
    }
}
