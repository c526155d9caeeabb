//! Panel settings and their JSON store

use crate::icons::DEFAULT_ICON_SIZE;
use crate::platform::{PlatformError, StartupRegistration};
use crate::store::{data_dir, read_json, write_json_pretty, StoreError};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// Which click opens a shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    Single,
    Double,
}

/// Panel settings. Built once by the application and passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Window cannot be dragged while locked
    #[serde(default, alias = "is_locked")]
    pub is_locked: bool,

    /// Window opacity in percent (0-100)
    #[serde(rename = "OpacityValue", default = "default_opacity", alias = "opacity_percent")]
    pub opacity_percent: f64,

    #[serde(default = "default_double_click", alias = "open_with_double_click")]
    pub open_with_double_click: bool,

    #[serde(default = "default_icon_size", alias = "icon_size")]
    pub icon_size: f64,

    #[serde(default = "default_top", alias = "top")]
    pub top: f64,

    #[serde(default = "default_left", alias = "left")]
    pub left: f64,

    #[serde(default = "default_width", alias = "width")]
    pub width: f64,

    #[serde(default = "default_height", alias = "height")]
    pub height: f64,

    /// Overwritten from the live OS state on every load
    #[serde(default, alias = "run_at_startup")]
    pub run_at_startup: bool,
}

fn default_opacity() -> f64 {
    100.0
}

fn default_double_click() -> bool {
    true
}

fn default_icon_size() -> f64 {
    DEFAULT_ICON_SIZE as f64
}

fn default_top() -> f64 {
    100.0
}

fn default_left() -> f64 {
    100.0
}

fn default_width() -> f64 {
    280.0
}

fn default_height() -> f64 {
    700.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_locked: false,
            opacity_percent: default_opacity(),
            open_with_double_click: default_double_click(),
            icon_size: default_icon_size(),
            top: default_top(),
            left: default_left(),
            width: default_width(),
            height: default_height(),
            run_at_startup: false,
        }
    }
}

impl Settings {
    pub fn set_opacity_percent(&mut self, percent: f64) {
        self.opacity_percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            default_opacity()
        };
    }

    /// Opacity as a 0.0-1.0 factor for renderers
    pub fn opacity(&self) -> f64 {
        (self.opacity_percent / 100.0).clamp(0.0, 1.0)
    }

    pub fn set_icon_size(&mut self, size: f64) {
        self.icon_size = if size.is_finite() {
            size.clamp(16.0, 256.0)
        } else {
            default_icon_size()
        };
    }

    pub fn icon_size_px(&self) -> u32 {
        crate::icons::clamp_icon_size(self.icon_size.round().max(0.0) as u32)
    }

    pub fn open_with_single_click(&self) -> bool {
        !self.open_with_double_click
    }

    pub fn can_drag_window(&self) -> bool {
        !self.is_locked
    }

    /// Whether this click should launch the shortcut under the pointer
    pub fn should_launch(&self, click: ClickKind) -> bool {
        match click {
            ClickKind::Double => self.open_with_double_click,
            ClickKind::Single => self.open_with_single_click(),
        }
    }

    pub fn set_window_geometry(&mut self, left: f64, top: f64, width: f64, height: f64) {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        self.left = finite_or(left, default_left());
        self.top = finite_or(top, default_top());
        self.width = finite_or(width, default_width()).max(1.0);
        self.height = finite_or(height, default_height()).max(1.0);
    }
}

/// Toggle login startup, then record what the OS actually reports
pub fn apply_run_at_startup<R: StartupRegistration + ?Sized>(
    settings: &mut Settings,
    enabled: bool,
    startup: &R,
) -> Result<(), PlatformError> {
    let result = startup.set_startup_enabled(enabled);
    settings.run_at_startup = startup.is_startup_enabled();
    result
}

/// Settings record stored as a pretty-printed JSON object
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/settings.json`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(data_dir()?.join(SETTINGS_FILE)))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Settings, StoreError> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    /// Load settings, falling back to defaults; `run_at_startup` always
    /// reflects the live registration
    pub fn load<R: StartupRegistration + ?Sized>(&self, startup: &R) -> Settings {
        let mut settings = match self.try_load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        };
        settings.run_at_startup = startup.is_startup_enabled();
        settings
    }

    pub fn save(&self, settings: &Settings) {
        if let Err(e) = write_json_pretty(&self.path, settings) {
            log::error!("Failed to save settings: {}", e);
        }
    }
}
