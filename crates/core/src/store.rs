//! Whole-document JSON persistence for the drawer collection

use crate::model::Drawer;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

const DATA_FILE: &str = "data.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Application data directory, created on first use
pub fn data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("com", "drawer", "drawer")
        .context("Failed to determine data directory")?;
    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;
    Ok(data_dir.to_path_buf())
}

/// Read a JSON document; `Ok(None)` when the file does not exist
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print to a sibling temp file, then rename over the target
pub(crate) fn write_json_pretty<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        io_err(source)
    })
}

/// Load/save of the full drawer collection. Never fails towards the caller.
pub trait DrawerStore {
    fn load(&self) -> Vec<Drawer>;

    fn save(&self, drawers: &[Drawer]);
}

impl<T: DrawerStore + ?Sized> DrawerStore for Rc<T> {
    fn load(&self) -> Vec<Drawer> {
        (**self).load()
    }

    fn save(&self, drawers: &[Drawer]) {
        (**self).save(drawers)
    }
}

/// Drawer collection stored as a pretty-printed JSON array
pub struct JsonDrawerStore {
    path: PathBuf,
}

impl JsonDrawerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/data.json`
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(data_dir()?.join(DATA_FILE)))
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DATA_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn try_load(&self) -> Result<Vec<Drawer>, StoreError> {
        // A literal `null` document is treated like an empty one
        let drawers: Option<Option<Vec<Drawer>>> = read_json(&self.path)?;
        Ok(drawers.flatten().unwrap_or_default())
    }

    pub fn try_save(&self, drawers: &[Drawer]) -> Result<(), StoreError> {
        write_json_pretty(&self.path, drawers)
    }
}

impl DrawerStore for JsonDrawerStore {
    fn load(&self) -> Vec<Drawer> {
        match self.try_load() {
            Ok(drawers) => {
                log::info!("Loaded {} drawers from {:?}", drawers.len(), self.path);
                drawers
            }
            Err(e) => {
                log::warn!("Failed to load drawers, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    fn save(&self, drawers: &[Drawer]) {
        match self.try_save(drawers) {
            Ok(()) => log::debug!("Saved {} drawers to {:?}", drawers.len(), self.path),
            Err(e) => log::error!("Failed to save drawers: {}", e),
        }
    }
}
