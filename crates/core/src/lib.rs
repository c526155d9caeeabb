//! Core library for the desktop drawer
//!
//! Drawers of shortcuts, their JSON persistence, link resolution, icon loading
//! and the coordinator that ties user commands to debounced saves.

pub mod coordinator;
pub mod debounce;
pub mod dragdrop;
pub mod icons;
pub mod model;
pub mod platform;
pub mod prompt;
pub mod resolver;
pub mod settings;
pub mod store;

pub use coordinator::{AddReport, Coordinator, SAMPLE_DRAWERS};
pub use debounce::{Debouncer, DEFAULT_SAVE_DELAY};
pub use dragdrop::DropPayload;
pub use icons::{Icon, IconImage, IconLoader, IconProvider, TieredIconProvider};
pub use model::{ChangeEvent, Drawer, DrawerCollection, DrawerError, EditTarget, ItemId, ShortcutItem};
pub use platform::{system_shell, PlatformError, PlatformShell, StartupRegistration};
pub use prompt::{Notice, Prompt};
pub use resolver::{Resolution, ShortcutResolver, SystemResolver};
pub use settings::{apply_run_at_startup, ClickKind, Settings, SettingsStore};
pub use store::{data_dir, DrawerStore, JsonDrawerStore, StoreError};
