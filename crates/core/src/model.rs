//! Drawers and the shortcuts they hold

use crate::icons::Icon;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for a shortcut. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    pub fn next() -> Self {
        Self(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::next()
    }
}

/// A launchable target inside a drawer. Field names on disk are PascalCase,
/// the lower-case spellings are still accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShortcutItem {
    #[serde(skip)]
    pub id: ItemId,
    /// Display name (stem of the file that was dropped)
    #[serde(alias = "name")]
    pub name: String,
    /// Resolved target path
    #[serde(alias = "path")]
    pub path: String,
    /// Arguments taken from the link file, if any
    #[serde(default, alias = "arguments", skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
    #[serde(skip)]
    pub icon: Option<Icon>,
    #[serde(skip)]
    pub is_editing: bool,
}

impl ShortcutItem {
    pub fn new(name: impl Into<String>, path: impl Into<String>, arguments: Option<String>) -> Self {
        Self {
            id: ItemId::next(),
            name: name.into(),
            path: path.into(),
            arguments,
            icon: None,
            is_editing: false,
        }
    }

    /// Path comparison used for duplicate detection
    pub fn same_path(&self, path: &str) -> bool {
        self.path.to_lowercase() == path.to_lowercase()
    }
}

/// A named, ordered group of shortcuts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Drawer {
    #[serde(alias = "name")]
    pub name: String,
    #[serde(default, alias = "items")]
    pub items: Vec<ShortcutItem>,
    #[serde(default = "default_expanded", alias = "is_expanded")]
    pub is_expanded: bool,
    #[serde(skip)]
    pub is_editing: bool,
}

fn default_expanded() -> bool {
    true
}

impl Drawer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
            is_expanded: default_expanded(),
            is_editing: false,
        }
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.items.iter().any(|item| item.same_path(path))
    }
}

/// What a successful mutation changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    DrawerAdded { index: usize },
    DrawerRemoved { index: usize },
    DrawerMoved { from: usize, to: usize },
    DrawerRenamed { index: usize },
    DrawerExpanded { index: usize, expanded: bool },
    ShortcutAdded { drawer: usize, index: usize, id: ItemId },
    ShortcutRemoved { drawer: usize, index: usize, id: ItemId },
    ShortcutMoved { from_drawer: usize, from_index: usize, to_drawer: usize, to_index: usize, id: ItemId },
    ShortcutRenamed { id: ItemId },
}

impl ChangeEvent {
    /// Inserts, removals and reorders at either level
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ChangeEvent::DrawerAdded { .. }
                | ChangeEvent::DrawerRemoved { .. }
                | ChangeEvent::DrawerMoved { .. }
                | ChangeEvent::ShortcutAdded { .. }
                | ChangeEvent::ShortcutRemoved { .. }
                | ChangeEvent::ShortcutMoved { .. }
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawerError {
    #[error("drawer name is blank")]
    BlankName,
    #[error("a drawer named '{0}' already exists")]
    DuplicateDrawer(String),
    #[error("'{name}' already exists in drawer '{drawer}'")]
    DuplicateShortcut { name: String, drawer: String },
    #[error("shortcut has no target path")]
    EmptyPath,
    #[error("no drawer at index {0}")]
    NoSuchDrawer(usize),
}

/// Something that can be put into edit mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Drawer(usize),
    Shortcut(ItemId),
}

/// The in-memory drawer forest (always exactly two levels)
#[derive(Debug, Clone, Default)]
pub struct DrawerCollection {
    drawers: Vec<Drawer>,
}

impl DrawerCollection {
    pub fn new(drawers: Vec<Drawer>) -> Self {
        Self { drawers }
    }

    pub fn drawers(&self) -> &[Drawer] {
        &self.drawers
    }

    pub fn len(&self) -> usize {
        self.drawers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Drawer> {
        self.drawers.get(index)
    }

    /// Case-insensitive name lookup
    pub fn drawer_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.drawers
            .iter()
            .position(|d| d.name.to_lowercase() == wanted)
    }

    pub fn iter_items(&self) -> impl Iterator<Item = &ShortcutItem> {
        self.drawers.iter().flat_map(|d| d.items.iter())
    }

    /// (drawer index, item index) of a shortcut
    pub fn locate(&self, id: ItemId) -> Option<(usize, usize)> {
        self.drawers.iter().enumerate().find_map(|(d, drawer)| {
            drawer
                .items
                .iter()
                .position(|item| item.id == id)
                .map(|i| (d, i))
        })
    }

    pub fn find_item(&self, id: ItemId) -> Option<&ShortcutItem> {
        self.iter_items().find(|item| item.id == id)
    }

    pub fn find_item_mut(&mut self, id: ItemId) -> Option<&mut ShortcutItem> {
        self.drawers
            .iter_mut()
            .flat_map(|d| d.items.iter_mut())
            .find(|item| item.id == id)
    }

    pub fn add_drawer(&mut self, name: &str) -> Result<ChangeEvent, DrawerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DrawerError::BlankName);
        }
        if self.drawer_index(name).is_some() {
            return Err(DrawerError::DuplicateDrawer(name.to_string()));
        }
        self.drawers.push(Drawer::new(name));
        Ok(ChangeEvent::DrawerAdded {
            index: self.drawers.len() - 1,
        })
    }

    pub fn remove_drawer(&mut self, index: usize) -> Option<(Drawer, ChangeEvent)> {
        if index >= self.drawers.len() {
            return None;
        }
        let drawer = self.drawers.remove(index);
        Some((drawer, ChangeEvent::DrawerRemoved { index }))
    }

    pub fn add_shortcut(
        &mut self,
        drawer: usize,
        item: ShortcutItem,
    ) -> Result<ChangeEvent, DrawerError> {
        if item.path.trim().is_empty() {
            return Err(DrawerError::EmptyPath);
        }
        let target = self
            .drawers
            .get_mut(drawer)
            .ok_or(DrawerError::NoSuchDrawer(drawer))?;
        if target.contains_path(&item.path) {
            return Err(DrawerError::DuplicateShortcut {
                name: item.name,
                drawer: target.name.clone(),
            });
        }
        let id = item.id;
        target.items.push(item);
        Ok(ChangeEvent::ShortcutAdded {
            drawer,
            index: target.items.len() - 1,
            id,
        })
    }

    /// Removes the shortcut from the first drawer that holds it
    pub fn remove_shortcut(&mut self, id: ItemId) -> Option<(ShortcutItem, ChangeEvent)> {
        for (d, drawer) in self.drawers.iter_mut().enumerate() {
            if let Some(index) = drawer.items.iter().position(|item| item.id == id) {
                let item = drawer.items.remove(index);
                return Some((
                    item,
                    ChangeEvent::ShortcutRemoved {
                        drawer: d,
                        index,
                        id,
                    },
                ));
            }
        }
        None
    }

    pub fn move_drawer(&mut self, from: usize, to: usize) -> Option<ChangeEvent> {
        let to = move_within(&mut self.drawers, from, to)?;
        Some(ChangeEvent::DrawerMoved { from, to })
    }

    /// Moves a shortcut between (or within) drawers. `to_index` is the insert
    /// position as seen before the item was taken out.
    pub fn move_shortcut(
        &mut self,
        from_drawer: usize,
        from_index: usize,
        to_drawer: usize,
        to_index: usize,
    ) -> Option<ChangeEvent> {
        if to_drawer >= self.drawers.len() {
            return None;
        }
        if from_drawer == to_drawer {
            let items = &mut self.drawers.get_mut(from_drawer)?.items;
            let id = items.get(from_index)?.id;
            let to = move_within(items, from_index, to_index)?;
            return Some(ChangeEvent::ShortcutMoved {
                from_drawer,
                from_index,
                to_drawer,
                to_index: to,
                id,
            });
        }

        let source = &mut self.drawers.get_mut(from_drawer)?.items;
        if from_index >= source.len() {
            return None;
        }
        let item = source.remove(from_index);
        let id = item.id;
        let dest = &mut self.drawers[to_drawer].items;
        let to = to_index.min(dest.len());
        dest.insert(to, item);
        Some(ChangeEvent::ShortcutMoved {
            from_drawer,
            from_index,
            to_drawer,
            to_index: to,
            id,
        })
    }

    pub fn rename_drawer(&mut self, index: usize, name: &str) -> Result<ChangeEvent, DrawerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DrawerError::BlankName);
        }
        if matches!(self.drawer_index(name), Some(other) if other != index) {
            return Err(DrawerError::DuplicateDrawer(name.to_string()));
        }
        let drawer = self
            .drawers
            .get_mut(index)
            .ok_or(DrawerError::NoSuchDrawer(index))?;
        drawer.name = name.to_string();
        Ok(ChangeEvent::DrawerRenamed { index })
    }

    pub fn rename_shortcut(&mut self, id: ItemId, name: &str) -> Option<ChangeEvent> {
        let item = self.find_item_mut(id)?;
        item.name = name.to_string();
        Some(ChangeEvent::ShortcutRenamed { id })
    }

    pub fn set_expanded(&mut self, index: usize, expanded: bool) -> Option<ChangeEvent> {
        let drawer = self.drawers.get_mut(index)?;
        if drawer.is_expanded == expanded {
            return None;
        }
        drawer.is_expanded = expanded;
        Some(ChangeEvent::DrawerExpanded { index, expanded })
    }

    /// Returns false when the target does not exist
    pub fn set_editing(&mut self, target: EditTarget, editing: bool) -> bool {
        match target {
            EditTarget::Drawer(index) => match self.drawers.get_mut(index) {
                Some(drawer) => {
                    drawer.is_editing = editing;
                    true
                }
                None => false,
            },
            EditTarget::Shortcut(id) => match self.find_item_mut(id) {
                Some(item) => {
                    item.is_editing = editing;
                    true
                }
                None => false,
            },
        }
    }
}

/// Moves `items[from]` so that it lands where `to` pointed before removal.
///
/// Returns the final index, or `None` when nothing moved.
pub fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) -> Option<usize> {
    if from >= items.len() {
        return None;
    }
    let mut to = to.min(items.len());
    if from < to {
        to -= 1;
    }
    if from == to {
        return None;
    }
    let item = items.remove(from);
    items.insert(to, item);
    Some(to)
}
