//! Drop payloads delivered by the UI layer

use std::path::PathBuf;

/// What was dropped, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// A shortcut dragged to a position in the same or another drawer
    Shortcut {
        from_drawer: usize,
        from_index: usize,
        to_drawer: usize,
        to_index: usize,
    },
    /// A drawer header dragged to another position
    Drawer { from_index: usize, to_index: usize },
    /// Files from the system file browser dropped onto a drawer
    Files { paths: Vec<PathBuf>, drawer: usize },
}
