//! User-facing notices and confirmations

use std::fmt;
use std::rc::Rc;

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    DuplicateShortcut { name: String, drawer: String },
    DuplicateDrawer { name: String },
    TargetMissing { path: String },
    LaunchFailed { path: String, reason: String },
    StartupFailed { reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DuplicateShortcut { name, drawer } => {
                write!(f, "'{}' is already in drawer '{}'", name, drawer)
            }
            Notice::DuplicateDrawer { name } => {
                write!(f, "A drawer named '{}' already exists", name)
            }
            Notice::TargetMissing { path } => write!(f, "Target not found: {}", path),
            Notice::LaunchFailed { path, reason } => {
                write!(f, "Could not open {}: {}", path, reason)
            }
            Notice::StartupFailed { reason } => {
                write!(f, "Could not change startup setting: {}", reason)
            }
        }
    }
}

/// Boundary to whatever surface talks to the user
pub trait Prompt {
    fn notify(&self, notice: &Notice);

    /// Yes/no question; `false` means leave things as they are
    fn confirm(&self, question: &str) -> bool;
}

impl<T: Prompt + ?Sized> Prompt for Rc<T> {
    fn notify(&self, notice: &Notice) {
        (**self).notify(notice)
    }

    fn confirm(&self, question: &str) -> bool {
        (**self).confirm(question)
    }
}
