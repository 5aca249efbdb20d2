//! User-visible ephemeral messages.
//!
//! The engine only emits messages; how they are shown is up to the host.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub duration_ms: u64,
}

/// Notification surface consumed by the store.
pub trait Notifier {
    fn notify(&self, message: &str, kind: NotificationKind, duration_ms: u64);
}

/// Routes notifications into the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind, duration_ms: u64) {
        match kind {
            NotificationKind::Warning | NotificationKind::Error => warn!(%kind, duration_ms, "{message}"),
            NotificationKind::Info | NotificationKind::Success => info!(%kind, duration_ms, "{message}"),
        }
    }
}

/// Keeps every notification. Clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Rc<RefCell<Vec<Notification>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Notification> {
        self.seen.borrow().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.seen.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, kind: NotificationKind, duration_ms: u64) {
        self.seen.borrow_mut().push(Notification { message: message.to_string(), kind, duration_ms });
    }
}
