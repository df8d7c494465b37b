use std::{
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::notify::{Notification, Notifier, Permission};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(6);

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

/// In-window stand-in for OS notifications.
pub struct ToastCenter {
    enabled: bool,
    toasts: Mutex<Vec<Toast>>,
}

impl ToastCenter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            toasts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, notification: Notification, now: Instant) {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tag) = &notification.tag {
            toasts.retain(|t| t.notification.tag.as_ref() != Some(tag));
        }
        toasts.push(Toast {
            notification,
            shown_at: now,
        });
    }

    /// Drops expired toasts and returns the rest, oldest first.
    pub fn visible(&self, now: Instant) -> Vec<Toast> {
        let mut toasts = self.toasts.lock().unwrap_or_else(PoisonError::into_inner);
        toasts.retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_LIFETIME);
        toasts.clone()
    }
}

impl Notifier for ToastCenter {
    fn request_permission(&self) -> Permission {
        if self.enabled {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    fn display(&self, notification: Notification) {
        self.push(notification, Instant::now());
    }
}
