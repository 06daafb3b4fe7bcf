//! Desktop notifications through the freedesktop notification service.

use crate::error::{Error, Result};
use log::{debug, error};
use notify_rust::{Notification, NotificationHandle};
use std::path::Path;

/// Shows at most one notification at a time on behalf of an icon.
///
/// Showing a new notification replaces the current one in place.
pub struct Notifier {
    app_name: String,
    current: Option<NotificationHandle>,
}

impl Notifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            current: None,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Returns `true` while a notification shown by this notifier is up.
    pub fn is_showing(&self) -> bool {
        self.current.is_some()
    }

    pub fn notify(&mut self, title: &str, message: &str, icon: Option<&Path>) -> Result<()> {
        let mut notification = Notification::new();
        notification
            .appname(&self.app_name)
            .summary(title)
            .body(message);

        if let Some(path) = icon {
            notification.icon(&path.to_string_lossy());
        }
        if let Some(previous) = &self.current {
            notification.id(previous.id());
        }

        let handle = notification.show().map_err(|e| {
            error!("Failed to show notification: {}", e);
            Error::Notification(format!("Failed to show notification: {}", e))
        })?;
        debug!("Showing notification {}", handle.id());
        self.current = Some(handle);
        Ok(())
    }

    /// Withdraws the current notification, if any.
    pub fn hide(&mut self) {
        if let Some(handle) = self.current.take() {
            debug!("Closing notification {}", handle.id());
            handle.close();
        }
    }
}
