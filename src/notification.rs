//! User-visible notifications.
//!
//! Failures are surfaced to the user as non-fatal notifications instead of
//! being swallowed into a log file.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl Notification {
    pub fn new(message: impl Into<String>, level: NotificationLevel, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            message: message.into(),
            level,
            created_at: now,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn time_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// Collects notifications and drops them as they expire.
#[derive(Debug)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
    default_duration: Duration,
}

impl NotificationManager {
    #[must_use]
    pub fn new(default_duration: Duration) -> Self {
        Self {
            notifications: Vec::new(),
            default_duration,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, level: NotificationLevel) {
        self.notifications
            .push(Notification::new(message, level, self.default_duration));
    }

    /// Drop expired notifications.
    pub fn prune(&mut self) {
        self.notifications.retain(|n| !n.is_expired());
    }

    /// Notifications that have not expired yet, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.is_expired())
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_notifications_are_active() {
        let mut manager = NotificationManager::new(Duration::from_secs(60));
        manager.push("could not render page", NotificationLevel::Error);
        manager.push("loaded", NotificationLevel::Info);

        let active: Vec<_> = manager.active().collect();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].message, "could not render page");
        assert_eq!(active[0].level, NotificationLevel::Error);
    }

    #[test]
    fn expired_notifications_are_pruned() {
        let mut manager = NotificationManager::new(Duration::ZERO);
        manager.push("gone already", NotificationLevel::Warning);

        assert_eq!(manager.active().count(), 0);
        manager.prune();
        assert!(manager.is_empty());
    }

    #[test]
    fn level_labels() {
        assert_eq!(NotificationLevel::Error.to_string(), "error");
        assert_eq!(NotificationLevel::Warning.to_string(), "warning");
        assert_eq!(NotificationLevel::Info.to_string(), "info");
    }
}
