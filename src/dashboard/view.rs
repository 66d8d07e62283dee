//! Dashboard view state: rendered page regions plus a transient notification stack.

use serde::Serialize;
use std::time::{Duration, Instant};

/// How long a notification stays visible unless dismissed earlier.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// The four regions every page action replaces together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Regions {
    pub navbar: String,
    pub page_title: String,
    pub page_actions: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Danger,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: Instant,
}

impl Notification {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) >= NOTIFICATION_TTL
    }
}

#[derive(Debug, Default)]
pub struct ViewState {
    regions: Regions,
    notifications: Vec<Notification>,
    next_id: u64,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regions(&self) -> &Regions {
        &self.regions
    }

    pub fn replace(&mut self, regions: Regions) {
        self.regions = regions;
    }

    /// Replace only the navbar (session changes without a page load).
    pub fn set_navbar(&mut self, navbar: String) {
        self.regions.navbar = navbar;
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        self.notify_at(level, message, Instant::now())
    }

    pub fn notify_at(
        &mut self,
        level: NotificationLevel,
        message: impl Into<String>,
        now: Instant,
    ) -> u64 {
        self.next_id += 1;
        self.notifications.push(Notification {
            id: self.next_id,
            level,
            message: message.into(),
            created_at: now,
        });
        self.next_id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        self.notifications.len() != before
    }

    /// Drop notifications older than [`NOTIFICATION_TTL`].
    pub fn expire(&mut self, now: Instant) {
        self.notifications.retain(|n| !n.is_expired(now));
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }
}
