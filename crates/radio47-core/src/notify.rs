//! Notification surface shared between the scheduler and the platform
//! notifier: what to show, when to show it, and the seam the daemon plugs a
//! concrete notification service into.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Channel for liked-show reminders.
pub const CATEGORY_UPCOMING_SHOWS: &str = "upcoming-shows";
/// Channel for the persistent now-playing notification.
pub const CATEGORY_PLAYBACK: &str = "playback";

/// A button on a notification, dispatched back by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Opaque payload — the liked show this notification is about, if any.
    pub show_id: Option<String>,
    pub category: String,
    pub sound: bool,
    pub badge: bool,
    /// Persistent notification that stays up until dismissed.
    pub sticky: bool,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
}

impl NotificationContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>, category: &str) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            show_id: None,
            category: category.to_string(),
            sound: true,
            badge: true,
            sticky: false,
            actions: Vec::new(),
        }
    }
}

/// When a notification fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Trigger {
    Immediate,
    AfterSeconds(u64),
}

/// Platform notification service seam. Implementations are best-effort:
/// callers treat every error as log-and-continue, never user-visible.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post now or arm a one-shot delayed notification.
    async fn schedule(&self, content: NotificationContent, trigger: Trigger)
        -> anyhow::Result<()>;

    /// Drop every armed-but-unfired notification.
    async fn cancel_all_scheduled(&self) -> anyhow::Result<()>;

    /// Take down everything currently on screen.
    async fn dismiss_all(&self) -> anyhow::Result<()>;
}
