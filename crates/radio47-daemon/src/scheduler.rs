//! Reminder scheduling for liked shows, plus the persistent now-playing
//! notification.
//!
//! Rebuilds are full cancel-then-rearm rather than incremental: every
//! like-toggle, per-show toggle, or upcoming-shows settings change throws
//! away all armed reminders and re-derives them from storage. That is
//! O(liked shows) per toggle, which is the whole catalogue of maybe a dozen
//! entries.

use chrono::{NaiveTime, Timelike};
use radio47_core::notify::{
    NotificationAction, NotificationContent, Notifier, Trigger, CATEGORY_PLAYBACK,
    CATEGORY_UPCOMING_SHOWS,
};
use radio47_core::schedule::parse_window;
use radio47_core::storage::{LikedShow, Storage};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reminders fire this many minutes before a liked show starts.
pub const REMINDER_LEAD_MINUTES: u32 = 15;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Seconds until the next reminder instant for a show window: the lead time
/// before today's start, wrapping to tomorrow when that instant already
/// passed. A wrapped instant that is still behind `now` (possible only
/// right around midnight) clamps to zero and fires immediately.
///
/// `None` when the window does not parse.
pub fn reminder_delay_secs(window: &str, now: NaiveTime) -> Option<u64> {
    let (start, _) = parse_window(window).ok()?;
    let now_secs = now.num_seconds_from_midnight() as i64;

    let mut fire_secs = (start as i64 - REMINDER_LEAD_MINUTES as i64) * 60;
    if fire_secs < now_secs {
        fire_secs += SECONDS_PER_DAY;
    }
    Some((fire_secs - now_secs).max(0) as u64)
}

fn reminder_content(show: &LikedShow) -> NotificationContent {
    let mut content = NotificationContent::new(
        format!("{} starts soon!", show.name),
        format!(
            "Tune in to Radio 47 in {} minutes for {} with {}",
            REMINDER_LEAD_MINUTES, show.name, show.host
        ),
        CATEGORY_UPCOMING_SHOWS,
    );
    content.show_id = Some(show.id.clone());
    content
}

fn coming_up_content(show: &LikedShow) -> NotificationContent {
    let mut content = NotificationContent::new(
        format!("Coming up next: {}", show.name),
        format!("Get ready for {} with {}", show.name, show.host),
        CATEGORY_UPCOMING_SHOWS,
    );
    content.show_id = Some(show.id.clone());
    content
}

fn playback_content(
    show_name: &str,
    host_name: &str,
    is_playing: bool,
    is_muted: bool,
) -> NotificationContent {
    let mut content = NotificationContent::new(
        "Radio 47",
        format!("🎵 Now Playing: {}\n👤 {}", show_name, host_name),
        CATEGORY_PLAYBACK,
    );
    content.sound = false;
    content.sticky = true;
    content.actions = vec![
        NotificationAction {
            id: "play".to_string(),
            label: if is_playing { "⏸ Pause" } else { "▶ Play" }.to_string(),
        },
        NotificationAction {
            id: "mute".to_string(),
            label: if is_muted { "🔊 Unmute" } else { "🔇 Mute" }.to_string(),
        },
    ];
    content
}

pub struct ReminderScheduler {
    storage: Storage,
    notifier: Arc<dyn Notifier>,
}

impl ReminderScheduler {
    pub fn new(storage: Storage, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    /// Cancel everything armed and re-derive reminders from the liked-show
    /// set. Notifier failures stop at this boundary: logged, never
    /// propagated, never user-visible.
    pub async fn schedule_show_notifications(&self) {
        if let Err(e) = self.rebuild(chrono::Local::now().time()).await {
            warn!("reminder rebuild failed: {e:#}");
        }
    }

    async fn rebuild(&self, now: NaiveTime) -> anyhow::Result<()> {
        self.notifier.cancel_all_scheduled().await?;

        let settings = self.storage.notification_settings().await;
        if !settings.upcoming_shows {
            debug!("upcoming-show reminders disabled, leaving none armed");
            return Ok(());
        }

        let liked_shows = self.storage.liked_shows().await;
        if liked_shows.is_empty() {
            return Ok(());
        }

        for show in liked_shows.iter().filter(|s| s.notifications_enabled) {
            let Some(delay) = reminder_delay_secs(&show.time, now) else {
                warn!("liked show {:?} has unusable window {:?}", show.name, show.time);
                continue;
            };

            self.notifier
                .schedule(reminder_content(show), Trigger::AfterSeconds(delay))
                .await?;
            self.notifier
                .schedule(coming_up_content(show), Trigger::Immediate)
                .await?;
        }
        Ok(())
    }

    /// Level-triggered projection of player state onto the persistent
    /// playback notification: take down whatever is showing, then repost
    /// only while audio is actually playing.
    pub async fn update_playback_notification(
        &self,
        is_playing: bool,
        show_name: &str,
        host_name: &str,
        is_muted: bool,
    ) {
        if let Err(e) = self
            .project_playback(is_playing, show_name, host_name, is_muted)
            .await
        {
            warn!("playback notification update failed: {e:#}");
        }
    }

    async fn project_playback(
        &self,
        is_playing: bool,
        show_name: &str,
        host_name: &str,
        is_muted: bool,
    ) -> anyhow::Result<()> {
        self.notifier.dismiss_all().await?;
        if !is_playing {
            return Ok(());
        }
        self.notifier
            .schedule(
                playback_content(show_name, host_name, is_playing, is_muted),
                Trigger::Immediate,
            )
            .await
    }
}
