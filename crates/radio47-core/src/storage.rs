//! On-device persistence for user likes and notification preferences.
//!
//! Two JSON records under the app data dir: the liked-show list and the
//! global notification settings. Every operation is read-modify-write with
//! last-write-wins semantics, and every failure degrades to a safe default
//! (empty list, default settings, `false`) instead of propagating — a
//! client must always get a usable value back.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, warn};

use crate::platform;
use crate::schedule::Show;

pub const LIKED_SHOWS_FILE: &str = "liked_shows.json";
pub const NOTIFICATION_SETTINGS_FILE: &str = "notification_settings.json";

/// Stable identity for a logically-distinct show instance.
pub fn derived_show_id(name: &str, time: &str) -> String {
    format!("{}-{}", name, time)
}

/// A show the user marked as favorite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikedShow {
    pub id: String,
    pub name: String,
    pub host: String,
    pub time: String,
    pub days: String,
    #[serde(default)]
    pub image: String,
    /// Creation timestamp, epoch milliseconds. Display order is most
    /// recent first; the stored order is insertion order.
    pub liked_at: i64,
    /// Records written before this flag existed deserialize as enabled.
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

/// Like-toggle input. The id is always derived from `"<name>-<time>"`
/// except on the update path, where the caller already holds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LikeRequest {
    Create { show: Show },
    Update { id: String, show: Show },
}

impl LikeRequest {
    pub fn id(&self) -> String {
        match self {
            LikeRequest::Create { show } => derived_show_id(&show.name, &show.time),
            LikeRequest::Update { id, .. } => id.clone(),
        }
    }

    pub fn show(&self) -> &Show {
        match self {
            LikeRequest::Create { show } => show,
            LikeRequest::Update { show, .. } => show,
        }
    }
}

/// Global notification preferences. Absent fields and an absent record both
/// mean "on".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub upcoming_shows: bool,
    #[serde(default = "default_true")]
    pub new_content: bool,
    #[serde(default = "default_true")]
    pub special_events: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            upcoming_shows: true,
            new_content: true,
            special_events: true,
        }
    }
}

/// Partial settings update; unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettingsPatch {
    pub upcoming_shows: Option<bool>,
    pub new_content: Option<bool>,
    pub special_events: Option<bool>,
}

impl NotificationSettings {
    pub fn apply(&mut self, patch: &NotificationSettingsPatch) {
        if let Some(v) = patch.upcoming_shows {
            self.upcoming_shows = v;
        }
        if let Some(v) = patch.new_content {
            self.new_content = v;
        }
        if let Some(v) = patch.special_events {
            self.special_events = v;
        }
    }
}

fn default_true() -> bool {
    true
}

/// Repository over the two persisted records. Cheap to clone around tasks.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn open_default() -> Self {
        Self::new(platform::data_dir())
    }

    fn liked_shows_path(&self) -> PathBuf {
        self.data_dir.join(LIKED_SHOWS_FILE)
    }

    fn settings_path(&self) -> PathBuf {
        self.data_dir.join(NOTIFICATION_SETTINGS_FILE)
    }

    /// All liked shows in storage (insertion) order. Callers sort by
    /// `liked_at` descending for display.
    pub async fn liked_shows(&self) -> Vec<LikedShow> {
        self.read_json(&self.liked_shows_path()).await.unwrap_or_default()
    }

    /// Like or un-like a show. Returns the resulting membership: `true`
    /// when the show is now liked. Storage failures log and return `false`.
    pub async fn toggle_like(&self, request: LikeRequest) -> bool {
        let id = request.id();
        let mut shows = self.liked_shows().await;

        let was_liked = shows.iter().any(|s| s.id == id);
        if was_liked {
            shows.retain(|s| s.id != id);
        } else {
            let show = request.show();
            shows.push(LikedShow {
                id: id.clone(),
                name: show.name.clone(),
                host: show.host.clone(),
                time: show.time.clone(),
                days: show.days.clone(),
                image: show.image.clone(),
                liked_at: chrono::Utc::now().timestamp_millis(),
                notifications_enabled: true,
            });
        }

        if let Err(e) = self.write_json(&self.liked_shows_path(), &shows).await {
            error!("failed to persist liked shows: {}", e);
            return false;
        }
        !was_liked
    }

    pub async fn is_show_liked(&self, name: &str, time: &str) -> bool {
        let id = derived_show_id(name, time);
        self.liked_shows().await.iter().any(|s| s.id == id)
    }

    /// Flip per-show reminders. Returns the new flag value, or `false`
    /// (leaving storage untouched) when the id is unknown.
    pub async fn toggle_show_notifications(&self, id: &str) -> bool {
        let mut shows = self.liked_shows().await;

        let Some(show) = shows.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        show.notifications_enabled = !show.notifications_enabled;
        let enabled = show.notifications_enabled;

        if let Err(e) = self.write_json(&self.liked_shows_path(), &shows).await {
            error!("failed to persist liked shows: {}", e);
            return false;
        }
        enabled
    }

    /// Current settings; defaults materialize when the record is absent or
    /// unreadable.
    pub async fn notification_settings(&self) -> NotificationSettings {
        self.read_json(&self.settings_path()).await.unwrap_or_default()
    }

    /// Merge-write the settings record. Returns `false` on storage failure.
    pub async fn update_notification_settings(&self, patch: &NotificationSettingsPatch) -> bool {
        let mut settings = self.notification_settings().await;
        settings.apply(patch);

        if let Err(e) = self.write_json(&self.settings_path(), &settings).await {
            error!("failed to persist notification settings: {}", e);
            return false;
        }
        true
    }

    async fn read_json<T: serde::de::DeserializeOwned>(&self, path: &PathBuf) -> Option<T> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("failed to read {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("failed to parse {:?}: {}", path, e);
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, path: &PathBuf, value: &T) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let json = serde_json::to_string_pretty(value)?;
        // Write-then-rename so a crash never leaves a half-written record
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Show;

    fn show_a() -> Show {
        Show::new("A", "Host A", "04:00 - 06:00", "Weekdays", "")
    }

    fn temp_storage() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        (dir, storage)
    }

    #[tokio::test]
    async fn test_toggle_like_round_trip() {
        let (_dir, storage) = temp_storage();

        assert!(storage.toggle_like(LikeRequest::Create { show: show_a() }).await);
        assert!(storage.is_show_liked("A", "04:00 - 06:00").await);

        let shows = storage.liked_shows().await;
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].id, "A-04:00 - 06:00");
        assert!(shows[0].notifications_enabled);
        assert!(shows[0].liked_at > 0);

        // Toggling again is the inverse, keyed by the same derived id
        assert!(!storage.toggle_like(LikeRequest::Create { show: show_a() }).await);
        assert!(!storage.is_show_liked("A", "04:00 - 06:00").await);
        assert!(storage.liked_shows().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_like_update_path_uses_supplied_id() {
        let (_dir, storage) = temp_storage();

        let request = LikeRequest::Update {
            id: "A-04:00 - 06:00".to_string(),
            show: show_a(),
        };
        assert!(storage.toggle_like(request.clone()).await);
        assert!(storage.is_show_liked("A", "04:00 - 06:00").await);
        assert!(!storage.toggle_like(request).await);
    }

    #[tokio::test]
    async fn test_storage_order_is_insertion_order() {
        let (_dir, storage) = temp_storage();

        storage.toggle_like(LikeRequest::Create { show: show_a() }).await;
        let show_b = Show::new("B", "Host B", "06:00 - 10:00", "Weekdays", "");
        storage.toggle_like(LikeRequest::Create { show: show_b }).await;

        let shows = storage.liked_shows().await;
        assert_eq!(shows[0].name, "A");
        assert_eq!(shows[1].name, "B");
    }

    #[tokio::test]
    async fn test_toggle_show_notifications() {
        let (_dir, storage) = temp_storage();
        storage.toggle_like(LikeRequest::Create { show: show_a() }).await;

        assert!(!storage.toggle_show_notifications("A-04:00 - 06:00").await);
        assert!(storage.toggle_show_notifications("A-04:00 - 06:00").await);
    }

    #[tokio::test]
    async fn test_toggle_show_notifications_unknown_id() {
        let (_dir, storage) = temp_storage();
        storage.toggle_like(LikeRequest::Create { show: show_a() }).await;
        let before = storage.liked_shows().await;

        assert!(!storage.toggle_show_notifications("nope").await);
        assert_eq!(storage.liked_shows().await, before);
    }

    #[tokio::test]
    async fn test_settings_default_all_on() {
        let (_dir, storage) = temp_storage();
        assert_eq!(
            storage.notification_settings().await,
            NotificationSettings::default()
        );
    }

    #[tokio::test]
    async fn test_settings_partial_update_preserves_others() {
        let (_dir, storage) = temp_storage();

        let patch = NotificationSettingsPatch {
            upcoming_shows: Some(false),
            ..Default::default()
        };
        assert!(storage.update_notification_settings(&patch).await);

        let settings = storage.notification_settings().await;
        assert!(!settings.upcoming_shows);
        assert!(settings.new_content);
        assert!(settings.special_events);
    }

    #[tokio::test]
    async fn test_corrupt_records_degrade_to_defaults() {
        let (dir, storage) = temp_storage();
        std::fs::write(dir.path().join(LIKED_SHOWS_FILE), "not json").unwrap();
        std::fs::write(dir.path().join(NOTIFICATION_SETTINGS_FILE), "{]").unwrap();

        assert!(storage.liked_shows().await.is_empty());
        assert_eq!(
            storage.notification_settings().await,
            NotificationSettings::default()
        );
    }

    #[tokio::test]
    async fn test_legacy_record_without_flag_deserializes_enabled() {
        let (dir, storage) = temp_storage();
        let legacy = r#"[{
            "id": "A-04:00 - 06:00",
            "name": "A",
            "host": "Host A",
            "time": "04:00 - 06:00",
            "days": "Weekdays",
            "liked_at": 1700000000000
        }]"#;
        std::fs::write(dir.path().join(LIKED_SHOWS_FILE), legacy).unwrap();

        let shows = storage.liked_shows().await;
        assert_eq!(shows.len(), 1);
        assert!(shows[0].notifications_enabled);
        assert_eq!(shows[0].image, "");
    }

    #[tokio::test]
    async fn test_unliking_one_show_keeps_the_rest() {
        let (_dir, storage) = temp_storage();
        storage.toggle_like(LikeRequest::Create { show: show_a() }).await;
        let show_b = Show::new("B", "Host B", "06:00 - 10:00", "Weekdays", "");
        storage.toggle_like(LikeRequest::Create { show: show_b }).await;

        storage.toggle_like(LikeRequest::Create { show: show_a() }).await;

        let shows = storage.liked_shows().await;
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].name, "B");
    }
}
