//! Shared playback-state owner.  One controller (the daemon core) mutates;
//! everything else reads snapshots.  This replaces the ad-hoc "is something
//! playing" global a naive client would keep: other components get a
//! read-only view plus an explicit request-to-pause capability.

use crate::protocol::{PlaybackStatus, PlayerState};
use crate::schedule::Show;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct StateManager {
    state: Arc<RwLock<PlayerState>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(PlayerState::default())),
        }
    }

    pub fn arc(&self) -> Arc<RwLock<PlayerState>> {
        Arc::clone(&self.state)
    }

    pub async fn get_state(&self) -> PlayerState {
        self.state.read().await.clone()
    }

    pub async fn is_playing(&self) -> bool {
        self.state.read().await.is_playing
    }

    pub async fn set_connecting(&self) {
        let mut state = self.state.write().await;
        state.playback_status = PlaybackStatus::Connecting;
        state.rev += 1;
    }

    /// Publish a resolved stream endpoint and mark playback live.
    pub async fn set_playing(&self, stream_url: String) {
        let mut state = self.state.write().await;
        state.is_playing = true;
        state.playback_status = PlaybackStatus::Playing;
        state.stream_url = Some(stream_url);
        state.rev += 1;
    }

    pub async fn set_stopped(&self) {
        let mut state = self.state.write().await;
        state.is_playing = false;
        state.playback_status = PlaybackStatus::Idle;
        state.stream_url = None;
        state.rev += 1;
    }

    /// Stream resolution failed; playback never started.
    pub async fn set_stream_error(&self) {
        let mut state = self.state.write().await;
        state.is_playing = false;
        state.playback_status = PlaybackStatus::Error;
        state.stream_url = None;
        state.rev += 1;
    }

    /// Returns the new mute state.
    pub async fn toggle_mute(&self) -> bool {
        let mut state = self.state.write().await;
        state.is_muted = !state.is_muted;
        state.rev += 1;
        state.is_muted
    }

    /// Ask the owner to stop playback — the capability handed to components
    /// that must not mutate state directly (e.g. a second player starting).
    pub async fn request_pause(&self) -> bool {
        let mut state = self.state.write().await;
        if !state.is_playing {
            return false;
        }
        state.is_playing = false;
        state.playback_status = PlaybackStatus::Idle;
        state.rev += 1;
        true
    }

    /// Refresh the resolved schedule view.  Bumps the revision only when
    /// something actually changed, so the 60-second tick is quiet most of
    /// the time.
    pub async fn set_schedule_view(
        &self,
        current_show: Show,
        current_show_liked: bool,
        upcoming: Vec<Show>,
    ) -> ScheduleViewChange {
        let mut state = self.state.write().await;
        let show_changed = state.current_show != current_show;
        if !show_changed
            && state.current_show_liked == current_show_liked
            && state.upcoming == upcoming
        {
            return ScheduleViewChange {
                changed: false,
                show_changed: false,
            };
        }
        state.current_show = current_show;
        state.current_show_liked = current_show_liked;
        state.upcoming = upcoming;
        state.rev += 1;
        ScheduleViewChange {
            changed: true,
            show_changed,
        }
    }
}

/// What a schedule-view refresh actually touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleViewChange {
    /// Anything in the view differs from before (rev was bumped).
    pub changed: bool,
    /// The on-air show itself changed, not just liked-ness or upcoming.
    pub show_changed: bool,
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rev_bumps_on_change_only() {
        let manager = StateManager::new();
        let rev0 = manager.get_state().await.rev;

        let change = manager
            .set_schedule_view(Show::off_studio(), false, Vec::new())
            .await;
        assert!(!change.changed);
        assert_eq!(manager.get_state().await.rev, rev0);

        let show = Show::new("A", "Host", "04:00 - 06:00", "Weekdays", "");
        let change = manager.set_schedule_view(show.clone(), false, Vec::new()).await;
        assert!(change.changed && change.show_changed);
        assert_eq!(manager.get_state().await.rev, rev0 + 1);

        // Liked-ness flip alone is a change, but not a show change
        let change = manager.set_schedule_view(show, true, Vec::new()).await;
        assert!(change.changed && !change.show_changed);
    }

    #[tokio::test]
    async fn test_request_pause_only_when_playing() {
        let manager = StateManager::new();
        assert!(!manager.request_pause().await);

        manager.set_playing("https://example.test/stream".into()).await;
        assert!(manager.is_playing().await);
        assert!(manager.request_pause().await);
        assert!(!manager.is_playing().await);
    }

    #[tokio::test]
    async fn test_stream_error_clears_url() {
        let manager = StateManager::new();
        manager.set_playing("https://example.test/stream".into()).await;
        manager.set_stream_error().await;

        let state = manager.get_state().await;
        assert_eq!(state.playback_status, PlaybackStatus::Error);
        assert!(state.stream_url.is_none());
        assert!(!state.is_playing);
    }
}
