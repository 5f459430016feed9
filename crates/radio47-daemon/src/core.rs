//! Daemon core: single owner of player state and every side effect. All
//! external inputs (socket commands, HTTP mutations, the schedule tick)
//! funnel into one event loop, so persistence and notification rebuilds
//! never race each other.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local};
use radio47_core::config::Config;
use radio47_core::notify::Notifier;
use radio47_core::protocol::Command;
use radio47_core::schedule::{self, Schedule, UPCOMING_COUNT};
use radio47_core::state::StateManager;
use radio47_core::storage::Storage;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::notifier::DesktopNotifier;
use crate::scheduler::ReminderScheduler;
use crate::stream;
use crate::BroadcastMessage;

/// Schedule resolution is wall-clock driven, so it is re-run on a timer.
/// One minute of staleness is acceptable; the windows are hours wide.
pub const SCHEDULE_REFRESH_SECS: u64 = 60;

#[derive(Debug)]
pub enum DaemonEvent {
    ClientCommand(Command),
    ClientConnected,
    /// Likes or settings were mutated outside the command path (HTTP);
    /// reminders and the schedule view must be re-derived.
    RemindersStale,
}

pub struct DaemonCore {
    config: Config,
    schedule: Schedule,
    storage: Storage,
    state_manager: Arc<StateManager>,
    reminders: ReminderScheduler,
    http_client: reqwest::Client,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

impl DaemonCore {
    pub async fn new(
        config: Config,
        broadcast_tx: broadcast::Sender<BroadcastMessage>,
    ) -> anyhow::Result<Self> {
        let schedule = schedule::load_or_builtin(&config.schedule.schedule_toml);
        let storage = Storage::open_default();
        let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier::new());
        let reminders = ReminderScheduler::new(storage.clone(), notifier);
        let http_client = stream::http_client(config.stream.probe_timeout_secs)?;

        let core = Self {
            config,
            schedule,
            storage,
            state_manager: Arc::new(StateManager::new()),
            reminders,
            http_client,
            broadcast_tx,
        };

        core.refresh_schedule_view().await;
        // Re-arm reminders for whatever was liked before this run
        core.reminders.schedule_show_notifications().await;

        Ok(core)
    }

    pub fn state_manager(&self) -> Arc<StateManager> {
        Arc::clone(&self.state_manager)
    }

    pub fn storage(&self) -> Storage {
        self.storage.clone()
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule.clone()
    }

    pub async fn run(self, mut event_rx: mpsc::Receiver<DaemonEvent>) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(Duration::from_secs(SCHEDULE_REFRESH_SECS));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; the view is already fresh
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_schedule_tick().await;
                }
                event = event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            info!("event channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn handle_event(&self, event: DaemonEvent) {
        match event {
            DaemonEvent::ClientConnected => self.notify_state_changed(),
            DaemonEvent::ClientCommand(command) => self.handle_command(command).await,
            DaemonEvent::RemindersStale => {
                self.reminders.schedule_show_notifications().await;
                if self.refresh_schedule_view().await {
                    self.notify_state_changed();
                }
            }
        }
    }

    async fn handle_command(&self, command: Command) {
        debug!("handling command: {:?}", command);
        match command {
            Command::Play => self.start_playback().await,
            Command::Stop => {
                self.state_manager.set_stopped().await;
                self.refresh_playback_notification().await;
                self.notify_state_changed();
            }
            Command::ToggleMute => {
                self.state_manager.toggle_mute().await;
                self.refresh_playback_notification().await;
                self.notify_state_changed();
            }
            Command::ToggleLike { request } => {
                if request.show().is_off_studio() {
                    debug!("ignoring like for off-studio filler");
                    return;
                }
                let now_liked = self.storage.toggle_like(request).await;
                info!("like toggled, now_liked={}", now_liked);
                self.reminders.schedule_show_notifications().await;
                self.refresh_schedule_view().await;
                self.notify_state_changed();
            }
            Command::ToggleShowNotifications { id } => {
                let enabled = self.storage.toggle_show_notifications(&id).await;
                info!("per-show reminders for {:?}: {}", id, enabled);
                self.reminders.schedule_show_notifications().await;
            }
            Command::UpdateNotificationSettings { patch } => {
                let touches_reminders = patch.upcoming_shows.is_some();
                if !self.storage.update_notification_settings(&patch).await {
                    warn!("settings update not persisted");
                }
                if touches_reminders {
                    self.reminders.schedule_show_notifications().await;
                }
            }
            Command::GetState => self.notify_state_changed(),
        }
    }

    async fn on_schedule_tick(&self) {
        let changed = self.refresh_schedule_view().await;
        if !changed {
            return;
        }
        self.notify_state_changed();

        // Keep the persistent notification naming the show actually on air
        let state = self.state_manager.get_state().await;
        if state.is_playing {
            self.reminders
                .update_playback_notification(
                    true,
                    &state.current_show.name,
                    &state.current_show.host,
                    state.is_muted,
                )
                .await;
        }
    }

    /// Re-resolve today's template against the wall clock. Returns whether
    /// the published view changed at all.
    async fn refresh_schedule_view(&self) -> bool {
        let now = Local::now();
        let shows = self.schedule.shows_for(now.weekday());
        let current = schedule::current_show(shows, now.time());
        let upcoming = schedule::upcoming_shows(shows, now.time(), UPCOMING_COUNT);

        let liked = if current.is_off_studio() {
            false
        } else {
            self.storage.is_show_liked(&current.name, &current.time).await
        };

        let change = self
            .state_manager
            .set_schedule_view(current, liked, upcoming)
            .await;
        change.changed
    }

    async fn start_playback(&self) {
        self.state_manager.set_connecting().await;
        self.notify_state_changed();

        match stream::resolve_stream_url(&self.http_client, &self.config.stream).await {
            Some(url) => {
                info!("stream resolved: {}", url);
                self.state_manager.set_playing(url).await;
            }
            None => {
                warn!("no stream endpoint answered, playback not started");
                self.state_manager.set_stream_error().await;
            }
        }

        self.refresh_playback_notification().await;
        self.notify_state_changed();
    }

    async fn refresh_playback_notification(&self) {
        let state = self.state_manager.get_state().await;
        self.reminders
            .update_playback_notification(
                state.is_playing,
                &state.current_show.name,
                &state.current_show.host,
                state.is_muted,
            )
            .await;
    }

    fn notify_state_changed(&self) {
        // No receivers is fine — nobody is connected yet
        let _ = self.broadcast_tx.send(BroadcastMessage::StateUpdated);
    }
}
