//! HTTP surface for UI clients that prefer request/response over the
//! socket. Reads resolve against the live wall clock on every call;
//! mutations share the storage paths with the command loop and poke the
//! event channel so reminders get rebuilt by the single owner.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Datelike, Local};
use radio47_core::protocol::Command;
use radio47_core::schedule::{self, Schedule, UPCOMING_COUNT};
use radio47_core::state::StateManager;
use radio47_core::storage::{LikeRequest, LikedShow, NotificationSettingsPatch, Storage};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::core::DaemonEvent;

pub struct HttpContext {
    pub schedule: Schedule,
    pub storage: Storage,
    pub state_manager: Arc<StateManager>,
    pub event_tx: mpsc::Sender<DaemonEvent>,
    pub video_url: String,
}

pub fn start_server(
    bind_address: String,
    port: u16,
    ctx: Arc<HttpContext>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = Router::new()
            .route("/api/state", get(get_state))
            .route("/api/stream", get(get_stream_info))
            .route("/api/schedule", get(get_schedule))
            .route("/api/schedule/current", get(get_current_show))
            .route("/api/schedule/upcoming", get(get_upcoming_shows))
            .route("/api/likes", get(get_liked_shows))
            .route("/api/likes/toggle", post(toggle_like))
            .route(
                "/api/likes/:id/notifications/toggle",
                post(toggle_show_notifications),
            )
            .route(
                "/api/settings/notifications",
                get(get_notification_settings).post(update_notification_settings),
            )
            .route("/api/playback/play", post(play))
            .route("/api/playback/stop", post(stop))
            .route("/api/playback/mute", post(toggle_mute))
            .layer(CorsLayer::permissive())
            .with_state(ctx);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match tokio::net::TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP API {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API listening at {}", addr);
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

async fn get_state(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    Json(ctx.state_manager.get_state().await)
}

async fn get_stream_info(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    Json(serde_json::json!({ "video_url": ctx.video_url }))
}

async fn get_schedule(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    Json(ctx.schedule.clone())
}

async fn get_current_show(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    let now = Local::now();
    let shows = ctx.schedule.shows_for(now.weekday());
    Json(schedule::current_show(shows, now.time()))
}

async fn get_upcoming_shows(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    let now = Local::now();
    let shows = ctx.schedule.shows_for(now.weekday());
    Json(schedule::upcoming_shows(shows, now.time(), UPCOMING_COUNT))
}

#[derive(Debug, Serialize)]
struct LikedShowView {
    #[serde(flatten)]
    show: LikedShow,
    /// Label for the next airing ("in 2h 15m"); absent when the stored
    /// window no longer parses.
    next_start: Option<String>,
}

// Storage order; display sorting (liked_at desc) is the client's business
async fn get_liked_shows(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    let now = Local::now().time();
    let views: Vec<LikedShowView> = ctx
        .storage
        .liked_shows()
        .await
        .into_iter()
        .map(|show| {
            let next_start = schedule::time_until_start(&show.time, now);
            LikedShowView { show, next_start }
        })
        .collect();
    Json(views)
}

async fn toggle_like(
    State(ctx): State<Arc<HttpContext>>,
    Json(request): Json<LikeRequest>,
) -> impl IntoResponse {
    if request.show().is_off_studio() {
        return (StatusCode::BAD_REQUEST, "off-studio filler cannot be liked").into_response();
    }

    let liked = ctx.storage.toggle_like(request).await;
    let _ = ctx.event_tx.send(DaemonEvent::RemindersStale).await;
    Json(serde_json::json!({ "liked": liked })).into_response()
}

async fn toggle_show_notifications(
    State(ctx): State<Arc<HttpContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let enabled = ctx.storage.toggle_show_notifications(&id).await;
    let _ = ctx.event_tx.send(DaemonEvent::RemindersStale).await;
    Json(serde_json::json!({ "enabled": enabled }))
}

async fn get_notification_settings(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    Json(ctx.storage.notification_settings().await)
}

async fn update_notification_settings(
    State(ctx): State<Arc<HttpContext>>,
    Json(patch): Json<NotificationSettingsPatch>,
) -> impl IntoResponse {
    let touches_reminders = patch.upcoming_shows.is_some();
    ctx.storage.update_notification_settings(&patch).await;
    if touches_reminders {
        let _ = ctx.event_tx.send(DaemonEvent::RemindersStale).await;
    }
    Json(ctx.storage.notification_settings().await)
}

async fn play(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    send_command(&ctx, Command::Play).await
}

async fn stop(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    send_command(&ctx, Command::Stop).await
}

async fn toggle_mute(State(ctx): State<Arc<HttpContext>>) -> impl IntoResponse {
    send_command(&ctx, Command::ToggleMute).await
}

async fn send_command(ctx: &HttpContext, command: Command) -> axum::response::Response {
    if ctx
        .event_tx
        .send(DaemonEvent::ClientCommand(command))
        .await
        .is_err()
    {
        return (StatusCode::SERVICE_UNAVAILABLE, "daemon shutting down").into_response();
    }
    StatusCode::ACCEPTED.into_response()
}
