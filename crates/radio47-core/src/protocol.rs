use serde::{Deserialize, Serialize};

use crate::schedule::Show;
use crate::storage::{LikeRequest, NotificationSettingsPatch};

/// Current protocol version.  Bump this when the wire format changes in a
/// breaking way.  Clients check this on connect and can refuse to talk to an
/// incompatible daemon.
pub const PROTOCOL_VERSION: u32 = 1;

/// Messages sent from a UI client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Resolve a stream URL and mark playback started.
    Play,
    Stop,
    ToggleMute,
    /// Like or un-like a show; reminder notifications are rebuilt after.
    ToggleLike { request: LikeRequest },
    /// Flip per-show reminders for a liked show.
    ToggleShowNotifications { id: String },
    /// Merge a partial settings update into the stored record.
    UpdateNotificationSettings { patch: NotificationSettingsPatch },
    GetState,
}

/// Messages sent from the daemon to UI clients (broadcasts)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "broadcast")]
pub enum Broadcast {
    /// Sent immediately on connect: daemon version + full state snapshot.
    Hello {
        protocol_version: u32,
        state: PlayerState,
    },
    State {
        data: PlayerState,
    },
    Log {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Where playback stands from the daemon's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing resolved / explicitly stopped
    Connecting, // probing stream endpoints
    Playing,    // a stream URL is resolved and published
    Error,      // neither endpoint answered
}

/// Full shared playback/schedule state.  `rev` is a monotonically increasing
/// counter incremented every time the state changes.  Clients can use it to
/// detect missed updates and request a resync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerState {
    /// Monotonic revision counter — incremented on every state change.
    #[serde(default)]
    pub rev: u64,
    pub is_playing: bool,
    pub is_muted: bool,
    pub playback_status: PlaybackStatus,
    /// Stream endpoint a player should consume, once resolved.
    pub stream_url: Option<String>,
    /// Show on air right now (synthesized fallback when off schedule).
    pub current_show: Show,
    /// Whether the user has liked the show on air.
    #[serde(default)]
    pub current_show_liked: bool,
    /// The next shows, display-labelled, at most [`crate::schedule::UPCOMING_COUNT`].
    pub upcoming: Vec<Show>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            rev: 0,
            is_playing: false,
            is_muted: false,
            playback_status: PlaybackStatus::Idle,
            stream_url: None,
            current_show: Show::off_studio(),
            current_show_liked: false,
            upcoming: Vec::new(),
        }
    }
}

/// Wrapper for socket communication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Command(Command),
    Broadcast(Broadcast),
}

impl Message {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let len = json.len() as u32;
        let mut result = Vec::with_capacity(4 + json.len());
        result.extend_from_slice(&len.to_be_bytes());
        result.extend_from_slice(&json);
        Ok(result)
    }

    pub fn decode(data: &[u8]) -> anyhow::Result<(Self, usize)> {
        if data.len() < 4 {
            anyhow::bail!("Insufficient data for length header");
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if data.len() < 4 + len {
            anyhow::bail!("Insufficient data for message");
        }
        let msg: Self = serde_json::from_slice(&data[4..4 + len])?;
        Ok((msg, 4 + len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Show;

    #[test]
    fn test_command_encode_decode() {
        let show = Show::new("A", "Host A", "04:00 - 06:00", "Weekdays", "");
        let msg = Message::Command(Command::ToggleLike {
            request: LikeRequest::Create { show },
        });
        let encoded = msg.encode().unwrap();
        let (decoded, len) = Message::decode(&encoded).unwrap();
        assert_eq!(len, encoded.len());
        match decoded {
            Message::Command(Command::ToggleLike { request }) => {
                assert_eq!(request.id(), "A-04:00 - 06:00");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_hello_encode_decode() {
        let state = PlayerState {
            rev: 42,
            ..Default::default()
        };
        let msg = Message::Broadcast(Broadcast::Hello {
            protocol_version: PROTOCOL_VERSION,
            state,
        });
        let encoded = msg.encode().unwrap();
        let (decoded, _) = Message::decode(&encoded).unwrap();
        match decoded {
            Message::Broadcast(Broadcast::Hello {
                protocol_version,
                state,
            }) => {
                assert_eq!(protocol_version, PROTOCOL_VERSION);
                assert_eq!(state.rev, 42);
                assert_eq!(state.current_show.name, "Off Studio");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_partial_frame_is_rejected() {
        let msg = Message::Command(Command::GetState);
        let encoded = msg.encode().unwrap();
        assert!(Message::decode(&encoded[..encoded.len() - 1]).is_err());
        assert!(Message::decode(&encoded[..2]).is_err());
    }
}
