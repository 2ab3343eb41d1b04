//! Player roster entries and their public projection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::{Timestamp, now_millis, random_alphanumeric};

/// Player identifier, unique within a game.
pub type PlayerId = String;

/// Length of generated player ids.
pub const PLAYER_ID_LENGTH: usize = 8;

/// Generate a fresh player id.
pub fn new_player_id() -> PlayerId {
    random_alphanumeric(PLAYER_ID_LENGTH)
}

/// Transport presence of a player.
///
/// `Reconnecting` holds while the grace period runs; `Disconnected` once it
/// has expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Reconnecting,
}

/// Presence bookkeeping for a live connection. Never used for sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub id: String,
    pub connected_at: Timestamp,
    pub last_ping: Timestamp,
}

impl ConnectionInfo {
    pub fn new() -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            connected_at: now,
            last_ping: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_ping = now_millis();
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self::new()
    }
}

/// A player in a game session.
///
/// Owned by the session. Holds the reconnection token, so it must never be
/// serialized to clients directly; use [`PlayerPublic`].
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub session_token: String,
    pub connection_status: ConnectionStatus,
    pub connection_info: Option<ConnectionInfo>,
    pub is_host: bool,
    pub score: i64,
    pub joined_at: Timestamp,
    pub disconnected_at: Option<Timestamp>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, session_token: String) -> Self {
        Self {
            id,
            name,
            session_token,
            connection_status: ConnectionStatus::Connected,
            connection_info: Some(ConnectionInfo::new()),
            is_host: false,
            score: 0,
            joined_at: now_millis(),
            disconnected_at: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
    }

    pub fn to_public(&self) -> PlayerPublic {
        PlayerPublic::from(self)
    }
}

/// What every viewer may see about a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPublic {
    pub id: PlayerId,
    pub name: String,
    pub connection_status: ConnectionStatus,
    pub is_host: bool,
    pub score: i64,
}

impl From<&Player> for PlayerPublic {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            connection_status: player.connection_status,
            is_host: player.is_host,
            score: player.score,
        }
    }
}
