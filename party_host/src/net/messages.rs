//! JSON wire protocol.
//!
//! Every frame is one JSON object tagged by `type` (`"game:create"`,
//! `"state:update"`, ...). Field names are camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::{GameOverrides, PlayerId, PlayerPublic};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Create a game. With `player_name` the creator joins as host,
    /// otherwise the creator becomes the display.
    #[serde(rename = "game:create", rename_all = "camelCase")]
    CreateGame {
        game_type: String,
        #[serde(default)]
        config: Option<GameOverrides>,
        #[serde(default)]
        player_name: Option<String>,
    },

    #[serde(rename = "game:join", rename_all = "camelCase")]
    JoinGame { code: String, player_name: String },

    #[serde(rename = "game:join-display")]
    JoinDisplay { code: String },

    #[serde(rename = "session:reconnect", rename_all = "camelCase")]
    Reconnect { session_token: String, code: String },

    #[serde(rename = "host:claim")]
    ClaimHost,

    #[serde(rename = "host:start")]
    StartGame,

    #[serde(rename = "host:next-round")]
    NextRound,

    #[serde(rename = "host:end-game")]
    EndGame,

    #[serde(rename = "host:play-again")]
    PlayAgain,

    #[serde(rename = "player:response")]
    Response { response: Value },

    #[serde(rename = "player:action")]
    Action { action: Value },

    #[serde(rename = "ping")]
    Ping,
}

impl ClientMessage {
    /// Wire name of this message, for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::CreateGame { .. } => "game:create",
            ClientMessage::JoinGame { .. } => "game:join",
            ClientMessage::JoinDisplay { .. } => "game:join-display",
            ClientMessage::Reconnect { .. } => "session:reconnect",
            ClientMessage::ClaimHost => "host:claim",
            ClientMessage::StartGame => "host:start",
            ClientMessage::NextRound => "host:next-round",
            ClientMessage::EndGame => "host:end-game",
            ClientMessage::PlayAgain => "host:play-again",
            ClientMessage::Response { .. } => "player:response",
            ClientMessage::Action { .. } => "player:action",
            ClientMessage::Ping => "ping",
        }
    }
}

/// Stable error codes sent in `error` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    GameNotFound,
    GameFull,
    GameAlreadyStarted,
    InvalidSession,
    NotHost,
    NotEnoughPlayers,
    InvalidResponse,
    AlreadyResponded,
    NameTaken,
    InvalidMessage,
    GameTypeNotFound,
    RateLimited,
}

/// Messages the server sends.
///
/// Game states, round payloads and results are already projected and
/// encoded by the engine, so they travel as [`Value`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "game:created", rename_all = "camelCase")]
    GameCreated { code: String, game_type: String },

    #[serde(rename = "game:joined", rename_all = "camelCase")]
    GameJoined {
        session_token: String,
        player_id: PlayerId,
        state: Value,
    },

    #[serde(rename = "display:joined")]
    DisplayJoined { state: Value },

    #[serde(rename = "state:update", rename_all = "camelCase")]
    StateUpdate { state: Value, is_display: bool },

    #[serde(rename = "players:update", rename_all = "camelCase")]
    PlayersUpdate {
        players: Vec<PlayerPublic>,
        host_id: Option<PlayerId>,
    },

    #[serde(rename = "host:changed", rename_all = "camelCase")]
    HostChanged { host_id: PlayerId, host_name: String },

    #[serde(rename = "round:start")]
    RoundStart { round: Value },

    #[serde(rename = "round:end")]
    RoundEnd { results: Value },

    #[serde(rename = "response:received", rename_all = "camelCase")]
    ResponseReceived { player_id: PlayerId },

    #[serde(rename = "game:end")]
    GameEnd { results: Value },

    #[serde(rename = "player:disconnected", rename_all = "camelCase")]
    PlayerDisconnected {
        player_id: PlayerId,
        player_name: String,
    },

    #[serde(rename = "player:reconnected", rename_all = "camelCase")]
    PlayerReconnected {
        player_id: PlayerId,
        player_name: String,
    },

    #[serde(rename = "error")]
    Error { code: ErrorCode, message: String },

    #[serde(rename = "pong")]
    Pong,
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code,
            message: message.into(),
        }
    }

    /// Encode as a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
