//! Game engine error types.

use thiserror::Error;

use crate::net::ErrorCode;

/// Errors raised while driving a game session.
///
/// Every variant maps onto a stable wire [`ErrorCode`]; none of them is fatal
/// to the connection that caused it.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Game not found")]
    GameNotFound,

    #[error("Game type not found: {0}")]
    GameTypeNotFound(String),

    #[error("Game is full")]
    GameFull,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Cannot change host after game starts")]
    HostLocked,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Not in a game")]
    NotInGame,

    #[error("Only host can {0}")]
    NotHost(&'static str),

    #[error("Need at least {0} players")]
    NotEnoughPlayers(usize),

    #[error("Name already taken")]
    NameTaken,

    #[error("Already responded")]
    AlreadyResponded,

    #[error("{0}")]
    InvalidResponse(String),

    #[error("Game does not support player actions")]
    ActionsUnsupported,

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("{0}")]
    InvalidMessage(String),

    #[error("Rate limit exceeded. Please slow down.")]
    RateLimited,

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GameError {
    /// Wire error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::GameNotFound => ErrorCode::GameNotFound,
            GameError::GameTypeNotFound(_) => ErrorCode::GameTypeNotFound,
            GameError::GameFull => ErrorCode::GameFull,
            GameError::GameAlreadyStarted | GameError::HostLocked => {
                ErrorCode::GameAlreadyStarted
            }
            GameError::InvalidSession | GameError::NotInGame | GameError::PlayerNotFound(_) => {
                ErrorCode::InvalidSession
            }
            GameError::NotHost(_) => ErrorCode::NotHost,
            GameError::NotEnoughPlayers(_) => ErrorCode::NotEnoughPlayers,
            GameError::NameTaken => ErrorCode::NameTaken,
            GameError::AlreadyResponded => ErrorCode::AlreadyResponded,
            GameError::InvalidResponse(_) => ErrorCode::InvalidResponse,
            GameError::ActionsUnsupported
            | GameError::InvalidMessage(_)
            | GameError::Serialization(_) => ErrorCode::InvalidMessage,
            GameError::RateLimited => ErrorCode::RateLimited,
        }
    }

    /// Message safe to send to a client.
    ///
    /// Serialization failures are internal and are not echoed back.
    pub fn client_message(&self) -> String {
        match self {
            GameError::Serialization(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
