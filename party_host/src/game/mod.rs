//! Game session engine.
//!
//! This module provides the game-agnostic lifecycle around a plugin:
//! - Roster, host authority and reconnection grace periods ([`SessionCore`])
//! - The lobby → rounds → ended state machine ([`GameSession`])
//! - Per-viewer projections that keep hidden and private state confidential
//! - The registry of live sessions ([`GameManager`])

pub mod config;
pub mod core;
pub mod dynamic;
pub mod errors;
pub mod filter;
pub mod manager;
pub mod player;
pub mod session;
pub mod timers;

pub use config::{GameConfig, GameOverrides, GameStatus};
pub use self::core::SessionCore;
pub use dynamic::AnyGame;
pub use errors::{GameError, GameResult};
pub use filter::{DisplayView, PlayerView};
pub use manager::{DEFAULT_MAX_IDLE, GameManager};
pub use player::{ConnectionInfo, ConnectionStatus, Player, PlayerId, PlayerPublic};
pub use session::{FinalResults, GameSession, Ranking, RoundData, RoundResults};
pub use timers::{DEFAULT_RECONNECT_GRACE_PERIOD, TimerEvent, TimerSender, TimerSet};
