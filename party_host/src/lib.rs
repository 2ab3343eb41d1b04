//! # Party Host
//!
//! Authoritative server core for real-time party games. One shared display
//! shows public state while every player's device receives its own view.
//!
//! ## Architecture
//!
//! A game moves through four statuses:
//!
//! - **Lobby**: players join, the host may be claimed
//! - **InProgress**: a round is open and responses are collected
//! - **BetweenRounds**: the round is resolved, waiting for the host
//! - **Ended**: scores and rankings are frozen
//!
//! Game rules live in plugins implementing [`plugin::GamePlugin`]. Each plugin
//! keeps its state in three typed slots (hidden, public and per-player
//! private) and the engine only ever serializes the projections built in
//! [`game::filter`].
//!
//! All mutation happens on a single [`hub::HubActor`] task that owns the game
//! manager, the connection registry and the session store.
//!
//! ## Core Modules
//!
//! - [`game`]: Session state machine, projections and the game manager
//! - [`plugin`]: The game-type contract and its registry
//! - [`hub`]: The actor, protocol handler and connection registry
//! - [`net`]: Wire messages and error codes
//!
//! ## Example
//!
//! ```
//! use party_host::{games, hub::{HubActor, HubConfig}};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let hub = HubActor::spawn(games::default_registry(), HubConfig::default());
//! let stats = hub.stats().await.unwrap();
//! assert_eq!(stats.games, 0);
//! # }
//! ```

/// Core game engine.
pub mod game;
pub use game::{AnyGame, GameError, GameManager, GameResult, GameSession, GameStatus, SessionCore};

/// Bundled game types.
pub mod games;

/// Actor, protocol handler and connection registry.
pub mod hub;
pub use hub::{HubActor, HubConfig, HubHandle};

/// Join code generation and normalization.
pub mod join_code;

/// Wire protocol.
pub mod net;
pub use net::{ClientMessage, ErrorCode, ServerMessage};

/// Plugin contract.
pub mod plugin;
pub use plugin::{GamePlugin, PluginInfo, PluginRegistry};

/// Reconnection tokens.
pub mod session;
pub use session::SessionStore;

pub mod utils;
