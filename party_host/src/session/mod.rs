//! Reconnection tokens.
//!
//! A token is the sole credential for rejoining a game as a given player: whoever
//! holds a valid token for a code can reconnect as that player. Tokens survive an
//! ordinary disconnect and are only removed by explicit deletion, game teardown or
//! the age sweep.

pub mod store;

pub use store::{DEFAULT_SESSION_MAX_AGE, SESSION_TOKEN_LENGTH, SessionData, SessionStore};
