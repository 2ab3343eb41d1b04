//! Wire protocol types.

pub mod messages;

pub use messages::{ClientMessage, ErrorCode, ServerMessage};
