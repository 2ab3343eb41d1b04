//! The hub: one actor task that owns every game, every connection binding
//! and every session token, and processes events strictly one at a time.

pub mod actor;
pub mod config;
pub mod handler;
pub mod messages;
pub mod registry;

pub use actor::{HubActor, HubError, HubHandle};
pub use config::HubConfig;
pub use handler::ProtocolHandler;
pub use messages::{HubMessage, HubStats};
pub use registry::{Binding, ConnectionId, ConnectionRegistry, Outbound, Unregistered};
