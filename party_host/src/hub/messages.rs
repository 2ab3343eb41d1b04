//! Hub actor message types.

use serde::Serialize;
use tokio::sync::oneshot;

use super::registry::{ConnectionId, Outbound};

/// Messages that can be sent to the hub actor
#[derive(Debug)]
pub enum HubMessage {
    /// A transport connection opened
    Connected {
        conn: ConnectionId,
        outbound: Outbound,
    },

    /// A text frame arrived
    Inbound { conn: ConnectionId, text: String },

    /// A transport connection closed
    Disconnected { conn: ConnectionId },

    /// Snapshot of hub counters
    Stats {
        response: oneshot::Sender<HubStats>,
    },
}

/// Hub counters, reported on `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    pub games: usize,
    pub connections: usize,
    pub sessions: usize,
    pub plugins: Vec<String>,
}
