//! Hub configuration.

use std::time::Duration;

use crate::{
    game::{DEFAULT_MAX_IDLE, DEFAULT_RECONNECT_GRACE_PERIOD},
    session::DEFAULT_SESSION_MAX_AGE,
};

/// Runtime knobs for the hub actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// How long a disconnected player keeps their seat (default: 30s)
    pub grace_period: Duration,

    /// How often stale games and tokens are swept (default: 5 minutes)
    pub reap_interval: Duration,

    /// Idle time after which ended or empty games are reaped (default: 1 hour)
    pub max_idle: Duration,

    /// Age after which session tokens are swept (default: 24 hours)
    pub session_max_age: Duration,

    /// Outbound frames buffered per connection before frames are dropped
    pub outbound_buffer: usize,

    /// Inbox capacity of the hub actor
    pub inbox_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_RECONNECT_GRACE_PERIOD,
            reap_interval: Duration::from_secs(5 * 60),
            max_idle: DEFAULT_MAX_IDLE,
            session_max_age: DEFAULT_SESSION_MAX_AGE,
            outbound_buffer: 256,
            inbox_capacity: 1024,
        }
    }
}
