//! Hub actor: the single task that owns every game.

use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, MissedTickBehavior, interval_at},
};

use super::{
    config::HubConfig,
    handler::ProtocolHandler,
    messages::{HubMessage, HubStats},
    registry::{ConnectionId, Outbound},
};
use crate::{game::TimerEvent, plugin::PluginRegistry, utils::now_millis};

/// Errors returned by [`HubHandle`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Hub is closed")]
    Closed,
}

/// Cloneable handle for talking to the hub actor.
#[derive(Clone, Debug)]
pub struct HubHandle {
    sender: mpsc::Sender<HubMessage>,
    outbound_buffer: usize,
}

impl HubHandle {
    /// Send a raw message to the hub.
    pub async fn send(&self, message: HubMessage) -> Result<(), HubError> {
        self.sender.send(message).await.map_err(|_| HubError::Closed)
    }

    /// A bounded outbound channel sized for one connection.
    pub fn outbound_channel(&self) -> (Outbound, mpsc::Receiver<String>) {
        mpsc::channel(self.outbound_buffer)
    }

    pub async fn connect(&self, conn: ConnectionId, outbound: Outbound) -> Result<(), HubError> {
        self.send(HubMessage::Connected { conn, outbound }).await
    }

    pub async fn inbound(&self, conn: ConnectionId, text: String) -> Result<(), HubError> {
        self.send(HubMessage::Inbound { conn, text }).await
    }

    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), HubError> {
        self.send(HubMessage::Disconnected { conn }).await
    }

    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (response, rx) = oneshot::channel();
        self.send(HubMessage::Stats { response }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }
}

/// Serializes connection events, timer events and reaper ticks onto one
/// [`ProtocolHandler`].
pub struct HubActor {
    handler: ProtocolHandler,
    inbox: mpsc::Receiver<HubMessage>,
    timers: mpsc::UnboundedReceiver<TimerEvent>,
    config: HubConfig,
}

impl HubActor {
    /// Create a new hub actor
    ///
    /// # Arguments
    ///
    /// * `plugins` - Game types that can be created
    /// * `config` - Hub configuration
    ///
    /// # Returns
    ///
    /// * `(HubActor, HubHandle)` - Actor and handle for sending messages
    pub fn new(plugins: PluginRegistry, config: HubConfig) -> (Self, HubHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);
        let (timer_sink, timers) = mpsc::unbounded_channel();

        let handle = HubHandle {
            sender,
            outbound_buffer: config.outbound_buffer,
        };
        let actor = Self {
            handler: ProtocolHandler::new(plugins, timer_sink, &config),
            inbox,
            timers,
            config,
        };
        (actor, handle)
    }

    /// Spawn the actor on the current runtime and return its handle.
    pub fn spawn(plugins: PluginRegistry, config: HubConfig) -> HubHandle {
        let (actor, handle) = Self::new(plugins, config);
        tokio::spawn(actor.run());
        handle
    }

    /// Run until every handle is dropped.
    pub async fn run(mut self) {
        log::info!("Game hub starting");

        let period = self.config.reap_interval;
        let mut reaper = interval_at(Instant::now() + period, period);
        reaper.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },

                Some(event) = self.timers.recv() => {
                    self.handler.handle_timer(event);
                }

                _ = reaper.tick() => {
                    self.handler.reap(now_millis());
                }
            }
        }

        log::info!("Game hub stopped");
    }

    fn handle_message(&mut self, message: HubMessage) {
        match message {
            HubMessage::Connected { conn, outbound } => {
                self.handler.connection_opened(conn, outbound);
            }
            HubMessage::Inbound { conn, text } => {
                self.handler.handle_text(conn, &text);
            }
            HubMessage::Disconnected { conn } => {
                self.handler.connection_closed(conn);
            }
            HubMessage::Stats { response } => {
                let _ = response.send(self.handler.stats());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::default_registry;
    use serde_json::Value;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_round_trip_through_actor() {
        let handle = HubActor::spawn(default_registry(), HubConfig::default());
        let (outbound, mut rx) = handle.outbound_channel();
        let conn = Uuid::new_v4();

        handle.connect(conn, outbound).await.unwrap();
        handle
            .inbound(conn, r#"{"type":"ping"}"#.to_string())
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap(), r#"{"type":"pong"}"#);

        handle
            .inbound(conn, r#"{"type":"game:create","gameType":"trivia"}"#.to_string())
            .await
            .unwrap();
        let created: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(created["type"], "game:created");
        let joined: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(joined["type"], "display:joined");

        let stats = handle.stats().await.unwrap();
        assert_eq!(stats.games, 1);
        assert_eq!(stats.connections, 1);
        assert_eq!(stats.plugins, vec!["trivia".to_string()]);

        handle.disconnect(conn).await.unwrap();
        assert_eq!(handle.stats().await.unwrap().connections, 0);
    }
}
