//! Live connection registry and broadcaster.

use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::{game::PlayerId, net::ServerMessage};

/// Transport connection identifier.
pub type ConnectionId = Uuid;

/// Outbound queue of encoded text frames for one connection.
pub type Outbound = mpsc::Sender<String>;

/// The role a connection plays in a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Player { code: String, player_id: PlayerId },
    Display { code: String },
}

impl Binding {
    pub fn code(&self) -> &str {
        match self {
            Binding::Player { code, .. } | Binding::Display { code } => code,
        }
    }
}

/// Result of unregistering a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unregistered {
    pub binding: Binding,
    /// Whether this connection was still the live one for its role. Stale
    /// connections that were superseded by a reconnect report false.
    pub was_current: bool,
}

#[derive(Debug)]
struct Connection {
    outbound: Outbound,
    binding: Option<Binding>,
}

/// Maps connections to roles, with reverse indexes for directed sends.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    players: HashMap<(String, PlayerId), ConnectionId>,
    displays: HashMap<String, ConnectionId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new, unbound connection.
    pub fn register(&mut self, conn: ConnectionId, outbound: Outbound) {
        self.connections.insert(
            conn,
            Connection {
                outbound,
                binding: None,
            },
        );
    }

    /// Stop tracking a connection and return its binding, if any.
    pub fn unregister(&mut self, conn: ConnectionId) -> Option<Unregistered> {
        let binding = self.connections.remove(&conn)?.binding?;
        let was_current = self.release_index(conn, &binding);
        Some(Unregistered {
            binding,
            was_current,
        })
    }

    /// Drop the reverse index entry for `binding` if it points at `conn`.
    fn release_index(&mut self, conn: ConnectionId, binding: &Binding) -> bool {
        match binding {
            Binding::Player { code, player_id } => {
                let key = (code.clone(), player_id.clone());
                if self.players.get(&key) == Some(&conn) {
                    self.players.remove(&key);
                    true
                } else {
                    false
                }
            }
            Binding::Display { code } => {
                if self.displays.get(code) == Some(&conn) {
                    self.displays.remove(code);
                    true
                } else {
                    false
                }
            }
        }
    }

    fn bind(&mut self, conn: ConnectionId, binding: Binding) -> Option<Binding> {
        let previous = self
            .connections
            .get_mut(&conn)
            .and_then(|c| c.binding.take());
        if let Some(previous) = &previous {
            self.release_index(conn, previous);
        }

        // Whoever held this role before is now detached.
        let superseded = match &binding {
            Binding::Player { code, player_id } => self
                .players
                .insert((code.clone(), player_id.clone()), conn),
            Binding::Display { code } => self.displays.insert(code.clone(), conn),
        };
        if let Some(old) = superseded.filter(|old| *old != conn)
            && let Some(old_conn) = self.connections.get_mut(&old)
        {
            old_conn.binding = None;
        }

        if let Some(connection) = self.connections.get_mut(&conn) {
            connection.binding = Some(binding);
        }
        previous
    }

    /// Bind `conn` as `player_id` in `code`. Returns the binding it replaced.
    pub fn bind_player(
        &mut self,
        conn: ConnectionId,
        code: &str,
        player_id: &str,
    ) -> Option<Binding> {
        self.bind(
            conn,
            Binding::Player {
                code: code.to_string(),
                player_id: player_id.to_string(),
            },
        )
    }

    /// Bind `conn` as the display of `code`, replacing any previous display.
    pub fn bind_display(&mut self, conn: ConnectionId, code: &str) -> Option<Binding> {
        self.bind(
            conn,
            Binding::Display {
                code: code.to_string(),
            },
        )
    }

    pub fn binding(&self, conn: ConnectionId) -> Option<&Binding> {
        self.connections
            .get(&conn)
            .and_then(|c| c.binding.as_ref())
    }

    pub fn player_connection(&self, code: &str, player_id: &str) -> Option<ConnectionId> {
        self.players
            .get(&(code.to_string(), player_id.to_string()))
            .copied()
    }

    pub fn display_connection(&self, code: &str) -> Option<ConnectionId> {
        self.displays.get(code).copied()
    }

    /// Unbind every connection of `code`. Returns how many were unbound.
    pub fn forget_game(&mut self, code: &str) -> usize {
        let mut count = 0;
        for connection in self.connections.values_mut() {
            if connection
                .binding
                .as_ref()
                .is_some_and(|b| b.code() == code)
            {
                connection.binding = None;
                count += 1;
            }
        }
        self.players.retain(|(game, _), _| game != code);
        self.displays.remove(code);
        count
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_registered(&self, conn: ConnectionId) -> bool {
        self.connections.contains_key(&conn)
    }

    fn deliver(&self, conn: ConnectionId, text: &str) -> bool {
        let Some(connection) = self.connections.get(&conn) else {
            return false;
        };
        match connection.outbound.try_send(text.to_string()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("Outbound buffer full for connection {conn}; dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("Connection {conn} already closed; skipping frame");
                false
            }
        }
    }

    fn encode(message: &ServerMessage) -> Option<String> {
        match message.to_json() {
            Ok(text) => Some(text),
            Err(e) => {
                log::error!("Failed to encode server message: {e}");
                None
            }
        }
    }

    /// Send one message to one connection.
    pub fn send(&self, conn: ConnectionId, message: &ServerMessage) -> bool {
        Self::encode(message).is_some_and(|text| self.deliver(conn, &text))
    }

    pub fn send_to_player(&self, code: &str, player_id: &str, message: &ServerMessage) -> bool {
        self.player_connection(code, player_id)
            .is_some_and(|conn| self.send(conn, message))
    }

    pub fn send_to_display(&self, code: &str, message: &ServerMessage) -> bool {
        self.display_connection(code)
            .is_some_and(|conn| self.send(conn, message))
    }

    fn player_connections<'a>(&'a self, code: &'a str) -> impl Iterator<Item = ConnectionId> + 'a {
        self.players
            .iter()
            .filter(move |((game, _), _)| game == code)
            .map(|(_, conn)| *conn)
    }

    /// Send to the display and every player of `code`. Returns deliveries.
    pub fn broadcast_to_game(&self, code: &str, message: &ServerMessage) -> usize {
        let Some(text) = Self::encode(message) else {
            return 0;
        };
        self.player_connections(code)
            .chain(self.display_connection(code))
            .filter(|conn| self.deliver(*conn, &text))
            .count()
    }

    /// Send to every player of `code`, excluding the display.
    pub fn broadcast_to_players(&self, code: &str, message: &ServerMessage) -> usize {
        let Some(text) = Self::encode(message) else {
            return 0;
        };
        self.player_connections(code)
            .filter(|conn| self.deliver(*conn, &text))
            .count()
    }
}
