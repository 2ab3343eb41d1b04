//! Protocol handler: turns inbound messages into session mutations and
//! broadcasts.
//!
//! Everything here is synchronous. The hub actor owns the handler and feeds it
//! one event at a time, so a state change and the broadcasts describing it are
//! always emitted back to back.

use std::time::Duration;

use serde_json::Value;

use super::{
    config::HubConfig,
    messages::HubStats,
    registry::{Binding, ConnectionId, ConnectionRegistry, Outbound},
};
use crate::{
    game::{
        ConnectionInfo, GameError, GameManager, GameOverrides, GameResult, GameStatus, PlayerId,
        PlayerPublic, TimerEvent, TimerSender,
    },
    join_code::normalize_join_code,
    net::{ClientMessage, ErrorCode, ServerMessage},
    plugin::PluginRegistry,
    session::SessionStore,
    utils::Timestamp,
};

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_LENGTH: usize = 32;

/// Drives games from client messages, timer events and reaper ticks.
pub struct ProtocolHandler {
    manager: GameManager,
    registry: ConnectionRegistry,
    sessions: SessionStore,
    max_idle: Duration,
    session_max_age: Duration,
}

impl ProtocolHandler {
    /// # Arguments
    ///
    /// * `plugins` - Registered game types
    /// * `timer_sink` - Channel fired session timers are posted to
    /// * `config` - Hub configuration
    pub fn new(plugins: PluginRegistry, timer_sink: TimerSender, config: &HubConfig) -> Self {
        Self {
            manager: GameManager::new(plugins, timer_sink).with_grace_period(config.grace_period),
            registry: ConnectionRegistry::new(),
            sessions: SessionStore::new(),
            max_idle: config.max_idle,
            session_max_age: config.session_max_age,
        }
    }

    pub fn manager(&self) -> &GameManager {
        &self.manager
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            games: self.manager.active_game_count(),
            connections: self.registry.connection_count(),
            sessions: self.sessions.len(),
            plugins: self
                .manager
                .available_plugins()
                .into_iter()
                .map(|info| info.id)
                .collect(),
        }
    }

    pub fn connection_opened(&mut self, conn: ConnectionId, outbound: Outbound) {
        self.registry.register(conn, outbound);
    }

    /// Transport closed. Runs disconnect side effects only if the connection
    /// was still the live one for its role.
    pub fn connection_closed(&mut self, conn: ConnectionId) {
        if let Some(gone) = self.registry.unregister(conn)
            && gone.was_current
        {
            self.detach(gone.binding);
        }
    }

    /// Handle one raw text frame.
    pub fn handle_text(&mut self, conn: ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle_message(conn, message),
            Err(e) => {
                log::debug!("Connection {conn}: unparseable frame: {e}");
                self.registry.send(
                    conn,
                    &ServerMessage::error(ErrorCode::InvalidMessage, "Invalid message format"),
                );
            }
        }
    }

    /// Handle one decoded message. Errors are reported to the sender only.
    pub fn handle_message(&mut self, conn: ConnectionId, message: ClientMessage) {
        let kind = message.kind();
        let result = match message {
            ClientMessage::CreateGame {
                game_type,
                config,
                player_name,
            } => self.create_game(conn, &game_type, config.unwrap_or_default(), player_name),
            ClientMessage::JoinGame { code, player_name } => {
                self.join_game(conn, &code, &player_name)
            }
            ClientMessage::JoinDisplay { code } => self.join_display(conn, &code),
            ClientMessage::Reconnect {
                session_token,
                code,
            } => self.reconnect(conn, &session_token, &code),
            ClientMessage::ClaimHost => self.claim_host(conn),
            ClientMessage::StartGame => self.start_game(conn),
            ClientMessage::NextRound => self.next_round(conn),
            ClientMessage::EndGame => self.end_game(conn),
            ClientMessage::PlayAgain => self.play_again(conn),
            ClientMessage::Response { response } => self.submit_response(conn, response),
            ClientMessage::Action { action } => self.player_action(conn, action),
            ClientMessage::Ping => {
                self.ping(conn);
                Ok(())
            }
        };

        if let Err(e) = result {
            if let GameError::Serialization(inner) = &e {
                log::error!("Connection {conn}: {kind} failed to encode state: {inner}");
            } else {
                log::debug!("Connection {conn}: {kind} rejected: {e}");
            }
            self.registry
                .send(conn, &ServerMessage::error(e.code(), e.client_message()));
        }
    }

    /// Handle a fired session timer.
    pub fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::GraceExpired {
                code,
                player_id,
                epoch,
            } => self.grace_expired(&code, &player_id, epoch),
            TimerEvent::RoundExpired { code, round, epoch } => {
                let Some(game) = self.manager.get_mut(&code) else {
                    return;
                };
                if game.core_mut().round_timer_expired(round, epoch) {
                    log::info!("Game {code}: round {round} timed out");
                    self.end_current_round(&code);
                }
            }
        }
    }

    /// Sweep stale games and old session tokens.
    pub fn reap(&mut self, now: Timestamp) {
        for code in self.manager.cleanup_stale_games(now, self.max_idle) {
            self.registry.forget_game(&code);
            self.sessions.delete_sessions_for_game(&code);
        }
        self.sessions
            .cleanup_old_sessions(now, self.session_max_age);
    }

    // ---- message handlers ----

    fn create_game(
        &mut self,
        conn: ConnectionId,
        game_type: &str,
        overrides: GameOverrides,
        player_name: Option<String>,
    ) -> GameResult<()> {
        let player_name = player_name.map(|n| validate_name(&n)).transpose()?;
        let code = self.manager.create_game(game_type, overrides)?;

        self.registry.send(
            conn,
            &ServerMessage::GameCreated {
                code: code.clone(),
                game_type: game_type.to_string(),
            },
        );

        match player_name {
            Some(name) => self.add_player(conn, &code, name),
            None => self.bind_display(conn, &code),
        }
    }

    fn join_game(&mut self, conn: ConnectionId, code: &str, player_name: &str) -> GameResult<()> {
        let code = normalize_join_code(code);
        let game = self.manager.get(&code).ok_or(GameError::GameNotFound)?;
        let name = validate_name(player_name)?;

        game.core().can_join()?;
        if game.core().is_name_taken(&name) {
            return Err(GameError::NameTaken);
        }
        self.add_player(conn, &code, name)
    }

    fn add_player(&mut self, conn: ConnectionId, code: &str, name: String) -> GameResult<()> {
        let game = self.manager.get_mut(code).ok_or(GameError::GameNotFound)?;
        let token = SessionStore::new_token();
        let player_id = game.core_mut().add_player(name, token.clone()).id.clone();
        let state = player_state(game.player_view(&player_id))?;

        self.sessions
            .create_session(token.clone(), &player_id, code);
        let previous = self.registry.bind_player(conn, code, &player_id);

        log::info!("Game {code}: player {player_id} joined");
        self.registry.send(
            conn,
            &ServerMessage::GameJoined {
                session_token: token,
                player_id,
                state,
            },
        );
        self.broadcast_players(code);

        self.release_previous(conn, previous);
        Ok(())
    }

    fn join_display(&mut self, conn: ConnectionId, code: &str) -> GameResult<()> {
        let code = normalize_join_code(code);
        if self.manager.get(&code).is_none() {
            return Err(GameError::GameNotFound);
        }
        self.bind_display(conn, &code)
    }

    fn bind_display(&mut self, conn: ConnectionId, code: &str) -> GameResult<()> {
        let game = self.manager.get_mut(code).ok_or(GameError::GameNotFound)?;
        game.core_mut().set_display(ConnectionInfo::new());
        let state = game.display_view()?;

        let previous = self.registry.bind_display(conn, code);
        self.registry
            .send(conn, &ServerMessage::DisplayJoined { state });

        self.release_previous(conn, previous);
        Ok(())
    }

    fn reconnect(&mut self, conn: ConnectionId, token: &str, code: &str) -> GameResult<()> {
        let code = normalize_join_code(code);
        let game = self.manager.get_mut(&code).ok_or(GameError::GameNotFound)?;
        let player_id = self
            .sessions
            .validate_session(token, &code)
            .map(|s| s.player_id.clone())
            .ok_or(GameError::InvalidSession)?;

        if !game.core_mut().player_connected(&player_id) {
            return Err(GameError::InvalidSession);
        }
        let player_name = player_name(game.core().player(&player_id));
        let state = player_state(game.player_view(&player_id))?;

        let previous = self.registry.bind_player(conn, &code, &player_id);
        log::info!("Game {code}: player {player_id} reconnected");

        self.registry.send(
            conn,
            &ServerMessage::GameJoined {
                session_token: token.to_string(),
                player_id: player_id.clone(),
                state,
            },
        );
        self.registry.broadcast_to_game(
            &code,
            &ServerMessage::PlayerReconnected {
                player_id,
                player_name,
            },
        );
        self.broadcast_players(&code);

        self.release_previous(conn, previous);
        Ok(())
    }

    fn claim_host(&mut self, conn: ConnectionId) -> GameResult<()> {
        let (code, player_id) = self.player_binding(conn)?;
        let game = self.manager.get_mut(&code).ok_or(GameError::GameNotFound)?;

        if game.core().status() != GameStatus::Lobby {
            return Err(GameError::HostLocked);
        }
        game.core_mut().set_host(&player_id);
        let host_name = player_name(game.core().player(&player_id));

        self.registry.broadcast_to_game(
            &code,
            &ServerMessage::HostChanged {
                host_id: player_id,
                host_name,
            },
        );
        self.broadcast_players(&code);
        Ok(())
    }

    fn start_game(&mut self, conn: ConnectionId) -> GameResult<()> {
        let code = self.host_binding(conn, "start the game")?;
        let game = self.manager.get_mut(&code).ok_or(GameError::GameNotFound)?;

        game.core().can_start()?;
        game.start_game()?;
        self.start_next_round(&code);
        Ok(())
    }

    fn next_round(&mut self, conn: ConnectionId) -> GameResult<()> {
        let code = self.host_binding(conn, "advance rounds")?;
        let game = self.manager.get(&code).ok_or(GameError::GameNotFound)?;

        match game.core().status() {
            GameStatus::BetweenRounds => self.advance(&code),
            GameStatus::InProgress if game.info().host_controlled_rounds => {
                self.end_current_round(&code)
            }
            status => log::debug!("Game {code}: host:next-round ignored in {status}"),
        }
        Ok(())
    }

    fn end_game(&mut self, conn: ConnectionId) -> GameResult<()> {
        let code = self.host_binding(conn, "end the game")?;
        let game = self.manager.get(&code).ok_or(GameError::GameNotFound)?;

        match game.core().status() {
            GameStatus::InProgress | GameStatus::BetweenRounds => self.finish_game(&code),
            status => log::debug!("Game {code}: host:end-game ignored in {status}"),
        }
        Ok(())
    }

    fn play_again(&mut self, conn: ConnectionId) -> GameResult<()> {
        let code = self.host_binding(conn, "restart the game")?;
        let game = self.manager.get_mut(&code).ok_or(GameError::GameNotFound)?;

        if game.core().status() != GameStatus::Ended {
            log::debug!("Game {code}: host:play-again ignored in {}", game.core().status());
            return Ok(());
        }
        game.reset_for_new_game();
        log::info!("Game {code}: reset for a new game");

        self.broadcast_state(&code);
        self.broadcast_players(&code);
        Ok(())
    }

    fn submit_response(&mut self, conn: ConnectionId, response: Value) -> GameResult<()> {
        let (code, player_id) = self.player_binding(conn)?;
        let game = self.manager.get_mut(&code).ok_or(GameError::GameNotFound)?;

        if game.core().status() != GameStatus::InProgress {
            log::debug!("Game {code}: response from {player_id} outside a round ignored");
            return Ok(());
        }
        let complete = game.submit_response(&player_id, response)?;

        self.registry.broadcast_to_game(
            &code,
            &ServerMessage::ResponseReceived {
                player_id: player_id.clone(),
            },
        );
        self.broadcast_state(&code);

        if complete {
            self.end_current_round(&code);
        }
        Ok(())
    }

    fn player_action(&mut self, conn: ConnectionId, action: Value) -> GameResult<()> {
        let (code, player_id) = self.player_binding(conn)?;
        let game = self.manager.get_mut(&code).ok_or(GameError::GameNotFound)?;

        if !matches!(
            game.core().status(),
            GameStatus::InProgress | GameStatus::BetweenRounds
        ) {
            log::debug!("Game {code}: action from {player_id} ignored");
            return Ok(());
        }
        game.handle_player_action(&player_id, action)?;
        self.broadcast_state(&code);
        Ok(())
    }

    fn ping(&mut self, conn: ConnectionId) {
        match self.registry.binding(conn).cloned() {
            Some(Binding::Player { code, player_id }) => {
                if let Some(game) = self.manager.get_mut(&code) {
                    game.core_mut().refresh_presence(&player_id);
                }
            }
            Some(Binding::Display { code }) => {
                if let Some(game) = self.manager.get_mut(&code) {
                    game.core_mut().refresh_display_presence();
                }
            }
            None => {}
        }
        self.registry.send(conn, &ServerMessage::Pong);
    }

    // ---- lifecycle ----

    /// Detach the role `conn` held before it was rebound, unless it was
    /// rebound to that same role.
    fn release_previous(&mut self, conn: ConnectionId, previous: Option<Binding>) {
        let Some(previous) = previous else {
            return;
        };
        if self.registry.binding(conn) != Some(&previous) {
            self.detach(previous);
        }
    }

    /// Run the side effects of a connection losing its role.
    fn detach(&mut self, binding: Binding) {
        match binding {
            Binding::Display { code } => {
                if let Some(game) = self.manager.get_mut(&code) {
                    game.core_mut().clear_display();
                    log::debug!("Game {code}: display disconnected");
                }
            }
            Binding::Player { code, player_id } => {
                if let Some(game) = self.manager.get_mut(&code)
                    && game.core_mut().player_disconnected(&player_id).is_some()
                {
                    log::info!(
                        "Game {code}: player {player_id} disconnected; grace period started"
                    );
                }
            }
        }
    }

    fn grace_expired(&mut self, code: &str, player_id: &str, epoch: u64) {
        let Some(game) = self.manager.get_mut(code) else {
            return;
        };
        if !game.core_mut().grace_expired(player_id, epoch) {
            return;
        }

        let name = player_name(game.core().player(player_id));
        let new_host = game.core_mut().transfer_host_if_needed();
        let new_host = new_host.map(|id| {
            let host_name = player_name(game.core().player(&id));
            (id, host_name)
        });
        let round_complete = game.all_responses_received();

        log::info!("Game {code}: grace period expired for {player_id}");
        self.registry.broadcast_to_game(
            code,
            &ServerMessage::PlayerDisconnected {
                player_id: player_id.to_string(),
                player_name: name,
            },
        );
        if let Some((host_id, host_name)) = new_host {
            self.registry
                .broadcast_to_game(code, &ServerMessage::HostChanged { host_id, host_name });
        }
        self.broadcast_players(code);

        if round_complete {
            self.end_current_round(code);
        }
    }

    fn start_next_round(&mut self, code: &str) {
        let Some(game) = self.manager.get_mut(code) else {
            return;
        };
        match game.start_round() {
            Ok(round) => {
                self.registry
                    .broadcast_to_game(code, &ServerMessage::RoundStart { round });
                self.broadcast_state(code);
            }
            Err(e) => log::error!("Game {code}: failed to start round: {e}"),
        }
    }

    fn end_current_round(&mut self, code: &str) {
        let Some(game) = self.manager.get_mut(code) else {
            return;
        };
        let results = match game.end_round() {
            Ok(results) => results,
            Err(e) => {
                log::error!("Game {code}: failed to end round: {e}");
                return;
            }
        };
        let auto_advance = game.should_auto_advance();

        self.registry
            .broadcast_to_game(code, &ServerMessage::RoundEnd { results });
        self.broadcast_state(code);

        if auto_advance {
            self.advance(code);
        }
    }

    /// Next round, or the end of the game after the last one.
    fn advance(&mut self, code: &str) {
        let Some(game) = self.manager.get(code) else {
            return;
        };
        if game.core().is_last_round() {
            self.finish_game(code);
        } else {
            self.start_next_round(code);
        }
    }

    fn finish_game(&mut self, code: &str) {
        let Some(game) = self.manager.get_mut(code) else {
            return;
        };
        match game.end_game() {
            Ok(results) => {
                self.registry
                    .broadcast_to_game(code, &ServerMessage::GameEnd { results });
                self.broadcast_state(code);
            }
            Err(e) => log::error!("Game {code}: failed to end game: {e}"),
        }
    }

    // ---- broadcast helpers ----

    /// Send every viewer its own projection of the current state.
    fn broadcast_state(&self, code: &str) {
        let Some(game) = self.manager.get(code) else {
            return;
        };

        match game.display_view() {
            Ok(state) => {
                self.registry.send_to_display(
                    code,
                    &ServerMessage::StateUpdate {
                        state,
                        is_display: true,
                    },
                );
            }
            Err(e) => log::error!("Game {code}: failed to encode display state: {e}"),
        }

        for player in game.core().connected_players() {
            match game.player_view(&player.id) {
                Some(Ok(state)) => {
                    self.registry.send_to_player(
                        code,
                        &player.id,
                        &ServerMessage::StateUpdate {
                            state,
                            is_display: false,
                        },
                    );
                }
                Some(Err(e)) => {
                    log::error!("Game {code}: failed to encode state for {}: {e}", player.id)
                }
                None => {}
            }
        }
    }

    fn broadcast_players(&self, code: &str) {
        let Some(game) = self.manager.get(code) else {
            return;
        };
        let core = game.core();
        let message = ServerMessage::PlayersUpdate {
            players: core.players().iter().map(PlayerPublic::from).collect(),
            host_id: core.host_id().map(str::to_string),
        };
        self.registry.broadcast_to_game(code, &message);
    }

    // ---- authorization ----

    fn player_binding(&self, conn: ConnectionId) -> GameResult<(String, PlayerId)> {
        match self.registry.binding(conn) {
            Some(Binding::Player { code, player_id }) => Ok((code.clone(), player_id.clone())),
            _ => Err(GameError::NotInGame),
        }
    }

    /// The sender's game code, provided they are its host.
    fn host_binding(&self, conn: ConnectionId, action: &'static str) -> GameResult<String> {
        let (code, player_id) = self.player_binding(conn)?;
        let game = self.manager.get(&code).ok_or(GameError::GameNotFound)?;
        if !game.core().is_host(&player_id) {
            return Err(GameError::NotHost(action));
        }
        Ok(code)
    }
}

fn validate_name(name: &str) -> GameResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::InvalidMessage("Player name is required".to_string()));
    }
    if name.chars().count() > MAX_PLAYER_NAME_LENGTH {
        return Err(GameError::InvalidMessage(format!(
            "Player name must be at most {MAX_PLAYER_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn player_name(player: Option<&crate::game::Player>) -> String {
    player.map_or_else(|| "Unknown".to_string(), |p| p.name.clone())
}

fn player_state(view: Option<GameResult<Value>>) -> GameResult<Value> {
    view.unwrap_or_else(|| Err(GameError::InvalidSession))
}
