//! Game-agnostic session state: roster, host, counters and timers.

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use super::{
    config::{GameConfig, GameStatus},
    errors::{GameError, GameResult},
    player::{ConnectionInfo, ConnectionStatus, Player, PlayerId, new_player_id},
    timers::{TimerSender, TimerSet},
};
use crate::utils::{Timestamp, now_millis};

/// Everything about a session that does not depend on the game type.
///
/// Plugins see this read-only. Mutation goes through the crate so that the
/// host flag and `host_id` can never disagree.
#[derive(Debug)]
pub struct SessionCore {
    pub(crate) id: Uuid,
    pub(crate) code: String,
    pub(crate) status: GameStatus,
    pub(crate) game_type: String,
    pub(crate) display: Option<ConnectionInfo>,
    pub(crate) players: Vec<Player>,
    pub(crate) host_id: Option<PlayerId>,
    pub(crate) current_round: u32,
    pub(crate) round_started_at: Option<Timestamp>,
    pub(crate) round_time_limit: Option<u64>,
    pub(crate) config: GameConfig,
    pub(crate) created_at: Timestamp,
    pub(crate) last_activity: Timestamp,
    grace_period: Duration,
    timers: TimerSet,
    timer_sink: TimerSender,
}

impl SessionCore {
    /// Create an empty lobby.
    ///
    /// # Arguments
    ///
    /// * `code` - Normalized join code
    /// * `game_type` - Plugin id
    /// * `config` - Configuration snapshot
    /// * `grace_period` - How long a disconnected player keeps their seat
    /// * `timer_sink` - Where fired timers are delivered
    pub fn new(
        code: String,
        game_type: String,
        config: GameConfig,
        grace_period: Duration,
        timer_sink: TimerSender,
    ) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            code,
            status: GameStatus::Lobby,
            game_type,
            display: None,
            players: Vec::new(),
            host_id: None,
            current_round: 0,
            round_started_at: None,
            round_time_limit: None,
            config,
            created_at: now,
            last_activity: now,
            grace_period,
            timers: TimerSet::new(),
            timer_sink,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn total_rounds(&self) -> u32 {
        self.config.total_rounds
    }

    pub fn round_started_at(&self) -> Option<Timestamp> {
        self.round_started_at
    }

    pub fn round_time_limit(&self) -> Option<u64> {
        self.round_time_limit
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn player_by_name(&self, name: &str) -> Option<&Player> {
        let name = name.to_lowercase();
        self.players.iter().find(|p| p.name.to_lowercase() == name)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn connected_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_connected())
    }

    pub fn connected_count(&self) -> usize {
        self.connected_players().count()
    }

    pub fn is_name_taken(&self, name: &str) -> bool {
        self.player_by_name(name).is_some()
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.host_id.as_deref() == Some(player_id)
    }

    pub fn host(&self) -> Option<&Player> {
        self.host_id.as_deref().and_then(|id| self.player(id))
    }

    /// Current totals keyed by player id.
    pub fn scores(&self) -> HashMap<PlayerId, i64> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), p.score))
            .collect()
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round >= self.config.total_rounds
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = now_millis();
    }

    /// Whether a new player may join right now.
    pub fn can_join(&self) -> GameResult<()> {
        if self.status != GameStatus::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::GameFull);
        }
        Ok(())
    }

    /// Whether the host may start the game.
    pub fn can_start(&self) -> GameResult<()> {
        if self.status != GameStatus::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.connected_count() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers(self.config.min_players));
        }
        Ok(())
    }

    /// Add a connected player. The first player added becomes host.
    ///
    /// Join preconditions (lobby, capacity, unique name) are checked by the
    /// caller through [`can_join`](Self::can_join) and
    /// [`is_name_taken`](Self::is_name_taken).
    pub fn add_player(&mut self, name: String, session_token: String) -> &Player {
        let mut id = new_player_id();
        while self.player(&id).is_some() {
            id = new_player_id();
        }

        self.players
            .push(Player::new(id.clone(), name, session_token));
        if self.host_id.is_none() {
            self.set_host(&id);
        }
        self.touch();

        let index = self.players.len() - 1;
        &self.players[index]
    }

    /// Make `player_id` the host. Returns false for unknown players.
    pub fn set_host(&mut self, player_id: &str) -> bool {
        if self.player(player_id).is_none() {
            return false;
        }

        for player in &mut self.players {
            player.is_host = player.id == player_id;
        }
        self.host_id = Some(player_id.to_string());
        self.touch();
        true
    }

    /// Hand the host role to the first connected player if the current host
    /// is gone. Returns the new host's id when it moved.
    ///
    /// A host still inside their grace period keeps the role.
    pub fn transfer_host_if_needed(&mut self) -> Option<PlayerId> {
        if let Some(host) = self.host()
            && (host.is_connected() || self.timers.has_grace(&host.id))
        {
            return None;
        }

        let next = self.connected_players().next().map(|p| p.id.clone())?;
        self.set_host(&next);
        Some(next)
    }

    /// Mark a player connected and cancel any pending grace timer.
    pub fn player_connected(&mut self, player_id: &str) -> bool {
        let Some(player) = self.player_mut(player_id) else {
            return false;
        };
        player.connection_status = ConnectionStatus::Connected;
        player.connection_info = Some(ConnectionInfo::new());
        player.disconnected_at = None;

        self.timers.cancel_grace(player_id);
        self.touch();
        true
    }

    /// Mark a player as reconnecting and arm their grace timer.
    ///
    /// Returns the timer epoch, or `None` for unknown players.
    pub fn player_disconnected(&mut self, player_id: &str) -> Option<u64> {
        let player = self.player_mut(player_id)?;
        player.connection_status = ConnectionStatus::Reconnecting;
        player.connection_info = None;
        player.disconnected_at = Some(now_millis());

        let epoch = self.timers.arm_grace(
            &self.code,
            player_id,
            self.grace_period,
            &self.timer_sink,
        );
        self.touch();
        Some(epoch)
    }

    /// Consume a fired grace timer.
    ///
    /// True only for the timer that is still armed for this player, and only
    /// while they are still away. The player is then marked disconnected.
    pub fn grace_expired(&mut self, player_id: &str, epoch: u64) -> bool {
        if !self.timers.take_grace(player_id, epoch) {
            return false;
        }
        match self.player_mut(player_id) {
            Some(player) if !player.is_connected() => {
                player.connection_status = ConnectionStatus::Disconnected;
                true
            }
            _ => false,
        }
    }

    pub fn has_pending_grace(&self, player_id: &str) -> bool {
        self.timers.has_grace(player_id)
    }

    pub fn refresh_presence(&mut self, player_id: &str) {
        if let Some(info) = self
            .player_mut(player_id)
            .and_then(|p| p.connection_info.as_mut())
        {
            info.touch();
        }
    }

    pub fn set_display(&mut self, info: ConnectionInfo) {
        self.display = Some(info);
        self.touch();
    }

    pub fn clear_display(&mut self) {
        self.display = None;
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    pub fn refresh_display_presence(&mut self) {
        if let Some(info) = self.display.as_mut() {
            info.touch();
        }
    }

    pub(crate) fn arm_round_timer(&mut self, limit_ms: u64) {
        self.timers.arm_round(
            &self.code,
            self.current_round,
            Duration::from_millis(limit_ms),
            &self.timer_sink,
        );
    }

    pub(crate) fn cancel_round_timer(&mut self) {
        self.timers.cancel_round();
    }

    /// Consume a fired round timer if it belongs to the round still open.
    pub(crate) fn round_timer_expired(&mut self, round: u32, epoch: u64) -> bool {
        self.timers.take_round(epoch)
            && self.status == GameStatus::InProgress
            && self.current_round == round
    }

    pub(crate) fn reset_scores(&mut self) {
        for player in &mut self.players {
            player.score = 0;
        }
    }

    /// Abort every pending timer.
    pub fn cleanup(&mut self) {
        self.timers.cancel_all();
    }
}
