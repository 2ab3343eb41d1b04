//! Registry of live game sessions, keyed by join code.

use std::collections::HashMap;
use std::time::Duration;

use super::{
    config::{GameConfig, GameOverrides, GameStatus},
    core::SessionCore,
    dynamic::AnyGame,
    errors::{GameError, GameResult},
    timers::{DEFAULT_RECONNECT_GRACE_PERIOD, TimerSender},
};
use crate::{
    join_code::{generate_join_code, normalize_join_code},
    plugin::{PluginInfo, PluginRegistry},
    utils::Timestamp,
};

/// Games idle longer than this are reaped (1 hour).
pub const DEFAULT_MAX_IDLE: Duration = Duration::from_secs(60 * 60);

/// Owns every live session and the plugins that can create new ones.
pub struct GameManager {
    games: HashMap<String, Box<dyn AnyGame>>,
    plugins: PluginRegistry,
    timer_sink: TimerSender,
    grace_period: Duration,
}

impl GameManager {
    pub fn new(plugins: PluginRegistry, timer_sink: TimerSender) -> Self {
        Self {
            games: HashMap::new(),
            plugins,
            timer_sink,
            grace_period: DEFAULT_RECONNECT_GRACE_PERIOD,
        }
    }

    /// Override the reconnection grace period for games created from now on.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn available_plugins(&self) -> Vec<PluginInfo> {
        self.plugins.available()
    }

    /// Create a lobby for `game_type` under a fresh join code.
    ///
    /// # Returns
    ///
    /// * The new game's code
    pub fn create_game(&mut self, game_type: &str, overrides: GameOverrides) -> GameResult<String> {
        let info = self
            .plugins
            .info(game_type)
            .ok_or_else(|| GameError::GameTypeNotFound(game_type.to_string()))?;
        let config = GameConfig::from_plugin(info, overrides).map_err(GameError::InvalidMessage)?;

        let mut code = generate_join_code();
        while self.games.contains_key(&code) {
            code = generate_join_code();
        }

        let core = SessionCore::new(
            code.clone(),
            game_type.to_string(),
            config,
            self.grace_period,
            self.timer_sink.clone(),
        );
        let game = self
            .plugins
            .instantiate(game_type, core)
            .ok_or_else(|| GameError::GameTypeNotFound(game_type.to_string()))?;

        self.games.insert(code.clone(), game);
        log::info!("Created game: {code} ({game_type})");
        Ok(code)
    }

    /// Look up a game by user-entered code.
    pub fn get(&self, code: &str) -> Option<&dyn AnyGame> {
        self.games
            .get(&normalize_join_code(code))
            .map(|game| game.as_ref())
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut (dyn AnyGame + 'static)> {
        self.games
            .get_mut(&normalize_join_code(code))
            .map(|game| game.as_mut())
    }

    /// Delete a game, aborting its timers. Returns whether it existed.
    pub fn delete_game(&mut self, code: &str) -> bool {
        match self.games.remove(&normalize_join_code(code)) {
            Some(mut game) => {
                game.core_mut().cleanup();
                log::info!("Deleted game: {}", game.core().code());
                true
            }
            None => false,
        }
    }

    /// Delete games that ended, or lobbies that never got a player, and have
    /// been idle longer than `max_idle`. Returns the deleted codes.
    pub fn cleanup_stale_games(&mut self, now: Timestamp, max_idle: Duration) -> Vec<String> {
        let max_idle_ms = i64::try_from(max_idle.as_millis()).unwrap_or(i64::MAX);

        let stale: Vec<String> = self
            .games
            .iter()
            .filter(|(_, game)| {
                let core = game.core();
                let idle = now.saturating_sub(core.last_activity()) > max_idle_ms;
                let reapable = match core.status() {
                    GameStatus::Ended => true,
                    GameStatus::Lobby => core.player_count() == 0,
                    _ => false,
                };
                idle && reapable
            })
            .map(|(code, _)| code.clone())
            .collect();

        for code in &stale {
            self.delete_game(code);
        }
        if !stale.is_empty() {
            log::info!("Reaped {} stale game(s)", stale.len());
        }
        stale
    }

    pub fn active_game_count(&self) -> usize {
        self.games.len()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }
}
