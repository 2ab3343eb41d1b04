//! The contract every game type implements.
//!
//! The engine owns rosters, rounds, timers and broadcast; a [`GamePlugin`] owns
//! the rules. State is split three ways and the engine never looks inside it:
//!
//! - **hidden**: only the plugin ever reads it (answers, secret targets)
//! - **public**: shown identically to the display and every player
//! - **private**: one entry per player, shown to that player only
//!
//! Each slot is an associated type, so a plugin's state keeps its shape at
//! compile time while the session engine stays generic over it.

pub mod registry;

pub use registry::PluginRegistry;

use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    game::{GameConfig, PlayerId, SessionCore},
    utils::Timestamp,
};

/// Static description of a game type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub id: String,
    pub name: String,
    pub min_players: usize,
    pub max_players: usize,
    pub default_rounds: u32,
    /// Players may overwrite their response within a round
    pub mutable_responses: bool,
    /// Rounds only end when the host advances them
    pub host_controlled_rounds: bool,
    /// The plugin implements [`GamePlugin::on_player_action`]
    pub supports_actions: bool,
}

/// The three state slots of a running game.
pub struct PluginState<P: GamePlugin> {
    pub hidden: P::Hidden,
    pub public: P::Public,
    pub private: HashMap<PlayerId, P::Private>,
}

impl<P: GamePlugin> PluginState<P> {
    pub fn new(hidden: P::Hidden, public: P::Public) -> Self {
        Self {
            hidden,
            public,
            private: HashMap::new(),
        }
    }
}

/// What a plugin hands back when a round opens.
#[derive(Debug, Clone)]
pub struct RoundStart<R> {
    /// Round payload broadcast with `round:start`
    pub round_data: R,
    /// Time limit in milliseconds, if the round is timed
    pub time_limit: Option<u64>,
}

/// A response recorded during the current round.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerResponse<R> {
    pub player_id: PlayerId,
    pub response: R,
    pub received_at: Timestamp,
}

/// What a plugin hands back when the game ends.
#[derive(Debug, Clone)]
pub struct GameEndOutcome<F> {
    pub summary: F,
    /// Final scores, replacing the running totals before ranking. Plugins
    /// that only score at the end of the game use this.
    pub final_scores: Option<HashMap<PlayerId, i64>>,
}

impl<F> GameEndOutcome<F> {
    pub fn summary(summary: F) -> Self {
        Self {
            summary,
            final_scores: None,
        }
    }
}

/// Rules of one game type.
///
/// Hooks receive the read-only session core (roster, round counters, config)
/// and, where they may change it, a mutable borrow of the plugin state.
pub trait GamePlugin: Sized + Send + Sync + 'static {
    type Hidden: Send + 'static;
    type Public: Serialize + Send + 'static;
    type Private: Serialize + Send + 'static;
    type Response: DeserializeOwned + Send + 'static;
    type Action: DeserializeOwned + Send + 'static;
    type RoundData: Serialize;
    type RoundResults: Serialize;
    type FinalResults: Serialize;

    /// Identity, bounds and capability flags. Read once at registration.
    fn info(&self) -> PluginInfo;

    /// Build the state for a fresh game from the roster at start time.
    fn create_initial_state(
        &self,
        player_ids: &[PlayerId],
        config: &GameConfig,
    ) -> PluginState<Self>;

    /// Open round `round` (1-based).
    fn on_round_start(
        &self,
        round: u32,
        core: &SessionCore,
        state: &mut PluginState<Self>,
    ) -> RoundStart<Self::RoundData>;

    /// Check a response without changing anything. `Err` carries the reason
    /// shown to the player.
    fn validate_response(
        &self,
        player_id: &str,
        response: &Self::Response,
        core: &SessionCore,
        state: &PluginState<Self>,
    ) -> Result<(), String>;

    /// Fold an accepted response into the state.
    fn on_response_received(
        &self,
        player_id: &str,
        response: &Self::Response,
        core: &SessionCore,
        state: &mut PluginState<Self>,
    );

    /// Resolve the round over every recorded response.
    fn on_all_responses_received(
        &self,
        responses: &[PlayerResponse<Self::Response>],
        core: &SessionCore,
        state: &mut PluginState<Self>,
    ) -> Self::RoundResults;

    /// New totals from the previous totals and this round's results.
    ///
    /// Players missing from the returned map keep their score.
    fn calculate_scores(
        &self,
        results: &Self::RoundResults,
        current_scores: &HashMap<PlayerId, i64>,
        core: &SessionCore,
    ) -> HashMap<PlayerId, i64>;

    fn on_game_end(
        &self,
        core: &SessionCore,
        state: &PluginState<Self>,
    ) -> GameEndOutcome<Self::FinalResults>;

    /// Advance to the next round without waiting for the host.
    fn should_auto_advance(&self, _core: &SessionCore, _state: &PluginState<Self>) -> bool {
        false
    }

    /// Out-of-band live update. Only called when `info().supports_actions`.
    fn on_player_action(
        &self,
        _player_id: &str,
        _action: Self::Action,
        _core: &SessionCore,
        _state: &mut PluginState<Self>,
    ) -> Result<(), String> {
        Err("Game does not support player actions".to_string())
    }
}
