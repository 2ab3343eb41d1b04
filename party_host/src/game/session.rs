//! Typed game session: the lifecycle state machine around one plugin.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::{
    config::GameStatus,
    core::SessionCore,
    errors::{GameError, GameResult},
    filter::{DisplayView, PlayerView},
    player::PlayerId,
};
use crate::{
    plugin::{GamePlugin, PlayerResponse, PluginInfo, PluginState},
    utils::{Timestamp, now_millis},
};

/// A freshly opened round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundData<R> {
    pub round_number: u32,
    pub data: R,
    pub time_limit: Option<u64>,
    pub started_at: Timestamp,
}

/// Outcome of resolving a round.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResults<R> {
    pub round_number: u32,
    pub results: R,
    pub scores: HashMap<PlayerId, i64>,
    pub score_changes: HashMap<PlayerId, i64>,
}

/// One line of the final leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub player_id: PlayerId,
    pub player_name: String,
    pub score: i64,
    /// 1-based position
    pub rank: usize,
}

/// Outcome of ending the game.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalResults<F> {
    pub rankings: Vec<Ranking>,
    pub game_data: F,
}

/// A game session bound to plugin `P`.
pub struct GameSession<P: GamePlugin> {
    core: SessionCore,
    plugin: Arc<P>,
    info: PluginInfo,
    state: Option<PluginState<P>>,
    responses: Vec<PlayerResponse<P::Response>>,
}

impl<P: GamePlugin> GameSession<P> {
    pub fn new(core: SessionCore, plugin: Arc<P>, info: PluginInfo) -> Self {
        Self {
            core,
            plugin,
            info,
            state: None,
            responses: Vec::new(),
        }
    }

    pub fn core(&self) -> &SessionCore {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut SessionCore {
        &mut self.core
    }

    pub fn info(&self) -> &PluginInfo {
        &self.info
    }

    pub fn state(&self) -> Option<&PluginState<P>> {
        self.state.as_ref()
    }

    pub fn responses(&self) -> &[PlayerResponse<P::Response>] {
        &self.responses
    }

    pub fn has_responded(&self, player_id: &str) -> bool {
        self.responses.iter().any(|r| r.player_id == player_id)
    }

    /// Install the plugin's initial state and leave the lobby.
    ///
    /// Must be called once per game; a second call is rejected.
    pub fn start_game(&mut self) -> GameResult<()> {
        if self.core.status != GameStatus::Lobby {
            return Err(GameError::GameAlreadyStarted);
        }

        let player_ids: Vec<PlayerId> = self.core.players.iter().map(|p| p.id.clone()).collect();
        self.state = Some(
            self.plugin
                .create_initial_state(&player_ids, &self.core.config),
        );
        self.core.status = GameStatus::InProgress;
        self.core.current_round = 0;
        self.core.touch();

        log::info!(
            "Game {} ({}) started with {} players",
            self.core.code,
            self.core.game_type,
            player_ids.len()
        );
        Ok(())
    }

    /// Open the next round.
    ///
    /// Arms the round timer when the plugin asks for a time limit and rounds
    /// are not host-controlled.
    pub fn start_round(&mut self) -> GameResult<RoundData<P::RoundData>> {
        let Some(state) = self.state.as_mut() else {
            return Err(GameError::InvalidMessage("Game has not started".to_string()));
        };

        self.core.current_round += 1;
        self.responses.clear();

        let round = self.core.current_round;
        let start = self.plugin.on_round_start(round, &self.core, state);

        let started_at = now_millis();
        self.core.round_started_at = Some(started_at);
        self.core.round_time_limit = start.time_limit;
        self.core.status = GameStatus::InProgress;
        self.core.touch();

        match start.time_limit {
            Some(limit) if !self.info.host_controlled_rounds => self.core.arm_round_timer(limit),
            _ => self.core.cancel_round_timer(),
        }

        Ok(RoundData {
            round_number: round,
            data: start.round_data,
            time_limit: start.time_limit,
            started_at,
        })
    }

    /// Record a response. Returns whether the round is now complete.
    pub fn submit_response(&mut self, player_id: &str, response: P::Response) -> GameResult<bool> {
        if self.core.status != GameStatus::InProgress {
            return Err(GameError::InvalidMessage("No round in progress".to_string()));
        }
        if self.core.player(player_id).is_none() {
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        }
        let existing = self.responses.iter().position(|r| r.player_id == player_id);
        if existing.is_some() && !self.info.mutable_responses {
            return Err(GameError::AlreadyResponded);
        }

        let Some(state) = self.state.as_mut() else {
            return Err(GameError::InvalidMessage("Game has not started".to_string()));
        };
        self.plugin
            .validate_response(player_id, &response, &self.core, state)
            .map_err(GameError::InvalidResponse)?;
        self.plugin
            .on_response_received(player_id, &response, &self.core, state);

        let record = PlayerResponse {
            player_id: player_id.to_string(),
            response,
            received_at: now_millis(),
        };
        match existing {
            Some(index) => self.responses[index] = record,
            None => self.responses.push(record),
        }
        self.core.touch();

        Ok(self.all_responses_received())
    }

    /// True when every connected player has responded and the round may
    /// auto-complete. Always false for host-controlled rounds.
    pub fn all_responses_received(&self) -> bool {
        if self.info.host_controlled_rounds || self.core.status != GameStatus::InProgress {
            return false;
        }
        let mut connected = self.core.connected_players().peekable();
        connected.peek().is_some() && connected.all(|p| self.has_responded(&p.id))
    }

    /// Apply a live action outside response bookkeeping.
    pub fn handle_player_action(&mut self, player_id: &str, action: P::Action) -> GameResult<()> {
        if !self.info.supports_actions {
            return Err(GameError::ActionsUnsupported);
        }
        if self.core.player(player_id).is_none() {
            return Err(GameError::PlayerNotFound(player_id.to_string()));
        }

        let Some(state) = self.state.as_mut() else {
            return Err(GameError::InvalidMessage("Game has not started".to_string()));
        };
        self.plugin
            .on_player_action(player_id, action, &self.core, state)
            .map_err(GameError::InvalidResponse)?;
        self.core.touch();
        Ok(())
    }

    /// Resolve the open round, apply score changes and move to
    /// `between_rounds`.
    pub fn end_round(&mut self) -> GameResult<RoundResults<P::RoundResults>> {
        if self.core.status != GameStatus::InProgress {
            return Err(GameError::InvalidMessage("No round in progress".to_string()));
        }
        let Some(state) = self.state.as_mut() else {
            return Err(GameError::InvalidMessage("Game has not started".to_string()));
        };
        self.core.cancel_round_timer();

        let results = self
            .plugin
            .on_all_responses_received(&self.responses, &self.core, state);

        let current = self.core.scores();
        let updated = self
            .plugin
            .calculate_scores(&results, &current, &self.core);

        let mut score_changes = HashMap::new();
        for player in &mut self.core.players {
            if let Some(&score) = updated.get(&player.id) {
                score_changes.insert(player.id.clone(), score - player.score);
                player.score = score;
            }
        }

        self.core.status = GameStatus::BetweenRounds;
        self.core.round_started_at = None;
        self.core.round_time_limit = None;
        self.core.touch();

        Ok(RoundResults {
            round_number: self.core.current_round,
            results,
            scores: self.core.scores(),
            score_changes,
        })
    }

    /// Freeze the game and rank players.
    ///
    /// Final scores supplied by the plugin replace the running totals first.
    /// Ties keep join order.
    pub fn end_game(&mut self) -> GameResult<FinalResults<P::FinalResults>> {
        if !matches!(
            self.core.status,
            GameStatus::InProgress | GameStatus::BetweenRounds
        ) {
            return Err(GameError::InvalidMessage("Game is not running".to_string()));
        }
        let Some(state) = self.state.as_ref() else {
            return Err(GameError::InvalidMessage("Game has not started".to_string()));
        };

        self.core.cancel_round_timer();
        self.core.status = GameStatus::Ended;
        self.core.round_started_at = None;
        self.core.round_time_limit = None;

        let outcome = self.plugin.on_game_end(&self.core, state);
        if let Some(final_scores) = outcome.final_scores {
            for player in &mut self.core.players {
                if let Some(&score) = final_scores.get(&player.id) {
                    player.score = score;
                }
            }
        }
        self.core.touch();

        log::info!("Game {} ended after round {}", self.core.code, self.core.current_round);

        Ok(FinalResults {
            rankings: rank_players(&self.core),
            game_data: outcome.summary,
        })
    }

    /// Back to the lobby with zeroed scores, keeping the roster and host.
    pub fn reset_for_new_game(&mut self) {
        self.core.cancel_round_timer();
        self.core.reset_scores();
        self.core.status = GameStatus::Lobby;
        self.core.current_round = 0;
        self.core.round_started_at = None;
        self.core.round_time_limit = None;
        self.state = None;
        self.responses.clear();
        self.core.touch();
    }

    pub fn should_auto_advance(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| self.plugin.should_auto_advance(&self.core, state))
    }

    pub fn display_view(&self) -> DisplayView<'_, P::Public> {
        DisplayView::new(&self.core, self.state.as_ref().map(|s| &s.public))
    }

    /// View for `player_id`, or `None` if they are not in this game.
    pub fn player_view(&self, player_id: &str) -> Option<PlayerView<'_, P::Public, P::Private>> {
        let player = self.core.player(player_id)?;
        let private = self
            .state
            .as_ref()
            .and_then(|s| s.private.get(player_id));
        Some(PlayerView::new(
            &self.core,
            self.state.as_ref().map(|s| &s.public),
            private,
            player,
        ))
    }
}

fn rank_players(core: &SessionCore) -> Vec<Ranking> {
    let mut ordered: Vec<_> = core.players.iter().collect();
    // `sort_by` is stable, so equal scores keep join order.
    ordered.sort_by(|a, b| b.score.cmp(&a.score));

    ordered
        .into_iter()
        .enumerate()
        .map(|(index, player)| Ranking {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            score: player.score,
            rank: index + 1,
        })
        .collect()
}
