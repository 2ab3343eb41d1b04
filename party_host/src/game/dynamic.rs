//! Type-erased sessions.
//!
//! The manager keeps sessions of every game type in one map, so it needs an
//! object-safe face. JSON crosses this boundary: payloads from the wire are
//! decoded into the plugin's associated types here, and typed round data,
//! results and views are encoded back to [`Value`].

use serde::Serialize;
use serde_json::Value;

use super::{
    core::SessionCore,
    errors::{GameError, GameResult},
    session::GameSession,
};
use crate::plugin::{GamePlugin, PluginInfo};

/// Object-safe view of a [`GameSession`].
pub trait AnyGame: Send {
    fn core(&self) -> &SessionCore;
    fn core_mut(&mut self) -> &mut SessionCore;
    fn info(&self) -> &PluginInfo;

    fn start_game(&mut self) -> GameResult<()>;
    /// Open the next round; returns the serialized `RoundData`.
    fn start_round(&mut self) -> GameResult<Value>;
    /// Decode and record a response. Returns whether the round is complete.
    fn submit_response(&mut self, player_id: &str, response: Value) -> GameResult<bool>;
    fn handle_player_action(&mut self, player_id: &str, action: Value) -> GameResult<()>;
    fn all_responses_received(&self) -> bool;
    /// Resolve the round; returns the serialized `RoundResults`.
    fn end_round(&mut self) -> GameResult<Value>;
    /// End the game; returns the serialized `FinalResults`.
    fn end_game(&mut self) -> GameResult<Value>;
    fn reset_for_new_game(&mut self);
    fn should_auto_advance(&self) -> bool;

    fn display_view(&self) -> GameResult<Value>;
    /// `None` if `player_id` is not in this game.
    fn player_view(&self, player_id: &str) -> Option<GameResult<Value>>;
}

fn encode<T: Serialize>(value: T) -> GameResult<Value> {
    serde_json::to_value(value).map_err(GameError::from)
}

impl<P: GamePlugin> AnyGame for GameSession<P> {
    fn core(&self) -> &SessionCore {
        GameSession::core(self)
    }

    fn core_mut(&mut self) -> &mut SessionCore {
        GameSession::core_mut(self)
    }

    fn info(&self) -> &PluginInfo {
        GameSession::info(self)
    }

    fn start_game(&mut self) -> GameResult<()> {
        GameSession::start_game(self)
    }

    fn start_round(&mut self) -> GameResult<Value> {
        encode(GameSession::start_round(self)?)
    }

    fn submit_response(&mut self, player_id: &str, response: Value) -> GameResult<bool> {
        let response: P::Response = serde_json::from_value(response)
            .map_err(|e| GameError::InvalidResponse(format!("Invalid response: {e}")))?;
        GameSession::submit_response(self, player_id, response)
    }

    fn handle_player_action(&mut self, player_id: &str, action: Value) -> GameResult<()> {
        if !self.info().supports_actions {
            return Err(GameError::ActionsUnsupported);
        }
        let action: P::Action = serde_json::from_value(action)
            .map_err(|e| GameError::InvalidResponse(format!("Invalid action: {e}")))?;
        GameSession::handle_player_action(self, player_id, action)
    }

    fn all_responses_received(&self) -> bool {
        GameSession::all_responses_received(self)
    }

    fn end_round(&mut self) -> GameResult<Value> {
        encode(GameSession::end_round(self)?)
    }

    fn end_game(&mut self) -> GameResult<Value> {
        encode(GameSession::end_game(self)?)
    }

    fn reset_for_new_game(&mut self) {
        GameSession::reset_for_new_game(self)
    }

    fn should_auto_advance(&self) -> bool {
        GameSession::should_auto_advance(self)
    }

    fn display_view(&self) -> GameResult<Value> {
        encode(GameSession::display_view(self))
    }

    fn player_view(&self, player_id: &str) -> Option<GameResult<Value>> {
        GameSession::player_view(self, player_id).map(encode)
    }
}
