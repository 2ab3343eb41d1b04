//! Per-viewer projections of a session.
//!
//! These structs are the only thing ever serialized to clients. A field is
//! visible only if it is listed here; hidden state has no slot at all, and a
//! player view carries at most that player's own private entry.

use serde::Serialize;

use super::{
    config::GameStatus,
    core::SessionCore,
    player::{Player, PlayerPublic},
};
use crate::utils::Timestamp;

/// What the shared display sees.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayView<'a, Pu> {
    pub code: &'a str,
    pub status: GameStatus,
    pub game_type: &'a str,
    pub players: Vec<PlayerPublic>,
    pub host_id: Option<&'a str>,
    pub current_round: u32,
    pub total_rounds: u32,
    pub round_started_at: Option<Timestamp>,
    pub round_time_limit: Option<u64>,
    pub public_state: Option<&'a Pu>,
}

impl<'a, Pu> DisplayView<'a, Pu> {
    pub fn new(core: &'a SessionCore, public_state: Option<&'a Pu>) -> Self {
        Self {
            code: &core.code,
            status: core.status,
            game_type: &core.game_type,
            players: core.players.iter().map(PlayerPublic::from).collect(),
            host_id: core.host_id.as_deref(),
            current_round: core.current_round,
            total_rounds: core.config.total_rounds,
            round_started_at: core.round_started_at,
            round_time_limit: core.round_time_limit,
            public_state,
        }
    }
}

/// What one player sees: the display view plus their own private slice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView<'a, Pu, Pr> {
    #[serde(flatten)]
    pub shared: DisplayView<'a, Pu>,
    pub private_state: Option<&'a Pr>,
    pub self_id: &'a str,
    pub is_host: bool,
}

impl<'a, Pu, Pr> PlayerView<'a, Pu, Pr> {
    pub fn new(
        core: &'a SessionCore,
        public_state: Option<&'a Pu>,
        private_state: Option<&'a Pr>,
        player: &'a Player,
    ) -> Self {
        Self {
            shared: DisplayView::new(core, public_state),
            private_state,
            self_id: &player.id,
            is_host: player.is_host,
        }
    }
}
