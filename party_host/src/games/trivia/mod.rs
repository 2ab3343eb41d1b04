//! Multiple-choice trivia.
//!
//! Each round shows one question with four options. Players answer with an
//! option index; correct answers score [`POINTS_CORRECT`].

pub mod questions;

pub use questions::{Difficulty, TriviaQuestion};

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    game::{GameConfig, PlayerId, SessionCore},
    plugin::{GameEndOutcome, GamePlugin, PlayerResponse, PluginInfo, PluginState, RoundStart},
};

pub const TRIVIA_ID: &str = "trivia";
pub const POINTS_CORRECT: i64 = 100;
/// Default round limit in milliseconds (30 seconds)
pub const ROUND_TIME_LIMIT: u64 = 30_000;

const OPTION_COUNT: i64 = 4;

/// Server-only trivia state.
#[derive(Debug, Clone, Default)]
pub struct TriviaHidden {
    pub questions: Vec<TriviaQuestion>,
    pub current_question: Option<TriviaQuestion>,
    pub player_answers: HashMap<PlayerId, i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaPublic {
    pub category: Option<String>,
    pub answered_count: usize,
    pub total_players: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaRoundData {
    pub question: String,
    pub options: [String; 4],
    pub category: String,
    pub question_number: u32,
    pub total_questions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub answer: i64,
    pub correct: bool,
    pub points: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaRoundResults {
    pub question: String,
    pub options: [String; 4],
    pub correct_index: usize,
    pub player_answers: HashMap<PlayerId, AnswerResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub correct: i64,
    pub total: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaFinalResults {
    pub total_questions: u32,
    pub player_stats: HashMap<PlayerId, PlayerStats>,
}

/// The trivia game type.
#[derive(Debug, Clone)]
pub struct TriviaPlugin {
    pool: Vec<TriviaQuestion>,
}

impl TriviaPlugin {
    /// Trivia over the bundled question bank.
    pub fn new() -> Self {
        Self {
            pool: questions::question_bank(),
        }
    }

    /// Trivia over an explicit question list. An empty list falls back to
    /// the bundled bank.
    pub fn with_questions(pool: Vec<TriviaQuestion>) -> Self {
        if pool.is_empty() {
            log::warn!("Empty trivia question list; using the bundled bank");
            return Self::new();
        }
        Self { pool }
    }
}

impl Default for TriviaPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl GamePlugin for TriviaPlugin {
    type Hidden = TriviaHidden;
    type Public = TriviaPublic;
    type Private = ();
    type Response = i64;
    type Action = ();
    type RoundData = TriviaRoundData;
    type RoundResults = TriviaRoundResults;
    type FinalResults = TriviaFinalResults;

    fn info(&self) -> PluginInfo {
        PluginInfo {
            id: TRIVIA_ID.to_string(),
            name: "Trivia".to_string(),
            min_players: 2,
            max_players: 20,
            default_rounds: 5,
            mutable_responses: false,
            host_controlled_rounds: false,
            supports_actions: false,
        }
    }

    fn create_initial_state(
        &self,
        player_ids: &[PlayerId],
        config: &GameConfig,
    ) -> PluginState<Self> {
        let hidden = TriviaHidden {
            questions: questions::pick_random(&self.pool, config.total_rounds as usize),
            current_question: None,
            player_answers: HashMap::new(),
        };
        let public = TriviaPublic {
            category: None,
            answered_count: 0,
            total_players: player_ids.len(),
        };
        PluginState::new(hidden, public)
    }

    fn on_round_start(
        &self,
        round: u32,
        core: &SessionCore,
        state: &mut PluginState<Self>,
    ) -> RoundStart<Self::RoundData> {
        // The pool is never empty, so neither is the pick. Games longer than
        // the pool cycle through it again.
        let questions = &state.hidden.questions;
        let index = (round.saturating_sub(1) as usize) % questions.len().max(1);
        let question = questions
            .get(index)
            .cloned()
            .unwrap_or_else(|| self.pool[0].clone());

        state.public.category = Some(question.category.clone());
        state.public.answered_count = 0;
        state.hidden.player_answers.clear();

        let round_data = TriviaRoundData {
            question: question.question.clone(),
            options: question.options.clone(),
            category: question.category.clone(),
            question_number: round,
            total_questions: core.total_rounds(),
        };
        state.hidden.current_question = Some(question);

        RoundStart {
            round_data,
            time_limit: Some(core.config().round_time_limit.unwrap_or(ROUND_TIME_LIMIT)),
        }
    }

    fn validate_response(
        &self,
        _player_id: &str,
        response: &i64,
        _core: &SessionCore,
        _state: &PluginState<Self>,
    ) -> Result<(), String> {
        if !(0..OPTION_COUNT).contains(response) {
            return Err("Invalid answer index".to_string());
        }
        Ok(())
    }

    fn on_response_received(
        &self,
        player_id: &str,
        response: &i64,
        _core: &SessionCore,
        state: &mut PluginState<Self>,
    ) {
        state
            .hidden
            .player_answers
            .insert(player_id.to_string(), *response);
        state.public.answered_count = state.hidden.player_answers.len();
    }

    fn on_all_responses_received(
        &self,
        responses: &[PlayerResponse<i64>],
        _core: &SessionCore,
        state: &mut PluginState<Self>,
    ) -> TriviaRoundResults {
        state.public.answered_count = 0;

        let Some(question) = state.hidden.current_question.as_ref() else {
            return TriviaRoundResults {
                question: String::new(),
                options: Default::default(),
                correct_index: 0,
                player_answers: HashMap::new(),
            };
        };

        let player_answers = responses
            .iter()
            .map(|r| {
                let correct = usize::try_from(r.response).ok() == Some(question.correct_index);
                let result = AnswerResult {
                    answer: r.response,
                    correct,
                    points: if correct { POINTS_CORRECT } else { 0 },
                };
                (r.player_id.clone(), result)
            })
            .collect();

        TriviaRoundResults {
            question: question.question.clone(),
            options: question.options.clone(),
            correct_index: question.correct_index,
            player_answers,
        }
    }

    fn calculate_scores(
        &self,
        results: &TriviaRoundResults,
        current_scores: &HashMap<PlayerId, i64>,
        _core: &SessionCore,
    ) -> HashMap<PlayerId, i64> {
        let mut scores = current_scores.clone();
        for (player_id, result) in &results.player_answers {
            *scores.entry(player_id.clone()).or_insert(0) += result.points;
        }
        scores
    }

    fn on_game_end(
        &self,
        core: &SessionCore,
        _state: &PluginState<Self>,
    ) -> GameEndOutcome<TriviaFinalResults> {
        let player_stats = core
            .players()
            .iter()
            .map(|p| {
                let stats = PlayerStats {
                    correct: p.score / POINTS_CORRECT,
                    total: core.total_rounds(),
                };
                (p.id.clone(), stats)
            })
            .collect();

        GameEndOutcome::summary(TriviaFinalResults {
            total_questions: core.total_rounds(),
            player_stats,
        })
    }
}
