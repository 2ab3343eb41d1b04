//! In-memory session token store.

use std::collections::HashMap;
use std::time::Duration;

use crate::{
    game::PlayerId,
    utils::{Timestamp, now_millis, random_alphanumeric},
};

/// Token length in characters (62-symbol alphabet, ~190 bits).
pub const SESSION_TOKEN_LENGTH: usize = 32;

/// Tokens older than this are swept (24 hours).
pub const DEFAULT_SESSION_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// A token bound to one player in one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub token: String,
    pub player_id: PlayerId,
    pub game_code: String,
    pub created_at: Timestamp,
}

/// Token store keyed by token, with a reverse index by `(game code, player id)`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, SessionData>,
    by_player: HashMap<(String, PlayerId), String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint an unguessable token.
    pub fn new_token() -> String {
        random_alphanumeric(SESSION_TOKEN_LENGTH)
    }

    /// Bind `token` to `player_id` in `game_code`.
    ///
    /// A player holds one token per game; binding a new one drops the old.
    pub fn create_session(&mut self, token: String, player_id: &str, game_code: &str) {
        let key = (game_code.to_string(), player_id.to_string());
        if let Some(previous) = self.by_player.remove(&key) {
            self.sessions.remove(&previous);
        }

        self.sessions.insert(
            token.clone(),
            SessionData {
                token: token.clone(),
                player_id: player_id.to_string(),
                game_code: game_code.to_string(),
                created_at: now_millis(),
            },
        );
        self.by_player.insert(key, token);
    }

    /// Look up a token; it must exist and belong to `game_code`.
    pub fn validate_session(&self, token: &str, game_code: &str) -> Option<&SessionData> {
        self.sessions
            .get(token)
            .filter(|session| session.game_code == game_code)
    }

    pub fn session_for_player(&self, player_id: &str, game_code: &str) -> Option<&SessionData> {
        self.by_player
            .get(&(game_code.to_string(), player_id.to_string()))
            .and_then(|token| self.sessions.get(token))
    }

    /// Delete a single token. Returns whether it existed.
    pub fn delete_session(&mut self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some(session) => {
                self.by_player
                    .remove(&(session.game_code, session.player_id));
                true
            }
            None => false,
        }
    }

    /// Delete every token issued for `game_code`. Returns how many were removed.
    pub fn delete_sessions_for_game(&mut self, game_code: &str) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.game_code != game_code);
        self.by_player.retain(|(code, _), _| code != game_code);
        before - self.sessions.len()
    }

    /// Delete tokens created more than `max_age` before `now`.
    pub fn cleanup_old_sessions(&mut self, now: Timestamp, max_age: Duration) -> usize {
        let max_age_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
        let expired: Vec<String> = self
            .sessions
            .values()
            .filter(|session| now.saturating_sub(session.created_at) > max_age_ms)
            .map(|session| session.token.clone())
            .collect();

        for token in &expired {
            self.delete_session(token);
        }

        if !expired.is_empty() {
            log::debug!("Swept {} expired session token(s)", expired.len());
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
