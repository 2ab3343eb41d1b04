//! Game lifecycle status and configuration models.

use serde::{Deserialize, Serialize};

use crate::plugin::PluginInfo;

/// Lifecycle status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Lobby,
    InProgress,
    BetweenRounds,
    Ended,
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Lobby => write!(f, "lobby"),
            GameStatus::InProgress => write!(f, "in_progress"),
            GameStatus::BetweenRounds => write!(f, "between_rounds"),
            GameStatus::Ended => write!(f, "ended"),
        }
    }
}

/// Configuration snapshot taken when a game is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub min_players: usize,
    pub max_players: usize,
    pub total_rounds: u32,
    /// Per-round time limit in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_time_limit: Option<u64>,
    /// Free-form game-specific settings, interpreted only by the plugin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_config: Option<serde_json::Value>,
}

impl GameConfig {
    /// Build a config from plugin defaults and creator overrides.
    pub fn from_plugin(info: &PluginInfo, overrides: GameOverrides) -> Result<Self, String> {
        let total_rounds = overrides.total_rounds.unwrap_or(info.default_rounds);
        if total_rounds == 0 {
            return Err("totalRounds must be at least 1".to_string());
        }
        if overrides.round_time_limit == Some(0) {
            return Err("roundTimeLimit must be greater than 0".to_string());
        }

        Ok(Self {
            min_players: info.min_players,
            max_players: info.max_players,
            total_rounds,
            round_time_limit: overrides.round_time_limit,
            custom_config: overrides.custom_config,
        })
    }
}

/// Optional settings supplied with `game:create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverrides {
    #[serde(default)]
    pub total_rounds: Option<u32>,
    #[serde(default)]
    pub round_time_limit: Option<u64>,
    #[serde(default)]
    pub custom_config: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> PluginInfo {
        PluginInfo {
            id: "test".to_string(),
            name: "Test".to_string(),
            min_players: 2,
            max_players: 8,
            default_rounds: 3,
            mutable_responses: false,
            host_controlled_rounds: false,
            supports_actions: false,
        }
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&GameStatus::BetweenRounds).unwrap(),
            "\"between_rounds\""
        );
        assert_eq!(GameStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_config_defaults_from_plugin() {
        let config = GameConfig::from_plugin(&info(), GameOverrides::default()).unwrap();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.max_players, 8);
        assert_eq!(config.total_rounds, 3);
        assert!(config.round_time_limit.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let overrides: GameOverrides = serde_json::from_value(serde_json::json!({
            "totalRounds": 7,
            "roundTimeLimit": 15000,
            "customConfig": { "theme": "space" }
        }))
        .unwrap();
        let config = GameConfig::from_plugin(&info(), overrides).unwrap();
        assert_eq!(config.total_rounds, 7);
        assert_eq!(config.round_time_limit, Some(15_000));
        assert_eq!(config.custom_config.unwrap()["theme"], "space");
    }

    #[test]
    fn test_config_rejects_zero_rounds() {
        let overrides = GameOverrides {
            total_rounds: Some(0),
            ..Default::default()
        };
        assert!(GameConfig::from_plugin(&info(), overrides).is_err());
    }

    #[test]
    fn test_config_rejects_zero_time_limit() {
        let overrides = GameOverrides {
            round_time_limit: Some(0),
            ..Default::default()
        };
        let err = GameConfig::from_plugin(&info(), overrides).unwrap_err();
        assert!(err.contains("roundTimeLimit"));
    }
}
