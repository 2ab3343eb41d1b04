//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{net::SocketAddr, time::Duration};

use party_host::HubConfig;

/// Default bind address when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: &str = "127.0.0.1:3001";

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus exporter address; metrics are not exported when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Game hub configuration
    pub hub: HubSettings,
    /// Per-connection flood protection
    pub rate_limits: RateLimitConfig,
}

/// Session and reaping timings handed to the game hub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubSettings {
    /// Seconds a disconnected player keeps their seat
    pub reconnect_grace_secs: u64,
    /// Seconds between stale-game sweeps
    pub reaper_interval_secs: u64,
    /// Idle seconds before an ended or empty game is reaped
    pub game_max_idle_secs: u64,
    /// Seconds before a session token is swept
    pub session_max_age_secs: u64,
    /// Outbound frames buffered per connection
    pub outbound_buffer: usize,
}

/// WebSocket message rate limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Messages allowed per second
    pub burst_limit: u32,
    /// Messages allowed per minute
    pub sustained_limit: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst_limit: 10,
            sustained_limit: 100,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Returns
    ///
    /// * `Result<ServerConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if an address variable is present but unparseable
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => parse_addr("SERVER_BIND")?.unwrap_or_else(default_bind),
        };
        let metrics_bind = parse_addr("METRICS_BIND")?;

        let hub = HubSettings {
            reconnect_grace_secs: parse_env_or("RECONNECT_GRACE_SECS", 30),
            reaper_interval_secs: parse_env_or("REAPER_INTERVAL_SECS", 300),
            game_max_idle_secs: parse_env_or("GAME_MAX_IDLE_SECS", 3600),
            session_max_age_secs: parse_env_or("SESSION_MAX_AGE_SECS", 86_400),
            outbound_buffer: parse_env_or("OUTBOUND_BUFFER", 256),
        };

        let defaults = RateLimitConfig::default();
        let rate_limits = RateLimitConfig {
            burst_limit: parse_env_or("WS_BURST_LIMIT", defaults.burst_limit),
            sustained_limit: parse_env_or("WS_SUSTAINED_LIMIT", defaults.sustained_limit),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            hub,
            rate_limits,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("RECONNECT_GRACE_SECS", self.hub.reconnect_grace_secs),
            ("REAPER_INTERVAL_SECS", self.hub.reaper_interval_secs),
            ("GAME_MAX_IDLE_SECS", self.hub.game_max_idle_secs),
            ("SESSION_MAX_AGE_SECS", self.hub.session_max_age_secs),
            ("OUTBOUND_BUFFER", self.hub.outbound_buffer as u64),
            ("WS_BURST_LIMIT", u64::from(self.rate_limits.burst_limit)),
            ("WS_SUSTAINED_LIMIT", u64::from(self.rate_limits.sustained_limit)),
        ];
        if let Some((var, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid {
                var: (*var).to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.rate_limits.sustained_limit < self.rate_limits.burst_limit {
            return Err(ConfigError::Invalid {
                var: "WS_SUSTAINED_LIMIT".to_string(),
                reason: format!(
                    "Must be at least the burst limit ({})",
                    self.rate_limits.burst_limit
                ),
            });
        }

        if self.metrics_bind == Some(self.bind) {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        Ok(())
    }

    /// Hub configuration derived from these settings.
    pub fn to_hub_config(&self) -> HubConfig {
        HubConfig {
            grace_period: Duration::from_secs(self.hub.reconnect_grace_secs),
            reap_interval: Duration::from_secs(self.hub.reaper_interval_secs),
            max_idle: Duration::from_secs(self.hub.game_max_idle_secs),
            session_max_age: Duration::from_secs(self.hub.session_max_age_secs),
            outbound_buffer: self.hub.outbound_buffer,
            ..HubConfig::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_bind: None,
            hub: HubSettings {
                reconnect_grace_secs: 30,
                reaper_interval_secs: 300,
                game_max_idle_secs: 3600,
                session_max_age_secs: 86_400,
                outbound_buffer: 256,
            },
            rate_limits: RateLimitConfig::default(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid address in {var}: {value}")]
    InvalidAddress { var: String, value: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

/// Parse an optional socket address variable. Unset or empty means `None`.
fn parse_addr(key: &str) -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidAddress {
                var: key.to_string(),
                value,
            }),
        _ => Ok(None),
    }
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bind_matches_constant() {
        assert_eq!(default_bind(), DEFAULT_BIND.parse().unwrap());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidAddress {
            var: "SERVER_BIND".to_string(),
            value: "nope".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("SERVER_BIND"));
        assert!(msg.contains("nope"));
    }

    #[test]
    fn test_config_validation_zero_grace() {
        let mut config = ServerConfig::default();
        config.hub.reconnect_grace_secs = 0;

        let err = config.validate().unwrap_err();
        let ConfigError::Invalid { var, .. } = err else {
            panic!("expected an invalid-value error");
        };
        assert_eq!(var, "RECONNECT_GRACE_SECS");
    }

    #[test]
    fn test_config_validation_zero_buffer() {
        let mut config = ServerConfig::default();
        config.hub.outbound_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_sustained_below_burst() {
        let mut config = ServerConfig::default();
        config.rate_limits = RateLimitConfig {
            burst_limit: 50,
            sustained_limit: 20,
        };

        let err = config.validate().unwrap_err();
        let ConfigError::Invalid { var, .. } = err else {
            panic!("expected an invalid-value error");
        };
        assert_eq!(var, "WS_SUSTAINED_LIMIT");
    }

    #[test]
    fn test_config_validation_metrics_on_server_port() {
        let config = ServerConfig {
            metrics_bind: Some(default_bind()),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_to_hub_config() {
        let mut config = ServerConfig::default();
        config.hub.reconnect_grace_secs = 45;
        config.hub.outbound_buffer = 64;

        let hub = config.to_hub_config();
        assert_eq!(hub.grace_period, Duration::from_secs(45));
        assert_eq!(hub.reap_interval, Duration::from_secs(300));
        assert_eq!(hub.max_idle, Duration::from_secs(3600));
        assert_eq!(hub.session_max_age, Duration::from_secs(86_400));
        assert_eq!(hub.outbound_buffer, 64);
        assert_eq!(hub.inbox_capacity, HubConfig::default().inbox_capacity);
    }
}
