//! Server configuration from the environment.

use slidetoe_core::BotDifficulty;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AI_DELAY_MS: u64 = 1000;
const MAX_AI_DELAY_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SERVER_ADDR is not a socket address: {0}")]
    Addr(#[from] AddrParseError),

    #[error("AI_MOVE_DELAY_MS is not a number of milliseconds: {0}")]
    Delay(String),

    #[error("BOT_DIFFICULTY: {0}")]
    Bot(String),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Pause before the AI plays, for pacing on the client side
    pub ai_delay: Duration,
    /// Opponent for single-player rooms that don't name one
    pub default_bot: BotDifficulty,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            ai_delay: Duration::from_millis(DEFAULT_AI_DELAY_MS),
            default_bot: BotDifficulty::default(),
        }
    }
}

impl ServerConfig {
    /// Read `SERVER_ADDR`, `AI_MOVE_DELAY_MS` and `BOT_DIFFICULTY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()?;

        let delay_ms = match lookup("AI_MOVE_DELAY_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Delay(raw))?,
            None => DEFAULT_AI_DELAY_MS,
        };

        let default_bot = match lookup("BOT_DIFFICULTY") {
            Some(raw) => raw.parse().map_err(ConfigError::Bot)?,
            None => BotDifficulty::default(),
        };

        Ok(Self {
            addr,
            ai_delay: Duration::from_millis(delay_ms.min(MAX_AI_DELAY_MS)),
            default_bot,
        })
    }
}
