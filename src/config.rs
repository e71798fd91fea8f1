use crate::types::{GameSettings, JudgeStyle};
use std::net::SocketAddr;
use std::str::FromStr;

/// 8082 spells "PR" in ASCII
pub const DEFAULT_BIND: &str = "0.0.0.0:8082";

/// Read an env var, treating blank values as unset
pub(crate) fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

pub(crate) fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = env_string(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable value for {}: {:?}", key, raw);
            None
        }
    }
}

/// Round and lobby configuration for a hosted session
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub drawing_seconds: u32,
    pub trivia_seconds: u32,
    pub rounds: u32,
    pub max_players: usize,
    pub judge: JudgeStyle,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            drawing_seconds: 60,
            trivia_seconds: 15,
            rounds: 3,
            max_players: 8,
            judge: JudgeStyle::Roast,
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            drawing_seconds: env_parse("PROMPTED_DRAWING_SECONDS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.drawing_seconds),
            trivia_seconds: env_parse("PROMPTED_TRIVIA_SECONDS")
                .filter(|s| *s > 0)
                .unwrap_or(defaults.trivia_seconds),
            rounds: env_parse("PROMPTED_ROUNDS")
                .filter(|r| *r > 0)
                .unwrap_or(defaults.rounds),
            max_players: env_parse("PROMPTED_MAX_PLAYERS")
                .filter(|m| *m > 0)
                .unwrap_or(defaults.max_players),
            judge: env_string("PROMPTED_JUDGE")
                .and_then(|name| JudgeStyle::from_name(&name))
                .unwrap_or(defaults.judge),
        }
    }

    /// Replicated settings for a fresh session
    pub fn settings(&self, room_code: &str) -> GameSettings {
        GameSettings {
            round_time: self.drawing_seconds,
            trivia_time: self.trivia_seconds,
            rounds: self.rounds,
            current_round: 1,
            room_code: room_code.to_string(),
            judge: self.judge,
        }
    }
}

/// Where the host accepts peer connections
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind: SocketAddr,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8082)),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self {
            bind: env_parse("PROMPTED_BIND").unwrap_or_else(|| Self::default().bind),
        }
    }
}
