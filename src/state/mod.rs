//! Host-side replication engine
//!
//! [`Session`] is the only writer of [`SessionState`]. Every operation either
//! fails with a [`Rejection`] and leaves the state untouched, or applies its
//! whole change; the host actor broadcasts a snapshot after each success.
//! Operations are grouped by concern across the submodules.

mod clock;
mod lobby;
mod round;
mod stage;
mod vote;

pub use stage::{AiStage, RoastRequest};

use crate::config::GameConfig;
use crate::error::Rejection;
use crate::types::*;

pub struct Session {
    state: SessionState,
    config: GameConfig,
}

impl Session {
    /// Fresh session in the `Home` phase, before any room exists
    pub fn new(config: GameConfig) -> Self {
        Self {
            state: SessionState::default(),
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// Round number used to tag asynchronous results
    pub fn round(&self) -> u32 {
        self.state.settings.current_round
    }

    /// Mark a committed mutation
    pub(crate) fn bump_version(&mut self) -> u64 {
        self.state.version += 1;
        self.state.version
    }

    fn require_phase(&self, expected: GamePhase, action: &'static str) -> Result<(), Rejection> {
        if self.state.phase != expected {
            return Err(Rejection::WrongPhase {
                action,
                phase: self.state.phase,
            });
        }
        Ok(())
    }

    fn player_index(&self, id: &str) -> Result<usize, Rejection> {
        self.state
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Rejection::UnknownPlayer(id.to_string()))
    }

    fn enter_phase(&mut self, phase: GamePhase) {
        tracing::info!("Phase {:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
    }
}
