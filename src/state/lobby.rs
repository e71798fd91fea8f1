use super::Session;
use crate::error::Rejection;
use crate::prompts::random_slots;
use crate::room::RoomCode;
use crate::types::*;

impl Session {
    /// Open the lobby with the host as the only player
    pub fn create_session(
        &mut self,
        code: &RoomCode,
        host_profile: PlayerProfile,
    ) -> Result<(), Rejection> {
        if matches!(
            self.state.phase,
            GamePhase::Home | GamePhase::ProfileSetup | GamePhase::JoinRoom
        ) {
            self.state.players = vec![Player::host(host_profile)];
            self.state.settings = self.config.settings(code.as_str());
            self.state.time_left = 0;
            self.state.combined_image = None;
            self.state.trivia = None;
            self.state.judge_roast = None;
            self.enter_phase(GamePhase::LobbyWaiting);
            tracing::info!("Session {} created", code);
            Ok(())
        } else {
            Err(Rejection::WrongPhase {
                action: "create session",
                phase: self.state.phase,
            })
        }
    }

    /// Append a joining player while the lobby is open
    pub fn admit_player(&mut self, mut record: Player) -> Result<(), Rejection> {
        self.require_phase(GamePhase::LobbyWaiting, "join")?;

        if record.id == HOST_PLAYER_ID || record.is_host {
            return Err(Rejection::ReservedId);
        }
        if self.state.contains_player(&record.id) {
            return Err(Rejection::DuplicatePlayer(record.id));
        }
        if self.state.players.len() >= self.config.max_players {
            return Err(Rejection::LobbyFull(self.state.players.len()));
        }

        // Clients do not get to pick their own score or round data
        record.score = 0;
        record.reset_round();

        tracing::info!("Admitted player {} ({})", record.name, record.id);
        self.state.players.push(record);
        Ok(())
    }

    /// Leave the lobby and deal everyone a prompt
    pub fn start_game(&mut self) -> Result<(), Rejection> {
        self.require_phase(GamePhase::LobbyWaiting, "start game")?;

        self.state.settings.current_round = 1;
        self.enter_phase(GamePhase::PromptSelection);
        self.deal_prompts()
    }

    /// Give every player a fresh random triple
    pub fn deal_prompts(&mut self) -> Result<(), Rejection> {
        self.require_phase(GamePhase::PromptSelection, "deal prompts")?;

        for player in &mut self.state.players {
            player.slots = Some(random_slots());
        }
        Ok(())
    }
}
