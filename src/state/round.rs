use super::Session;
use crate::error::Rejection;
use crate::prompts::random_slots;
use crate::types::*;

impl Session {
    /// Lock in the dealt prompts and start the drawing countdown
    pub fn confirm_prompt(&mut self) -> Result<(), Rejection> {
        self.require_phase(GamePhase::PromptSelection, "confirm prompt")?;

        for player in &mut self.state.players {
            if player.slots.is_none() {
                player.slots = Some(random_slots());
            }
        }

        self.state.time_left = self.state.settings.round_time;
        self.enter_phase(GamePhase::Drawing);
        Ok(())
    }

    /// Store a player's drawing; resubmission overwrites. Once everyone has
    /// drawn, the round moves on to combining without waiting for the clock.
    pub fn record_drawing(&mut self, player_id: &str, drawing: String) -> Result<(), Rejection> {
        self.require_phase(GamePhase::Drawing, "submit drawing")?;
        if drawing.trim().is_empty() {
            return Err(Rejection::EmptyDrawing);
        }
        let idx = self.player_index(player_id)?;

        self.state.players[idx].drawing = Some(drawing);
        tracing::debug!("Drawing received from {}", player_id);

        if self.state.players.iter().all(Player::has_drawing) {
            self.state.time_left = 0;
            self.enter_phase(GamePhase::Combining);
        }
        Ok(())
    }

    pub fn show_results(&mut self) -> Result<(), Rejection> {
        self.require_phase(GamePhase::Reveal, "show results")?;
        self.enter_phase(GamePhase::Results);
        Ok(())
    }

    /// Clear round data and return to prompt selection; scores carry over
    pub fn next_round(&mut self) -> Result<(), Rejection> {
        self.require_phase(GamePhase::Results, "next round")?;

        self.state.combined_image = None;
        self.state.trivia = None;
        self.state.judge_roast = None;
        self.state.time_left = 0;
        for player in &mut self.state.players {
            player.reset_round();
        }
        self.state.settings.current_round += 1;
        if self.state.settings.current_round > self.state.settings.rounds {
            tracing::debug!(
                "Playing bonus round {} of {}",
                self.state.settings.current_round,
                self.state.settings.rounds
            );
        }

        self.enter_phase(GamePhase::PromptSelection);
        Ok(())
    }

    pub fn finish_game(&mut self) -> Result<(), Rejection> {
        self.require_phase(GamePhase::Results, "finish game")?;
        self.enter_phase(GamePhase::GrandFinale);
        Ok(())
    }
}
