use super::Session;
use crate::error::Rejection;
use crate::types::*;

impl Session {
    /// Record one vote and award the target immediately
    pub fn record_vote(&mut self, voter_id: &str, target_id: &str) -> Result<(), Rejection> {
        self.require_phase(GamePhase::Reveal, "vote")?;
        if voter_id == target_id {
            return Err(Rejection::SelfVote(voter_id.to_string()));
        }

        let voter = self.player_index(voter_id)?;
        let target = self.player_index(target_id)?;
        if self.state.players[voter].voted_target_id.is_some() {
            return Err(Rejection::AlreadyVoted(voter_id.to_string()));
        }

        self.state.players[voter].voted_target_id = Some(target_id.to_string());
        let target = &mut self.state.players[target];
        target.votes_received += 1;
        target.score += VOTE_AWARD;

        tracing::debug!("{} voted for {}", voter_id, target_id);
        Ok(())
    }
}
