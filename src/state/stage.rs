use super::Session;
use crate::ai::Sketch;
use crate::error::Rejection;
use crate::prompts::MISSING_NOUN;
use crate::types::*;

/// What the host must do after arriving in `Combining`
#[derive(Debug)]
pub enum AiStage {
    /// Nobody drew anything; the session already moved to `Results`
    Skipped,
    /// Hand these sketches to the collaborator
    Pending(Vec<Sketch>),
}

/// Input for the end-of-round judge call
#[derive(Debug, Clone, PartialEq)]
pub struct RoastRequest {
    pub image: String,
    pub judge: JudgeStyle,
    pub nouns: Vec<String>,
}

impl Session {
    fn require_round(&self, round: u32) -> Result<(), Rejection> {
        let current = self.round();
        if round != current {
            return Err(Rejection::StaleRound { got: round, current });
        }
        Ok(())
    }

    /// Collect every submitted drawing together with its prompt
    pub fn begin_ai_stage(&mut self) -> Result<AiStage, Rejection> {
        self.require_phase(GamePhase::Combining, "combine")?;

        let sketches: Vec<Sketch> = self
            .state
            .players
            .iter()
            .filter(|p| p.has_drawing())
            .filter_map(|p| {
                p.drawing.clone().map(|image| Sketch {
                    image,
                    slots: p.slots.clone(),
                })
            })
            .collect();

        if sketches.is_empty() {
            tracing::info!("No drawings this round, skipping the AI stage");
            self.enter_phase(GamePhase::Results);
            return Ok(AiStage::Skipped);
        }
        Ok(AiStage::Pending(sketches))
    }

    pub fn complete_ai_stage(
        &mut self,
        round: u32,
        combined_image: String,
        trivia: TriviaQuestion,
    ) -> Result<(), Rejection> {
        self.require_round(round)?;
        self.require_phase(GamePhase::Combining, "complete AI stage")?;

        self.state.combined_image = Some(combined_image);
        self.state.trivia = Some(trivia);
        self.state.time_left = self.state.settings.trivia_time;
        self.enter_phase(GamePhase::Trivia);
        Ok(())
    }

    /// Skip straight to results after a failed AI stage
    pub fn abort_ai_stage(&mut self, round: u32) -> Result<(), Rejection> {
        self.require_round(round)?;
        self.require_phase(GamePhase::Combining, "abort AI stage")?;

        self.state.time_left = 0;
        self.enter_phase(GamePhase::Results);
        Ok(())
    }

    /// A roast is due once results show a combined image without one
    pub fn roast_request(&self) -> Option<RoastRequest> {
        if self.state.phase != GamePhase::Results || self.state.judge_roast.is_some() {
            return None;
        }
        let image = self.state.combined_image.clone()?;
        let nouns = self
            .state
            .players
            .iter()
            .map(|p| {
                p.slots
                    .as_ref()
                    .map_or_else(|| MISSING_NOUN.to_string(), |s| s.noun.clone())
            })
            .collect();

        Some(RoastRequest {
            image,
            judge: self.state.settings.judge,
            nouns,
        })
    }

    pub fn record_roast(&mut self, round: u32, roast: String) -> Result<(), Rejection> {
        self.require_round(round)?;
        self.require_phase(GamePhase::Results, "record roast")?;
        if self.state.combined_image.is_none() {
            return Err(Rejection::WrongPhase {
                action: "record roast",
                phase: self.state.phase,
            });
        }

        self.state.judge_roast = Some(roast);
        Ok(())
    }
}
