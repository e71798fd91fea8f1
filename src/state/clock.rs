use super::Session;
use crate::error::Rejection;
use crate::types::*;

impl Session {
    /// Whether the phase clock should be ticking
    pub fn is_counting_down(&self) -> bool {
        self.state.time_left > 0
    }

    /// One second of the phase clock: decrement, and on reaching zero expire
    /// the timed phase.
    pub fn tick(&mut self) -> Result<(), Rejection> {
        if self.state.time_left == 0 {
            return Err(Rejection::NoCountdown);
        }

        self.state.time_left -= 1;
        if self.state.time_left == 0 {
            match self.state.phase {
                GamePhase::Drawing => self.enter_phase(GamePhase::Combining),
                GamePhase::Trivia => self.enter_phase(GamePhase::Reveal),
                phase => tracing::debug!("Countdown ran out during {:?}", phase),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Rejection;
    use crate::state::test_support::*;
    use crate::types::*;

    #[test]
    fn test_tick_decrements() {
        let mut session = drawing_phase(&["p1"]);
        session.tick().unwrap();
        assert_eq!(session.state().time_left, 59);
        assert_eq!(session.phase(), GamePhase::Drawing);
    }

    #[test]
    fn test_drawing_expires_into_combining() {
        let mut session = drawing_phase(&["p1"]);
        session.state.time_left = 1;

        session.tick().unwrap();
        assert_eq!(session.phase(), GamePhase::Combining);
        assert_eq!(session.state().time_left, 0);
        assert!(!session.is_counting_down());
    }

    #[test]
    fn test_trivia_expires_into_reveal() {
        let session = reveal_phase(&["p1"]);
        assert_eq!(session.state().time_left, 0);
        assert!(session.state().trivia.is_some());
    }

    #[test]
    fn test_tick_without_countdown() {
        let mut session = lobby(&["p1"]);
        let before = session.snapshot();
        assert_eq!(session.tick(), Err(Rejection::NoCountdown));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_full_drawing_countdown() {
        let mut session = drawing_phase(&["p1"]);
        let mut ticks = 0;
        while session.is_counting_down() {
            session.tick().unwrap();
            ticks += 1;
        }
        assert_eq!(ticks, 60);
        assert_eq!(session.phase(), GamePhase::Combining);
    }
}
