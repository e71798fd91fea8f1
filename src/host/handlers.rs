//! Peer message dispatch
//!
//! Every message a client sends ends up here, on the host actor. Sender
//! identity is checked first, then the message is applied to the session.

use crate::error::Rejection;
use crate::protocol::{Ephemeral, Message, Origin, SubmitDrawing, Vote};
use crate::state::Session;

/// What the actor should do after a peer message
#[derive(Debug, PartialEq)]
pub enum Dispatch {
    /// Session changed; commit and broadcast
    Mutated,
    /// Pass through to the other peers without touching the session
    Relay(Ephemeral),
    /// Protocol violation or invalid action; state untouched
    Dropped(Rejection),
}

impl From<Result<(), Rejection>> for Dispatch {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Dispatch::Mutated,
            Err(rejection) => Dispatch::Dropped(rejection),
        }
    }
}

/// Macro to drop messages whose acting or sending id is not the peer's own
macro_rules! check_sender {
    ($peer:expr, $claimed:expr) => {
        if $peer != $claimed.as_str() {
            return Dispatch::Dropped(Rejection::SenderMismatch {
                peer: $peer.to_string(),
                claimed: $claimed.clone(),
            });
        }
    };
}

pub fn handle_message(session: &mut Session, peer: &str, message: Message) -> Dispatch {
    if message.origin() == Origin::Host {
        return Dispatch::Dropped(Rejection::HostOnly(message.kind()));
    }
    match message.into_ephemeral() {
        Ok(ephemeral) => {
            check_sender!(peer, ephemeral.sender_id());
            Dispatch::Relay(ephemeral)
        }
        Err(action) => apply_action(session, peer, action),
    }
}

fn apply_action(session: &mut Session, peer: &str, action: Message) -> Dispatch {
    match action {
        Message::PlayerJoined(record) => {
            check_sender!(peer, record.id);
            session.admit_player(record).into()
        }

        Message::ActionSubmitDrawing(SubmitDrawing { id, drawing }) => {
            check_sender!(peer, id);
            session.record_drawing(&id, drawing).into()
        }

        Message::ActionVote(Vote {
            voter_id,
            target_id,
        }) => {
            check_sender!(peer, voter_id);
            session.record_vote(&voter_id, &target_id).into()
        }

        other => Dispatch::Dropped(Rejection::HostOnly(other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::*;
    use crate::types::*;

    #[test]
    fn test_join_from_matching_peer() {
        let mut session = lobby(&[]);
        let dispatch = handle_message(&mut session, "p1", Message::PlayerJoined(player("p1")));

        assert_eq!(dispatch, Dispatch::Mutated);
        assert!(session.state().contains_player("p1"));
    }

    #[test]
    fn test_join_on_behalf_of_someone_else() {
        let mut session = lobby(&[]);
        let dispatch = handle_message(&mut session, "p1", Message::PlayerJoined(player("p2")));

        assert!(matches!(
            dispatch,
            Dispatch::Dropped(Rejection::SenderMismatch { ref claimed, .. }) if claimed == "p2"
        ));
        assert_eq!(session.state().players.len(), 1);
    }

    #[test]
    fn test_duplicate_join_dropped() {
        let mut session = lobby(&["p1"]);
        let before = session.snapshot();
        let dispatch = handle_message(&mut session, "p1", Message::PlayerJoined(player("p1")));

        assert!(matches!(dispatch, Dispatch::Dropped(Rejection::DuplicatePlayer(_))));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_client_state_update_is_host_only() {
        let mut session = lobby(&["p1"]);
        let mut forged = session.snapshot();
        forged.phase = GamePhase::GrandFinale;

        let dispatch = handle_message(&mut session, "p1", Message::GameStateUpdate(forged));
        assert_eq!(dispatch, Dispatch::Dropped(Rejection::HostOnly("GAME_STATE_UPDATE")));
        assert_eq!(session.phase(), GamePhase::LobbyWaiting);
    }

    #[test]
    fn test_drawing_and_vote_require_matching_peer() {
        let mut session = drawing_phase(&["p1", "p2"]);
        let forged = Message::ActionSubmitDrawing(SubmitDrawing {
            id: "p2".to_string(),
            drawing: sketch(),
        });
        assert!(matches!(
            handle_message(&mut session, "p1", forged),
            Dispatch::Dropped(Rejection::SenderMismatch { .. })
        ));
        assert!(session.state().player("p2").unwrap().drawing.is_none());

        let mut session = reveal_phase(&["p1", "p2"]);
        let forged = Message::ActionVote(Vote {
            voter_id: "p2".to_string(),
            target_id: "p1".to_string(),
        });
        assert!(matches!(
            handle_message(&mut session, "p1", forged),
            Dispatch::Dropped(Rejection::SenderMismatch { .. })
        ));

        let honest = Message::ActionVote(Vote {
            voter_id: "p1".to_string(),
            target_id: "p2".to_string(),
        });
        assert_eq!(handle_message(&mut session, "p1", honest), Dispatch::Mutated);
        assert_eq!(session.state().player("p2").unwrap().score, VOTE_AWARD);
    }

    #[test]
    fn test_chat_is_relayed_untouched() {
        let mut session = lobby(&["p1"]);
        let before = session.snapshot();
        let line = ChatLine::new("p1", "p1", "gg".to_string());

        let dispatch = handle_message(&mut session, "p1", Message::Chat(line.clone()));
        assert_eq!(dispatch, Dispatch::Relay(Ephemeral::Chat(line)));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn test_chat_under_another_name_dropped() {
        let mut session = lobby(&["p1", "p2"]);
        let line = ChatLine::new("p2", "p2", "I concede".to_string());

        let dispatch = handle_message(&mut session, "p1", Message::Chat(line));
        assert!(matches!(
            dispatch,
            Dispatch::Dropped(Rejection::SenderMismatch { ref claimed, .. }) if claimed == "p2"
        ));

        let item = GraffitiItem::scatter(HOST_PLAYER_ID, "💩");
        assert!(matches!(
            handle_message(&mut session, "p1", Message::Graffiti(item)),
            Dispatch::Dropped(Rejection::SenderMismatch { .. })
        ));
    }
}
