use crate::types::{GamePhase, PeerId, PlayerId};
use std::time::Duration;

/// Reasons the host refuses to apply an action. Protocol violations from
/// clients end here and are dropped without a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("{action} is not allowed during {phase:?}")]
    WrongPhase {
        action: &'static str,
        phase: GamePhase,
    },

    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    #[error("lobby is full ({0} players)")]
    LobbyFull(usize),

    #[error("player record claims the host identity")]
    ReservedId,

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("player {0} cannot vote for themselves")]
    SelfVote(PlayerId),

    #[error("player {0} already voted this round")]
    AlreadyVoted(PlayerId),

    #[error("drawing payload is empty")]
    EmptyDrawing,

    #[error("only the host may send {0}")]
    HostOnly(&'static str),

    #[error("peer {peer} acted on behalf of {claimed}")]
    SenderMismatch { peer: PeerId, claimed: PlayerId },

    #[error("no countdown is running")]
    NoCountdown,

    #[error("result belongs to round {got}, current round is {current}")]
    StaleRound { got: u32, current: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection to {0} is closed")]
    Closed(PeerId),

    #[error("no listener at {0}")]
    Unreachable(String),

    #[error("address {0} is already in use")]
    AddressInUse(String),

    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

/// Input rejected at the client boundary before anything is sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("room code must be at least {min} characters")]
    RoomCodeTooShort { min: usize },

    #[error("room code must be at most {max} characters")]
    RoomCodeTooLong { max: usize },

    #[error("room code may only contain letters and digits")]
    RoomCodeCharacters,

    #[error("you cannot vote for yourself")]
    SelfVote,

    #[error("you already voted this round")]
    AlreadyVoted,

    #[error("drawing is empty")]
    EmptyDrawing,

    #[error("you already submitted a drawing")]
    AlreadySubmitted,

    #[error("not possible during {0:?}")]
    WrongPhase(GamePhase),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("not admitted to the session within {0:?}")]
    JoinTimedOut(Duration),

    #[error("client session has stopped")]
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("host session has stopped")]
    Stopped,
}
