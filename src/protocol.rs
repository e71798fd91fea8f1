use crate::types::*;
use serde::{Deserialize, Serialize};

/// Wire message exchanged between peers, serialized as `{ "type", "payload" }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Client asks to be admitted with its own player record
    PlayerJoined(Player),
    /// Complete session snapshot, host broadcast only
    GameStateUpdate(SessionState),
    ActionSubmitDrawing(SubmitDrawing),
    ActionVote(Vote),
    #[serde(rename = "CHAT_MESSAGE")]
    Chat(ChatLine),
    #[serde(rename = "GRAFFITI_EVENT")]
    Graffiti(GraffitiItem),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitDrawing {
    pub id: PlayerId,
    pub drawing: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub voter_id: PlayerId,
    pub target_id: PlayerId,
}

/// Who is allowed to originate a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Host,
    Client,
    Either,
}

/// Fire-and-forget payloads that bypass the session state
#[derive(Debug, Clone, PartialEq)]
pub enum Ephemeral {
    Chat(ChatLine),
    Graffiti(GraffitiItem),
}

impl From<Ephemeral> for Message {
    fn from(e: Ephemeral) -> Self {
        match e {
            Ephemeral::Chat(line) => Message::Chat(line),
            Ephemeral::Graffiti(item) => Message::Graffiti(item),
        }
    }
}

impl Ephemeral {
    /// Player the payload claims to come from
    pub fn sender_id(&self) -> &PlayerId {
        match self {
            Ephemeral::Chat(line) => &line.sender_id,
            Ephemeral::Graffiti(item) => &item.sender_id,
        }
    }
}

impl Message {
    /// Wire name of the message type
    pub fn kind(&self) -> &'static str {
        match self {
            Message::PlayerJoined(_) => "PLAYER_JOINED",
            Message::GameStateUpdate(_) => "GAME_STATE_UPDATE",
            Message::ActionSubmitDrawing(_) => "ACTION_SUBMIT_DRAWING",
            Message::ActionVote(_) => "ACTION_VOTE",
            Message::Chat(_) => "CHAT_MESSAGE",
            Message::Graffiti(_) => "GRAFFITI_EVENT",
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            Message::GameStateUpdate(_) => Origin::Host,
            Message::PlayerJoined(_) | Message::ActionSubmitDrawing(_) | Message::ActionVote(_) => {
                Origin::Client
            }
            Message::Chat(_) | Message::Graffiti(_) => Origin::Either,
        }
    }

    /// Split off chat and graffiti; everything else is handed back
    pub fn into_ephemeral(self) -> Result<Ephemeral, Message> {
        match self {
            Message::Chat(line) => Ok(Ephemeral::Chat(line)),
            Message::Graffiti(item) => Ok(Ephemeral::Graffiti(item)),
            other => Err(other),
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
