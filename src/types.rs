use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type PeerId = String;

/// Player id reserved for the authoritative peer
pub const HOST_PLAYER_ID: &str = "host";

/// Points awarded to the target of every vote
pub const VOTE_AWARD: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    Home,
    ProfileSetup,
    JoinRoom,
    LobbyWaiting,
    PromptSelection,
    Drawing,
    Combining,
    Trivia,
    Reveal,
    Results,
    GrandFinale,
}

impl GamePhase {
    /// Phases that count down on the Phase Clock
    pub fn is_timed(&self) -> bool {
        matches!(self, GamePhase::Drawing | GamePhase::Trivia)
    }
}

/// Judge persona used for the end-of-round roast
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum JudgeStyle {
    #[default]
    Roast,
    Snob,
    Zoomer,
    Grandma,
}

/// The three prompt words a player draws from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptSlots {
    pub emotion: String,
    pub style: String,
    pub noun: String,
}

impl PromptSlots {
    /// "Confident Neon Frog"
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.emotion, self.style, self.noun)
    }
}

/// Self-chosen identity sent along with a join
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub name: String,
    pub avatar: String,
    pub avatar_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub avatar: String,
    pub avatar_color: String,
    pub is_host: bool,
    pub score: u32,
    /// Data URL, present once submitted this round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<PromptSlots>,
    pub votes_received: u32,
    #[serde(default)]
    pub voted_target_id: Option<PlayerId>,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, profile: PlayerProfile) -> Self {
        Self {
            id: id.into(),
            name: profile.name,
            avatar: profile.avatar,
            avatar_color: profile.avatar_color,
            is_host: false,
            score: 0,
            drawing: None,
            slots: None,
            votes_received: 0,
            voted_target_id: None,
        }
    }

    pub fn host(profile: PlayerProfile) -> Self {
        Self {
            is_host: true,
            ..Self::new(HOST_PLAYER_ID, profile)
        }
    }

    pub fn has_drawing(&self) -> bool {
        self.drawing.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// Clear everything that only lives for one round; score is kept
    pub fn reset_round(&mut self) {
        self.drawing = None;
        self.slots = None;
        self.votes_received = 0;
        self.voted_target_id = None;
    }
}

/// Multiple-choice question generated from the combined image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TriviaQuestion {
    pub question: String,
    pub options: [String; 4],
    pub correct_index: usize,
}

impl TriviaQuestion {
    pub fn is_usable(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.iter().all(|o| !o.trim().is_empty())
            && self.correct_index < self.options.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Drawing phase length in seconds
    pub round_time: u32,
    pub trivia_time: u32,
    pub rounds: u32,
    pub current_round: u32,
    pub room_code: String,
    #[serde(default)]
    pub judge: JudgeStyle,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            round_time: 60,
            trivia_time: 15,
            rounds: 3,
            current_round: 1,
            room_code: String::new(),
            judge: JudgeStyle::default(),
        }
    }
}

/// The single replicated game state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub version: u64,
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub settings: GameSettings,
    pub time_left: u32,
    #[serde(default)]
    pub combined_image: Option<String>,
    #[serde(default)]
    pub trivia: Option<TriviaQuestion>,
    #[serde(default)]
    pub judge_roast: Option<String>,
}

impl SessionState {
    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains_player(&self, id: &str) -> bool {
        self.players.iter().any(|p| p.id == id)
    }
}

// ========== Ephemeral events ==========

/// Chat line relayed by the host; never part of the session state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub id: String,
    pub sender_id: PlayerId,
    pub sender_name: String,
    pub text: String,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl ChatLine {
    pub fn new(sender_id: impl Into<PlayerId>, sender_name: impl Into<String>, text: String) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            text,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Emoji sticker thrown onto everyone's screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraffitiItem {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub emoji: String,
    pub rotation: f32,
    pub scale: f32,
    pub sender_id: PlayerId,
}

impl GraffitiItem {
    /// Sticker at a random spot, tilt and size on the shared canvas
    pub fn scatter(sender_id: impl Into<PlayerId>, emoji: impl Into<String>) -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        Self {
            id: ulid::Ulid::new().to_string(),
            x: rng.random_range(0.05..0.95),
            y: rng.random_range(0.05..0.95),
            emoji: emoji.into(),
            rotation: rng.random_range(-30.0..30.0),
            scale: rng.random_range(0.8..1.6),
            sender_id: sender_id.into(),
        }
    }
}
