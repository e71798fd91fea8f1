//! Prompt word pools and judge personas

use crate::types::{JudgeStyle, PromptSlots};
use rand::Rng;

pub const EMOTIONS: &[&str] = &[
    "Confident", "Angry", "Sleepy", "Confused", "Manic", "Romantic", "Scared", "Smug",
    "Dramatic", "Bored", "Existential", "Hangry", "Zen", "Paranoid", "Giddy", "Seductive",
    "Passive-Aggressive", "Hysterical", "Suspicious", "Moist", "Unimpressed", "Ferocious",
    "Awkward", "Melodramatic", "Chaotic", "Thirsty", "Judgmental",
];

pub const STYLES: &[&str] = &[
    "Haunted", "Corporate", "Neon", "Medieval", "Cyberpunk", "Gothic", "Minimalist", "Cubist",
    "Anime", "Vintage", "Glitchy", "Fuzzy", "Pixelated", "Abstract", "Baroque", "Renaissance",
    "Claymation", "Court Sketch", "Vaporwave", "Meat", "Graffiti", "Oil Painting", "Low Poly",
    "Horror Movie", "IKEA Manual", "Tattoo", "8-Bit",
];

pub const NOUNS: &[&str] = &[
    "Baby", "Horse", "Frog", "Toaster", "Clown", "Cactus", "Skeleton", "Banana", "Ghost",
    "Robot", "Cat", "Sloth", "Wizard", "Potato", "Duck", "Vampire", "Toilet", "Dumpster Fire",
    "IRS Auditor", "Spicy Burrito", "Mid-life Crisis", "Capybara", "Karen", "Bag of Trash",
    "Shrimp", "Chainsaw", "Hamster", "Influencer", "Traffic Cone",
];

/// Stand-in noun for players who never got a prompt
pub const MISSING_NOUN: &str = "Nothing";

fn pick(rng: &mut impl Rng, pool: &[&str]) -> String {
    pool[rng.random_range(0..pool.len())].to_string()
}

/// Draw one word from each pool, independently and uniformly
pub fn random_slots() -> PromptSlots {
    let mut rng = rand::rng();
    PromptSlots {
        emotion: pick(&mut rng, EMOTIONS),
        style: pick(&mut rng, STYLES),
        noun: pick(&mut rng, NOUNS),
    }
}

impl JudgeStyle {
    pub fn display_name(&self) -> &'static str {
        match self {
            JudgeStyle::Roast => "Roasted Rob",
            JudgeStyle::Snob => "Baron Von Art",
            JudgeStyle::Zoomer => "Zoomer Zach",
            JudgeStyle::Grandma => "Sweet GamGam",
        }
    }

    /// Persona instruction handed to the roast collaborator
    pub fn persona(&self) -> &'static str {
        match self {
            JudgeStyle::Roast => "You are Roasted Rob. Roast the art ruthlessly.",
            JudgeStyle::Snob => "You are Baron Von Art. Use big art words to insult this mess.",
            JudgeStyle::Zoomer => "You are Zoomer Zach. Use Gen Z slang (mid, cap, sus).",
            JudgeStyle::Grandma => "You are Sweet GamGam. Give backhanded compliments.",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "roast" => Some(JudgeStyle::Roast),
            "snob" => Some(JudgeStyle::Snob),
            "zoomer" => Some(JudgeStyle::Zoomer),
            "grandma" => Some(JudgeStyle::Grandma),
            _ => None,
        }
    }
}
