//! Room codes and the transport addresses derived from them

use crate::error::ValidationError;
use crate::types::PeerId;
use rand::Rng;
use std::fmt;

pub const PEER_PREFIX: &str = "prompted-v2-";
pub const PUBLIC_LOBBY_ID: &str = "PUBLIC_LOBBY";
/// Code typed by players who want the shared public lobby
pub const PUBLIC_CODE: &str = "PUBLIC";

pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 12;

/// Safe character set for generated codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalize and validate a human-entered code
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() < MIN_CODE_LENGTH {
            return Err(ValidationError::RoomCodeTooShort {
                min: MIN_CODE_LENGTH,
            });
        }
        if code.len() > MAX_CODE_LENGTH {
            return Err(ValidationError::RoomCodeTooLong {
                max: MAX_CODE_LENGTH,
            });
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::RoomCodeCharacters);
        }
        Ok(Self(code))
    }

    /// Generate a random 4-character code
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..MIN_CODE_LENGTH)
            .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
            .collect();
        Self(code)
    }

    pub fn public() -> Self {
        Self(PUBLIC_CODE.to_string())
    }

    pub fn is_public(&self) -> bool {
        self.0 == PUBLIC_CODE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address the host listens on for this code
    pub fn address(&self) -> String {
        if self.is_public() {
            format!("{PEER_PREFIX}{PUBLIC_LOBBY_ID}")
        } else {
            format!("{PEER_PREFIX}{}", self.0)
        }
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fresh peer id for a joining client; doubles as its player id
pub fn new_peer_id() -> PeerId {
    format!(
        "{PEER_PREFIX}{}",
        ulid::Ulid::new().to_string().to_ascii_lowercase()
    )
}
