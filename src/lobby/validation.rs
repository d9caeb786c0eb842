//! Player name validation

use serde::{Deserialize, Serialize};

/// Longest accepted player name, in characters
pub const MAX_PLAYER_NAME_LENGTH: usize = 30;

/// Longest private game name kept from a `create` request, in characters
pub const MAX_GAME_NAME_LENGTH: usize = 30;

/// Symbols allowed in player names besides letters and digits
const ALLOWED_SYMBOLS: &str = "_ !@#$*";

/// Why a join request's player name was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameRejection {
    Missing,
    TooLong { length: usize },
    InvalidCharacter { character: char },
}

impl std::fmt::Display for NameRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NameRejection::Missing => write!(f, "player name is missing"),
            NameRejection::TooLong { length } => write!(
                f,
                "player name has {} characters, limit is {}",
                length, MAX_PLAYER_NAME_LENGTH
            ),
            NameRejection::InvalidCharacter { character } => {
                write!(f, "player name contains {:?}", character)
            }
        }
    }
}

fn is_allowed_character(c: char) -> bool {
    c.is_ascii_alphanumeric() || ALLOWED_SYMBOLS.contains(c)
}

/// Check a player name against the length limit and allowed character set
pub fn validate_player_name(player_name: Option<&str>) -> Result<&str, NameRejection> {
    let name = match player_name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(NameRejection::Missing),
    };

    let length = name.chars().count();
    if length > MAX_PLAYER_NAME_LENGTH {
        return Err(NameRejection::TooLong { length });
    }

    if let Some(character) = name.chars().find(|c| !is_allowed_character(*c)) {
        return Err(NameRejection::InvalidCharacter { character });
    }

    Ok(name)
}

/// Cut a requested private game name down to `MAX_GAME_NAME_LENGTH` characters
pub fn truncate_game_name(game_name: &str) -> &str {
    match game_name.char_indices().nth(MAX_GAME_NAME_LENGTH) {
        Some((index, _)) => &game_name[..index],
        None => game_name,
    }
}
