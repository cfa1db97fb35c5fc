// Draft-eligible prospects and their positions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hockey positions a prospect can be listed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Defense,
    Goalie,
}

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles common scouting abbreviations:
    /// - "C"/"F" -> Center (generic forward is listed as a center)
    /// - "LW"/"L" -> LeftWing, "RW"/"R" -> RightWing
    /// - "D"/"LD"/"RD" -> Defense, "G" -> Goalie
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "C" | "F" => Some(Position::Center),
            "LW" | "L" => Some(Position::LeftWing),
            "RW" | "R" => Some(Position::RightWing),
            "D" | "LD" | "RD" => Some(Position::Defense),
            "G" => Some(Position::Goalie),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Defense => "D",
            Position::Goalie => "G",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A draft-eligible prospect.
///
/// `drafted` is owned by the allocator: it is only ever set while a pick is
/// committed, and never flips back within one draft session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    /// Handedness ("L"/"R"), if known.
    #[serde(default)]
    pub shoots: Option<String>,
    /// Junior/college/European club, if known.
    #[serde(default)]
    pub amateur_team: Option<String>,
    #[serde(default)]
    pub(crate) drafted: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, position: Position) -> Self {
        Player {
            id,
            name: name.into(),
            position,
            shoots: None,
            amateur_team: None,
            drafted: false,
        }
    }

    pub fn is_drafted(&self) -> bool {
        self.drafted
    }

    /// Case-insensitive substring match on name or position abbreviation.
    /// `needle` must already be lowercased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.name.to_lowercase().contains(needle)
            || self.position.display_str().to_lowercase().contains(needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_pos_standard_positions() {
        assert_eq!(Position::from_str_pos("C"), Some(Position::Center));
        assert_eq!(Position::from_str_pos("LW"), Some(Position::LeftWing));
        assert_eq!(Position::from_str_pos("RW"), Some(Position::RightWing));
        assert_eq!(Position::from_str_pos("D"), Some(Position::Defense));
        assert_eq!(Position::from_str_pos("G"), Some(Position::Goalie));
    }

    #[test]
    fn from_str_pos_aliases_and_case() {
        assert_eq!(Position::from_str_pos("f"), Some(Position::Center));
        assert_eq!(Position::from_str_pos("ld"), Some(Position::Defense));
        assert_eq!(Position::from_str_pos(" Rd "), Some(Position::Defense));
        assert_eq!(Position::from_str_pos("l"), Some(Position::LeftWing));
    }

    #[test]
    fn from_str_pos_invalid() {
        assert_eq!(Position::from_str_pos("SS"), None);
        assert_eq!(Position::from_str_pos(""), None);
    }

    #[test]
    fn display_str_roundtrip() {
        for pos in [
            Position::Center,
            Position::LeftWing,
            Position::RightWing,
            Position::Defense,
            Position::Goalie,
        ] {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
        }
    }

    #[test]
    fn new_player_is_undrafted() {
        let p = Player::new(PlayerId(7), "Gavin McKenna", Position::LeftWing);
        assert!(!p.is_drafted());
        assert!(p.shoots.is_none());
    }

    #[test]
    fn matches_name_or_position() {
        let p = Player::new(PlayerId(1), "Matthew Schaefer", Position::Defense);
        assert!(p.matches_lowercase("schae"));
        assert!(p.matches_lowercase("d"));
        assert!(p.matches_lowercase(""));
        assert!(!p.matches_lowercase("lw"));
    }
}
