//! Shared protocol crate for the light-cycle grid game.
//!
//! This crate contains:
//! - The payload validator used on every inbound message
//! - Board decoding (player codes, rectangular grids)
//! - Event and command definitions for both directions of the socket
//! - Shared types (Direction, Color, PlayerId, etc.)

mod board;
mod error;
pub mod packets;
mod validate;

use serde::{Deserialize, Serialize};

pub use board::{Board, BoardError, CellStatus, PlayerCode, CODE_LEN, EMPTY_MARKER, MAX_SLOT};
pub use error::ProtocolError;
pub use validate::{validate, MalformedPayload, Payload, ValidPayload};

/// Heading of a light-cycle on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "U")]
    Up,
    #[serde(rename = "D")]
    Down,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// The heading that would drive a cycle straight back into its own trail.
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Single-letter wire token ("U", "D", "L", "R").
    pub const fn token(self) -> &'static str {
        match self {
            Direction::Up => "U",
            Direction::Down => "D",
            Direction::Left => "L",
            Direction::Right => "R",
        }
    }

    pub fn from_token(token: &str) -> Result<Self, ProtocolError> {
        match token {
            "U" => Ok(Direction::Up),
            "D" => Ok(Direction::Down),
            "L" => Ok(Direction::Left),
            "R" => Ok(Direction::Right),
            other => Err(ProtocolError::InvalidDirection(other.to_string())),
        }
    }
}

/// Locally meaningful identity of a player, as sent by the game peer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// RGB color used for player blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgba(...)` string with the given opacity.
    pub fn css(&self, alpha: f32) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Represents a 2D position in canvas pixels using glam's Vec2.
pub type Position = glam::Vec2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposites_pair_up() {
        for dir in Direction::ALL {
            assert_ne!(dir, dir.opposite());
            assert_eq!(dir, dir.opposite().opposite());
        }
    }

    #[test]
    fn test_direction_tokens() {
        assert_eq!(Direction::from_token("L").unwrap(), Direction::Left);
        assert_eq!(serde_json::to_string(&Direction::Up).unwrap(), "\"U\"");
        assert!(matches!(
            Direction::from_token("left"),
            Err(ProtocolError::InvalidDirection(_))
        ));
    }

    #[test]
    fn test_color_css() {
        assert_eq!(Color::new(255, 0, 0).css(0.5), "rgba(255,0,0,0.5)");
        assert_eq!(Color::from([1, 2, 3]), Color::new(1, 2, 3));
    }
}
