//! Client configuration.
//!
//! Every field has a default, so an empty TOML document or an empty JS object
//! yields a playable client.

use protocol::{Color, Direction};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in the local client configuration.
#[derive(Debug, Error)]
pub enum ClientConfigError {
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("cell_size must be positive, got {0}")]
    CellSize(f32),

    #[error("{name} must be within [0, 1], got {value}")]
    Opacity { name: &'static str, value: f32 },

    #[error("palette must contain at least one colour")]
    EmptyPalette,

    #[error("key {key:?} is bound to both {first:?} and {second:?}")]
    DuplicateBinding {
        key: String,
        first: Direction,
        second: Direction,
    },
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub protocol: ProtocolConfig,
    /// `EnvFilter` directive for the console logger.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            board: BoardConfig::default(),
            palette: PaletteConfig::default(),
            input: InputConfig::default(),
            protocol: ProtocolConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ClientConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientConfigError> {
        if !(self.board.cell_size > 0.0) {
            return Err(ClientConfigError::CellSize(self.board.cell_size));
        }
        for (name, value) in [
            ("trail_opacity", self.board.trail_opacity),
            ("dead_opacity", self.board.dead_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ClientConfigError::Opacity { name, value });
            }
        }
        if self.palette.colors.is_empty() {
            return Err(ClientConfigError::EmptyPalette);
        }
        self.input.check_conflicts()
    }
}

/// Grid drawing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    /// Side of one grid cell in canvas pixels.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    #[serde(default = "default_trail_opacity")]
    pub trail_opacity: f32,
    #[serde(default = "default_dead_opacity")]
    pub dead_opacity: f32,
    #[serde(default = "default_background")]
    pub background: String,
    /// Stroke colour of the crash cross.
    #[serde(default = "default_marker_color")]
    pub marker_color: Color,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cell_size: default_cell_size(),
            trail_opacity: default_trail_opacity(),
            dead_opacity: default_dead_opacity(),
            background: default_background(),
            marker_color: default_marker_color(),
        }
    }
}

fn default_cell_size() -> f32 {
    10.0
}
fn default_trail_opacity() -> f32 {
    0.5
}
fn default_dead_opacity() -> f32 {
    1.0
}
fn default_background() -> String {
    "#111".to_string()
}
fn default_marker_color() -> Color {
    Color::new(0, 0, 0)
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Slot colours. Entry `i` colours player slot `i + 1`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteConfig {
    #[serde(default = "default_colors")]
    pub colors: Vec<Color>,
}

impl PaletteConfig {
    pub fn color_for(&self, slot: u8) -> Option<Color> {
        let index = usize::from(slot).checked_sub(1)?;
        self.colors.get(index).copied()
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
        }
    }
}

fn default_colors() -> Vec<Color> {
    vec![
        Color::new(255, 0, 0),
        Color::new(0, 128, 0),
        Color::new(0, 0, 255),
        Color::new(255, 165, 0),
        Color::new(128, 0, 128),
        Color::new(0, 128, 128),
    ]
}

/// Key bindings, as `KeyboardEvent.key` names.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    #[serde(default = "default_up")]
    pub up: Vec<String>,
    #[serde(default = "default_down")]
    pub down: Vec<String>,
    #[serde(default = "default_left")]
    pub left: Vec<String>,
    #[serde(default = "default_right")]
    pub right: Vec<String>,
}

impl InputConfig {
    /// Resolve a key name. Single letters match case-insensitively.
    pub fn direction_for(&self, key: &str) -> Option<Direction> {
        self.bindings()
            .find(|(bound, _)| keys_match(bound, key))
            .map(|(_, dir)| dir)
    }

    fn bindings(&self) -> impl Iterator<Item = (&str, Direction)> {
        [
            (&self.up, Direction::Up),
            (&self.down, Direction::Down),
            (&self.left, Direction::Left),
            (&self.right, Direction::Right),
        ]
        .into_iter()
        .flat_map(|(keys, dir)| keys.iter().map(move |k| (k.as_str(), dir)))
    }

    fn check_conflicts(&self) -> Result<(), ClientConfigError> {
        let all: Vec<(&str, Direction)> = self.bindings().collect();
        for (i, (key, first)) in all.iter().enumerate() {
            if let Some((_, second)) = all[i + 1..]
                .iter()
                .find(|(other, dir)| dir != first && keys_match(other, key))
            {
                return Err(ClientConfigError::DuplicateBinding {
                    key: key.to_string(),
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            up: default_up(),
            down: default_down(),
            left: default_left(),
            right: default_right(),
        }
    }
}

fn keys_match(bound: &str, key: &str) -> bool {
    if bound.chars().count() == 1 {
        bound.eq_ignore_ascii_case(key)
    } else {
        bound == key
    }
}

fn default_up() -> Vec<String> {
    vec!["w".to_string(), "ArrowUp".to_string()]
}
fn default_down() -> Vec<String> {
    vec!["s".to_string(), "ArrowDown".to_string()]
}
fn default_left() -> Vec<String> {
    vec!["a".to_string(), "ArrowLeft".to_string()]
}
fn default_right() -> Vec<String> {
    vec!["d".to_string(), "ArrowRight".to_string()]
}

/// Wire variants of the game peer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProtocolConfig {
    /// Add the local identity to every `playerMove`.
    #[serde(default)]
    pub include_id_in_moves: bool,
    /// Send `playerInfo` once after a successful setup.
    #[serde(default)]
    pub announce_identity: bool,
}
