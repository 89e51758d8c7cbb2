// Player identities received at match setup
use std::collections::BTreeMap;

use protocol::packets::SetupConfig;
use protocol::{MalformedPayload, PlayerCode, PlayerId, ValidPayload};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PaletteConfig;

/// Fewest distinct players a match can start with.
pub const MIN_PLAYERS: usize = 2;

/// Setup failures. Any of these keeps the match in the lobby.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("setup payload rejected: {0}")]
    Malformed(#[from] MalformedPayload),

    #[error("a match needs at least {MIN_PLAYERS} distinct players, got {found}")]
    TooFewPlayers { found: usize },

    #[error("player key {0:?} is not a player code")]
    BadPlayerKey(String),

    #[error("player slot {slot} has no palette colour")]
    NoColour { slot: u8 },

    #[error("self identifier {0} matches no player")]
    UnknownSelf(String),

    #[error("identity was already initialized for this match")]
    AlreadyInitialized,
}

/// Slot -> identity mapping plus which slot is us.
#[derive(Debug, Default)]
pub struct Identity {
    players: BTreeMap<u8, PlayerId>,
    self_slot: Option<u8>,
    board_size: Option<usize>,
    initialized: bool,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the identity from a setup payload. Every slot must have a
    /// colour in `palette`. Succeeds at most once; a failed attempt leaves the
    /// identity untouched.
    pub fn initialize(&mut self, config: &ValidPayload, palette: &PaletteConfig) -> Result<(), ConfigError> {
        if self.initialized {
            return Err(ConfigError::AlreadyInitialized);
        }

        let players = config.nested(SetupConfig::PLAYERS, &[])?;
        if !players.value().is_object() {
            return Err(MalformedPayload::BadField {
                field: SetupConfig::PLAYERS.to_string(),
                reason: "expected an object of player codes".to_string(),
            }
            .into());
        }
        let setup: SetupConfig = config.decode()?;

        let mut mapping = BTreeMap::new();
        for (key, value) in &setup.players {
            let code: PlayerCode = key.parse().map_err(|_| ConfigError::BadPlayerKey(key.clone()))?;
            if palette.color_for(code.slot).is_none() {
                return Err(ConfigError::NoColour { slot: code.slot });
            }
            let id = identity_of(value);
            if let Some(existing) = mapping.get(&code.slot) {
                warn!(slot = code.slot, kept = %existing, ignored = %id, "duplicate player slot in setup");
                continue;
            }
            mapping.insert(code.slot, id);
        }

        if mapping.len() < MIN_PLAYERS {
            return Err(ConfigError::TooFewPlayers { found: mapping.len() });
        }

        let self_slot = match &setup.self_id {
            None | Some(Value::Null) => None,
            Some(value) => Some(resolve_self(&mapping, value)?),
        };

        info!(players = mapping.len(), self_slot = ?self_slot, "match identity initialized");
        self.players = mapping;
        self.self_slot = self_slot;
        self.board_size = setup.board_size;
        self.initialized = true;
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn self_slot(&self) -> Option<u8> {
        self.self_slot
    }

    pub fn self_id(&self) -> Option<&PlayerId> {
        self.self_slot.and_then(|slot| self.players.get(&slot))
    }

    pub fn is_self(&self, slot: u8) -> bool {
        self.self_slot == Some(slot)
    }

    pub fn player(&self, slot: u8) -> Option<&PlayerId> {
        self.players.get(&slot)
    }

    /// Square board size announced at setup, if any.
    pub fn board_size(&self) -> Option<usize> {
        self.board_size
    }
}

fn identity_of(value: &Value) -> PlayerId {
    match value {
        Value::String(s) => PlayerId::new(s.as_str()),
        other => PlayerId::new(other.to_string()),
    }
}

/// The self identifier may name a player code key or an identity value.
fn resolve_self(mapping: &BTreeMap<u8, PlayerId>, value: &Value) -> Result<u8, ConfigError> {
    let wanted = identity_of(value);
    if let Ok(code) = wanted.as_str().parse::<PlayerCode>() {
        if mapping.contains_key(&code.slot) {
            return Ok(code.slot);
        }
    }
    mapping
        .iter()
        .find(|(_, id)| **id == wanted)
        .map(|(slot, _)| *slot)
        .ok_or_else(|| ConfigError::UnknownSelf(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{validate, Color, Payload};
    use serde_json::json;

    fn payload(value: Value) -> ValidPayload {
        validate(Some(Payload::Json(value)), &["players"]).unwrap()
    }

    fn init(identity: &mut Identity, value: Value) -> Result<(), ConfigError> {
        identity.initialize(&payload(value), &PaletteConfig::default())
    }

    #[test]
    fn test_two_players_with_self_code() {
        let mut identity = Identity::new();
        init(&mut identity, json!({ "players": { "p1": "a", "p2": "b" }, "selfID": "p1" })).unwrap();
        assert!(identity.is_initialized());
        assert_eq!(identity.self_slot(), Some(1));
        assert_eq!(identity.self_id(), Some(&PlayerId::new("a")));
        assert_eq!(identity.player(2), Some(&PlayerId::new("b")));
        assert!(identity.is_self(1));
        assert!(!identity.is_self(2));
    }

    #[test]
    fn test_self_by_identity_value() {
        let mut identity = Identity::new();
        init(&mut identity, json!({ "players": { "p1": "a", "p2": "b" }, "LocalID": "b" })).unwrap();
        assert_eq!(identity.self_slot(), Some(2));
    }

    #[test]
    fn test_single_player_is_rejected() {
        let mut identity = Identity::new();
        let err = init(&mut identity, json!({ "players": { "p1": "a" } })).unwrap_err();
        assert!(matches!(err, ConfigError::TooFewPlayers { found: 1 }));
        assert!(!identity.is_initialized());
    }

    #[test]
    fn test_same_slot_counts_once() {
        let mut identity = Identity::new();
        let err = init(&mut identity, json!({ "players": { "p1": "a", "t1": "a" } })).unwrap_err();
        assert!(matches!(err, ConfigError::TooFewPlayers { found: 1 }));
    }

    #[test]
    fn test_second_initialize_is_an_error() {
        let mut identity = Identity::new();
        let config = json!({ "players": { "p1": "a", "p2": "b" } });
        init(&mut identity, config.clone()).unwrap();
        assert!(matches!(init(&mut identity, config), Err(ConfigError::AlreadyInitialized)));
    }

    #[test]
    fn test_unknown_self_is_rejected() {
        let mut identity = Identity::new();
        let err = init(&mut identity, json!({ "players": { "p1": "a", "p2": "b" }, "selfID": "p5" })).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSelf(_)));
    }

    #[test]
    fn test_players_must_be_an_object() {
        let mut identity = Identity::new();
        assert!(matches!(
            init(&mut identity, json!({ "players": ["p1", "p2"] })),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            init(&mut identity, json!({ "players": null })),
            Err(ConfigError::Malformed(MalformedPayload::Absent))
        ));
        assert!(matches!(
            init(&mut identity, json!({ "players": { "x1": "a", "p2": "b" } })),
            Err(ConfigError::BadPlayerKey(_))
        ));
    }

    #[test]
    fn test_slot_without_colour_is_rejected() {
        let mut identity = Identity::new();
        let err = init(&mut identity, json!({ "players": { "p7": "a", "p8": "b" } })).unwrap_err();
        assert!(matches!(err, ConfigError::NoColour { slot: 7 }));
        assert!(!identity.is_initialized());

        let wide = PaletteConfig {
            colors: vec![Color::new(1, 1, 1); 8],
        };
        identity
            .initialize(&payload(json!({ "players": { "p7": "a", "p8": "b" } })), &wide)
            .unwrap();
        assert_eq!(identity.player(8), Some(&PlayerId::new("b")));
    }

    #[test]
    fn test_board_size_is_kept() {
        let mut identity = Identity::new();
        init(&mut identity, json!({ "players": { "p1": 1, "p2": 2 }, "boardSize": 10 })).unwrap();
        assert_eq!(identity.board_size(), Some(10));
        assert_eq!(identity.player(1), Some(&PlayerId::new("1")));
        assert_eq!(identity.self_slot(), None);
    }
}
