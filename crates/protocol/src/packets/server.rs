//! Peer -> client event decoding.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::ServerEvent;
use crate::{validate, Direction, MalformedPayload, Payload, ValidPayload};

/// Decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Setup payload, validated to carry `players`.
    Config(ValidPayload),
    StartGame(StartGame),
    /// Board payload; structural board checks belong to the reconciler.
    GameStateUpdate(ValidPayload),
    PlayerDead,
    PlayerVictory,
}

impl InboundEvent {
    /// Decode an event by name. Unknown names and payloads missing required
    /// fields are rejected without side effects.
    pub fn decode(name: &str, payload: Option<Payload>) -> Result<Self, MalformedPayload> {
        let event = ServerEvent::from_name(name).ok_or_else(|| MalformedPayload::UnknownEvent(name.to_string()))?;
        match event {
            ServerEvent::Config => Ok(InboundEvent::Config(validate(payload, &[SetupConfig::PLAYERS])?)),
            ServerEvent::StartGame => Ok(InboundEvent::StartGame(StartGame::decode(payload)?)),
            ServerEvent::GameStateUpdate => Ok(InboundEvent::GameStateUpdate(validate(payload, &[])?)),
            ServerEvent::PlayerDead => Ok(InboundEvent::PlayerDead),
            ServerEvent::PlayerVictory => Ok(InboundEvent::PlayerVictory),
        }
    }

    pub fn kind(&self) -> ServerEvent {
        match self {
            InboundEvent::Config(_) => ServerEvent::Config,
            InboundEvent::StartGame(_) => ServerEvent::StartGame,
            InboundEvent::GameStateUpdate(_) => ServerEvent::GameStateUpdate,
            InboundEvent::PlayerDead => ServerEvent::PlayerDead,
            InboundEvent::PlayerVictory => ServerEvent::PlayerVictory,
        }
    }
}

/// Typed view of the setup payload.
///
/// Wire casing of the self identifier differs between peers, so all known
/// spellings are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetupConfig {
    pub players: BTreeMap<String, Value>,
    #[serde(default, rename = "selfID", alias = "selfId", alias = "LocalID", alias = "localId")]
    pub self_id: Option<Value>,
    #[serde(default, rename = "boardSize")]
    pub board_size: Option<usize>,
}

impl SetupConfig {
    pub const PLAYERS: &'static str = "players";
}

/// Match start. Richer peers send the initial heading along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StartGame {
    pub direction: Option<Direction>,
}

impl StartGame {
    /// Accepts no payload, `{ "direction": "R" }`, or `[playerInfo, "R"]`.
    fn decode(payload: Option<Payload>) -> Result<Self, MalformedPayload> {
        let valid = match validate(payload, &[]) {
            Ok(valid) => valid,
            Err(MalformedPayload::Absent) => return Ok(Self::default()),
            Err(e) => return Err(e),
        };

        let token = match valid.value() {
            Value::Object(map) => map.get("direction"),
            Value::Array(items) => items.get(1),
            _ => None,
        };

        let direction = match token {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(Direction::from_token(s).map_err(|e| MalformedPayload::BadField {
                field: "direction".to_string(),
                reason: e.to_string(),
            })?),
            Some(other) => {
                return Err(MalformedPayload::BadField {
                    field: "direction".to_string(),
                    reason: format!("expected a direction token, got {other}"),
                });
            }
        };

        Ok(Self { direction })
    }
}
