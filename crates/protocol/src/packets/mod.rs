//! Event definitions for the game socket.
//!
//! This module contains both client->peer commands and peer->client events.
//! Every frame on the wire is a JSON envelope `{ "event": <name>, "data": <payload> }`.

mod client;
mod server;

pub use client::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{MalformedPayload, Payload};

/// Event names for client -> peer commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientEvent {
    /// Direction change request.
    PlayerMove,
    /// One-off identity handshake.
    PlayerInfo,
}

impl ClientEvent {
    pub const fn name(self) -> &'static str {
        match self {
            ClientEvent::PlayerMove => "playerMove",
            ClientEvent::PlayerInfo => "playerInfo",
        }
    }
}

/// Event names for peer -> client messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEvent {
    /// Player mapping and self identifier (`config` / `initialConfig`).
    Config,
    /// Match start.
    StartGame,
    /// Full board snapshot.
    GameStateUpdate,
    /// The local player crashed.
    PlayerDead,
    /// The local player won (`playerVictory` / `victory`).
    PlayerVictory,
}

impl ServerEvent {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "config" | "initialConfig" => Some(ServerEvent::Config),
            "startGame" => Some(ServerEvent::StartGame),
            "gameStateUpdate" => Some(ServerEvent::GameStateUpdate),
            "playerDead" => Some(ServerEvent::PlayerDead),
            "playerVictory" | "victory" => Some(ServerEvent::PlayerVictory),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ServerEvent::Config => "config",
            ServerEvent::StartGame => "startGame",
            ServerEvent::GameStateUpdate => "gameStateUpdate",
            ServerEvent::PlayerDead => "playerDead",
            ServerEvent::PlayerVictory => "playerVictory",
        }
    }
}

/// A single socket frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, MalformedPayload> {
        Ok(serde_json::from_str(text)?)
    }

    /// The frame's payload in the form the validator expects.
    pub fn payload(&self) -> Option<Payload> {
        self.data.clone().map(Payload::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_aliases() {
        assert_eq!(ServerEvent::from_name("initialConfig"), Some(ServerEvent::Config));
        assert_eq!(ServerEvent::from_name("victory"), Some(ServerEvent::PlayerVictory));
        assert_eq!(ServerEvent::from_name("chat"), None);
    }

    #[test]
    fn test_envelope_without_data() {
        let frame = Envelope::parse(r#"{"event":"playerDead"}"#).unwrap();
        assert_eq!(frame.event, "playerDead");
        assert!(frame.payload().is_none());
    }

    #[test]
    fn test_envelope_with_serialized_data() {
        let frame = Envelope::parse(r#"{"event":"config","data":"{\"players\":{}}"}"#).unwrap();
        assert!(matches!(frame.payload(), Some(Payload::Text(_))));
    }
}
