//! Client -> peer command encoding.

use serde_json::{json, Value};

use super::{ClientEvent, Envelope};
use crate::{Direction, PlayerId};

/// Commands the client emits. Delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// `playerMove` with an optional explicit id for peers that do not bind
    /// connections to identities.
    PlayerMove {
        direction: Direction,
        id: Option<PlayerId>,
    },
    /// `playerInfo`, sent once after setup.
    PlayerInfo { id: PlayerId },
}

impl OutboundCommand {
    pub fn event(&self) -> ClientEvent {
        match self {
            OutboundCommand::PlayerMove { .. } => ClientEvent::PlayerMove,
            OutboundCommand::PlayerInfo { .. } => ClientEvent::PlayerInfo,
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            OutboundCommand::PlayerMove { direction, id: None } => json!({ "direction": direction }),
            OutboundCommand::PlayerMove { direction, id: Some(id) } => {
                json!({ "direction": direction, "id": id })
            }
            OutboundCommand::PlayerInfo { id } => json!({ "id": id }),
        }
    }

    /// Wrap the command in a socket envelope.
    pub fn to_envelope(&self) -> Envelope {
        Envelope {
            event: self.event().name().to_string(),
            data: Some(self.payload()),
        }
    }

    /// Serialized text frame, ready for the socket.
    pub fn to_frame(&self) -> String {
        json!({ "event": self.event().name(), "data": self.payload() }).to_string()
    }
}
