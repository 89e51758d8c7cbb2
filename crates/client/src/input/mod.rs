// Keyboard input -> debounced direction commands
use protocol::packets::OutboundCommand;
use protocol::{Direction, PlayerId};
use tracing::debug;

use crate::config::InputConfig;

/// Where the controller sits relative to the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    /// Waiting for the match to start.
    Idle,
    /// Forwarding key presses.
    Connected,
    /// The match ended; never forwards again.
    Severed,
}

/// Translates key presses into `playerMove` commands.
///
/// Only the last sent direction is remembered. A press for that same
/// direction, or for its exact opposite, produces nothing.
pub struct InputController {
    bindings: InputConfig,
    include_id: bool,
    pending: Option<Direction>,
    link: Link,
}

impl InputController {
    pub fn new(bindings: InputConfig, include_id: bool) -> Self {
        Self {
            bindings,
            include_id,
            pending: None,
            link: Link::Idle,
        }
    }

    /// Start forwarding. `initial` seeds the pending direction when the peer
    /// announced a starting heading. Has no effect once severed.
    pub fn connect(&mut self, initial: Option<Direction>) {
        if self.link != Link::Idle {
            return;
        }
        self.link = Link::Connected;
        if initial.is_some() {
            self.pending = initial;
        }
    }

    /// Stop forwarding for the rest of the match.
    pub fn sever(&mut self) {
        self.link = Link::Severed;
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.link == Link::Connected
    }

    #[inline]
    pub fn pending(&self) -> Option<Direction> {
        self.pending
    }

    /// Handle one key press. Unbound keys and suppressed directions yield `None`.
    pub fn on_key_event(&mut self, key: &str, self_id: Option<&PlayerId>) -> Option<OutboundCommand> {
        if self.link != Link::Connected {
            return None;
        }

        let Some(direction) = self.bindings.direction_for(key) else {
            debug!(key, "unbound key ignored");
            return None;
        };

        if let Some(pending) = self.pending {
            if direction == pending {
                return None;
            }
            if direction == pending.opposite() {
                debug!(?direction, ?pending, "reversal suppressed");
                return None;
            }
        }

        self.pending = Some(direction);
        let id = if self.include_id { self_id.cloned() } else { None };
        Some(OutboundCommand::PlayerMove { direction, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> InputController {
        let mut input = InputController::new(InputConfig::default(), false);
        input.connect(None);
        input
    }

    fn moved(cmd: Option<OutboundCommand>) -> Option<Direction> {
        match cmd {
            Some(OutboundCommand::PlayerMove { direction, .. }) => Some(direction),
            _ => None,
        }
    }

    #[test]
    fn test_idle_controller_ignores_keys() {
        let mut input = InputController::new(InputConfig::default(), false);
        assert!(input.on_key_event("w", None).is_none());
        assert_eq!(input.pending(), None);
    }

    #[test]
    fn test_same_direction_is_debounced() {
        let mut input = connected();
        assert_eq!(moved(input.on_key_event("w", None)), Some(Direction::Up));
        assert!(input.on_key_event("w", None).is_none());
        assert!(input.on_key_event("ArrowUp", None).is_none());
    }

    #[test]
    fn test_reversal_is_suppressed() {
        let mut input = connected();
        assert_eq!(moved(input.on_key_event("d", None)), Some(Direction::Right));
        assert!(input.on_key_event("a", None).is_none());
        assert_eq!(input.pending(), Some(Direction::Right));
        assert_eq!(moved(input.on_key_event("s", None)), Some(Direction::Down));
        assert_eq!(moved(input.on_key_event("a", None)), Some(Direction::Left));
    }

    #[test]
    fn test_unbound_keys_are_noops() {
        let mut input = connected();
        assert!(input.on_key_event("Enter", None).is_none());
        assert!(input.on_key_event("x", None).is_none());
        assert_eq!(input.pending(), None);
    }

    #[test]
    fn test_seeded_heading_blocks_reversal() {
        let mut input = InputController::new(InputConfig::default(), false);
        input.connect(Some(Direction::Right));
        assert!(input.on_key_event("a", None).is_none());
        assert!(input.on_key_event("d", None).is_none());
        assert_eq!(moved(input.on_key_event("w", None)), Some(Direction::Up));
    }

    #[test]
    fn test_severed_controller_stays_silent() {
        let mut input = connected();
        input.sever();
        input.connect(None);
        assert!(!input.is_connected());
        assert!(input.on_key_event("w", None).is_none());
    }

    #[test]
    fn test_id_is_attached_when_configured() {
        let mut input = InputController::new(InputConfig::default(), true);
        input.connect(None);
        let me = PlayerId::new("a");
        assert_eq!(
            input.on_key_event("W", Some(&me)),
            Some(OutboundCommand::PlayerMove {
                direction: Direction::Up,
                id: Some(me.clone()),
            })
        );
    }
}
