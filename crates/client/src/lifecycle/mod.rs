// Match lifecycle: Lobby -> Playing -> Dead | Victory
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Lobby,
    Playing,
    Dead,
    Victory,
}

impl LifecycleState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Dead | LifecycleState::Victory)
    }
}

/// How a match ended for the local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Dead,
    Victory,
}

impl From<Outcome> for LifecycleState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Dead => LifecycleState::Dead,
            Outcome::Victory => LifecycleState::Victory,
        }
    }
}

/// Result of feeding an event to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Entered Playing; `implicit` when a snapshot stood in for the start event.
    Started { implicit: bool },
    /// Entered a terminal state for the first time.
    Ended(Outcome),
    /// Nothing changed.
    Unchanged,
}

/// Terminal states are sticky: the first of Dead/Victory wins and every later
/// lifecycle event is a no-op.
#[derive(Debug)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Lobby,
        }
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Explicit start event.
    pub fn start(&mut self) -> Transition {
        self.enter_playing(false)
    }

    /// A board snapshot arrived. Starts the match if the start event was
    /// missed or is still in flight.
    pub fn observe_snapshot(&mut self) -> Transition {
        self.enter_playing(true)
    }

    /// Death or victory notification.
    pub fn finish(&mut self, outcome: Outcome) -> Transition {
        if self.state.is_terminal() {
            debug!(?outcome, state = ?self.state, "late end-of-match event ignored");
            return Transition::Unchanged;
        }
        info!(?outcome, from = ?self.state, "match ended");
        self.state = outcome.into();
        Transition::Ended(outcome)
    }

    fn enter_playing(&mut self, implicit: bool) -> Transition {
        if self.state != LifecycleState::Lobby {
            return Transition::Unchanged;
        }
        if implicit {
            info!("first snapshot arrived before start; entering play");
        } else {
            info!("match started");
        }
        self.state = LifecycleState::Playing;
        Transition::Started { implicit }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_then_die() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.state(), LifecycleState::Lobby);
        assert_eq!(lc.start(), Transition::Started { implicit: false });
        assert_eq!(lc.finish(Outcome::Dead), Transition::Ended(Outcome::Dead));
        assert_eq!(lc.state(), LifecycleState::Dead);
    }

    #[test]
    fn test_snapshot_starts_a_lobby() {
        let mut lc = Lifecycle::new();
        assert_eq!(lc.observe_snapshot(), Transition::Started { implicit: true });
        assert_eq!(lc.start(), Transition::Unchanged);
        assert_eq!(lc.observe_snapshot(), Transition::Unchanged);
        assert_eq!(lc.state(), LifecycleState::Playing);
    }

    #[test]
    fn test_terminal_is_idempotent() {
        let mut lc = Lifecycle::new();
        lc.start();
        assert_eq!(lc.finish(Outcome::Victory), Transition::Ended(Outcome::Victory));
        assert_eq!(lc.finish(Outcome::Victory), Transition::Unchanged);
        assert_eq!(lc.state(), LifecycleState::Victory);
    }

    #[test]
    fn test_first_outcome_wins() {
        let mut lc = Lifecycle::new();
        lc.start();
        lc.finish(Outcome::Dead);
        assert_eq!(lc.finish(Outcome::Victory), Transition::Unchanged);
        assert_eq!(lc.state(), LifecycleState::Dead);
    }

    #[test]
    fn test_terminal_ignores_start_and_snapshots() {
        let mut lc = Lifecycle::new();
        lc.finish(Outcome::Victory);
        assert_eq!(lc.start(), Transition::Unchanged);
        assert_eq!(lc.observe_snapshot(), Transition::Unchanged);
        assert!(lc.state().is_terminal());
    }
}
