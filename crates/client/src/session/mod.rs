// Per-match session: routes peer events and key presses through the state
// owners and reports what the shell has to do.
use protocol::packets::{Envelope, InboundEvent, OutboundCommand, StartGame};
use protocol::{Direction, Payload, ValidPayload};
use tracing::{debug, error, warn};

use crate::board::{DrawPlan, Reconciler};
use crate::config::ClientConfig;
use crate::identity::{ConfigError, Identity};
use crate::input::InputController;
use crate::lifecycle::{Lifecycle, LifecycleState, Outcome, Transition};

/// Side effects requested from the browser shell.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Emit a command to the peer.
    Send(OutboundCommand),
    /// The draw plan changed; repaint from [`Session::draw_plan`].
    Repaint,
    /// Hide the lobby banner.
    EnterPlaying,
    /// Reveal the end-of-match overlay. Emitted at most once per match.
    ShowOverlay(Outcome),
    /// Setup was rejected; the match will not start.
    SetupFailed,
}

/// All mutable state of one match.
///
/// Every call runs to completion on the caller's thread. Events may arrive in
/// any order: a start before setup is held back until setup succeeds, a
/// snapshot in the lobby starts the match, and end-of-match events are
/// accepted once setup succeeded.
pub struct Session {
    config: ClientConfig,
    identity: Identity,
    lifecycle: Lifecycle,
    input: InputController,
    reconciler: Reconciler,
    halted: bool,
    deferred_start: Option<StartGame>,
}

impl Session {
    pub fn new(config: ClientConfig) -> Self {
        let input = InputController::new(config.input.clone(), config.protocol.include_id_in_moves);
        let reconciler = Reconciler::new(config.board.clone(), config.palette.clone());
        Self {
            config,
            identity: Identity::new(),
            lifecycle: Lifecycle::new(),
            input,
            reconciler,
            halted: false,
            deferred_start: None,
        }
    }

    /// Drop all match state and return to a fresh lobby.
    pub fn reset(&mut self) {
        debug!("session reset");
        *self = Self::new(self.config.clone());
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    #[inline]
    pub fn draw_plan(&self) -> &DrawPlan {
        self.reconciler.plan()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn self_slot(&self) -> Option<u8> {
        self.identity.self_slot()
    }

    pub fn pending_direction(&self) -> Option<Direction> {
        self.input.pending()
    }

    /// True after a rejected setup.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Handle one text frame from the socket.
    pub fn handle_frame(&mut self, text: &str) -> Vec<Effect> {
        match Envelope::parse(text) {
            Ok(frame) => self.handle_event(&frame.event, frame.payload()),
            Err(e) => {
                warn!(error = %e, "dropping undecodable frame");
                Vec::new()
            }
        }
    }

    /// Handle one named event. Malformed payloads are dropped without any
    /// state change.
    pub fn handle_event(&mut self, name: &str, payload: Option<Payload>) -> Vec<Effect> {
        match InboundEvent::decode(name, payload) {
            Ok(event) => self.dispatch(event),
            Err(e) => {
                warn!(event = name, error = %e, "dropping malformed payload");
                Vec::new()
            }
        }
    }

    pub fn dispatch(&mut self, event: InboundEvent) -> Vec<Effect> {
        debug!(event = event.kind().name(), state = ?self.lifecycle.state(), "dispatching");
        let mut effects = Vec::new();
        match event {
            InboundEvent::Config(payload) => self.on_config(&payload, &mut effects),
            InboundEvent::StartGame(start) => self.on_start(start, &mut effects),
            InboundEvent::GameStateUpdate(board) => self.on_snapshot(&board, &mut effects),
            InboundEvent::PlayerDead => self.on_finish(Outcome::Dead, &mut effects),
            InboundEvent::PlayerVictory => self.on_finish(Outcome::Victory, &mut effects),
        }
        effects
    }

    /// Forward a key press. Returns the command to send, if any.
    pub fn on_key_event(&mut self, key: &str) -> Option<OutboundCommand> {
        self.input.on_key_event(key, self.identity.self_id())
    }

    fn on_config(&mut self, payload: &ValidPayload, effects: &mut Vec<Effect>) {
        if self.halted {
            warn!("setup already failed; ignoring config");
            return;
        }

        match self.identity.initialize(payload, &self.config.palette) {
            Ok(()) => {}
            Err(ConfigError::AlreadyInitialized) => {
                error!("received a second config for the same match; ignoring it");
                return;
            }
            Err(e) => {
                error!(error = %e, "match setup rejected");
                self.halted = true;
                self.deferred_start = None;
                effects.push(Effect::SetupFailed);
                return;
            }
        }

        if let Some(size) = self.identity.board_size() {
            self.reconciler.fix_dimensions(size, size);
        }

        if self.config.protocol.announce_identity {
            if let Some(id) = self.identity.self_id() {
                effects.push(Effect::Send(OutboundCommand::PlayerInfo { id: id.clone() }));
            }
        }

        if let Some(start) = self.deferred_start.take() {
            debug!("applying start that arrived before setup");
            self.on_start(start, effects);
        }

        // A snapshot drawn before setup stands in for the start event.
        if self.reconciler.accepted() > 0 {
            self.enter_on_snapshot(effects);
        }
    }

    fn on_start(&mut self, start: StartGame, effects: &mut Vec<Effect>) {
        if self.halted {
            debug!("setup failed; start ignored");
            return;
        }
        if !self.identity.is_initialized() {
            debug!("start arrived before setup; holding it");
            self.deferred_start = Some(start);
            return;
        }
        if let Transition::Started { .. } = self.lifecycle.start() {
            self.input.connect(start.direction);
            effects.push(Effect::EnterPlaying);
        }
    }

    fn on_snapshot(&mut self, board: &ValidPayload, effects: &mut Vec<Effect>) {
        if let Err(e) = self.reconciler.apply_snapshot(board.value(), self.identity.self_slot()) {
            error!(error = %e, "board snapshot rejected; keeping last frame");
            return;
        }

        if !self.halted && self.identity.is_initialized() {
            self.enter_on_snapshot(effects);
        }
        effects.push(Effect::Repaint);
    }

    fn enter_on_snapshot(&mut self, effects: &mut Vec<Effect>) {
        if let Transition::Started { .. } = self.lifecycle.observe_snapshot() {
            self.input.connect(None);
            effects.push(Effect::EnterPlaying);
        }
    }

    fn on_finish(&mut self, outcome: Outcome, effects: &mut Vec<Effect>) {
        if self.halted || !self.identity.is_initialized() {
            debug!(?outcome, "end-of-match event before setup ignored");
            return;
        }
        if let Transition::Ended(outcome) = self.lifecycle.finish(outcome) {
            self.input.sever();
            effects.push(Effect::ShowOverlay(outcome));
        }
    }
}
