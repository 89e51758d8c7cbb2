// Browser-side game client: owns the session and the DOM/canvas/socket handles
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{window, HtmlCanvasElement};

use crate::config::ClientConfig;
use crate::lifecycle::LifecycleState;
use crate::network::Connection;
use crate::render::Renderer;
use crate::session::{Effect, Session};
use crate::ui::UI;

/// Socket callbacks and key listeners only push into these queues. Everything
/// else happens in [`GameClient::update`] on the animation frame, so the
/// client is never borrowed from two callbacks at once.
pub struct GameClient {
    session: Session,
    connection: Connection,
    renderer: Renderer,
    ui: UI,

    frame_queue: Rc<RefCell<VecDeque<String>>>,
    key_queue: Rc<RefCell<VecDeque<String>>>,
    ws_open_flag: Rc<Cell<bool>>,
    ws_close_flag: Rc<Cell<bool>>,

    needs_repaint: bool,
}

impl GameClient {
    pub fn new(canvas_id: &str, server_url: &str, config: ClientConfig) -> Result<GameClient, JsValue> {
        let window = window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let renderer = Renderer::new(canvas, &config.board.background)?;
        let ui = UI::new(document);
        ui.show_lobby();
        let connection = Connection::new(server_url)?;

        Ok(Self {
            session: Session::new(config),
            connection,
            renderer,
            ui,
            frame_queue: Rc::new(RefCell::new(VecDeque::new())),
            key_queue: Rc::new(RefCell::new(VecDeque::new())),
            ws_open_flag: Rc::new(Cell::new(false)),
            ws_close_flag: Rc::new(Cell::new(false)),
            needs_repaint: true,
        })
    }

    pub(crate) fn frame_queue(&self) -> Rc<RefCell<VecDeque<String>>> {
        self.frame_queue.clone()
    }

    pub(crate) fn key_queue(&self) -> Rc<RefCell<VecDeque<String>>> {
        self.key_queue.clone()
    }

    pub(crate) fn ws_open_flag(&self) -> Rc<Cell<bool>> {
        self.ws_open_flag.clone()
    }

    pub(crate) fn ws_close_flag(&self) -> Rc<Cell<bool>> {
        self.ws_close_flag.clone()
    }

    pub fn websocket(&self) -> web_sys::WebSocket {
        self.connection.websocket().clone()
    }

    pub fn state(&self) -> LifecycleState {
        self.session.state()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Called once per animation frame.
    pub fn update(&mut self) -> Result<(), JsValue> {
        if self.ws_open_flag.replace(false) {
            info!(url = self.connection.url(), "connected");
        }
        if self.ws_close_flag.replace(false) {
            warn!(state = ?self.session.state(), "connection closed; match is over for this page");
        }

        let frames: Vec<String> = self.frame_queue.borrow_mut().drain(..).collect();
        for frame in frames {
            let effects = self.session.handle_frame(&frame);
            self.apply(effects);
        }

        let keys: Vec<String> = self.key_queue.borrow_mut().drain(..).collect();
        for key in keys {
            if let Some(command) = self.session.on_key_event(&key) {
                self.apply(vec![Effect::Send(command)]);
            }
        }

        if self.needs_repaint {
            self.needs_repaint = false;
            let plan = self.session.draw_plan();
            self.renderer.fit(plan.rows, plan.cols, self.session.config().board.cell_size);
            self.renderer.draw(plan);
        }

        Ok(())
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Send(command) => {
                    if let Err(e) = self.connection.send(&command) {
                        warn!(event = command.event().name(), error = ?e, "command dropped");
                    }
                }
                Effect::Repaint => self.needs_repaint = true,
                banner => self.ui.apply(&banner),
            }
        }
    }
}
