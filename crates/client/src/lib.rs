// WASM client for the light-cycle grid game.
// The match logic (session, identity, input, board, lifecycle) is plain Rust
// and testable natively; game/network/render/ui are the browser shell.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{window, CloseEvent, KeyboardEvent, MessageEvent, WebSocket};

pub mod board;
pub mod config;
pub mod identity;
pub mod input;
pub mod lifecycle;
pub mod session;

mod game;    // Browser client: queues, effect application
mod network; // WebSocket connection
mod render;  // Canvas drawing of the draw plan
mod ui;      // DOM overlays
mod utils;   // Console logging

pub use board::{Bounds, DrawPlan, Drawable, Reconciler, Shape};
pub use config::{ClientConfig, ClientConfigError};
pub use game::GameClient;
pub use identity::{ConfigError, Identity};
pub use input::InputController;
pub use lifecycle::{Lifecycle, LifecycleState, Outcome};
pub use session::{Effect, Session};

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[wasm_bindgen]
pub struct GameClientWrapper {
    client: Rc<RefCell<GameClient>>,
}

#[wasm_bindgen]
impl GameClientWrapper {
    /// `config` is an optional plain JS object shaped like the TOML config.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, server_url: &str, config: JsValue) -> Result<GameClientWrapper, JsValue> {
        init();

        let config = load_config(config)?;
        utils::init_logging(&config.log_level);
        info!(canvas_id, server_url, "starting client");

        let client = GameClient::new(canvas_id, server_url, config)?;
        let client_rc = Rc::new(RefCell::new(client));

        setup_websocket_handlers(&client_rc)?;
        setup_animation_loop(client_rc.clone())?;
        setup_input_handlers(&client_rc)?;

        Ok(GameClientWrapper { client: client_rc })
    }

    /// Current lifecycle state: "lobby", "playing", "dead" or "victory".
    pub fn state(&self) -> String {
        match self.client.borrow().state() {
            LifecycleState::Lobby => "lobby",
            LifecycleState::Playing => "playing",
            LifecycleState::Dead => "dead",
            LifecycleState::Victory => "victory",
        }
        .to_string()
    }

    /// Last direction sent or announced, as its wire token.
    pub fn pending_direction(&self) -> Option<String> {
        self.client
            .borrow()
            .session()
            .pending_direction()
            .map(|d| d.token().to_string())
    }

    /// Get the underlying WebSocket for connection status checks
    pub fn websocket(&self) -> WebSocket {
        self.client.borrow().websocket()
    }
}

fn load_config(value: JsValue) -> Result<ClientConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(ClientConfig::default());
    }
    let config: ClientConfig = serde_wasm_bindgen::from_value(value)?;
    config.validate().map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(config)
}

fn setup_websocket_handlers(client: &Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let (ws, frame_queue, ws_open_flag, ws_close_flag) = {
        let client = client.borrow();
        (
            client.websocket(),
            client.frame_queue(),
            client.ws_open_flag(),
            client.ws_close_flag(),
        )
    };

    let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
        match event.data().as_string() {
            Some(text) => frame_queue.borrow_mut().push_back(text),
            None => warn!("ignoring non-text frame"),
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    let onopen = Closure::wrap(Box::new(move |_event: JsValue| {
        ws_open_flag.set(true);
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    let onerror = Closure::wrap(Box::new(move |e: JsValue| {
        error!(error = ?e, "websocket error");
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    // No reconnect: a dropped socket ends the match for this page.
    let onclose = Closure::wrap(Box::new(move |event: CloseEvent| {
        info!(code = event.code(), "websocket closed");
        ws_close_flag.set(true);
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();

    Ok(())
}

fn setup_animation_loop(client: Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;

    let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();

    *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        if let Err(e) = client.borrow_mut().update() {
            error!(error = ?e, "update failed");
        }

        if let (Some(win), Some(callback)) = (web_sys::window(), f.borrow().as_ref()) {
            win.request_animation_frame(callback.as_ref().unchecked_ref()).ok();
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = g.borrow().as_ref() {
        window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }

    Ok(())
}

fn setup_input_handlers(client: &Rc<RefCell<GameClient>>) -> Result<(), JsValue> {
    let window = window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    let key_queue = client.borrow().key_queue();
    let closure = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        key_queue.borrow_mut().push_back(event.key());
    }) as Box<dyn FnMut(_)>);

    document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}
