// WebSocket connection carrying JSON text frames
use protocol::packets::OutboundCommand;
use tracing::{debug, info};
use wasm_bindgen::prelude::*;
use web_sys::WebSocket;

/// `WebSocket.OPEN`
const READY_OPEN: u16 = 1;

pub struct Connection {
    ws: WebSocket,
    url: String,
}

impl Connection {
    /// Open a socket. A bare `host:port` gets `ws://` or `wss://` depending
    /// on how the page itself was served.
    pub fn new(url: &str) -> Result<Self, JsValue> {
        let ws_url = if url.starts_with("ws://") || url.starts_with("wss://") {
            url.to_string()
        } else {
            let is_https = web_sys::window()
                .and_then(|w| w.location().protocol().ok())
                .map(|p| p == "https:")
                .unwrap_or(false);
            format!("ws{}://{}", if is_https { "s" } else { "" }, url)
        };

        info!(url = %ws_url, "connecting");
        let ws = WebSocket::new(&ws_url)?;
        Ok(Self { ws, url: ws_url })
    }

    pub fn websocket(&self) -> &WebSocket {
        &self.ws
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.ws.ready_state() == READY_OPEN
    }

    /// Serialize and send one command.
    pub fn send(&self, command: &OutboundCommand) -> Result<(), JsValue> {
        if !self.is_open() {
            return Err(JsValue::from_str("WebSocket not ready"));
        }
        let frame = command.to_frame();
        debug!(%frame, "sending");
        self.ws.send_with_str(&frame)
    }
}
