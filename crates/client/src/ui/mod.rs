// DOM overlays: lobby banner, end-of-match banners, setup error
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::lifecycle::Outcome;
use crate::session::Effect;

pub const INTRO_ID: &str = "intro";
pub const VICTORY_ID: &str = "victoryBanner";
pub const DEATH_ID: &str = "deathBanner";
pub const SETUP_ERROR_ID: &str = "setupError";

const HIDDEN: &str = "hidden";

/// Overlay changes for one session effect, as `(element id, hidden)`.
///
/// An outcome also hides the intro: a match can end straight from the lobby
/// when the start event was missed.
pub fn banner_changes(effect: &Effect) -> Vec<(&'static str, bool)> {
    match effect {
        Effect::EnterPlaying => vec![(INTRO_ID, true)],
        Effect::ShowOverlay(Outcome::Dead) => vec![(INTRO_ID, true), (DEATH_ID, false)],
        Effect::ShowOverlay(Outcome::Victory) => vec![(INTRO_ID, true), (VICTORY_ID, false)],
        Effect::SetupFailed => vec![(SETUP_ERROR_ID, false)],
        Effect::Send(_) | Effect::Repaint => Vec::new(),
    }
}

pub struct UI {
    document: Document,
}

impl UI {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn get_el(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn set_hidden(&self, id: &str, hidden: bool) {
        let Some(el) = self.get_el(id) else {
            tracing::debug!(id, "overlay element missing");
            return;
        };
        let class = js_sys::Array::of1(&JsValue::from(HIDDEN));
        if hidden {
            el.class_list().add(&class).ok();
        } else {
            el.class_list().remove(&class).ok();
        }
    }

    /// Lobby look: intro visible, every other overlay hidden.
    pub fn show_lobby(&self) {
        self.set_hidden(INTRO_ID, false);
        for id in [VICTORY_ID, DEATH_ID, SETUP_ERROR_ID] {
            self.set_hidden(id, true);
        }
    }

    pub fn apply(&self, effect: &Effect) {
        for (id, hidden) in banner_changes(effect) {
            self.set_hidden(id, hidden);
        }
    }
}
