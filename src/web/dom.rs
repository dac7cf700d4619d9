//! DOM-backed image slot and page surface.
//!
//! Element ids follow the story page template:
//!
//! | id                | role                                   |
//! |-------------------|----------------------------------------|
//! | `image-container` | wrapper around the story image         |
//! | `image-loading`   | loading indicator and status text      |
//! | `dots`            | animated dots inside the indicator     |
//! | `story-image`     | the `<img>` the poller points at a URL |
//! | `save-list`       | body of the save/load dialog           |
//! | `confirm-modal`   | optional in-page confirmation dialog   |

use futures::channel::oneshot;
use gloo::timers::callback::{Interval, Timeout};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, HtmlImageElement};

use crate::error::ClientError;
use crate::platform::{Dialog, ImageView, PageUi};

const DOTS_INTERVAL_MS: u32 = 500;
/// Pause between making the image visible and starting the fade.
const FADE_START_DELAY_MS: u32 = 50;

fn document() -> Option<web_sys::Document> {
    web_sys::window()?.document()
}

fn html(id: &str) -> Option<HtmlElement> {
    document()?.get_element_by_id(id)?.dyn_into().ok()
}

fn set_display(id: &str, value: &str) {
    if let Some(el) = html(id) {
        let _ = el.style().set_property("display", value);
    }
}

fn image_element() -> Option<HtmlImageElement> {
    document()?.get_element_by_id("story-image")?.dyn_into().ok()
}

// ── Image slot ─────────────────────────────────────────────────────

#[derive(Default)]
pub struct DomImages {
    dots: RefCell<Option<Interval>>,
}

/// Keeps the load callbacks alive while a load is awaited and detaches them
/// when the wait ends or is abandoned.
struct LoadHandlers {
    img: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl Drop for LoadHandlers {
    fn drop(&mut self) {
        self.img.set_onload(None);
        self.img.set_onerror(None);
    }
}

impl ImageView for DomImages {
    fn show_loading(&self) {
        set_display("image-container", "flex");
        set_display("image-loading", "block");
        let mut count = 0usize;
        let interval = Interval::new(DOTS_INTERVAL_MS, move || {
            count = count % 3 + 1;
            if let Some(el) = html("dots") {
                el.set_text_content(Some(&".".repeat(count)));
            }
        });
        // Replacing the handle cancels any previous animation.
        *self.dots.borrow_mut() = Some(interval);
    }

    fn hide_loading(&self) {
        self.dots.borrow_mut().take();
        set_display("image-loading", "none");
    }

    fn set_loading_text(&self, text: &str) {
        if let Some(el) = html("image-loading") {
            el.set_text_content(Some(text));
        }
    }

    async fn load_image(&self, url: &str) -> Result<(), ClientError> {
        let img = image_element()
            .ok_or_else(|| ClientError::ImageLoadFailure("no story image element".into()))?;

        let (tx, rx) = oneshot::channel::<bool>();
        let tx = Rc::new(RefCell::new(Some(tx)));
        let load_tx = Rc::clone(&tx);
        let onload = Closure::once(move || {
            if let Some(tx) = load_tx.borrow_mut().take() {
                let _ = tx.send(true);
            }
        });
        let onerror = Closure::once(move || {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(false);
            }
        });
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        let _handlers = LoadHandlers {
            img: img.clone(),
            _onload: onload,
            _onerror: onerror,
        };

        let _ = img.style().set_property("display", "none");
        img.set_src(url);
        match rx.await {
            Ok(true) => Ok(()),
            _ => Err(ClientError::ImageLoadFailure(format!("could not load {}", url))),
        }
    }

    fn reveal(&self, url: &str, fade: Duration) {
        let Some(img) = image_element() else {
            tracing::warn!("no story image element to reveal");
            return;
        };
        if img.get_attribute("src").as_deref() != Some(url) {
            img.set_src(url);
        }
        let style = img.style();
        let _ = style.set_property("display", "block");
        let _ = style.set_property("opacity", "0");
        let transition = format!("opacity {}s ease-in-out", fade.as_secs_f64());
        let _ = Timeout::new(FADE_START_DELAY_MS, move || {
            let style = img.style();
            let _ = style.set_property("transition", &transition);
            let _ = style.set_property("opacity", "1");
        })
        .forget();
    }

    fn has_revealed_image(&self) -> bool {
        image_element().is_some_and(|img| {
            let has_src = img.get_attribute("src").is_some_and(|s| !s.is_empty());
            let display = img.style().get_property_value("display").unwrap_or_default();
            has_src && display != "none"
        })
    }

    fn hide_container(&self) {
        set_display("image-container", "none");
    }
}

// ── Page surface ───────────────────────────────────────────────────

fn dialog_element_id(dialog: Dialog) -> &'static str {
    match dialog {
        Dialog::Character => "character-modal",
        Dialog::Menu => "game-menu-modal",
        Dialog::History => "history-modal",
        Dialog::Saves => "save-modal",
        Dialog::SaveEntry => "save-entry-modal",
    }
}

#[derive(Default)]
pub struct DomPage {
    pending: RefCell<Option<oneshot::Sender<bool>>>,
}

impl DomPage {
    /// Deliver the player's answer to the in-page confirmation dialog.
    /// Returns false when no confirmation is waiting.
    pub fn resolve_confirmation(&self, answer: bool) -> bool {
        match self.pending.borrow_mut().take() {
            Some(tx) => tx.send(answer).is_ok(),
            None => false,
        }
    }
}

impl PageUi for DomPage {
    fn notify(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    async fn confirm(&self, message: &str) -> bool {
        let Some(modal) = html("confirm-modal") else {
            return web_sys::window()
                .and_then(|w| w.confirm_with_message(message).ok())
                .unwrap_or(false);
        };
        if let Some(text) = html("confirm-message") {
            text.set_text_content(Some(message));
        }
        let (tx, rx) = oneshot::channel();
        if let Some(previous) = self.pending.borrow_mut().replace(tx) {
            let _ = previous.send(false);
        }
        let _ = modal.style().set_property("display", "flex");
        let answer = rx.await.unwrap_or(false);
        let _ = modal.style().set_property("display", "none");
        answer
    }

    fn open_dialog(&self, dialog: Dialog) {
        set_display(dialog_element_id(dialog), "flex");
    }

    fn close_dialog(&self, dialog: Dialog) {
        set_display(dialog_element_id(dialog), "none");
    }

    fn refresh_save_list(&self, markup: &str) {
        if let Some(el) = html("save-list") {
            el.set_inner_html(markup);
        }
    }

    fn reload(&self) {
        if let Some(window) = web_sys::window() {
            if let Err(err) = window.location().reload() {
                tracing::error!(error = ?err, "page reload failed");
            }
        }
    }
}
