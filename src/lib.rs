//! Story client: in-browser controller for the narrative game page.
//!
//! Polls the story server until the scene image for the current turn has been
//! generated, then reveals it; keeps named save slots in `localStorage`; and
//! routes the page's dialog and save actions.
//!
//! The page calls four exports:
//!
//! * `init_game(config_json, characters, story_json, image_pending, translations_json)`
//! * `handle_action(method, path, body)`, a `Promise<string>` with the fragment to swap in
//! * `resolve_confirmation(answer)` for the in-page confirmation dialog
//! * `stop_polling()` before navigating away
//!
//! Everything below `web` is platform-neutral and runs natively under test.

pub mod api;
pub mod config;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod platform;
pub mod poll;
pub mod routes;
pub mod saves;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::ClientConfig;
pub use error::ClientError;
pub use session::{BootstrapInput, Session};

#[cfg(target_arch = "wasm32")]
mod exports {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use crate::config::ClientConfig;
    use crate::i18n::Localization;
    use crate::routes;
    use crate::session::{BootstrapInput, RosterInput, Session, StoryInput};
    use crate::web::BrowserPlatform;

    thread_local! {
        static SESSION: RefCell<Option<Rc<Session<BrowserPlatform>>>> = const { RefCell::new(None) };
    }

    fn current() -> Option<Rc<Session<BrowserPlatform>>> {
        SESSION.with(|s| s.borrow().clone())
    }

    /// Bootstrap the page. Calling it again replaces the previous session
    /// after stopping its poller.
    #[wasm_bindgen]
    pub fn init_game(
        config_json: &str,
        characters: &str,
        story_json: &str,
        image_pending: bool,
        translations_json: &str,
    ) {
        let (config, config_error) = ClientConfig::from_json_or_default(config_json);
        crate::logging::init(&config.log_filter);
        if let Some(err) = config_error {
            tracing::error!(error = %err, "config unreadable; using defaults");
        }

        let translations = Localization::from_json(translations_json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "translations unreadable; using built-in strings");
            Localization::default()
        });
        let input = BootstrapInput {
            characters: RosterInput::Serialized(characters.to_string()),
            story: StoryInput::Serialized(story_json.to_string()),
            image_pending,
            translations,
        };

        if let Some(previous) = current() {
            previous.stop();
        }
        let session = Session::bootstrap(BrowserPlatform::parts(), config, input);
        SESSION.with(|s| *s.borrow_mut() = Some(session));
    }

    /// Route one page action. Resolves to the fragment to display.
    #[wasm_bindgen]
    pub fn handle_action(method: String, path: String, body: String) -> js_sys::Promise {
        wasm_bindgen_futures::future_to_promise(async move {
            let Some(session) = current() else {
                return Err(JsValue::from_str("init_game has not been called"));
            };
            let html = routes::dispatch(&session, &method, &path, &body).await;
            Ok(JsValue::from_str(&html))
        })
    }

    /// Answer the pending in-page confirmation. Returns false when nothing
    /// was waiting.
    #[wasm_bindgen]
    pub fn resolve_confirmation(answer: bool) -> bool {
        current().is_some_and(|s| s.page().resolve_confirmation(answer))
    }

    #[wasm_bindgen]
    pub fn stop_polling() {
        if let Some(session) = current() {
            session.stop();
        }
    }
}
