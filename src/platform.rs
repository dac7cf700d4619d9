//! Collaborator seams between the client core and the page.
//!
//! The core never touches the DOM, the network or storage directly. The
//! browser bindings in `web` implement these traits; tests use the fakes in
//! `testing`.

use chrono::{DateTime, Utc};
use futures::task::LocalSpawn;
use std::time::Duration;

use crate::error::{ClientError, StorageError};

/// Same-origin HTTP with the page's credentials.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// GET `path` and return the body of a 2xx response. With `no_cache` the
    /// request carries cache-defeating headers and bypasses the HTTP cache.
    async fn get(&self, path: &str, no_cache: bool) -> Result<String, ClientError>;

    /// POST `body` as `application/json` and return the body of a 2xx response.
    async fn post_json(&self, path: &str, body: String) -> Result<String, ClientError>;
}

/// Synchronous key-value storage (browser `localStorage`).
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One-shot delays.
#[allow(async_fn_in_trait)]
pub trait Timer {
    async fn sleep(&self, duration: Duration);
}

/// Wall clock used to stamp save records.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The story image slot and its loading indicator.
#[allow(async_fn_in_trait)]
pub trait ImageView {
    /// Make the image container visible and start the loading animation.
    fn show_loading(&self);
    /// Stop the loading animation and hide the indicator.
    fn hide_loading(&self);
    /// Replace the status text shown next to the loading animation.
    fn set_loading_text(&self, text: &str);
    /// Point the image element at `url` and wait for its own load or error event.
    async fn load_image(&self, url: &str) -> Result<(), ClientError>;
    /// Show the loaded image, fading opacity from 0 to 1 over `fade`.
    fn reveal(&self, url: &str, fade: Duration);
    /// Whether a previous render already shows an image.
    fn has_revealed_image(&self) -> bool;
    fn hide_container(&self);
}

/// Dialogs the page can show without reloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialog {
    Character,
    Menu,
    History,
    Saves,
    SaveEntry,
}

impl Dialog {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialog::Character => "character",
            Dialog::Menu => "menu",
            Dialog::History => "history",
            Dialog::Saves => "saves",
            Dialog::SaveEntry => "save-entry",
        }
    }

    pub fn parse(name: &str) -> Option<Dialog> {
        match name {
            "character" => Some(Dialog::Character),
            "menu" => Some(Dialog::Menu),
            "history" => Some(Dialog::History),
            "saves" => Some(Dialog::Saves),
            "save-entry" => Some(Dialog::SaveEntry),
            _ => None,
        }
    }
}

/// Player-facing page surface: notifications, confirmation and dialogs.
#[allow(async_fn_in_trait)]
pub trait PageUi {
    fn notify(&self, message: &str);
    /// Ask a yes/no question. Must not resolve before the player decides.
    async fn confirm(&self, message: &str) -> bool;
    fn open_dialog(&self, dialog: Dialog);
    fn close_dialog(&self, dialog: Dialog);
    /// Replace the body of the save listing if it is currently open.
    fn refresh_save_list(&self, html: &str);
    /// Reinitialize the page from server state.
    fn reload(&self);
}

/// Bundle of collaborator types for one runtime (browser or tests).
pub trait Platform: 'static {
    type Transport: Transport + 'static;
    type Storage: KeyValueStorage + 'static;
    type Timer: Timer + Clone + 'static;
    type Clock: Clock + 'static;
    type Images: ImageView + 'static;
    type Page: PageUi + 'static;
    type Spawner: LocalSpawn + 'static;
}

/// Concrete collaborator instances handed to the session at bootstrap.
pub struct Parts<P: Platform> {
    pub transport: P::Transport,
    pub storage: P::Storage,
    pub timer: P::Timer,
    pub clock: P::Clock,
    pub images: P::Images,
    pub page: P::Page,
    pub spawner: P::Spawner,
}
