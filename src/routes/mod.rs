//! Action router for the page.
//!
//! The page calls `dispatch(method, path, body)` for every button and form.
//! Paths are matched with `matchit` and each handler answers with a text or
//! HTML fragment for the page to swap in.

pub mod dialogs;
pub mod poll;
pub mod saves;
pub mod util;

use crate::platform::Platform;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    PollStart,
    PollStop,
    PollState,
    Saves,
    SaveLoad,
    SaveDelete,
    Character,
    DialogOpen,
    DialogClose,
}

fn router() -> matchit::Router<Route> {
    let mut router = matchit::Router::new();
    router.insert("/poll/start", Route::PollStart).ok();
    router.insert("/poll/stop", Route::PollStop).ok();
    router.insert("/poll/state", Route::PollState).ok();
    router.insert("/saves", Route::Saves).ok();
    router.insert("/saves/{id}/load", Route::SaveLoad).ok();
    router.insert("/saves/{id}/delete", Route::SaveDelete).ok();
    router.insert("/characters/{id}", Route::Character).ok();
    router.insert("/dialogs/{name}/open", Route::DialogOpen).ok();
    router.insert("/dialogs/{name}/close", Route::DialogClose).ok();
    router
}

/// Process one page action and return the fragment to display.
pub async fn dispatch<P: Platform>(
    session: &Session<P>,
    method: &str,
    path: &str,
    body: &str,
) -> String {
    let router = router();
    let matched = match router.at(path) {
        Ok(m) => m,
        Err(_) => {
            tracing::debug!(method, path, "no route");
            return not_found();
        }
    };
    let param = |name: &str| util::percent_decode(matched.params.get(name).unwrap_or(""));

    match (*matched.value, method) {
        (Route::PollStart, "POST") => poll::handle_start_post(session),
        (Route::PollStop, "POST") => poll::handle_stop_post(session),
        (Route::PollState, "GET") => poll::handle_state_get(session),

        (Route::Saves, "GET") => saves::handle_list_get(session).await,
        (Route::Saves, "POST") => saves::handle_save_post(session, body).await,
        (Route::SaveLoad, "POST") => saves::handle_load_post(session, &param("id")).await,
        (Route::SaveDelete, "POST") => saves::handle_delete_post(session, &param("id")).await,

        (Route::Character, "GET") => dialogs::handle_character_get(session, &param("id")),
        (Route::DialogOpen, "GET") => dialogs::handle_open_get(session, &param("name")).await,
        (Route::DialogClose, "GET") => dialogs::handle_close_get(session, &param("name")),

        _ => {
            tracing::debug!(method, path, "method not allowed");
            method_not_allowed()
        }
    }
}

fn not_found() -> String {
    r#"<span class="route-error">404: route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="route-error">405: method not allowed</span>"#.to_string()
}
