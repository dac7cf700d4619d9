//! Dialog and character-detail routes.

use crate::platform::{Dialog, PageUi, Platform};
use crate::routes::util::escape_html;
use crate::session::Session;

// ── GET /characters/{id} ───────────────────────────────────────────

/// Character-detail body. Opens the character dialog when the id is known.
pub fn handle_character_get<P: Platform>(session: &Session<P>, id: &str) -> String {
    match session.character_detail(id) {
        Some(html) => {
            session.page().open_dialog(Dialog::Character);
            html
        }
        None => format!(
            r#"<span class="dialog-error">Unknown character: {}</span>"#,
            escape_html(id)
        ),
    }
}

// ── GET /dialogs/{name}/open ───────────────────────────────────────

/// Open a dialog and return the body it should show, if it has one: the
/// history dialog gets the previous paragraphs, the saves dialog the listing.
pub async fn handle_open_get<P: Platform>(session: &Session<P>, name: &str) -> String {
    let Some(dialog) = Dialog::parse(name) else {
        return unknown_dialog(name);
    };
    session.page().open_dialog(dialog);
    match dialog {
        Dialog::History => render_history(session),
        Dialog::Saves => session.saves().render_listing().await,
        Dialog::Character | Dialog::Menu | Dialog::SaveEntry => String::new(),
    }
}

// ── GET /dialogs/{name}/close ──────────────────────────────────────

pub fn handle_close_get<P: Platform>(session: &Session<P>, name: &str) -> String {
    match Dialog::parse(name) {
        Some(dialog) => {
            session.page().close_dialog(dialog);
            String::new()
        }
        None => unknown_dialog(name),
    }
}

fn render_history<P: Platform>(session: &Session<P>) -> String {
    let paragraphs = session.story().map(|s| s.history()).unwrap_or_default();
    let mut h = String::with_capacity(128);
    h.push_str(r#"<div class="history-text">"#);
    for p in paragraphs {
        h.push_str(&format!("<p>{}</p>", escape_html(p)));
    }
    h.push_str("</div>");
    h
}

fn unknown_dialog(name: &str) -> String {
    format!(
        r#"<span class="dialog-error">Unknown dialog: {}</span>"#,
        escape_html(name)
    )
}
