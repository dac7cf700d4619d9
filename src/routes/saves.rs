//! `/saves*` routes: the save/load dialog.
//!
//! Each handler returns the fragment the dialog should show next. Player
//! feedback (success and failure messages) goes through the page's notifier,
//! so a failed operation still answers with the current listing.

use crate::platform::Platform;
use crate::routes::util::{get_param, parse_form_body};
use crate::saves::{DeleteOutcome, LoadOutcome};
use crate::session::Session;

// ── GET /saves ─────────────────────────────────────────────────────

pub async fn handle_list_get<P: Platform>(session: &Session<P>) -> String {
    session.saves().render_listing().await
}

// ── POST /saves ────────────────────────────────────────────────────

/// Body: `save_name={name}`. A missing or blank name gets the default label.
pub async fn handle_save_post<P: Platform>(session: &Session<P>, body: &str) -> String {
    let params = parse_form_body(body);
    let name = get_param(&params, "save_name");
    match session.saves().save(name).await {
        Ok(record) => tracing::debug!(id = %record.id, "save stored"),
        Err(err) => tracing::debug!(error = %err, "save failed; listing unchanged"),
    }
    session.saves().render_listing().await
}

// ── POST /saves/{id}/load ──────────────────────────────────────────

/// Returns `restored` (the page is reloading), `declined`, or `failed`. The
/// player already saw the failure through the notifier.
pub async fn handle_load_post<P: Platform>(session: &Session<P>, id: &str) -> String {
    match session.saves().load(id).await {
        Ok(LoadOutcome::Restored) => "restored".to_string(),
        Ok(LoadOutcome::Declined) => "declined".to_string(),
        Err(err) => {
            tracing::debug!(id, error = %err, "load failed");
            "failed".to_string()
        }
    }
}

// ── POST /saves/{id}/delete ────────────────────────────────────────

pub async fn handle_delete_post<P: Platform>(session: &Session<P>, id: &str) -> String {
    if let Ok(outcome @ (DeleteOutcome::Declined | DeleteOutcome::Missing)) =
        session.saves().delete(id).await
    {
        tracing::debug!(id, ?outcome, "delete left the listing unchanged");
    }
    session.saves().render_listing().await
}
