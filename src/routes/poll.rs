//! `/poll/*` routes: manual control over image polling.

use crate::platform::Platform;
use crate::session::Session;

// ── POST /poll/start ───────────────────────────────────────────────

/// Start polling now. Returns `polling`, or `busy` when a check is already in
/// flight or the image is showing.
pub fn handle_start_post<P: Platform>(session: &Session<P>) -> String {
    if session.start_polling() {
        "polling".to_string()
    } else {
        "busy".to_string()
    }
}

// ── POST /poll/stop ────────────────────────────────────────────────

pub fn handle_stop_post<P: Platform>(session: &Session<P>) -> String {
    session.stop();
    "stopped".to_string()
}

// ── GET /poll/state ────────────────────────────────────────────────

pub fn handle_state_get<P: Platform>(session: &Session<P>) -> String {
    session.poll_phase().as_str().to_string()
}
