//! Poll state machine.
//!
//! ```text
//!   Idle ──start──▶ Polling ──image loaded──▶ Revealed
//!    │                │ ▲
//!    │              stop│ │start (only while waiting to retry)
//!    └─────stop────▶ Cancelled ──start──▶ Polling
//! ```

use std::time::Duration;

use crate::config::PollPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Polling,
    Revealed,
    Cancelled,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Polling => "polling",
            Phase::Revealed => "revealed",
            Phase::Cancelled => "cancelled",
        }
    }
}

/// Why the loop is waiting before the next check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The server has no image yet.
    Absent,
    /// Transport or parse failure.
    CheckFailed,
    /// The URL came back but the image would not load.
    ImageLoadFailed,
}

impl RetryReason {
    pub fn delay(self, policy: &PollPolicy) -> Duration {
        match self {
            RetryReason::Absent => policy.absent_delay(),
            RetryReason::CheckFailed | RetryReason::ImageLoadFailed => policy.retry_delay(),
        }
    }
}

/// What the running loop is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checking,
    Probing,
    Waiting(RetryReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub phase: Phase,
    /// Consecutive absent or failed outcomes in the current run.
    pub attempt: u32,
    pub stage: Option<Stage>,
    /// Bumped by every start and stop; a loop acts only while its generation
    /// is current.
    pub generation: u64,
}

impl Default for PollState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            attempt: 0,
            stage: None,
            generation: 0,
        }
    }
}

impl PollState {
    /// A new loop may begin from idle or cancelled, or supersede one that is
    /// only waiting out a retry delay. Never while a check is in flight.
    pub fn can_start(&self) -> bool {
        match self.phase {
            Phase::Idle | Phase::Cancelled => true,
            Phase::Polling => matches!(self.stage, Some(Stage::Waiting(_))),
            Phase::Revealed => false,
        }
    }

    /// Enter `Polling` for a new loop and return its generation.
    pub fn begin(&mut self) -> u64 {
        if self.phase != Phase::Polling {
            self.attempt = 0;
        }
        self.generation += 1;
        self.phase = Phase::Polling;
        self.stage = Some(Stage::Checking);
        self.generation
    }

    /// Invalidate any running loop. Returns whether a loop was polling.
    pub fn cancel(&mut self) -> bool {
        let was_polling = self.phase == Phase::Polling;
        self.generation += 1;
        self.stage = None;
        if self.phase != Phase::Revealed {
            self.phase = Phase::Cancelled;
        }
        was_polling
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.phase == Phase::Polling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_rules() {
        let mut s = PollState::default();
        assert!(s.can_start());
        let g = s.begin();
        assert!(s.is_current(g));
        assert!(!s.can_start(), "check in flight");
        s.stage = Some(Stage::Probing);
        assert!(!s.can_start(), "image load in flight");
        s.stage = Some(Stage::Waiting(RetryReason::Absent));
        assert!(s.can_start(), "retry wait may be superseded");
        s.phase = Phase::Revealed;
        assert!(!s.can_start());
    }

    #[test]
    fn cancel_from_any_phase() {
        let mut s = PollState::default();
        assert!(!s.cancel());
        assert_eq!(s.phase, Phase::Cancelled);

        let g = s.begin();
        assert!(s.cancel());
        assert!(!s.is_current(g));
        assert!(s.can_start());

        s.phase = Phase::Revealed;
        s.cancel();
        assert_eq!(s.phase, Phase::Revealed);
    }

    #[test]
    fn superseding_keeps_attempt_count_restart_resets_it() {
        let mut s = PollState::default();
        s.begin();
        s.attempt = 4;
        s.stage = Some(Stage::Waiting(RetryReason::CheckFailed));
        s.begin();
        assert_eq!(s.attempt, 4);
        s.cancel();
        s.begin();
        assert_eq!(s.attempt, 0);
    }

    #[test]
    fn absent_waits_less_than_failure() {
        let policy = PollPolicy::default();
        assert_eq!(RetryReason::Absent.delay(&policy), Duration::from_millis(2000));
        assert_eq!(RetryReason::CheckFailed.delay(&policy), Duration::from_millis(3000));
        assert_eq!(RetryReason::ImageLoadFailed.delay(&policy), Duration::from_millis(3000));
    }
}
