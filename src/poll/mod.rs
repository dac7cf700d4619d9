//! Image availability poller.
//!
//! The server generates story images asynchronously and cannot push. The
//! poller asks the image-check endpoint until a URL comes back, waits for the
//! image element itself to load that URL, then hands it to the reveal
//! collaborator exactly once. Absent answers retry after the short delay,
//! failures after the long one. Polling continues until the image is revealed,
//! the poller is stopped, or an optional attempt ceiling is reached.
//!
//! Checks are strictly sequential: a new check is never issued before the
//! previous one, including its image load, has resolved.

pub mod state;

use futures::future::{self, AbortHandle, Abortable, Either, LocalBoxFuture};
use futures::FutureExt;
use std::cell::RefCell;
use std::pin::pin;
use std::rc::Rc;

use crate::api::{ApiClient, ImageCheck};
use crate::config::PollPolicy;
use crate::error::ClientError;
use crate::i18n::Localization;
use crate::platform::{ImageView, Platform, Timer};

pub use state::{Phase, PollState, RetryReason, Stage};

/// How a poll run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Revealed(String),
    Cancelled,
    GaveUp { attempts: u32 },
}

/// A running poll loop. Drive it on the page's executor.
pub type PollTask = LocalBoxFuture<'static, PollOutcome>;

pub struct Poller<P: Platform> {
    inner: Rc<Inner<P>>,
}

impl<P: Platform> Clone for Poller<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct Inner<P: Platform> {
    api: Rc<ApiClient<P::Transport>>,
    images: Rc<P::Images>,
    timer: P::Timer,
    i18n: Rc<Localization>,
    policy: PollPolicy,
    state: RefCell<PollState>,
    abort: RefCell<Option<AbortHandle>>,
}

impl<P: Platform> Poller<P> {
    pub fn new(
        api: Rc<ApiClient<P::Transport>>,
        images: Rc<P::Images>,
        timer: P::Timer,
        i18n: Rc<Localization>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                api,
                images,
                timer,
                i18n,
                policy,
                state: RefCell::new(PollState::default()),
                abort: RefCell::new(None),
            }),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.state.borrow().phase
    }

    pub fn state(&self) -> PollState {
        self.inner.state.borrow().clone()
    }

    /// Begin polling and return the loop to drive, or `None` when a check is
    /// already in flight or the image has been revealed. Starting while a
    /// retry wait is pending supersedes that wait and checks immediately.
    pub fn start(&self) -> Option<PollTask> {
        let generation = {
            let mut state = self.inner.state.borrow_mut();
            if !state.can_start() {
                tracing::debug!(phase = state.phase.as_str(), "poll start ignored");
                return None;
            }
            state.begin()
        };

        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.inner.abort.borrow_mut().replace(handle) {
            previous.abort();
        }

        self.inner.images.show_loading();
        tracing::info!(generation, "image polling started");

        let inner = Rc::clone(&self.inner);
        let run = Abortable::new(async move { inner.run(generation).await }, registration);
        Some(
            async move { run.await.unwrap_or(PollOutcome::Cancelled) }.boxed_local(),
        )
    }

    /// Cancel polling. Safe in any phase, including before the first start.
    /// A pending retry timer is dropped and an in-flight response is ignored.
    pub fn stop(&self) {
        if let Some(handle) = self.inner.abort.borrow_mut().take() {
            handle.abort();
        }
        let was_polling = self.inner.state.borrow_mut().cancel();
        if was_polling {
            self.inner.images.hide_loading();
            tracing::info!("image polling stopped");
        }
    }
}

impl<P: Platform> Inner<P> {
    fn is_current(&self, generation: u64) -> bool {
        self.state.borrow().is_current(generation)
    }

    fn set_stage(&self, stage: Stage) {
        self.state.borrow_mut().stage = Some(stage);
    }

    async fn run(&self, generation: u64) -> PollOutcome {
        loop {
            self.set_stage(Stage::Checking);
            let checked = self.check().await;
            if !self.is_current(generation) {
                return PollOutcome::Cancelled;
            }

            let reason = match checked {
                Ok(ImageCheck::Ready(url)) => {
                    self.set_stage(Stage::Probing);
                    let loaded = self.images.load_image(&url).await;
                    if !self.is_current(generation) {
                        return PollOutcome::Cancelled;
                    }
                    match loaded {
                        Ok(()) => return self.reveal(url),
                        Err(err) => {
                            tracing::warn!(url = %url, error = %err, "image failed to load; retrying");
                            self.images.set_loading_text(&self.i18n.get("image.retrying"));
                            RetryReason::ImageLoadFailed
                        }
                    }
                }
                Ok(ImageCheck::Pending) => {
                    tracing::debug!("no image yet");
                    RetryReason::Absent
                }
                Err(err) => {
                    tracing::warn!(error = %err, "image check failed");
                    self.images.set_loading_text(&self.i18n.get("image.checking"));
                    RetryReason::CheckFailed
                }
            };

            let attempt = {
                let mut state = self.state.borrow_mut();
                state.attempt += 1;
                state.stage = Some(Stage::Waiting(reason));
                state.attempt
            };

            if let Some(max) = self.policy.max_attempts {
                if attempt >= max {
                    return self.give_up(attempt);
                }
            }

            let delay = reason.delay(&self.policy);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, ?reason, "next image check scheduled");
            self.timer.sleep(delay).await;
            if !self.is_current(generation) {
                return PollOutcome::Cancelled;
            }
        }
    }

    async fn check(&self) -> Result<ImageCheck, ClientError> {
        let Some(limit) = self.policy.check_timeout() else {
            return self.api.check_image().await;
        };
        let check = pin!(self.api.check_image());
        let deadline = pin!(self.timer.sleep(limit));
        match future::select(check, deadline).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ClientError::NetworkFailure(format!(
                "image check timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }

    fn reveal(&self, url: String) -> PollOutcome {
        let attempts = {
            let mut state = self.state.borrow_mut();
            state.phase = Phase::Revealed;
            state.stage = None;
            state.attempt
        };
        self.abort.borrow_mut().take();
        self.images.hide_loading();
        self.images.reveal(&url, self.policy.fade());
        tracing::info!(url = %url, attempts, "image revealed");
        PollOutcome::Revealed(url)
    }

    fn give_up(&self, attempts: u32) -> PollOutcome {
        {
            let mut state = self.state.borrow_mut();
            state.phase = Phase::Cancelled;
            state.stage = None;
        }
        self.abort.borrow_mut().take();
        self.images.set_loading_text(&self.i18n.get("image.unavailable"));
        tracing::warn!(attempts, "giving up on image after repeated failures");
        PollOutcome::GaveUp { attempts }
    }
}
