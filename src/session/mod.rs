//! Session controller: owns everything one story page needs and wires the
//! poller and the save store together at bootstrap.
//!
//! Roster, story and translations are held here and passed explicitly to
//! whatever renders them; nothing lives in module-level state.

pub mod roster;

use futures::future::{AbortHandle, Abortable};
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::i18n::Localization;
use crate::platform::{ImageView, Parts, Platform, Timer};
use crate::poll::{Phase, Poller};
use crate::saves::SaveStore;

pub use roster::{Character, Roster, RosterInput, Story, StoryInput, render_character_detail};

/// Everything the page template hands over at startup.
#[derive(Debug, Clone, Default)]
pub struct BootstrapInput {
    pub characters: RosterInput,
    pub story: StoryInput,
    pub image_pending: bool,
    pub translations: Localization,
}

pub struct Session<P: Platform> {
    config: ClientConfig,
    i18n: Rc<Localization>,
    roster: Roster,
    story: Option<Story>,
    poller: Poller<P>,
    saves: SaveStore<P>,
    images: Rc<P::Images>,
    page: Rc<P::Page>,
    timer: P::Timer,
    spawner: P::Spawner,
    delayed_start: RefCell<Option<AbortHandle>>,
    boot_error: Option<ClientError>,
}

impl<P: Platform> Session<P> {
    /// Build the session and run the bootstrap sequence. Never fails: a bad
    /// payload is logged and leaves the session without story text and with
    /// the poller idle.
    pub fn bootstrap(parts: Parts<P>, config: ClientConfig, input: BootstrapInput) -> Rc<Self> {
        let i18n = Rc::new(input.translations);
        let api = Rc::new(ApiClient::new(parts.transport, config.endpoints.clone()));
        let images = Rc::new(parts.images);
        let page = Rc::new(parts.page);

        let poller = Poller::new(
            Rc::clone(&api),
            Rc::clone(&images),
            parts.timer.clone(),
            Rc::clone(&i18n),
            config.poll.clone(),
        );
        let saves = SaveStore::new(
            api,
            parts.storage,
            Rc::clone(&page),
            parts.clock,
            Rc::clone(&i18n),
            config.storage_key.clone(),
        );

        let (roster, story, boot_error) = match prepare(input.characters, input.story, &i18n) {
            Ok((roster, story)) => (roster, Some(story), None),
            Err(err) => {
                tracing::error!(error = %err, "bootstrap failed; continuing without story");
                (Roster::default(), None, Some(err))
            }
        };
        if let Some(story) = &story {
            tracing::debug!(characters = roster.len(), history = story.history().len(), "story loaded");
        }

        let session = Rc::new(Self {
            config,
            i18n,
            roster,
            story,
            poller,
            saves,
            images,
            page,
            timer: parts.timer,
            spawner: parts.spawner,
            delayed_start: RefCell::new(None),
            boot_error,
        });

        if session.boot_error.is_none() {
            session.settle_image(input.image_pending);
        }
        session
    }

    /// Start polling after the settle delay, or hide the empty image slot.
    fn settle_image(&self, image_pending: bool) {
        if !image_pending {
            if !self.images.has_revealed_image() {
                self.images.hide_container();
            }
            return;
        }

        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.delayed_start.borrow_mut().replace(handle) {
            previous.abort();
        }
        let poller = self.poller.clone();
        let timer = self.timer.clone();
        let delay = self.config.poll.initial_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "image pending; polling shortly");

        let delayed = Abortable::new(
            async move {
                timer.sleep(delay).await;
                if let Some(run) = poller.start() {
                    let outcome = run.await;
                    tracing::debug!(?outcome, "poll run finished");
                }
            },
            registration,
        );
        self.spawn(async move {
            let _ = delayed.await;
        });
    }

    fn spawn(&self, task: impl std::future::Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(task) {
            tracing::error!(error = %err, "could not spawn task");
        }
    }

    /// Start (or restart) polling now. Returns false when a check is already
    /// in flight or the image is revealed.
    pub fn start_polling(&self) -> bool {
        match self.poller.start() {
            Some(run) => {
                self.spawn(run.map(|outcome| tracing::debug!(?outcome, "poll run finished")));
                true
            }
            None => false,
        }
    }

    /// Cancel the pending delayed start and any running poll.
    pub fn stop(&self) {
        if let Some(handle) = self.delayed_start.borrow_mut().take() {
            handle.abort();
        }
        self.poller.stop();
    }

    pub fn poll_phase(&self) -> Phase {
        self.poller.phase()
    }

    pub fn poller(&self) -> &Poller<P> {
        &self.poller
    }

    pub fn saves(&self) -> &SaveStore<P> {
        &self.saves
    }

    pub fn page(&self) -> &P::Page {
        &self.page
    }

    pub fn i18n(&self) -> &Localization {
        &self.i18n
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn story(&self) -> Option<&Story> {
        self.story.as_ref()
    }

    pub fn boot_error(&self) -> Option<&ClientError> {
        self.boot_error.as_ref()
    }

    /// Character-detail dialog body, or `None` for an unknown id.
    pub fn character_detail(&self, id: &str) -> Option<String> {
        match self.roster.get(id) {
            Some(c) => Some(render_character_detail(c, &self.i18n)),
            None => {
                tracing::error!(id, "character not found");
                None
            }
        }
    }
}

fn prepare(
    characters: RosterInput,
    story: StoryInput,
    i18n: &Localization,
) -> Result<(Roster, Story), ClientError> {
    let roster = Roster::from_input(characters)?;
    let mut story = story.into_story()?;
    if story.text.trim().is_empty() {
        story.text = i18n.get("story.welcome").into_owned();
    }
    Ok((roster, story))
}
