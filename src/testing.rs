//! Scripted collaborators for driving the client core natively.
//!
//! Every fake is a cheap handle over shared state, so a test keeps one clone
//! for scripting and assertions while the code under test owns another.

use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::config::{ClientConfig, Endpoints, PollPolicy};
use crate::error::ClientError;
use crate::i18n::Localization;
use crate::platform::{Clock, Dialog, ImageView, PageUi, Parts, Platform, Timer, Transport};
use crate::poll::Poller;
use crate::saves::{MemoryStorage, SaveStore};
use crate::session::{BootstrapInput, Session};

/// Clock reading handed out by a fresh `StepClock`.
pub fn first_instant() -> DateTime<Utc> {
    DateTime::from_timestamp(1_714_555_800, 0).expect("valid timestamp")
}

enum Reply<T> {
    Now(T),
    Later(oneshot::Receiver<T>),
}

/// Wait on a scripted reply. Unscripted or abandoned calls never resolve.
async fn settle<T>(reply: Option<Reply<T>>) -> T {
    match reply {
        Some(Reply::Now(value)) => value,
        Some(Reply::Later(rx)) => match rx.await {
            Ok(value) => value,
            Err(_) => futures::future::pending().await,
        },
        None => futures::future::pending().await,
    }
}

// ── Transport ──────────────────────────────────────────────────────

type HttpResult = Result<String, ClientError>;

#[derive(Default)]
struct Wire {
    get_replies: VecDeque<Reply<HttpResult>>,
    post_replies: VecDeque<Reply<HttpResult>>,
    gets: Vec<(String, bool)>,
    posts: Vec<(String, String)>,
    in_flight: usize,
    max_in_flight: usize,
}

#[derive(Clone, Default)]
pub struct FakeTransport {
    wire: Rc<RefCell<Wire>>,
}

struct InFlight(Rc<RefCell<Wire>>);

impl InFlight {
    fn enter(wire: &Rc<RefCell<Wire>>) -> Self {
        let mut w = wire.borrow_mut();
        w.in_flight += 1;
        w.max_in_flight = w.max_in_flight.max(w.in_flight);
        InFlight(Rc::clone(wire))
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.borrow_mut().in_flight -= 1;
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get(&self, reply: Result<&str, ClientError>) {
        self.wire
            .borrow_mut()
            .get_replies
            .push_back(Reply::Now(reply.map(str::to_string)));
    }

    /// Queue a GET whose response the test delivers later.
    pub fn get_later(&self) -> oneshot::Sender<HttpResult> {
        let (tx, rx) = oneshot::channel();
        self.wire.borrow_mut().get_replies.push_back(Reply::Later(rx));
        tx
    }

    pub fn push_post(&self, reply: Result<&str, ClientError>) {
        self.wire
            .borrow_mut()
            .post_replies
            .push_back(Reply::Now(reply.map(str::to_string)));
    }

    pub fn gets(&self) -> Vec<(String, bool)> {
        self.wire.borrow().gets.clone()
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.wire.borrow().posts.clone()
    }

    /// Highest number of requests that were ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.wire.borrow().max_in_flight
    }
}

impl Transport for FakeTransport {
    async fn get(&self, path: &str, no_cache: bool) -> Result<String, ClientError> {
        let reply = {
            let mut w = self.wire.borrow_mut();
            w.gets.push((path.to_string(), no_cache));
            w.get_replies.pop_front()
        };
        let _guard = InFlight::enter(&self.wire);
        settle(reply).await
    }

    async fn post_json(&self, path: &str, body: String) -> Result<String, ClientError> {
        let reply = {
            let mut w = self.wire.borrow_mut();
            w.posts.push((path.to_string(), body));
            w.post_replies.pop_front()
        };
        let _guard = InFlight::enter(&self.wire);
        settle(reply).await
    }
}

// ── Timer ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Sleeps {
    manual: bool,
    slept: Vec<Duration>,
    parked: Vec<oneshot::Sender<()>>,
}

/// Records every requested delay. Immediate timers resolve at once; manual
/// ones wait for `fire_all`.
#[derive(Clone, Default)]
pub struct RecordingTimer {
    sleeps: Rc<RefCell<Sleeps>>,
}

impl RecordingTimer {
    pub fn immediate() -> Self {
        Self::default()
    }

    pub fn manual() -> Self {
        let timer = Self::default();
        timer.sleeps.borrow_mut().manual = true;
        timer
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.sleeps.borrow().slept.clone()
    }

    /// Expire every pending delay.
    pub fn fire_all(&self) {
        let parked = std::mem::take(&mut self.sleeps.borrow_mut().parked);
        for tx in parked {
            let _ = tx.send(());
        }
    }
}

impl Timer for RecordingTimer {
    async fn sleep(&self, duration: Duration) {
        let wait = {
            let mut s = self.sleeps.borrow_mut();
            s.slept.push(duration);
            if s.manual {
                let (tx, rx) = oneshot::channel();
                s.parked.push(tx);
                Some(rx)
            } else {
                None
            }
        };
        if let Some(rx) = wait {
            let _ = rx.await;
        }
    }
}

// ── Clock ──────────────────────────────────────────────────────────

/// Starts at `first_instant` and moves one second forward per reading.
#[derive(Clone)]
pub struct StepClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl Default for StepClock {
    fn default() -> Self {
        Self {
            now: Rc::new(Cell::new(first_instant())),
        }
    }
}

impl StepClock {
    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let at = self.now.get();
        self.now.set(at + chrono::Duration::seconds(1));
        at
    }
}

// ── Image slot ─────────────────────────────────────────────────────

#[derive(Default)]
struct Slot {
    events: Vec<String>,
    revealed: Vec<String>,
    loads: VecDeque<Reply<Result<(), ClientError>>>,
    shown: bool,
}

#[derive(Clone, Default)]
pub struct FakeImages {
    slot: Rc<RefCell<Slot>>,
}

impl FakeImages {
    pub fn events(&self) -> Vec<String> {
        self.slot.borrow().events.clone()
    }

    pub fn revealed(&self) -> Vec<String> {
        self.slot.borrow().revealed.clone()
    }

    /// Script the next image load. Unscripted loads succeed.
    pub fn push_load(&self, result: Result<(), ClientError>) {
        self.slot.borrow_mut().loads.push_back(Reply::Now(result));
    }

    pub fn load_later(&self) -> oneshot::Sender<Result<(), ClientError>> {
        let (tx, rx) = oneshot::channel();
        self.slot.borrow_mut().loads.push_back(Reply::Later(rx));
        tx
    }

    /// Pretend an earlier render already shows an image.
    pub fn set_shown(&self, shown: bool) {
        self.slot.borrow_mut().shown = shown;
    }

    fn log(&self, event: String) {
        self.slot.borrow_mut().events.push(event);
    }
}

impl ImageView for FakeImages {
    fn show_loading(&self) {
        self.log("show_loading".into());
    }

    fn hide_loading(&self) {
        self.log("hide_loading".into());
    }

    fn set_loading_text(&self, text: &str) {
        self.log(format!("text:{}", text));
    }

    async fn load_image(&self, url: &str) -> Result<(), ClientError> {
        self.log(format!("load:{}", url));
        let scripted = self.slot.borrow_mut().loads.pop_front();
        match scripted {
            None => Ok(()),
            reply => settle(reply).await,
        }
    }

    fn reveal(&self, url: &str, fade: Duration) {
        self.log(format!("reveal:{}:{}", url, fade.as_millis()));
        let mut slot = self.slot.borrow_mut();
        slot.revealed.push(url.to_string());
        slot.shown = true;
    }

    fn has_revealed_image(&self) -> bool {
        self.slot.borrow().shown
    }

    fn hide_container(&self) {
        self.log("hide_container".into());
    }
}

// ── Page ───────────────────────────────────────────────────────────

#[derive(Default)]
struct Surface {
    notes: Vec<String>,
    prompts: Vec<String>,
    answers: VecDeque<Reply<bool>>,
    opened: Vec<Dialog>,
    closed: Vec<Dialog>,
    refreshed: Vec<String>,
    reloads: usize,
}

#[derive(Clone, Default)]
pub struct FakePage {
    surface: Rc<RefCell<Surface>>,
}

impl FakePage {
    pub fn notes(&self) -> Vec<String> {
        self.surface.borrow().notes.clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.surface.borrow().prompts.clone()
    }

    /// Script the answer to the next confirmation. Unscripted prompts decline.
    pub fn answer(&self, yes: bool) {
        self.surface.borrow_mut().answers.push_back(Reply::Now(yes));
    }

    pub fn answer_later(&self) -> oneshot::Sender<bool> {
        let (tx, rx) = oneshot::channel();
        self.surface.borrow_mut().answers.push_back(Reply::Later(rx));
        tx
    }

    pub fn opened(&self) -> Vec<Dialog> {
        self.surface.borrow().opened.clone()
    }

    pub fn closed(&self) -> Vec<Dialog> {
        self.surface.borrow().closed.clone()
    }

    pub fn refreshed(&self) -> Vec<String> {
        self.surface.borrow().refreshed.clone()
    }

    pub fn reloads(&self) -> usize {
        self.surface.borrow().reloads
    }
}

impl PageUi for FakePage {
    fn notify(&self, message: &str) {
        self.surface.borrow_mut().notes.push(message.to_string());
    }

    async fn confirm(&self, message: &str) -> bool {
        let answer = {
            let mut s = self.surface.borrow_mut();
            s.prompts.push(message.to_string());
            s.answers.pop_front()
        };
        match answer {
            None => false,
            reply => settle(reply).await,
        }
    }

    fn open_dialog(&self, dialog: Dialog) {
        self.surface.borrow_mut().opened.push(dialog);
    }

    fn close_dialog(&self, dialog: Dialog) {
        self.surface.borrow_mut().closed.push(dialog);
    }

    fn refresh_save_list(&self, html: &str) {
        self.surface.borrow_mut().refreshed.push(html.to_string());
    }

    fn reload(&self) {
        self.surface.borrow_mut().reloads += 1;
    }
}

// ── Rig ────────────────────────────────────────────────────────────

pub struct TestPlatform;

impl Platform for TestPlatform {
    type Transport = FakeTransport;
    type Storage = MemoryStorage;
    type Timer = RecordingTimer;
    type Clock = StepClock;
    type Images = FakeImages;
    type Page = FakePage;
    type Spawner = LocalSpawner;
}

/// One set of fakes plus the executor that drives spawned work.
pub struct TestRig {
    pub transport: FakeTransport,
    pub storage: MemoryStorage,
    pub timer: RecordingTimer,
    pub clock: StepClock,
    pub images: FakeImages,
    pub page: FakePage,
    pub pool: LocalPool,
}

impl TestRig {
    pub fn new() -> Self {
        Self::with_timer(RecordingTimer::immediate())
    }

    /// Rig whose delays only expire on `timer.fire_all()`.
    pub fn manual_timer() -> Self {
        Self::with_timer(RecordingTimer::manual())
    }

    fn with_timer(timer: RecordingTimer) -> Self {
        Self {
            transport: FakeTransport::new(),
            storage: MemoryStorage::new(),
            timer,
            clock: StepClock::default(),
            images: FakeImages::default(),
            page: FakePage::default(),
            pool: LocalPool::new(),
        }
    }

    fn api(&self) -> Rc<ApiClient<FakeTransport>> {
        Rc::new(ApiClient::new(self.transport.clone(), Endpoints::default()))
    }

    pub fn poller(&self) -> Poller<TestPlatform> {
        self.poller_with(PollPolicy::default())
    }

    pub fn poller_with(&self, policy: PollPolicy) -> Poller<TestPlatform> {
        Poller::new(
            self.api(),
            Rc::new(self.images.clone()),
            self.timer.clone(),
            Rc::new(Localization::default()),
            policy,
        )
    }

    pub fn save_store(&self) -> SaveStore<TestPlatform> {
        SaveStore::new(
            self.api(),
            self.storage.clone(),
            Rc::new(self.page.clone()),
            self.clock.clone(),
            Rc::new(Localization::default()),
            ClientConfig::default().storage_key,
        )
    }

    pub fn parts(&self) -> Parts<TestPlatform> {
        Parts {
            transport: self.transport.clone(),
            storage: self.storage.clone(),
            timer: self.timer.clone(),
            clock: self.clock.clone(),
            images: self.images.clone(),
            page: self.page.clone(),
            spawner: self.pool.spawner(),
        }
    }

    pub fn session(&self, input: BootstrapInput) -> Rc<Session<TestPlatform>> {
        Session::bootstrap(self.parts(), ClientConfig::default(), input)
    }

    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.pool
            .spawner()
            .spawn_local(task)
            .expect("local pool accepts tasks");
    }
}
