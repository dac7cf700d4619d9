//! Browser bindings for the collaborator traits.

mod dom;
mod fetch;
mod storage;

use chrono::{DateTime, Utc};
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use gloo::timers::future::TimeoutFuture;
use std::time::Duration;

use crate::platform::{Clock, Parts, Platform, Timer};

pub use dom::{DomImages, DomPage};
pub use fetch::FetchTransport;
pub use storage::LocalStorage;

#[derive(Debug, Clone, Copy, Default)]
pub struct GlooTimer;

impl Timer for GlooTimer {
    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Runs tasks on the browser microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

pub struct BrowserPlatform;

impl Platform for BrowserPlatform {
    type Transport = FetchTransport;
    type Storage = LocalStorage;
    type Timer = GlooTimer;
    type Clock = SystemClock;
    type Images = DomImages;
    type Page = DomPage;
    type Spawner = BrowserSpawner;
}

impl BrowserPlatform {
    pub fn parts() -> Parts<Self> {
        Parts {
            transport: FetchTransport,
            storage: LocalStorage::open(),
            timer: GlooTimer,
            clock: SystemClock,
            images: DomImages::default(),
            page: DomPage::default(),
            spawner: BrowserSpawner,
        }
    }
}
