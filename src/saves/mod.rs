//! Local save store: named snapshots of server session state kept in
//! browser storage, without any server-side account system.

pub mod record;
pub mod storage;
pub mod store;
pub mod view;

pub use record::{SaveCollection, SaveRecord};
pub use storage::MemoryStorage;
pub use store::{DeleteOutcome, LoadOutcome, SaveStore};
