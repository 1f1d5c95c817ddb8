//! Remedy-Store: durable artifact storage for Remedy
//!
//! ## Layer 0 - Persistence
//!
//! Focus: putting published artifacts (result documents, remediation
//! archives) somewhere durable and handing back a retrieval locator.
//!
//! ## Key Components
//!
//! - `ObjectStore`: bucket/key object storage with time-limited GET locators
//! - `FsObjectStore`: filesystem-backed store for local and CI runs
//! - `fakes::MemoryObjectStore`: in-memory store for tests

mod error;
pub mod fakes;
mod fs;
pub mod object_store;

pub use error::StoreError;
pub use fs::FsObjectStore;
pub use object_store::{validate_location, ObjectStore, StoreResult};
