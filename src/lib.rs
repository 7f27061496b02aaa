//! phone-book - A Slack slash-command phone book stored as one CSV object
//!
//! This crate provides:
//! - A record store that treats a single object-storage file as a table
//! - Swappable object storage backends (S3-compatible, local filesystem)
//! - Slack command handling (`/add`, `/get`, `/download`) over HTTP
//! - Background export and delivery of the CSV through Slack

pub mod api;
pub mod config;
pub mod delivery;
pub mod object_store;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use delivery::FileChannel;
use storage::RecordStore;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub records: RecordStore,
    pub channel: Arc<dyn FileChannel>,
}
