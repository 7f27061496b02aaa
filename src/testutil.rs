//! Shared test helpers for handler and delivery tests.

use std::sync::Arc;

use crate::config::{Config, SlackConfig, StorageBackend, StorageConfig};
use crate::delivery::testing::RecordingChannel;
use crate::object_store::LocalStore;
use crate::storage::RecordStore;
use crate::AppState;

/// Create a test AppState backed by a local object store in `temp_dir`,
/// returning the recording chat channel alongside it.
pub fn test_state(temp_dir: &tempfile::TempDir) -> (Arc<AppState>, Arc<RecordingChannel>) {
    let files_dir = temp_dir.path().join("files");

    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_storage_path: files_dir.to_string_lossy().to_string(),
            ..Default::default()
        },
        slack: SlackConfig {
            api_token: "xoxb-test".to_string(),
            ..Default::default()
        },
        export_path: temp_dir.path().join("Downloads").join("phonebook.csv"),
    };

    let object_store = LocalStore::new(&files_dir).expect("Failed to create test object store");
    let records = RecordStore::new(Arc::new(object_store), config.storage.object_key.clone());
    let channel = Arc::new(RecordingChannel::default());

    let state = Arc::new(AppState {
        config,
        records,
        channel: Arc::clone(&channel) as Arc<dyn crate::delivery::FileChannel>,
    });

    (state, channel)
}
