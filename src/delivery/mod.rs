//! Background export of the phone book to the requesting chat user.

mod slack;

pub use slack::SlackClient;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::object_store::ObjectStoreError;
use crate::storage::RecordStore;

pub const EXPORT_TITLE: &str = "PhoneBook CSV";
pub const EXPORT_FILENAME: &str = "phonebook.csv";
pub const EXPORT_COMMENT: &str = "Here is the PhoneBook CSV file:";

#[derive(Debug, Error)]
pub enum ChannelError {
    /// The chat API answered but refused the call; carries its error code.
    #[error("{0}")]
    Api(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("export not found: {0}")]
    NotFound(String),
    #[error("export file is empty")]
    EmptyFile,
    #[error("delivery channel error: {0}")]
    Channel(#[from] ChannelError),
    #[error("{0}")]
    Other(String),
}

impl From<ObjectStoreError> for DeliveryError {
    fn from(e: ObjectStoreError) -> Self {
        match e {
            ObjectStoreError::NotFound(key) => DeliveryError::NotFound(key),
            ObjectStoreError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                DeliveryError::NotFound(io.to_string())
            }
            other => DeliveryError::Other(other.to_string()),
        }
    }
}

impl DeliveryError {
    /// Text sent back to the requester when delivery fails.
    pub fn user_message(&self) -> String {
        match self {
            DeliveryError::NotFound(_) => {
                "An error occurred: The file could not be found.".to_string()
            }
            DeliveryError::EmptyFile => {
                "An error occurred: The file is empty and could not be uploaded.".to_string()
            }
            DeliveryError::Channel(ChannelError::Api(code)) => {
                format!("An error occurred while processing your request: {code}")
            }
            DeliveryError::Channel(e) => {
                format!("An error occurred while processing your request: {e}")
            }
            DeliveryError::Other(e) => format!("An unexpected error occurred: {e}"),
        }
    }
}

/// A chat service that can receive files and direct messages.
#[async_trait]
pub trait FileChannel: Send + Sync {
    async fn upload_file(
        &self,
        path: &Path,
        title: &str,
        filename: &str,
        initial_comment: &str,
    ) -> Result<(), ChannelError>;

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), ChannelError>;
}

/// Export the phone book to `path`, upload it, and tell `user_id` how it went.
///
/// The outcome is also returned so callers and tests can observe it; the
/// requester has already been notified either way.
pub async fn process_download(
    records: &RecordStore,
    channel: &dyn FileChannel,
    path: &Path,
    user_id: &str,
) -> Result<(), DeliveryError> {
    let result = deliver(records, channel, path, user_id).await;

    if let Err(ref e) = result {
        tracing::error!(user_id = %user_id, error = %e, "Phone book delivery failed");
        if let Err(notify_err) = channel.post_message(user_id, &e.user_message()).await {
            tracing::error!(
                user_id = %user_id,
                error = %notify_err,
                "Failed to notify requester of delivery failure"
            );
        }
    }

    result
}

async fn deliver(
    records: &RecordStore,
    channel: &dyn FileChannel,
    path: &Path,
    user_id: &str,
) -> Result<(), DeliveryError> {
    records.export_to_local_path(path).await?;

    let size = tokio::fs::metadata(path)
        .await
        .map_err(ObjectStoreError::from)?
        .len();
    if size == 0 {
        return Err(DeliveryError::EmptyFile);
    }

    channel
        .upload_file(path, EXPORT_TITLE, EXPORT_FILENAME, EXPORT_COMMENT)
        .await?;
    tracing::info!(user_id = %user_id, bytes = size, "Phone book uploaded");

    channel
        .post_message(
            user_id,
            &format!(
                "The PhoneBook CSV file has been successfully downloaded to {}.",
                path.display()
            ),
        )
        .await?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::testing::RecordingChannel;
    use super::*;
    use crate::object_store::{LocalStore, ObjectStore};

    fn setup(dir: &tempfile::TempDir) -> (Arc<LocalStore>, RecordStore) {
        let store = Arc::new(LocalStore::new(dir.path().join("bucket")).unwrap());
        let records = RecordStore::new(store.clone(), "phonebook.csv");
        (store, records)
    }

    #[tokio::test]
    async fn test_delivers_exported_file() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, records) = setup(&dir);
        records
            .add_record("Alice", "1234567890", "alice@example.com")
            .await
            .unwrap();

        let channel = RecordingChannel::default();
        let path = dir.path().join("Downloads").join("phonebook.csv");
        process_download(&records, &channel, &path, "U123")
            .await
            .unwrap();

        let uploads = channel.uploads.lock().await;
        assert_eq!(uploads.len(), 1);
        assert_eq!(
            uploads[0].1,
            b"Name,Phone,Email\nAlice,1234567890,alice@example.com\n"
        );

        let messages = channel.messages.lock().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "U123");
        assert!(messages[0].1.contains("successfully downloaded"));
    }

    #[tokio::test]
    async fn test_missing_object_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, records) = setup(&dir);
        let channel = RecordingChannel::default();
        let path = dir.path().join("out.csv");

        let result = process_download(&records, &channel, &path, "U123").await;
        assert!(matches!(result, Err(DeliveryError::NotFound(_))));
        assert!(!path.exists());
        assert!(channel.uploads.lock().await.is_empty());

        let messages = channel.messages.lock().await;
        assert_eq!(
            messages.as_slice(),
            &[(
                "U123".to_string(),
                "An error occurred: The file could not be found.".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_empty_object_reports_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, records) = setup(&dir);
        store.put("phonebook.csv", Bytes::new()).await.unwrap();
        let channel = RecordingChannel::default();

        let result =
            process_download(&records, &channel, &dir.path().join("out.csv"), "U1").await;
        assert!(matches!(result, Err(DeliveryError::EmptyFile)));
        assert!(channel.uploads.lock().await.is_empty());
        assert_eq!(
            channel.messages.lock().await[0].1,
            "An error occurred: The file is empty and could not be uploaded."
        );
    }

    #[tokio::test]
    async fn test_channel_error_reports_code() {
        let dir = tempfile::tempdir().unwrap();
        let (_store, records) = setup(&dir);
        records.add_record("Bob", "1", "b@x").await.unwrap();
        let channel = RecordingChannel {
            upload_error: Some("not_authed".to_string()),
            ..Default::default()
        };

        let result =
            process_download(&records, &channel, &dir.path().join("out.csv"), "U1").await;
        assert!(matches!(
            result,
            Err(DeliveryError::Channel(ChannelError::Api(_)))
        ));
        assert_eq!(
            channel.messages.lock().await[0].1,
            "An error occurred while processing your request: not_authed"
        );
    }

    #[test]
    fn test_unexpected_error_message() {
        let e = DeliveryError::from(ObjectStoreError::Backend("timeout".to_string()));
        assert_eq!(e.user_message(), "An unexpected error occurred: Backend error: timeout");
    }
}
