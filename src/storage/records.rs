use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;

use super::csv::{self, CsvError};
use super::models::{InvalidRecord, Record, Table};
use crate::object_store::{ObjectStore, ObjectStoreError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] ObjectStoreError),
    #[error("backing object is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),
    #[error("backing object is not a valid phone book: {0}")]
    Parse(#[from] CsvError),
}

/// The phone book table, stored as one CSV object.
///
/// Every operation materializes the table fresh from the backing object;
/// nothing is cached between calls. Mutations are a full read-modify-write
/// with no locking or version check, so concurrent `add_record` calls can
/// lose updates: the last write wins.
///
/// `load`, `save` and `add_record` favor availability: storage failures are
/// logged and replaced by a safe default, so a returned `Ok` from
/// `add_record` does not prove the write reached storage. `export_to_local_path`
/// favors fidelity and propagates every failure.
#[derive(Clone)]
pub struct RecordStore {
    object_store: Arc<dyn ObjectStore>,
    key: String,
}

impl RecordStore {
    pub fn new(object_store: Arc<dyn ObjectStore>, key: impl Into<String>) -> Self {
        Self {
            object_store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the table, or the empty table if it cannot be fetched or parsed.
    pub async fn load(&self) -> Table {
        match self.try_load().await {
            Ok(table) => table,
            Err(LoadError::Fetch(ObjectStoreError::NotFound(_))) => {
                tracing::debug!(key = %self.key, "Phone book object absent, starting empty");
                Table::new()
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to load phone book, using empty table");
                Table::new()
            }
        }
    }

    /// Fetch and parse the backing object, surfacing the failure cause.
    pub async fn try_load(&self) -> Result<Table, LoadError> {
        let data = self.object_store.get(&self.key).await?;
        let text = std::str::from_utf8(&data)?;
        Ok(csv::read_table(text)?)
    }

    /// Overwrite the backing object with `table`. Failures are logged only.
    pub async fn save(&self, table: &Table) {
        if let Err(e) = self.try_save(table).await {
            tracing::error!(key = %self.key, error = %e, "Failed to save phone book");
        }
    }

    pub async fn try_save(&self, table: &Table) -> Result<(), ObjectStoreError> {
        let data = Bytes::from(csv::write_table(table));
        self.object_store.put(&self.key, data).await?;
        tracing::debug!(key = %self.key, records = table.len(), "Saved phone book");
        Ok(())
    }

    /// Append a record. Duplicate names are allowed.
    ///
    /// Only blank fields are reported; storage failures are logged by
    /// `load`/`save` and otherwise invisible to the caller.
    pub async fn add_record(
        &self,
        name: &str,
        phone: &str,
        email: &str,
    ) -> Result<Record, InvalidRecord> {
        let record = Record::new(name, phone, email)?;

        let mut table = self.load().await;
        table.push(record.clone());
        self.save(&table).await;

        tracing::info!(name = %record.name, records = table.len(), "Record added");
        Ok(record)
    }

    /// First record named exactly `name`, in storage order.
    pub async fn retrieve_record(&self, name: &str) -> Option<Record> {
        self.load().await.find(name).cloned()
    }

    /// Copy the backing object's bytes to `path` without parsing them.
    pub async fn export_to_local_path(&self, path: &Path) -> Result<(), ObjectStoreError> {
        self.object_store
            .copy_to_local(&self.key, path)
            .await
            .inspect_err(|e| {
                tracing::warn!(key = %self.key, path = %path.display(), error = %e, "Export failed");
            })?;

        tracing::info!(key = %self.key, path = %path.display(), "Phone book exported");
        Ok(())
    }
}
