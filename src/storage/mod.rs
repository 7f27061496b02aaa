pub mod csv;
pub mod models;
mod records;

pub use models::{InvalidRecord, Record, Table};
pub use records::{LoadError, RecordStore};
