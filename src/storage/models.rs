use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRecord {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

/// One phone book entry. `name` is the lookup key but is not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl Record {
    /// Build a record from user input, trimming surrounding whitespace.
    /// Every field must be non-empty after trimming.
    pub fn new(name: &str, phone: &str, email: &str) -> Result<Self, InvalidRecord> {
        let name = name.trim();
        let phone = phone.trim();
        let email = email.trim();

        for (field, value) in [("name", name), ("phone", phone), ("email", email)] {
            if value.is_empty() {
                return Err(InvalidRecord::EmptyField(field));
            }
        }

        Ok(Self {
            name: name.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
        })
    }
}

/// The full ordered collection of records held by the backing object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the end; storage order is insertion order.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// First record whose name is exactly `name`.
    pub fn find(&self, name: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for Table {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}
