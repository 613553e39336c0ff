//! Error types for the database crate

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by the database layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// A write was refused by a `UNIQUE` index
    #[error("unique index `{index}` rejected the write: {detail}")]
    DuplicateKey { index: String, detail: String },

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Surreal(surrealdb::Error),
}

impl StoreError {
    /// Whether this error is a violation of the unique index on `table.field`
    pub fn is_duplicate_key_on(&self, table: &str, field: &str) -> bool {
        matches!(self, StoreError::DuplicateKey { index, .. } if *index == crate::unique_index_name(table, field))
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        match violated_index(&detail) {
            Some(index) => StoreError::DuplicateKey {
                index: index.to_string(),
                detail,
            },
            None => StoreError::Surreal(err),
        }
    }
}

/// Name of the index in a SurrealDB "Database index `x` already contains ..."
/// message. Local and remote engines both report index violations this way.
fn violated_index(message: &str) -> Option<&str> {
    if !message.contains("already contains") {
        return None;
    }
    let start = message.find("index `")? + "index `".len();
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}
