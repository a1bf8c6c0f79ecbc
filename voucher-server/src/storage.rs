//! redb plumbing shared by the catalog, vault and ledger stores
//!
//! Each store owns its own database file and its own tables; this module
//! only provides the open helpers and the common error type. Values are
//! JSON-serialized via serde_json.
//!
//! # Durability
//!
//! redb commits with `Durability::Immediate` by default: a commit is
//! persistent the moment `commit()` returns, and the file is always in a
//! consistent state (copy-on-write with atomic pointer swap). Dropping a
//! write transaction without committing aborts it, which is what gives
//! reserve/transition their all-or-nothing behavior.

use redb::Database;
use std::path::Path;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Open or create a database file at the given path
pub fn open_database(path: impl AsRef<Path>) -> StorageResult<Database> {
    Ok(Database::create(path)?)
}

/// Open an in-memory database (for testing)
#[cfg(test)]
pub fn open_in_memory() -> StorageResult<Database> {
    Ok(Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?)
}
