// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Embedded Storage
//!
//! Persistent state lives in a single redb database (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `refresh_tokens`: user_id → serialized RefreshCredential
//! - `refresh_token_index`: token value → user_id
//! - `tasks`: task_id → serialized Task
//! - `users`: user_id → serialized User
//! - `user_emails`: normalized email → user_id
//!
//! redb admits one write transaction at a time, so every multi-row change
//! made inside a single `begin_write` / `commit` is atomic with respect to
//! concurrent requests.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};

pub mod ownership;
pub mod refresh_tokens;
pub mod tasks;
pub mod users;

pub use ownership::{BulkDeleteScope, OwnedResource, OwnershipError, ResourceAuthorizer};
pub use refresh_tokens::{RefreshCredential, RefreshCredentialStore};
pub use tasks::TaskRepository;
pub use users::{User, UserRepository};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary refresh table: user_id → serialized RefreshCredential (JSON bytes).
pub(crate) const REFRESH_TOKENS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("refresh_tokens");

/// Lookup index: token value → user_id.
pub(crate) const REFRESH_TOKEN_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("refresh_token_index");

/// Task records: task_id → serialized Task (JSON bytes).
pub(crate) const TASKS: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");

/// Accounts: user_id → serialized User (JSON bytes).
pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique email index: normalized email → user_id.
pub(crate) const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "taskboard.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Denied(#[from] OwnershipError),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store
// =============================================================================

/// Shared handle to the embedded database.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(REFRESH_TOKENS)?;
            let _ = write_txn.open_table(REFRESH_TOKEN_INDEX)?;
            let _ = write_txn.open_table(TASKS)?;
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Opened database");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open `DATABASE_FILE` inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    pub fn refresh_tokens(&self) -> RefreshCredentialStore<'_> {
        RefreshCredentialStore::new(self)
    }

    pub fn tasks(&self) -> TaskRepository<'_> {
        TaskRepository::new(self)
    }

    pub fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) fn temp_store() -> (Store, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open_in(dir.path()).unwrap();
    (store, dir)
}
