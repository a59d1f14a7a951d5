// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side refresh credential store.
//!
//! At most one refresh credential exists per user. Saving a new one for a
//! user replaces the previous row and drops the old value from the lookup
//! index in the same write transaction, so a rotated-away value can never be
//! found again.

use chrono::{DateTime, Duration, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError, StoreResult, REFRESH_TOKENS, REFRESH_TOKEN_INDEX};
use crate::auth::issuer::REFRESH_TOKEN_TTL_DAYS;

/// Persisted refresh credential row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshCredential {
    /// Owning user (unique key)
    pub user_id: String,
    /// Opaque token value
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshCredential {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Repository for refresh credentials.
pub struct RefreshCredentialStore<'a> {
    store: &'a Store,
}

impl<'a> RefreshCredentialStore<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert or replace the credential for `user_id`.
    ///
    /// Expiry is reset to now + 15 days on every call.
    pub fn save(&self, token: &str, user_id: &str) -> StoreResult<RefreshCredential> {
        let credential = RefreshCredential {
            user_id: user_id.to_string(),
            token: token.to_string(),
            expires_at: Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS),
        };
        let json = serde_json::to_vec(&credential)?;

        let write_txn = self.store.db().begin_write()?;
        let replaced = {
            let mut rows = write_txn.open_table(REFRESH_TOKENS)?;
            let mut index = write_txn.open_table(REFRESH_TOKEN_INDEX)?;

            let previous: Option<RefreshCredential> = rows
                .get(user_id)?
                .map(|v| serde_json::from_slice(v.value()))
                .transpose()?;

            if let Some(previous) = &previous {
                index.remove(previous.token.as_str())?;
            }

            // A value indexed under another user would leave that user's row
            // unreachable once the index entry is overwritten.
            let holder = index.get(token)?.map(|v| v.value().to_string());
            if let Some(holder) = holder.filter(|holder| holder != user_id) {
                rows.remove(holder.as_str())?;
                tracing::warn!(user_id = %holder, "Dropped refresh credential with a reused value");
            }

            rows.insert(user_id, json.as_slice())?;
            index.insert(token, user_id)?;
            previous.is_some()
        };
        write_txn.commit()?;

        tracing::debug!(user_id = %user_id, replaced, "Saved refresh credential");
        Ok(credential)
    }

    /// Exact-match lookup on the token value.
    ///
    /// Unknown and rotated-away values both yield `NotFound`.
    pub fn find_by_value(&self, token: &str) -> StoreResult<RefreshCredential> {
        let read_txn = self.store.db().begin_read()?;
        let index = read_txn.open_table(REFRESH_TOKEN_INDEX)?;
        let rows = read_txn.open_table(REFRESH_TOKENS)?;

        let user_id = index
            .get(token)?
            .map(|v| v.value().to_string())
            .ok_or_else(token_not_found)?;

        let credential: RefreshCredential = match rows.get(user_id.as_str())? {
            Some(value) => serde_json::from_slice(value.value())?,
            None => return Err(token_not_found()),
        };

        // Index and row are written together; a mismatch means a stale index entry.
        if credential.token != token {
            return Err(token_not_found());
        }

        Ok(credential)
    }

    /// Remove the credential holding `token`. Returns the number of rows removed.
    ///
    /// Removing an unknown value is not an error.
    pub fn delete_by_value(&self, token: &str) -> StoreResult<u64> {
        let write_txn = self.store.db().begin_write()?;
        let removed = {
            let mut rows = write_txn.open_table(REFRESH_TOKENS)?;
            let mut index = write_txn.open_table(REFRESH_TOKEN_INDEX)?;

            let user_id = index.remove(token)?.map(|v| v.value().to_string());
            match user_id {
                Some(user_id) => {
                    rows.remove(user_id.as_str())?;
                    1
                }
                None => 0,
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Remove whatever credential `user_id` holds (log out everywhere).
    pub fn delete_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let write_txn = self.store.db().begin_write()?;
        let removed = {
            let mut rows = write_txn.open_table(REFRESH_TOKENS)?;
            let mut index = write_txn.open_table(REFRESH_TOKEN_INDEX)?;

            let previous: Option<RefreshCredential> = rows
                .remove(user_id)?
                .map(|v| serde_json::from_slice(v.value()))
                .transpose()?;

            match previous {
                Some(previous) => {
                    index.remove(previous.token.as_str())?;
                    1
                }
                None => 0,
            }
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

fn token_not_found() -> StoreError {
    StoreError::NotFound("Token not found".to_string())
}
