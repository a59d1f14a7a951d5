// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account repository.
//!
//! Emails are unique after normalization (trimmed, lowercased). Passwords
//! are stored only as Argon2 PHC strings.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};

use super::{Store, StoreError, StoreResult, USERS, USER_EMAILS};
use crate::auth::{Claims, Role};

/// Account stored in the `users` table.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    /// Normalized (see [`normalize_email`])
    pub email: String,
    pub password_hash: String,
    /// Membership the account acts under
    pub member_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Claims embedded in every credential issued to this account.
    pub fn claims(&self) -> Claims {
        Claims::new(&self.id, &self.email, &self.member_id, self.role)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("member_id", &self.member_id)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Repository for accounts.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert a new account and return it as stored.
    ///
    /// The first account ever created becomes `OWNER` regardless of the
    /// requested role. Fails with `Conflict` if the email is taken.
    pub fn create(&self, mut user: User) -> StoreResult<User> {
        let write_txn = self.store.db().begin_write()?;
        {
            let mut users = write_txn.open_table(USERS)?;
            let mut emails = write_txn.open_table(USER_EMAILS)?;

            if emails.get(user.email.as_str())?.is_some() {
                return Err(StoreError::Conflict(
                    "User with this email already exists".to_string(),
                ));
            }
            if users.is_empty()? {
                user.role = Role::Owner;
            }

            let json = serde_json::to_vec(&user)?;
            users.insert(user.id.as_str(), json.as_slice())?;
            emails.insert(user.email.as_str(), user.id.as_str())?;
        }
        write_txn.commit()?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Look an account up by email (normalized before lookup).
    pub fn find_by_email(&self, email: &str) -> StoreResult<User> {
        let email = normalize_email(email);
        let read_txn = self.store.db().begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let users = read_txn.open_table(USERS)?;

        let user_id = emails
            .get(email.as_str())?
            .map(|v| v.value().to_string())
            .ok_or_else(user_not_found)?;

        match users.get(user_id.as_str())? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(user_not_found()),
        }
    }
}

fn user_not_found() -> StoreError {
    StoreError::NotFound("User not found".to_string())
}

#[cfg(test)]
pub(crate) fn sample_user(id: &str, email: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: format!("User {id}"),
        email: normalize_email(email),
        password_hash: "$argon2id$placeholder".to_string(),
        member_id: format!("member-{id}"),
        role,
        created_at: Utc::now(),
    }
}
