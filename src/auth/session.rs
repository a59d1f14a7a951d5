// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, refresh and logout flows.
//!
//! These run apart from per-request authorization: they combine the
//! [`CredentialIssuer`] with the [`RefreshCredentialStore`] so that each
//! identity holds exactly one live refresh value.
//!
//! [`RefreshCredentialStore`]: crate::storage::RefreshCredentialStore

use super::password::verify_password;
use super::{AuthError, Claims, CredentialIssuer, IssuedCredentials};
use crate::storage::{Store, StoreError};

/// Session operations bound to an issuer and a store.
pub struct Sessions<'a> {
    issuer: &'a CredentialIssuer,
    store: &'a Store,
}

impl<'a> Sessions<'a> {
    pub fn new(issuer: &'a CredentialIssuer, store: &'a Store) -> Self {
        Self { issuer, store }
    }

    /// Issue a fresh pair for an identity whose password was already checked.
    ///
    /// Any refresh value the identity held before stops working.
    pub fn start(&self, claims: &Claims) -> Result<IssuedCredentials, AuthError> {
        let issued = self.issuer.issue(claims)?;
        self.store
            .refresh_tokens()
            .save(&issued.refresh_token, &claims.sub)
            .map_err(internal)?;

        tracing::info!(user_id = %claims.sub, "Session started");
        Ok(issued)
    }

    /// Check an email/password pair and start a session for the account.
    ///
    /// Unknown emails and wrong passwords fail the same way.
    pub fn login(&self, email: &str, password: &str) -> Result<IssuedCredentials, AuthError> {
        let user = self.store.users().find_by_email(email).map_err(|e| match e {
            StoreError::NotFound(_) => AuthError::InvalidCredentials,
            other => internal(other),
        })?;

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        self.start(&user.claims())
    }

    /// Exchange a refresh token for a new pair, rotating the stored value.
    pub fn refresh(&self, refresh_token: &str) -> Result<IssuedCredentials, AuthError> {
        let claims = self.issuer.verify_refresh(refresh_token)?;

        let credential = self
            .store
            .refresh_tokens()
            .find_by_value(refresh_token)
            .map_err(|e| match e {
                StoreError::NotFound(_) => AuthError::RefreshTokenNotFound,
                other => internal(other),
            })?;

        if credential.user_id != claims.sub {
            tracing::warn!(user_id = %claims.sub, "Refresh token stored under another identity");
            return Err(AuthError::RefreshTokenNotFound);
        }
        if credential.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        let issued = self.issuer.issue(&claims)?;
        self.store
            .refresh_tokens()
            .save(&issued.refresh_token, &claims.sub)
            .map_err(internal)?;

        tracing::info!(user_id = %claims.sub, "Session refreshed");
        Ok(issued)
    }

    /// Drop the stored refresh value. Unknown values are ignored.
    pub fn end(&self, refresh_token: &str) -> Result<u64, AuthError> {
        let removed = self
            .store
            .refresh_tokens()
            .delete_by_value(refresh_token)
            .map_err(internal)?;

        tracing::info!(removed, "Session ended");
        Ok(removed)
    }

    /// Drop whatever refresh value `user_id` holds, on any device.
    pub fn end_all(&self, user_id: &str) -> Result<u64, AuthError> {
        let removed = self
            .store
            .refresh_tokens()
            .delete_for_user(user_id)
            .map_err(internal)?;

        tracing::info!(user_id = %user_id, removed, "All sessions ended");
        Ok(removed)
    }
}

fn internal(e: StoreError) -> AuthError {
    tracing::error!(error = %e, "Session storage failed");
    AuthError::InternalError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::auth::password::hash_password;
    use crate::storage::temp_store;
    use crate::storage::users::sample_user;
    use chrono::Duration;

    const SECRET: &[u8] = b"session-test-secret-at-least-32-bytes";

    fn claims(user_id: &str) -> Claims {
        Claims::new(user_id, format!("{user_id}@example.com"), "member_1", Role::Admin)
    }

    #[test]
    fn start_persists_refresh_value() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let issued = sessions.start(&claims("user-a")).unwrap();
        let row = store.refresh_tokens().find_by_value(&issued.refresh_token).unwrap();
        assert_eq!(row.user_id, "user-a");
    }

    #[test]
    fn refresh_rotates_and_invalidates_old_value() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let first = sessions.start(&claims("user-a")).unwrap();
        let second = sessions.refresh(&first.refresh_token).unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(
            issuer.verify_access(&second.access_token).unwrap(),
            claims("user-a")
        );
        assert!(matches!(
            sessions.refresh(&first.refresh_token),
            Err(AuthError::RefreshTokenNotFound)
        ));
        assert!(sessions.refresh(&second.refresh_token).is_ok());
    }

    #[test]
    fn new_login_invalidates_other_session() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let laptop = sessions.start(&claims("user-a")).unwrap();
        let phone = sessions.start(&claims("user-a")).unwrap();

        assert!(matches!(
            sessions.refresh(&laptop.refresh_token),
            Err(AuthError::RefreshTokenNotFound)
        ));
        assert!(sessions.refresh(&phone.refresh_token).is_ok());
    }

    #[test]
    fn refresh_rejects_access_token() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let issued = sessions.start(&claims("user-a")).unwrap();
        assert!(matches!(
            sessions.refresh(&issued.access_token),
            Err(AuthError::WrongTokenType)
        ));
    }

    #[test]
    fn refresh_rejects_expired_token() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET).with_refresh_ttl(Duration::hours(-2));
        let sessions = Sessions::new(&issuer, &store);

        let issued = sessions.start(&claims("user-a")).unwrap();
        assert!(matches!(
            sessions.refresh(&issued.refresh_token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn refresh_of_never_stored_token_is_not_found() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let unsaved = issuer.issue(&claims("user-a")).unwrap();
        assert!(matches!(
            sessions.refresh(&unsaved.refresh_token),
            Err(AuthError::RefreshTokenNotFound)
        ));
    }

    #[test]
    fn login_checks_password() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let mut user = sample_user("user-a", "a@example.com", Role::Member);
        user.password_hash = hash_password("password123").unwrap();
        let user = store.users().create(user).unwrap();

        let issued = sessions.login("A@example.com", "password123").unwrap();
        assert_eq!(issuer.verify_access(&issued.access_token).unwrap(), user.claims());
        assert!(store.refresh_tokens().find_by_value(&issued.refresh_token).is_ok());

        assert!(matches!(
            sessions.login("a@example.com", "wrong-password"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            sessions.login("nobody@example.com", "password123"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn end_all_revokes_current_value() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let issued = sessions.start(&claims("user-a")).unwrap();
        assert_eq!(sessions.end_all("user-a").unwrap(), 1);
        assert_eq!(sessions.end_all("user-a").unwrap(), 0);
        assert!(matches!(
            sessions.refresh(&issued.refresh_token),
            Err(AuthError::RefreshTokenNotFound)
        ));
    }

    #[test]
    fn end_is_idempotent() {
        let (store, _dir) = temp_store();
        let issuer = CredentialIssuer::new(SECRET);
        let sessions = Sessions::new(&issuer, &store);

        let issued = sessions.start(&claims("user-a")).unwrap();
        assert_eq!(sessions.end(&issued.refresh_token).unwrap(), 1);
        assert_eq!(sessions.end(&issued.refresh_token).unwrap(), 0);
        assert!(matches!(
            sessions.refresh(&issued.refresh_token),
            Err(AuthError::RefreshTokenNotFound)
        ));
    }
}
