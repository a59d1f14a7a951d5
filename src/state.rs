// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{CredentialIssuer, RequestAuthenticator, Role, RoleGate, Sessions};
use crate::storage::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub issuer: Arc<CredentialIssuer>,
    pub authenticator: RequestAuthenticator,
    pub gate: Arc<RoleGate>,
    /// Role for registered accounts; the very first account is always OWNER.
    pub new_user_role: Role,
}

impl AppState {
    pub fn new(store: Store, issuer: CredentialIssuer) -> Self {
        let issuer = Arc::new(issuer);
        Self {
            store,
            authenticator: RequestAuthenticator::new(issuer.clone()),
            issuer,
            gate: Arc::new(RoleGate::default()),
            new_user_role: Role::Member,
        }
    }

    pub fn with_new_user_role(mut self, role: Role) -> Self {
        self.new_user_role = role;
        self
    }

    pub fn sessions(&self) -> Sessions<'_> {
        Sessions::new(&self.issuer, &self.store)
    }
}

#[cfg(test)]
pub(crate) const TEST_SECRET: &[u8] = b"state-test-secret-at-least-32-bytes!";

/// State over a throwaway database; keep the `TempDir` alive for the test.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    let (store, dir) = crate::storage::temp_store();
    (AppState::new(store, CredentialIssuer::new(TEST_SECRET)), dir)
}
