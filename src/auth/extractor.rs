// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request authentication and the Axum extractor built on it.
//!
//! Use the `Auth` extractor in handlers to require authentication:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(principal): Auth) -> impl IntoResponse {
//!     // principal is Principal
//! }
//! ```
//!
//! The principal is handed to the handler as a value; nothing is stashed in
//! request extensions or globals.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, CredentialIssuer, Principal};
use crate::state::AppState;

const BEARER_SCHEME: &str = "Bearer";

/// Pull the token out of an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
pub fn bearer_token(raw_header: Option<&str>) -> Result<&str, AuthError> {
    let raw = raw_header.ok_or(AuthError::MissingAuthHeader)?;

    let (scheme, token) = raw
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Turns a raw authorization header into a [`Principal`].
#[derive(Debug, Clone)]
pub struct RequestAuthenticator {
    issuer: Arc<CredentialIssuer>,
}

impl RequestAuthenticator {
    pub fn new(issuer: Arc<CredentialIssuer>) -> Self {
        Self { issuer }
    }

    /// Verify the bearer access token and map its claims to a principal.
    pub fn authenticate(&self, raw_header: Option<&str>) -> Result<Principal, AuthError> {
        let token = bearer_token(raw_header)?;
        let claims = self.issuer.verify_access(token)?;
        Ok(Principal::from_claims(claims))
    }
}

/// Extractor for authenticated principals.
///
/// Rejects with 401 before the handler body runs when the access token is
/// absent, malformed, expired or signed with another secret.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_tasks(
///     Auth(principal): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<Task>>, ApiError> {
///     state.gate.admit(Operation::ListTasks, &principal)?;
///     // ...
/// }
/// ```
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw_header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?),
            None => None,
        };

        let principal = state.authenticator.authenticate(raw_header).inspect_err(|e| {
            tracing::debug!(error_code = e.error_code(), "Request authentication failed");
        })?;

        Ok(Auth(principal))
    }
}
