// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential issuance and verification (HS256 JWT).
//!
//! One process-wide secret signs both token kinds:
//!
//! | Token | Lifetime | Used for |
//! |-------|----------|----------|
//! | access | minutes (configurable) | `Authorization: Bearer` on every request |
//! | refresh | 15 days | exchanging for a new pair, persisted server-side |

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use super::claims::{Claims, TokenClaims, TokenUse};
use super::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Default access token lifetime.
pub const DEFAULT_ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Refresh token lifetime. Matches the expiry written to the refresh store.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 15;

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredentials {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Mints and verifies signed credentials.
///
/// Holds no per-request state; share it behind an `Arc`.
#[derive(Clone)]
pub struct CredentialIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    /// Create an issuer with default lifetimes.
    ///
    /// Secret validation happens in [`crate::config::Config::from_env`].
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
            refresh_ttl: Duration::days(REFRESH_TOKEN_TTL_DAYS),
        }
    }

    /// Override the access token lifetime.
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Override the refresh token lifetime.
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Mint an access and a refresh token carrying the same claims.
    ///
    /// Persisting the refresh value is the caller's job.
    pub fn issue(&self, claims: &Claims) -> Result<IssuedCredentials, AuthError> {
        let now = Utc::now();
        let access_expires_at = now + self.access_ttl;
        let refresh_expires_at = now + self.refresh_ttl;

        let access_token = self.sign(claims, TokenUse::Access, now, access_expires_at)?;
        let refresh_token = self.sign(claims, TokenUse::Refresh, now, refresh_expires_at)?;

        Ok(IssuedCredentials {
            access_token,
            refresh_token,
            access_expires_at,
            refresh_expires_at,
        })
    }

    /// Verify an access token and return its claims.
    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenUse::Access)
    }

    /// Verify a refresh token and return its claims.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenUse::Refresh)
    }

    fn sign(
        &self,
        claims: &Claims,
        token_use: TokenUse,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let payload = TokenClaims {
            claims: claims.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_use,
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign credential");
            AuthError::InternalError(e.to_string())
        })
    }

    fn verify(&self, token: &str, expected: TokenUse) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.validate_aud = false;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
                _ => AuthError::MalformedToken,
            })?;

        if token_data.claims.token_use != expected {
            return Err(AuthError::WrongTokenType);
        }

        Ok(token_data.claims.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    const SECRET: &[u8] = b"test-secret-that-is-at-least-32-bytes!";

    fn sample_claims() -> Claims {
        Claims::new("user_123", "smith@example.com", "member_9", Role::Owner)
    }

    #[test]
    fn access_token_round_trips_claims() {
        let issuer = CredentialIssuer::new(SECRET);
        let claims = sample_claims();
        let issued = issuer.issue(&claims).unwrap();

        assert_eq!(issuer.verify_access(&issued.access_token).unwrap(), claims);
        assert_eq!(issuer.verify_refresh(&issued.refresh_token).unwrap(), claims);
    }

    #[test]
    fn lifetimes_follow_configuration() {
        let issuer = CredentialIssuer::new(SECRET).with_access_ttl(Duration::minutes(5));
        let issued = issuer.issue(&sample_claims()).unwrap();

        let access_span = issued.access_expires_at - Utc::now();
        assert!(access_span <= Duration::minutes(5));
        assert!(access_span > Duration::minutes(4));

        let refresh_span = issued.refresh_expires_at - Utc::now();
        assert!(refresh_span > Duration::days(14));
    }

    #[test]
    fn every_issue_produces_distinct_values() {
        let issuer = CredentialIssuer::new(SECRET);
        let first = issuer.issue(&sample_claims()).unwrap();
        let second = issuer.issue(&sample_claims()).unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let issuer = CredentialIssuer::new(SECRET).with_access_ttl(Duration::hours(-2));
        let issued = issuer.issue(&sample_claims()).unwrap();

        let result = issuer.verify_access(&issued.access_token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = CredentialIssuer::new(SECRET);
        let other = CredentialIssuer::new(b"another-secret-that-is-32-bytes-long!!");
        let issued = other.issue(&sample_claims()).unwrap();

        let result = issuer.verify_access(&issued.access_token);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let issuer = CredentialIssuer::new(SECRET);
        let mut claims = sample_claims();
        claims.role = Role::Member;
        let issued = issuer.issue(&claims).unwrap();

        // Promote the role inside the payload, keep the original signature.
        let parts: Vec<&str> = issued.access_token.split('.').collect();
        let payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        value["role"] = serde_json::json!("OWNER");
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&value).unwrap());
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        let result = issuer.verify_access(&forged);
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let issuer = CredentialIssuer::new(SECRET);
        let issued = issuer.issue(&sample_claims()).unwrap();

        let result = issuer.verify_access(&issued.refresh_token);
        assert!(matches!(result, Err(AuthError::WrongTokenType)));

        let result = issuer.verify_refresh(&issued.access_token);
        assert!(matches!(result, Err(AuthError::WrongTokenType)));
    }

    #[test]
    fn garbage_is_malformed() {
        let issuer = CredentialIssuer::new(SECRET);
        let result = issuer.verify_access("not-a-jwt");
        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[test]
    fn debug_does_not_print_keys() {
        let issuer = CredentialIssuer::new(SECRET);
        let rendered = format!("{issuer:?}");
        assert!(!rendered.contains("test-secret"));
    }
}
