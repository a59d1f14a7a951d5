// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the authenticated principal.

use serde::{Deserialize, Serialize};

use super::roles::Role;

/// Identity payload embedded in every issued credential.
///
/// Serialized as `{sub, email, memberId, role}`; it must survive
/// sign → verify without losing or altering a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    /// Membership the user is acting under
    pub member_id: String,
    /// Role within that membership
    pub role: Role,
}

impl Claims {
    pub fn new(
        sub: impl Into<String>,
        email: impl Into<String>,
        member_id: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            sub: sub.into(),
            email: email.into(),
            member_id: member_id.into(),
            role,
        }
    }
}

/// Which flow a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

/// Full JWT payload: identity claims plus registered claims.
///
/// `jti` is random per token, so two tokens minted for the same identity in
/// the same second still differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    #[serde(flatten)]
    pub claims: Claims,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_use: TokenUse,
}

/// Authenticated caller, derived from verified claims.
///
/// Lives for one request and is passed explicitly to the role gate and the
/// ownership checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub member_id: String,
    pub role: Role,
}

impl Principal {
    /// Total mapping: every claim field is carried over.
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            member_id: claims.member_id,
            role: claims.role,
        }
    }
}

impl From<Claims> for Principal {
    fn from(claims: Claims) -> Self {
        Principal::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> Claims {
        Claims::new("user_123", "smith@example.com", "member_9", Role::Admin)
    }

    #[test]
    fn claims_use_wire_field_names() {
        let value = serde_json::to_value(sample_claims()).unwrap();
        assert_eq!(value["sub"], "user_123");
        assert_eq!(value["email"], "smith@example.com");
        assert_eq!(value["memberId"], "member_9");
        assert_eq!(value["role"], "ADMIN");
    }

    #[test]
    fn envelope_flattens_claims() {
        let envelope = TokenClaims {
            claims: sample_claims(),
            iat: 1_700_000_000,
            exp: 1_700_000_900,
            jti: "jti-1".to_string(),
            token_use: TokenUse::Access,
        };
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["memberId"], "member_9");
        assert_eq!(value["token_use"], "access");

        let back: TokenClaims = serde_json::from_value(value).unwrap();
        assert_eq!(back.claims, sample_claims());
    }

    #[test]
    fn principal_keeps_every_field() {
        let principal = Principal::from_claims(sample_claims());
        assert_eq!(principal.user_id, "user_123");
        assert_eq!(principal.email, "smith@example.com");
        assert_eq!(principal.member_id, "member_9");
        assert_eq!(principal.role, Role::Admin);
    }
}
