// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token authentication and role gating for the task API.
//!
//! ## Auth Flow
//!
//! 1. Login checks the Argon2 password hash and calls [`Sessions::start`]
//!    with the account's claims
//! 2. Client sends `Authorization: Bearer <access token>`
//! 3. Server:
//!    - Verifies HS256 signature and expiry against the process secret
//!    - Maps claims (`sub`, `email`, `memberId`, `role`) to a [`Principal`]
//!    - Checks the principal's role against the operation's [`RolePolicy`]
//! 4. Ownership checks run afterwards in [`crate::storage::ownership`]
//!
//! ## Security
//!
//! - All task endpoints require authentication
//! - Access and refresh tokens are not interchangeable
//! - One live refresh token per identity; refreshing rotates it
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod issuer;
pub mod password;
pub mod roles;
pub mod session;

pub use claims::{Claims, Principal, TokenUse};
pub use error::AuthError;
pub use extractor::{Auth, RequestAuthenticator};
pub use gate::{Operation, RoleGate, RolePolicy};
pub use issuer::{CredentialIssuer, IssuedCredentials};
pub use roles::Role;
pub use session::Sessions;
