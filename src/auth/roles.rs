// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Membership roles for authorization.

use serde::{Deserialize, Serialize};

/// Role a user holds inside the membership (workspace) they act under.
///
/// Roles are not global: the same user can be `Owner` of one workspace and
/// `Member` of another. The active membership travels in the token claims
/// as `memberId` + `role`.
///
/// Variants are declared in descending order of authority, so the derived
/// `Ord` sorts `Owner` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Created the workspace
    Owner,
    /// Manages projects and tasks
    Admin,
    /// Regular workspace member
    Member,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 3] = [Role::Owner, Role::Admin, Role::Member];

    /// Parse role from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Role> {
        match s.to_uppercase().as_str() {
            "OWNER" => Some(Role::Owner),
            "ADMIN" => Some(Role::Admin),
            "MEMBER" => Some(Role::Member),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
            Role::Member => "MEMBER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
