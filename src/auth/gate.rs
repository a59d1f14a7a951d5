// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-operation role requirements.
//!
//! Requirements live in a plain lookup table ([`RolePolicy`]) keyed by
//! [`Operation`]. Handlers call [`RoleGate::admit`] with the principal they
//! received from the `Auth` extractor before touching any record.
//!
//! An operation with no entry in the table is open to every authenticated
//! principal; its protection comes from ownership filtering alone.

use std::collections::{HashMap, HashSet};

use super::{AuthError, Principal, Role};

/// Protected operations exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateTask,
    ListTasks,
    GetTask,
    UpdateTask,
    DeleteTask,
    DeleteTasks,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateTask => "create_task",
            Operation::ListTasks => "list_tasks",
            Operation::GetTask => "get_task",
            Operation::UpdateTask => "update_task",
            Operation::DeleteTask => "delete_task",
            Operation::DeleteTasks => "delete_tasks",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation → permitted roles.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    requirements: HashMap<Operation, HashSet<Role>>,
}

impl RolePolicy {
    /// Empty policy: every operation is open to any authenticated principal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the roles allowed to run `operation`.
    pub fn require(mut self, operation: Operation, roles: &[Role]) -> Self {
        self.requirements
            .insert(operation, roles.iter().copied().collect());
        self
    }

    /// Permitted roles for `operation`, or `None` if nothing is declared.
    pub fn permitted(&self, operation: Operation) -> Option<&HashSet<Role>> {
        self.requirements.get(&operation)
    }

    /// Requirements for the task endpoints.
    ///
    /// `DeleteTasks` is intentionally absent: bulk deletion filters rows by
    /// author instead.
    pub fn tasks() -> Self {
        Self::new()
            .require(Operation::CreateTask, &[Role::Owner, Role::Admin])
            .require(Operation::ListTasks, &Role::ALL)
            .require(Operation::GetTask, &Role::ALL)
            .require(Operation::UpdateTask, &Role::ALL)
            .require(Operation::DeleteTask, &Role::ALL)
    }
}

/// Checks a principal's role against the policy table.
#[derive(Debug, Clone)]
pub struct RoleGate {
    policy: RolePolicy,
}

impl RoleGate {
    pub fn new(policy: RolePolicy) -> Self {
        Self { policy }
    }

    /// Membership test of `role` in `permitted`; `None` allows everyone.
    pub fn check(role: Role, permitted: Option<&HashSet<Role>>) -> Result<(), AuthError> {
        match permitted {
            Some(roles) if !roles.contains(&role) => Err(AuthError::InsufficientPermissions),
            _ => Ok(()),
        }
    }

    /// Gate `operation` for `principal`.
    pub fn admit(&self, operation: Operation, principal: &Principal) -> Result<(), AuthError> {
        Self::check(principal.role, self.policy.permitted(operation)).inspect_err(|_| {
            tracing::warn!(
                user_id = %principal.user_id,
                role = %principal.role,
                operation = %operation,
                "Role check failed"
            );
        })
    }
}

impl Default for RoleGate {
    fn default() -> Self {
        Self::new(RolePolicy::tasks())
    }
}
