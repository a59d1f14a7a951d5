// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the REST API. JSON field names are
//! camelCase.
//!
//! ## Model Categories
//!
//! - **Accounts**: register/login bodies and their validation
//! - **Sessions**: refresh/logout bodies
//! - **Tasks**: create/update/bulk-delete bodies and the bulk-delete outcome

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::storage::tasks::{AssigneeChange, TaskPatch, TaskPriority, TaskStatus};

// =============================================================================
// Account Models
// =============================================================================

pub const MIN_PASSWORD_LEN: usize = 6;

/// Request to create an account.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl RegisterRequest {
    /// First failing rule, as a client-facing message.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Name can't be empty");
        }
        if !looks_like_email(&self.email) {
            return Err("Invalid email format");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 6 characters long");
        }
        if self.confirm_password.is_empty() {
            return Err("Please confirm your password");
        }
        if self.confirm_password != self.password {
            return Err("Passwords do not match");
        }
        Ok(())
    }
}

/// Request to log in with an email/password pair.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

// =============================================================================
// Session Models
// =============================================================================

/// Body for refresh and logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

// =============================================================================
// Task Models
// =============================================================================

/// Request to create a task. The author is always the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update of a task.
///
/// `assigneeId` is tri-state: absent leaves the assignee alone, `null`
/// unassigns, a value reassigns. Unknown fields such as `authorId` or
/// `projectId` are dropped during deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub assignee_id: Option<Option<String>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(request: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: request.title,
            description: request.description,
            status: request.status,
            priority: request.priority,
            due_date: request.due_date,
            assignee: AssigneeChange::from(request.assignee_id),
        }
    }
}

/// Maps a present field to `Some(..)` so `null` survives as `Some(None)`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request to delete several tasks of one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTasksRequest {
    pub ids: Vec<String>,
}

/// Message returned when a bulk delete removed nothing.
pub const NOTHING_DELETED_MESSAGE: &str = "No tasks were deleted (you might not be the author)";

/// Result of a bulk delete. Both shapes are successful responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeleteTasksOutcome {
    Deleted { count: u64 },
    NothingDeleted { message: String },
}

impl DeleteTasksOutcome {
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            DeleteTasksOutcome::NothingDeleted {
                message: NOTHING_DELETED_MESSAGE.to_string(),
            }
        } else {
            DeleteTasksOutcome::Deleted { count }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignee_absent_null_and_value() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.assignee_id, None);
        assert_eq!(TaskPatch::from(absent).assignee, AssigneeChange::Unchanged);

        let null: UpdateTaskRequest = serde_json::from_str(r#"{"assigneeId":null}"#).unwrap();
        assert_eq!(null.assignee_id, Some(None));
        assert_eq!(TaskPatch::from(null).assignee, AssigneeChange::Clear);

        let value: UpdateTaskRequest = serde_json::from_str(r#"{"assigneeId":"u2"}"#).unwrap();
        assert_eq!(
            TaskPatch::from(value).assignee,
            AssigneeChange::Assign("u2".to_string())
        );
    }

    #[test]
    fn author_and_project_in_update_payload_are_dropped() {
        let request: UpdateTaskRequest = serde_json::from_str(
            r#"{"authorId":"attacker","projectId":"other","title":"t"}"#,
        )
        .unwrap();
        let patch = TaskPatch::from(request);
        assert_eq!(patch.title.as_deref(), Some("t"));
        assert_eq!(
            patch,
            TaskPatch {
                title: Some("t".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn create_request_defaults() {
        let request: CreateTaskRequest = serde_json::from_str(r#"{"title":"Write docs"}"#).unwrap();
        assert_eq!(request.title, "Write docs");
        assert!(request.status.is_none());
        assert!(request.assignee_id.is_none());
    }

    fn register(name: &str, email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn register_validation_messages() {
        assert_eq!(register("Ann", "ann@example.com", "secret1", "secret1").validate(), Ok(()));
        assert_eq!(
            register(" ", "ann@example.com", "secret1", "secret1").validate(),
            Err("Name can't be empty")
        );
        for email in ["ann", "ann@", "@example.com", "ann@example", "a b@example.com"] {
            assert_eq!(
                register("Ann", email, "secret1", "secret1").validate(),
                Err("Invalid email format"),
                "{email}"
            );
        }
        assert_eq!(
            register("Ann", "ann@example.com", "short", "short").validate(),
            Err("Password must be at least 6 characters long")
        );
        assert_eq!(
            register("Ann", "ann@example.com", "secret1", "").validate(),
            Err("Please confirm your password")
        );
        assert_eq!(
            register("Ann", "ann@example.com", "secret1", "secret2").validate(),
            Err("Passwords do not match")
        );
    }

    #[test]
    fn register_body_is_camel_case() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"name":"Ann","email":"ann@example.com","password":"secret1","confirmPassword":"secret1"}"#,
        )
        .unwrap();
        assert_eq!(request.confirm_password, "secret1");
    }

    #[test]
    fn bulk_outcome_shapes() {
        let deleted = serde_json::to_value(DeleteTasksOutcome::from_count(2)).unwrap();
        assert_eq!(deleted, serde_json::json!({"count": 2}));

        let nothing = DeleteTasksOutcome::from_count(0);
        assert_eq!(
            serde_json::to_value(nothing).unwrap(),
            serde_json::json!({"message": NOTHING_DELETED_MESSAGE})
        );
    }
}
