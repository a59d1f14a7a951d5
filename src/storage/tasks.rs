// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task repository.
//!
//! Only the record operations the authorization layer needs: fetch, list,
//! create, patch, delete and scoped bulk delete. Ownership rules come in from
//! the caller, either as a check run on the current row inside the write
//! transaction or as the [`BulkDeleteScope`] for bulk deletion.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};

use super::{BulkDeleteScope, OwnedResource, OwnershipError, Store, StoreError, StoreResult, TASKS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Task stored in the `tasks` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub workspace_id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Set once at creation
    pub author_id: String,
    pub assignee_id: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for Task {
    fn resource_kind(&self) -> &'static str {
        "task"
    }

    fn author_id(&self) -> &str {
        &self.author_id
    }

    fn assignee_id(&self) -> Option<&str> {
        self.assignee_id.as_deref()
    }

    fn parent_id(&self) -> &str {
        &self.project_id
    }
}

/// What an update does to the assignee.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AssigneeChange {
    #[default]
    Unchanged,
    /// Unassign
    Clear,
    /// Reassign to this user
    Assign(String),
}

impl From<Option<Option<String>>> for AssigneeChange {
    fn from(value: Option<Option<String>>) -> Self {
        match value {
            None => AssigneeChange::Unchanged,
            Some(None) => AssigneeChange::Clear,
            Some(Some(user_id)) => AssigneeChange::Assign(user_id),
        }
    }
}

/// Field changes applied by [`TaskRepository::update`].
///
/// There is deliberately no author or project field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee: AssigneeChange,
}

impl TaskPatch {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        match &self.assignee {
            AssigneeChange::Unchanged => {}
            AssigneeChange::Clear => task.assignee_id = None,
            AssigneeChange::Assign(user_id) => task.assignee_id = Some(user_id.clone()),
        }
        task.updated_at = Utc::now();
    }
}

/// Repository for task records.
pub struct TaskRepository<'a> {
    store: &'a Store,
}

impl<'a> TaskRepository<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Get a task by ID.
    pub fn get(&self, task_id: &str) -> StoreResult<Task> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(TASKS)?;
        match table.get(task_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(task_not_found(task_id)),
        }
    }

    /// All tasks in a project, newest first.
    pub fn list_by_project(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        let read_txn = self.store.db().begin_read()?;
        let table = read_txn.open_table(TASKS)?;

        let mut tasks = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let task: Task = serde_json::from_slice(value.value())?;
            if task.project_id == project_id {
                tasks.push(task);
            }
        }

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    /// Insert a new task.
    pub fn create(&self, task: &Task) -> StoreResult<()> {
        let json = serde_json::to_vec(task)?;
        let write_txn = self.store.db().begin_write()?;
        {
            let mut table = write_txn.open_table(TASKS)?;
            table.insert(task.id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Apply `patch` to an existing task and return the result.
    ///
    /// `check` sees the row as it is inside the write transaction; a denial
    /// leaves the task untouched.
    pub fn update<F>(&self, task_id: &str, patch: &TaskPatch, check: F) -> StoreResult<Task>
    where
        F: FnOnce(&Task) -> Result<(), OwnershipError>,
    {
        let write_txn = self.store.db().begin_write()?;
        let task = {
            let mut table = write_txn.open_table(TASKS)?;

            // Read existing value and deserialize before mutating
            let existing_bytes = {
                let existing = table.get(task_id)?.ok_or_else(|| task_not_found(task_id))?;
                existing.value().to_vec()
            };

            let mut task: Task = serde_json::from_slice(&existing_bytes)?;
            check(&task)?;
            patch.apply(&mut task);

            let json = serde_json::to_vec(&task)?;
            table.insert(task_id, json.as_slice())?;
            task
        };
        write_txn.commit()?;
        Ok(task)
    }

    /// Delete a task by ID once `check` accepts the current row.
    pub fn delete<F>(&self, task_id: &str, check: F) -> StoreResult<Task>
    where
        F: FnOnce(&Task) -> Result<(), OwnershipError>,
    {
        let write_txn = self.store.db().begin_write()?;
        let task = {
            let mut table = write_txn.open_table(TASKS)?;
            let existing: Option<Task> = table
                .get(task_id)?
                .map(|v| serde_json::from_slice(v.value()))
                .transpose()?;

            let task = existing.ok_or_else(|| task_not_found(task_id))?;
            check(&task)?;
            table.remove(task_id)?;
            task
        };
        write_txn.commit()?;
        Ok(task)
    }

    /// Delete every listed task that `scope` matches, in one transaction.
    ///
    /// Ids that do not exist or fall outside the scope are skipped. Returns
    /// the number of rows removed.
    pub fn delete_many(&self, task_ids: &[String], scope: &BulkDeleteScope) -> StoreResult<u64> {
        let write_txn = self.store.db().begin_write()?;
        let deleted = {
            let mut table = write_txn.open_table(TASKS)?;
            let mut seen = HashSet::new();
            let mut deleted = 0u64;

            for task_id in task_ids {
                if !seen.insert(task_id.as_str()) {
                    continue;
                }

                let task: Option<Task> = table
                    .get(task_id.as_str())?
                    .map(|v| serde_json::from_slice(v.value()))
                    .transpose()?;

                if task.is_some_and(|task| scope.matches(&task)) {
                    table.remove(task_id.as_str())?;
                    deleted += 1;
                }
            }
            deleted
        };
        write_txn.commit()?;
        Ok(deleted)
    }
}

fn task_not_found(task_id: &str) -> StoreError {
    StoreError::NotFound(format!("Task with ID {task_id} not found"))
}

#[cfg(test)]
pub(crate) fn sample_task(id: &str, project_id: &str, author_id: &str, assignee_id: Option<&str>) -> Task {
    let now = Utc::now();
    Task {
        id: id.to_string(),
        workspace_id: "ws-1".to_string(),
        project_id: project_id.to_string(),
        title: format!("Task {id}"),
        description: None,
        status: TaskStatus::Todo,
        priority: TaskPriority::Medium,
        author_id: author_id.to_string(),
        assignee_id: assignee_id.map(str::to_string),
        due_date: None,
        created_at: now,
        updated_at: now,
    }
}
