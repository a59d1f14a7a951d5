// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Task handlers.
//!
//! Each handler runs the same chain: the [`Auth`] extractor authenticates,
//! the role gate admits the operation, the record is fetched inside the path
//! project, and ownership is checked inside the write transaction.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{Auth, Operation, Principal},
    error::ApiError,
    models::{CreateTaskRequest, DeleteTasksOutcome, DeleteTasksRequest, UpdateTaskRequest},
    state::AppState,
    storage::{
        ownership::Mutation,
        tasks::{Task, TaskPatch},
        ResourceAuthorizer, StoreError,
    },
};

type ProjectPath = Path<(String, String)>;
type TaskPath = Path<(String, String, String)>;

fn require_id<'a>(value: &'a str, what: &str) -> Result<&'a str, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::invalid_request(format!("{what} id not provided")));
    }
    Ok(value)
}

/// Fetch a task and hide it unless it lives in the given workspace and project.
fn load_scoped(
    state: &AppState,
    workspace_id: &str,
    project_id: &str,
    task_id: &str,
) -> Result<Task, ApiError> {
    let task = state.store.tasks().get(task_id)?;
    if task.workspace_id != workspace_id || task.project_id != project_id {
        return Err(ApiError::from(StoreError::NotFound(format!(
            "Task with ID {task_id} not found"
        ))));
    }
    Ok(task)
}

fn admit(state: &AppState, operation: Operation, principal: &Principal) -> Result<(), ApiError> {
    state.gate.admit(operation, principal)?;
    Ok(())
}

pub async fn create_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((workspace_id, project_id)): ProjectPath,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    admit(&state, Operation::CreateTask, &principal)?;
    let workspace_id = require_id(&workspace_id, "Workspace")?;
    let project_id = require_id(&project_id, "Project")?;

    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::invalid_request("Task title must not be empty"));
    }

    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4().to_string(),
        workspace_id: workspace_id.to_string(),
        project_id: project_id.to_string(),
        title: title.to_string(),
        description: request.description,
        status: request.status.unwrap_or_default(),
        priority: request.priority.unwrap_or_default(),
        author_id: ResourceAuthorizer::creator_id(&principal).to_string(),
        assignee_id: request.assignee_id,
        due_date: request.due_date,
        created_at: now,
        updated_at: now,
    };
    ResourceAuthorizer::authorize(&principal, Mutation::Create, &task)?;

    state.store.tasks().create(&task)?;
    tracing::info!(
        task_id = %task.id,
        project_id = %task.project_id,
        user_id = %principal.user_id,
        "Task created"
    );

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((workspace_id, project_id)): ProjectPath,
) -> Result<Json<Vec<Task>>, ApiError> {
    admit(&state, Operation::ListTasks, &principal)?;
    let workspace_id = require_id(&workspace_id, "Workspace")?;
    let project_id = require_id(&project_id, "Project")?;

    let tasks = state
        .store
        .tasks()
        .list_by_project(project_id)?
        .into_iter()
        .filter(|task| task.workspace_id == workspace_id)
        .collect();
    Ok(Json(tasks))
}

pub async fn get_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((workspace_id, project_id, task_id)): TaskPath,
) -> Result<Json<Task>, ApiError> {
    admit(&state, Operation::GetTask, &principal)?;
    let workspace_id = require_id(&workspace_id, "Workspace")?;
    let project_id = require_id(&project_id, "Project")?;
    let task_id = require_id(&task_id, "Task")?;

    let task = load_scoped(&state, workspace_id, project_id, task_id)?;
    ResourceAuthorizer::authorize(&principal, Mutation::Read, &task)?;
    Ok(Json(task))
}

pub async fn update_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((workspace_id, project_id, task_id)): TaskPath,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    admit(&state, Operation::UpdateTask, &principal)?;
    let workspace_id = require_id(&workspace_id, "Workspace")?;
    let project_id = require_id(&project_id, "Project")?;
    let task_id = require_id(&task_id, "Task")?;

    load_scoped(&state, workspace_id, project_id, task_id)?;

    let patch = TaskPatch::from(request);
    let updated = state.store.tasks().update(task_id, &patch, |current| {
        ResourceAuthorizer::authorize(&principal, Mutation::Update, current)
    })?;
    tracing::info!(task_id = %task_id, user_id = %principal.user_id, "Task updated");

    Ok(Json(updated))
}

pub async fn delete_task(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((workspace_id, project_id, task_id)): TaskPath,
) -> Result<StatusCode, ApiError> {
    admit(&state, Operation::DeleteTask, &principal)?;
    let workspace_id = require_id(&workspace_id, "Workspace")?;
    let project_id = require_id(&project_id, "Project")?;
    let task_id = require_id(&task_id, "Task")?;

    load_scoped(&state, workspace_id, project_id, task_id)?;

    state.store.tasks().delete(task_id, |current| {
        ResourceAuthorizer::authorize(&principal, Mutation::Delete, current)
    })?;
    tracing::info!(task_id = %task_id, user_id = %principal.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Delete several tasks; rows the caller did not author are skipped.
pub async fn delete_tasks(
    Auth(principal): Auth,
    State(state): State<AppState>,
    Path((workspace_id, project_id)): ProjectPath,
    Json(request): Json<DeleteTasksRequest>,
) -> Result<Json<DeleteTasksOutcome>, ApiError> {
    admit(&state, Operation::DeleteTasks, &principal)?;
    require_id(&workspace_id, "Workspace")?;
    let project_id = require_id(&project_id, "Project")?;
    if request.ids.is_empty() {
        return Err(ApiError::invalid_request("Task ids not provided"));
    }

    let scope = ResourceAuthorizer::bulk_delete_scope(&principal, project_id);
    let count = state.store.tasks().delete_many(&request.ids, &scope)?;
    tracing::info!(
        requested = request.ids.len(),
        deleted = count,
        user_id = %principal.user_id,
        "Bulk task delete"
    );

    Ok(Json(DeleteTasksOutcome::from_count(count)))
}
