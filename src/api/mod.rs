// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod auth;
pub mod health;
pub mod tasks;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout-all", post(auth::logout_all))
        .route(
            "/workspaces/{workspace_id}/projects/{project_id}/tasks",
            get(tasks::list_tasks)
                .post(tasks::create_task)
                .delete(tasks::delete_tasks),
        )
        .route(
            "/workspaces/{workspace_id}/projects/{project_id}/tasks/{task_id}",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        );

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
