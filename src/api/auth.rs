// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::{password::hash_password, Auth, IssuedCredentials},
    error::ApiError,
    models::{LoginRequest, RefreshTokenRequest, RegisterRequest},
    state::AppState,
    storage::users::{normalize_email, User},
};

/// Create an account and start its first session.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<IssuedCredentials>), ApiError> {
    request.validate().map_err(ApiError::invalid_request)?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: request.name.trim().to_string(),
        email: normalize_email(&request.email),
        password_hash: hash_password(&request.password)?,
        member_id: Uuid::new_v4().to_string(),
        role: state.new_user_role,
        created_at: Utc::now(),
    };
    let user = state.store.users().create(user)?;

    let issued = state.sessions().start(&user.claims())?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Exchange an email/password pair for a credential pair.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<IssuedCredentials>, ApiError> {
    let issued = state.sessions().login(&request.email, &request.password)?;
    Ok(Json(issued))
}

/// Rotate a refresh token into a new credential pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<IssuedCredentials>, ApiError> {
    let issued = state.sessions().refresh(&request.refresh_token)?;
    Ok(Json(issued))
}

/// Revoke a refresh token. Unknown tokens still return 204.
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<StatusCode, ApiError> {
    state.sessions().end(&request.refresh_token)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Revoke the caller's refresh token wherever it was issued.
pub async fn logout_all(
    Auth(principal): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.sessions().end_all(&principal.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}
