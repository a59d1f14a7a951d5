// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::storage::{OwnershipError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    /// Missing or empty identifier in the request.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::new(e.status_code(), e.error_code(), e.to_string())
    }
}

impl From<OwnershipError> for ApiError {
    fn from(e: OwnershipError) -> Self {
        Self::forbidden(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(message) => Self::not_found(message),
            StoreError::Conflict(message) => Self::conflict(message),
            StoreError::Denied(denied) => Self::from(denied),
            other => {
                tracing::error!(error = %other, "Storage failure");
                Self::internal()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::invalid_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.code, "invalid_request");

        let forbidden = ApiError::forbidden("no");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn auth_errors_keep_status_and_code() {
        let unauth = ApiError::from(AuthError::TokenExpired);
        assert_eq!(unauth.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauth.code, "token_expired");

        let forbidden = ApiError::from(AuthError::InsufficientPermissions);
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn ownership_errors_are_forbidden() {
        let err = ApiError::from(OwnershipError::DeleteDenied("task"));
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.message, "Only the author can delete this task");
    }

    #[test]
    fn store_conflicts_and_denials_keep_meaning() {
        let conflict = ApiError::from(StoreError::Conflict("taken".into()));
        assert_eq!(conflict.status, StatusCode::CONFLICT);
        assert_eq!(conflict.message, "taken");

        let denied = ApiError::from(StoreError::Denied(OwnershipError::UpdateDenied("task")));
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(denied.message, "You do not have permission to update this task");
    }

    #[test]
    fn storage_failures_do_not_leak_details() {
        let io = std::io::Error::other("disk /var/secret exploded");
        let err = ApiError::from(StoreError::Io(io));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret"));
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::invalid_request("Project id not provided").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(
            body,
            r#"{"error":"Project id not provided","error_code":"invalid_request"}"#
        );
    }
}
