// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Taskboard Server - Authenticated Task Service
//!
//! Issues and verifies signed session tokens, gates every task operation by
//! workspace role, and enforces author/assignee ownership on record writes.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password login, token issuance, bearer authentication and role gating
//! - `storage` - Embedded redb storage for accounts, sessions and tasks, plus ownership rules

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
