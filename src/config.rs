// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup. A missing
//! or weak signing secret is fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret for access/refresh tokens (>= 32 bytes) | Required |
//! | `ACCESS_TOKEN_TTL_MINUTES` | Access token lifetime, 1 to 1440 | `15` |
//! | `DATA_DIR` | Directory holding the redb database | `./data` |
//! | `NEW_USER_ROLE` | Role given to registered accounts after the first | `MEMBER` |
//! | `HOST` | Server bind address (IPv4 or IPv6) | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use chrono::Duration;

use crate::auth::issuer::DEFAULT_ACCESS_TOKEN_TTL_MINUTES;
use crate::auth::Role;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const ACCESS_TOKEN_TTL_ENV: &str = "ACCESS_TOKEN_TTL_MINUTES";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const NEW_USER_ROLE_ENV: &str = "NEW_USER_ROLE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Shortest accepted HS256 secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Access tokens live at most one day.
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET is not set")]
    MissingSecret,

    #[error("JWT_SECRET must be at least 32 bytes")]
    WeakSecret,

    #[error("{name} has an invalid value: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub new_user_role: Role,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("new_user_role", &self.new_user_role)
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(JWT_SECRET_ENV).ok_or(ConfigError::MissingSecret)?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let access_token_ttl_minutes = match lookup(ACCESS_TOKEN_TTL_ENV) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(minutes) if (1..=MAX_ACCESS_TOKEN_TTL_MINUTES).contains(&minutes) => minutes,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: ACCESS_TOKEN_TTL_ENV,
                        value: raw,
                    })
                }
            },
            None => DEFAULT_ACCESS_TOKEN_TTL_MINUTES,
        };
        let access_token_ttl = Duration::try_minutes(access_token_ttl_minutes).ok_or_else(|| {
            ConfigError::InvalidValue {
                name: ACCESS_TOKEN_TTL_ENV,
                value: access_token_ttl_minutes.to_string(),
            }
        })?;

        let new_user_role = match lookup(NEW_USER_ROLE_ENV) {
            Some(raw) => Role::from_str(raw.trim()).ok_or(ConfigError::InvalidValue {
                name: NEW_USER_ROLE_ENV,
                value: raw.clone(),
            })?,
            None => Role::Member,
        };

        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };
        let ip: IpAddr = host.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: HOST_ENV,
            value: host.clone(),
        })?;
        let bind_addr = SocketAddr::new(ip, port);

        let log_format = match lookup(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            jwt_secret: jwt_secret.into_bytes(),
            access_token_ttl,
            new_user_role,
            data_dir,
            bind_addr,
            log_format,
        })
    }
}
