// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use taskboard_server::{
    api::router,
    auth::CredentialIssuer,
    config::{Config, LogFormat, DEFAULT_LOG_FILTER},
    state::AppState,
    storage::Store,
};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);
    tracing::info!(?config, "Configuration loaded");

    let store = match Store::open_in(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, data_dir = %config.data_dir.display(), "Failed to open database");
            return ExitCode::FAILURE;
        }
    };

    let issuer = CredentialIssuer::new(&config.jwt_secret).with_access_ttl(config.access_token_ttl);
    let state = AppState::new(store, issuer).with_new_user_role(config.new_user_role);
    let app = router(state);

    tracing::info!(addr = %config.bind_addr, "Taskboard server listening");

    if let Err(e) = axum_server::bind(config.bind_addr)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!(error = %e, "HTTP server failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
