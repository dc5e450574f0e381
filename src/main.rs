// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use chat_gateway_server::{
    api::router,
    auth::{KeyFetcher, PublicKeyCache, TokenVerifier},
    chat::OpenAiChatService,
    config::{Config, LogFormat},
    state::AppState,
    storage::UserStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        database = %config.database_path.display(),
        key_cache_ttl_secs = config.key_cache_ttl.as_secs(),
        reset_window_secs = config.policy.reset_window.as_secs(),
        admin_routes = config.admin_api_key.is_some(),
        "Configuration loaded"
    );

    let users = UserStore::open(&config.database_path, config.policy)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    let verifier = TokenVerifier::new(
        Arc::new(PublicKeyCache::new()),
        KeyFetcher::new(config.key_fetch_timeout)?,
        config.providers.clone(),
        config.key_cache_ttl,
    );

    let chat = Arc::new(OpenAiChatService::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    )?);

    let state = AppState::new(verifier, users, chat).with_admin_key(config.admin_api_key.clone());
    let app = router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("Chat gateway listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
