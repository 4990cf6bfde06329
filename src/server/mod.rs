//! Server module
//!
//! Webhook server the telephony provider calls back into: serves call
//! scripts, triggers outbound calls and relays transcriptions to the room.

pub mod webhook;

use crate::channels::{LogRoomNotifier, RelayError, RoomNotifier, WebhookRoomNotifier};
use crate::config::{Config, ConfigError};
use crate::voice::{Account, AccountError, RequestValidator};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Invalid bind address: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared handler state
pub struct AppState {
    pub config: Config,
    pub account: Account,
    pub validator: RequestValidator,
    pub notifier: Arc<dyn RoomNotifier>,
}

impl AppState {
    /// Build state from config, choosing the room notifier it names
    pub fn from_config(config: Config) -> Result<Self, ServerError> {
        let notifier: Arc<dyn RoomNotifier> = match &config.room.webhook_url {
            Some(url) => Arc::new(WebhookRoomNotifier::new(&config.room, url.clone())?),
            None => Arc::new(LogRoomNotifier::new(config.room.room.clone())),
        };
        Self::with_notifier(config, notifier)
    }

    /// Build state with an explicit room notifier
    pub fn with_notifier(
        config: Config,
        notifier: Arc<dyn RoomNotifier>,
    ) -> Result<Self, ServerError> {
        let account = Account::new(config.account.sid.clone(), config.account.token.clone())?
            .with_base_url(config.account.api_base_url.clone());
        let validator =
            RequestValidator::new(config.account.sid.clone(), config.account.token.clone());
        Ok(Self {
            config,
            account,
            validator,
            notifier,
        })
    }
}

/// Create the webhook router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(webhook::health_handler))
        .route("/call", get(webhook::place_call_handler))
        .route(
            "/twiml",
            get(webhook::call_script_handler).post(webhook::call_script_handler),
        )
        .route(
            "/hangup",
            get(webhook::hangup_handler).post(webhook::hangup_handler),
        )
        .route("/transcription", post(webhook::transcription_handler))
        .with_state(state)
}

/// Run the webhook server until Ctrl-C
pub async fn start_server(config: Config) -> Result<(), ServerError> {
    config.validate_server()?;

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ServerError::Bind(e.to_string()))?;

    if !config.server.verify_signatures {
        tracing::warn!("Webhook signature verification is disabled");
    }

    let state = Arc::new(AppState::from_config(config)?);
    let app = create_router(state);

    tracing::info!(address = %addr, "Starting webhook server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down webhook server");
        })
        .await?;
    Ok(())
}
