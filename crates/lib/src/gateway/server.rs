//! Gateway HTTP server (single port).

use crate::channels::line::{
    parse_events, verify_signature, LineClient, MessagingClient, SIGNATURE_HEADER,
};
use crate::config::{self, Config, LineCredentials};
use crate::dispatch::{dispatch_events, DispatchOptions};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

const ROOT_TEXT: &str = "hello this page is nothing.";

/// Shared state for the gateway. Immutable after startup.
#[derive(Clone)]
pub struct GatewayState {
    /// Channel secret for X-Line-Signature verification.
    pub channel_secret: Arc<str>,
    /// Outbound API client used by the dispatcher.
    pub client: Arc<dyn MessagingClient>,
    pub dispatch: DispatchOptions,
}

impl GatewayState {
    pub fn new(
        channel_secret: impl Into<Arc<str>>,
        client: Arc<dyn MessagingClient>,
        dispatch: DispatchOptions,
    ) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            client,
            dispatch,
        }
    }
}

/// Routes: `GET /` and `POST /callback`.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(root_http))
        .route("/callback", post(line_callback))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Credentials and the PORT override are resolved by the caller, so a missing secret or token
/// stops startup before binding. Blocks until shutdown (Ctrl+C or SIGTERM).
pub async fn run_gateway(config: Config, credentials: LineCredentials) -> Result<()> {
    let client = LineClient::new(
        credentials.channel_access_token,
        config::resolve_api_base(&config),
        config::resolve_data_api_base(&config),
    );
    let dispatch = DispatchOptions {
        fetch_media_content: config.channels.line.fetch_media_content,
    };
    if dispatch.fetch_media_content {
        log::info!("media content is downloaded before replying to image/video/audio messages");
    }
    let state = GatewayState::new(credentials.channel_secret, Arc::new(client), dispatch);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a fixed placeholder page.
async fn root_http() -> &'static str {
    log::info!("route access: {}", ROOT_TEXT);
    ROOT_TEXT
}

/// POST /callback: LINE webhook. 400 on a missing/invalid signature or an unparsable body;
/// otherwise every event is dispatched and the response is 200 `OK` whatever the replies did.
async fn line_callback(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    log::info!("request body: {}", String::from_utf8_lossy(&body));

    if let Err(e) = verify_signature(&state.channel_secret, &body, signature) {
        log::warn!("callback rejected: {}", e);
        return StatusCode::BAD_REQUEST.into_response();
    }
    let events = match parse_events(&body) {
        Ok(events) => events,
        Err(e) => {
            log::warn!("callback rejected: malformed webhook body: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let outcomes = dispatch_events(state.client.as_ref(), &events, state.dispatch).await;
    let replied = outcomes.iter().filter(|o| o.is_replied()).count();
    log::debug!("callback: {} event(s), {} replied", events.len(), replied);
    (StatusCode::OK, "OK").into_response()
}
