//! # Relay Web Server
//!
//! This module implements the HTTP server (Axum) that both client roles
//! connect to.
//!
//! ## Endpoints
//!
//! | Path | Description |
//! |------|-------------|
//! | `/` | WebSocket relay on upgrade, otherwise `wall.html` |
//! | `/ws` | WebSocket relay |
//! | `/favicon.ico` | Always `204 No Content` |
//! | anything else | Static files from the public directory |
//!
//! ## Relay Semantics
//!
//! Every text frame received from any client is forwarded verbatim to every
//! open connection, including the one it came from. The relay never parses
//! frames and holds no domain state; its only state is the
//! [`ConnectionRegistry`].

use crate::config::ServerConfig;
use crate::relay::registry::{ConnectionId, ConnectionRegistry};
use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, Utf8Bytes, WebSocket},
        State, WebSocketUpgrade,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

/// Shared state passed to all request handlers.
#[derive(Clone)]
struct AppState {
    registry: Arc<ConnectionRegistry>,
    wall_page: Arc<PathBuf>,
}

/// Builds the router with the relay endpoints and the static asset host.
///
/// # Arguments
///
/// * `registry` - Broadcast membership shared by every socket handler.
/// * `public_dir` - Directory served for all non-relay paths.
pub fn router(registry: Arc<ConnectionRegistry>, public_dir: &Path) -> Router {
    let state = AppState {
        registry,
        wall_page: Arc::new(public_dir.join("wall.html")),
    };

    Router::new()
        .route("/", get(handle_root))
        .route("/ws", get(handle_websocket))
        .route("/favicon.ico", get(|| async { StatusCode::NO_CONTENT }))
        .fallback_service(ServeDir::new(public_dir))
        .with_state(state)
}

/// Binds the configured address and serves until the process exits.
pub async fn start_server(config: &ServerConfig) -> Result<()> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind relay port {}", addr))?;

    info!(%addr, public_dir = %config.public_dir.display(), "relay listening");
    info!("wall:    http://localhost:{}/wall.html", config.port);
    info!("control: http://localhost:{}/control.html", config.port);

    let registry = Arc::new(ConnectionRegistry::new());
    serve(listener, registry, &config.public_dir).await
}

/// Serves the relay on an already bound listener.
///
/// Split from [`start_server`] so tests can bind `127.0.0.1:0`.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<ConnectionRegistry>,
    public_dir: &Path,
) -> Result<()> {
    axum::serve(listener, router(registry, public_dir))
        .await
        .context("relay server terminated unexpectedly")
}

/// `/` doubles as the relay endpoint, the way browsers open `ws://host`.
/// Plain requests get the wall page itself.
async fn handle_root(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| handle_relay_socket(socket, state.registry)),
        Err(_) => serve_wall_page(&state.wall_page).await,
    }
}

async fn serve_wall_page(path: &Path) -> Response {
    match tokio::fs::read(path).await {
        Ok(body) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "wall page unavailable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_relay_socket(socket, state.registry))
}

/// Manages a single relay connection for its whole lifetime.
///
/// 1. Registers an outbound queue and spawns the writer task draining it.
/// 2. Broadcasts each inbound frame to the registry.
/// 3. Deregisters as soon as the socket closes or errors.
async fn handle_relay_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, queue) = mpsc::unbounded_channel::<Utf8Bytes>();
    let id = registry.add(outbox);
    info!(connection = %id, members = registry.len(), "client connected");

    let writer = tokio::spawn(async move {
        let mut queue = UnboundedReceiverStream::new(queue);
        while let Some(frame) = queue.next().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                // Dropping the queue marks this member closed for the registry.
                break;
            }
        }
    });

    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => relay_frame(&registry, id, text),
            Ok(Message::Binary(bytes)) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                relay_frame(&registry, id, text.into());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping/pong are answered by axum
            Err(e) => {
                warn!(connection = %id, error = %e, "socket error");
                break;
            }
        }
    }

    registry.remove(id);
    writer.abort();
    info!(connection = %id, members = registry.len(), "client disconnected");
}

fn relay_frame(registry: &ConnectionRegistry, from: ConnectionId, frame: Utf8Bytes) {
    let fanout = registry.broadcast(frame);
    debug!(
        from = %from,
        delivered = fanout.delivered,
        skipped = fanout.skipped,
        "relayed frame"
    );
}
