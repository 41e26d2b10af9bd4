//! HTTP and WebSocket handlers.

use crate::channel::WsChannel;
use crate::server::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use procwatch_core::{CancellationToken, ServerConfig};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Health check endpoint.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": state.manager.active_sessions().await,
    }))
}

/// WebSocket upgrade endpoint. Each accepted socket becomes one session.
pub async fn handle_ws(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    if !state.origins.allows_request(&headers) {
        warn!(
            "Refusing WebSocket from origin {:?}",
            headers.get(ORIGIN)
        );
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: Arc<AppState>, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(ServerConfig::SEND_QUEUE_CAPACITY);
    let overflow = CancellationToken::new();
    let channel = WsChannel::new(tx, overflow.clone());

    let session = match state.manager.on_connect(Arc::new(channel)).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to start session: {}", e);
            let _ = sink.send(Message::Close(None)).await;
            return;
        }
    };
    let id = session.id();

    // Writer: forward queued event frames to the client.
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Reader: clients only ever close; anything else is ignored.
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Session {}: socket error: {}", id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
        _ = overflow.cancelled() => {
            send_task.abort();
            recv_task.abort();
        }
    }

    state.manager.on_disconnect(&session).await;
}
