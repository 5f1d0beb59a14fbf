//! Events WebSocket handler
//!
//! GET /api/events/subscribe?tenant_id=<id>&kinds=a,b
//!
//! Tenant id travels in the query (browser WebSocket clients cannot set
//! custom headers); the `X-Tenant-Id` header works as a fallback for
//! non-browser clients. After the upgrade the server sends one
//! `connected` control frame carrying the subscription id, then forwards
//! matching change events as JSON text frames until the client hangs up
//! or the server shuts down.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::{info, warn};

use shared::error::AppError;
use shared::event::EventKind;

use crate::api::parse_tokens;
use crate::core::ServerState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubscribeQuery {
    pub tenant_id: Option<String>,
    /// Comma-separated event-kind tokens; absent means every kind
    pub kinds: Option<String>,
}

/// Control frames sent to the client. Events themselves go out as raw
/// change-event JSON, not wrapped.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ControlFrame {
    Connected { subscription_id: String },
}

/// GET /api/events/subscribe - upgrade to WebSocket
pub async fn subscribe(
    State(state): State<ServerState>,
    Query(query): Query<SubscribeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let tenant_id = query
        .tenant_id
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headers
                .get("x-tenant-id")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .ok_or_else(|| {
            AppError::validation("Missing tenant_id query parameter or X-Tenant-Id header")
        })?;

    // Unknown kind tokens are rejected here, before any registration
    let kinds = match &query.kinds {
        Some(raw) => {
            let parsed: Vec<EventKind> = parse_tokens(raw)?;
            if parsed.is_empty() { None } else { Some(parsed) }
        }
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| events_ws_session(socket, state, tenant_id, kinds)))
}

async fn events_ws_session(
    socket: WebSocket,
    state: ServerState,
    tenant_id: String,
    kinds: Option<Vec<EventKind>>,
) {
    let (subscription_id, mut events) = state.hub.subscribe(&tenant_id, kinds);
    let shutdown = state.hub.shutdown_token();

    info!(tenant_id = %tenant_id, subscription_id = %subscription_id, "Events WS connected");

    let (mut sink, mut stream) = socket.split();

    let connected = ControlFrame::Connected {
        subscription_id: subscription_id.clone(),
    };
    if send_json(&mut sink, &connected).await.is_err() {
        state.hub.unsubscribe(&subscription_id);
        return;
    }

    let mut ping_interval = tokio::time::interval(Duration::from_secs(30));
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            _ = shutdown.cancelled() => break,

            event = events.recv() => {
                match event {
                    Some(event) => {
                        if send_json(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    // Hub dropped the sending side
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(subscription_id = %subscription_id, "Events WS error: {e}");
                        break;
                    }
                    // Text, Binary and Pong carry no client commands in this protocol
                    _ => {}
                }
            }
        }
    }

    // Send Close frame (best-effort)
    let _ = sink.close().await;

    state.hub.unsubscribe(&subscription_id);
    info!(tenant_id = %tenant_id, subscription_id = %subscription_id, "Events WS disconnected");
}

async fn send_json<S, T>(sink: &mut S, msg: &T) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
    T: Serialize,
{
    let json = serde_json::to_string(msg).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
