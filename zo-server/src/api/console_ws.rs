//! Admin console WebSocket
//!
//! GET /api/admin/console/ws?token=<JWT>
//! Auth: JWT in the query string (browsers cannot set headers on WebSocket)
//!
//! Protocol:
//! - Server → Console: ConsoleMessage (Ready, NewOrder, OrderStatusChanged)
//! - Console → Server: ConsoleCommand (Hello)
//!
//! Every open session keeps the order notifier in its Watching state.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::console::{ConsoleCommand, ConsoleMessage};
use shared::error::{AppError, ErrorCode};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::admin_auth;
use crate::state::AppState;

/// Maximum concurrent admin console connections
const MAX_CONSOLE_SESSIONS: usize = 10;

const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

pub async fn handle_console_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    admin_auth::verify_token(&query.token, &state.jwt_secret)?;

    let open = state.console.session_count();
    if open >= MAX_CONSOLE_SESSIONS {
        return Err(AppError::with_message(
            ErrorCode::ResourceLimitExceeded,
            format!("Too many console connections ({open}/{MAX_CONSOLE_SESSIONS})"),
        ));
    }

    Ok(ws.on_upgrade(move |socket| console_ws_session(socket, state)))
}

async fn console_ws_session(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before registering so no NewOrder slips between the two
    let mut hub_rx = state.console.subscribe();
    let session = state.console.connect();
    let session_id = session.id();
    tracing::info!(session_id = %session_id, "Console WS connected");

    let ready = ConsoleMessage::Ready {
        poll_interval_secs: state.order_poll_interval.as_secs(),
    };
    if send_message(&mut sink, &ready).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = hub_rx.recv() => {
                match event {
                    Ok(msg) => {
                        if send_message(&mut sink, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(session_id = %session_id, lagged = n, "Console subscriber lagged");
                        hub_rx = state.console.subscribe();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ConsoleCommand>(&text) {
                            Ok(ConsoleCommand::Hello) => {
                                if send_message(&mut sink, &ready).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(session_id = %session_id, "Ignoring console command: {e}");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    drop(session);
    tracing::info!(session_id = %session_id, "Console WS disconnected");
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ConsoleMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sink.send(Message::Text(json.into())).await
}
