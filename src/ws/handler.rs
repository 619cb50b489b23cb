//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{ConnectionHandle, ConnectionId, Gateway, GatewayError};
use crate::util::rate_limit::{
    Coalescer, ConnectionRateLimiter, INPUT_RATE_LIMIT, JOIN_RATE_LIMIT,
};
use crate::util::time::tick_duration;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Outbound messages buffered per connection before it counts as lagging
const OUTBOUND_CAPACITY: usize = 256;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (conn, outbox_rx) = ConnectionHandle::channel(OUTBOUND_CAPACITY);
    let conn_id = conn.id;
    info!(conn_id = %conn_id, "Player connected");

    let (ws_sink, ws_stream) = socket.split();

    // Spawn writer task: outbox -> WebSocket
    let writer_handle = tokio::spawn(run_writer(conn_id, ws_sink, outbox_rx));

    run_session(&state.gateway, &conn, ws_stream).await;

    // Leaves every room this connection occupied
    let rooms = state.gateway.disconnect(conn_id);
    writer_handle.abort();

    info!(conn_id = %conn_id, rooms_left = rooms.len(), "Player disconnected");
}

/// Forward queued server messages to the socket until either side closes
async fn run_writer(
    conn_id: ConnectionId,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outbox_rx: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = outbox_rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
            break;
        }
    }
}

/// Reader loop: WebSocket -> gateway, until the client leaves or lags
async fn run_session(
    gateway: &Gateway,
    conn: &ConnectionHandle,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
) {
    let mut gate = InboundGate::new();

    loop {
        tokio::select! {
            frame = ws_stream.next() => {
                let Some(result) = frame else { break };
                match result {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                        Ok(client_msg) => {
                            if let Some(msg) = gate.admit(conn, client_msg) {
                                dispatch(gateway, conn, msg);
                            }
                        }
                        Err(e) => {
                            warn!(
                                conn_id = %conn.id,
                                error = %e,
                                "Failed to parse client message"
                            );
                        }
                    },
                    Ok(Message::Binary(_)) => {
                        warn!(conn_id = %conn.id, "Received binary message, ignoring");
                    }
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => {
                        info!(conn_id = %conn.id, "Client initiated close");
                        break;
                    }
                    Err(e) => {
                        error!(conn_id = %conn.id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = conn.lagged() => {
                warn!(conn_id = %conn.id, "Outbox overflowed, ending session");
                break;
            }
            _ = tokio::time::sleep(tick_duration()), if gate.has_pending() => {
                if let Some(msg) = gate.take_ready() {
                    dispatch(gateway, conn, msg);
                }
            }
        }
    }
}

/// Inbound quota for one connection.
///
/// Joins over quota are dropped. Inputs over quota are coalesced so the
/// newest one still reaches the room once the quota frees up.
struct InboundGate {
    joins: ConnectionRateLimiter,
    inputs: Coalescer<ClientMsg>,
}

impl InboundGate {
    fn new() -> Self {
        Self::with_rates(JOIN_RATE_LIMIT, INPUT_RATE_LIMIT)
    }

    fn with_rates(joins_per_second: u32, inputs_per_second: u32) -> Self {
        Self {
            joins: ConnectionRateLimiter::with_rate(joins_per_second),
            inputs: Coalescer::new(inputs_per_second),
        }
    }

    /// The message to dispatch now, if any
    fn admit(&mut self, conn: &ConnectionHandle, msg: ClientMsg) -> Option<ClientMsg> {
        match msg {
            ClientMsg::JoinRoom { .. } => {
                if self.joins.check_join() {
                    Some(msg)
                } else {
                    warn!(conn_id = %conn.id, "Rate limited join request");
                    None
                }
            }
            ClientMsg::Input { .. } => {
                let admitted = self.inputs.offer(msg);
                if admitted.is_none() {
                    debug!(conn_id = %conn.id, "Input over quota, holding newest");
                }
                admitted
            }
        }
    }

    fn has_pending(&self) -> bool {
        self.inputs.has_pending()
    }

    fn take_ready(&mut self) -> Option<ClientMsg> {
        self.inputs.take_ready()
    }
}

/// Route one client message into the gateway
fn dispatch(gateway: &Gateway, conn: &ConnectionHandle, msg: ClientMsg) {
    let result = match msg {
        ClientMsg::JoinRoom { room_id } => gateway.join(conn, &room_id).map(drop),
        ClientMsg::Input { room_id, input } => {
            gateway.submit_input(conn.id, &room_id, input).map(drop)
        }
    };

    match result {
        Ok(()) => {}
        Err(e @ (GatewayError::RoomFull(_) | GatewayError::AlreadyJoined(_))) => {
            info!(conn_id = %conn.id, error = %e, "Join rejected");
        }
        // Stale or foreign references are dropped silently
        Err(e @ (GatewayError::UnknownRoom(_) | GatewayError::UnboundSlot(_))) => {
            debug!(conn_id = %conn.id, error = %e, "Input ignored");
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
