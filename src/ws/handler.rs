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
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::protocol::{ClientMsg, Frame};
use crate::ws::session::Session;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Frame>(state.config.outbound_buffer.max(1));
    let mut rate_limiter = ConnectionRateLimiter::new(state.config.input_rate_limit);

    let mut session = Session::open(state, tx);
    let conn_label = session.id().clone();

    // Writer task: queued frames -> WebSocket
    let mut writer_handle = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame.to_string())).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> session
    loop {
        let result = tokio::select! {
            next = ws_stream.next() => match next {
                Some(result) => result,
                None => break,
            },
            _ = &mut writer_handle => {
                debug!(player_id = %session.id(), "Writer finished, closing connection");
                break;
            }
        };

        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.admit() {
                    // warn on the first shed message, then every hundredth
                    if rate_limiter.dropped() % 100 == 1 {
                        warn!(
                            player_id = %session.id(),
                            dropped = rate_limiter.dropped(),
                            "Inbound rate limit exceeded"
                        );
                    }
                    continue;
                }

                match ClientMsg::decode(&text) {
                    Ok(msg) => {
                        if let Err(e) = session.handle(msg) {
                            debug!(player_id = %session.id(), error = %e, "Connection unusable");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(player_id = %session.id(), error = %e, "Dropping malformed message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %session.id(), "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %session.id(), "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %session.id(), error = %e, "WebSocket error");
                break;
            }
        }
    }

    session.close();
    writer_handle.abort();

    info!(
        player_id = %session.id(),
        first_id = %conn_label,
        rate_limited = rate_limiter.dropped(),
        "WebSocket connection closed"
    );
}
