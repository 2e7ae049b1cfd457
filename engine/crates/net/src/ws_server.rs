use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use session::SessionId;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::channels::{NetToTick, PlayerTx, RouterCommand, RouterTx, SessionWrite};
use crate::protocol::ClientMessage;

static NEXT_WS_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Run the WebSocket server until `shutdown` flips to true.
pub async fn run_ws_server(
    addr: String,
    player_tx: PlayerTx,
    router_tx: RouterTx,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("WebSocket server listening on {}", addr);

    loop {
        let (stream, peer_addr) = tokio::select! {
            accepted = listener.accept() => accepted?,
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("WebSocket server stopping");
                    return Ok(());
                }
                continue;
            }
        };
        let session_id = SessionId(NEXT_WS_SESSION_ID.fetch_add(1, Ordering::Relaxed));

        tracing::info!(%session_id, %peer_addr, "New WebSocket connection");

        let player_tx = player_tx.clone();
        let router_tx = router_tx.clone();

        tokio::spawn(async move {
            match tokio_tungstenite::accept_async(stream).await {
                Ok(ws_stream) => {
                    handle_ws_session(ws_stream, session_id, player_tx, router_tx).await;
                }
                Err(e) => {
                    tracing::warn!(%session_id, "WebSocket handshake failed: {}", e);
                }
            }
        });
    }
}

async fn handle_ws_session(
    ws_stream: tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>,
    session_id: SessionId,
    player_tx: PlayerTx,
    router_tx: RouterTx,
) {
    let (mut ws_writer, mut ws_reader) = ws_stream.split();

    let (writer, mut write_rx) = tokio::sync::mpsc::unbounded_channel();
    let _ = router_tx.send(RouterCommand::Attach { session_id, writer });

    // Notify tick thread of new connection
    let _ = player_tx.send(NetToTick::NewConnection { session_id });

    // Writer task: forward output_router writes as WS frames
    let writer_handle = tokio::spawn(async move {
        while let Some(write) = write_rx.recv().await {
            match write {
                SessionWrite::Text(text) => {
                    if ws_writer.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                SessionWrite::Close { reason } => {
                    tracing::debug!(%session_id, %reason, "closing WebSocket");
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: reason.into(),
                    };
                    let _ = ws_writer.send(Message::Close(Some(frame))).await;
                    break;
                }
            }
        }
    });

    // Reader loop: decode text frames and forward them to the tick thread
    while let Some(result) = ws_reader.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let _ = player_tx.send(handle_ws_message(session_id, &text));
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_)) => {
                // tungstenite handles pong automatically
            }
            Ok(_) => {} // Ignore binary, pong, etc.
            Err(e) => {
                tracing::debug!(%session_id, "WebSocket read error: {}", e);
                break;
            }
        }
    }

    // Notify tick thread of disconnection
    let _ = player_tx.send(NetToTick::Disconnected { session_id });
    let _ = router_tx.send(RouterCommand::Detach(session_id));

    writer_handle.abort();
    tracing::info!(%session_id, "WebSocket session ended");
}

/// Decode a WebSocket text frame. Decode failures still reach the tick
/// thread, which closes the connection with the error as reason.
pub(crate) fn handle_ws_message(session_id: SessionId, text: &str) -> NetToTick {
    let message = ClientMessage::parse(text);
    if let Err(e) = &message {
        tracing::debug!(%session_id, "Invalid client message: {}", e);
    }
    NetToTick::Message {
        session_id,
        message,
    }
}
