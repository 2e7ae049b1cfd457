use session::{SessionId, SessionOutput};
use tokio::sync::mpsc;

use crate::protocol::{ClientMessage, ProtocolError};

/// Messages from the network layer to the tick thread.
#[derive(Debug)]
pub enum NetToTick {
    /// A new WebSocket connection was accepted.
    NewConnection {
        session_id: SessionId,
    },
    /// A text frame arrived and was decoded (or failed to decode).
    Message {
        session_id: SessionId,
        message: Result<ClientMessage, ProtocolError>,
    },
    /// Peer closed the socket.
    Disconnected {
        session_id: SessionId,
    },
}

pub type PlayerTx = mpsc::UnboundedSender<NetToTick>;
pub type PlayerRx = mpsc::UnboundedReceiver<NetToTick>;

/// Batched frames leaving the tick thread.
pub type OutputTx = mpsc::UnboundedSender<SessionOutput>;
pub type OutputRx = mpsc::UnboundedReceiver<SessionOutput>;

/// What a socket writer task should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionWrite {
    Text(String),
    Close { reason: String },
}

pub type SessionWriteTx = mpsc::UnboundedSender<SessionWrite>;

/// Socket tasks attach their writer when the connection opens and detach
/// it when the peer goes away.
#[derive(Debug)]
pub enum RouterCommand {
    Attach {
        session_id: SessionId,
        writer: SessionWriteTx,
    },
    Detach(SessionId),
}

pub type RouterTx = mpsc::UnboundedSender<RouterCommand>;
pub type RouterRx = mpsc::UnboundedReceiver<RouterCommand>;
