use session::{SessionId, SessionOutput};

use crate::channels::OutputTx;
use crate::protocol::Frame;

/// One client as the simulation sees it. Transport framing lives behind it.
pub trait Connection: Send {
    fn session_id(&self) -> SessionId;

    /// Queue one serialized frame.
    fn send(&mut self, frame: &Frame);

    /// Raw control string, bypassing message encoding (`"go"`, `"timeout"`).
    fn send_utf8(&mut self, text: &str);

    /// Close with a diagnostic. Later sends are dropped.
    fn close(&mut self, reason: &str);

    fn is_closed(&self) -> bool;
}

/// Connection backed by the output router channel.
#[derive(Debug)]
pub struct ChannelConnection {
    session_id: SessionId,
    tx: OutputTx,
    closed: bool,
}

impl ChannelConnection {
    pub fn new(session_id: SessionId, tx: OutputTx) -> Self {
        Self {
            session_id,
            tx,
            closed: false,
        }
    }

    fn push(&mut self, output: SessionOutput) {
        if self.closed {
            return;
        }
        if self.tx.send(output).is_err() {
            tracing::debug!(session_id = %self.session_id, "output channel closed");
            self.closed = true;
        }
    }
}

impl Connection for ChannelConnection {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn send(&mut self, frame: &Frame) {
        if frame.is_empty() {
            return;
        }
        self.push(SessionOutput::new(self.session_id, frame.to_json()));
    }

    fn send_utf8(&mut self, text: &str) {
        self.push(SessionOutput::new(self.session_id, text));
    }

    fn close(&mut self, reason: &str) {
        self.push(SessionOutput::close(self.session_id, reason));
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
