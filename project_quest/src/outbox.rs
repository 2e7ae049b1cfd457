use std::collections::BTreeMap;

use net::{Connection, Frame, ServerMessage};
use session::SessionId;

/// Per-player outgoing queues, flushed once per tick as one frame each.
#[derive(Debug, Default)]
pub struct Outbox {
    queues: BTreeMap<SessionId, Vec<ServerMessage>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, session_id: SessionId) {
        self.queues.entry(session_id).or_default();
    }

    /// Discard the queue and anything still pending in it.
    pub fn close(&mut self, session_id: SessionId) {
        self.queues.remove(&session_id);
    }

    pub fn is_open(&self, session_id: SessionId) -> bool {
        self.queues.contains_key(&session_id)
    }

    /// Returns false when the session has no queue.
    pub fn push(&mut self, session_id: SessionId, message: ServerMessage) -> bool {
        match self.queues.get_mut(&session_id) {
            Some(queue) => {
                queue.push(message);
                true
            }
            None => {
                tracing::debug!(%session_id, kind = %message.kind(), "no outgoing queue, message dropped");
                false
            }
        }
    }

    pub fn sessions(&self) -> Vec<SessionId> {
        self.queues.keys().copied().collect()
    }

    pub fn pending(&self, session_id: SessionId) -> &[ServerMessage] {
        self.queues.get(&session_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Write every non-empty queue to its connection and clear it. Returns the
    /// number of frames written.
    pub fn flush(&mut self, connections: &mut BTreeMap<SessionId, Box<dyn Connection>>) -> usize {
        let mut frames = 0;
        for (session_id, queue) in self.queues.iter_mut() {
            if queue.is_empty() {
                continue;
            }
            let frame = Frame(std::mem::take(queue));
            if let Some(conn) = connections.get_mut(session_id) {
                conn.send(&frame);
                frames += 1;
            }
        }
        frames
    }
}
