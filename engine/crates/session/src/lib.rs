use std::collections::BTreeMap;

use ids::EntityId;
use serde::{Deserialize, Serialize};

/// A session is idle-closed after this long without a well-formed message.
pub const IDLE_TIMEOUT_MS: u64 = 15 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    pub session_id: SessionId,
    /// Frame payload; empty outputs only carry the disconnect.
    pub text: String,
    /// When true, the output router will close the session's write channel
    /// after delivering this message, causing the socket to shut down.
    pub disconnect: bool,
    /// Diagnostic sent in the close frame.
    pub close_reason: Option<String>,
}

impl SessionOutput {
    pub fn new(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            disconnect: false,
            close_reason: None,
        }
    }

    /// Close the session without a payload.
    pub fn close(session_id: SessionId, reason: impl Into<String>) -> Self {
        Self {
            session_id,
            text: String::new(),
            disconnect: true,
            close_reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vitality {
    Alive,
    Dead,
}

/// Connection lifecycle. Only HELLO is accepted before `Active`; a dead
/// player re-enters with another HELLO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHello,
    Active(Vitality),
    Disconnected,
}

impl SessionState {
    pub fn accepts_hello(&self) -> bool {
        matches!(
            self,
            SessionState::AwaitingHello | SessionState::Active(Vitality::Dead)
        )
    }

    pub fn is_alive(&self) -> bool {
        matches!(self, SessionState::Active(Vitality::Alive))
    }
}

#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub session_id: SessionId,
    pub state: SessionState,
    pub entity: Option<EntityId>,
    pub player_name: Option<String>,
    pub last_activity_ms: u64,
}

impl PlayerSession {
    pub fn new(session_id: SessionId, now_ms: u64) -> Self {
        Self {
            session_id,
            state: SessionState::AwaitingHello,
            entity: None,
            player_name: None,
            last_activity_ms: now_ms,
        }
    }
}

/// Manages connected player sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: BTreeMap<SessionId, PlayerSession>,
    entity_to_session: BTreeMap<EntityId, SessionId>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with the id the network layer assigned.
    pub fn create_session_with_id(&mut self, id: SessionId, now_ms: u64) {
        self.sessions.insert(id, PlayerSession::new(id, now_ms));
    }

    pub fn get_session(&self, id: SessionId) -> Option<&PlayerSession> {
        self.sessions.get(&id)
    }

    pub fn state(&self, id: SessionId) -> Option<SessionState> {
        self.sessions.get(&id).map(|s| s.state)
    }

    /// Get session ID for an entity.
    pub fn session_id_for_entity(&self, entity: EntityId) -> Option<SessionId> {
        self.entity_to_session.get(&entity).copied()
    }

    /// Bind the player entity after a successful HELLO.
    pub fn bind_entity(&mut self, session_id: SessionId, entity: EntityId, name: impl Into<String>) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            if let Some(old) = session.entity.replace(entity) {
                self.entity_to_session.remove(&old);
            }
            session.player_name = Some(name.into());
            session.state = SessionState::Active(Vitality::Alive);
            self.entity_to_session.insert(entity, session_id);
        }
    }

    pub fn set_vitality(&mut self, session_id: SessionId, vitality: Vitality) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            if matches!(session.state, SessionState::Active(_)) {
                session.state = SessionState::Active(vitality);
            }
        }
    }

    /// Reset the idle clock.
    pub fn touch(&mut self, session_id: SessionId, now_ms: u64) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.last_activity_ms = now_ms;
        }
    }

    /// Sessions silent for at least `timeout_ms`.
    pub fn idle_sessions(&self, now_ms: u64, timeout_ms: u64) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|s| s.state != SessionState::Disconnected)
            .filter(|s| now_ms.saturating_sub(s.last_activity_ms) >= timeout_ms)
            .map(|s| s.session_id)
            .collect()
    }

    /// Mark a session as disconnected and remove entity mapping.
    pub fn disconnect(&mut self, session_id: SessionId) -> Option<EntityId> {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.state = SessionState::Disconnected;
            let entity = session.entity.take();
            if let Some(eid) = entity {
                self.entity_to_session.remove(&eid);
            }
            return entity;
        }
        None
    }

    /// Remove a session entirely.
    pub fn remove_session(&mut self, session_id: SessionId) -> Option<PlayerSession> {
        let session = self.sessions.remove(&session_id)?;
        if let Some(eid) = session.entity {
            self.entity_to_session.remove(&eid);
        }
        Some(session)
    }

    /// All session IDs.
    pub fn all_session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }
}
