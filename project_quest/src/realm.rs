//! Several independent worlds behind one connection entry point.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use engine_core::{Simulation, StepReport, SubscriptionId};
use net::channels::OutputTx;
use net::{ChannelConnection, ClientMessage, Connection, NetToTick, ProtocolError};
use session::SessionId;

use crate::world::{World, WorldEvent};

struct WorldSlot {
    world: World,
    events: SubscriptionId,
    quarantined: bool,
}

/// Routes sessions to worlds and keeps the realm-wide population in sync.
pub struct Realm {
    slots: Vec<WorldSlot>,
    placements: BTreeMap<SessionId, usize>,
}

impl Realm {
    pub fn new(worlds: Vec<World>) -> Self {
        let slots = worlds
            .into_iter()
            .map(|mut world| {
                let events = world.subscribe_events();
                WorldSlot {
                    world,
                    events,
                    quarantined: false,
                }
            })
            .collect();
        Self {
            slots,
            placements: BTreeMap::new(),
        }
    }

    pub fn world(&self, index: usize) -> Option<&World> {
        self.slots.get(index).map(|s| &s.world)
    }

    /// Index of the world hosting `session_id`.
    pub fn world_of(&self, session_id: SessionId) -> Option<usize> {
        self.placements.get(&session_id).copied()
    }

    pub fn is_quarantined(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.quarantined)
    }

    /// Players across every healthy world.
    pub fn total_population(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !s.quarantined)
            .map(|s| s.world.player_count())
            .sum()
    }

    /// Place a new connection in the first world with room left. Returns the
    /// world index, or `None` when every world is full.
    pub fn connect(&mut self, session_id: SessionId, mut connection: Box<dyn Connection>) -> Option<usize> {
        let Some(index) = self
            .slots
            .iter()
            .position(|s| !s.quarantined && !s.world.is_full())
        else {
            tracing::warn!(%session_id, "every world is full, rejecting connection");
            connection.close("World is full");
            return None;
        };
        self.placements.insert(session_id, index);
        self.guarded(index, |world| world.connect(session_id, connection));
        Some(index)
    }

    pub fn handle_message(&mut self, session_id: SessionId, message: Result<ClientMessage, ProtocolError>) {
        let Some(index) = self.world_of(session_id) else {
            tracing::debug!(%session_id, "message from unplaced session");
            return;
        };
        self.guarded(index, |world| world.handle_message(session_id, message));
        self.forget_if_gone(session_id, index);
        self.sync_population();
    }

    pub fn disconnect(&mut self, session_id: SessionId) {
        let Some(index) = self.placements.remove(&session_id) else {
            return;
        };
        self.guarded(index, |world| world.disconnect(session_id));
        self.sync_population();
    }

    /// Apply one event from the network layer. New connections write back
    /// through `output_tx`.
    pub fn handle_net(&mut self, event: NetToTick, output_tx: &OutputTx) {
        match event {
            NetToTick::NewConnection { session_id } => {
                let connection = ChannelConnection::new(session_id, output_tx.clone());
                self.connect(session_id, Box::new(connection));
            }
            NetToTick::Message { session_id, message } => self.handle_message(session_id, message),
            NetToTick::Disconnected { session_id } => self.disconnect(session_id),
        }
    }

    /// Close every session of every world, e.g. on shutdown.
    pub fn close_all(&mut self, reason: &str) {
        for index in 0..self.slots.len() {
            if !self.slots[index].quarantined {
                self.guarded(index, |world| world.close_all(reason));
            }
        }
        self.placements.clear();
    }

    /// Run `f` on one world. A panic quarantines that world and leaves the
    /// others untouched.
    fn guarded(&mut self, index: usize, f: impl FnOnce(&mut World)) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.quarantined {
            return false;
        }
        let world = &mut slot.world;
        match panic::catch_unwind(AssertUnwindSafe(|| f(world))) {
            Ok(()) => true,
            Err(_) => {
                tracing::error!(world = %slot.world.id(), "world panicked, quarantining it");
                self.quarantine(index);
                false
            }
        }
    }

    fn quarantine(&mut self, index: usize) {
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        slot.quarantined = true;
        let world = &mut slot.world;
        if panic::catch_unwind(AssertUnwindSafe(|| world.close_all("World unavailable"))).is_err() {
            tracing::error!(world = %slot.world.id(), "could not close sessions of a failed world");
        }
        self.placements.retain(|_, w| *w != index);
        self.sync_population();
    }

    fn forget_if_gone(&mut self, session_id: SessionId, index: usize) {
        let gone = self
            .slots
            .get(index)
            .map_or(true, |s| !s.world.has_session(session_id));
        if gone {
            self.placements.remove(&session_id);
        }
    }

    /// Broadcast the realm-wide population when anyone entered or left.
    fn sync_population(&mut self) {
        let mut changed = false;
        for slot in &mut self.slots {
            let events = slot.world.drain_events(slot.events);
            changed |= events.iter().any(|e| {
                matches!(
                    e,
                    WorldEvent::PlayerEntered { .. } | WorldEvent::PlayerLeft { .. }
                )
            });
        }
        if !changed {
            return;
        }
        let total = self.total_population();
        tracing::debug!(total, "population changed");
        for index in 0..self.slots.len() {
            self.guarded(index, |world| world.update_population(total));
        }
    }
}

impl Simulation for Realm {
    fn advance(&mut self, now_ms: u64) -> StepReport {
        let mut report = StepReport::default();
        for index in 0..self.slots.len() {
            let mut step = StepReport::default();
            if self.guarded(index, |world| step = world.advance(now_ms)) {
                report += step;
            }
        }
        let slots = &self.slots;
        self.placements
            .retain(|sid, index| slots.get(*index).is_some_and(|s| s.world.has_session(*sid)));
        self.sync_population();
        report
    }
}
