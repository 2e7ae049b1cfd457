//! One independent world instance: entities, zones, areas, timers and the
//! sessions of the players inside it.

mod broadcast;
mod combat;
mod events;
mod handlers;
mod spawning;
mod timers;

use std::collections::BTreeMap;
use std::sync::Arc;

use engine_core::{EventBus, Simulation, StepReport, SubscriptionId, TimerQueue};
use ids::{EntityAllocator, EntityId};
use net::Connection;
use rand::rngs::StdRng;
use rand::SeedableRng;
use session::{SessionId, SessionManager, SessionState, IDLE_TIMEOUT_MS};
use space::{MapProvider, ZoneGroups};

use crate::area::{Area, AreaId};
use crate::entity::{Entity, EntityStore};
use crate::outbox::Outbox;

pub use events::WorldEvent;
pub use timers::WorldTimer;

pub const REGEN_INTERVAL_MS: u64 = 2_000;
pub const MOB_RESPAWN_DELAY_MS: u64 = 30_000;
pub const STATIC_ITEM_RESPAWN_DELAY_MS: u64 = 30_000;
pub const ITEM_BLINK_DELAY_MS: u64 = 10_000;
pub const ITEM_DESPAWN_DELAY_MS: u64 = 4_000;
pub const FIREPOTION_DURATION_MS: u64 = 15_000;
/// Delay before a mob with an empty hate list walks back to its spawn.
pub const MOB_RETURN_DELAY_MS: u64 = 4_000;
/// Return delay used when a mob forgets a player that vanished.
pub const VANISH_RETURN_DELAY_MS: u64 = 1_000;
/// Chebyshev distance from spawn past which a chasing mob gives up.
pub const MAX_CHASE_DISTANCE: i32 = 50;
pub const AGGRO_HATE: i32 = 5;

#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub id: String,
    pub max_players: usize,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            id: "world1".to_string(),
            max_players: 200,
            seed: None,
        }
    }
}

pub struct World {
    id: String,
    max_players: usize,
    map: Arc<dyn MapProvider>,
    groups: ZoneGroups,
    entities: EntityStore,
    areas: Vec<Area>,
    sessions: SessionManager,
    connections: BTreeMap<SessionId, Box<dyn Connection>>,
    outbox: Outbox,
    timers: TimerQueue<WorldTimer>,
    events: EventBus<WorldEvent>,
    policy: SubscriptionId,
    allocator: EntityAllocator,
    rng: StdRng,
    now_ms: u64,
    next_regen_ms: u64,
    player_count: usize,
    total_population: usize,
}

impl World {
    /// Build the world and place every map-defined entity.
    pub fn new(config: WorldConfig, map: Arc<dyn MapProvider>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut events = EventBus::new();
        let policy = events.subscribe();

        let mut world = Self {
            id: config.id,
            max_players: config.max_players,
            groups: ZoneGroups::new(map.layout()),
            map,
            entities: EntityStore::new(),
            areas: Vec::new(),
            sessions: SessionManager::new(),
            connections: BTreeMap::new(),
            outbox: Outbox::new(),
            timers: TimerQueue::new(),
            events,
            policy,
            allocator: EntityAllocator::new(),
            rng,
            now_ms: 0,
            next_regen_ms: REGEN_INTERVAL_MS,
            player_count: 0,
            total_population: 0,
        };
        world.populate();
        tracing::info!(
            world = %world.id,
            entities = world.entities.len(),
            areas = world.areas.len(),
            "world ready"
        );
        world
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Players that completed the handshake and have not left.
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    pub fn is_full(&self) -> bool {
        self.player_count >= self.max_players
    }

    pub fn has_session(&self, session_id: SessionId) -> bool {
        self.sessions.get_session(session_id).is_some()
    }

    pub fn session_state(&self, session_id: SessionId) -> Option<SessionState> {
        self.sessions.state(session_id)
    }

    pub fn player_entity(&self, session_id: SessionId) -> Option<EntityId> {
        self.sessions.get_session(session_id).and_then(|s| s.entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn area(&self, id: AreaId) -> Option<&Area> {
        self.areas.get(id.0)
    }

    pub fn subscribe_events(&mut self) -> SubscriptionId {
        self.events.subscribe()
    }

    pub fn drain_events(&mut self, subscription: SubscriptionId) -> Vec<WorldEvent> {
        self.events.drain(subscription)
    }

    /// Check the cross-reference invariants: zone membership matches
    /// positions for every live entity, and attack links agree both ways.
    pub fn check_invariants(&self) -> Result<(), String> {
        let layout = self.map.layout();
        if let Some(missing) = self.entities.iter().find(|e| !self.groups.contains(e.id)) {
            return Err(format!("{} is live but in no zone", missing.id));
        }
        if self.groups.member_count() != self.entities.len() {
            return Err(format!(
                "{} zone members for {} live entities",
                self.groups.member_count(),
                self.entities.len()
            ));
        }
        if !self
            .groups
            .is_consistent(layout, |id| self.entities.get(id).map(|e| e.pos))
        {
            return Err("zone membership does not match positions".to_string());
        }
        if !self.entities.attack_links_consistent() {
            return Err("attack links disagree".to_string());
        }
        Ok(())
    }

    /// React to our own notifications. Runs after every mutation path.
    fn dispatch_policies(&mut self) {
        for event in self.events.drain(self.policy) {
            match event {
                WorldEvent::AreaEmptied { area } => self.on_area_emptied(area),
                WorldEvent::MobKilled { mob, kind, killer } => {
                    tracing::debug!(world = %self.id, %mob, %kind, %killer, "mob killed");
                }
                WorldEvent::PlayerEntered { player, session_id } => {
                    tracing::info!(world = %self.id, %player, %session_id, "player entered");
                }
                WorldEvent::PlayerLeft { player, session_id } => {
                    tracing::info!(world = %self.id, %player, %session_id, "player left");
                }
            }
        }
    }

    fn regenerate(&mut self) {
        for id in self.entities.ids() {
            let Some(entity) = self.entities.get_mut(id) else {
                continue;
            };
            let is_player = entity.is_player();
            let Some(character) = entity.character_mut() else {
                continue;
            };
            if character.has_full_health() {
                continue;
            }
            let amount = character.regen_amount();
            character.regen_by(amount);
            let points = character.hit_points;
            if is_player {
                self.push_to_player(id, net::ServerMessage::Health { points, regen: true });
            }
        }
    }

    fn close_idle_sessions(&mut self) {
        for session_id in self.sessions.idle_sessions(self.now_ms, IDLE_TIMEOUT_MS) {
            if let Some(conn) = self.connections.get_mut(&session_id) {
                conn.send_utf8("timeout");
            }
            tracing::info!(world = %self.id, %session_id, "closing idle session");
            self.close_session(session_id, "Player was idle for too long");
        }
        self.dispatch_policies();
    }
}

impl Simulation for World {
    /// Fire due timers in order, regenerate, close idle sessions, announce
    /// newly visible entities and flush every outgoing queue.
    fn advance(&mut self, now_ms: u64) -> StepReport {
        let mut report = StepReport::default();

        while let Some((_, due, timer)) = self.timers.pop_due(now_ms) {
            self.now_ms = self.now_ms.max(due);
            self.fire(timer);
            self.dispatch_policies();
            report.timers_fired += 1;
        }
        self.now_ms = self.now_ms.max(now_ms);

        while self.next_regen_ms <= self.now_ms {
            self.regenerate();
            self.next_regen_ms += REGEN_INTERVAL_MS;
        }

        self.close_idle_sessions();
        self.process_groups();
        report.frames_flushed = self.outbox.flush(&mut self.connections);
        report.entity_count = self.entities.len();
        report
    }
}
