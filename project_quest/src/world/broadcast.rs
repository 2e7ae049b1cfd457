use ids::EntityId;
use net::ServerMessage;
use space::{GridPos, ZoneId};

use super::World;

impl World {
    pub(super) fn push_to_player(&mut self, player: EntityId, message: ServerMessage) {
        match self.sessions.session_id_for_entity(player) {
            Some(session_id) => {
                self.outbox.push(session_id, message);
            }
            None => tracing::debug!(world = %self.id, %player, "push to unknown player"),
        }
    }

    /// Players standing in one zone.
    pub(super) fn push_to_zone(&mut self, zone: ZoneId, message: &ServerMessage, ignore: Option<EntityId>) {
        let players: Vec<EntityId> = self.groups.players_in(zone).collect();
        for player in players {
            if Some(player) != ignore {
                self.push_to_player(player, message.clone());
            }
        }
    }

    /// Players in every zone of `zone`'s interest set.
    pub(super) fn push_to_adjacent(&mut self, zone: ZoneId, message: &ServerMessage, ignore: Option<EntityId>) {
        let zones = self.map.layout().interest_set(zone);
        for z in zones {
            self.push_to_zone(z, message, ignore);
        }
    }

    /// Players that can see `entity`. No-op when it is in no zone.
    pub(super) fn push_around(&mut self, entity: EntityId, message: ServerMessage, ignore: Option<EntityId>) {
        if let Some(zone) = self.groups.zone_of(entity) {
            self.push_to_adjacent(zone, &message, ignore);
        }
    }

    /// Every player with an outgoing queue.
    pub(super) fn push_broadcast(&mut self, message: ServerMessage) {
        for session_id in self.outbox.sessions() {
            self.outbox.push(session_id, message.clone());
        }
    }

    /// Tell the zones that lost sight of `entity` on its last zone change.
    fn announce_departure(&mut self, entity: EntityId) {
        let left = self.groups.take_recently_left(entity);
        let message = ServerMessage::Destroy { id: entity };
        for zone in left {
            self.push_to_zone(zone, &message, Some(entity));
        }
    }

    /// Re-establish the zone of a live entity from its position. Zones that
    /// lost sight of it get a destroy; a player also gets a fresh entity list.
    pub(super) fn update_membership(&mut self, entity: EntityId) -> bool {
        let Some((pos, kind, is_player)) = self
            .entities
            .get(entity)
            .map(|e| (e.pos, e.member_kind(), e.is_player()))
        else {
            return false;
        };
        let change = self.groups.update(self.map.layout(), entity, pos, kind);
        if !change.changed {
            return false;
        }
        self.announce_departure(entity);
        if is_player {
            self.push_entity_list(entity);
        }
        true
    }

    /// Move a live entity and keep its zone in step. True on a zone change.
    pub(super) fn relocate(&mut self, entity: EntityId, pos: GridPos) -> bool {
        let Some(e) = self.entities.get_mut(entity) else {
            return false;
        };
        e.pos = pos;
        self.update_membership(entity)
    }

    /// Ids of everything the player can see, itself excluded.
    pub(super) fn push_entity_list(&mut self, player: EntityId) {
        let Some(zone) = self.groups.zone_of(player) else {
            return;
        };
        let ids: Vec<EntityId> = self
            .groups
            .entities_visible_from(zone)
            .filter(|id| *id != player)
            .collect();
        self.push_to_player(player, ServerMessage::List { ids });
    }

    /// Announce every newly visible entity to the players of the zones it
    /// entered. A player never receives its own spawn.
    pub(super) fn process_groups(&mut self) {
        for (zone, incoming) in self.groups.drain_incoming() {
            for id in incoming {
                let Some(state) = self.entities.get(id).map(|e| e.spawn_state()) else {
                    continue;
                };
                self.push_to_zone(zone, &ServerMessage::Spawn(state), Some(id));
            }
        }
    }

    /// Send the realm-wide population to every player of this world.
    pub fn update_population(&mut self, total: usize) {
        self.total_population = total;
        self.push_broadcast(ServerMessage::Population {
            world: self.player_count,
            total,
        });
    }
}
