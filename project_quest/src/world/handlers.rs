use ids::EntityId;
use net::{ClientMessage, Connection, Frame, ProtocolError, ServerMessage};
use session::{SessionId, SessionState};
use space::GridPos;

use super::{World, WorldEvent, WorldTimer};
use crate::entity::player::{starting_armor, starting_weapon};
use crate::entity::{Body, Entity, Item, ItemOrigin, Player};
use crate::kinds::{Kind, Orientation};
use crate::text;

const FLASK_HEAL: i32 = 40;
const BURGER_HEAL: i32 = 100;

impl World {
    /// A transport accepted a client. It gets `go` and must say HELLO next.
    pub fn connect(&mut self, session_id: SessionId, mut connection: Box<dyn Connection>) {
        self.sessions.create_session_with_id(session_id, self.now_ms);
        connection.send_utf8("go");
        self.connections.insert(session_id, connection);
        tracing::info!(world = %self.id, %session_id, "connection accepted");
    }

    /// Apply one decoded client message. Protocol violations close the
    /// connection; references to unknown entities are ignored.
    pub fn handle_message(&mut self, session_id: SessionId, message: Result<ClientMessage, ProtocolError>) {
        let Some(state) = self.sessions.state(session_id) else {
            tracing::debug!(world = %self.id, %session_id, "message for unknown session");
            return;
        };
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(world = %self.id, %session_id, %err, "malformed message");
                self.close_session(session_id, &err.to_string());
                return;
            }
        };

        let is_hello = matches!(message, ClientMessage::Hello { .. });
        match state {
            SessionState::Disconnected => return,
            SessionState::AwaitingHello if !is_hello => {
                let reason = format!("Invalid handshake message: {}", message.kind());
                self.close_session(session_id, &reason);
                return;
            }
            _ if is_hello && !state.accepts_hello() => {
                self.close_session(session_id, "Cannot initiate handshake twice");
                return;
            }
            _ if !is_hello && !state.is_alive() => {
                self.sessions.touch(session_id, self.now_ms);
                tracing::debug!(world = %self.id, %session_id, kind = %message.kind(), "ignored while dead");
                return;
            }
            _ => {}
        }
        self.sessions.touch(session_id, self.now_ms);

        if let ClientMessage::Hello { name, armor, weapon } = message {
            self.on_hello(session_id, &name, armor, weapon);
        } else if let Some(player) = self.player_entity(session_id) {
            self.on_command(player, message);
        }
        self.dispatch_policies();
    }

    /// The transport reported the socket closed.
    pub fn disconnect(&mut self, session_id: SessionId) {
        if !self.has_session(session_id) {
            return;
        }
        tracing::info!(world = %self.id, %session_id, "connection closed");
        self.drop_session(session_id);
        self.dispatch_policies();
    }

    /// Close from our side with a diagnostic, then clean up.
    pub fn close_session(&mut self, session_id: SessionId, reason: &str) {
        if let Some(conn) = self.connections.get_mut(&session_id) {
            conn.close(reason);
        }
        tracing::info!(world = %self.id, %session_id, reason, "closing session");
        self.drop_session(session_id);
    }

    pub fn close_all(&mut self, reason: &str) {
        for session_id in self.sessions.all_session_ids() {
            self.close_session(session_id, reason);
        }
        self.dispatch_policies();
    }

    fn drop_session(&mut self, session_id: SessionId) {
        let entity = self.sessions.disconnect(session_id);
        self.sessions.remove_session(session_id);
        self.connections.remove(&session_id);

        if let Some(player) = entity {
            if self.entities.contains(player) {
                self.handle_player_vanish(player);
                self.push_around(player, ServerMessage::Despawn { id: player }, Some(player));
                self.remove_entity(player);
            } else {
                self.entities.take_dormant(player);
            }
            self.player_count = self.player_count.saturating_sub(1);
            self.events.publish(WorldEvent::PlayerLeft { player, session_id });
        }
        self.outbox.close(session_id);
    }

    fn on_hello(&mut self, session_id: SessionId, name: &str, armor: i64, weapon: i64) {
        let name = text::player_name(name);
        let armor = starting_armor(armor);
        let weapon = starting_weapon(weapon);
        let orientation = Orientation::random(&mut self.rng).code();

        let (id, last_checkpoint, first_entry) = match self.player_entity(session_id) {
            Some(id) => {
                if self.entities.contains(id) {
                    self.remove_entity(id);
                }
                let checkpoint = self
                    .entities
                    .take_dormant(id)
                    .and_then(|e| e.as_player().and_then(|p| p.last_checkpoint));
                (id, checkpoint, false)
            }
            None => (self.allocator.allocate(), None, true),
        };

        let pos = self.entering_position(last_checkpoint);
        let mut player = Player::new(session_id, name.clone(), armor, weapon, orientation);
        player.last_checkpoint = last_checkpoint;
        let hit_points = player.character.hit_points;

        self.entities
            .insert(Entity::new(id, Kind::Warrior, pos, Body::Player(player)));
        self.sessions.bind_entity(session_id, id, name.clone());
        if first_entry {
            self.outbox.open(session_id);
            self.player_count += 1;
        }

        self.push_to_player(
            id,
            ServerMessage::Population {
                world: self.player_count,
                total: self.total_population.max(self.player_count),
            },
        );
        if !self.update_membership(id) {
            self.push_entity_list(id);
        }
        if first_entry {
            self.events.publish(WorldEvent::PlayerEntered { player: id, session_id });
        }

        if let Some(conn) = self.connections.get_mut(&session_id) {
            conn.send(&Frame::single(ServerMessage::Welcome {
                id,
                name: name.clone(),
                x: pos.x,
                y: pos.y,
                hit_points,
            }));
        }
        tracing::info!(world = %self.id, %session_id, player = %id, %name, %pos, "player entered the game");
    }

    /// Inside the last checkpoint, else in a starting area.
    fn entering_position(&mut self, checkpoint: Option<u64>) -> GridPos {
        let from_checkpoint = checkpoint
            .and_then(|id| self.map.checkpoint(id))
            .map(|cp| cp.random_position(&mut self.rng));
        if let Some(pos) = from_checkpoint {
            return pos;
        }
        match self.map.random_starting_position(&mut self.rng) {
            Some(pos) => pos,
            None => {
                tracing::warn!(world = %self.id, "map has no starting area");
                GridPos::new(1, 1)
            }
        }
    }

    fn on_command(&mut self, player: EntityId, message: ClientMessage) {
        match message {
            ClientMessage::Hello { .. } => {
                tracing::debug!(world = %self.id, %player, "handshake already complete");
            }
            ClientMessage::Who { ids } => {
                for id in ids {
                    match self.entities.get(id).map(Entity::spawn_state) {
                        Some(state) => self.push_to_player(player, ServerMessage::Spawn(state)),
                        None => tracing::debug!(world = %self.id, %id, "WHO for unknown entity"),
                    }
                }
            }
            ClientMessage::Zone => {
                if !self.update_membership(player) {
                    self.push_entity_list(player);
                }
            }
            ClientMessage::Chat { text } => {
                let Some(text) = text::chat_line(&text) else {
                    return;
                };
                if let Some(zone) = self.groups.zone_of(player) {
                    tracing::debug!(world = %self.id, %player, %text, "chat");
                    self.push_to_zone(zone, &ServerMessage::Chat { id: player, text }, None);
                }
            }
            ClientMessage::Move { x, y } => self.on_move(player, GridPos::new(x, y)),
            ClientMessage::LootMove { x, y, item } => self.on_loot_move(player, GridPos::new(x, y), item),
            ClientMessage::Aggro { mob } => self.handle_mob_hate(mob, player, super::AGGRO_HATE),
            ClientMessage::Attack { mob } => self.on_attack(player, mob),
            ClientMessage::Hit { mob } => self.hit_mob(player, mob),
            ClientMessage::Hurt { mob } => self.hurt_player(player, mob),
            ClientMessage::Loot { item } => self.on_loot(player, item),
            ClientMessage::Teleport { x, y } => self.on_teleport(player, GridPos::new(x, y)),
            ClientMessage::Open { chest } => self.on_open(chest),
            ClientMessage::Check { checkpoint } => self.on_check(player, checkpoint),
        }
    }

    fn on_move(&mut self, player: EntityId, pos: GridPos) {
        if !self.map.is_valid_position(pos) {
            tracing::debug!(world = %self.id, %player, %pos, "move to invalid position");
            return;
        }
        self.entities.clear_target(player);
        self.push_around(player, ServerMessage::Move { id: player, x: pos.x, y: pos.y }, Some(player));
        self.relocate(player, pos);
        self.follow_player(player);
    }

    fn on_loot_move(&mut self, player: EntityId, pos: GridPos, item: EntityId) {
        if !self.map.is_valid_position(pos) {
            return;
        }
        if self.entities.get(item).and_then(Entity::as_item).is_none() {
            tracing::debug!(world = %self.id, %item, "loot move toward unknown item");
            return;
        }
        self.entities.clear_target(player);
        self.push_around(player, ServerMessage::LootMove { id: player, item }, Some(player));
        self.relocate(player, pos);
        self.follow_player(player);
    }

    fn on_attack(&mut self, player: EntityId, mob: EntityId) {
        if !self.entities.get(mob).is_some_and(Entity::is_mob) {
            tracing::debug!(world = %self.id, %mob, "attack on unknown mob");
            return;
        }
        self.entities.create_attack_link(player, mob);
        self.push_around(
            player,
            ServerMessage::Attack {
                attacker: player,
                target: Some(mob),
            },
            Some(player),
        );
    }

    fn on_loot(&mut self, player: EntityId, item: EntityId) {
        let Some(kind) = self
            .entities
            .get(item)
            .filter(|e| e.as_item().is_some() && e.kind.is_item())
            .map(|e| e.kind)
        else {
            tracing::debug!(world = %self.id, %item, "loot of unknown item");
            return;
        };
        self.push_around(player, ServerMessage::Despawn { id: item }, Some(player));
        self.remove_item(item);

        match kind {
            Kind::Firepotion => {
                let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) else {
                    return;
                };
                p.update_hit_points();
                let max = p.character.max_hit_points;
                self.push_around(
                    player,
                    ServerMessage::Equip {
                        id: player,
                        kind: Kind::Firefox.code(),
                    },
                    Some(player),
                );
                self.timers
                    .cancel_where(|t| *t == WorldTimer::FirepotionExpire { player });
                self.schedule(super::FIREPOTION_DURATION_MS, WorldTimer::FirepotionExpire { player });
                self.push_to_player(player, ServerMessage::HitPoints { max });
            }
            Kind::Flask | Kind::Burger => {
                let amount = if kind == Kind::Flask { FLASK_HEAL } else { BURGER_HEAL };
                let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) else {
                    return;
                };
                if p.character.has_full_health() {
                    return;
                }
                p.character.regen_by(amount);
                let points = p.character.hit_points;
                self.push_to_player(player, ServerMessage::Health { points, regen: false });
            }
            kind if kind.is_armor() || kind.is_weapon() => {
                let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) else {
                    return;
                };
                let max = if kind.is_armor() {
                    p.equip_armor(kind);
                    Some(p.character.max_hit_points)
                } else {
                    p.equip_weapon(kind);
                    None
                };
                if let Some(max) = max {
                    self.push_to_player(player, ServerMessage::HitPoints { max });
                }
                self.push_around(
                    player,
                    ServerMessage::Equip {
                        id: player,
                        kind: kind.code(),
                    },
                    Some(player),
                );
            }
            _ => {}
        }
    }

    fn on_teleport(&mut self, player: EntityId, pos: GridPos) {
        if !self.map.is_valid_position(pos) {
            tracing::debug!(world = %self.id, %player, %pos, "teleport to invalid position");
            return;
        }
        self.entities.clear_target(player);
        self.push_around(player, ServerMessage::Teleport { id: player, x: pos.x, y: pos.y }, Some(player));
        self.handle_player_vanish(player);
        if !self.relocate(player, pos) {
            self.push_entity_list(player);
        }
    }

    fn on_open(&mut self, chest: EntityId) {
        let Some((pos, item)) = self
            .entities
            .get(chest)
            .filter(|e| e.kind.is_chest())
            .and_then(|e| e.as_item().map(|i| (e.pos, i.clone())))
        else {
            tracing::debug!(world = %self.id, %chest, "open of unknown chest");
            return;
        };
        self.push_around(chest, ServerMessage::Despawn { id: chest }, None);
        self.remove_item(chest);
        if let Some(kind) = item.random_content(&mut self.rng) {
            let id = self.spawn_item(kind, pos, Item::new(ItemOrigin::Reward));
            tracing::debug!(world = %self.id, %chest, item = %id, %kind, "chest opened");
        }
    }

    fn on_check(&mut self, player: EntityId, checkpoint: u64) {
        if self.map.checkpoint(checkpoint).is_none() {
            tracing::debug!(world = %self.id, checkpoint, "unknown checkpoint");
            return;
        }
        if let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) {
            p.last_checkpoint = Some(checkpoint);
        }
    }
}
