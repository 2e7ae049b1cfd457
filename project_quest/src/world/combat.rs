use ids::EntityId;
use net::ServerMessage;
use rand::Rng;
use space::GridPos;

use super::{World, WorldEvent, WorldTimer};
use crate::entity::{Entity, Item, ItemOrigin};
use crate::formulas;
use crate::properties;

impl World {
    fn is_live_player(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(Entity::is_player)
    }

    fn is_live_mob(&self, id: EntityId) -> bool {
        self.entities.get(id).is_some_and(Entity::is_mob)
    }

    /// A random free tile orthogonally next to `target`.
    pub(super) fn find_position_next_to(&mut self, target: EntityId) -> Option<GridPos> {
        let pos = self.entities.get(target)?.pos;
        let candidates = pos.neighbours();
        let start = self.rng.gen_range(0..candidates.len());
        (0..candidates.len())
            .map(|i| candidates[(start + i) % candidates.len()])
            .find(|p| self.map.is_valid_position(*p))
    }

    /// Move a mob and tell everyone who could see it.
    pub(super) fn move_mob(&mut self, mob: EntityId, pos: GridPos) {
        if !self.is_live_mob(mob) {
            return;
        }
        self.push_around(mob, ServerMessage::Move { id: mob, x: pos.x, y: pos.y }, None);
        self.relocate(mob, pos);
    }

    pub(super) fn handle_mob_hate(&mut self, mob: EntityId, player: EntityId, points: i32) {
        if !self.is_live_mob(mob) || !self.is_live_player(player) {
            return;
        }
        self.timers
            .cancel_where(|t| *t == WorldTimer::MobReturn { mob });
        let mut alive = false;
        if let Some(m) = self.entities.get_mut(mob).and_then(Entity::as_mob_mut) {
            m.increase_hate(player, points);
            alive = m.character.is_alive();
        }
        if let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) {
            p.haters.insert(mob);
        }
        if alive {
            self.choose_mob_target(mob);
        }
    }

    /// Engage the most hated living player unless already attacking it.
    pub(super) fn choose_mob_target(&mut self, mob: EntityId) {
        let Some(target) = self
            .entities
            .get(mob)
            .and_then(Entity::as_mob)
            .and_then(|m| m.hated_player(1))
        else {
            return;
        };
        if !self.is_live_player(target) || self.entities.target_of(mob) == Some(target) {
            return;
        }
        self.entities.create_attack_link(mob, target);
        self.push_around(
            mob,
            ServerMessage::Attack {
                attacker: mob,
                target: Some(target),
            },
            None,
        );
        if let Some(pos) = self.find_position_next_to(target) {
            self.move_mob(mob, pos);
        }
    }

    fn schedule_return(&mut self, mob: EntityId, delay_ms: u64) {
        self.timers
            .cancel_where(|t| *t == WorldTimer::MobReturn { mob });
        self.schedule(delay_ms, WorldTimer::MobReturn { mob });
    }

    /// Drop `player` from the mob's hate list. An emptied list makes the mob
    /// give up its target and head home after `delay_ms`.
    pub(super) fn mob_forget(&mut self, mob: EntityId, player: EntityId, delay_ms: u64) {
        let Some(m) = self.entities.get_mut(mob).and_then(Entity::as_mob_mut) else {
            return;
        };
        let emptied = m.forget_player(player);
        if let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) {
            p.haters.remove(&mob);
        }
        if emptied {
            self.entities.clear_target(mob);
            self.schedule_return(mob, delay_ms);
        }
    }

    fn mob_forget_everyone(&mut self, mob: EntityId) {
        let Some(m) = self.entities.get_mut(mob).and_then(Entity::as_mob_mut) else {
            return;
        };
        let players = m.forget_everyone();
        for player in players {
            if let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) {
                p.haters.remove(&mob);
            }
        }
        self.entities.clear_target(mob);
        self.schedule_return(mob, 1);
    }

    pub(super) fn return_to_spawn(&mut self, mob: EntityId) {
        let Some(spawn) = self.entities.get(mob).and_then(Entity::as_mob).map(|m| m.spawn) else {
            return;
        };
        self.entities.clear_target(mob);
        self.move_mob(mob, spawn);
    }

    /// Attackers of a moving player follow it, unless that drags them too far
    /// from home.
    pub(super) fn follow_player(&mut self, player: EntityId) {
        for mob in self.entities.attackers_of(player) {
            let Some(spawn) = self.entities.get(mob).and_then(Entity::as_mob).map(|m| m.spawn) else {
                continue;
            };
            let Some(pos) = self.find_position_next_to(player) else {
                continue;
            };
            if spawn.distance_to(pos) > super::MAX_CHASE_DISTANCE {
                tracing::debug!(world = %self.id, %mob, %player, "mob gives up the chase");
                self.mob_forget_everyone(mob);
            } else {
                self.move_mob(mob, pos);
            }
        }
    }

    /// The player died or teleported. Its attackers forget it and turn to
    /// the most hated player left, if any.
    pub(super) fn handle_player_vanish(&mut self, player: EntityId) {
        for mob in self.entities.attackers_of(player) {
            if !self.is_live_mob(mob) {
                continue;
            }
            self.entities.clear_target(mob);
            self.mob_forget(mob, player, super::VANISH_RETURN_DELAY_MS);
            self.choose_mob_target(mob);
        }
    }

    /// A player's blow landed on a mob.
    pub(super) fn hit_mob(&mut self, player: EntityId, mob: EntityId) {
        let Some(weapon) = self
            .entities
            .get(player)
            .and_then(Entity::as_player)
            .map(|p| p.weapon_level)
        else {
            return;
        };
        let Some(armor) = self
            .entities
            .get(mob)
            .and_then(Entity::as_mob)
            .filter(|m| m.character.is_alive())
            .map(|m| m.armor_level)
        else {
            tracing::debug!(world = %self.id, %mob, "hit on missing mob");
            return;
        };

        let damage = formulas::dmg(&mut self.rng, weapon, armor);
        if damage <= 0 {
            return;
        }
        let mut dead = false;
        if let Some(m) = self.entities.get_mut(mob).and_then(Entity::as_mob_mut) {
            m.character.take_damage(damage);
            dead = !m.character.is_alive();
        }
        self.handle_mob_hate(mob, player, damage);
        self.push_to_player(player, ServerMessage::Damage { id: mob, points: damage });
        if dead {
            self.kill_mob(mob, player);
        }
    }

    fn kill_mob(&mut self, mob: EntityId, killer: EntityId) {
        let Some((kind, pos, haters)) = self
            .entities
            .get(mob)
            .and_then(|e| e.as_mob().map(|m| (e.kind, e.pos, m.haters())))
        else {
            return;
        };

        self.push_to_player(killer, ServerMessage::Kill { kind: kind.code() });
        self.push_around(mob, ServerMessage::Despawn { id: mob }, None);

        let roll = self.rng.gen_range(0..100);
        if let Some(drop) = properties::roll_drop(kind, roll) {
            let item = self.spawn_item(drop, pos, Item::new(ItemOrigin::Dropped));
            self.push_around(
                mob,
                ServerMessage::Drop {
                    mob,
                    item,
                    kind: drop.code(),
                    haters,
                },
                None,
            );
        }

        self.events.publish(WorldEvent::MobKilled { mob, kind, killer });
        if let Some(entity) = self.remove_entity(mob) {
            self.retire_mob(entity);
        }
    }

    /// A mob's blow landed on the player.
    pub(super) fn hurt_player(&mut self, player: EntityId, mob: EntityId) {
        let Some(weapon) = self.entities.get(mob).and_then(Entity::as_mob).map(|m| m.weapon_level) else {
            tracing::debug!(world = %self.id, %mob, "hurt by missing mob");
            return;
        };
        let Some(armor) = self
            .entities
            .get(player)
            .and_then(Entity::as_player)
            .filter(|p| p.character.is_alive())
            .map(|p| p.armor_level)
        else {
            return;
        };

        let damage = formulas::dmg(&mut self.rng, weapon, armor);
        let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) else {
            return;
        };
        p.character.take_damage(damage);
        let points = p.character.hit_points;
        self.push_to_player(player, ServerMessage::Health { points, regen: false });
        if points <= 0 {
            self.kill_player(player);
        }
    }

    fn kill_player(&mut self, player: EntityId) {
        let Some(session_id) = self.entities.get(player).and_then(Entity::as_player).map(|p| p.session_id) else {
            return;
        };
        tracing::info!(world = %self.id, %player, "player died");
        self.handle_player_vanish(player);
        self.push_around(player, ServerMessage::Despawn { id: player }, None);
        if let Some(entity) = self.remove_entity(player) {
            self.entities.put_dormant(entity);
        }
        self.sessions.set_vitality(session_id, session::Vitality::Dead);
    }

    pub(super) fn expire_firepotion(&mut self, player: EntityId) {
        let Some(armor) = self.entities.get(player).and_then(Entity::as_player).map(|p| p.armor) else {
            return;
        };
        self.push_around(
            player,
            ServerMessage::Equip {
                id: player,
                kind: armor.code(),
            },
            Some(player),
        );
    }
}
