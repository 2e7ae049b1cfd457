use std::sync::Arc;

use ids::EntityId;
use space::GridPos;

use super::{World, WorldEvent, WorldTimer};
use crate::area::{Area, AreaId, AreaKind};
use crate::entity::{Body, Character, Entity, Item, ItemOrigin, Mob};
use crate::kinds::{Kind, Orientation};
use crate::properties;

fn item_kinds(codes: &[u32]) -> Vec<Kind> {
    codes
        .iter()
        .filter_map(|code| {
            let kind = Kind::from_code(*code).filter(|k| k.is_item());
            if kind.is_none() {
                tracing::warn!(code, "unknown chest item kind, ignored");
            }
            kind
        })
        .collect()
}

impl World {
    /// Create the areas and every entity the map places.
    pub(super) fn populate(&mut self) {
        let map = Arc::clone(&self.map);

        for spec in map.roaming_areas() {
            let Some(kind) = Kind::from_name(&spec.kind).filter(|k| k.is_mob()) else {
                tracing::warn!(area = spec.id, kind = %spec.kind, "roaming area with unknown mob kind, skipped");
                continue;
            };
            let id = AreaId(self.areas.len());
            self.areas.push(Area::roaming(
                id,
                spec.x,
                spec.y,
                spec.width,
                spec.height,
                kind,
                spec.nb as usize,
            ));
            for _ in 0..spec.nb {
                let pos = self.areas[id.0].random_position(&mut self.rng, |p| map.is_valid_position(p));
                match pos {
                    Some(pos) => {
                        self.spawn_mob(kind, pos, Some(id));
                    }
                    None => tracing::warn!(area = %id, "no free tile to spawn a mob"),
                }
            }
        }

        for spec in map.chest_areas() {
            let id = AreaId(self.areas.len());
            self.areas.push(Area::chest(
                id,
                spec.x,
                spec.y,
                spec.w,
                spec.h,
                GridPos::new(spec.tx, spec.ty),
                item_kinds(&spec.i),
            ));
        }

        for spec in map.static_chests() {
            let chest = Item::chest(ItemOrigin::Static, item_kinds(&spec.i));
            self.spawn_item(Kind::Chest, GridPos::new(spec.x, spec.y), chest);
        }

        for (pos, name) in map.static_entities() {
            match Kind::from_name(name) {
                Some(kind) if kind.is_npc() => {
                    self.spawn_npc(kind, *pos);
                }
                Some(kind) if kind.is_mob() => {
                    let area = self
                        .areas
                        .iter()
                        .find(|a| matches!(a.kind, AreaKind::Chest { .. }) && a.contains(*pos))
                        .map(|a| a.id);
                    self.spawn_mob(kind, *pos, area);
                }
                Some(kind) if kind.is_item() => {
                    self.spawn_item(kind, *pos, Item::new(ItemOrigin::Static));
                }
                _ => tracing::warn!(%pos, kind = %name, "unknown static entity, skipped"),
            }
        }

        for area in &mut self.areas {
            if !area.will_respawn() {
                let count = area.members().count();
                area.set_capacity(count);
            }
        }
    }

    pub(super) fn spawn_mob(&mut self, kind: Kind, pos: GridPos, area: Option<AreaId>) -> Option<EntityId> {
        let props = properties::mob_properties(kind)?;
        let id = self.allocator.allocate();
        let orientation = Orientation::random(&mut self.rng).code();
        let mob = Mob::new(
            Character::new(orientation, props.hit_points),
            pos,
            props.armor,
            props.weapon,
            area,
        );
        self.entities.insert(Entity::new(id, kind, pos, Body::Mob(mob)));
        if let Some(area) = area.and_then(|a| self.areas.get_mut(a.0)) {
            area.add_member(id);
        }
        self.update_membership(id);
        Some(id)
    }

    pub(super) fn spawn_npc(&mut self, kind: Kind, pos: GridPos) -> EntityId {
        let id = self.allocator.allocate();
        self.entities.insert(Entity::new(id, kind, pos, Body::Npc));
        self.update_membership(id);
        id
    }

    /// Add an item. Anything but a static item starts its despawn countdown.
    pub(super) fn spawn_item(&mut self, kind: Kind, pos: GridPos, item: Item) -> EntityId {
        let id = self.allocator.allocate();
        let despawns = !item.is_static();
        self.entities.insert(Entity::new(id, kind, pos, Body::Item(item)));
        self.update_membership(id);
        if despawns {
            self.schedule(super::ITEM_BLINK_DELAY_MS, WorldTimer::ItemBlink { item: id });
        }
        id
    }

    /// Take a live entity out of the world: cancel its timers, unlink every
    /// attack and hate relation, and drop it from the zones.
    pub(super) fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        if !self.entities.contains(id) {
            return None;
        }
        self.cancel_timers_of(id);
        self.entities.clear_target(id);
        self.entities.detach_attackers(id);

        let haters: Vec<EntityId> = self
            .entities
            .get(id)
            .and_then(Entity::as_player)
            .map(|p| p.haters.iter().copied().collect())
            .unwrap_or_default();
        for mob in haters {
            self.mob_forget(mob, id, super::MOB_RETURN_DELAY_MS);
        }
        let hated: Vec<EntityId> = self
            .entities
            .get(id)
            .and_then(Entity::as_mob)
            .map(Mob::haters)
            .unwrap_or_default();
        for player in hated {
            if let Some(p) = self.entities.get_mut(player).and_then(Entity::as_player_mut) {
                p.haters.remove(&id);
            }
        }

        self.groups.remove(self.map.layout(), id);
        self.entities.remove(id)
    }

    /// Remove an item; static ones come back later.
    pub(super) fn remove_item(&mut self, id: EntityId) {
        let Some(entity) = self.remove_entity(id) else {
            return;
        };
        if entity.as_item().is_some_and(Item::is_static) {
            self.entities.put_dormant(entity);
            self.schedule(
                super::STATIC_ITEM_RESPAWN_DELAY_MS,
                WorldTimer::StaticItemRespawn { item: id },
            );
        }
    }

    /// Hand a dead mob back to its area. Roaming-area mobs wait for their
    /// respawn; the others are gone for good.
    pub(super) fn retire_mob(&mut self, mut entity: Entity) {
        let id = entity.id;
        let max = properties::mob_hit_points(entity.kind);
        let area = match entity.as_mob_mut() {
            Some(mob) => {
                mob.forget_everyone();
                mob.character.reset_hit_points(max);
                let spawn = mob.spawn;
                let area = mob.area;
                entity.pos = spawn;
                area
            }
            None => return,
        };

        let Some(area) = area.and_then(|a| self.areas.get_mut(a.0)) else {
            tracing::debug!(world = %self.id, mob = %id, "mob without area will not respawn");
            return;
        };
        let area_id = area.id;
        let respawns = area.will_respawn();
        if area.remove_member(id) {
            self.events.publish(WorldEvent::AreaEmptied { area: area_id });
        }
        if respawns {
            self.entities.put_dormant(entity);
            self.schedule(super::MOB_RESPAWN_DELAY_MS, WorldTimer::MobRespawn { mob: id });
        }
    }

    pub(super) fn respawn_mob(&mut self, id: EntityId) {
        let Some(mut entity) = self.entities.take_dormant(id) else {
            return;
        };
        let map = Arc::clone(&self.map);
        let area = entity.as_mob().and_then(|m| m.area);
        let pos = area
            .and_then(|a| self.areas.get(a.0))
            .and_then(|a| a.random_position(&mut self.rng, |p| map.is_valid_position(p)))
            .unwrap_or(entity.pos);
        entity.pos = pos;
        self.entities.insert(entity);
        if let Some(area) = area.and_then(|a| self.areas.get_mut(a.0)) {
            area.add_member(id);
        }
        self.update_membership(id);
        tracing::debug!(world = %self.id, mob = %id, %pos, "mob respawned");
    }

    pub(super) fn respawn_static_item(&mut self, id: EntityId) {
        let Some(entity) = self.entities.take_dormant(id) else {
            return;
        };
        self.entities.insert(entity);
        self.update_membership(id);
    }

    pub(super) fn on_area_emptied(&mut self, area: AreaId) {
        let Some(AreaKind::Chest { chest, items }) = self.areas.get(area.0).map(|a| a.kind.clone()) else {
            return;
        };
        let id = self.spawn_item(Kind::Chest, chest, Item::chest(ItemOrigin::Reward, items));
        tracing::info!(world = %self.id, %area, chest = %id, %chest, "area cleared, chest spawned");
    }
}
