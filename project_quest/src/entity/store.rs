use std::collections::BTreeMap;

use ids::EntityId;

use crate::entity::{Character, Entity};

/// Live entities plus the dormant ones waiting to come back (dead mobs,
/// taken static items, dead players). Dormant entities are invisible to
/// lookups through `get`.
#[derive(Debug, Default)]
pub struct EntityStore {
    live: BTreeMap<EntityId, Entity>,
    dormant: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) {
        self.dormant.remove(&entity.id);
        self.live.insert(entity.id, entity);
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.live.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.live.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.live.remove(&id)
    }

    pub fn put_dormant(&mut self, entity: Entity) {
        self.dormant.insert(entity.id, entity);
    }

    pub fn take_dormant(&mut self, id: EntityId) -> Option<Entity> {
        self.dormant.remove(&id)
    }

    pub fn dormant(&self, id: EntityId) -> Option<&Entity> {
        self.dormant.get(&id)
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.live.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.live.values()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn character_mut(&mut self, id: EntityId) -> Option<&mut Character> {
        self.live.get_mut(&id).and_then(Entity::character_mut)
    }

    pub fn target_of(&self, id: EntityId) -> Option<EntityId> {
        self.get(id)
            .and_then(Entity::character)
            .and_then(|c| c.target)
    }

    pub fn attackers_of(&self, id: EntityId) -> Vec<EntityId> {
        self.get(id)
            .and_then(Entity::character)
            .map(|c| c.attackers.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Point `attacker` at `target`, dropping any previous link first.
    /// Both must be live characters.
    pub fn create_attack_link(&mut self, attacker: EntityId, target: EntityId) -> bool {
        if attacker == target {
            return false;
        }
        let both = self.get(attacker).and_then(Entity::character).is_some()
            && self.get(target).and_then(Entity::character).is_some();
        if !both {
            return false;
        }
        self.clear_target(attacker);
        if let Some(c) = self.character_mut(attacker) {
            c.target = Some(target);
        }
        if let Some(c) = self.character_mut(target) {
            c.attackers.insert(attacker);
        }
        true
    }

    /// Drop `attacker`'s target and the matching attackers entry.
    pub fn clear_target(&mut self, attacker: EntityId) -> Option<EntityId> {
        let old = self.character_mut(attacker).and_then(|c| c.target.take())?;
        if let Some(c) = self.character_mut(old) {
            c.attackers.remove(&attacker);
        }
        Some(old)
    }

    /// Clear the target of everyone attacking `target`. Returns them.
    pub fn detach_attackers(&mut self, target: EntityId) -> Vec<EntityId> {
        let attackers = match self.character_mut(target) {
            Some(c) => std::mem::take(&mut c.attackers),
            None => return Vec::new(),
        };
        for attacker in &attackers {
            if let Some(c) = self.character_mut(*attacker) {
                if c.target == Some(target) {
                    c.target = None;
                }
            }
        }
        attackers.into_iter().collect()
    }

    /// Every target has the attacker listed and every listed attacker
    /// targets back.
    pub fn attack_links_consistent(&self) -> bool {
        self.live.values().all(|entity| {
            let Some(c) = entity.character() else {
                return true;
            };
            let forward = c.target.map_or(true, |t| {
                self.get(t)
                    .and_then(Entity::character)
                    .is_some_and(|tc| tc.attackers.contains(&entity.id))
            });
            let backward = c.attackers.iter().all(|a| self.target_of(*a) == Some(entity.id));
            forward && backward
        })
    }
}
