use std::collections::BTreeSet;

use ids::EntityId;
use rand::Rng;
use space::GridPos;

use crate::kinds::Kind;

/// Attempts at sampling a free tile before giving up.
const MAX_SAMPLING_ATTEMPTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AreaId(pub usize);

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "A{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AreaKind {
    /// Keeps `capacity` mobs of one kind alive, respawning the dead.
    Roaming { mob: Kind },
    /// Its mobs stay dead; clearing them spawns a chest.
    Chest { chest: GridPos, items: Vec<Kind> },
}

/// A rectangle of the map owning a population of mobs. Membership is the set
/// of its living mobs; the area only learns about deaths and respawns.
#[derive(Debug, Clone)]
pub struct Area {
    pub id: AreaId,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub kind: AreaKind,
    capacity: usize,
    members: BTreeSet<EntityId>,
    completely_respawned: bool,
}

impl Area {
    pub fn roaming(id: AreaId, x: i32, y: i32, width: i32, height: i32, mob: Kind, nb: usize) -> Self {
        Self::new(id, x, y, width, height, AreaKind::Roaming { mob }, nb)
    }

    pub fn chest(id: AreaId, x: i32, y: i32, width: i32, height: i32, chest: GridPos, items: Vec<Kind>) -> Self {
        Self::new(id, x, y, width, height, AreaKind::Chest { chest, items }, 0)
    }

    fn new(id: AreaId, x: i32, y: i32, width: i32, height: i32, kind: AreaKind, capacity: usize) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
            kind,
            capacity,
            members: BTreeSet::new(),
            completely_respawned: true,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn will_respawn(&self) -> bool {
        matches!(self.kind, AreaKind::Roaming { .. })
    }

    /// Chest-area semantics: the right and bottom edges are exclusive.
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.x && pos.y >= self.y && pos.x < self.x + self.width && pos.y < self.y + self.height
    }

    /// A tile inside the rectangle (edges inclusive) accepted by `is_valid`.
    pub fn random_position(&self, rng: &mut impl Rng, is_valid: impl Fn(GridPos) -> bool) -> Option<GridPos> {
        for _ in 0..MAX_SAMPLING_ATTEMPTS {
            let pos = GridPos::new(
                self.x + rng.gen_range(0..=self.width.max(0)),
                self.y + rng.gen_range(0..=self.height.max(0)),
            );
            if is_valid(pos) {
                return Some(pos);
            }
        }
        None
    }

    pub fn add_member(&mut self, mob: EntityId) {
        self.members.insert(mob);
        if self.is_full() {
            self.completely_respawned = true;
        }
    }

    /// Returns true on the transition to empty. It fires once, then only
    /// again after the area has been full.
    pub fn remove_member(&mut self, mob: EntityId) -> bool {
        if !self.members.remove(&mob) {
            return false;
        }
        if self.is_empty() && self.completely_respawned {
            self.completely_respawned = false;
            return true;
        }
        false
    }

    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    /// No living mob left.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        !self.is_empty() && self.members.len() == self.capacity
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn empty_transition_fires_once() {
        let mut area = Area::roaming(AreaId(0), 10, 10, 4, 4, Kind::Rat, 3);
        for id in 1..=3 {
            area.add_member(EntityId(id));
        }
        assert!(area.is_full());

        assert!(!area.remove_member(EntityId(1)));
        assert!(!area.remove_member(EntityId(2)));
        assert!(area.remove_member(EntityId(3)));
        assert!(area.is_empty());
        assert!(!area.remove_member(EntityId(3)));

        // partially refilled then emptied again: no second transition
        area.add_member(EntityId(1));
        assert!(!area.remove_member(EntityId(1)));

        for id in 1..=3 {
            area.add_member(EntityId(id));
        }
        for id in 1..=2 {
            area.remove_member(EntityId(id));
        }
        assert!(area.remove_member(EntityId(3)));
    }

    #[test]
    fn chest_area_bounds_are_half_open() {
        let area = Area::chest(AreaId(1), 10, 10, 3, 2, GridPos::new(11, 11), vec![Kind::Flask]);
        assert!(area.contains(GridPos::new(10, 10)));
        assert!(area.contains(GridPos::new(12, 11)));
        assert!(!area.contains(GridPos::new(13, 10)));
        assert!(!area.contains(GridPos::new(10, 12)));
        assert!(!area.will_respawn());
    }

    #[test]
    fn sampling_respects_validity() {
        let mut rng = StdRng::seed_from_u64(5);
        let area = Area::roaming(AreaId(0), 10, 10, 4, 4, Kind::Rat, 3);
        for _ in 0..50 {
            let pos = area.random_position(&mut rng, |p| p.x != 12).unwrap();
            assert!((10..=14).contains(&pos.x) && (10..=14).contains(&pos.y));
            assert_ne!(pos.x, 12);
        }
        assert_eq!(area.random_position(&mut rng, |_| false), None);
    }
}
