use std::collections::BTreeSet;

use ids::EntityId;

/// State shared by players and mobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub orientation: u8,
    pub hit_points: i32,
    pub max_hit_points: i32,
    /// Only changed through the store's attack-link operations.
    pub target: Option<EntityId>,
    pub attackers: BTreeSet<EntityId>,
}

impl Character {
    pub fn new(orientation: u8, max_hit_points: i32) -> Self {
        Self {
            orientation,
            hit_points: max_hit_points,
            max_hit_points,
            target: None,
            attackers: BTreeSet::new(),
        }
    }

    pub fn reset_hit_points(&mut self, max_hit_points: i32) {
        self.max_hit_points = max_hit_points;
        self.hit_points = max_hit_points;
    }

    pub fn has_full_health(&self) -> bool {
        self.hit_points >= self.max_hit_points
    }

    pub fn regen_by(&mut self, amount: i32) {
        self.hit_points = (self.hit_points + amount).min(self.max_hit_points);
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hit_points -= amount;
    }

    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }

    /// Coarse regeneration amount.
    pub fn regen_amount(&self) -> i32 {
        self.max_hit_points / 25
    }
}
