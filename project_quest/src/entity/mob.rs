use ids::EntityId;
use space::GridPos;

use crate::area::AreaId;
use crate::entity::character::Character;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HateEntry {
    pub player: EntityId,
    pub hate: i32,
}

#[derive(Debug, Clone)]
pub struct Mob {
    pub character: Character,
    /// Where the mob first appeared. Returns and deaths reset to it.
    pub spawn: GridPos,
    pub armor_level: i32,
    pub weapon_level: i32,
    pub area: Option<AreaId>,
    hate_list: Vec<HateEntry>,
}

impl Mob {
    pub fn new(
        character: Character,
        spawn: GridPos,
        armor_level: i32,
        weapon_level: i32,
        area: Option<AreaId>,
    ) -> Self {
        Self {
            character,
            spawn,
            armor_level,
            weapon_level,
            area,
            hate_list: Vec::new(),
        }
    }

    pub fn hates(&self, player: EntityId) -> bool {
        self.hate_list.iter().any(|e| e.player == player)
    }

    pub fn increase_hate(&mut self, player: EntityId, points: i32) {
        match self.hate_list.iter_mut().find(|e| e.player == player) {
            Some(entry) => entry.hate += points,
            None => self.hate_list.push(HateEntry { player, hate: points }),
        }
    }

    /// The `rank`-th most hated player, 1 being the most hated. Equal scores
    /// rank the most recently added entry higher. `None` when fewer than
    /// `rank` players are hated.
    pub fn hated_player(&self, rank: usize) -> Option<EntityId> {
        if rank == 0 || rank > self.hate_list.len() {
            return None;
        }
        let mut sorted = self.hate_list.clone();
        sorted.sort_by_key(|e| e.hate);
        sorted.get(sorted.len() - rank).map(|e| e.player)
    }

    /// Returns true when the hate list just became empty.
    pub fn forget_player(&mut self, player: EntityId) -> bool {
        let before = self.hate_list.len();
        self.hate_list.retain(|e| e.player != player);
        before != self.hate_list.len() && self.hate_list.is_empty()
    }

    pub fn forget_everyone(&mut self) -> Vec<EntityId> {
        self.hate_list.drain(..).map(|e| e.player).collect()
    }

    pub fn hate_list(&self) -> &[HateEntry] {
        &self.hate_list
    }

    pub fn haters(&self) -> Vec<EntityId> {
        self.hate_list.iter().map(|e| e.player).collect()
    }
}
