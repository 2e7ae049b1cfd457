pub mod character;
pub mod item;
pub mod mob;
pub mod player;
pub mod store;

use ids::EntityId;
use net::{SpawnDetail, SpawnState};
use space::{GridPos, MemberKind};

use crate::kinds::Kind;

pub use character::Character;
pub use item::{Item, ItemOrigin};
pub use mob::{HateEntry, Mob};
pub use player::Player;
pub use store::EntityStore;

#[derive(Debug, Clone)]
pub enum Body {
    Player(Player),
    Mob(Mob),
    Npc,
    Item(Item),
}

/// Anything with an id and a tile.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub kind: Kind,
    pub pos: GridPos,
    pub body: Body,
}

impl Entity {
    pub fn new(id: EntityId, kind: Kind, pos: GridPos, body: Body) -> Self {
        Self { id, kind, pos, body }
    }

    pub fn character(&self) -> Option<&Character> {
        match &self.body {
            Body::Player(p) => Some(&p.character),
            Body::Mob(m) => Some(&m.character),
            _ => None,
        }
    }

    pub fn character_mut(&mut self) -> Option<&mut Character> {
        match &mut self.body {
            Body::Player(p) => Some(&mut p.character),
            Body::Mob(m) => Some(&mut m.character),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&Player> {
        match &self.body {
            Body::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut Player> {
        match &mut self.body {
            Body::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_mob(&self) -> Option<&Mob> {
        match &self.body {
            Body::Mob(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mob_mut(&mut self) -> Option<&mut Mob> {
        match &mut self.body {
            Body::Mob(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match &self.body {
            Body::Item(i) => Some(i),
            _ => None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.body, Body::Player(_))
    }

    pub fn is_mob(&self) -> bool {
        matches!(self.body, Body::Mob(_))
    }

    /// How the entity takes part in zone bookkeeping.
    pub fn member_kind(&self) -> MemberKind {
        match &self.body {
            Body::Player(_) => MemberKind::PLAYER,
            Body::Item(item) if item.origin == ItemOrigin::Dropped => MemberKind::SILENT,
            _ => MemberKind::OTHER,
        }
    }

    pub fn spawn_state(&self) -> SpawnState {
        let detail = match &self.body {
            Body::Player(p) => SpawnDetail::Player {
                name: p.name.clone(),
                orientation: p.character.orientation,
                armor: p.armor.code(),
                weapon: p.weapon.code(),
                target: p.character.target,
            },
            Body::Mob(m) => SpawnDetail::Character {
                orientation: m.character.orientation,
                target: m.character.target,
            },
            Body::Npc | Body::Item(_) => SpawnDetail::Plain,
        };
        SpawnState {
            id: self.id,
            kind: self.kind.code(),
            x: self.pos.x,
            y: self.pos.y,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use session::SessionId;

    use super::*;

    #[test]
    fn spawn_state_per_body() {
        let player = Entity::new(
            EntityId(4),
            Kind::Warrior,
            GridPos::new(3, 7),
            Body::Player(Player::new(
                SessionId(1),
                "ann".into(),
                Kind::LeatherArmor,
                Kind::Axe,
                3,
            )),
        );
        assert_eq!(
            player.spawn_state().detail,
            SpawnDetail::Player {
                name: "ann".into(),
                orientation: 3,
                armor: 22,
                weapon: 65,
                target: None,
            }
        );
        assert_eq!(player.member_kind(), MemberKind::PLAYER);

        let drop = Entity::new(
            EntityId(5),
            Kind::Flask,
            GridPos::new(1, 1),
            Body::Item(Item::new(ItemOrigin::Dropped)),
        );
        assert_eq!(drop.spawn_state().detail, SpawnDetail::Plain);
        assert_eq!(drop.spawn_state().kind, 35);
        assert_eq!(drop.member_kind(), MemberKind::SILENT);

        let npc = Entity::new(EntityId(6), Kind::Guard, GridPos::new(2, 2), Body::Npc);
        assert!(npc.character().is_none());
        assert_eq!(npc.member_kind(), MemberKind::OTHER);
    }
}
