use std::collections::BTreeSet;

use ids::EntityId;
use session::SessionId;

use crate::entity::character::Character;
use crate::formulas;
use crate::kinds::Kind;
use crate::properties;

#[derive(Debug, Clone)]
pub struct Player {
    pub character: Character,
    pub session_id: SessionId,
    pub name: String,
    pub armor: Kind,
    pub weapon: Kind,
    pub armor_level: i32,
    pub weapon_level: i32,
    pub last_checkpoint: Option<u64>,
    /// Mobs holding this player on their hate list.
    pub haters: BTreeSet<EntityId>,
}

impl Player {
    pub fn new(session_id: SessionId, name: String, armor: Kind, weapon: Kind, orientation: u8) -> Self {
        let armor_level = properties::armor_level(armor);
        Self {
            character: Character::new(orientation, formulas::hp(armor_level)),
            session_id,
            name,
            armor,
            weapon,
            armor_level,
            weapon_level: properties::weapon_level(weapon),
            last_checkpoint: None,
            haters: BTreeSet::new(),
        }
    }

    /// Equip armor and reset hit points to the new maximum.
    pub fn equip_armor(&mut self, kind: Kind) {
        self.armor = kind;
        self.armor_level = properties::armor_level(kind);
        self.update_hit_points();
    }

    pub fn equip_weapon(&mut self, kind: Kind) {
        self.weapon = kind;
        self.weapon_level = properties::weapon_level(kind);
    }

    pub fn update_hit_points(&mut self) {
        self.character.reset_hit_points(formulas::hp(self.armor_level));
    }
}

/// Armor a HELLO may claim; anything else falls back to cloth.
pub fn starting_armor(code: i64) -> Kind {
    u32::try_from(code)
        .ok()
        .and_then(Kind::from_code)
        .filter(|k| k.armor_rank().is_some())
        .unwrap_or(Kind::ClothArmor)
}

/// Weapon a HELLO may claim; anything else falls back to the first sword.
pub fn starting_weapon(code: i64) -> Kind {
    u32::try_from(code)
        .ok()
        .and_then(Kind::from_code)
        .filter(|k| k.is_weapon())
        .unwrap_or(Kind::Sword1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_points_follow_armor() {
        let mut p = Player::new(SessionId(1), "bob".into(), Kind::ClothArmor, Kind::Sword1, 2);
        assert_eq!(p.character.max_hit_points, 80);
        assert_eq!(p.weapon_level, 1);

        p.character.take_damage(50);
        p.equip_armor(Kind::MailArmor);
        assert_eq!(p.armor_level, 3);
        assert_eq!(p.character.max_hit_points, 140);
        assert_eq!(p.character.hit_points, 140);

        p.equip_weapon(Kind::Axe);
        assert_eq!(p.weapon_level, 3);
    }

    #[test]
    fn hello_equipment_is_validated() {
        assert_eq!(starting_armor(23), Kind::MailArmor);
        assert_eq!(starting_armor(20), Kind::ClothArmor);
        assert_eq!(starting_armor(60), Kind::ClothArmor);
        assert_eq!(starting_armor(-1), Kind::ClothArmor);
        assert_eq!(starting_weapon(65), Kind::Axe);
        assert_eq!(starting_weapon(2), Kind::Sword1);
    }
}
