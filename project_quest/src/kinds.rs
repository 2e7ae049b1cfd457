use rand::Rng;

/// Every entity kind with its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum Kind {
    Warrior = 1,

    // Mobs
    Rat = 2,
    Skeleton = 3,
    Goblin = 4,
    Ogre = 5,
    Spectre = 6,
    Crab = 7,
    Bat = 8,
    Wizard = 9,
    Eye = 10,
    Snake = 11,
    Skeleton2 = 12,
    Boss = 13,
    DeathKnight = 14,

    // Armors
    Firefox = 20,
    ClothArmor = 21,
    LeatherArmor = 22,
    MailArmor = 23,
    PlateArmor = 24,
    RedArmor = 25,
    GoldenArmor = 26,

    // Objects
    Flask = 35,
    Burger = 36,
    Chest = 37,
    Firepotion = 38,
    Cake = 39,

    // NPCs
    Guard = 40,
    King = 41,
    Octocat = 42,
    VillageGirl = 43,
    Villager = 44,
    Priest = 45,
    Scientist = 46,
    Agent = 47,
    Rick = 48,
    Nyan = 49,
    Sorcerer = 50,
    BeachNpc = 51,
    ForestNpc = 52,
    DesertNpc = 53,
    LavaNpc = 54,
    Coder = 55,

    // Weapons
    Sword1 = 60,
    Sword2 = 61,
    RedSword = 62,
    GoldenSword = 63,
    MorningStar = 64,
    Axe = 65,
    BlueSword = 66,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Player,
    Mob,
    Npc,
    Armor,
    Weapon,
    Object,
}

const TABLE: [(Kind, &str, Category); 49] = [
    (Kind::Warrior, "warrior", Category::Player),
    (Kind::Rat, "rat", Category::Mob),
    (Kind::Skeleton, "skeleton", Category::Mob),
    (Kind::Goblin, "goblin", Category::Mob),
    (Kind::Ogre, "ogre", Category::Mob),
    (Kind::Spectre, "spectre", Category::Mob),
    (Kind::DeathKnight, "deathknight", Category::Mob),
    (Kind::Crab, "crab", Category::Mob),
    (Kind::Snake, "snake", Category::Mob),
    (Kind::Bat, "bat", Category::Mob),
    (Kind::Wizard, "wizard", Category::Mob),
    (Kind::Eye, "eye", Category::Mob),
    (Kind::Skeleton2, "skeleton2", Category::Mob),
    (Kind::Boss, "boss", Category::Mob),
    (Kind::Sword1, "sword1", Category::Weapon),
    (Kind::Sword2, "sword2", Category::Weapon),
    (Kind::Axe, "axe", Category::Weapon),
    (Kind::RedSword, "redsword", Category::Weapon),
    (Kind::BlueSword, "bluesword", Category::Weapon),
    (Kind::GoldenSword, "goldensword", Category::Weapon),
    (Kind::MorningStar, "morningstar", Category::Weapon),
    (Kind::Firefox, "firefox", Category::Armor),
    (Kind::ClothArmor, "clotharmor", Category::Armor),
    (Kind::LeatherArmor, "leatherarmor", Category::Armor),
    (Kind::MailArmor, "mailarmor", Category::Armor),
    (Kind::PlateArmor, "platearmor", Category::Armor),
    (Kind::RedArmor, "redarmor", Category::Armor),
    (Kind::GoldenArmor, "goldenarmor", Category::Armor),
    (Kind::Flask, "flask", Category::Object),
    (Kind::Cake, "cake", Category::Object),
    (Kind::Burger, "burger", Category::Object),
    (Kind::Chest, "chest", Category::Object),
    (Kind::Firepotion, "firepotion", Category::Object),
    (Kind::Guard, "guard", Category::Npc),
    (Kind::VillageGirl, "villagegirl", Category::Npc),
    (Kind::Villager, "villager", Category::Npc),
    (Kind::Coder, "coder", Category::Npc),
    (Kind::Scientist, "scientist", Category::Npc),
    (Kind::Priest, "priest", Category::Npc),
    (Kind::King, "king", Category::Npc),
    (Kind::Rick, "rick", Category::Npc),
    (Kind::Nyan, "nyan", Category::Npc),
    (Kind::Sorcerer, "sorcerer", Category::Npc),
    (Kind::Agent, "agent", Category::Npc),
    (Kind::Octocat, "octocat", Category::Npc),
    (Kind::BeachNpc, "beachnpc", Category::Npc),
    (Kind::ForestNpc, "forestnpc", Category::Npc),
    (Kind::DesertNpc, "desertnpc", Category::Npc),
    (Kind::LavaNpc, "lavanpc", Category::Npc),
];

/// Weapons from weakest to strongest; level = rank + 1.
pub const RANKED_WEAPONS: [Kind; 7] = [
    Kind::Sword1,
    Kind::Sword2,
    Kind::Axe,
    Kind::MorningStar,
    Kind::BlueSword,
    Kind::RedSword,
    Kind::GoldenSword,
];

/// Armors from weakest to strongest; level = rank + 1.
pub const RANKED_ARMORS: [Kind; 6] = [
    Kind::ClothArmor,
    Kind::LeatherArmor,
    Kind::MailArmor,
    Kind::PlateArmor,
    Kind::RedArmor,
    Kind::GoldenArmor,
];

impl Kind {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Kind> {
        TABLE.iter().find(|(k, _, _)| k.code() == code).map(|(k, _, _)| *k)
    }

    pub fn from_name(name: &str) -> Option<Kind> {
        TABLE.iter().find(|(_, n, _)| *n == name).map(|(k, _, _)| *k)
    }

    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(k, _, _)| *k == self)
            .map(|(_, n, _)| *n)
            .unwrap_or("unknown")
    }

    pub fn category(self) -> Category {
        TABLE
            .iter()
            .find(|(k, _, _)| *k == self)
            .map(|(_, _, c)| *c)
            .unwrap_or(Category::Object)
    }

    pub fn is_mob(self) -> bool {
        self.category() == Category::Mob
    }

    pub fn is_npc(self) -> bool {
        self.category() == Category::Npc
    }

    pub fn is_armor(self) -> bool {
        self.category() == Category::Armor
    }

    pub fn is_weapon(self) -> bool {
        self.category() == Category::Weapon
    }

    pub fn is_chest(self) -> bool {
        self == Kind::Chest
    }

    /// Anything a player can pick up. Chests are opened, not looted.
    pub fn is_item(self) -> bool {
        self.is_weapon() || self.is_armor() || (self.category() == Category::Object && !self.is_chest())
    }

    pub fn is_healing(self) -> bool {
        matches!(self, Kind::Flask | Kind::Burger)
    }

    pub fn weapon_rank(self) -> Option<usize> {
        RANKED_WEAPONS.iter().position(|k| *k == self)
    }

    pub fn armor_rank(self) -> Option<usize> {
        RANKED_ARMORS.iter().position(|k| *k == self)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Facing direction, wire codes 1..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Orientation {
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
}

impl Orientation {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn random(rng: &mut impl Rng) -> Orientation {
        match rng.gen_range(0..4) {
            0 => Orientation::Left,
            1 => Orientation::Right,
            2 => Orientation::Up,
            _ => Orientation::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn codes_and_names_round_trip() {
        for (kind, name, _) in TABLE {
            assert_eq!(Kind::from_code(kind.code()), Some(kind));
            assert_eq!(Kind::from_name(name), Some(kind));
            assert_eq!(kind.name(), name);
        }
        assert_eq!(Kind::from_code(0), None);
        assert_eq!(Kind::from_code(34), None);
        assert_eq!(Kind::from_name("dragon"), None);
    }

    #[test]
    fn wire_codes() {
        assert_eq!(Kind::Warrior.code(), 1);
        assert_eq!(Kind::DeathKnight.code(), 14);
        assert_eq!(Kind::Chest.code(), 37);
        assert_eq!(Kind::Coder.code(), 55);
        assert_eq!(Kind::BlueSword.code(), 66);
    }

    #[test]
    fn categories() {
        assert!(Kind::Rat.is_mob());
        assert!(Kind::Guard.is_npc());
        assert!(Kind::Axe.is_weapon());
        assert!(Kind::Firefox.is_armor());
        assert!(Kind::Flask.is_item());
        assert!(Kind::Cake.is_item());
        assert!(Kind::GoldenSword.is_item());
        assert!(!Kind::Chest.is_item());
        assert!(!Kind::Rat.is_item());
        assert!(Kind::Burger.is_healing());
        assert!(!Kind::Firepotion.is_healing());
    }

    #[test]
    fn ranks() {
        assert_eq!(Kind::Sword1.weapon_rank(), Some(0));
        assert_eq!(Kind::GoldenSword.weapon_rank(), Some(6));
        assert_eq!(Kind::MailArmor.armor_rank(), Some(2));
        assert_eq!(Kind::Firefox.armor_rank(), None);
    }

    #[test]
    fn random_orientation_is_valid() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let code = Orientation::random(&mut rng).code();
            assert!((1..=4).contains(&code));
        }
    }
}
