use crate::kinds::Kind;

/// Combat stats and drop table of one mob kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MobProperties {
    pub hit_points: i32,
    pub armor: i32,
    pub weapon: i32,
    /// Item kind with its drop percentage, checked in order.
    pub drops: &'static [(Kind, u32)],
}

const RAT: MobProperties = MobProperties {
    hit_points: 25,
    armor: 1,
    weapon: 1,
    drops: &[(Kind::Flask, 40), (Kind::Burger, 10), (Kind::Firepotion, 5)],
};

const SKELETON: MobProperties = MobProperties {
    hit_points: 110,
    armor: 2,
    weapon: 2,
    drops: &[
        (Kind::Flask, 40),
        (Kind::MailArmor, 10),
        (Kind::Axe, 20),
        (Kind::Firepotion, 5),
    ],
};

const GOBLIN: MobProperties = MobProperties {
    hit_points: 90,
    armor: 2,
    weapon: 1,
    drops: &[
        (Kind::Flask, 50),
        (Kind::LeatherArmor, 20),
        (Kind::Axe, 10),
        (Kind::Firepotion, 5),
    ],
};

const OGRE: MobProperties = MobProperties {
    hit_points: 200,
    armor: 3,
    weapon: 2,
    drops: &[
        (Kind::Burger, 10),
        (Kind::Flask, 50),
        (Kind::PlateArmor, 20),
        (Kind::MorningStar, 20),
        (Kind::Firepotion, 5),
    ],
};

const SPECTRE: MobProperties = MobProperties {
    hit_points: 250,
    armor: 2,
    weapon: 4,
    drops: &[
        (Kind::Flask, 30),
        (Kind::RedArmor, 40),
        (Kind::RedSword, 30),
        (Kind::Firepotion, 5),
    ],
};

const DEATH_KNIGHT: MobProperties = MobProperties {
    hit_points: 250,
    armor: 3,
    weapon: 3,
    drops: &[(Kind::Burger, 95), (Kind::Firepotion, 5)],
};

const CRAB: MobProperties = MobProperties {
    hit_points: 60,
    armor: 2,
    weapon: 1,
    drops: &[
        (Kind::Flask, 50),
        (Kind::Axe, 20),
        (Kind::LeatherArmor, 10),
        (Kind::Firepotion, 5),
    ],
};

const SNAKE: MobProperties = MobProperties {
    hit_points: 150,
    armor: 3,
    weapon: 2,
    drops: &[
        (Kind::Flask, 50),
        (Kind::MailArmor, 10),
        (Kind::MorningStar, 10),
        (Kind::Firepotion, 5),
    ],
};

const SKELETON2: MobProperties = MobProperties {
    hit_points: 200,
    armor: 3,
    weapon: 3,
    drops: &[
        (Kind::Flask, 60),
        (Kind::PlateArmor, 15),
        (Kind::BlueSword, 15),
        (Kind::Firepotion, 5),
    ],
};

const EYE: MobProperties = MobProperties {
    hit_points: 200,
    armor: 3,
    weapon: 3,
    drops: &[
        (Kind::Flask, 50),
        (Kind::RedArmor, 20),
        (Kind::RedSword, 10),
        (Kind::Firepotion, 5),
    ],
};

const BAT: MobProperties = MobProperties {
    hit_points: 80,
    armor: 2,
    weapon: 1,
    drops: &[(Kind::Flask, 50), (Kind::Axe, 10), (Kind::Firepotion, 5)],
};

const WIZARD: MobProperties = MobProperties {
    hit_points: 100,
    armor: 2,
    weapon: 6,
    drops: &[
        (Kind::Flask, 50),
        (Kind::PlateArmor, 20),
        (Kind::Firepotion, 5),
    ],
};

const BOSS: MobProperties = MobProperties {
    hit_points: 700,
    armor: 6,
    weapon: 7,
    drops: &[(Kind::GoldenSword, 100)],
};

pub fn mob_properties(kind: Kind) -> Option<&'static MobProperties> {
    let props = match kind {
        Kind::Rat => &RAT,
        Kind::Skeleton => &SKELETON,
        Kind::Goblin => &GOBLIN,
        Kind::Ogre => &OGRE,
        Kind::Spectre => &SPECTRE,
        Kind::DeathKnight => &DEATH_KNIGHT,
        Kind::Crab => &CRAB,
        Kind::Snake => &SNAKE,
        Kind::Skeleton2 => &SKELETON2,
        Kind::Eye => &EYE,
        Kind::Bat => &BAT,
        Kind::Wizard => &WIZARD,
        Kind::Boss => &BOSS,
        _ => return None,
    };
    Some(props)
}

/// Armor level of a mob kind or of an armor item. Zero for anything else.
pub fn armor_level(kind: Kind) -> i32 {
    if let Some(props) = mob_properties(kind) {
        return props.armor;
    }
    kind.armor_rank().map(|r| r as i32 + 1).unwrap_or(0)
}

/// Weapon level of a mob kind or of a weapon item. Zero for anything else.
pub fn weapon_level(kind: Kind) -> i32 {
    if let Some(props) = mob_properties(kind) {
        return props.weapon;
    }
    kind.weapon_rank().map(|r| r as i32 + 1).unwrap_or(0)
}

pub fn mob_hit_points(kind: Kind) -> i32 {
    mob_properties(kind).map(|p| p.hit_points).unwrap_or(0)
}

/// Pick the dropped item for a roll in `0..100`. Percentages accumulate in
/// table order and a roll equal to a running total still takes that item,
/// so the first entry wins one extra roll. Past the last total nothing drops.
pub fn roll_drop(kind: Kind, roll: u32) -> Option<Kind> {
    let props = mob_properties(kind)?;
    let mut threshold = 0;
    for (item, percentage) in props.drops {
        threshold += percentage;
        if roll <= threshold {
            return Some(*item);
        }
    }
    None
}
