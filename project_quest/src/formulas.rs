use rand::Rng;

/// Damage of one blow. Never negative: a blow fully absorbed by armor still
/// lands for `0..=3`.
pub fn dmg(rng: &mut impl Rng, weapon_level: i32, armor_level: i32) -> i32 {
    let dealt = weapon_level * rng.gen_range(5..=10);
    let absorbed = armor_level * rng.gen_range(1..=3);
    let damage = dealt - absorbed;
    if damage <= 0 {
        rng.gen_range(0..=3)
    } else {
        damage
    }
}

/// Player hit points for an armor level.
pub fn hp(armor_level: i32) -> i32 {
    80 + (armor_level - 1) * 30
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn damage_is_never_negative() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let d = dmg(&mut rng, 1, 1);
            assert!((0..=9).contains(&d), "got {d}");
        }
    }

    #[test]
    fn absorbed_blows_fall_back_to_small_range() {
        // an unarmed blow against any armor is always fully absorbed
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let d = dmg(&mut rng, 0, 6);
            assert!((0..=3).contains(&d));
        }
    }

    #[test]
    fn strong_weapons_hit_hard() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let d = dmg(&mut rng, 7, 1);
            assert!((32..=69).contains(&d));
        }
    }

    #[test]
    fn player_hit_points() {
        assert_eq!(hp(1), 80);
        assert_eq!(hp(2), 110);
        assert_eq!(hp(6), 230);
    }
}
