//! Roaming-area respawns, chest areas and the item lifecycle.
mod common;

use common::{enter, kill, of_kind, tick, TestMap};
use ids::EntityId;
use project_quest::area::AreaId;
use project_quest::kinds::Kind;
use project_quest::world::{WorldEvent, ITEM_BLINK_DELAY_MS, ITEM_DESPAWN_DELAY_MS, MOB_RESPAWN_DELAY_MS};
use serde_json::json;
use space::{GridPos, MapProvider};

fn in_rect(pos: GridPos, x: i32, y: i32, w: i32, h: i32) -> bool {
    (x..=x + w).contains(&pos.x) && (y..=y + h).contains(&pos.y)
}

fn area_emptied(events: &[WorldEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, WorldEvent::AreaEmptied { .. }))
        .count()
}

#[test]
fn roaming_area_refills_after_its_mobs_die() {
    let map = TestMap::new().roaming("rat", 20, 20, 4, 4, 3).block(21, 21).build();
    let mut world = common::world(map.clone());
    let events = world.subscribe_events();

    let area = world.area(AreaId(0)).unwrap();
    assert_eq!(area.capacity(), 3);
    let rats: Vec<EntityId> = area.members().collect();
    assert_eq!(rats.len(), 3);
    for rat in &rats {
        let pos = world.entity(*rat).unwrap().pos;
        assert!(in_rect(pos, 20, 20, 4, 4));
        assert!(map.is_valid_position(pos));
    }

    let (alice, _) = enter(&mut world, 1, "alice");
    for rat in &rats {
        kill(&mut world, &alice, *rat);
    }
    assert!(world.area(AreaId(0)).unwrap().is_empty());
    assert_eq!(area_emptied(&world.drain_events(events)), 1);
    world.check_invariants().unwrap();

    tick(&mut world, MOB_RESPAWN_DELAY_MS + 20);
    let area = world.area(AreaId(0)).unwrap();
    assert!(area.is_full());
    for rat in &rats {
        let entity = world.entity(*rat).expect("respawned with the same id");
        assert!(in_rect(entity.pos, 20, 20, 4, 4));
        assert!(map.is_valid_position(entity.pos));
        assert_eq!(entity.character().unwrap().hit_points, 25);
    }
    world.check_invariants().unwrap();

    for rat in &rats {
        kill(&mut world, &alice, *rat);
    }
    assert_eq!(area_emptied(&world.drain_events(events)), 1);
}

#[test]
fn cleared_chest_area_yields_a_chest() {
    let map = TestMap::new()
        .chest_area(30, 30, 5, 5, 32, 36, &[Kind::Flask.code()])
        .static_entity(31, 31, "rat")
        .build();
    let mut world = common::world(map);
    let rat = EntityId(1);
    let (mut alice, _) = enter(&mut world, 1, "alice");

    kill(&mut world, &alice, rat);
    let chests: Vec<EntityId> = world
        .entities()
        .filter(|e| e.kind == Kind::Chest)
        .map(|e| e.id)
        .collect();
    assert_eq!(chests.len(), 1);
    let chest = chests[0];
    assert_eq!(world.entity(chest).unwrap().pos, GridPos::new(32, 36));

    alice.send(&mut world, &format!("[25,{}]", chest.0));
    assert!(world.entity(chest).is_none());
    let contents: Vec<EntityId> = world
        .entities()
        .filter(|e| e.pos == GridPos::new(32, 36))
        .map(|e| e.id)
        .collect();
    assert_eq!(contents.len(), 1);
    let flask = contents[0];
    assert_eq!(world.entity(flask).unwrap().kind, Kind::Flask);

    // watch the item from next to it
    alice.send(&mut world, "[15,32,35]");
    tick(&mut world, 20);
    assert!(of_kind(&alice.messages(), 19)
        .iter()
        .any(|list| list.as_array().unwrap().contains(&json!(flask.0))));

    tick(&mut world, ITEM_BLINK_DELAY_MS);
    assert!(of_kind(&alice.messages(), 24).contains(&json!([24, flask.0])));
    assert!(world.entity(flask).is_some());

    tick(&mut world, ITEM_DESPAWN_DELAY_MS);
    assert!(of_kind(&alice.messages(), 22).contains(&json!([22, flask.0])));
    assert!(world.entity(flask).is_none());

    // chest-area mobs stay dead
    tick(&mut world, MOB_RESPAWN_DELAY_MS);
    assert!(world.entity(rat).is_none());
    world.check_invariants().unwrap();
}

#[test]
fn empty_chest_yields_nothing() {
    let map = TestMap::new().static_chest(7, 5, &[]).build();
    let mut world = common::world(map);
    let chest = EntityId(1);
    let (alice, _) = enter(&mut world, 1, "alice");
    let before = world.entities().count();

    alice.send(&mut world, "[25,1]");
    assert!(world.entity(chest).is_none());
    assert_eq!(world.entities().count(), before - 1);
}

#[test]
fn looted_static_items_come_back() {
    let map = TestMap::new().static_entity(6, 5, "leatherarmor").build();
    let mut world = common::world(map);
    let armor = EntityId(1);
    let (mut alice, alice_id) = enter(&mut world, 1, "alice");
    let (mut bob, _) = enter(&mut world, 2, "bob");
    tick(&mut world, 20);
    alice.clear();
    bob.clear();

    alice.send(&mut world, "[12,1]");
    assert!(world.entity(armor).is_none());
    let player = world.entity(alice_id).unwrap().as_player().unwrap();
    assert_eq!(player.armor, Kind::LeatherArmor);
    assert_eq!(player.character.max_hit_points, 110);

    tick(&mut world, 20);
    assert_eq!(of_kind(&alice.messages(), 23), vec![json!([23, 110])]);
    let seen = bob.messages();
    assert!(seen.contains(&json!([3, 1])));
    assert!(seen.contains(&json!([13, alice_id.0, Kind::LeatherArmor.code()])));

    tick(&mut world, 30_000);
    assert_eq!(world.entity(armor).unwrap().pos, GridPos::new(6, 5));
    world.check_invariants().unwrap();
}

#[test]
fn firepotion_wears_off() {
    let map = TestMap::new().static_entity(6, 5, "firepotion").build();
    let mut world = common::world(map);
    let (alice, alice_id) = enter(&mut world, 1, "alice");
    let (mut bob, _) = enter(&mut world, 2, "bob");
    tick(&mut world, 20);
    bob.clear();

    alice.send(&mut world, "[12,1]");
    tick(&mut world, 20);
    assert!(bob.messages().contains(&json!([13, alice_id.0, Kind::Firefox.code()])));

    tick(&mut world, 15_000);
    assert!(bob.messages().contains(&json!([13, alice_id.0, Kind::ClothArmor.code()])));
}

#[test]
fn flask_heals_the_wounded() {
    let map = TestMap::new()
        .static_entity(8, 5, "rat")
        .static_entity(6, 5, "flask")
        .build();
    let mut world = common::world(map);
    let (mut alice, alice_id) = enter(&mut world, 1, "alice");

    alice.send(&mut world, "[9,1]");
    let hurt = world.entity(alice_id).unwrap().character().unwrap().hit_points;
    assert!(hurt < 80);

    alice.send(&mut world, "[12,2]");
    let healed = world.entity(alice_id).unwrap().character().unwrap().hit_points;
    assert_eq!(healed, (hurt + 40).min(80));
    tick(&mut world, 20);
    assert!(alice.messages().contains(&json!([10, healed])));
}
