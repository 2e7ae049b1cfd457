//! Shared harness: an in-memory map and channel-backed clients.
#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use engine_core::Simulation;
use ids::EntityId;
use net::{ChannelConnection, ClientMessage};
use project_quest::realm::Realm;
use project_quest::world::{World, WorldConfig};
use rand::RngCore;
use serde_json::Value;
use session::{SessionId, SessionOutput};
use space::map::{ChestAreaSpec, Checkpoint, RoamingAreaSpec, StaticChestSpec};
use space::{GridPos, MapProvider, ZoneLayout};
use tokio::sync::mpsc;

/// 100×50 tiles cut into 10×10 zones, starting checkpoint on (5, 5).
pub struct TestMap {
    width: i32,
    height: i32,
    layout: ZoneLayout,
    blocked: BTreeSet<GridPos>,
    checkpoints: BTreeMap<u64, Checkpoint>,
    starting: Vec<u64>,
    roaming: Vec<RoamingAreaSpec>,
    chest_areas: Vec<ChestAreaSpec>,
    static_chests: Vec<StaticChestSpec>,
    statics: Vec<(GridPos, String)>,
}

impl TestMap {
    pub fn new() -> Self {
        let mut map = Self {
            width: 100,
            height: 50,
            layout: ZoneLayout::new(100, 50, 10, 10),
            blocked: BTreeSet::new(),
            checkpoints: BTreeMap::new(),
            starting: Vec::new(),
            roaming: Vec::new(),
            chest_areas: Vec::new(),
            static_chests: Vec::new(),
            statics: Vec::new(),
        };
        map = map.checkpoint(1, 5, 5, 1, 1);
        map.starting.push(1);
        map
    }

    pub fn checkpoint(mut self, id: u64, x: i32, y: i32, width: i32, height: i32) -> Self {
        self.checkpoints.insert(
            id,
            Checkpoint {
                id,
                x,
                y,
                width,
                height,
            },
        );
        self
    }

    pub fn block(mut self, x: i32, y: i32) -> Self {
        self.blocked.insert(GridPos::new(x, y));
        self
    }

    pub fn roaming(mut self, kind: &str, x: i32, y: i32, width: i32, height: i32, nb: u32) -> Self {
        self.roaming.push(RoamingAreaSpec {
            id: self.roaming.len() as u64,
            x,
            y,
            width,
            height,
            kind: kind.to_string(),
            nb,
        });
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn chest_area(mut self, x: i32, y: i32, w: i32, h: i32, tx: i32, ty: i32, items: &[u32]) -> Self {
        self.chest_areas.push(ChestAreaSpec {
            x,
            y,
            w,
            h,
            i: items.to_vec(),
            tx,
            ty,
        });
        self
    }

    pub fn static_chest(mut self, x: i32, y: i32, items: &[u32]) -> Self {
        self.static_chests.push(StaticChestSpec {
            x,
            y,
            i: items.to_vec(),
        });
        self
    }

    pub fn static_entity(mut self, x: i32, y: i32, kind: &str) -> Self {
        self.statics.push((GridPos::new(x, y), kind.to_string()));
        self
    }

    pub fn build(self) -> Arc<dyn MapProvider> {
        Arc::new(self)
    }
}

impl MapProvider for TestMap {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_colliding(&self, pos: GridPos) -> bool {
        self.blocked.contains(&pos)
    }

    fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    fn checkpoint(&self, id: u64) -> Option<&Checkpoint> {
        self.checkpoints.get(&id)
    }

    fn random_starting_position(&self, rng: &mut dyn RngCore) -> Option<GridPos> {
        let first = self.starting.first()?;
        self.checkpoints.get(first).map(|cp| cp.random_position(rng))
    }

    fn roaming_areas(&self) -> &[RoamingAreaSpec] {
        &self.roaming
    }

    fn chest_areas(&self) -> &[ChestAreaSpec] {
        &self.chest_areas
    }

    fn static_chests(&self) -> &[StaticChestSpec] {
        &self.static_chests
    }

    fn static_entities(&self) -> &[(GridPos, String)] {
        &self.statics
    }
}

pub fn world(map: Arc<dyn MapProvider>) -> World {
    world_with(map, "world1", 10)
}

pub fn world_with(map: Arc<dyn MapProvider>, id: &str, max_players: usize) -> World {
    World::new(
        WorldConfig {
            id: id.to_string(),
            max_players,
            seed: Some(7),
        },
        map,
    )
}

/// Advance the world's virtual clock by `ms`.
pub fn tick(world: &mut World, ms: u64) {
    let now = world.now_ms() + ms;
    world.advance(now);
}

pub struct Client {
    pub session_id: SessionId,
    rx: mpsc::UnboundedReceiver<SessionOutput>,
}

fn channel_client(id: u64) -> (Client, Box<ChannelConnection>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session_id = SessionId(id);
    let conn = Box::new(ChannelConnection::new(session_id, tx));
    (Client { session_id, rx }, conn)
}

pub fn connect(world: &mut World, id: u64) -> Client {
    let (client, conn) = channel_client(id);
    world.connect(client.session_id, conn);
    client
}

pub fn connect_realm(realm: &mut Realm, id: u64) -> (Client, Option<usize>) {
    let (client, conn) = channel_client(id);
    let placed = realm.connect(client.session_id, conn);
    (client, placed)
}

/// Connect, say HELLO and return the client with its player id.
pub fn enter(world: &mut World, id: u64, name: &str) -> (Client, EntityId) {
    let mut client = connect(world, id);
    client.send(world, &format!(r#"[0,"{name}",21,60]"#));
    let welcome = client
        .messages()
        .into_iter()
        .find(|m| m[0] == 1)
        .expect("welcome");
    let player = EntityId(welcome[1].as_u64().expect("welcome id"));
    (client, player)
}

impl Client {
    pub fn send(&self, world: &mut World, text: &str) {
        world.handle_message(self.session_id, ClientMessage::parse(text));
    }

    pub fn send_realm(&self, realm: &mut Realm, text: &str) {
        realm.handle_message(self.session_id, ClientMessage::parse(text));
    }

    pub fn outputs(&mut self) -> Vec<SessionOutput> {
        let mut out = Vec::new();
        while let Ok(output) = self.rx.try_recv() {
            out.push(output);
        }
        out
    }

    /// Every decoded message tuple received so far, batches unpacked.
    pub fn messages(&mut self) -> Vec<Value> {
        flatten(&self.outputs())
    }

    pub fn clear(&mut self) {
        self.outputs();
    }
}

pub fn flatten(outputs: &[SessionOutput]) -> Vec<Value> {
    let mut messages = Vec::new();
    for output in outputs {
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&output.text) else {
            continue;
        };
        if items.first().is_some_and(Value::is_array) {
            messages.extend(items);
        } else {
            messages.push(Value::Array(items));
        }
    }
    messages
}

pub fn of_kind(messages: &[Value], code: u64) -> Vec<Value> {
    messages.iter().filter(|m| m[0] == code).cloned().collect()
}

pub fn close_reason(outputs: &[SessionOutput]) -> Option<String> {
    outputs
        .iter()
        .find(|o| o.disconnect)
        .and_then(|o| o.close_reason.clone())
}

/// Send HIT until the mob is gone.
pub fn kill(world: &mut World, client: &Client, mob: EntityId) {
    for _ in 0..50 {
        if world.entity(mob).is_none() {
            return;
        }
        client.send(world, &format!("[8,{}]", mob.0));
    }
    panic!("{mob} survived 50 hits");
}
