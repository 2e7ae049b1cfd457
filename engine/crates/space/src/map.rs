use std::collections::BTreeMap;
use std::path::Path;

use rand::{Rng, RngCore};
use serde::Deserialize;

use crate::zone::{GridPos, ZoneLayout};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("cannot read map file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("map file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid map: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoorSpec {
    pub x: i32,
    pub y: i32,
    pub tx: i32,
    pub ty: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointSpec {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// `1` marks a starting area.
    #[serde(default)]
    pub s: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoamingAreaSpec {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Mob kind name, e.g. `"rat"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub nb: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChestAreaSpec {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    /// Item kind codes the chest may contain.
    #[serde(default)]
    pub i: Vec<u32>,
    pub tx: i32,
    pub ty: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StaticChestSpec {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub i: Vec<u32>,
}

/// The exported server map, as found on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapData {
    pub width: i32,
    pub height: i32,
    pub collisions: Vec<u32>,
    pub doors: Vec<DoorSpec>,
    pub checkpoints: Vec<CheckpointSpec>,
    pub roaming_areas: Vec<RoamingAreaSpec>,
    pub chest_areas: Vec<ChestAreaSpec>,
    pub static_chests: Vec<StaticChestSpec>,
    /// Tile index (as a string key) → kind name.
    pub static_entities: BTreeMap<String, String>,
}

/// A rectangular checkpoint. Players respawn inside their last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub id: u64,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Checkpoint {
    pub fn random_position(&self, rng: &mut dyn RngCore) -> GridPos {
        let dx = if self.width > 1 { rng.gen_range(0..self.width) } else { 0 };
        let dy = if self.height > 1 { rng.gen_range(0..self.height) } else { 0 };
        GridPos::new(self.x + dx, self.y + dy)
    }
}

/// Read-only static map queries the simulation relies on.
pub trait MapProvider: Send + Sync {
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    fn is_out_of_bounds(&self, pos: GridPos) -> bool {
        pos.x <= 0 || pos.x >= self.width() || pos.y <= 0 || pos.y >= self.height()
    }

    /// Out-of-bounds tiles never collide.
    fn is_colliding(&self, pos: GridPos) -> bool;

    fn is_valid_position(&self, pos: GridPos) -> bool {
        !self.is_out_of_bounds(pos) && !self.is_colliding(pos)
    }

    fn layout(&self) -> &ZoneLayout;

    fn checkpoint(&self, id: u64) -> Option<&Checkpoint>;

    /// Random tile inside a random starting checkpoint, `None` if the map has none.
    fn random_starting_position(&self, rng: &mut dyn RngCore) -> Option<GridPos>;

    fn roaming_areas(&self) -> &[RoamingAreaSpec] {
        &[]
    }

    fn chest_areas(&self) -> &[ChestAreaSpec] {
        &[]
    }

    fn static_chests(&self) -> &[StaticChestSpec] {
        &[]
    }

    /// Static NPCs, mobs and items with their spawn tile.
    fn static_entities(&self) -> &[(GridPos, String)] {
        &[]
    }
}

/// JSON-backed map with a dense collision grid.
#[derive(Debug, Clone)]
pub struct WorldMap {
    width: i32,
    height: i32,
    collision_grid: Vec<bool>,
    layout: ZoneLayout,
    checkpoints: BTreeMap<u64, Checkpoint>,
    starting_areas: Vec<u64>,
    roaming_areas: Vec<RoamingAreaSpec>,
    chest_areas: Vec<ChestAreaSpec>,
    static_chests: Vec<StaticChestSpec>,
    static_entities: Vec<(GridPos, String)>,
}

impl WorldMap {
    pub fn load(path: impl AsRef<Path>, zone_width: i32, zone_height: i32) -> Result<Self, MapError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content, zone_width, zone_height)
    }

    pub fn from_json_str(json: &str, zone_width: i32, zone_height: i32) -> Result<Self, MapError> {
        let data: MapData = serde_json::from_str(json)?;
        Self::from_data(data, zone_width, zone_height)
    }

    pub fn from_data(data: MapData, zone_width: i32, zone_height: i32) -> Result<Self, MapError> {
        if data.width <= 0 || data.height <= 0 {
            return Err(MapError::Invalid(format!(
                "map dimensions must be positive, got {}x{}",
                data.width, data.height
            )));
        }
        if zone_width <= 0 || zone_height <= 0 {
            return Err(MapError::Invalid(format!(
                "zone dimensions must be positive, got {}x{}",
                zone_width, zone_height
            )));
        }

        let tiles = data.width as usize * data.height as usize;
        let mut collision_grid = vec![false; tiles];
        for index in &data.collisions {
            match collision_grid.get_mut(*index as usize) {
                Some(cell) => *cell = true,
                None => tracing::warn!(index, "collision tile outside the map, ignored"),
            }
        }

        let mut layout = ZoneLayout::new(data.width, data.height, zone_width, zone_height);
        for door in &data.doors {
            layout.link(GridPos::new(door.x, door.y), GridPos::new(door.tx, door.ty));
        }

        let mut checkpoints = BTreeMap::new();
        let mut starting_areas = Vec::new();
        for cp in &data.checkpoints {
            checkpoints.insert(
                cp.id,
                Checkpoint {
                    id: cp.id,
                    x: cp.x,
                    y: cp.y,
                    width: cp.w,
                    height: cp.h,
                },
            );
            if cp.s == 1 {
                starting_areas.push(cp.id);
            }
        }

        let mut static_entities = Vec::with_capacity(data.static_entities.len());
        for (tile, kind) in &data.static_entities {
            let index: u32 = tile.parse().map_err(|_| {
                MapError::Invalid(format!("static entity key {tile:?} is not a tile index"))
            })?;
            let pos = tile_index_to_grid_position(index, data.width);
            static_entities.push((GridPos::new(pos.x + 1, pos.y), kind.clone()));
        }
        static_entities.sort();

        tracing::debug!(
            width = data.width,
            height = data.height,
            zones = layout.zone_count(),
            checkpoints = checkpoints.len(),
            "map loaded"
        );

        Ok(Self {
            width: data.width,
            height: data.height,
            collision_grid,
            layout,
            checkpoints,
            starting_areas,
            roaming_areas: data.roaming_areas,
            chest_areas: data.chest_areas,
            static_chests: data.static_chests,
            static_entities,
        })
    }
}

impl MapProvider for WorldMap {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn is_colliding(&self, pos: GridPos) -> bool {
        if self.is_out_of_bounds(pos) {
            return false;
        }
        let index = pos.y as usize * self.width as usize + pos.x as usize;
        self.collision_grid.get(index).copied().unwrap_or(false)
    }

    fn layout(&self) -> &ZoneLayout {
        &self.layout
    }

    fn checkpoint(&self, id: u64) -> Option<&Checkpoint> {
        self.checkpoints.get(&id)
    }

    fn random_starting_position(&self, rng: &mut dyn RngCore) -> Option<GridPos> {
        if self.starting_areas.is_empty() {
            return None;
        }
        let pick = self.starting_areas[rng.gen_range(0..self.starting_areas.len())];
        self.checkpoints.get(&pick).map(|cp| cp.random_position(rng))
    }

    fn roaming_areas(&self) -> &[RoamingAreaSpec] {
        &self.roaming_areas
    }

    fn chest_areas(&self) -> &[ChestAreaSpec] {
        &self.chest_areas
    }

    fn static_chests(&self) -> &[StaticChestSpec] {
        &self.static_chests
    }

    fn static_entities(&self) -> &[(GridPos, String)] {
        &self.static_entities
    }
}

/// Convert a 1-based tile index from the map export into a grid position.
pub fn tile_index_to_grid_position(tile: u32, width: i32) -> GridPos {
    let width = width.max(1) as i64;
    let num = tile as i64;
    let x = if num == 0 {
        0
    } else if num % width == 0 {
        width - 1
    } else {
        num % width - 1
    };
    let y = (num - 1).div_euclid(width);
    GridPos::new(x as i32, y as i32)
}
