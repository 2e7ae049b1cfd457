use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 2D integer tile coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance, the number of king moves between two tiles.
    pub fn distance_to(&self, other: GridPos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// The four orthogonal neighbours: up, down, left, right.
    pub fn neighbours(&self) -> [GridPos; 4] {
        [
            GridPos::new(self.x, self.y - 1),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x + 1, self.y),
        ]
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A zone ("group") is one cell of the coarse partition, keyed by (col, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId {
    pub col: i32,
    pub row: i32,
}

impl ZoneId {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.col, self.row)
    }
}

/// Fixed partition of the map into `zone_width × zone_height` cells, plus the
/// door links that extend a cell's interest set beyond its 3×3 neighbourhood.
#[derive(Debug, Clone)]
pub struct ZoneLayout {
    zone_width: i32,
    zone_height: i32,
    cols: i32,
    rows: i32,
    links: BTreeMap<ZoneId, Vec<ZoneId>>,
}

impl ZoneLayout {
    /// Zone sizes of zero are clamped to one.
    pub fn new(map_width: i32, map_height: i32, zone_width: i32, zone_height: i32) -> Self {
        let zone_width = zone_width.max(1);
        let zone_height = zone_height.max(1);
        let cols = (map_width.max(0) + zone_width - 1) / zone_width;
        let rows = (map_height.max(0) + zone_height - 1) / zone_height;
        Self {
            zone_width,
            zone_height,
            cols,
            rows,
            links: BTreeMap::new(),
        }
    }

    pub fn zone_width(&self) -> i32 {
        self.zone_width
    }

    pub fn zone_height(&self) -> i32 {
        self.zone_height
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    /// Link the zone holding `from` to the zone holding `to` (one direction,
    /// like a door). Positions are not clipped here; clipping happens on read.
    pub fn link(&mut self, from: GridPos, to: GridPos) {
        let source = self.raw_zone_of(from);
        let target = self.raw_zone_of(to);
        let entry = self.links.entry(source).or_default();
        if !entry.contains(&target) {
            entry.push(target);
        }
    }

    fn raw_zone_of(&self, pos: GridPos) -> ZoneId {
        ZoneId::new(
            (pos.x - 1).div_euclid(self.zone_width),
            (pos.y - 1).div_euclid(self.zone_height),
        )
    }

    pub fn contains(&self, zone: ZoneId) -> bool {
        zone.col >= 0 && zone.row >= 0 && zone.col < self.cols && zone.row < self.rows
    }

    /// Zone of a tile, or `None` when the tile falls outside the zone grid.
    pub fn zone_of(&self, pos: GridPos) -> Option<ZoneId> {
        let zone = self.raw_zone_of(pos);
        self.contains(zone).then_some(zone)
    }

    /// 3×3 neighbourhood of `zone`, extended by its door links, deduplicated
    /// and clipped to the grid. Ordering is stable.
    pub fn interest_set(&self, zone: ZoneId) -> Vec<ZoneId> {
        let mut set = Vec::with_capacity(9);
        for dr in -1..=1 {
            for dc in -1..=1 {
                set.push(ZoneId::new(zone.col + dc, zone.row + dr));
            }
        }
        if let Some(linked) = self.links.get(&zone) {
            for target in linked {
                if !set.contains(target) {
                    set.push(*target);
                }
            }
        }
        set.retain(|z| self.contains(*z));
        set
    }

    /// Every zone of the grid, column-major.
    pub fn zones(&self) -> impl Iterator<Item = ZoneId> + '_ {
        (0..self.cols).flat_map(move |col| (0..self.rows).map(move |row| ZoneId::new(col, row)))
    }

    pub fn zone_count(&self) -> usize {
        (self.cols.max(0) as usize) * (self.rows.max(0) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> ZoneLayout {
        // 4 columns × 3 rows of 28×12 zones
        ZoneLayout::new(112, 36, 28, 12)
    }

    #[test]
    fn grid_covers_partial_zones() {
        let l = ZoneLayout::new(100, 30, 28, 12);
        assert_eq!(l.cols(), 4);
        assert_eq!(l.rows(), 3);
        assert_eq!(l.zone_count(), 12);
        // last valid tile still maps into the grid
        assert_eq!(l.zone_of(GridPos::new(99, 29)), Some(ZoneId::new(3, 2)));
    }

    #[test]
    fn zone_of_uses_one_based_tiles() {
        let l = layout();
        assert_eq!(l.zone_of(GridPos::new(1, 1)), Some(ZoneId::new(0, 0)));
        assert_eq!(l.zone_of(GridPos::new(28, 12)), Some(ZoneId::new(0, 0)));
        assert_eq!(l.zone_of(GridPos::new(29, 12)), Some(ZoneId::new(1, 0)));
        assert_eq!(l.zone_of(GridPos::new(29, 13)), Some(ZoneId::new(1, 1)));
        assert_eq!(l.zone_of(GridPos::new(0, 5)), None);
    }

    #[test]
    fn interest_set_is_clipped_neighbourhood() {
        let l = layout();
        let corner = l.interest_set(ZoneId::new(0, 0));
        assert_eq!(corner.len(), 4);
        assert!(corner.contains(&ZoneId::new(1, 1)));

        let middle = l.interest_set(ZoneId::new(1, 1));
        assert_eq!(middle.len(), 9);
        assert!(middle.contains(&ZoneId::new(1, 1)));
        assert!(!middle.contains(&ZoneId::new(3, 1)));
    }

    #[test]
    fn door_links_extend_interest_set() {
        let mut l = layout();
        // door in zone 0-0 leads into zone 3-2
        l.link(GridPos::new(5, 5), GridPos::new(100, 30));
        l.link(GridPos::new(5, 5), GridPos::new(100, 30));

        let set = l.interest_set(ZoneId::new(0, 0));
        assert_eq!(set.len(), 5);
        assert_eq!(set.last(), Some(&ZoneId::new(3, 2)));

        // links are one-directional
        assert!(!l.interest_set(ZoneId::new(3, 2)).contains(&ZoneId::new(0, 0)));
    }

    #[test]
    fn links_into_adjacent_zones_are_not_duplicated() {
        let mut l = layout();
        l.link(GridPos::new(5, 5), GridPos::new(30, 5));
        assert_eq!(l.interest_set(ZoneId::new(0, 0)).len(), 4);
    }

    #[test]
    fn zones_iterates_whole_grid() {
        let l = layout();
        let all: Vec<ZoneId> = l.zones().collect();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0], ZoneId::new(0, 0));
        assert_eq!(all[1], ZoneId::new(0, 1));
    }

    #[test]
    fn chebyshev_distance() {
        let a = GridPos::new(10, 10);
        assert_eq!(a.distance_to(GridPos::new(13, 11)), 3);
        assert_eq!(a.distance_to(GridPos::new(9, 2)), 8);
        assert_eq!(ZoneId::new(2, 7).to_string(), "2-7");
    }
}
