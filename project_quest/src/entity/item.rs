use rand::Rng;

use crate::kinds::Kind;

/// Where an item came from decides its despawn and respawn policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOrigin {
    /// Placed by the map; respawns after being taken.
    Static,
    /// Dropped by a mob; announced with a drop message.
    Dropped,
    /// Produced by opening a chest or by an emptied chest area.
    Reward,
}

#[derive(Debug, Clone)]
pub struct Item {
    pub origin: ItemOrigin,
    /// Item pool, only for chests.
    pub contents: Vec<Kind>,
}

impl Item {
    pub fn new(origin: ItemOrigin) -> Self {
        Self {
            origin,
            contents: Vec::new(),
        }
    }

    pub fn chest(origin: ItemOrigin, contents: Vec<Kind>) -> Self {
        Self { origin, contents }
    }

    pub fn is_static(&self) -> bool {
        self.origin == ItemOrigin::Static
    }

    /// One item of the pool, uniformly.
    pub fn random_content(&self, rng: &mut impl Rng) -> Option<Kind> {
        if self.contents.is_empty() {
            return None;
        }
        Some(self.contents[rng.gen_range(0..self.contents.len())])
    }
}
