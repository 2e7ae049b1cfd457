use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Hands out world-unique ids. Ids are never reused within a world, so a stale
/// id held by a client or a timer can never alias a newer entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAllocator {
    next: u64,
    issued: u64,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self { next: 1, issued: 0 }
    }

    /// Start allocation at `first` (must be non-zero; zero is reserved).
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: first.max(1),
            issued: 0,
        }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.next);
        self.next += 1;
        self.issued += 1;
        id
    }

    pub fn issued_count(&self) -> u64 {
        self.issued
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
