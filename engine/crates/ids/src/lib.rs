pub mod allocator;
pub mod types;

pub use allocator::EntityAllocator;
pub use types::EntityId;
