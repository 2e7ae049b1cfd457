pub mod groups;
pub mod map;
pub mod zone;

pub use groups::{Group, MemberKind, MembershipChange, ZoneGroups};
pub use map::{
    ChestAreaSpec, Checkpoint, CheckpointSpec, DoorSpec, MapData, MapError, MapProvider,
    RoamingAreaSpec, StaticChestSpec, WorldMap,
};
pub use zone::{GridPos, ZoneId, ZoneLayout};
