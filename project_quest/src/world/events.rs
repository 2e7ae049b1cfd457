use ids::EntityId;
use session::SessionId;

use crate::area::AreaId;
use crate::kinds::Kind;

/// Notifications a world publishes on its event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    PlayerEntered { player: EntityId, session_id: SessionId },
    PlayerLeft { player: EntityId, session_id: SessionId },
    /// The last living mob of an area died.
    AreaEmptied { area: AreaId },
    MobKilled { mob: EntityId, kind: Kind, killer: EntityId },
}
