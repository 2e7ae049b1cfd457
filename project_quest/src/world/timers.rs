use ids::EntityId;
use net::ServerMessage;

use super::World;

/// Deferred world work, keyed on virtual time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldTimer {
    MobRespawn { mob: EntityId },
    MobReturn { mob: EntityId },
    ItemBlink { item: EntityId },
    ItemDespawn { item: EntityId },
    StaticItemRespawn { item: EntityId },
    FirepotionExpire { player: EntityId },
}

impl WorldTimer {
    pub fn subject(&self) -> EntityId {
        match *self {
            WorldTimer::MobRespawn { mob } | WorldTimer::MobReturn { mob } => mob,
            WorldTimer::ItemBlink { item }
            | WorldTimer::ItemDespawn { item }
            | WorldTimer::StaticItemRespawn { item } => item,
            WorldTimer::FirepotionExpire { player } => player,
        }
    }

    /// Timers acting on a live entity die with it. Respawns act on the
    /// dormant entity and survive its removal.
    pub fn cancelled_by_removal(&self) -> bool {
        !matches!(
            self,
            WorldTimer::MobRespawn { .. } | WorldTimer::StaticItemRespawn { .. }
        )
    }
}

impl World {
    pub(super) fn schedule(&mut self, delay_ms: u64, timer: WorldTimer) {
        self.timers.schedule(self.now_ms + delay_ms, timer);
    }

    /// Cancel the live-entity timers of `id`.
    pub(super) fn cancel_timers_of(&mut self, id: ids::EntityId) -> usize {
        self.timers
            .cancel_where(|t| t.subject() == id && t.cancelled_by_removal())
    }

    pub(super) fn fire(&mut self, timer: WorldTimer) {
        tracing::trace!(world = %self.id, ?timer, "timer fired");
        match timer {
            WorldTimer::MobRespawn { mob } => self.respawn_mob(mob),
            WorldTimer::MobReturn { mob } => self.return_to_spawn(mob),
            WorldTimer::ItemBlink { item } => {
                if !self.entities.contains(item) {
                    return;
                }
                self.push_around(item, ServerMessage::Blink { id: item }, None);
                self.schedule(super::ITEM_DESPAWN_DELAY_MS, WorldTimer::ItemDespawn { item });
            }
            WorldTimer::ItemDespawn { item } => {
                if !self.entities.contains(item) {
                    return;
                }
                self.push_around(item, ServerMessage::Destroy { id: item }, None);
                self.remove_item(item);
            }
            WorldTimer::StaticItemRespawn { item } => self.respawn_static_item(item),
            WorldTimer::FirepotionExpire { player } => self.expire_firepotion(player),
        }
    }
}
