use std::collections::{BTreeMap, BTreeSet};

use ids::EntityId;

use crate::zone::{GridPos, ZoneId, ZoneLayout};

/// Members of one zone: every entity whose interest set covers the zone,
/// the players standing in it, and entities that became visible here since
/// the last flush.
#[derive(Debug, Default, Clone)]
pub struct Group {
    pub entities: BTreeSet<EntityId>,
    pub players: BTreeSet<EntityId>,
    pub incoming: Vec<EntityId>,
}

/// How an entity participates in zone bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberKind {
    pub is_player: bool,
    /// Whether newly covered zones should receive a spawn for this entity.
    /// Mob drops are announced separately and pass `false`.
    pub announce: bool,
}

impl MemberKind {
    pub const PLAYER: MemberKind = MemberKind {
        is_player: true,
        announce: true,
    };
    pub const OTHER: MemberKind = MemberKind {
        is_player: false,
        announce: true,
    };
    pub const SILENT: MemberKind = MemberKind {
        is_player: false,
        announce: false,
    };
}

/// Result of a membership update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipChange {
    pub changed: bool,
    /// Zones that did not see the entity before and do now.
    pub entered: Vec<ZoneId>,
    /// Zones that saw the entity before and no longer do.
    pub left: Vec<ZoneId>,
}

#[derive(Debug, Clone, Copy)]
struct Membership {
    zone: ZoneId,
    is_player: bool,
}

/// Zone-based interest management.
#[derive(Debug, Default)]
pub struct ZoneGroups {
    groups: BTreeMap<ZoneId, Group>,
    membership: BTreeMap<EntityId, Membership>,
    recently_left: BTreeMap<EntityId, Vec<ZoneId>>,
}

impl ZoneGroups {
    pub fn new(layout: &ZoneLayout) -> Self {
        Self {
            groups: layout.zones().map(|z| (z, Group::default())).collect(),
            membership: BTreeMap::new(),
            recently_left: BTreeMap::new(),
        }
    }

    /// Re-establish the entity's zone from `pos`. A second call with the same
    /// position is a no-op.
    pub fn update(
        &mut self,
        layout: &ZoneLayout,
        entity: EntityId,
        pos: GridPos,
        kind: MemberKind,
    ) -> MembershipChange {
        let Some(zone) = layout.zone_of(pos) else {
            tracing::warn!(%entity, %pos, "position outside the zone grid");
            let left = self.remove(layout, entity);
            return MembershipChange {
                changed: !left.is_empty(),
                entered: Vec::new(),
                left,
            };
        };

        if self.membership.get(&entity).map(|m| m.zone) == Some(zone) {
            return MembershipChange::default();
        }

        let new_interest = layout.interest_set(zone);

        let mut entered = Vec::new();
        for id in &new_interest {
            if let Some(group) = self.groups.get_mut(id) {
                if !group.entities.contains(&entity) {
                    entered.push(*id);
                    if kind.announce {
                        group.incoming.push(entity);
                    }
                }
            }
        }

        let old = self.detach(layout, entity);

        for id in &new_interest {
            if let Some(group) = self.groups.get_mut(id) {
                group.entities.insert(entity);
            }
        }
        if kind.is_player {
            if let Some(group) = self.groups.get_mut(&zone) {
                group.players.insert(entity);
            }
        }
        self.membership.insert(
            entity,
            Membership {
                zone,
                is_player: kind.is_player,
            },
        );

        let left: Vec<ZoneId> = old
            .into_iter()
            .filter(|z| !new_interest.contains(z))
            .collect();
        self.recently_left.insert(entity, left.clone());

        MembershipChange {
            changed: true,
            entered,
            left,
        }
    }

    /// Drop the entity from every group. Returns the zones that could see it.
    pub fn remove(&mut self, layout: &ZoneLayout, entity: EntityId) -> Vec<ZoneId> {
        let old = self.detach(layout, entity);
        for group in self.groups.values_mut() {
            group.incoming.retain(|e| *e != entity);
        }
        self.recently_left.remove(&entity);
        old
    }

    fn detach(&mut self, layout: &ZoneLayout, entity: EntityId) -> Vec<ZoneId> {
        let Some(membership) = self.membership.remove(&entity) else {
            return Vec::new();
        };
        if membership.is_player {
            if let Some(group) = self.groups.get_mut(&membership.zone) {
                group.players.remove(&entity);
            }
        }
        let mut old = Vec::new();
        for id in layout.interest_set(membership.zone) {
            if let Some(group) = self.groups.get_mut(&id) {
                if group.entities.remove(&entity) {
                    old.push(id);
                }
            }
        }
        old
    }

    pub fn zone_of(&self, entity: EntityId) -> Option<ZoneId> {
        self.membership.get(&entity).map(|m| m.zone)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.membership.contains_key(&entity)
    }

    /// Players standing in `zone`.
    pub fn players_in(&self, zone: ZoneId) -> impl Iterator<Item = EntityId> + '_ {
        self.groups
            .get(&zone)
            .into_iter()
            .flat_map(|g| g.players.iter().copied())
    }

    /// Every entity visible from `zone` (i.e. whose interest set covers it).
    pub fn entities_visible_from(&self, zone: ZoneId) -> impl Iterator<Item = EntityId> + '_ {
        self.groups
            .get(&zone)
            .into_iter()
            .flat_map(|g| g.entities.iter().copied())
    }

    /// Zones the entity stopped covering on its last zone change.
    pub fn take_recently_left(&mut self, entity: EntityId) -> Vec<ZoneId> {
        self.recently_left.remove(&entity).unwrap_or_default()
    }

    /// Take every non-empty incoming buffer, in zone order.
    pub fn drain_incoming(&mut self) -> Vec<(ZoneId, Vec<EntityId>)> {
        self.groups
            .iter_mut()
            .filter(|(_, g)| !g.incoming.is_empty())
            .map(|(id, g)| (*id, std::mem::take(&mut g.incoming)))
            .collect()
    }

    pub fn member_count(&self) -> usize {
        self.membership.len()
    }

    /// True when every member's recorded zone matches `position_of`.
    pub fn is_consistent(
        &self,
        layout: &ZoneLayout,
        mut position_of: impl FnMut(EntityId) -> Option<GridPos>,
    ) -> bool {
        self.membership.iter().all(|(entity, m)| {
            position_of(*entity).and_then(|pos| layout.zone_of(pos)) == Some(m.zone)
        })
    }
}
