//! Area instances.

use serde::{Deserialize, Serialize};

use mudstone_types::{AreaId, MobId, RoomId, Vnum};

/// Whether an area is shared by everyone or materialized per visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstancePolicy {
    /// One instance for the whole world, created at boot.
    #[default]
    Singleton,
    /// A private instance per visiting player, created on first entry and
    /// destroyed at reset time once empty.
    PerPlayer,
}

/// A live area: rooms materialized from an [`crate::AreaProto`].
#[derive(Debug)]
pub struct AreaInst {
    pub id: AreaId,
    /// Vnum of the area prototype (its `min_vnum` doubles as its key).
    pub proto: Vnum,
    /// Room instances of this area, in ascending prototype-vnum order.
    pub rooms: Vec<RoomId>,
    /// Pulses accumulated toward the next reset.
    pub reset_timer: u32,
    /// Players currently inside any room of the instance.
    pub player_count: u32,
    /// Owner for per-player instances; `None` for singletons.
    pub owner: Option<MobId>,
    /// Set once the area has reset at least once since boot.
    pub age: u32,
}

impl AreaInst {
    pub fn new(id: AreaId, proto: Vnum, owner: Option<MobId>) -> Self {
        AreaInst {
            id,
            proto,
            rooms: Vec::new(),
            reset_timer: 0,
            player_count: 0,
            owner,
            age: 0,
        }
    }
}
