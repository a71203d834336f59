//! Object instances.

use std::sync::Arc;

use mudstone_types::{Flags, ItemType, MobId, ObjId, RoomId, Vnum, WearSlot};

use crate::affect::Affect;

/// Where an object currently lives. Exactly one of room / mobile /
/// container-object / nowhere, and the chosen side lists it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjLocation {
    #[default]
    Nowhere,
    Room(RoomId),
    Carried(MobId),
    Inside(ObjId),
}

/// A live object.
#[derive(Debug)]
pub struct Object {
    pub id: ObjId,
    pub proto: Vnum,
    /// Per-instance overrides start as clones of the prototype strings.
    pub name: Arc<str>,
    pub short_descr: Arc<str>,
    pub description: Arc<str>,
    pub item_type: ItemType,
    pub extra_flags: Flags,
    pub wear_flags: Flags,
    pub values: [i32; 5],
    pub weight: i32,
    pub cost: i32,
    pub condition: i32,
    pub level: i16,
    pub location: ObjLocation,
    /// Set iff the object is equipped on its carrier.
    pub wear_loc: Option<WearSlot>,
    /// Contained objects (containers and corpses).
    pub contains: Vec<ObjId>,
    pub affects: Vec<Affect>,
    /// Rot-out timer in ticks; 0 means no timer.
    pub timer: i32,
    pub enchanted: bool,
}

impl Object {
    pub fn is_container(&self) -> bool {
        matches!(self.item_type, ItemType::Container | ItemType::Corpse)
    }

    /// Corpse contents are destroyed with the corpse; other containers
    /// spill into the parent location on extraction.
    pub fn destroys_contents(&self) -> bool {
        self.item_type == ItemType::Corpse
    }
}
