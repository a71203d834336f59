//! Room and exit instances.

use std::sync::Arc;

use mudstone_types::{
    AreaId, Direction, DoorState, Flags, MobId, ObjId, RoomId, Vnum, DIR_MAX, EX_ISDOOR,
};

/// A live exit: a directed link to a room in the same world instance.
#[derive(Debug, Clone)]
pub struct Exit {
    /// Destination room; `None` when the destination vnum never resolved.
    pub to_room: Option<RoomId>,
    pub to_vnum: Vnum,
    pub state: DoorState,
    pub exit_flags: Flags,
    pub key: Vnum,
    pub keyword: Arc<str>,
    pub description: Arc<str>,
    /// The slot this exit occupied in the prototype, before any `R` reset.
    pub orig_dir: Direction,
}

impl Exit {
    pub fn is_door(&self) -> bool {
        self.exit_flags & EX_ISDOOR != 0
    }
}

/// A live room.
#[derive(Debug)]
pub struct Room {
    pub id: RoomId,
    pub vnum: Vnum,
    pub area: AreaId,
    /// Mobiles in the room, in arrival order.
    pub people: Vec<MobId>,
    /// Objects on the floor.
    pub contents: Vec<ObjId>,
    pub exits: [Option<Exit>; DIR_MAX],
    pub light: i32,
    /// Rooms whose exits point at this room, so teardown can null them.
    pub inbound_exits: Vec<(RoomId, Direction)>,
}

impl Room {
    pub fn new(id: RoomId, vnum: Vnum, area: AreaId) -> Self {
        Room {
            id,
            vnum,
            area,
            people: Vec::new(),
            contents: Vec::new(),
            exits: Default::default(),
            light: 0,
            inbound_exits: Vec::new(),
        }
    }

    pub fn exit(&self, dir: Direction) -> Option<&Exit> {
        self.exits[dir.index()].as_ref()
    }

    pub fn exit_mut(&mut self, dir: Direction) -> Option<&mut Exit> {
        self.exits[dir.index()].as_mut()
    }
}
