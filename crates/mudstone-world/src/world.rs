//! The `World`: every live instance, the prototype registry, the RNG, and
//! the closed set of mutation primitives.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use mudstone_types::{
    AreaId, Direction, DoorState, Flags, ItemType, MobId, ObjId, Position, RoomId, Vnum,
    WearSlot, AFF_HIDE, EX_CLOSED, EX_LOCKED,
};

use crate::affect::{Affect, AffectLocation, AffectWhere};
use crate::area::{AreaInst, InstancePolicy};
use crate::bug;
use crate::clock::GameClock;
use crate::mobile::Mobile;
use crate::object::{ObjLocation, Object};
use crate::proto::{MobProto, ObjProto};
use crate::registry::Registry;
use crate::room::{Exit, Room};

/// Result alias for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors from world construction and instancing. The mutation primitives
/// themselves are total and never fail.
#[derive(Debug, Error)]
pub enum WorldError {
    /// No area prototype registered under this key.
    #[error("unknown area prototype {0}")]
    UnknownArea(Vnum),

    /// An area's vnum range contains no rooms.
    #[error("area {0} has no rooms")]
    EmptyArea(Vnum),
}

/// The entire simulation state. Owned by the main thread; every mutation
/// goes through the primitives below.
pub struct World {
    pub registry: Registry,
    pub areas: BTreeMap<AreaId, AreaInst>,
    pub rooms: HashMap<RoomId, Room>,
    pub mobs: HashMap<MobId, Mobile>,
    pub objs: HashMap<ObjId, Object>,
    pub clock: GameClock,
    pub rng: StdRng,

    /// Rooms of singleton area instances, for world-level vnum lookup.
    default_rooms: HashMap<Vnum, RoomId>,
    /// Rooms per instance, for exit linking inside per-player areas.
    room_index: HashMap<(AreaId, Vnum), RoomId>,
    mob_counts: HashMap<Vnum, i32>,
    obj_counts: HashMap<Vnum, i32>,
    next_id: u64,
}

impl World {
    pub fn new(registry: Registry, rng_seed: u64) -> Self {
        World {
            registry,
            areas: BTreeMap::new(),
            rooms: HashMap::new(),
            mobs: HashMap::new(),
            objs: HashMap::new(),
            clock: GameClock::default(),
            rng: StdRng::seed_from_u64(rng_seed),
            default_rooms: HashMap::new(),
            room_index: HashMap::new(),
            mob_counts: HashMap::new(),
            obj_counts: HashMap::new(),
            next_id: 1,
        }
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ========================================================================
    // Area instancing
    // ========================================================================

    /// Materializes an instance of the area keyed by `proto_key`.
    ///
    /// Rooms are created from every room prototype in the area's vnum
    /// range; exits are linked afterwards by [`World::link_area_exits`]
    /// (boot links all areas in one pass so cross-area exits resolve).
    pub fn instantiate_area(
        &mut self,
        proto_key: Vnum,
        owner: Option<MobId>,
    ) -> WorldResult<AreaId> {
        let proto = Arc::clone(
            self.registry
                .area(proto_key)
                .ok_or(WorldError::UnknownArea(proto_key))?,
        );

        let area_id = AreaId::new(self.alloc_id());
        let mut inst = AreaInst::new(area_id, proto_key, owner);

        let room_protos: Vec<_> = self
            .registry
            .rooms_in_range(proto.min_vnum, proto.max_vnum)
            .cloned()
            .collect();
        if room_protos.is_empty() {
            return Err(WorldError::EmptyArea(proto_key));
        }

        for room_proto in room_protos {
            let room_id = RoomId::new(self.alloc_id());
            let mut room = Room::new(room_id, room_proto.vnum, area_id);
            for (dir, slot) in room_proto.exits.iter().enumerate() {
                if let Some(exit_proto) = slot {
                    let state = if exit_proto.exit_flags & EX_LOCKED != 0 {
                        DoorState::Locked
                    } else if exit_proto.exit_flags & EX_CLOSED != 0 {
                        DoorState::Closed
                    } else {
                        DoorState::Open
                    };
                    room.exits[dir] = Some(Exit {
                        to_room: None,
                        to_vnum: exit_proto.to_vnum,
                        state,
                        exit_flags: exit_proto.exit_flags,
                        key: exit_proto.key,
                        keyword: Arc::clone(&exit_proto.keyword),
                        description: Arc::clone(&exit_proto.description),
                        orig_dir: exit_proto.orig_dir,
                    });
                }
            }
            self.room_index.insert((area_id, room_proto.vnum), room_id);
            if proto.instance_policy == InstancePolicy::Singleton {
                self.default_rooms.insert(room_proto.vnum, room_id);
            }
            inst.rooms.push(room_id);
            self.rooms.insert(room_id, room);
        }

        self.areas.insert(area_id, inst);
        Ok(area_id)
    }

    /// Resolves every exit of an area instance to a live room, preferring
    /// rooms of the same instance and falling back to the singleton world.
    /// Unresolvable destinations stay `None` (the loader already logged
    /// them). Inbound back-references are recorded on the targets.
    pub fn link_area_exits(&mut self, area_id: AreaId) {
        let Some(area) = self.areas.get(&area_id) else {
            bug!(%area_id, "link_area_exits: no such area instance");
            return;
        };
        let room_ids = area.rooms.clone();

        let mut links: Vec<(RoomId, usize, Option<RoomId>)> = Vec::new();
        for &room_id in &room_ids {
            let Some(room) = self.rooms.get(&room_id) else { continue };
            for (dir, slot) in room.exits.iter().enumerate() {
                if let Some(exit) = slot {
                    if exit.to_vnum.is_none() {
                        continue;
                    }
                    let target = self
                        .room_index
                        .get(&(area_id, exit.to_vnum))
                        .or_else(|| self.default_rooms.get(&exit.to_vnum))
                        .copied();
                    links.push((room_id, dir, target));
                }
            }
        }

        for (room_id, dir, target) in links {
            if let Some(room) = self.rooms.get_mut(&room_id) {
                if let Some(exit) = room.exits[dir].as_mut() {
                    exit.to_room = target;
                }
            }
            if let (Some(target_id), Some(direction)) =
                (target, mudstone_types::Direction::from_index(dir))
            {
                if let Some(target_room) = self.rooms.get_mut(&target_id) {
                    target_room.inbound_exits.push((room_id, direction));
                }
            }
        }
    }

    /// Tears down an area instance: extracts every occupant, nulls inbound
    /// exits from other areas, and forgets the rooms. Used when a
    /// per-player instance empties out at reset time.
    pub fn destroy_area_instance(&mut self, area_id: AreaId) {
        let Some(area) = self.areas.remove(&area_id) else {
            bug!(%area_id, "destroy_area_instance: no such instance");
            return;
        };

        for &room_id in &area.rooms {
            let (people, contents, inbound) = match self.rooms.get(&room_id) {
                Some(room) => (
                    room.people.clone(),
                    room.contents.clone(),
                    room.inbound_exits.clone(),
                ),
                None => continue,
            };
            for mob_id in people {
                self.extract_mob(mob_id, true);
            }
            for obj_id in contents {
                self.extract_obj(obj_id);
            }
            for (from_room, direction) in inbound {
                if let Some(source) = self.rooms.get_mut(&from_room) {
                    if let Some(exit) = source.exits[direction.index()].as_mut() {
                        if exit.to_room == Some(room_id) {
                            exit.to_room = None;
                        }
                    }
                }
            }
        }

        for &room_id in &area.rooms {
            if let Some(room) = self.rooms.remove(&room_id) {
                self.room_index.remove(&(area_id, room.vnum));
                if self.default_rooms.get(&room.vnum) == Some(&room_id) {
                    self.default_rooms.remove(&room.vnum);
                }
            }
        }
    }

    /// Rebuilds one room instance from its prototype: the old instance
    /// and its outbound exits are freed, a fresh instance is built, its
    /// exits are re-linked, and inbound exits from other rooms are
    /// re-pointed at the new instance. The caller is responsible for
    /// parking occupants first and restoring them after.
    ///
    /// Returns the new room id, or `None` when the room or its
    /// prototype is missing.
    pub fn rebuild_room(&mut self, old_id: RoomId) -> Option<RoomId> {
        let (vnum, area_id, inbound, outbound) = {
            let room = self.rooms.get(&old_id)?;
            let outbound: Vec<(usize, RoomId)> = room
                .exits
                .iter()
                .enumerate()
                .filter_map(|(dir, e)| Some((dir, e.as_ref()?.to_room?)))
                .collect();
            (room.vnum, room.area, room.inbound_exits.clone(), outbound)
        };
        let proto = self.registry.room(vnum)?.clone();

        // Null every inbound exit pointer into the dying room.
        for &(from_room, direction) in &inbound {
            if let Some(source) = self.rooms.get_mut(&from_room) {
                if let Some(exit) = source.exits[direction.index()].as_mut() {
                    if exit.to_room == Some(old_id) {
                        exit.to_room = None;
                    }
                }
            }
        }
        // Drop the dying room's back-references from its old targets.
        for &(dir, target) in &outbound {
            if let Some(target_room) = self.rooms.get_mut(&target) {
                target_room
                    .inbound_exits
                    .retain(|&(r, d)| !(r == old_id && d.index() == dir));
            }
        }
        self.rooms.remove(&old_id);

        // Fresh instance from the prototype.
        let new_id = RoomId::new(self.alloc_id());
        let mut room = Room::new(new_id, vnum, area_id);
        for (dir, slot) in proto.exits.iter().enumerate() {
            if let Some(exit_proto) = slot {
                let state = if exit_proto.exit_flags & EX_LOCKED != 0 {
                    DoorState::Locked
                } else if exit_proto.exit_flags & EX_CLOSED != 0 {
                    DoorState::Closed
                } else {
                    DoorState::Open
                };
                room.exits[dir] = Some(Exit {
                    to_room: None,
                    to_vnum: exit_proto.to_vnum,
                    state,
                    exit_flags: exit_proto.exit_flags,
                    key: exit_proto.key,
                    keyword: Arc::clone(&exit_proto.keyword),
                    description: Arc::clone(&exit_proto.description),
                    orig_dir: exit_proto.orig_dir,
                });
            }
        }
        self.rooms.insert(new_id, room);
        self.room_index.insert((area_id, vnum), new_id);
        if self.default_rooms.get(&vnum) == Some(&old_id) {
            self.default_rooms.insert(vnum, new_id);
        }
        if let Some(area) = self.areas.get_mut(&area_id) {
            for slot in &mut area.rooms {
                if *slot == old_id {
                    *slot = new_id;
                }
            }
        }

        // Link the new room's outbound exits and register back-references.
        let links: Vec<(usize, Option<RoomId>)> = self
            .rooms
            .get(&new_id)
            .map(|room| {
                room.exits
                    .iter()
                    .enumerate()
                    .filter_map(|(dir, slot)| {
                        let exit = slot.as_ref()?;
                        let target = self
                            .room_index
                            .get(&(area_id, exit.to_vnum))
                            .or_else(|| self.default_rooms.get(&exit.to_vnum))
                            .copied();
                        Some((dir, target))
                    })
                    .collect()
            })
            .unwrap_or_default();
        for (dir, target) in links {
            if let Some(room) = self.rooms.get_mut(&new_id) {
                if let Some(exit) = room.exits[dir].as_mut() {
                    exit.to_room = target;
                }
            }
            if let (Some(target_id), Some(direction)) = (target, Direction::from_index(dir)) {
                if let Some(target_room) = self.rooms.get_mut(&target_id) {
                    target_room.inbound_exits.push((new_id, direction));
                }
            }
        }

        // Inbound exits from elsewhere now reach the rebuilt instance.
        for (from_room, direction) in inbound {
            let mut relinked = false;
            if let Some(source) = self.rooms.get_mut(&from_room) {
                if let Some(exit) = source.exits[direction.index()].as_mut() {
                    if exit.to_vnum == vnum {
                        exit.to_room = Some(new_id);
                        relinked = true;
                    }
                }
            }
            if relinked {
                if let Some(new_room) = self.rooms.get_mut(&new_id) {
                    new_room.inbound_exits.push((from_room, direction));
                }
            }
        }

        Some(new_id)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// The singleton-instance room for a vnum, used by recall, `goto`,
    /// and reset targets.
    pub fn room_by_vnum(&self, vnum: Vnum) -> Option<RoomId> {
        self.default_rooms.get(&vnum).copied()
    }

    /// A specific instance's room for a vnum.
    pub fn room_in_area(&self, area: AreaId, vnum: Vnum) -> Option<RoomId> {
        self.room_index.get(&(area, vnum)).copied()
    }

    /// The per-player instance owned by `owner` for the given area proto.
    pub fn instance_owned_by(&self, proto_key: Vnum, owner: MobId) -> Option<AreaId> {
        self.areas
            .values()
            .find(|a| a.proto == proto_key && a.owner == Some(owner))
            .map(|a| a.id)
    }

    /// Live instance count of a mob prototype.
    pub fn mob_count(&self, vnum: Vnum) -> i32 {
        self.mob_counts.get(&vnum).copied().unwrap_or(0)
    }

    /// Live instance count of an object prototype.
    pub fn obj_count(&self, vnum: Vnum) -> i32 {
        self.obj_counts.get(&vnum).copied().unwrap_or(0)
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Builds a mobile from its prototype. Stats are rolled from the
    /// prototype dice; the new mobile is nowhere until placed.
    pub fn create_mobile(&mut self, vnum: Vnum) -> Option<MobId> {
        let Some(proto) = self.registry.mob(vnum).cloned() else {
            bug!(%vnum, "create_mobile: unknown prototype");
            return None;
        };
        let id = MobId::new(self.alloc_id());
        let mob = self.mobile_from_proto(id, &proto);
        self.mobs.insert(id, mob);
        *self.mob_counts.entry(vnum).or_insert(0) += 1;
        Some(id)
    }

    fn mobile_from_proto(&mut self, id: MobId, proto: &MobProto) -> Mobile {
        let hit = proto.hit.roll(&mut self.rng);
        let mana = proto.mana.roll(&mut self.rng);
        let wealth = if proto.wealth > 0 {
            let w = proto.wealth;
            self.rng.gen_range(w / 2..=w * 3 / 2)
        } else {
            0
        };
        Mobile {
            id,
            proto: Some(proto.vnum),
            name: Arc::clone(&proto.name),
            short_descr: Arc::clone(&proto.short_descr),
            long_descr: Arc::clone(&proto.long_descr),
            description: Arc::clone(&proto.description),
            race: Arc::clone(&proto.race),
            class: "mob".into(),
            clan: "".into(),
            level: proto.level,
            sex: proto.sex,
            size: proto.size,
            alignment: proto.alignment,
            position: proto.start_pos,
            default_pos: proto.default_pos,
            hit,
            max_hit: hit,
            mana,
            max_mana: mana,
            moves: 100,
            max_moves: 100,
            gold: wealth / 100,
            silver: wealth % 100,
            hitroll: proto.hitroll,
            damroll: 0,
            armor: proto.armor[0],
            saving_throw: 0,
            act_flags: proto.act_flags,
            affect_flags: proto.affect_flags,
            off_flags: proto.off_flags,
            imm_flags: proto.imm_flags,
            res_flags: proto.res_flags,
            vuln_flags: proto.vuln_flags,
            comm_flags: 0,
            room: None,
            carrying: Vec::new(),
            equipment: Default::default(),
            affects: Vec::new(),
            fighting: None,
            master: None,
            leader: None,
            reply: None,
            on: None,
            mprog_target: None,
            memory: Vec::new(),
            mprog_delay: 0,
            wait: 0,
            timer: 0,
            player: None,
        }
    }

    /// Builds a fresh player character shell. The login layer fills in
    /// the persisted fields afterwards.
    pub fn create_player(&mut self, name: &str) -> MobId {
        use crate::mobile::PlayerRecord;

        let id = MobId::new(self.alloc_id());
        let mob = Mobile {
            id,
            proto: None,
            name: name.into(),
            short_descr: name.into(),
            long_descr: "".into(),
            description: "".into(),
            race: "human".into(),
            class: "warrior".into(),
            clan: "".into(),
            level: 1,
            sex: mudstone_types::Sex::Neutral,
            size: mudstone_types::Size::Medium,
            alignment: 0,
            position: Position::Standing,
            default_pos: Position::Standing,
            hit: 20,
            max_hit: 20,
            mana: 100,
            max_mana: 100,
            moves: 100,
            max_moves: 100,
            gold: 0,
            silver: 0,
            hitroll: 0,
            damroll: 0,
            armor: 100,
            saving_throw: 0,
            act_flags: 0,
            affect_flags: 0,
            off_flags: 0,
            imm_flags: 0,
            res_flags: 0,
            vuln_flags: 0,
            comm_flags: 0,
            room: None,
            carrying: Vec::new(),
            equipment: Default::default(),
            affects: Vec::new(),
            fighting: None,
            master: None,
            leader: None,
            reply: None,
            on: None,
            mprog_target: None,
            memory: Vec::new(),
            mprog_delay: 0,
            wait: 0,
            timer: 0,
            player: Some(PlayerRecord::default()),
        };
        self.mobs.insert(id, mob);
        id
    }

    /// Builds an object from its prototype at the given level.
    pub fn create_object(&mut self, vnum: Vnum, level: i16) -> Option<ObjId> {
        let Some(proto) = self.registry.object(vnum).cloned() else {
            bug!(%vnum, "create_object: unknown prototype");
            return None;
        };
        let id = ObjId::new(self.alloc_id());
        let obj = Self::object_from_proto(id, &proto, level);
        self.objs.insert(id, obj);
        *self.obj_counts.entry(vnum).or_insert(0) += 1;
        Some(id)
    }

    fn object_from_proto(id: ObjId, proto: &ObjProto, level: i16) -> Object {
        Object {
            id,
            proto: proto.vnum,
            name: Arc::clone(&proto.name),
            short_descr: Arc::clone(&proto.short_descr),
            description: Arc::clone(&proto.description),
            item_type: proto.item_type,
            extra_flags: proto.extra_flags,
            wear_flags: proto.wear_flags,
            values: proto.values,
            weight: proto.weight,
            cost: proto.cost,
            condition: proto.condition,
            level,
            location: ObjLocation::Nowhere,
            wear_loc: None,
            contains: Vec::new(),
            affects: proto.affects.clone(),
            timer: 0,
            enchanted: false,
        }
    }

    // ========================================================================
    // Mobile placement primitives
    // ========================================================================

    /// Adds a mobile to a room, updating both sides and the area player
    /// count. A mobile already somewhere is first removed (idempotence).
    pub fn mob_to_room(&mut self, mob_id: MobId, room_id: RoomId) {
        if !self.rooms.contains_key(&room_id) {
            bug!(%mob_id, %room_id, "mob_to_room: no such room");
            return;
        }
        if self.mobs.get(&mob_id).is_none() {
            bug!(%mob_id, "mob_to_room: no such mobile");
            return;
        }
        if self.mobs[&mob_id].room.is_some() {
            self.mob_from_room(mob_id);
        }

        let is_player = !self.mobs[&mob_id].is_npc();
        let light = self.carried_light(mob_id);

        let Some(room) = self.rooms.get_mut(&room_id) else { return };
        room.people.push(mob_id);
        room.light += light;
        let area_id = room.area;

        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.room = Some(room_id);
        }
        if is_player {
            if let Some(area) = self.areas.get_mut(&area_id) {
                area.player_count += 1;
            }
        }
    }

    /// Removes a mobile from its room. Harmless when it has none.
    pub fn mob_from_room(&mut self, mob_id: MobId) {
        let Some(room_id) = self.mobs.get(&mob_id).and_then(|m| m.room) else {
            return;
        };
        let is_player = !self.mobs[&mob_id].is_npc();
        let light = self.carried_light(mob_id);

        let mut area_id = None;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.people.retain(|&m| m != mob_id);
            room.light -= light;
            area_id = Some(room.area);
        }
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.room = None;
            // Furniture stays in the old room.
            mob.on = None;
        }
        if is_player {
            if let Some(area) = area_id.and_then(|a| self.areas.get_mut(&a)) {
                area.player_count = area.player_count.saturating_sub(1);
            }
        }
    }

    /// Moves a mobile between rooms, preserving the furniture reference
    /// only if the furniture is in the destination room.
    pub fn transfer_mob(&mut self, mob_id: MobId, room_id: RoomId) {
        let furniture = self.mobs.get(&mob_id).and_then(|m| m.on);
        self.mob_from_room(mob_id);
        self.mob_to_room(mob_id, room_id);
        if let Some(obj_id) = furniture {
            let furniture_here =
                matches!(self.objs.get(&obj_id), Some(o) if o.location == ObjLocation::Room(room_id));
            if furniture_here {
                if let Some(mob) = self.mobs.get_mut(&mob_id) {
                    mob.on = Some(obj_id);
                }
            }
        }
    }

    /// Light contributed by a mobile's lit light source, for room light
    /// bookkeeping.
    fn carried_light(&self, mob_id: MobId) -> i32 {
        let Some(mob) = self.mobs.get(&mob_id) else { return 0 };
        match mob.equipped(WearSlot::Light).and_then(|o| self.objs.get(&o)) {
            Some(light) if light.item_type == ItemType::Light && light.values[2] != 0 => 1,
            _ => 0,
        }
    }

    // ========================================================================
    // Object placement primitives
    // ========================================================================

    /// Detaches an object from wherever it is. The object ends up nowhere.
    pub fn obj_from_container(&mut self, obj_id: ObjId) {
        let Some(obj) = self.objs.get(&obj_id) else {
            bug!(%obj_id, "obj_from_container: no such object");
            return;
        };
        let location = obj.location;
        match location {
            ObjLocation::Nowhere => {}
            ObjLocation::Room(room_id) => {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    room.contents.retain(|&o| o != obj_id);
                }
            }
            ObjLocation::Carried(mob_id) => {
                if self.objs[&obj_id].wear_loc.is_some() {
                    self.unequip_mob(mob_id, obj_id);
                }
                if let Some(mob) = self.mobs.get_mut(&mob_id) {
                    mob.carrying.retain(|&o| o != obj_id);
                }
            }
            ObjLocation::Inside(container_id) => {
                if let Some(container) = self.objs.get_mut(&container_id) {
                    container.contains.retain(|&o| o != obj_id);
                }
            }
        }
        if let Some(obj) = self.objs.get_mut(&obj_id) {
            obj.location = ObjLocation::Nowhere;
        }
    }

    /// Places an object on a room floor.
    pub fn obj_to_room(&mut self, obj_id: ObjId, room_id: RoomId) {
        if !self.objs.contains_key(&obj_id) || !self.rooms.contains_key(&room_id) {
            bug!(%obj_id, %room_id, "obj_to_room: missing entity");
            return;
        }
        self.obj_from_container(obj_id);
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.contents.push(obj_id);
        }
        if let Some(obj) = self.objs.get_mut(&obj_id) {
            obj.location = ObjLocation::Room(room_id);
        }
    }

    /// Gives an object to a mobile's inventory.
    pub fn obj_to_mob(&mut self, obj_id: ObjId, mob_id: MobId) {
        if !self.objs.contains_key(&obj_id) || !self.mobs.contains_key(&mob_id) {
            bug!(%obj_id, %mob_id, "obj_to_mob: missing entity");
            return;
        }
        self.obj_from_container(obj_id);
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.carrying.push(obj_id);
        }
        if let Some(obj) = self.objs.get_mut(&obj_id) {
            obj.location = ObjLocation::Carried(mob_id);
        }
    }

    /// Puts an object inside a container object. Self-insertion and
    /// containment cycles are refused.
    pub fn obj_to_obj(&mut self, obj_id: ObjId, container_id: ObjId) {
        if obj_id == container_id {
            bug!(%obj_id, "obj_to_obj: object into itself");
            return;
        }
        if !self.objs.contains_key(&obj_id) || !self.objs.contains_key(&container_id) {
            bug!(%obj_id, %container_id, "obj_to_obj: missing entity");
            return;
        }
        // Refuse cycles: walk up from the container.
        let mut cursor = container_id;
        loop {
            match self.objs.get(&cursor).map(|o| o.location) {
                Some(ObjLocation::Inside(parent)) => {
                    if parent == obj_id {
                        bug!(%obj_id, %container_id, "obj_to_obj: containment cycle");
                        return;
                    }
                    cursor = parent;
                }
                _ => break,
            }
        }
        self.obj_from_container(obj_id);
        if let Some(container) = self.objs.get_mut(&container_id) {
            container.contains.push(obj_id);
        }
        if let Some(obj) = self.objs.get_mut(&obj_id) {
            obj.location = ObjLocation::Inside(container_id);
        }
    }

    // ========================================================================
    // Equipment
    // ========================================================================

    /// Equips a carried object into a wear slot, rolling its affects into
    /// the wearer's effective stats. Refused (with a bug record) if the
    /// slot is taken or the object is not carried by the mobile.
    pub fn equip_mob(&mut self, mob_id: MobId, obj_id: ObjId, slot: WearSlot) {
        let carried = matches!(
            self.objs.get(&obj_id).map(|o| o.location),
            Some(ObjLocation::Carried(m)) if m == mob_id
        );
        if !carried {
            bug!(%mob_id, %obj_id, "equip_mob: object not carried by mobile");
            return;
        }
        let Some(mob) = self.mobs.get(&mob_id) else { return };
        if mob.equipment[slot.index()].is_some() {
            bug!(%mob_id, ?slot, "equip_mob: slot occupied");
            return;
        }

        let affects = self.objs[&obj_id].affects.clone();
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.equipment[slot.index()] = Some(obj_id);
        }
        if let Some(obj) = self.objs.get_mut(&obj_id) {
            obj.wear_loc = Some(slot);
        }
        for affect in &affects {
            self.affect_modify(mob_id, affect, true);
        }

        // A lit light brightens the room.
        if slot == WearSlot::Light && self.carried_light(mob_id) > 0 {
            if let Some(room_id) = self.mobs.get(&mob_id).and_then(|m| m.room) {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    room.light += 1;
                }
            }
        }
    }

    /// Removes an object from its wear slot, unrolling its affects.
    pub fn unequip_mob(&mut self, mob_id: MobId, obj_id: ObjId) {
        let Some(slot) = self.objs.get(&obj_id).and_then(|o| o.wear_loc) else {
            return;
        };
        let was_light = slot == WearSlot::Light && self.carried_light(mob_id) > 0;

        let affects = self.objs[&obj_id].affects.clone();
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            if mob.equipment[slot.index()] == Some(obj_id) {
                mob.equipment[slot.index()] = None;
            } else {
                bug!(%mob_id, %obj_id, "unequip_mob: slot mismatch");
            }
        }
        if let Some(obj) = self.objs.get_mut(&obj_id) {
            obj.wear_loc = None;
        }
        for affect in &affects {
            self.affect_modify(mob_id, affect, false);
        }

        if was_light {
            if let Some(room_id) = self.mobs.get(&mob_id).and_then(|m| m.room) {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    room.light = (room.light - 1).max(0);
                }
            }
        }
    }

    // ========================================================================
    // Affects
    // ========================================================================

    /// The single point that applies an affect's stat deltas. Every add
    /// must be paired with a remove or effective stats drift.
    pub fn affect_modify(&mut self, mob_id: MobId, affect: &Affect, add: bool) {
        let Some(mob) = self.mobs.get_mut(&mob_id) else {
            bug!(%mob_id, "affect_modify: no such mobile");
            return;
        };
        let mod_ = if add { affect.modifier } else { -affect.modifier };
        match affect.location {
            AffectLocation::Hitroll => mob.hitroll += mod_,
            AffectLocation::Damroll => mob.damroll += mod_,
            AffectLocation::Armor => mob.armor += mod_,
            AffectLocation::SavingThrow => mob.saving_throw += mod_,
            AffectLocation::Hp => {
                mob.max_hit += mod_;
                mob.hit = mob.hit.min(mob.max_hit);
            }
            AffectLocation::Mana => {
                mob.max_mana += mod_;
                mob.mana = mob.mana.min(mob.max_mana);
            }
            AffectLocation::Move => {
                mob.max_moves += mod_;
                mob.moves = mob.moves.min(mob.max_moves);
            }
            // Attribute locations only matter for the stat sheet; the
            // simulation tracks the four combat caches above.
            _ => {}
        }
        let word: &mut Flags = match affect.where_ {
            AffectWhere::Affects => &mut mob.affect_flags,
            AffectWhere::Immune => &mut mob.imm_flags,
            AffectWhere::Resist => &mut mob.res_flags,
            AffectWhere::Vuln => &mut mob.vuln_flags,
            AffectWhere::ObjectFlags | AffectWhere::WeaponFlags => return,
        };
        if add {
            *word |= affect.bitvector;
        } else {
            *word &= !affect.bitvector;
        }
    }

    /// Attaches a new affect, applying its deltas.
    pub fn affect_to_mob(&mut self, mob_id: MobId, affect: Affect) {
        self.affect_modify(mob_id, &affect, true);
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.affects.push(affect);
        }
    }

    /// Joins an affect with any existing one from the same skill: the old
    /// affect is unapplied, merged, and the combined affect re-applied.
    pub fn affect_join(&mut self, mob_id: MobId, affect: Affect) {
        let existing = self
            .mobs
            .get(&mob_id)
            .and_then(|m| m.affects.iter().position(|a| a.skill == affect.skill));
        match existing {
            Some(index) => {
                let mut merged = {
                    let Some(mob) = self.mobs.get_mut(&mob_id) else { return };
                    mob.affects.remove(index)
                };
                self.affect_modify(mob_id, &merged, false);
                merged.join(&affect);
                self.affect_to_mob(mob_id, merged);
            }
            None => self.affect_to_mob(mob_id, affect),
        }
    }

    /// Removes one affect by index, unapplying its deltas.
    pub fn affect_remove(&mut self, mob_id: MobId, index: usize) {
        let Some(mob) = self.mobs.get_mut(&mob_id) else { return };
        if index >= mob.affects.len() {
            bug!(%mob_id, index, "affect_remove: no matching affect");
            return;
        }
        let affect = mob.affects.remove(index);
        self.affect_modify(mob_id, &affect, false);
    }

    /// Strips every affect from a given skill.
    pub fn affect_strip(&mut self, mob_id: MobId, skill: &str) {
        loop {
            let index = self
                .mobs
                .get(&mob_id)
                .and_then(|m| m.affects.iter().position(|a| &*a.skill == skill));
            match index {
                Some(i) => self.affect_remove(mob_id, i),
                None => break,
            }
        }
    }

    // ========================================================================
    // Extraction
    // ========================================================================

    /// Removes a mobile from the world: out of combat, out of follow
    /// chains, out of its room; carried objects are extracted
    /// (`with_carry`) or dropped where the mobile stood. Every weak
    /// reference naming the mobile is cleared. Idempotent: extracting an
    /// already-gone id logs a bug and returns.
    pub fn extract_mob(&mut self, mob_id: MobId, with_carry: bool) {
        if !self.mobs.contains_key(&mob_id) {
            bug!(%mob_id, "extract_mob: already extracted");
            return;
        }

        let room = self.mobs[&mob_id].room;

        // Carried and worn objects.
        let carried: Vec<ObjId> = self.mobs[&mob_id].carrying.clone();
        for obj_id in carried {
            if with_carry {
                self.extract_obj(obj_id);
            } else if let Some(room_id) = room {
                self.obj_to_room(obj_id, room_id);
            } else {
                self.extract_obj(obj_id);
            }
        }

        self.stop_fighting(mob_id, true);
        self.mob_from_room(mob_id);

        // Clear every weak reference to the dying mobile.
        for other in self.mobs.values_mut() {
            if other.fighting == Some(mob_id) {
                other.fighting = None;
                if other.position == Position::Fighting {
                    other.position = Position::Standing;
                }
            }
            if other.master == Some(mob_id) {
                other.master = None;
            }
            if other.leader == Some(mob_id) {
                other.leader = None;
            }
            if other.reply == Some(mob_id) {
                other.reply = None;
            }
            if other.mprog_target == Some(mob_id) {
                other.mprog_target = None;
            }
            other.memory.retain(|&m| m != mob_id);
        }

        let Some(mob) = self.mobs.remove(&mob_id) else { return };
        if let Some(vnum) = mob.proto {
            let count = self.mob_counts.entry(vnum).or_insert(0);
            *count -= 1;
            if *count < 0 {
                bug!(%vnum, "extract_mob: negative prototype count");
                *count = 0;
            }
        }
    }

    /// Ends combat for a mobile; with `both`, also releases everyone
    /// fighting it.
    pub fn stop_fighting(&mut self, mob_id: MobId, both: bool) {
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.fighting = None;
            if mob.position == Position::Fighting {
                mob.position = Position::Standing;
            }
        }
        if both {
            for other in self.mobs.values_mut() {
                if other.fighting == Some(mob_id) {
                    other.fighting = None;
                    if other.position == Position::Fighting {
                        other.position = Position::Standing;
                    }
                }
            }
        }
    }

    /// Removes an object from the world. Corpse contents are destroyed
    /// with the corpse; other containers spill their contents into the
    /// parent location. Idempotent.
    pub fn extract_obj(&mut self, obj_id: ObjId) {
        if !self.objs.contains_key(&obj_id) {
            bug!(%obj_id, "extract_obj: already extracted");
            return;
        }

        let parent = self.objs[&obj_id].location;
        let destroys = self.objs[&obj_id].destroys_contents();
        let contents: Vec<ObjId> = self.objs[&obj_id].contains.clone();
        for inner in contents {
            if destroys {
                self.extract_obj(inner);
            } else {
                match parent {
                    ObjLocation::Room(room_id) => self.obj_to_room(inner, room_id),
                    ObjLocation::Carried(mob_id) => self.obj_to_mob(inner, mob_id),
                    ObjLocation::Inside(container) => self.obj_to_obj(inner, container),
                    ObjLocation::Nowhere => self.extract_obj(inner),
                }
            }
        }

        self.obj_from_container(obj_id);

        // Clear furniture references.
        for mob in self.mobs.values_mut() {
            if mob.on == Some(obj_id) {
                mob.on = None;
            }
        }

        let Some(obj) = self.objs.remove(&obj_id) else { return };
        let count = self.obj_counts.entry(obj.proto).or_insert(0);
        *count -= 1;
        if *count < 0 {
            bug!(vnum = %obj.proto, "extract_obj: negative prototype count");
            *count = 0;
        }
    }

    // ========================================================================
    // Follow chains
    // ========================================================================

    /// Makes `follower` follow `master`.
    pub fn add_follower(&mut self, follower: MobId, master: MobId) {
        if follower == master {
            return;
        }
        if let Some(mob) = self.mobs.get_mut(&follower) {
            if mob.master.is_some() {
                bug!(%follower, "add_follower: already following");
                return;
            }
            mob.master = Some(master);
        }
    }

    /// Stops `follower` from following; clears charm if present.
    pub fn stop_follower(&mut self, follower: MobId) {
        if let Some(mob) = self.mobs.get_mut(&follower) {
            mob.master = None;
            mob.leader = None;
            mob.affect_flags &= !mudstone_types::AFF_CHARM;
        }
    }

    /// Strips the hide bit; called before any command executes.
    pub fn reveal(&mut self, mob_id: MobId) {
        if let Some(mob) = self.mobs.get_mut(&mob_id) {
            mob.affect_flags &= !AFF_HIDE;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::small_world;
    use super::*;
    use mudstone_types::Direction;

    #[test]
    fn instantiate_links_exits_and_backrefs() {
        let (world, _area) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let r2 = world.room_by_vnum(Vnum::new(3002)).unwrap();
        let exit = world.rooms[&r1].exit(Direction::North).unwrap();
        assert_eq!(exit.to_room, Some(r2));
        assert!(world.rooms[&r2].inbound_exits.contains(&(r1, Direction::North)));
    }

    #[test]
    fn mob_room_membership_is_symmetric() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(mob, r1);
        assert_eq!(world.mobs[&mob].room, Some(r1));
        assert!(world.rooms[&r1].people.contains(&mob));

        world.mob_from_room(mob);
        assert_eq!(world.mobs[&mob].room, None);
        assert!(!world.rooms[&r1].people.contains(&mob));
    }

    #[test]
    fn extract_clears_every_weak_reference() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let victim = world.create_mobile(Vnum::new(3000)).unwrap();
        let other = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(victim, r1);
        world.mob_to_room(other, r1);
        {
            let mob = world.mobs.get_mut(&other).unwrap();
            mob.fighting = Some(victim);
            mob.master = Some(victim);
            mob.reply = Some(victim);
            mob.mprog_target = Some(victim);
            mob.memory.push(victim);
        }

        world.extract_mob(victim, true);

        let mob = &world.mobs[&other];
        assert_eq!(mob.fighting, None);
        assert_eq!(mob.master, None);
        assert_eq!(mob.reply, None);
        assert_eq!(mob.mprog_target, None);
        assert!(mob.memory.is_empty());
        assert_eq!(world.mob_count(Vnum::new(3000)), 1);
    }

    #[test]
    fn extract_is_idempotent() {
        let (mut world, _) = small_world();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        world.extract_mob(mob, true);
        world.extract_mob(mob, true); // second call must be harmless
        assert_eq!(world.mob_count(Vnum::new(3000)), 0);
    }

    #[test]
    fn corpse_contents_die_with_the_corpse() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let chest = world.create_object(Vnum::new(3011), 1).unwrap();
        world.objs.get_mut(&chest).unwrap().item_type = ItemType::Corpse;
        let coin = world.create_object(Vnum::new(3010), 1).unwrap();
        world.obj_to_room(chest, r1);
        world.obj_to_obj(coin, chest);

        world.extract_obj(chest);
        assert!(!world.objs.contains_key(&coin));
        assert!(!world.objs.contains_key(&chest));
    }

    #[test]
    fn container_contents_spill_on_extract() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let chest = world.create_object(Vnum::new(3011), 1).unwrap();
        let coin = world.create_object(Vnum::new(3010), 1).unwrap();
        world.obj_to_room(chest, r1);
        world.obj_to_obj(coin, chest);

        world.extract_obj(chest);
        assert_eq!(world.objs[&coin].location, ObjLocation::Room(r1));
        assert!(world.rooms[&r1].contents.contains(&coin));
    }

    #[test]
    fn equip_rolls_affects_in_and_out() {
        use crate::affect::{Affect, AffectLocation, AffectWhere};

        let (mut world, _) = small_world();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        let obj = world.create_object(Vnum::new(3010), 1).unwrap();
        world.objs.get_mut(&obj).unwrap().affects.push(Affect {
            skill: "enchant weapon".into(),
            where_: AffectWhere::Affects,
            location: AffectLocation::Hitroll,
            modifier: 3,
            duration: -1,
            level: 20,
            bitvector: 0,
        });
        world.obj_to_mob(obj, mob);

        let base = world.mobs[&mob].hitroll;
        world.equip_mob(mob, obj, WearSlot::Wield);
        assert_eq!(world.mobs[&mob].hitroll, base + 3);
        world.unequip_mob(mob, obj);
        assert_eq!(world.mobs[&mob].hitroll, base);
    }

    #[test]
    fn equip_refuses_occupied_slot() {
        let (mut world, _) = small_world();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        let first = world.create_object(Vnum::new(3010), 1).unwrap();
        let second = world.create_object(Vnum::new(3010), 1).unwrap();
        world.obj_to_mob(first, mob);
        world.obj_to_mob(second, mob);

        world.equip_mob(mob, first, WearSlot::Hold);
        world.equip_mob(mob, second, WearSlot::Hold);
        assert_eq!(world.mobs[&mob].equipped(WearSlot::Hold), Some(first));
        assert_eq!(world.objs[&second].wear_loc, None);
    }

    #[test]
    fn obj_to_obj_refuses_cycles() {
        let (mut world, _) = small_world();
        let a = world.create_object(Vnum::new(3011), 1).unwrap();
        let b = world.create_object(Vnum::new(3011), 1).unwrap();
        world.obj_to_obj(b, a);
        world.obj_to_obj(a, b); // would close a cycle
        assert_eq!(world.objs[&a].location, ObjLocation::Nowhere);
    }

    #[test]
    fn affect_join_merges_same_skill() {
        use crate::affect::{Affect, AffectLocation, AffectWhere};

        let (mut world, _) = small_world();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        let bless = |duration, modifier| Affect {
            skill: "bless".into(),
            where_: AffectWhere::Affects,
            location: AffectLocation::Hitroll,
            modifier,
            duration,
            level: 10,
            bitvector: 0,
        };
        let base = world.mobs[&mob].hitroll;
        world.affect_join(mob, bless(10, 2));
        world.affect_join(mob, bless(5, 1));
        assert_eq!(world.mobs[&mob].affects.len(), 1);
        assert_eq!(world.mobs[&mob].affects[0].duration, 15);
        assert_eq!(world.mobs[&mob].hitroll, base + 3);
    }

    #[test]
    fn per_player_instance_teardown_removes_rooms() {
        use crate::area::InstancePolicy;
        use crate::sim::{area_proto, room_proto};

        let mut registry = Registry::new();
        registry.insert_area(area_proto(100, 199, InstancePolicy::PerPlayer));
        registry.insert_room(room_proto(100));
        registry.insert_room(room_proto(101));
        let mut world = World::new(registry, 7);
        let area = world.instantiate_area(Vnum::new(100), None).unwrap();
        world.link_area_exits(area);
        let room_ids: Vec<RoomId> = world.areas[&area].rooms.clone();
        assert_eq!(room_ids.len(), 2);

        world.destroy_area_instance(area);
        assert!(world.areas.is_empty());
        for id in room_ids {
            assert!(!world.rooms.contains_key(&id));
        }
    }
}
