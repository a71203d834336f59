//! Prototype registry: vnum-keyed maps for areas, rooms, mobiles, objects,
//! and mobprog scripts. Built by the loader at boot; prototype references
//! are stable (`Arc`) for the process lifetime.

use std::collections::BTreeMap;
use std::sync::Arc;

use mudstone_types::Vnum;

use crate::bug;
use crate::proto::{AreaProto, MobProto, MobProgScript, ObjProto, RoomProto};

/// All prototypes in the world, keyed by vnum.
///
/// `BTreeMap` rather than a hash map: listing commands and the reset
/// engine want ascending-vnum iteration, and vnum spaces are small.
#[derive(Debug, Default)]
pub struct Registry {
    /// Areas keyed by their `min_vnum`.
    areas: BTreeMap<Vnum, Arc<AreaProto>>,
    rooms: BTreeMap<Vnum, Arc<RoomProto>>,
    mobs: BTreeMap<Vnum, Arc<MobProto>>,
    objects: BTreeMap<Vnum, Arc<ObjProto>>,
    progs: BTreeMap<Vnum, Arc<MobProgScript>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an area prototype. Duplicate keys are a boot bug: the
    /// first registration wins and the collision is logged.
    pub fn insert_area(&mut self, proto: AreaProto) -> Arc<AreaProto> {
        let key = proto.min_vnum;
        let arc = Arc::new(proto);
        if let Some(existing) = self.areas.get(&key) {
            bug!(vnum = %key, "duplicate area prototype");
            return Arc::clone(existing);
        }
        self.areas.insert(key, Arc::clone(&arc));
        arc
    }

    pub fn insert_room(&mut self, proto: RoomProto) -> bool {
        let vnum = proto.vnum;
        if self.rooms.contains_key(&vnum) {
            bug!(%vnum, "duplicate room prototype");
            return false;
        }
        self.rooms.insert(vnum, Arc::new(proto));
        true
    }

    pub fn insert_mob(&mut self, proto: MobProto) -> bool {
        let vnum = proto.vnum;
        if self.mobs.contains_key(&vnum) {
            bug!(%vnum, "duplicate mob prototype");
            return false;
        }
        self.mobs.insert(vnum, Arc::new(proto));
        true
    }

    pub fn insert_object(&mut self, proto: ObjProto) -> bool {
        let vnum = proto.vnum;
        if self.objects.contains_key(&vnum) {
            bug!(%vnum, "duplicate object prototype");
            return false;
        }
        self.objects.insert(vnum, Arc::new(proto));
        true
    }

    pub fn insert_prog(&mut self, script: MobProgScript) -> bool {
        let vnum = script.vnum;
        if self.progs.contains_key(&vnum) {
            bug!(%vnum, "duplicate mobprog");
            return false;
        }
        self.progs.insert(vnum, Arc::new(script));
        true
    }

    pub fn area(&self, key: Vnum) -> Option<&Arc<AreaProto>> {
        self.areas.get(&key)
    }

    pub fn room(&self, vnum: Vnum) -> Option<&Arc<RoomProto>> {
        self.rooms.get(&vnum)
    }

    pub fn mob(&self, vnum: Vnum) -> Option<&Arc<MobProto>> {
        self.mobs.get(&vnum)
    }

    pub fn object(&self, vnum: Vnum) -> Option<&Arc<ObjProto>> {
        self.objects.get(&vnum)
    }

    pub fn prog(&self, vnum: Vnum) -> Option<&Arc<MobProgScript>> {
        self.progs.get(&vnum)
    }

    /// Areas in ascending vnum-range order.
    pub fn areas(&self) -> impl Iterator<Item = &Arc<AreaProto>> {
        self.areas.values()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Arc<RoomProto>> {
        self.rooms.values()
    }

    pub fn mobs(&self) -> impl Iterator<Item = &Arc<MobProto>> {
        self.mobs.values()
    }

    pub fn objects(&self) -> impl Iterator<Item = &Arc<ObjProto>> {
        self.objects.values()
    }

    pub fn progs(&self) -> impl Iterator<Item = &Arc<MobProgScript>> {
        self.progs.values()
    }

    /// Rooms whose vnums fall inside an area's range, ascending.
    pub fn rooms_in_range(
        &self,
        min: Vnum,
        max: Vnum,
    ) -> impl Iterator<Item = &Arc<RoomProto>> {
        self.rooms.range(min..=max).map(|(_, proto)| proto)
    }

    /// The area whose vnum range contains `vnum`, if any.
    pub fn area_of_vnum(&self, vnum: Vnum) -> Option<&Arc<AreaProto>> {
        self.areas
            .values()
            .find(|a| a.min_vnum <= vnum && vnum <= a.max_vnum)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn mob_count(&self) -> usize {
        self.mobs.len()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim;

    #[test]
    fn duplicate_room_is_rejected() {
        let mut registry = Registry::new();
        assert!(registry.insert_room(sim::room_proto(3001)));
        assert!(!registry.insert_room(sim::room_proto(3001)));
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn range_iteration_is_ascending() {
        let mut registry = Registry::new();
        for vnum in [3005, 3001, 3003] {
            registry.insert_room(sim::room_proto(vnum));
        }
        let vnums: Vec<i32> = registry
            .rooms_in_range(Vnum::new(3000), Vnum::new(3010))
            .map(|r| r.vnum.get())
            .collect();
        assert_eq!(vnums, vec![3001, 3003, 3005]);
    }
}
