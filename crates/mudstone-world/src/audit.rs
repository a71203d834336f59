//! Graph invariant audit.
//!
//! Checks the structural invariants that must hold at every scheduler
//! quiescence point. Used by tests after every scenario and by the
//! `audit` wiz command; each violation is returned as a human-readable
//! line and also logged as a bug.

use mudstone_types::{MobId, ObjId};

use crate::bug;
use crate::object::ObjLocation;
use crate::world::World;

impl World {
    /// Audits the entity graph, returning one line per violation. An
    /// empty result means every invariant holds.
    pub fn audit(&self) -> Vec<String> {
        let mut violations = Vec::new();
        self.audit_object_containment(&mut violations);
        self.audit_mobile_rooms(&mut violations);
        self.audit_exits(&mut violations);
        self.audit_combat(&mut violations);
        self.audit_equipment(&mut violations);
        self.audit_counts(&mut violations);
        self.audit_weak_refs(&mut violations);
        for line in &violations {
            bug!("audit: {line}");
        }
        violations
    }

    /// Invariant 1: each object's container lists it, and only that one.
    fn audit_object_containment(&self, out: &mut Vec<String>) {
        for (&obj_id, obj) in &self.objs {
            let listed = match obj.location {
                ObjLocation::Nowhere => true,
                ObjLocation::Room(room) => self
                    .rooms
                    .get(&room)
                    .is_some_and(|r| r.contents.contains(&obj_id)),
                ObjLocation::Carried(mob) => self
                    .mobs
                    .get(&mob)
                    .is_some_and(|m| m.carrying.contains(&obj_id)),
                ObjLocation::Inside(container) => self
                    .objs
                    .get(&container)
                    .is_some_and(|c| c.contains.contains(&obj_id)),
            };
            if !listed {
                out.push(format!("object {obj_id} not listed by its container"));
            }
        }
        // Reverse direction: nothing lists an object that does not point back.
        for (&room_id, room) in &self.rooms {
            for obj_id in &room.contents {
                if !matches!(
                    self.objs.get(obj_id).map(|o| o.location),
                    Some(ObjLocation::Room(r)) if r == room_id
                ) {
                    out.push(format!("room {room_id} lists stray object {obj_id}"));
                }
            }
        }
        for (&mob_id, mob) in &self.mobs {
            for obj_id in &mob.carrying {
                if !matches!(
                    self.objs.get(obj_id).map(|o| o.location),
                    Some(ObjLocation::Carried(m)) if m == mob_id
                ) {
                    out.push(format!("mobile {mob_id} lists stray object {obj_id}"));
                }
            }
        }
    }

    /// Invariant 2: room membership is symmetric.
    fn audit_mobile_rooms(&self, out: &mut Vec<String>) {
        for (&mob_id, mob) in &self.mobs {
            if let Some(room_id) = mob.room {
                if !self
                    .rooms
                    .get(&room_id)
                    .is_some_and(|r| r.people.contains(&mob_id))
                {
                    out.push(format!("mobile {mob_id} not listed by room {room_id}"));
                }
            }
        }
        for (&room_id, room) in &self.rooms {
            for &mob_id in &room.people {
                if self.mobs.get(&mob_id).map(|m| m.room) != Some(Some(room_id)) {
                    out.push(format!("room {room_id} lists stray mobile {mob_id}"));
                }
            }
        }
    }

    /// Invariant 3: exits reference live rooms; invariant on area
    /// membership (every occupant's room belongs to its area's list).
    fn audit_exits(&self, out: &mut Vec<String>) {
        for (&room_id, room) in &self.rooms {
            for exit in room.exits.iter().flatten() {
                if let Some(target) = exit.to_room {
                    if !self.rooms.contains_key(&target) {
                        out.push(format!("room {room_id} exit to dead room {target}"));
                    }
                }
            }
            if !self
                .areas
                .get(&room.area)
                .is_some_and(|a| a.rooms.contains(&room_id))
            {
                out.push(format!("room {room_id} not listed by its area"));
            }
        }
    }

    /// Testable property: fighting targets are live and co-located.
    fn audit_combat(&self, out: &mut Vec<String>) {
        for (&mob_id, mob) in &self.mobs {
            if let Some(victim_id) = mob.fighting {
                match self.mobs.get(&victim_id) {
                    None => out.push(format!("mobile {mob_id} fighting dead {victim_id}")),
                    Some(victim) if victim.room != mob.room => {
                        out.push(format!("mobile {mob_id} fighting {victim_id} in another room"));
                    }
                    _ => {}
                }
            }
        }
    }

    /// Invariant 7: wear slots and wear_loc agree.
    fn audit_equipment(&self, out: &mut Vec<String>) {
        for (&mob_id, mob) in &self.mobs {
            for (index, slot) in mob.equipment.iter().enumerate() {
                if let Some(obj_id) = slot {
                    let agrees = self.objs.get(obj_id).is_some_and(|o| {
                        o.wear_loc.is_some_and(|w| w.index() == index)
                            && o.location == ObjLocation::Carried(mob_id)
                    });
                    if !agrees {
                        out.push(format!("mobile {mob_id} slot {index} disagrees with {obj_id}"));
                    }
                }
            }
        }
        for (&obj_id, obj) in &self.objs {
            if let Some(slot) = obj.wear_loc {
                let worn = matches!(obj.location, ObjLocation::Carried(m)
                    if self.mobs.get(&m).is_some_and(|mob| mob.equipment[slot.index()] == Some(obj_id)));
                if !worn {
                    out.push(format!("object {obj_id} claims wear slot it does not occupy"));
                }
            }
        }
    }

    /// Invariant 5: prototype counts equal live instances.
    fn audit_counts(&self, out: &mut Vec<String>) {
        let mut mob_tally: std::collections::HashMap<_, i32> = std::collections::HashMap::new();
        for mob in self.mobs.values() {
            if let Some(vnum) = mob.proto {
                *mob_tally.entry(vnum).or_insert(0) += 1;
            }
        }
        for (vnum, &tally) in &mob_tally {
            if self.mob_count(*vnum) != tally {
                out.push(format!(
                    "mob prototype {vnum} count {} != live {tally}",
                    self.mob_count(*vnum)
                ));
            }
        }
        let mut obj_tally: std::collections::HashMap<_, i32> = std::collections::HashMap::new();
        for obj in self.objs.values() {
            *obj_tally.entry(obj.proto).or_insert(0) += 1;
        }
        for (vnum, &tally) in &obj_tally {
            if self.obj_count(*vnum) != tally {
                out.push(format!(
                    "object prototype {vnum} count {} != live {tally}",
                    self.obj_count(*vnum)
                ));
            }
        }
    }

    /// Invariant 6: no weak reference names a dead entity.
    fn audit_weak_refs(&self, out: &mut Vec<String>) {
        let live_mob = |id: Option<MobId>| id.is_none_or(|m| self.mobs.contains_key(&m));
        let live_obj = |id: Option<ObjId>| id.is_none_or(|o| self.objs.contains_key(&o));
        for (&mob_id, mob) in &self.mobs {
            for (name, target) in [
                ("fighting", mob.fighting),
                ("master", mob.master),
                ("leader", mob.leader),
                ("reply", mob.reply),
                ("mprog_target", mob.mprog_target),
            ] {
                if !live_mob(target) {
                    out.push(format!("mobile {mob_id} {name} names a dead mobile"));
                }
            }
            if !live_obj(mob.on) {
                out.push(format!("mobile {mob_id} sits on a dead object"));
            }
            for &remembered in &mob.memory {
                if !self.mobs.contains_key(&remembered) {
                    out.push(format!("mobile {mob_id} remembers a dead mobile"));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::small_world;
    use mudstone_types::{Vnum, WearSlot};

    #[test]
    fn clean_world_audits_clean() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        let obj = world.create_object(Vnum::new(3010), 1).unwrap();
        world.mob_to_room(mob, r1);
        world.obj_to_mob(obj, mob);
        world.equip_mob(mob, obj, WearSlot::Hold);
        assert!(world.audit().is_empty(), "{:?}", world.audit());
    }

    #[test]
    fn audit_catches_corruption() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(mob, r1);
        // Corrupt on purpose: room forgets the occupant.
        world.rooms.get_mut(&r1).unwrap().people.clear();
        assert!(!world.audit().is_empty());
    }

    #[test]
    fn audit_stays_clean_through_extraction() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        let other = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(mob, r1);
        world.mob_to_room(other, r1);
        world.mobs.get_mut(&other).unwrap().fighting = Some(mob);
        world.extract_mob(mob, true);
        assert!(world.audit().is_empty(), "{:?}", world.audit());
    }
}
