//! Read-only world queries: visibility, keyword targeting, room census.
//!
//! These are the lookups shared by the command surface and the mobprog
//! checks. Scans driven by user input are capped at `SEARCH_CAP` entries
//! to keep any single command under the pulse budget.

use mudstone_types::{
    ItemType, MobId, ObjId, RoomId, Vnum, AFF_BLIND, AFF_DETECT_HIDDEN, AFF_DETECT_INVIS,
    AFF_HIDE, AFF_INFRARED, AFF_INVISIBLE, ITEM_INVIS, PLR_HOLYLIGHT, PLR_WIZINVIS,
    ROOM_DARK, SEARCH_CAP,
};

use crate::mobile::is_name;
use crate::object::ObjLocation;
use crate::world::World;

/// Room census filter for [`World::count_people_room`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Census {
    All,
    Players,
    Npcs,
    /// NPCs sharing the viewer's prototype.
    Clones,
    /// Members of the viewer's group.
    Group,
}

impl World {
    /// Whether a room is dark for ordinary sight.
    pub fn room_is_dark(&self, room_id: RoomId) -> bool {
        let Some(room) = self.rooms.get(&room_id) else { return false };
        if room.light > 0 {
            return false;
        }
        if self.room_flags(room_id) & ROOM_DARK != 0 {
            return true;
        }
        self.clock.is_dark()
    }

    /// Room flags resolved through the prototype.
    pub fn room_flags(&self, room_id: RoomId) -> mudstone_types::Flags {
        self.rooms
            .get(&room_id)
            .and_then(|r| self.registry.room(r.vnum))
            .map_or(0, |p| p.room_flags)
    }

    /// Whether `viewer` can see `target`. Mirrors the classic rules:
    /// blindness, darkness vs infravision, invisibility vs detect,
    /// hiding vs detect, and wizinvis vs trust.
    pub fn can_see(&self, viewer: MobId, target: MobId) -> bool {
        if viewer == target {
            return true;
        }
        let (Some(v), Some(t)) = (self.mobs.get(&viewer), self.mobs.get(&target)) else {
            return false;
        };
        if !v.is_npc() && v.act_flags & PLR_HOLYLIGHT != 0 {
            return true;
        }
        if v.has_affect(AFF_BLIND) {
            return false;
        }
        if let Some(room) = v.room {
            if self.room_is_dark(room) && !v.has_affect(AFF_INFRARED) {
                return false;
            }
        }
        if !t.is_npc() && t.act_flags & PLR_WIZINVIS != 0 && v.trust() < t.trust() {
            return false;
        }
        if t.has_affect(AFF_INVISIBLE) && !v.has_affect(AFF_DETECT_INVIS) {
            return false;
        }
        if t.has_affect(AFF_HIDE) && !v.has_affect(AFF_DETECT_HIDDEN) && t.fighting.is_none() {
            return false;
        }
        true
    }

    /// Whether `viewer` can see an object.
    pub fn can_see_obj(&self, viewer: MobId, obj_id: ObjId) -> bool {
        let (Some(v), Some(o)) = (self.mobs.get(&viewer), self.objs.get(&obj_id)) else {
            return false;
        };
        if !v.is_npc() && v.act_flags & PLR_HOLYLIGHT != 0 {
            return true;
        }
        if v.has_affect(AFF_BLIND) {
            return false;
        }
        if o.extra_flags & ITEM_INVIS != 0 && !v.has_affect(AFF_DETECT_INVIS) {
            return false;
        }
        true
    }

    /// Finds a visible mobile in the viewer's room by keyword, honoring
    /// `2.guard` style ordinals.
    pub fn find_mob_room(&self, viewer: MobId, argument: &str) -> Option<MobId> {
        let room = self.mobs.get(&viewer)?.room?;
        let (count, keyword) = split_ordinal(argument);
        if keyword.eq_ignore_ascii_case("self") {
            return Some(viewer);
        }
        let mut seen = 0;
        for &mob_id in &self.rooms.get(&room)?.people {
            let Some(mob) = self.mobs.get(&mob_id) else { continue };
            if mob.answers_to(keyword) && self.can_see(viewer, mob_id) {
                seen += 1;
                if seen >= count {
                    return Some(mob_id);
                }
            }
        }
        None
    }

    /// Finds a visible mobile anywhere in the world, searching the
    /// viewer's room first. Capped.
    pub fn find_mob_world(&self, viewer: MobId, argument: &str) -> Option<MobId> {
        if let Some(found) = self.find_mob_room(viewer, argument) {
            return Some(found);
        }
        let (count, keyword) = split_ordinal(argument);
        let mut seen = 0;
        for (&mob_id, mob) in self.mobs.iter().take(SEARCH_CAP) {
            if mob.answers_to(keyword) && self.can_see(viewer, mob_id) {
                seen += 1;
                if seen >= count {
                    return Some(mob_id);
                }
            }
        }
        None
    }

    /// Finds a mob instance of a given prototype in a room.
    pub fn find_mob_vnum_room(&self, room_id: RoomId, vnum: Vnum) -> Option<MobId> {
        self.rooms.get(&room_id)?.people.iter().copied().find(|m| {
            self.mobs.get(m).is_some_and(|mob| mob.proto == Some(vnum))
        })
    }

    /// Whether a room holds an object of a given prototype.
    pub fn room_has_obj_vnum(&self, room_id: RoomId, vnum: Vnum) -> bool {
        self.rooms.get(&room_id).is_some_and(|room| {
            room.contents
                .iter()
                .any(|o| self.objs.get(o).is_some_and(|obj| obj.proto == vnum))
        })
    }

    /// Finds an object by keyword in the viewer's inventory.
    pub fn find_obj_carry(&self, viewer: MobId, argument: &str) -> Option<ObjId> {
        let (count, keyword) = split_ordinal(argument);
        let mut seen = 0;
        for &obj_id in &self.mobs.get(&viewer)?.carrying {
            let Some(obj) = self.objs.get(&obj_id) else { continue };
            if obj.wear_loc.is_none()
                && is_name(keyword, &obj.name)
                && self.can_see_obj(viewer, obj_id)
            {
                seen += 1;
                if seen >= count {
                    return Some(obj_id);
                }
            }
        }
        None
    }

    /// Finds an object by keyword among the viewer's worn equipment.
    pub fn find_obj_wear(&self, viewer: MobId, argument: &str) -> Option<ObjId> {
        let (count, keyword) = split_ordinal(argument);
        let mut seen = 0;
        for slot in self.mobs.get(&viewer)?.equipment.iter().flatten() {
            let Some(obj) = self.objs.get(slot) else { continue };
            if is_name(keyword, &obj.name) && self.can_see_obj(viewer, *slot) {
                seen += 1;
                if seen >= count {
                    return Some(*slot);
                }
            }
        }
        None
    }

    /// Finds an object here: inventory, equipment, then the room floor.
    pub fn find_obj_here(&self, viewer: MobId, argument: &str) -> Option<ObjId> {
        if let Some(found) = self.find_obj_carry(viewer, argument) {
            return Some(found);
        }
        if let Some(found) = self.find_obj_wear(viewer, argument) {
            return Some(found);
        }
        let room = self.mobs.get(&viewer)?.room?;
        let (count, keyword) = split_ordinal(argument);
        let mut seen = 0;
        for &obj_id in &self.rooms.get(&room)?.contents {
            let Some(obj) = self.objs.get(&obj_id) else { continue };
            if is_name(keyword, &obj.name) && self.can_see_obj(viewer, obj_id) {
                seen += 1;
                if seen >= count {
                    return Some(obj_id);
                }
            }
        }
        None
    }

    /// Finds an object anywhere. Capped scan.
    pub fn find_obj_world(&self, viewer: MobId, argument: &str) -> Option<ObjId> {
        if let Some(found) = self.find_obj_here(viewer, argument) {
            return Some(found);
        }
        let (count, keyword) = split_ordinal(argument);
        let mut seen = 0;
        for (&obj_id, obj) in self.objs.iter().take(SEARCH_CAP) {
            if is_name(keyword, &obj.name) && self.can_see_obj(viewer, obj_id) {
                seen += 1;
                if seen >= count {
                    return Some(obj_id);
                }
            }
        }
        None
    }

    /// Whether a mobile carries (or, with `worn_only`, wears) an item
    /// matching a vnum and/or item type.
    pub fn has_item(
        &self,
        mob_id: MobId,
        vnum: Option<Vnum>,
        item_type: Option<ItemType>,
        worn_only: bool,
    ) -> bool {
        let Some(mob) = self.mobs.get(&mob_id) else { return false };
        mob.carrying.iter().any(|obj_id| {
            self.objs.get(obj_id).is_some_and(|obj| {
                vnum.is_none_or(|v| obj.proto == v)
                    && item_type.is_none_or(|t| obj.item_type == t)
                    && (!worn_only || obj.wear_loc.is_some())
            })
        })
    }

    /// Counts other people in the viewer's room matching the filter.
    pub fn count_people_room(&self, viewer: MobId, filter: Census) -> i32 {
        let Some(mob) = self.mobs.get(&viewer) else { return 0 };
        let Some(room) = mob.room.and_then(|r| self.rooms.get(&r)) else {
            return 0;
        };
        let viewer_proto = mob.proto;
        let viewer_leader = mob.leader.or(Some(viewer));
        room.people
            .iter()
            .filter(|&&other_id| {
                if other_id == viewer {
                    return false;
                }
                let Some(other) = self.mobs.get(&other_id) else {
                    return false;
                };
                let matches = match filter {
                    Census::All => true,
                    Census::Players => !other.is_npc(),
                    Census::Npcs => other.is_npc(),
                    Census::Clones => {
                        other.is_npc() && viewer_proto.is_some() && other.proto == viewer_proto
                    }
                    Census::Group => other.leader.or(Some(other_id)) == viewer_leader,
                };
                matches && self.can_see(viewer, other_id)
            })
            .count() as i32
    }

    /// Position of this NPC among same-vnum NPCs in the room, so only the
    /// first of several identical mobs acts on a shared trigger.
    pub fn mob_order(&self, mob_id: MobId) -> i32 {
        let Some(mob) = self.mobs.get(&mob_id) else { return 0 };
        if !mob.is_npc() {
            return 0;
        }
        let Some(room) = mob.room.and_then(|r| self.rooms.get(&r)) else {
            return 0;
        };
        let mut order = 0;
        for &other_id in &room.people {
            if other_id == mob_id {
                return order;
            }
            if self
                .mobs
                .get(&other_id)
                .is_some_and(|o| o.is_npc() && o.proto == mob.proto)
            {
                order += 1;
            }
        }
        0
    }

    /// A random visible player in the mobile's room.
    pub fn random_player_in_room(&mut self, viewer: MobId) -> Option<MobId> {
        use rand::Rng;
        let room = self.mobs.get(&viewer)?.room?;
        let candidates: Vec<MobId> = self
            .rooms
            .get(&room)?
            .people
            .iter()
            .copied()
            .filter(|&m| {
                m != viewer
                    && self.mobs.get(&m).is_some_and(|mob| !mob.is_npc())
                    && self.can_see(viewer, m)
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(0..candidates.len());
        Some(candidates[pick])
    }

    /// The room an object ultimately sits in, walking container chains.
    pub fn obj_room(&self, obj_id: ObjId) -> Option<RoomId> {
        let mut cursor = obj_id;
        for _ in 0..64 {
            match self.objs.get(&cursor)?.location {
                ObjLocation::Room(room) => return Some(room),
                ObjLocation::Carried(mob) => return self.mobs.get(&mob)?.room,
                ObjLocation::Inside(container) => cursor = container,
                ObjLocation::Nowhere => return None,
            }
        }
        None
    }
}

/// Splits `2.sword` into (2, "sword"); a bare keyword is ordinal 1.
pub fn split_ordinal(argument: &str) -> (usize, &str) {
    if let Some((digits, rest)) = argument.split_once('.') {
        if let Ok(n) = digits.parse::<usize>() {
            return (n.max(1), rest);
        }
    }
    (1, argument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::small_world;
    use mudstone_types::Vnum;

    #[test]
    fn split_ordinal_forms() {
        assert_eq!(split_ordinal("sword"), (1, "sword"));
        assert_eq!(split_ordinal("3.sword"), (3, "sword"));
        assert_eq!(split_ordinal("x.sword"), (1, "x.sword"));
    }

    #[test]
    fn find_mob_room_honors_ordinals() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let first = world.create_mobile(Vnum::new(3000)).unwrap();
        let second = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(first, r1);
        world.mob_to_room(second, r1);

        assert_eq!(world.find_mob_room(first, "rat"), Some(first));
        assert_eq!(world.find_mob_room(first, "2.rat"), Some(second));
        assert_eq!(world.find_mob_room(first, "3.rat"), None);
    }

    #[test]
    fn mob_order_counts_same_vnum_only() {
        let (mut world, _) = small_world();
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let first = world.create_mobile(Vnum::new(3000)).unwrap();
        let second = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(first, r1);
        world.mob_to_room(second, r1);
        assert_eq!(world.mob_order(first), 0);
        assert_eq!(world.mob_order(second), 1);
    }

    #[test]
    fn has_item_by_vnum_and_wear() {
        let (mut world, _) = small_world();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        let obj = world.create_object(Vnum::new(3010), 1).unwrap();
        world.obj_to_mob(obj, mob);
        assert!(world.has_item(mob, Some(Vnum::new(3010)), None, false));
        assert!(!world.has_item(mob, Some(Vnum::new(3010)), None, true));
        assert!(!world.has_item(mob, Some(Vnum::new(9999)), None, false));
    }
}
