//! The reset engine: re-materializes an area instance's contents from the
//! per-room reset scripts.
//!
//! One pass walks the instance's rooms in ascending vnum order. `M` and
//! `O` establish the "last mobile" / "last container" context consumed by
//! `G`, `E`, and `P`. Population caps are enforced per command; a missing
//! prototype logs a bug and skips the command, never aborting the pass.

use rand::Rng;

use mudstone_types::{AreaId, DoorState, Direction, MobId, ObjId, Position, Vnum, WearSlot};

use crate::bug;
use crate::proto::Reset;
use crate::world::World;

/// Threaded context between reset commands within one room list walk.
#[derive(Default)]
struct ResetCtx {
    /// Mobile created by the most recent successful `M`.
    last_mob: Option<MobId>,
    /// Set when the most recent `M` was skipped for caps, so `G`/`E`
    /// riders are skipped too rather than piling onto an older mobile.
    last_mob_skipped: bool,
    /// Container created by the most recent successful `O`.
    last_obj: Option<ObjId>,
}

/// Resets one area instance. Deterministic given the world RNG state.
pub fn reset_area(world: &mut World, area_id: AreaId) {
    let Some(area) = world.areas.get(&area_id) else {
        bug!(%area_id, "reset_area: no such instance");
        return;
    };
    let room_ids = area.rooms.clone();

    for room_id in room_ids {
        let Some(vnum) = world.rooms.get(&room_id).map(|r| r.vnum) else {
            continue;
        };
        let Some(proto) = world.registry.room(vnum).cloned() else {
            continue;
        };
        let mut ctx = ResetCtx::default();
        for reset in &proto.resets {
            apply_reset(world, area_id, *reset, &mut ctx);
        }
    }

    if let Some(area) = world.areas.get_mut(&area_id) {
        area.reset_timer = 0;
        area.age += 1;
    }
}

fn apply_reset(world: &mut World, area_id: AreaId, reset: Reset, ctx: &mut ResetCtx) {
    match reset {
        Reset::Mob {
            mob,
            area_max,
            room,
            room_max,
        } => {
            ctx.last_mob_skipped = false;
            let Some(room_id) = world.room_in_area(area_id, room) else {
                bug!(%room, "reset M: no such room in area");
                ctx.last_mob_skipped = true;
                return;
            };
            if world.registry.mob(mob).is_none() {
                bug!(vnum = %mob, "reset M: missing mob prototype");
                ctx.last_mob_skipped = true;
                return;
            }
            if world.mob_count(mob) >= area_max {
                ctx.last_mob_skipped = true;
                return;
            }
            let in_room = world
                .rooms
                .get(&room_id)
                .map_or(0, |r| {
                    r.people
                        .iter()
                        .filter(|m| {
                            world.mobs.get(m).is_some_and(|mm| mm.proto == Some(mob))
                        })
                        .count() as i32
                });
            if in_room >= room_max {
                ctx.last_mob_skipped = true;
                return;
            }
            if let Some(mob_id) = world.create_mobile(mob) {
                world.mob_to_room(mob_id, room_id);
                ctx.last_mob = Some(mob_id);
            }
        }

        Reset::Obj { obj, world_max, room } => {
            ctx.last_obj = None;
            let Some(room_id) = world.room_in_area(area_id, room) else {
                bug!(%room, "reset O: no such room in area");
                return;
            };
            if world.registry.object(obj).is_none() {
                bug!(vnum = %obj, "reset O: missing object prototype");
                return;
            }
            if world.obj_count(obj) >= world_max || world.room_has_obj_vnum(room_id, obj) {
                return;
            }
            let level = world.registry.object(obj).map_or(1, |p| p.level);
            if let Some(obj_id) = world.create_object(obj, level) {
                world.obj_to_room(obj_id, room_id);
                ctx.last_obj = Some(obj_id);
            }
        }

        Reset::Put {
            obj,
            world_max,
            container,
            container_max,
        } => {
            if world.registry.object(obj).is_none() {
                bug!(vnum = %obj, "reset P: missing object prototype");
                return;
            }
            let target = match ctx.last_obj {
                Some(id) if world.objs.get(&id).is_some_and(|o| o.proto == container) => {
                    Some(id)
                }
                _ => None,
            };
            let Some(container_id) = target else {
                bug!(vnum = %container, "reset P: no container loaded");
                return;
            };
            if world.obj_count(obj) >= world_max {
                return;
            }
            let inside = world
                .objs
                .get(&container_id)
                .map_or(0, |c| {
                    c.contains
                        .iter()
                        .filter(|o| world.objs.get(o).is_some_and(|oo| oo.proto == obj))
                        .count() as i32
                });
            if inside >= container_max.max(1) {
                return;
            }
            let level = world.registry.object(obj).map_or(1, |p| p.level);
            if let Some(obj_id) = world.create_object(obj, level) {
                world.obj_to_obj(obj_id, container_id);
            }
        }

        Reset::Give { obj } => {
            if ctx.last_mob_skipped {
                return;
            }
            let Some(mob_id) = ctx.last_mob else {
                bug!(vnum = %obj, "reset G: no mobile loaded");
                return;
            };
            if world.registry.object(obj).is_none() {
                bug!(vnum = %obj, "reset G: missing object prototype");
                return;
            }
            let level = world.registry.object(obj).map_or(1, |p| p.level);
            if let Some(obj_id) = world.create_object(obj, level) {
                world.obj_to_mob(obj_id, mob_id);
            }
        }

        Reset::Equip { obj, slot } => {
            if ctx.last_mob_skipped {
                return;
            }
            let Some(mob_id) = ctx.last_mob else {
                bug!(vnum = %obj, "reset E: no mobile loaded");
                return;
            };
            if world.registry.object(obj).is_none() {
                bug!(vnum = %obj, "reset E: missing object prototype");
                return;
            }
            let Some(wear_slot) = WearSlot::from_number(slot) else {
                bug!(vnum = %obj, slot, "reset E: bad wear location");
                return;
            };
            let level = world.registry.object(obj).map_or(1, |p| p.level);
            if let Some(obj_id) = world.create_object(obj, level) {
                world.obj_to_mob(obj_id, mob_id);
                world.equip_mob(mob_id, obj_id, wear_slot);
            }
        }

        Reset::Door {
            room,
            direction,
            state,
        } => {
            let Some(room_id) = world.room_in_area(area_id, room) else {
                bug!(%room, "reset D: no such room in area");
                return;
            };
            let Some(dir) = usize::try_from(direction)
                .ok()
                .and_then(Direction::from_index)
            else {
                bug!(%room, direction, "reset D: bad direction");
                return;
            };
            let Some(door_state) = DoorState::from_reset_arg(state) else {
                bug!(%room, state, "reset D: bad door state");
                return;
            };
            match world
                .rooms
                .get_mut(&room_id)
                .and_then(|r| r.exits[dir.index()].as_mut())
            {
                Some(exit) => exit.state = door_state,
                None => bug!(%room, %dir, "reset D: no exit"),
            }
        }

        Reset::Randomize { room, count } => {
            let Some(room_id) = world.room_in_area(area_id, room) else {
                bug!(%room, "reset R: no such room in area");
                return;
            };
            let limit = usize::try_from(count)
                .unwrap_or(0)
                .min(mudstone_types::DIR_MAX);
            // Fisher-Yates over the first `limit` exit slots.
            for i in (1..limit).rev() {
                let j = world.rng.gen_range(0..=i);
                if let Some(r) = world.rooms.get_mut(&room_id) {
                    r.exits.swap(i, j);
                }
            }
        }
    }

    // A mobile loaded by reset starts in its prototype default position.
    if let Reset::Mob { .. } = reset {
        if let Some(mob_id) = ctx.last_mob {
            if let Some(mob) = world.mobs.get_mut(&mob_id) {
                if mob.position != Position::Fighting {
                    mob.position = mob.default_pos;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::Reset;
    use crate::registry::Registry;
    use crate::sim::{
        area_proto, mob_proto, obj_proto, room_proto,
    };
    use crate::world::World;
    use crate::InstancePolicy;
    use mudstone_types::ItemType;

    fn reset_world(resets: Vec<Reset>) -> (World, AreaId) {
        let mut registry = Registry::new();
        registry.insert_area(area_proto(3000, 3099, InstancePolicy::Singleton));
        let mut room = room_proto(3001);
        room.resets = resets;
        registry.insert_room(room);
        registry.insert_room(room_proto(3002));
        registry.insert_mob(mob_proto(3000));
        registry.insert_object(obj_proto(3010, ItemType::Trash));
        let mut chest = obj_proto(3011, ItemType::Container);
        chest.name = "chest".into();
        registry.insert_object(chest);
        let mut sword = obj_proto(3012, ItemType::Weapon);
        sword.wear_flags |= mudstone_types::WEAR_FLAG_WIELD;
        registry.insert_object(sword);

        let mut world = World::new(registry, 1234);
        let area = world.instantiate_area(Vnum::new(3000), None).unwrap();
        world.link_area_exits(area);
        (world, area)
    }

    fn mob_reset(max: i32, room_max: i32) -> Reset {
        Reset::Mob {
            mob: Vnum::new(3000),
            area_max: max,
            room: Vnum::new(3001),
            room_max,
        }
    }

    #[test]
    fn mob_reset_honors_caps() {
        let (mut world, area) = reset_world(vec![mob_reset(2, 1)]);
        reset_area(&mut world, area);
        assert_eq!(world.mob_count(Vnum::new(3000)), 1);

        // Already one in the room: the room cap holds the line.
        reset_area(&mut world, area);
        assert_eq!(world.mob_count(Vnum::new(3000)), 1);
    }

    #[test]
    fn slain_mob_comes_back_on_next_reset() {
        let (mut world, area) = reset_world(vec![mob_reset(1, 1)]);
        reset_area(&mut world, area);
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob_id = world.rooms[&r1].people[0];
        world.extract_mob(mob_id, true);
        assert_eq!(world.mob_count(Vnum::new(3000)), 0);

        reset_area(&mut world, area);
        assert_eq!(world.mob_count(Vnum::new(3000)), 1);
        assert_eq!(world.rooms[&r1].people.len(), 1);
    }

    #[test]
    fn object_reset_skips_duplicate_in_room() {
        let (mut world, area) = reset_world(vec![Reset::Obj {
            obj: Vnum::new(3010),
            world_max: 10,
            room: Vnum::new(3001),
        }]);
        reset_area(&mut world, area);
        reset_area(&mut world, area);
        assert_eq!(world.obj_count(Vnum::new(3010)), 1);
    }

    #[test]
    fn put_threads_through_last_container() {
        let (mut world, area) = reset_world(vec![
            Reset::Obj {
                obj: Vnum::new(3011),
                world_max: 10,
                room: Vnum::new(3001),
            },
            Reset::Put {
                obj: Vnum::new(3010),
                world_max: 10,
                container: Vnum::new(3011),
                container_max: 1,
            },
        ]);
        reset_area(&mut world, area);
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let chest = world.rooms[&r1].contents[0];
        assert_eq!(world.objs[&chest].contains.len(), 1);
    }

    #[test]
    fn give_and_equip_ride_the_last_mob() {
        let (mut world, area) = reset_world(vec![
            mob_reset(1, 1),
            Reset::Give { obj: Vnum::new(3010) },
            Reset::Equip {
                obj: Vnum::new(3012),
                slot: WearSlot::Wield.index() as i32,
            },
        ]);
        reset_area(&mut world, area);
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob_id = world.rooms[&r1].people[0];
        let mob = &world.mobs[&mob_id];
        assert_eq!(mob.carrying.len(), 2);
        assert!(mob.equipped(WearSlot::Wield).is_some());
    }

    #[test]
    fn give_skipped_when_mob_capped() {
        let (mut world, area) = reset_world(vec![
            mob_reset(1, 1),
            Reset::Give { obj: Vnum::new(3010) },
        ]);
        reset_area(&mut world, area);
        assert_eq!(world.obj_count(Vnum::new(3010)), 1);
        // Second pass: the mob is capped, so its G rider must not run.
        reset_area(&mut world, area);
        assert_eq!(world.obj_count(Vnum::new(3010)), 1);
    }

    #[test]
    fn door_reset_sets_state() {
        use crate::proto::ExitProto;

        let mut registry = Registry::new();
        registry.insert_area(area_proto(3000, 3099, InstancePolicy::Singleton));
        let mut room = room_proto(3001);
        room.exits[0] = Some(ExitProto {
            to_vnum: Vnum::new(3002),
            key: Vnum::NONE,
            exit_flags: mudstone_types::EX_ISDOOR,
            keyword: "door".into(),
            description: "".into(),
            orig_dir: Direction::North,
        });
        room.resets = vec![Reset::Door {
            room: Vnum::new(3001),
            direction: 0,
            state: 2,
        }];
        registry.insert_room(room);
        registry.insert_room(room_proto(3002));
        let mut world = World::new(registry, 5);
        let area = world.instantiate_area(Vnum::new(3000), None).unwrap();
        world.link_area_exits(area);

        reset_area(&mut world, area);
        let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
        assert_eq!(
            world.rooms[&r1].exit(Direction::North).unwrap().state,
            DoorState::Locked
        );
    }

    #[test]
    fn reset_is_deterministic_for_equal_seeds() {
        let build = || {
            let (mut world, area) = reset_world(vec![
                mob_reset(3, 3),
                Reset::Obj {
                    obj: Vnum::new(3010),
                    world_max: 5,
                    room: Vnum::new(3001),
                },
            ]);
            reset_area(&mut world, area);
            reset_area(&mut world, area);
            let r1 = world.room_by_vnum(Vnum::new(3001)).unwrap();
            let mobs: Vec<i32> = world.rooms[&r1]
                .people
                .iter()
                .filter_map(|m| world.mobs[m].proto.map(Vnum::get))
                .collect();
            let hits: Vec<i32> = world.rooms[&r1]
                .people
                .iter()
                .map(|m| world.mobs[m].max_hit)
                .collect();
            (mobs, hits, world.obj_count(Vnum::new(3010)))
        };
        assert_eq!(build(), build());
    }
}
