//! Tick categories: the periodic work the heartbeat runs on top of
//! socket I/O. Each category runs on its own cadence, every cadence a
//! multiple of the pulse.

use rand::Rng;

use mudstone_mobprog::Interpreter;
use mudstone_types::{
    Direction, ItemType, MobId, ObjId, Position, ACT_AGGRESSIVE, ACT_SCAVENGER, ACT_SENTINEL,
    ACT_STAY_AREA, AFF_CHARM, AFF_POISON, AFF_REGENERATION, PULSE_AUTOSAVE, PULSE_MOBILE,
    PULSE_TICK, ROOM_INDOORS, ROOM_NO_MOB, ROOM_SAFE, WEAR_TAKE,
};
use mudstone_world::{reset_area, InstancePolicy, World};

use crate::act::{act, ActArg, ActTo};
use crate::fight;
use crate::game::GameIo;
use crate::nanny;
use crate::spec_fns;
use crate::wiznet::{self, WiznetEvent};

/// Idle ticks before a lingering player is voided to safety.
const IDLE_VOID: i32 = 12;
/// Idle ticks before the descriptor is closed outright.
const IDLE_PURGE: i32 = 24;

/// Runs every tick category due at this pulse. Called once per pulse,
/// after input processing and before output flushing.
pub fn pulse_update(world: &mut World, io: &mut GameIo) {
    io.pulse += 1;

    // Violence resolves every pulse: one round per engaged pair.
    fight::violence_update(world, io);

    if io.pulse % u64::from(PULSE_MOBILE) == 0 {
        mobile_update(world, io);
    }
    if io.pulse % u64::from(PULSE_TICK) == 0 {
        point_update(world, io);
    }

    area_update(world, io);

    if io.pulse % u64::from(PULSE_AUTOSAVE) == 0 {
        for (_, mob_id) in io.playing() {
            nanny::save_character(world, io, mob_id);
        }
    }
}

/// Per-NPC behavior: delayed programs, spec funs, scavenging, wander,
/// aggression, random triggers.
fn mobile_update(world: &mut World, io: &mut GameIo) {
    let npcs: Vec<MobId> = world
        .mobs
        .values()
        .filter(|m| m.is_npc() && m.room.is_some())
        .map(|m| m.id)
        .collect();

    for mob_id in npcs {
        if !world.mobs.contains_key(&mob_id) {
            continue; // extracted earlier this tick
        }

        // Delayed program countdown.
        let fire_delay = {
            let Some(mob) = world.mobs.get_mut(&mob_id) else { continue };
            if mob.mprog_delay > 0 {
                mob.mprog_delay -= 1;
                mob.mprog_delay == 0
            } else {
                false
            }
        };
        if fire_delay {
            let mut interp = Interpreter::new(io);
            mudstone_mobprog::delay_trigger(world, &mut interp, mob_id);
            if !world.mobs.contains_key(&mob_id) {
                continue;
            }
        }

        let busy = world
            .mobs
            .get(&mob_id)
            .is_none_or(|m| m.fighting.is_some() || m.has_affect(AFF_CHARM) || !m.position.is_awake());
        if busy {
            continue;
        }

        // Random program trigger.
        {
            let mut interp = Interpreter::new(io);
            if mudstone_mobprog::random_trigger(world, &mut interp, mob_id) {
                continue;
            }
            if !world.mobs.contains_key(&mob_id) {
                continue;
            }
        }

        // Assigned special behavior.
        let spec = world
            .mobs
            .get(&mob_id)
            .and_then(|m| m.proto)
            .and_then(|v| world.registry.mob(v).cloned())
            .and_then(|p| p.spec_fun.clone());
        if let Some(name) = spec {
            if let Some(function) = spec_fns::lookup(&name) {
                if function(world, io, mob_id) {
                    continue;
                }
            } else {
                tracing::warn!(target: "bug", spec = %name, "unknown spec fun");
            }
        }

        aggression(world, io, mob_id);
        if !world.mobs.contains_key(&mob_id) {
            continue;
        }
        scavenge(world, io, mob_id);
        wander(world, io, mob_id);
    }
}

/// Aggressive NPCs jump visible mortals in their room.
fn aggression(world: &mut World, io: &mut GameIo, mob_id: MobId) {
    let aggressive = world
        .mobs
        .get(&mob_id)
        .is_some_and(|m| m.act_flags & ACT_AGGRESSIVE != 0 && m.fighting.is_none());
    if !aggressive {
        return;
    }
    let Some(room_id) = world.mobs.get(&mob_id).and_then(|m| m.room) else { return };
    if world.room_flags(room_id) & ROOM_SAFE != 0 {
        return;
    }
    let mob_level = world.mobs.get(&mob_id).map_or(0, |m| m.level);
    let victim = world
        .rooms
        .get(&room_id)
        .map(|r| r.people.clone())
        .unwrap_or_default()
        .into_iter()
        .find(|&v| {
            world.mobs.get(&v).is_some_and(|target| {
                !target.is_npc()
                    && !target.is_immortal()
                    && target.level <= mob_level + 5
            }) && world.can_see(mob_id, v)
        });
    if let Some(victim) = victim {
        act(world, io, "$n screams and attacks you!", mob_id, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
        fight::set_fighting(world, mob_id, victim);
    }
}

/// Scavengers pick up the most valuable takeable item on the floor.
fn scavenge(world: &mut World, io: &mut GameIo, mob_id: MobId) {
    let scavenger = world
        .mobs
        .get(&mob_id)
        .is_some_and(|m| m.act_flags & ACT_SCAVENGER != 0);
    if !scavenger || world.rng.gen_range(0..64) != 0 {
        return;
    }
    let Some(room_id) = world.mobs.get(&mob_id).and_then(|m| m.room) else { return };
    let best: Option<ObjId> = world
        .rooms
        .get(&room_id)
        .map(|r| r.contents.clone())
        .unwrap_or_default()
        .into_iter()
        .filter(|&o| {
            world
                .objs
                .get(&o)
                .is_some_and(|obj| obj.wear_flags & WEAR_TAKE != 0 && obj.cost > 0)
        })
        .max_by_key(|&o| world.objs.get(&o).map_or(0, |obj| obj.cost));
    if let Some(obj_id) = best {
        world.obj_to_mob(obj_id, mob_id);
        act(world, io, "$n gets $p.", mob_id, ActArg::Obj(obj_id), ActArg::None, ActTo::Room);
    }
}

/// Non-sentinel NPCs drift through open exits, honoring stay-area and
/// no-mob rooms.
fn wander(world: &mut World, io: &mut GameIo, mob_id: MobId) {
    let wanders = world
        .mobs
        .get(&mob_id)
        .is_some_and(|m| m.act_flags & ACT_SENTINEL == 0);
    if !wanders || world.rng.gen_range(0..8) != 0 {
        return;
    }
    let Some(room_id) = world.mobs.get(&mob_id).and_then(|m| m.room) else { return };
    let dir_index = world.rng.gen_range(0..mudstone_types::DIR_MAX);
    let dir = Direction::ALL[dir_index];
    let target = world
        .rooms
        .get(&room_id)
        .and_then(|r| r.exit(dir))
        .filter(|e| !e.state.is_closed())
        .and_then(|e| e.to_room);
    let Some(target) = target else { return };
    if world.room_flags(target) & ROOM_NO_MOB != 0 {
        return;
    }
    let stay_area = world
        .mobs
        .get(&mob_id)
        .is_some_and(|m| m.act_flags & ACT_STAY_AREA != 0);
    if stay_area {
        let same_area = world.rooms.get(&room_id).map(|r| r.area)
            == world.rooms.get(&target).map(|r| r.area);
        if !same_area {
            return;
        }
    }
    crate::act_move::move_char(world, io, mob_id, dir, false);
}

/// The point tick: time, weather, regeneration, affect durations, DoTs,
/// object timers, and idle players.
fn point_update(world: &mut World, io: &mut GameIo) {
    // Time and weather.
    if let Some(message) = world.clock.advance_hour(&mut world.rng) {
        let outdoors: Vec<MobId> = io
            .playing()
            .into_iter()
            .filter_map(|(_, m)| {
                let room = world.mobs.get(&m)?.room?;
                (world.room_flags(room) & ROOM_INDOORS == 0).then_some(m)
            })
            .collect();
        for mob_id in outdoors {
            io.send_to_char(mob_id, &format!("{message}\n\r"));
        }
    }

    // Mobiles: regeneration, affect expiry, poison, idle timers.
    let mob_ids: Vec<MobId> = world.mobs.keys().copied().collect();
    for mob_id in mob_ids {
        if !world.mobs.contains_key(&mob_id) {
            continue;
        }
        regen(world, mob_id);
        expire_affects(world, io, mob_id);
        if !world.mobs.contains_key(&mob_id) {
            continue;
        }
        poison_tick(world, io, mob_id);
        if !world.mobs.contains_key(&mob_id) {
            continue;
        }
        idle_tick(world, io, mob_id);
    }

    // Objects: rot timers.
    let obj_ids: Vec<ObjId> = world
        .objs
        .values()
        .filter(|o| o.timer > 0)
        .map(|o| o.id)
        .collect();
    for obj_id in obj_ids {
        let expired = {
            let Some(obj) = world.objs.get_mut(&obj_id) else { continue };
            obj.timer -= 1;
            obj.timer <= 0
        };
        if expired {
            let (message, room) = world
                .objs
                .get(&obj_id)
                .map(|o| {
                    let message = match o.item_type {
                        ItemType::Corpse => "$p decays into dust.",
                        ItemType::Food => "$p decomposes.",
                        _ => "$p crumbles into dust.",
                    };
                    (message, world.obj_room(obj_id))
                })
                .unwrap_or(("$p crumbles into dust.", None));
            if let Some(room_id) = room {
                let witnesses: Vec<MobId> = world
                    .rooms
                    .get(&room_id)
                    .map(|r| r.people.clone())
                    .unwrap_or_default();
                if let Some(&first) = witnesses.first() {
                    act(world, io, message, first, ActArg::Obj(obj_id), ActArg::None, ActTo::All);
                }
            }
            world.extract_obj(obj_id);
        }
    }
}

fn regen(world: &mut World, mob_id: MobId) {
    let Some(mob) = world.mobs.get_mut(&mob_id) else { return };
    if mob.position == Position::Dead {
        return;
    }
    let mut gain = match mob.position {
        Position::Sleeping => 3 + i32::from(mob.level),
        Position::Resting => 2 + i32::from(mob.level) / 2,
        _ => 1 + i32::from(mob.level) / 4,
    };
    if mob.has_affect(AFF_REGENERATION) {
        gain *= 2;
    }
    if mob.has_affect(AFF_POISON) {
        gain /= 4;
    }
    mob.hit = (mob.hit + gain).min(mob.max_hit);
    mob.mana = (mob.mana + gain).min(mob.max_mana);
    mob.moves = (mob.moves + gain).min(mob.max_moves);
}

/// Decrements affect durations, dropping each affect as it reaches zero
/// with its wear-off message.
fn expire_affects(world: &mut World, io: &mut GameIo, mob_id: MobId) {
    {
        let Some(mob) = world.mobs.get_mut(&mob_id) else { return };
        for affect in &mut mob.affects {
            if !affect.is_permanent() && affect.duration > 0 {
                affect.duration -= 1;
            }
        }
    }
    loop {
        let expired = world.mobs.get(&mob_id).and_then(|m| {
            m.affects
                .iter()
                .position(|a| !a.is_permanent() && a.duration == 0)
        });
        let Some(index) = expired else { return };
        let skill = world
            .mobs
            .get(&mob_id)
            .and_then(|m| m.affects.get(index))
            .map(|a| a.skill.to_string())
            .unwrap_or_default();
        world.affect_remove(mob_id, index);
        io.send_to_char(mob_id, &format!("The {skill} effect wears off.\n\r"));
    }
}

fn poison_tick(world: &mut World, io: &mut GameIo, mob_id: MobId) {
    let poisoned = world
        .mobs
        .get(&mob_id)
        .is_some_and(|m| m.has_affect(AFF_POISON) && m.position > Position::Dead);
    if !poisoned {
        return;
    }
    act(world, io, "$n shivers and suffers.", mob_id, ActArg::None, ActArg::None, ActTo::Room);
    io.send_to_char(mob_id, "You shiver and suffer.\n\r");
    let level = world.mobs.get(&mob_id).map_or(1, |m| i32::from(m.level));
    fight::damage(
        world,
        io,
        mob_id,
        mob_id,
        (level / 10).max(1),
        mudstone_types::DamageType::Poison,
        false,
    );
}

/// Idle players are voided out of the world, then purged.
fn idle_tick(world: &mut World, io: &mut GameIo, mob_id: MobId) {
    let timer = {
        let Some(mob) = world.mobs.get_mut(&mob_id) else { return };
        if mob.is_npc() {
            return;
        }
        mob.timer += 1;
        mob.timer
    };

    if timer == IDLE_VOID {
        let name = world
            .mobs
            .get(&mob_id)
            .map_or_else(String::new, |m| m.first_name().to_string());
        // Out of any public room, saved, but still connected.
        act(world, io, "$n disappears into the void.", mob_id, ActArg::None, ActArg::None, ActTo::Room);
        io.send_to_char(mob_id, "You disappear into the void.\n\r");
        nanny::save_character(world, io, mob_id);
        world.mob_from_room(mob_id);
        wiznet::wiznet(world, io, &format!("{name} idles into the void."), Some(mob_id), WiznetEvent::Links, 0);
    } else if timer >= IDLE_PURGE {
        if let Some(desc) = io.desc_of(mob_id) {
            io.net.close(desc);
        }
        nanny::save_character(world, io, mob_id);
        io.unbind_char(mob_id);
        world.extract_mob(mob_id, true);
    }
}

/// Advances area reset timers one pulse. An empty instance reaches its
/// threshold in half the pulses; a per-player instance with no players
/// at reset time is destroyed instead of reset.
fn area_update(world: &mut World, io: &mut GameIo) {
    let areas: Vec<_> = world.areas.keys().copied().collect();
    for area_id in areas {
        let (due, empty, policy, name) = {
            let Some(area) = world.areas.get_mut(&area_id) else { continue };
            area.reset_timer += 1;
            let Some(proto) = world.registry.area(area.proto) else { continue };
            // Areas that set no interval use the configured default.
            let mut threshold = if proto.reset_interval == 0 {
                io.config.game.reset_interval.max(1)
            } else {
                proto.reset_interval
            };
            if area.player_count == 0 {
                threshold /= 2;
            }
            (
                area.reset_timer >= threshold.max(1),
                area.player_count == 0,
                proto.instance_policy,
                proto.name.to_string(),
            )
        };
        if !due {
            continue;
        }
        if policy == InstancePolicy::PerPlayer && empty {
            world.destroy_area_instance(area_id);
            continue;
        }
        reset_area(world, area_id);
        wiznet::wiznet(
            world,
            io,
            &format!("{name} has just been reset."),
            None,
            WiznetEvent::Resets,
            0,
        );
    }
}

