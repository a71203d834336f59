//! The mob command table: builtins available to programs as `mob <cmd>`.
//!
//! These skip the trust and position gates of the player command table;
//! a program is trusted by construction. `mob call` is not here: the
//! interpreter handles it so the re-entry depth limit applies.

use mudstone_types::{Direction, MobId, Vnum};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::act_info::show_room;
use crate::fight;
use crate::game::GameIo;

type MobCmd = fn(&mut World, &mut GameIo, MobId, &str);

/// Name-ordered builtin table, prefix matched like the main table.
#[rustfmt::skip]
static MOB_CMD_TABLE: &[(&str, MobCmd)] = &[
    ("asound",     do_mpasound),
    ("at",         do_mpat),
    ("cancel",     do_mpcancel),
    ("delay",      do_mpdelay),
    ("echo",       do_mpecho),
    ("echoaround", do_mpechoaround),
    ("echoat",     do_mpechoat),
    ("flee",       do_mpflee),
    ("force",      do_mpforce),
    ("forget",     do_mpforget),
    ("gecho",      do_mpgecho),
    ("goto",       do_mpgoto),
    ("junk",       do_mpjunk),
    ("kill",       do_mpkill),
    ("mload",      do_mpmload),
    ("oload",      do_mpoload),
    ("otransfer",  do_mpotransfer),
    ("purge",      do_mppurge),
    ("remember",   do_mpremember),
    ("remove",     do_mpremove),
    ("transfer",   do_mptransfer),
    ("vforce",     do_mpvforce),
    ("zecho",      do_mpzecho),
];

fn split_two(argument: &str) -> (&str, &str) {
    match argument.split_once(char::is_whitespace) {
        Some((a, b)) => (a, b.trim_start()),
        None => (argument, ""),
    }
}

fn bug_mp(world: &World, actor: MobId, what: &str) {
    let vnum = world
        .mobs
        .get(&actor)
        .and_then(|m| m.proto)
        .unwrap_or(Vnum::NONE);
    tracing::warn!(target: "bug", mob = %vnum, "{what}");
}

/// Dispatches one `mob` line. Unknown builtins are bugs, not refusals.
pub fn mob_interpret(world: &mut World, io: &mut GameIo, actor: MobId, line: &str) {
    let (verb, rest) = split_two(line.trim());
    if verb.is_empty() {
        return;
    }
    let found = MOB_CMD_TABLE.iter().find(|(name, _)| {
        verb.len() <= name.len() && name[..verb.len()].eq_ignore_ascii_case(verb)
    });
    match found {
        Some((_, function)) => function(world, io, actor, rest),
        None => bug_mp(world, actor, "mob_interpret: unknown builtin"),
    }
}

/// `mob asound <text>` — heard in every adjacent room.
fn do_mpasound(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        return;
    }
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    let neighbors: Vec<_> = Direction::ALL
        .into_iter()
        .filter_map(|d| {
            world
                .rooms
                .get(&room_id)
                .and_then(|r| r.exit(d))
                .and_then(|e| e.to_room)
        })
        .collect();
    for neighbor in neighbors {
        let people: Vec<MobId> = world
            .rooms
            .get(&neighbor)
            .map(|r| r.people.clone())
            .unwrap_or_default();
        for listener in people {
            io.send_to_char(listener, &format!("{argument}\n\r"));
        }
    }
}

/// `mob at <location> <command>` — execute somewhere else.
fn do_mpat(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (where_, command) = split_two(argument);
    if where_.is_empty() || command.is_empty() {
        bug_mp(world, actor, "mob at: missing arguments");
        return;
    }
    let target = if let Ok(vnum) = where_.parse::<i32>() {
        world.room_by_vnum(Vnum::new(vnum))
    } else {
        world
            .find_mob_world(actor, where_)
            .and_then(|m| world.mobs.get(&m))
            .and_then(|m| m.room)
    };
    let Some(room_id) = target else {
        bug_mp(world, actor, "mob at: no such location");
        return;
    };
    let Some(original) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    world.transfer_mob(actor, room_id);
    crate::interp::interpret(world, io, actor, command);
    if world.mobs.get(&actor).is_some_and(|m| m.room == Some(room_id)) {
        world.transfer_mob(actor, original);
    }
}

/// `mob cancel` — disarm the delay timer.
fn do_mpcancel(world: &mut World, _io: &mut GameIo, actor: MobId, _argument: &str) {
    if let Some(mob) = world.mobs.get_mut(&actor) {
        mob.mprog_delay = -1;
    }
}

/// `mob delay <pulses>` — arm the DELAY trigger.
fn do_mpdelay(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    match argument.trim().parse::<i32>() {
        Ok(pulses) if pulses > 0 => {
            if let Some(mob) = world.mobs.get_mut(&actor) {
                mob.mprog_delay = pulses;
            }
        }
        _ => bug_mp(world, actor, "mob delay: invalid argument"),
    }
}

/// `mob echo <text>` — to the whole room.
fn do_mpecho(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    act(world, io, argument, actor, ActArg::None, ActArg::None, ActTo::Room);
}

/// `mob echoaround <victim> <text>` — to the room except the victim.
fn do_mpechoaround(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, text) = split_two(argument);
    let Some(victim) = world.find_mob_room(actor, who) else { return };
    act(world, io, text, actor, ActArg::None, ActArg::Mob(victim), ActTo::NotVict);
}

/// `mob echoat <victim> <text>`.
fn do_mpechoat(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, text) = split_two(argument);
    let Some(victim) = world.find_mob_room(actor, who) else { return };
    act(world, io, text, actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
}

fn do_mpflee(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    if world.mobs.get(&actor).is_some_and(|m| m.fighting.is_some()) {
        fight::do_flee(world, io, actor, "");
    }
}

/// `mob force <victim> <command>`.
fn do_mpforce(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, command) = split_two(argument);
    if who.is_empty() || command.is_empty() {
        bug_mp(world, actor, "mob force: missing arguments");
        return;
    }
    if who.eq_ignore_ascii_case("all") {
        let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
        let people: Vec<MobId> = world
            .rooms
            .get(&room_id)
            .map(|r| r.people.clone())
            .unwrap_or_default();
        for victim in people {
            if victim != actor {
                crate::interp::interpret(world, io, victim, command);
            }
        }
        return;
    }
    let Some(victim) = world.find_mob_room(actor, who) else { return };
    if victim != actor {
        crate::interp::interpret(world, io, victim, command);
    }
}

/// `mob forget` — clear the remembered target.
fn do_mpforget(world: &mut World, _io: &mut GameIo, actor: MobId, _argument: &str) {
    if let Some(mob) = world.mobs.get_mut(&actor) {
        mob.mprog_target = None;
    }
}

/// `mob gecho <text>` — to every player in the game.
fn do_mpgecho(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        bug_mp(world, actor, "mob gecho: missing argument");
        return;
    }
    for (_, mob_id) in io.playing() {
        io.send_to_char(mob_id, &format!("{argument}\n\r"));
    }
}

/// `mob goto <location>` — silent move.
fn do_mpgoto(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let target = if let Ok(vnum) = argument.trim().parse::<i32>() {
        world.room_by_vnum(Vnum::new(vnum))
    } else {
        world
            .find_mob_world(actor, argument)
            .and_then(|m| world.mobs.get(&m))
            .and_then(|m| m.room)
    };
    let Some(room_id) = target else {
        bug_mp(world, actor, "mob goto: no such location");
        return;
    };
    world.stop_fighting(actor, true);
    world.transfer_mob(actor, room_id);
    let _ = io;
}

/// `mob junk <object|all>` — destroy carried objects silently.
fn do_mpjunk(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.eq_ignore_ascii_case("all") {
        let carried: Vec<_> = world
            .mobs
            .get(&actor)
            .map(|m| m.carrying.clone())
            .unwrap_or_default();
        for obj in carried {
            world.extract_obj(obj);
        }
        return;
    }
    if let Some(obj) = world.find_obj_carry(actor, argument) {
        world.extract_obj(obj);
    } else if let Some(obj) = world.find_obj_wear(actor, argument) {
        world.extract_obj(obj);
    }
}

/// `mob kill <victim>` — start combat without the murder checks.
fn do_mpkill(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(victim) = world.find_mob_room(actor, argument) else { return };
    if victim == actor
        || world.mobs.get(&actor).is_some_and(|m| m.fighting.is_some())
    {
        return;
    }
    fight::set_fighting(world, actor, victim);
    let _ = io;
}

/// `mob mload <vnum>` — load a mobile here.
fn do_mpmload(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    let Ok(vnum) = argument.trim().parse::<i32>() else {
        bug_mp(world, actor, "mob mload: bad vnum");
        return;
    };
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    match world.create_mobile(Vnum::new(vnum)) {
        Some(mob_id) => world.mob_to_room(mob_id, room_id),
        None => bug_mp(world, actor, "mob mload: no such prototype"),
    }
}

/// `mob oload <vnum> [room]` — load an object into inventory, or the
/// room with the `room` keyword.
fn do_mpoload(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    let (vnum_word, where_) = split_two(argument);
    let Ok(vnum) = vnum_word.trim().parse::<i32>() else {
        bug_mp(world, actor, "mob oload: bad vnum");
        return;
    };
    let level = world
        .registry
        .object(Vnum::new(vnum))
        .map_or(1, |p| p.level);
    let Some(obj_id) = world.create_object(Vnum::new(vnum), level) else {
        bug_mp(world, actor, "mob oload: no such prototype");
        return;
    };
    if where_.eq_ignore_ascii_case("room") {
        if let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) {
            world.obj_to_room(obj_id, room_id);
            return;
        }
    }
    world.obj_to_mob(obj_id, actor);
}

/// `mob otransfer <object> <room vnum>`.
fn do_mpotransfer(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    let (what, where_) = split_two(argument);
    let Some(obj_id) = world.find_obj_here(actor, what) else { return };
    let Ok(vnum) = where_.trim().parse::<i32>() else {
        bug_mp(world, actor, "mob otransfer: bad room vnum");
        return;
    };
    let Some(room_id) = world.room_by_vnum(Vnum::new(vnum)) else {
        bug_mp(world, actor, "mob otransfer: no such room");
        return;
    };
    world.obj_to_room(obj_id, room_id);
}

/// `mob purge [victim|all]` — remove NPCs and objects, never players.
fn do_mppurge(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    if argument.is_empty() || argument.eq_ignore_ascii_case("all") {
        let (mobs, objs) = match world.rooms.get(&room_id) {
            Some(room) => (room.people.clone(), room.contents.clone()),
            None => return,
        };
        for mob_id in mobs {
            if mob_id != actor
                && world.mobs.get(&mob_id).is_some_and(mudstone_world::Mobile::is_npc)
            {
                world.extract_mob(mob_id, true);
            }
        }
        for obj_id in objs {
            world.extract_obj(obj_id);
        }
        return;
    }
    if let Some(victim) = world.find_mob_room(actor, argument) {
        if victim != actor
            && world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc)
        {
            world.extract_mob(victim, true);
        }
        return;
    }
    if let Some(obj) = world.find_obj_here(actor, argument) {
        world.extract_obj(obj);
    }
}

/// `mob remember <victim>` — set the remembered target.
fn do_mpremember(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        bug_mp(world, actor, "mob remember: missing argument");
        return;
    }
    let target = world.find_mob_world(actor, argument);
    if let Some(mob) = world.mobs.get_mut(&actor) {
        mob.mprog_target = target;
    }
}

/// `mob remove <victim> <vnum|all>` — strip carried objects by vnum.
fn do_mpremove(world: &mut World, _io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, what) = split_two(argument);
    let Some(victim) = world.find_mob_room(actor, who) else { return };
    let all = what.eq_ignore_ascii_case("all");
    let vnum = what.trim().parse::<i32>().ok().map(Vnum::new);
    if !all && vnum.is_none() {
        bug_mp(world, actor, "mob remove: bad argument");
        return;
    }
    let carried: Vec<_> = world
        .mobs
        .get(&victim)
        .map(|m| m.carrying.clone())
        .unwrap_or_default();
    for obj_id in carried {
        let matches = all
            || world
                .objs
                .get(&obj_id)
                .is_some_and(|o| Some(o.proto) == vnum);
        if matches {
            world.extract_obj(obj_id);
        }
    }
}

/// `mob transfer <victim|all> <room vnum>`.
fn do_mptransfer(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, where_) = split_two(argument);
    let Ok(vnum) = where_.trim().parse::<i32>() else {
        bug_mp(world, actor, "mob transfer: bad room vnum");
        return;
    };
    let Some(room_id) = world.room_by_vnum(Vnum::new(vnum)) else {
        bug_mp(world, actor, "mob transfer: no such room");
        return;
    };
    if who.eq_ignore_ascii_case("all") {
        let Some(here) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
        let people: Vec<MobId> = world
            .rooms
            .get(&here)
            .map(|r| r.people.clone())
            .unwrap_or_default();
        for victim in people {
            if victim != actor {
                world.transfer_mob(victim, room_id);
            }
        }
        return;
    }
    let Some(victim) = world.find_mob_room(actor, who) else { return };
    world.stop_fighting(victim, true);
    world.transfer_mob(victim, room_id);
    if world.mobs.get(&victim).is_some_and(|m| !m.is_npc()) {
        show_room(world, io, victim, room_id);
    }
}

/// `mob vforce <vnum> <command>` — force every instance of a prototype.
fn do_mpvforce(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (vnum_word, command) = split_two(argument);
    let Ok(vnum) = vnum_word.trim().parse::<i32>() else {
        bug_mp(world, actor, "mob vforce: bad vnum");
        return;
    };
    let vnum = Vnum::new(vnum);
    let victims: Vec<MobId> = world
        .mobs
        .values()
        .filter(|m| m.proto == Some(vnum) && m.id != actor && m.fighting.is_none())
        .map(|m| m.id)
        .collect();
    for victim in victims {
        crate::interp::interpret(world, io, victim, command);
    }
}

/// `mob zecho <text>` — to every player in this area.
fn do_mpzecho(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(area) = world
        .mobs
        .get(&actor)
        .and_then(|m| m.room)
        .and_then(|r| world.rooms.get(&r))
        .map(|r| r.area)
    else {
        return;
    };
    for (_, mob_id) in io.playing() {
        let same_area = world
            .mobs
            .get(&mob_id)
            .and_then(|m| m.room)
            .and_then(|r| world.rooms.get(&r))
            .is_some_and(|r| r.area == area);
        if same_area {
            io.send_to_char(mob_id, &format!("{argument}\n\r"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_for_prefix_priority() {
        let names: Vec<_> = MOB_CMD_TABLE.iter().map(|(n, _)| *n).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
