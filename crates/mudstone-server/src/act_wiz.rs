//! Immortal commands, gated by trust in the command table.

use std::fmt::Write as _;

use mudstone_types::{MobId, Position, Vnum, PLR_DENY, PLR_FREEZE, PLR_HOLYLIGHT, WIZ_ON};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::act_info::show_room;
use crate::game::GameIo;
use crate::interp;
use crate::nanny;
use crate::wiznet::{self, WiznetEvent, CHANNELS};

fn split_two(argument: &str) -> (&str, &str) {
    match argument.split_once(char::is_whitespace) {
        Some((a, b)) => (a, b.trim_start()),
        None => (argument, ""),
    }
}

pub fn do_goto(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Goto where?\n\r");
        return;
    }
    let target = if let Ok(vnum) = argument.trim().parse::<i32>() {
        world.room_by_vnum(Vnum::new(vnum))
    } else {
        world
            .find_mob_world(actor, argument)
            .and_then(|m| world.mobs.get(&m))
            .and_then(|m| m.room)
    };
    let Some(room_id) = target else {
        io.send_to_char(actor, "No such location.\n\r");
        return;
    };
    act(world, io, "$n disappears in a puff of smoke.", actor, ActArg::None, ActArg::None, ActTo::Room);
    world.stop_fighting(actor, true);
    world.transfer_mob(actor, room_id);
    act(world, io, "$n appears in a swirling mist.", actor, ActArg::None, ActArg::None, ActTo::Room);
    show_room(world, io, actor, room_id);
}

pub fn do_transfer(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, where_) = split_two(argument);
    if who.is_empty() {
        io.send_to_char(actor, "Transfer whom (and where)?\n\r");
        return;
    }
    let Some(victim) = world.find_mob_world(actor, who) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    let destination = if where_.is_empty() {
        world.mobs.get(&actor).and_then(|m| m.room)
    } else if let Ok(vnum) = where_.parse::<i32>() {
        world.room_by_vnum(Vnum::new(vnum))
    } else {
        None
    };
    let Some(room_id) = destination else {
        io.send_to_char(actor, "No such location.\n\r");
        return;
    };
    act(world, io, "$n disappears in a mushroom cloud.", victim, ActArg::None, ActArg::None, ActTo::Room);
    world.stop_fighting(victim, true);
    world.transfer_mob(victim, room_id);
    act(world, io, "$n arrives from a puff of smoke.", victim, ActArg::None, ActArg::None, ActTo::Room);
    act(world, io, "$n has transferred you.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
    show_room(world, io, victim, room_id);
    io.send_to_char(actor, "Ok.\n\r");
}

pub fn do_at(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (where_, command) = split_two(argument);
    if where_.is_empty() || command.is_empty() {
        io.send_to_char(actor, "At where what?\n\r");
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
        io.send_to_char(actor, "No such location.\n\r");
        return;
    };
    let Some(original) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    world.transfer_mob(actor, room_id);
    interp::interpret(world, io, actor, command);
    // The command may have moved or destroyed the actor.
    if world.mobs.get(&actor).is_some_and(|m| m.room == Some(room_id)) {
        world.transfer_mob(actor, original);
    }
}

pub fn do_load(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (kind, vnum_word) = split_two(argument);
    let Ok(vnum) = vnum_word.trim().parse::<i32>() else {
        io.send_to_char(actor, "Syntax: load mob <vnum>  |  load obj <vnum>\n\r");
        return;
    };
    let vnum = Vnum::new(vnum);
    match kind {
        k if "mob".starts_with(k) && !k.is_empty() => {
            let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
            let Some(mob_id) = world.create_mobile(vnum) else {
                io.send_to_char(actor, "No mobile has that vnum.\n\r");
                return;
            };
            world.mob_to_room(mob_id, room_id);
            act(world, io, "$n has created $N!", actor, ActArg::None, ActArg::Mob(mob_id), ActTo::Room);
            io.send_to_char(actor, "Ok.\n\r");
            let name = actor_name(world, actor);
            wiznet::wiznet(world, io, &format!("{name} loads mob {vnum}."), Some(actor), WiznetEvent::Load, 0);
        }
        k if "obj".starts_with(k) && !k.is_empty() => {
            let Some(obj_id) = world.create_object(vnum, 0) else {
                io.send_to_char(actor, "No object has that vnum.\n\r");
                return;
            };
            world.obj_to_mob(obj_id, actor);
            act(world, io, "$n has created $p!", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Room);
            io.send_to_char(actor, "Ok.\n\r");
            let name = actor_name(world, actor);
            wiznet::wiznet(world, io, &format!("{name} loads obj {vnum}."), Some(actor), WiznetEvent::Load, 0);
        }
        _ => io.send_to_char(actor, "Syntax: load mob <vnum>  |  load obj <vnum>\n\r"),
    }
}

fn actor_name(world: &World, actor: MobId) -> String {
    world
        .mobs
        .get(&actor)
        .map_or_else(|| "someone".to_string(), |m| {
            crate::act::capitalize_first(m.first_name())
        })
}

pub fn do_purge(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        // Purge the room: NPCs and objects, sparing players.
        let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
        act(world, io, "$n purges the room!", actor, ActArg::None, ActArg::None, ActTo::Room);
        let (mobs, objs) = match world.rooms.get(&room_id) {
            Some(room) => (room.people.clone(), room.contents.clone()),
            None => return,
        };
        for mob_id in mobs {
            if world.mobs.get(&mob_id).is_some_and(mudstone_world::Mobile::is_npc) {
                world.extract_mob(mob_id, true);
            }
        }
        for obj_id in objs {
            world.extract_obj(obj_id);
        }
        io.send_to_char(actor, "Ok.\n\r");
        return;
    }
    let Some(victim) = world.find_mob_room(actor, argument) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if world.mobs.get(&victim).is_some_and(|v| !v.is_npc()) {
        io.send_to_char(actor, "Not on players.\n\r");
        return;
    }
    act(world, io, "$n purges $N.", actor, ActArg::None, ActArg::Mob(victim), ActTo::NotVict);
    world.extract_mob(victim, true);
    io.send_to_char(actor, "Ok.\n\r");
}

pub fn do_force(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, command) = split_two(argument);
    if who.is_empty() || command.is_empty() {
        io.send_to_char(actor, "Force whom to do what?\n\r");
        return;
    }
    if command.eq_ignore_ascii_case("delete") {
        io.send_to_char(actor, "That will NOT be done.\n\r");
        return;
    }
    let Some(victim) = world.find_mob_world(actor, who) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if victim == actor {
        io.send_to_char(actor, "Aye aye, right away!\n\r");
        interp::interpret(world, io, actor, command);
        return;
    }
    let outranked = world
        .mobs
        .get(&victim)
        .is_some_and(|v| v.trust() >= world.mobs.get(&actor).map_or(0, mudstone_world::Mobile::trust));
    if outranked {
        io.send_to_char(actor, "Do it yourself!\n\r");
        return;
    }
    act(world, io, "$n forces you to '$T'.", actor, ActArg::None, ActArg::Text(command), ActTo::Vict);
    interp::interpret(world, io, victim, command);
    io.send_to_char(actor, "Ok.\n\r");
}

pub fn do_snoop(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Snoop whom?\n\r");
        return;
    }
    let Some(my_desc) = io.desc_of(actor) else { return };
    if argument.eq_ignore_ascii_case("self") {
        // Cancel all snoops this immortal holds.
        let ids = io.net.descriptor_ids();
        for id in ids {
            if let Some(desc) = io.net.descriptor_mut(id) {
                if desc.snoop_by == Some(my_desc) {
                    desc.snoop_by = None;
                }
            }
        }
        io.send_to_char(actor, "Cancelling all snoops.\n\r");
        return;
    }
    let Some(victim) = world.find_mob_world(actor, argument) else {
        io.send_to_char(actor, "They aren't playing.\n\r");
        return;
    };
    let Some(victim_desc) = io.desc_of(victim) else {
        io.send_to_char(actor, "No descriptor to snoop.\n\r");
        return;
    };
    if victim_desc == my_desc {
        io.send_to_char(actor, "Cancelling all snoops.\n\r");
        return;
    }
    // Reject loops: someone snooping us must not become our target.
    let loops = io
        .net
        .descriptor(my_desc)
        .is_some_and(|d| d.snoop_by == Some(victim_desc));
    if loops {
        io.send_to_char(actor, "No snoop loops.\n\r");
        return;
    }
    let taken = io
        .net
        .descriptor(victim_desc)
        .is_some_and(|d| d.snoop_by.is_some());
    if taken {
        io.send_to_char(actor, "Busy already.\n\r");
        return;
    }
    if let Some(desc) = io.net.descriptor_mut(victim_desc) {
        desc.snoop_by = Some(my_desc);
    }
    let name = actor_name(world, actor);
    wiznet::wiznet(world, io, &format!("{name} starts snooping."), Some(actor), WiznetEvent::Snoops, 0);
    io.send_to_char(actor, "Ok.\n\r");
}

pub fn do_stat(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Stat what (mob name, obj name, or room vnum)?\n\r");
        return;
    }
    if let Ok(vnum) = argument.trim().parse::<i32>() {
        stat_room(world, io, actor, Vnum::new(vnum));
        return;
    }
    if let Some(victim) = world.find_mob_world(actor, argument) {
        stat_mob(world, io, actor, victim);
        return;
    }
    if let Some(obj_id) = world.find_obj_world(actor, argument) {
        let Some(obj) = world.objs.get(&obj_id) else { return };
        let text = format!(
            "Object {} vnum {} type {} {}\n\rvalues: {:?} weight {} cost {} timer {}\n\r",
            obj.short_descr,
            obj.proto,
            obj.item_type.name(),
            crate::act_obj::location_label(world, obj_id),
            obj.values,
            obj.weight,
            obj.cost,
            obj.timer,
        );
        io.send_to_char(actor, &text);
        return;
    }
    io.send_to_char(actor, "Nothing by that name.\n\r");
}

fn stat_room(world: &World, io: &mut GameIo, actor: MobId, vnum: Vnum) {
    let Some(room_id) = world.room_by_vnum(vnum) else {
        io.send_to_char(actor, "No such room.\n\r");
        return;
    };
    let Some(room) = world.rooms.get(&room_id) else { return };
    let mut out = String::new();
    let name = world.registry.room(vnum).map_or("?", |p| &p.name);
    let _ = writeln!(out, "Room '{name}' vnum {vnum} id {room_id} light {}\r", room.light);
    let _ = writeln!(out, "People: {}  Objects: {}  Inbound exits: {}\r",
        room.people.len(), room.contents.len(), room.inbound_exits.len());
    for dir in mudstone_types::Direction::ALL {
        if let Some(exit) = room.exit(dir) {
            let _ = writeln!(
                out,
                "  {}: to {} ({:?}){}\r",
                dir.name(),
                exit.to_vnum,
                exit.state,
                if exit.to_room.is_none() { " [unlinked]" } else { "" },
            );
        }
    }
    io.send_to_char(actor, &out);
}

fn stat_mob(world: &World, io: &mut GameIo, actor: MobId, victim: MobId) {
    let Some(mob) = world.mobs.get(&victim) else { return };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Name: {}  Vnum: {}  Id: {}\r",
        mob.name,
        mob.proto.map_or_else(|| "player".to_string(), |v| v.to_string()),
        mob.id,
    );
    let _ = writeln!(
        out,
        "Level: {}  Trust: {}  Position: {}  Hit: {}/{}\r",
        mob.level, mob.trust(), mob.position.name(), mob.hit, mob.max_hit,
    );
    let _ = writeln!(
        out,
        "Act: {:#x}  Aff: {:#x}  Fighting: {:?}  Master: {:?}\r",
        mob.act_flags, mob.affect_flags, mob.fighting, mob.master,
    );
    let _ = writeln!(
        out,
        "Delay: {}  Target: {:?}  Carrying: {}\r",
        mob.mprog_delay,
        mob.mprog_target,
        mob.carrying.len(),
    );
    for affect in &mob.affects {
        let _ = writeln!(
            out,
            "Affect: {} mod {} duration {}\r",
            affect.skill, affect.modifier, affect.duration,
        );
    }
    io.send_to_char(actor, &out);
}

/// Shows the trigger list and delay state of an NPC, for script
/// debugging.
pub fn do_mpstat(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(victim) = world.find_mob_room(actor, argument) else {
        io.send_to_char(actor, "No such mobile here.\n\r");
        return;
    };
    let Some(proto_vnum) = world.mobs.get(&victim).and_then(|m| m.proto) else {
        io.send_to_char(actor, "That is a player.\n\r");
        return;
    };
    let Some(proto) = world.registry.mob(proto_vnum) else { return };
    let mut out = format!("Mobile {proto_vnum} has {} trigger(s):\n\r", proto.mprogs.len());
    for trigger in &proto.mprogs {
        let _ = writeln!(
            out,
            "  {} prog {} phrase '{}'\r",
            trigger.kind.name(),
            trigger.prog,
            trigger.phrase,
        );
    }
    if let Some(mob) = world.mobs.get(&victim) {
        let _ = writeln!(out, "Delay {}  Target {:?}\r", mob.mprog_delay, mob.mprog_target);
    }
    io.send_to_char(actor, &out);
}

pub fn do_echo(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Global echo what?\n\r");
        return;
    }
    for (_, mob_id) in io.playing() {
        if world.mobs.get(&mob_id).is_some_and(|m| m.trust() >= world.mobs.get(&actor).map_or(0, mudstone_world::Mobile::trust)) && mob_id != actor
        {
            io.send_to_char(mob_id, &format!("global> {argument}\n\r"));
        } else {
            io.send_to_char(mob_id, &format!("{argument}\n\r"));
        }
    }
}

pub fn do_peace(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    let people: Vec<MobId> = world
        .rooms
        .get(&room_id)
        .map(|r| r.people.clone())
        .unwrap_or_default();
    for mob_id in people {
        world.stop_fighting(mob_id, false);
        if let Some(mob) = world.mobs.get_mut(&mob_id) {
            mob.memory.clear();
        }
    }
    io.send_to_char(actor, "Ok.\n\r");
}

pub fn do_restore(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let targets: Vec<MobId> = if argument.is_empty() || argument.eq_ignore_ascii_case("all") {
        io.playing().into_iter().map(|(_, m)| m).collect()
    } else {
        match world.find_mob_world(actor, argument) {
            Some(victim) => vec![victim],
            None => {
                io.send_to_char(actor, "They aren't here.\n\r");
                return;
            }
        }
    };
    for victim in targets {
        if let Some(mob) = world.mobs.get_mut(&victim) {
            mob.hit = mob.max_hit;
            mob.mana = mob.max_mana;
            mob.moves = mob.max_moves;
            if mob.position < Position::Standing && mob.fighting.is_none() {
                mob.position = Position::Standing;
            }
        }
        act(world, io, "$n has restored you.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
    }
    let name = actor_name(world, actor);
    wiznet::wiznet(world, io, &format!("{name} restored."), Some(actor), WiznetEvent::Restore, 0);
    io.send_to_char(actor, "Ok.\n\r");
}

fn toggle_player_bit(
    world: &mut World,
    io: &mut GameIo,
    actor: MobId,
    argument: &str,
    bit: mudstone_types::Flags,
    on_msg: &str,
    off_msg: &str,
) -> Option<MobId> {
    let Some(victim) = world.find_mob_world(actor, argument) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return None;
    };
    if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc) {
        io.send_to_char(actor, "Not on NPCs.\n\r");
        return None;
    }
    let Some(mob) = world.mobs.get_mut(&victim) else { return None };
    if mob.act_flags & bit != 0 {
        mob.act_flags &= !bit;
        io.send_to_char(actor, off_msg);
    } else {
        mob.act_flags |= bit;
        io.send_to_char(actor, on_msg);
    }
    Some(victim)
}

pub fn do_freeze(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if let Some(victim) = toggle_player_bit(
        world,
        io,
        actor,
        argument,
        PLR_FREEZE,
        "FREEZE set.\n\r",
        "FREEZE removed.\n\r",
    ) {
        io.send_to_char(victim, "You can't do ANYthing!\n\r");
        let name = actor_name(world, actor);
        wiznet::wiznet(world, io, &format!("{name} puts someone in the deep freeze."), Some(actor), WiznetEvent::Penalties, 0);
    }
}

pub fn do_deny(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if let Some(victim) = toggle_player_bit(
        world,
        io,
        actor,
        argument,
        PLR_DENY,
        "DENY set.\n\r",
        "DENY removed.\n\r",
    ) {
        let denied = world
            .mobs
            .get(&victim)
            .is_some_and(|m| m.act_flags & PLR_DENY != 0);
        if denied {
            io.send_to_char(victim, "You are denied access!\n\r");
            nanny::save_character(world, io, victim);
            if let Some(desc) = io.desc_of(victim) {
                io.net.close(desc);
            }
            io.unbind_char(victim);
            world.extract_mob(victim, true);
        }
        let name = actor_name(world, actor);
        wiznet::wiznet(world, io, &format!("{name} denies access."), Some(actor), WiznetEvent::Penalties, 0);
    }
}

pub fn do_pardon(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(victim) = world.find_mob_world(actor, argument) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if let Some(mob) = world.mobs.get_mut(&victim) {
        mob.act_flags &= !(PLR_FREEZE | PLR_DENY);
    }
    // Host penalties lapse with the pardon.
    io.penalties.clear();
    io.send_to_char(actor, "Pardoned.\n\r");
    io.send_to_char(victim, "You are pardoned.\n\r");
}

pub fn do_wizlock(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    io.flags.wizlock = !io.flags.wizlock;
    let name = actor_name(world, actor);
    if io.flags.wizlock {
        wiznet::wiznet(world, io, &format!("{name} has wizlocked the game."), Some(actor), WiznetEvent::Secure, 0);
        io.send_to_char(actor, "Game wizlocked.\n\r");
    } else {
        wiznet::wiznet(world, io, &format!("{name} removes wizlock."), Some(actor), WiznetEvent::Secure, 0);
        io.send_to_char(actor, "Game un-wizlocked.\n\r");
    }
}

pub fn do_newlock(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    io.flags.newlock = !io.flags.newlock;
    let name = actor_name(world, actor);
    if io.flags.newlock {
        wiznet::wiznet(world, io, &format!("{name} locks out new characters."), Some(actor), WiznetEvent::Secure, 0);
        io.send_to_char(actor, "New characters have been locked out.\n\r");
    } else {
        wiznet::wiznet(world, io, &format!("{name} allows new characters again."), Some(actor), WiznetEvent::Secure, 0);
        io.send_to_char(actor, "Newlock removed.\n\r");
    }
}

pub fn do_reboo(_world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    io.send_to_char(actor, "If you want to REBOOT, spell it out.\n\r");
}

pub fn do_reboot(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let name = actor_name(world, actor);
    broadcast_and_down(world, io, &format!("Reboot by {name}."));
}

pub fn do_shutdow(_world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    io.send_to_char(actor, "If you want to SHUTDOWN, spell it out.\n\r");
}

pub fn do_shutdown(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let name = actor_name(world, actor);
    broadcast_and_down(world, io, &format!("Shutdown by {name}."));
}

/// Broadcasts, saves every logged-in character, closes every descriptor,
/// and arms the loop-exit flag checked at the top of the next pulse.
fn broadcast_and_down(world: &mut World, io: &mut GameIo, message: &str) {
    tracing::info!(message, "going down");
    for (_, mob_id) in io.playing() {
        io.send_to_char(mob_id, &format!("{message}\n\r"));
        nanny::save_character(world, io, mob_id);
    }
    for id in io.net.descriptor_ids() {
        io.net.close(id);
    }
    io.flags.down = true;
}

pub fn do_advance(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, level_word) = split_two(argument);
    let Ok(level) = level_word.trim().parse::<i16>() else {
        io.send_to_char(actor, "Syntax: advance <char> <level>\n\r");
        return;
    };
    if !(1..=mudstone_types::MAX_LEVEL).contains(&level) {
        io.send_to_char(actor, "Level must be 1 to 60.\n\r");
        return;
    }
    let Some(victim) = world.find_mob_world(actor, who) else {
        io.send_to_char(actor, "That player is not here.\n\r");
        return;
    };
    if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc) {
        io.send_to_char(actor, "Not on NPCs.\n\r");
        return;
    }
    if let Some(mob) = world.mobs.get_mut(&victim) {
        mob.level = level;
        mob.max_hit += i32::from(level) * 10;
        mob.hit = mob.max_hit;
    }
    io.send_to_char(victim, "You feel the hand of a god reshape you.\n\r");
    io.send_to_char(actor, "Ok.\n\r");
    let name = actor_name(world, actor);
    wiznet::wiznet(world, io, &format!("{name} advances a mortal."), Some(actor), WiznetEvent::Levels, 0);
}

pub fn do_set(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (who, rest) = split_two(argument);
    let (field, value_word) = split_two(rest);
    if who.is_empty() || field.is_empty() || value_word.is_empty() {
        io.send_to_char(
            actor,
            "Syntax: set <char> <hp|mana|move|gold|silver|align|sex> <value>\n\r",
        );
        return;
    }
    let Some(victim) = world.find_mob_world(actor, who) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    let Ok(value) = value_word.trim().parse::<i64>() else {
        io.send_to_char(actor, "Value must be a number.\n\r");
        return;
    };
    let Some(mob) = world.mobs.get_mut(&victim) else { return };
    match field {
        "hp" => {
            mob.max_hit = value as i32;
            mob.hit = mob.hit.min(mob.max_hit);
        }
        "mana" => {
            mob.max_mana = value as i32;
            mob.mana = mob.mana.min(mob.max_mana);
        }
        "move" => {
            mob.max_moves = value as i32;
            mob.moves = mob.moves.min(mob.max_moves);
        }
        "gold" => mob.gold = value,
        "silver" => mob.silver = value,
        "align" => mob.alignment = (value as i32).clamp(-1000, 1000),
        "sex" => mob.sex = mudstone_types::Sex::from_number(value as i32),
        _ => {
            io.send_to_char(actor, "No such field.\n\r");
            return;
        }
    }
    io.send_to_char(actor, "Ok.\n\r");
}

pub fn do_holylight(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get_mut(&actor) else { return };
    if mob.is_npc() {
        return;
    }
    if mob.act_flags & PLR_HOLYLIGHT != 0 {
        mob.act_flags &= !PLR_HOLYLIGHT;
        io.send_to_char(actor, "Holy light mode off.\n\r");
    } else {
        mob.act_flags |= PLR_HOLYLIGHT;
        io.send_to_char(actor, "Holy light mode on.\n\r");
    }
}

pub fn do_wiznet(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(mob) = world.mobs.get_mut(&actor) else { return };
    let Some(player) = mob.player.as_mut() else { return };
    let argument = argument.trim();
    if argument.is_empty() {
        if player.wiznet & WIZ_ON != 0 {
            player.wiznet &= !WIZ_ON;
            io.send_to_char(actor, "Signing off of Wiznet.\n\r");
        } else {
            player.wiznet |= WIZ_ON;
            io.send_to_char(actor, "Welcome to Wiznet!\n\r");
        }
        return;
    }
    if argument.eq_ignore_ascii_case("status") {
        let mut out = String::from("Channels:\n\r");
        for (event, flag) in CHANNELS {
            let on = player.wiznet & flag != 0;
            let _ = writeln!(out, "  {:<10} {}\r", event.name(), if on { "ON" } else { "off" });
        }
        io.send_to_char(actor, &out);
        return;
    }
    let found = CHANNELS
        .iter()
        .find(|(event, _)| event.name().starts_with(&argument.to_ascii_lowercase()));
    match found {
        Some((event, flag)) => {
            if player.wiznet & flag != 0 {
                player.wiznet &= !flag;
                io.send_to_char(actor, &format!("You no longer hear {}.\n\r", event.name()));
            } else {
                player.wiznet |= flag;
                io.send_to_char(actor, &format!("You will now hear {}.\n\r", event.name()));
            }
        }
        None => io.send_to_char(actor, "No such wiznet channel.\n\r"),
    }
}

/// Runs the graph audit and reports violations; the healthy answer is
/// silence.
pub fn do_audit(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let violations = world.audit();
    if violations.is_empty() {
        io.send_to_char(actor, "The entity graph is consistent.\n\r");
        return;
    }
    let mut out = format!("{} violation(s):\n\r", violations.len());
    for line in violations {
        let _ = writeln!(out, "  {line}\r");
    }
    io.send_to_char(actor, &out);
}
