//! Information commands.

use std::fmt::Write as _;

use mudstone_types::{Direction, MobId, Position, RoomId, WearSlot};
use mudstone_world::World;

use crate::game::GameIo;
use crate::interp;
use crate::socials;

/// Shows a room to a viewer: name, description, exits, contents.
pub fn show_room(world: &World, io: &mut GameIo, viewer: MobId, room_id: RoomId) {
    let Some(room) = world.rooms.get(&room_id) else { return };
    if world.room_is_dark(room_id)
        && !world
            .mobs
            .get(&viewer)
            .is_some_and(|m| m.has_affect(mudstone_types::AFF_INFRARED))
    {
        io.send_to_char(viewer, "It is pitch black ...\n\r");
        return;
    }
    let proto = world.registry.room(room.vnum);
    let name = proto.map_or("Somewhere", |p| &p.name);
    let description = proto.map_or("", |p| &p.description);

    let mut out = format!("{{c{name}{{x\n\r");
    if !description.is_empty() {
        out.push_str(description);
        if !description.ends_with('\n') {
            out.push('\n');
        }
        out.push('\r');
    }

    // Exits summary.
    let mut exit_names = Vec::new();
    for dir in Direction::ALL {
        if let Some(exit) = room.exit(dir) {
            if exit.to_room.is_some() {
                if exit.state.is_closed() {
                    exit_names.push(format!("({})", dir.name()));
                } else {
                    exit_names.push(dir.name().to_string());
                }
            }
        }
    }
    let _ = writeln!(
        out,
        "{{g[Exits: {}]{{x\r",
        if exit_names.is_empty() {
            "none".to_string()
        } else {
            exit_names.join(" ")
        }
    );

    // Objects on the floor.
    for &obj_id in &room.contents {
        if !world.can_see_obj(viewer, obj_id) {
            continue;
        }
        if let Some(obj) = world.objs.get(&obj_id) {
            if !obj.description.is_empty() {
                let _ = writeln!(out, "    {}\r", obj.description);
            }
        }
    }

    // Mobiles present.
    for &mob_id in &room.people {
        if mob_id == viewer || !world.can_see(viewer, mob_id) {
            continue;
        }
        let Some(mob) = world.mobs.get(&mob_id) else { continue };
        if mob.is_npc() && mob.position == mob.default_pos && !mob.long_descr.is_empty() {
            out.push_str(mob.long_descr.trim_end());
            out.push_str("\n\r");
        } else {
            let verb = match mob.position {
                Position::Sleeping => "is sleeping here.",
                Position::Resting => "is resting here.",
                Position::Sitting => "is sitting here.",
                Position::Fighting => "is here, fighting!",
                _ => "is here.",
            };
            let name = if mob.is_npc() {
                crate::act::capitalize_first(&mob.short_descr)
            } else {
                crate::act::capitalize_first(mob.first_name())
            };
            let _ = writeln!(out, "{name} {verb}\r");
        }
    }
    io.send_to_char(viewer, &out);
}

pub fn do_look(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else {
        io.send_to_char(actor, "You are floating in the void.\n\r");
        return;
    };
    let argument = argument.trim();
    if argument.is_empty() || argument == "auto" {
        show_room(world, io, actor, room_id);
        return;
    }

    // Direction?
    if let Some(dir) = Direction::parse(argument) {
        match world.rooms.get(&room_id).and_then(|r| r.exit(dir)) {
            Some(exit) => {
                let text = if exit.description.is_empty() {
                    "Nothing special there.\n\r".to_string()
                } else {
                    format!("{}\n\r", exit.description.trim_end())
                };
                io.send_to_char(actor, &text);
                if exit.is_door() && exit.state.is_closed() {
                    io.send_to_char(actor, &format!("The {} is closed.\n\r", door_word(exit)));
                }
            }
            None => io.send_to_char(actor, "Nothing special there.\n\r"),
        }
        return;
    }

    // A mobile?
    if let Some(victim) = world.find_mob_room(actor, argument) {
        let Some(mob) = world.mobs.get(&victim) else { return };
        let text = if mob.description.is_empty() {
            format!("You see nothing special about {}.\n\r", mob.first_name())
        } else {
            format!("{}\n\r", mob.description.trim_end())
        };
        io.send_to_char(actor, &text);
        return;
    }

    // An object, or an extra description on the room.
    if let Some(obj_id) = world.find_obj_here(actor, argument) {
        let Some(obj) = world.objs.get(&obj_id) else { return };
        let proto = world.registry.object(obj.proto);
        let extra = proto.and_then(|p| {
            p.extra_descs
                .iter()
                .find(|e| mudstone_world::is_name(argument, &e.keyword))
        });
        let text = match extra {
            Some(extra) => format!("{}\n\r", extra.description.trim_end()),
            None => format!("{}\n\r", obj.description.trim_end()),
        };
        io.send_to_char(actor, &text);
        return;
    }
    let room_extra = world
        .rooms
        .get(&room_id)
        .and_then(|r| world.registry.room(r.vnum))
        .and_then(|p| {
            p.extra_descs
                .iter()
                .find(|e| mudstone_world::is_name(argument, &e.keyword))
                .cloned()
        });
    if let Some(extra) = room_extra {
        io.send_to_char(actor, &format!("{}\n\r", extra.description.trim_end()));
        return;
    }

    io.send_to_char(actor, "You do not see that here.\n\r");
}

fn door_word(exit: &mudstone_world::Exit) -> String {
    exit.keyword
        .split_whitespace()
        .next()
        .unwrap_or("door")
        .to_string()
}

pub fn do_exits(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    let Some(room) = world.rooms.get(&room_id) else { return };
    let mut out = String::from("Obvious exits:\n\r");
    let mut any = false;
    for dir in Direction::ALL {
        let Some(exit) = room.exit(dir) else { continue };
        let Some(to_room) = exit.to_room else { continue };
        if exit.state.is_closed() {
            continue;
        }
        let name = world
            .rooms
            .get(&to_room)
            .and_then(|r| world.registry.room(r.vnum))
            .map_or("Too dark to tell", |p| &p.name);
        let _ = writeln!(out, "{:<5} - {name}\r", dir.name());
        any = true;
    }
    if !any {
        out.push_str("None.\n\r");
    }
    io.send_to_char(actor, &out);
}

/// Looks one room out in every direction, listing who is visible there.
pub fn do_scan(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    io.send_to_char(actor, "Looking around you see:\n\r");
    let mut seen_any = false;
    for dir in Direction::ALL {
        let next = world
            .rooms
            .get(&room_id)
            .and_then(|r| r.exit(dir))
            .filter(|e| !e.state.is_closed())
            .and_then(|e| e.to_room);
        let Some(next_room) = next else { continue };
        let people: Vec<MobId> = world
            .rooms
            .get(&next_room)
            .map(|r| r.people.clone())
            .unwrap_or_default();
        let mut out = String::new();
        for mob_id in people {
            if !world.can_see(actor, mob_id) {
                continue;
            }
            if let Some(mob) = world.mobs.get(&mob_id) {
                let name = if mob.is_npc() {
                    mob.short_descr.to_string()
                } else {
                    mob.first_name().to_string()
                };
                let _ = writeln!(out, "  {}\r", crate::act::capitalize_first(&name));
                seen_any = true;
            }
        }
        if !out.is_empty() {
            io.send_to_char(actor, &format!("{{c{} from here:{{x\n\r{out}", dir.name()));
        }
    }
    if !seen_any {
        io.send_to_char(actor, "Nothing of interest.\n\r");
    }
}

pub fn do_who(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let mut out = String::new();
    let mut count = 0;
    for (_, mob_id) in io.playing() {
        let Some(mob) = world.mobs.get(&mob_id) else { continue };
        if !world.can_see(actor, mob_id) {
            continue;
        }
        let title = mob
            .player
            .as_ref()
            .map_or("", |p| p.title.as_str());
        let _ = writeln!(
            out,
            "[{:>2} {:>6} {:>6}] {}{}{}\r",
            mob.level,
            &*mob.race,
            &*mob.class,
            crate::act::capitalize_first(mob.first_name()),
            if title.is_empty() { "" } else { " " },
            title,
        );
        count += 1;
    }
    let _ = writeln!(out, "\rPlayers found: {count}\r");
    io.send_to_char(actor, &out);
}

pub fn do_score(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get(&actor) else { return };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "You are {}, level {}, {} {} {}.\r",
        crate::act::capitalize_first(mob.first_name()),
        mob.level,
        mob.sex.subjective(),
        &*mob.race,
        &*mob.class,
    );
    let _ = writeln!(
        out,
        "You have {}/{} hit, {}/{} mana, {}/{} movement.\r",
        mob.hit, mob.max_hit, mob.mana, mob.max_mana, mob.moves, mob.max_moves
    );
    let _ = writeln!(out, "You have {} gold and {} silver coins.\r", mob.gold, mob.silver);
    let _ = writeln!(
        out,
        "Hitroll: {}  Damroll: {}  Armor: {}  Saves: {}\r",
        mob.hitroll, mob.damroll, mob.armor, mob.saving_throw
    );
    let _ = writeln!(out, "You are {}.\r", mob.position.name());
    if !mob.affects.is_empty() {
        out.push_str("You are affected by:\n\r");
        for affect in &mob.affects {
            let duration = if affect.is_permanent() {
                "permanently".to_string()
            } else {
                format!("for {} ticks", affect.duration)
            };
            let _ = writeln!(out, "  {} {duration}\r", affect.skill);
        }
    }
    io.send_to_char(actor, &out);
}

pub fn do_help(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let trust = world.mobs.get(&actor).map_or(0, mudstone_world::Mobile::trust);
    let keyword = if argument.is_empty() { "summary" } else { argument };
    let text = io
        .helps
        .lookup(keyword, trust)
        .map(|entry| format!("{}\n\r", entry.text.trim_end()));
    match text {
        Some(text) => io.send_to_char(actor, &text),
        None => io.send_to_char(actor, "No help on that word.\n\r"),
    }
}

pub fn do_areas(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let mut out = String::new();
    for area in world.registry.areas() {
        let _ = writeln!(out, "{}\r", area.credits);
    }
    if out.is_empty() {
        out.push_str("No areas loaded.\n\r");
    }
    io.send_to_char(actor, &out);
}

pub fn do_inventory(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get(&actor) else { return };
    let mut out = String::from("You are carrying:\n\r");
    let mut any = false;
    for &obj_id in &mob.carrying {
        let Some(obj) = world.objs.get(&obj_id) else { continue };
        if obj.wear_loc.is_some() {
            continue;
        }
        let _ = writeln!(out, "  {}\r", obj.short_descr);
        any = true;
    }
    if !any {
        out.push_str("  Nothing.\n\r");
    }
    io.send_to_char(actor, &out);
}

fn slot_label(slot: WearSlot) -> &'static str {
    match slot {
        WearSlot::Light => "<used as light>     ",
        WearSlot::FingerLeft => "<worn on finger>    ",
        WearSlot::FingerRight => "<worn on finger>    ",
        WearSlot::Neck => "<worn around neck>  ",
        WearSlot::Body => "<worn on torso>     ",
        WearSlot::Head => "<worn on head>      ",
        WearSlot::Legs => "<worn on legs>      ",
        WearSlot::Feet => "<worn on feet>      ",
        WearSlot::Hands => "<worn on hands>     ",
        WearSlot::Arms => "<worn on arms>      ",
        WearSlot::Shield => "<worn as shield>    ",
        WearSlot::About => "<worn about body>   ",
        WearSlot::Waist => "<worn about waist>  ",
        WearSlot::WristLeft => "<worn around wrist> ",
        WearSlot::WristRight => "<worn around wrist> ",
        WearSlot::Wield => "<wielded>           ",
        WearSlot::Hold => "<held>              ",
        WearSlot::Float => "<floating nearby>   ",
    }
}

pub fn do_equipment(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get(&actor) else { return };
    let mut out = String::from("You are using:\n\r");
    let mut any = false;
    for slot in WearSlot::ALL {
        let Some(obj_id) = mob.equipped(slot) else { continue };
        let Some(obj) = world.objs.get(&obj_id) else { continue };
        let _ = writeln!(out, "{} {}\r", slot_label(slot), obj.short_descr);
        any = true;
    }
    if !any {
        out.push_str("  Nothing.\n\r");
    }
    io.send_to_char(actor, &out);
}

pub fn do_commands(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let trust = world
        .mobs
        .get(&actor)
        .map_or(0, mudstone_world::Mobile::trust)
        .min(interp::mortal_trust());
    let mut out = String::new();
    for (index, name) in interp::visible_commands(trust).iter().enumerate() {
        let _ = write!(out, "{name:<12}");
        if index % 6 == 5 {
            out.push_str("\n\r");
        }
    }
    out.push_str("\n\r");
    io.send_to_char(actor, &out);
}

pub fn do_socials(_world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let mut out = String::new();
    for (index, name) in socials::social_names().iter().enumerate() {
        let _ = write!(out, "{name:<12}");
        if index % 6 == 5 {
            out.push_str("\n\r");
        }
    }
    out.push_str("\n\r");
    io.send_to_char(actor, &out);
}
