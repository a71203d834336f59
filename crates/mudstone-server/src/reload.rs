//! Hot reload: helps from disk, a single room from its prototype.

use mudstone_script::Value;
use mudstone_types::{MobId, RoomId};
use mudstone_world::World;

use crate::act_info::show_room;
use crate::game::GameIo;
use crate::help::HelpTree;

pub fn do_reload(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let argument = argument.trim();
    if argument.is_empty() {
        io.send_to_char(actor, "Syntax: reload <type>\n\r");
        io.send_to_char(actor, "Available types:\n\r");
        io.send_to_char(actor, "  helps    - Reload all help files from disk\n\r");
        io.send_to_char(actor, "  room     - Reload current room from prototype\n\r");
        return;
    }
    if "helps".starts_with(argument) {
        reload_helps(world, io, actor);
        return;
    }
    if "room".starts_with(argument) {
        let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else {
            io.send_to_char(actor, "You are not in a room.\n\r");
            return;
        };
        reload_room(world, io, actor, room_id);
        return;
    }
    io.send_to_char(actor, "Unknown reload type.\n\r");
}

/// Rescans `area.lst` and re-reads every `#HELPS` section into a fresh
/// tree, swapped in atomically. Sessions are untouched.
pub fn reload_helps(world: &mut World, io: &mut GameIo, actor: MobId) {
    io.send_to_char(actor, "Reloading help files...\n\r");
    let list_path = io.config.area_list_path();
    let files = match mudstone_area::read_area_list(&list_path) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(target: "bug", error = %e, "reload helps: area list unreadable");
            io.send_to_char(actor, "ERROR: Could not retrieve area list.\n\r");
            return;
        }
    };

    let mut entries = Vec::new();
    let mut file_count = 0usize;
    for file in files {
        // JSON areas carry no helps subsection.
        if file.ends_with(".json") {
            continue;
        }
        let path = io.config.area_path(&file);
        match mudstone_area::load_area_file(&path) {
            Ok(loaded) => {
                file_count += 1;
                if !loaded.helps.is_empty() {
                    io.send_to_char(actor, &format!("  Loaded helps from {file}\n\r"));
                }
                entries.extend(loaded.helps);
            }
            Err(e) => {
                tracing::warn!(target: "bug", file, error = %e, "reload helps: file skipped");
                io.send_to_char(actor, &format!("WARNING: Could not read {file}\n\r"));
            }
        }
    }

    let count = entries.len();
    io.helps = HelpTree::new(entries);
    io.send_to_char(
        actor,
        &format!("Help reload complete: scanned {file_count} files, {count} entries live.\n\r"),
    );
    let _ = world;
}

/// Rebuilds one room instance from its prototype while its occupants
/// watch: occupants are parked aside (rooted against collection), the
/// room and its outbound exits are torn down and rebuilt, inbound exits
/// are re-linked, and everyone is put back and shown the room.
pub fn reload_room(world: &mut World, io: &mut GameIo, actor: MobId, room_id: RoomId) {
    let Some(room) = world.rooms.get(&room_id) else {
        io.send_to_char(actor, "Invalid room.\n\r");
        return;
    };
    let vnum = room.vnum;
    if world.registry.room(vnum).is_none() {
        io.send_to_char(actor, "Room has no prototype data (cannot reload).\n\r");
        return;
    }
    io.send_to_char(actor, &format!("Reloading room [{vnum}]...\n\r"));

    // Occupants survive the rebuild; root them for the duration.
    let saved_mobs: Vec<MobId> = world.rooms.get(&room_id).map(|r| r.people.clone()).unwrap_or_default();
    let saved_objs: Vec<_> = world.rooms.get(&room_id).map(|r| r.contents.clone()).unwrap_or_default();
    for &mob in &saved_mobs {
        io.vm.gc_protect(Value::Entity(mob.get()));
        world.mob_from_room(mob);
    }
    for &obj in &saved_objs {
        io.vm.gc_protect(Value::Entity(obj.get()));
        world.obj_from_container(obj);
    }

    let Some(new_id) = world.rebuild_room(room_id) else {
        tracing::warn!(target: "bug", %room_id, "reload room: rebuild failed");
        // Put everyone back where they were so nothing leaks.
        for &mob in &saved_mobs {
            world.mob_to_room(mob, room_id);
        }
        for &obj in &saved_objs {
            world.obj_to_room(obj, room_id);
        }
        io.vm.gc_protect_clear();
        io.send_to_char(actor, "Reload failed; room left as it was.\n\r");
        return;
    };

    for &mob in &saved_mobs {
        world.mob_to_room(mob, new_id);
    }
    for &obj in &saved_objs {
        world.obj_to_room(obj, new_id);
    }
    io.vm.gc_protect_clear();

    // Every player occupant re-looks at the fresh room.
    for &mob in &saved_mobs {
        if world.mobs.get(&mob).is_some_and(|m| !m.is_npc()) {
            io.send_to_char(mob, "\n\rThe room shimmers and reloads around you!\n\r");
            show_room(world, io, mob, new_id);
        }
    }
    io.send_to_char(actor, "Room reloaded successfully.\n\r");
}
