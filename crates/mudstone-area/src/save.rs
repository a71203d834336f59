//! Area persister.
//!
//! Writes the canonical form of an area file: flags as decimal, exits in
//! their original prototype order, one reset line per command in room
//! order. Saving goes through a `.tmp` sibling and an atomic rename so a
//! failed write never clobbers the previous file.
//!
//! Round-trip contract: parsing the canonical output and saving it again
//! is byte-identical.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use mudstone_world::{InstancePolicy, MobProto, ObjProto, Reset, RoomProto};

use crate::error::{AreaError, AreaResult};
use crate::load::{affect_location_word, HelpEntry, LoadedArea};

/// Renders a whole area file to text.
pub fn render_area(loaded: &LoadedArea) -> String {
    let mut out = String::new();

    if let Some(area) = &loaded.area {
        out.push_str("#AREADATA\n");
        let _ = writeln!(out, "Name {}~", area.name);
        let _ = writeln!(out, "Builders {}~", area.builders);
        let _ = writeln!(out, "VNUMs {} {}", area.min_vnum, area.max_vnum);
        let _ = writeln!(out, "Credits {}~", area.credits);
        let _ = writeln!(out, "Security {}", area.security);
        let _ = writeln!(out, "Reset {}", area.reset_interval);
        let policy = match area.instance_policy {
            InstancePolicy::Singleton => "singleton",
            InstancePolicy::PerPlayer => "per_player",
        };
        let _ = writeln!(out, "Instance {policy}");
        out.push_str("End\n\n");
    }

    if !loaded.mobiles.is_empty() {
        out.push_str("#MOBILES\n");
        for mob in &loaded.mobiles {
            render_mobile(&mut out, mob);
        }
        out.push_str("#0\n\n");
    }

    if !loaded.objects.is_empty() {
        out.push_str("#OBJECTS\n");
        for object in &loaded.objects {
            render_object(&mut out, object);
        }
        out.push_str("#0\n\n");
    }

    if !loaded.rooms.is_empty() {
        out.push_str("#ROOMS\n");
        for room in &loaded.rooms {
            render_room(&mut out, room);
        }
        out.push_str("#0\n\n");

        out.push_str("#RESETS\n");
        for room in &loaded.rooms {
            for reset in &room.resets {
                render_reset(&mut out, reset);
            }
        }
        out.push_str("S\n\n");
    }

    let shops: Vec<&MobProto> = loaded.mobiles.iter().filter(|m| m.shop.is_some()).collect();
    if !shops.is_empty() {
        out.push_str("#SHOPS\n");
        for mob in shops {
            if let Some(shop) = &mob.shop {
                let _ = writeln!(
                    out,
                    "{} {} {} {} {} {} {} {} {} {}",
                    mob.vnum,
                    shop.buy_types[0],
                    shop.buy_types[1],
                    shop.buy_types[2],
                    shop.buy_types[3],
                    shop.buy_types[4],
                    shop.profit_buy,
                    shop.profit_sell,
                    shop.open_hour,
                    shop.close_hour,
                );
            }
        }
        out.push_str("0\n\n");
    }

    let specials: Vec<&MobProto> = loaded
        .mobiles
        .iter()
        .filter(|m| m.spec_fun.is_some())
        .collect();
    if !specials.is_empty() {
        out.push_str("#SPECIALS\n");
        for mob in specials {
            if let Some(name) = &mob.spec_fun {
                let _ = writeln!(out, "M {} {name}", mob.vnum);
            }
        }
        out.push_str("S\n\n");
    }

    if !loaded.progs.is_empty() {
        out.push_str("#MOBPROGS\n");
        for prog in &loaded.progs {
            let _ = writeln!(out, "#{}", prog.vnum);
            out.push_str(&prog.code);
            out.push_str("~\n");
        }
        out.push_str("#0\n\n");
    }

    if !loaded.loot_text.is_empty() {
        out.push_str("#LOOT\n");
        out.push_str(&loaded.loot_text);
        out.push_str("#ENDLOOT\n\n");
    }

    if !loaded.helps.is_empty() {
        out.push_str("#HELPS\n");
        for help in &loaded.helps {
            render_help(&mut out, help);
        }
        out.push_str("0 $~\n\n");
    }

    out.push_str("#$\n");
    out
}

fn render_mobile(out: &mut String, mob: &MobProto) {
    let _ = writeln!(out, "#{}", mob.vnum);
    let _ = writeln!(out, "{}~", mob.name);
    let _ = writeln!(out, "{}~", mob.short_descr);
    let _ = writeln!(out, "{}~", mob.long_descr);
    let _ = writeln!(out, "{}~", mob.description);
    let _ = writeln!(out, "{}~", mob.race);
    let _ = writeln!(
        out,
        "{} {} {} {}",
        mob.act_flags, mob.affect_flags, mob.alignment, mob.group
    );
    let _ = writeln!(
        out,
        "{} {} {} {} {} {}",
        mob.level,
        mob.hitroll,
        mob.hit,
        mob.mana,
        mob.damage,
        mob.dam_type as i32
    );
    let _ = writeln!(
        out,
        "{} {} {} {}",
        mob.armor[0], mob.armor[1], mob.armor[2], mob.armor[3]
    );
    let _ = writeln!(
        out,
        "{} {} {} {}",
        mob.off_flags, mob.imm_flags, mob.res_flags, mob.vuln_flags
    );
    let _ = writeln!(
        out,
        "{} {} {} {}",
        mob.start_pos as i32, mob.default_pos as i32, mob.sex as i32, mob.wealth
    );
    let _ = writeln!(
        out,
        "{} {} {} {}~",
        mob.form_flags, mob.part_flags, mob.size as i32, mob.material
    );
    for trigger in &mob.mprogs {
        let _ = writeln!(
            out,
            "T {} {} {}~",
            trigger.kind.name(),
            trigger.prog,
            trigger.phrase
        );
    }
    if let Some(table) = &mob.loot_table {
        let _ = writeln!(out, "L {table}~");
    }
}

fn render_object(out: &mut String, object: &ObjProto) {
    let _ = writeln!(out, "#{}", object.vnum);
    let _ = writeln!(out, "{}~", object.name);
    let _ = writeln!(out, "{}~", object.short_descr);
    let _ = writeln!(out, "{}~", object.description);
    let _ = writeln!(out, "{}~", object.material);
    let _ = writeln!(
        out,
        "{} {} {}",
        object.item_type.name(),
        object.extra_flags,
        object.wear_flags
    );
    let _ = writeln!(
        out,
        "{} {} {} {} {}",
        object.values[0], object.values[1], object.values[2], object.values[3], object.values[4]
    );
    let _ = writeln!(
        out,
        "{} {} {} {}",
        object.level, object.weight, object.cost, object.condition
    );
    for affect in &object.affects {
        let _ = writeln!(
            out,
            "A {} {}",
            affect_location_word(affect.location),
            affect.modifier
        );
    }
    for extra in &object.extra_descs {
        let _ = writeln!(out, "E {}~\n{}~", extra.keyword, extra.description);
    }
}

fn render_room(out: &mut String, room: &RoomProto) {
    let _ = writeln!(out, "#{}", room.vnum);
    let _ = writeln!(out, "{}~", room.name);
    let _ = writeln!(out, "{}~", room.description);
    let _ = writeln!(out, "0 {} {}", room.room_flags, room.sector as i32);

    // Exits are written in original prototype order, so a room whose
    // exits were randomized at runtime still round-trips.
    let mut order: Vec<&mudstone_world::ExitProto> = room.exits.iter().flatten().collect();
    order.sort_by_key(|e| e.orig_dir.index());
    for exit in order {
        let _ = writeln!(out, "D{}", exit.orig_dir.index());
        let _ = writeln!(out, "{}~", exit.description);
        let _ = writeln!(out, "{}~", exit.keyword);
        let _ = writeln!(out, "{} {} {}", exit.exit_flags, exit.key, exit.to_vnum);
    }
    for extra in &room.extra_descs {
        let _ = writeln!(out, "E\n{}~\n{}~", extra.keyword, extra.description);
    }
    out.push_str("S\n");
}

fn render_reset(out: &mut String, reset: &Reset) {
    let _ = match reset {
        Reset::Mob {
            mob,
            area_max,
            room,
            room_max,
        } => writeln!(out, "M {mob} {area_max} {room} {room_max}"),
        Reset::Obj {
            obj,
            world_max,
            room,
        } => writeln!(out, "O {obj} {world_max} {room} 0"),
        Reset::Put {
            obj,
            world_max,
            container,
            container_max,
        } => writeln!(out, "P {obj} {world_max} {container} {container_max}"),
        Reset::Give { obj } => writeln!(out, "G {obj} 0 0 0"),
        Reset::Equip { obj, slot } => writeln!(out, "E {obj} 0 {slot} 0"),
        Reset::Door {
            room,
            direction,
            state,
        } => writeln!(out, "D 0 {room} {direction} {state}"),
        Reset::Randomize { room, count } => writeln!(out, "R {room} {count} 0 0"),
    };
}

fn render_help(out: &mut String, help: &HelpEntry) {
    let _ = writeln!(out, "{} {}~", help.level, help.keywords);
    out.push_str(&help.text);
    out.push_str("~\n");
}

/// Saves an area file atomically: write `.tmp`, then rename over the
/// target. The old file survives any failure.
pub fn save_area_file(path: &Path, loaded: &LoadedArea) -> AreaResult<()> {
    let rendered = render_area(loaded);
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, rendered).map_err(|e| AreaError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| AreaError::io(path, e))?;
    Ok(())
}
