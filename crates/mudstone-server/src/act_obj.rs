//! Object manipulation commands.

use mudstone_mobprog::Interpreter;
use mudstone_types::{
    Flags, ItemType, MobId, ObjId, WearSlot, ITEM_NODROP, ITEM_NOREMOVE, WEAR_FLAG_ABOUT,
    WEAR_FLAG_ARMS, WEAR_FLAG_BODY, WEAR_FLAG_FEET, WEAR_FLAG_FINGER, WEAR_FLAG_FLOAT,
    WEAR_FLAG_HANDS, WEAR_FLAG_HEAD, WEAR_FLAG_HOLD, WEAR_FLAG_LEGS, WEAR_FLAG_NECK,
    WEAR_FLAG_SHIELD, WEAR_FLAG_WAIST, WEAR_FLAG_WIELD, WEAR_FLAG_WRIST, WEAR_TAKE,
};
use mudstone_world::{ObjLocation, World};

use crate::act::{act, ActArg, ActTo};
use crate::game::GameIo;

fn split_two(argument: &str) -> (&str, &str) {
    match argument.split_once(char::is_whitespace) {
        Some((a, b)) => (a, b.trim_start()),
        None => (argument, ""),
    }
}

pub fn do_get(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (what, from) = split_two(argument);
    if what.is_empty() {
        io.send_to_char(actor, "Get what?\n\r");
        return;
    }

    if from.is_empty() {
        // From the floor, honoring `2.sword` ordinals.
        let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
        let (ordinal, keyword) = mudstone_world::split_ordinal(what);
        let mut seen = 0;
        let found = world
            .rooms
            .get(&room_id)
            .map(|r| r.contents.clone())
            .unwrap_or_default()
            .into_iter()
            .find(|&o| {
                let matched = world.can_see_obj(actor, o)
                    && world
                        .objs
                        .get(&o)
                        .is_some_and(|obj| mudstone_world::is_name(keyword, &obj.name));
                if matched {
                    seen += 1;
                }
                matched && seen >= ordinal
            });
        let Some(obj_id) = found else {
            io.send_to_char(actor, "You do not see that here.\n\r");
            return;
        };
        take_obj(world, io, actor, obj_id);
        return;
    }

    // From a container.
    let Some(container_id) = world.find_obj_here(actor, from) else {
        io.send_to_char(actor, "You do not see that container here.\n\r");
        return;
    };
    if !world.objs.get(&container_id).is_some_and(mudstone_world::Object::is_container) {
        io.send_to_char(actor, "That's not a container.\n\r");
        return;
    }
    let found = world
        .objs
        .get(&container_id)
        .map(|c| c.contains.clone())
        .unwrap_or_default()
        .into_iter()
        .find(|&o| {
            world
                .objs
                .get(&o)
                .is_some_and(|obj| mudstone_world::is_name(keyword_of(what), &obj.name))
        });
    let Some(obj_id) = found else {
        io.send_to_char(actor, "You see nothing like that in it.\n\r");
        return;
    };
    world.obj_to_mob(obj_id, actor);
    act(world, io, "You get $p from $P.", actor, ActArg::Obj(obj_id), ActArg::Obj(container_id), ActTo::Char);
    act(world, io, "$n gets $p from $P.", actor, ActArg::Obj(obj_id), ActArg::Obj(container_id), ActTo::Room);
}

fn keyword_of(argument: &str) -> &str {
    mudstone_world::split_ordinal(argument).1
}

fn take_obj(world: &mut World, io: &mut GameIo, actor: MobId, obj_id: ObjId) {
    let takeable = world
        .objs
        .get(&obj_id)
        .is_some_and(|o| o.wear_flags & WEAR_TAKE != 0);
    if !takeable {
        io.send_to_char(actor, "You can't take that.\n\r");
        return;
    }
    world.obj_to_mob(obj_id, actor);
    act(world, io, "You get $p.", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Char);
    act(world, io, "$n gets $p.", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Room);
}

pub fn do_drop(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Drop what?\n\r");
        return;
    }
    let Some(obj_id) = world.find_obj_carry(actor, argument) else {
        io.send_to_char(actor, "You do not have that item.\n\r");
        return;
    };
    if world
        .objs
        .get(&obj_id)
        .is_some_and(|o| o.extra_flags & ITEM_NODROP != 0)
    {
        io.send_to_char(actor, "You can't let go of it.\n\r");
        return;
    }
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    world.obj_to_room(obj_id, room_id);
    act(world, io, "You drop $p.", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Char);
    act(world, io, "$n drops $p.", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Room);
}

pub fn do_put(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (what, where_) = split_two(argument);
    if what.is_empty() || where_.is_empty() {
        io.send_to_char(actor, "Put what in what?\n\r");
        return;
    }
    let Some(obj_id) = world.find_obj_carry(actor, what) else {
        io.send_to_char(actor, "You do not have that item.\n\r");
        return;
    };
    let Some(container_id) = world.find_obj_here(actor, where_) else {
        io.send_to_char(actor, "You do not see that container here.\n\r");
        return;
    };
    if obj_id == container_id {
        io.send_to_char(actor, "You can't fold it into itself.\n\r");
        return;
    }
    if !world.objs.get(&container_id).is_some_and(mudstone_world::Object::is_container) {
        io.send_to_char(actor, "That's not a container.\n\r");
        return;
    }
    world.obj_to_obj(obj_id, container_id);
    act(world, io, "You put $p in $P.", actor, ActArg::Obj(obj_id), ActArg::Obj(container_id), ActTo::Char);
    act(world, io, "$n puts $p in $P.", actor, ActArg::Obj(obj_id), ActArg::Obj(container_id), ActTo::Room);
}

pub fn do_give(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (first, rest) = split_two(argument);
    if first.is_empty() || rest.is_empty() {
        io.send_to_char(actor, "Give what to whom?\n\r");
        return;
    }

    // Money: give <amount> <gold|silver> <victim>.
    if let Ok(amount) = first.parse::<i64>() {
        let (unit, victim_word) = split_two(rest);
        give_money(world, io, actor, amount, unit, victim_word);
        return;
    }

    let Some(obj_id) = world.find_obj_carry(actor, first) else {
        io.send_to_char(actor, "You do not have that item.\n\r");
        return;
    };
    let Some(victim) = world.find_mob_room(actor, rest) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if world
        .objs
        .get(&obj_id)
        .is_some_and(|o| o.extra_flags & ITEM_NODROP != 0)
    {
        io.send_to_char(actor, "You can't let go of it.\n\r");
        return;
    }
    world.obj_to_mob(obj_id, victim);
    act(world, io, "You give $p to $N.", actor, ActArg::Obj(obj_id), ActArg::Mob(victim), ActTo::Char);
    act(world, io, "$n gives you $p.", actor, ActArg::Obj(obj_id), ActArg::Mob(victim), ActTo::Vict);
    act(world, io, "$n gives $p to $N.", actor, ActArg::Obj(obj_id), ActArg::Mob(victim), ActTo::NotVict);

    if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc) {
        let mut interp = Interpreter::new(io);
        mudstone_mobprog::give_trigger(world, &mut interp, victim, actor, obj_id);
    }
}

fn give_money(
    world: &mut World,
    io: &mut GameIo,
    actor: MobId,
    amount: i64,
    unit: &str,
    victim_word: &str,
) {
    if amount <= 0 || victim_word.is_empty() {
        io.send_to_char(actor, "Give what to whom?\n\r");
        return;
    }
    let gold = match unit {
        u if "gold".starts_with(u) && !u.is_empty() => true,
        u if "silver".starts_with(u) && !u.is_empty() => false,
        _ => {
            io.send_to_char(actor, "Sorry, you can't do that.\n\r");
            return;
        }
    };
    let Some(victim) = world.find_mob_room(actor, victim_word) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    let enough = world.mobs.get(&actor).is_some_and(|m| {
        if gold { m.gold >= amount } else { m.silver >= amount }
    });
    if !enough {
        io.send_to_char(actor, "You haven't got that much.\n\r");
        return;
    }
    if let Some(mob) = world.mobs.get_mut(&actor) {
        if gold {
            mob.gold -= amount;
        } else {
            mob.silver -= amount;
        }
    }
    if let Some(mob) = world.mobs.get_mut(&victim) {
        if gold {
            mob.gold += amount;
        } else {
            mob.silver += amount;
        }
    }
    let coins: &str = if gold { "gold" } else { "silver" };
    act(world, io, &format!("You give $N {amount} {coins}."), actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
    act(world, io, &format!("$n gives you {amount} {coins}."), actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
    act(world, io, "$n gives $N some coins.", actor, ActArg::None, ActArg::Mob(victim), ActTo::NotVict);

    if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc) {
        let silver_value = if gold { amount * 100 } else { amount };
        let mut interp = Interpreter::new(io);
        mudstone_mobprog::bribe_trigger(world, &mut interp, victim, actor, silver_value);
    }
}

/// Wear slots a wear-flag word allows, in fill order.
fn slots_for(wear_flags: Flags) -> Vec<WearSlot> {
    let mut slots = Vec::new();
    let table: &[(Flags, &[WearSlot])] = &[
        (WEAR_FLAG_FINGER, &[WearSlot::FingerLeft, WearSlot::FingerRight]),
        (WEAR_FLAG_NECK, &[WearSlot::Neck]),
        (WEAR_FLAG_BODY, &[WearSlot::Body]),
        (WEAR_FLAG_HEAD, &[WearSlot::Head]),
        (WEAR_FLAG_LEGS, &[WearSlot::Legs]),
        (WEAR_FLAG_FEET, &[WearSlot::Feet]),
        (WEAR_FLAG_HANDS, &[WearSlot::Hands]),
        (WEAR_FLAG_ARMS, &[WearSlot::Arms]),
        (WEAR_FLAG_SHIELD, &[WearSlot::Shield]),
        (WEAR_FLAG_ABOUT, &[WearSlot::About]),
        (WEAR_FLAG_WAIST, &[WearSlot::Waist]),
        (WEAR_FLAG_WRIST, &[WearSlot::WristLeft, WearSlot::WristRight]),
        (WEAR_FLAG_WIELD, &[WearSlot::Wield]),
        (WEAR_FLAG_HOLD, &[WearSlot::Hold]),
        (WEAR_FLAG_FLOAT, &[WearSlot::Float]),
    ];
    for (flag, flag_slots) in table {
        if wear_flags & flag != 0 {
            slots.extend_from_slice(flag_slots);
        }
    }
    slots
}

pub fn do_wear(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Wear what?\n\r");
        return;
    }
    let Some(obj_id) = world.find_obj_carry(actor, argument) else {
        io.send_to_char(actor, "You do not have that item.\n\r");
        return;
    };
    let (wear_flags, is_light) = match world.objs.get(&obj_id) {
        Some(obj) => (obj.wear_flags, obj.item_type == ItemType::Light),
        None => return,
    };
    let candidates = if is_light {
        vec![WearSlot::Light]
    } else {
        slots_for(wear_flags)
    };
    if candidates.is_empty() {
        io.send_to_char(actor, "You can't wear, wield, or hold that.\n\r");
        return;
    }
    let free = candidates
        .into_iter()
        .find(|s| world.mobs.get(&actor).is_some_and(|m| m.equipped(*s).is_none()));
    let Some(slot) = free else {
        io.send_to_char(actor, "You are already using that spot.\n\r");
        return;
    };
    world.equip_mob(actor, obj_id, slot);
    let (own, room) = match slot {
        WearSlot::Wield => ("You wield $p.", "$n wields $p."),
        WearSlot::Hold => ("You hold $p.", "$n holds $p."),
        WearSlot::Light => ("You light $p and hold it.", "$n lights $p and holds it."),
        _ => ("You wear $p.", "$n wears $p."),
    };
    act(world, io, own, actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Char);
    act(world, io, room, actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Room);
}

pub fn do_remove(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Remove what?\n\r");
        return;
    }
    let Some(obj_id) = world.find_obj_wear(actor, argument) else {
        io.send_to_char(actor, "You are not using that item.\n\r");
        return;
    };
    if world
        .objs
        .get(&obj_id)
        .is_some_and(|o| o.extra_flags & ITEM_NOREMOVE != 0)
    {
        io.send_to_char(actor, "You can't remove it.\n\r");
        return;
    }
    world.unequip_mob(actor, obj_id);
    act(world, io, "You stop using $p.", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Char);
    act(world, io, "$n stops using $p.", actor, ActArg::Obj(obj_id), ActArg::None, ActTo::Room);
}

/// The location of an object, for stat displays.
pub fn location_label(world: &World, obj_id: ObjId) -> String {
    match world.objs.get(&obj_id).map(|o| o.location) {
        Some(ObjLocation::Room(room)) => format!("in room {room}"),
        Some(ObjLocation::Carried(mob)) => format!("carried by {mob}"),
        Some(ObjLocation::Inside(container)) => format!("inside {container}"),
        Some(ObjLocation::Nowhere) | None => "nowhere".to_string(),
    }
}
