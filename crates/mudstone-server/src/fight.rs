//! Combat: hit resolution, the damage pipeline, death, and corpses.

use rand::Rng;

use mudstone_mobprog::{Interpreter, ProgArgs, TriggerKind};
use mudstone_types::{
    DamageType, Flags, ItemType, MobId, ObjId, Position, Vnum, WearSlot, AFF_SANCTUARY,
    ITEM_ROT_DEATH, ROOM_SAFE,
};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::game::GameIo;
use crate::wiznet::{self, WiznetEvent};

/// Engine-reserved prototype for corpses; registered at boot if no area
/// provides it.
pub const CORPSE_VNUM: Vnum = Vnum(10);
/// Engine-reserved prototype for coin piles.
pub const MONEY_VNUM: Vnum = Vnum(2);

pub fn do_kill(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Kill whom?\n\r");
        return;
    }
    let Some(victim) = world.find_mob_room(actor, argument) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if victim == actor {
        io.send_to_char(actor, "You hit yourself. Ouch!\n\r");
        return;
    }
    if let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) {
        if world.room_flags(room_id) & ROOM_SAFE != 0 {
            io.send_to_char(actor, "Not in this room.\n\r");
            return;
        }
    }
    let victim_is_player = world.mobs.get(&victim).is_some_and(|v| !v.is_npc());
    let actor_is_player = world.mobs.get(&actor).is_some_and(|m| !m.is_npc());
    if victim_is_player && actor_is_player {
        io.send_to_char(actor, "You must MURDER a player.\n\r");
        return;
    }
    if world.mobs.get(&actor).is_some_and(|m| m.fighting.is_some()) {
        io.send_to_char(actor, "You do the best you can!\n\r");
        return;
    }

    // Attacking takes the rest of the round.
    if let Some(mob) = world.mobs.get_mut(&actor) {
        mob.wait = mob.wait.max(4);
    }
    set_fighting(world, actor, victim);
    one_round(world, io, actor, victim);
}

pub fn do_flee(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get(&actor) else { return };
    if mob.fighting.is_none() {
        io.send_to_char(actor, "You aren't fighting anyone.\n\r");
        return;
    }
    let Some(room_id) = mob.room else { return };

    for _ in 0..6 {
        let dir_index = world.rng.gen_range(0..mudstone_types::DIR_MAX);
        let dir = mudstone_types::Direction::ALL[dir_index];
        let open = world
            .rooms
            .get(&room_id)
            .and_then(|r| r.exit(dir))
            .is_some_and(|e| e.to_room.is_some() && !e.state.is_closed());
        if !open {
            continue;
        }
        act(world, io, "$n has fled!", actor, ActArg::None, ActArg::None, ActTo::Room);
        world.stop_fighting(actor, true);
        crate::act_move::move_char(world, io, actor, dir, false);
        io.send_to_char(actor, "You flee from combat!\n\r");
        return;
    }
    io.send_to_char(actor, "PANIC! You couldn't escape!\n\r");
}

pub fn do_rescue(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Rescue whom?\n\r");
        return;
    }
    let Some(victim) = world.find_mob_room(actor, argument) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if victim == actor {
        io.send_to_char(actor, "What about fleeing instead?\n\r");
        return;
    }
    let attacker = world
        .mobs
        .values()
        .find(|m| m.fighting == Some(victim) && m.room == world.mobs.get(&victim).and_then(|v| v.room))
        .map(|m| m.id);
    let Some(attacker) = attacker else {
        act(world, io, "But nobody is fighting $M!", actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
        return;
    };

    act(world, io, "You rescue $N!", actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
    act(world, io, "$n rescues you!", actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
    act(world, io, "$n rescues $N!", actor, ActArg::None, ActArg::Mob(victim), ActTo::NotVict);

    world.stop_fighting(victim, false);
    if let Some(att) = world.mobs.get_mut(&attacker) {
        att.fighting = Some(actor);
    }
    set_fighting(world, actor, attacker);
}

pub fn do_surrender(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(opponent) = world.mobs.get(&actor).and_then(|m| m.fighting) else {
        io.send_to_char(actor, "But you're not fighting!\n\r");
        return;
    };
    act(world, io, "You surrender to $N!", actor, ActArg::None, ActArg::Mob(opponent), ActTo::Char);
    act(world, io, "$n surrenders to you!", actor, ActArg::None, ActArg::Mob(opponent), ActTo::Vict);
    act(world, io, "$n tries to surrender to $N!", actor, ActArg::None, ActArg::Mob(opponent), ActTo::NotVict);
    world.stop_fighting(actor, true);

    let accepted = {
        let mut interp = Interpreter::new(io);
        mudstone_mobprog::surrender_trigger(world, &mut interp, opponent, actor)
    };
    if !accepted
        && world.mobs.get(&opponent).is_some_and(mudstone_world::Mobile::is_npc)
        && world.mobs.contains_key(&actor)
    {
        act(world, io, "$N seems to ignore your cowardly act!", actor, ActArg::None, ActArg::Mob(opponent), ActTo::Char);
        set_fighting(world, opponent, actor);
    }
}

/// Enters both sides into combat if not already engaged.
pub fn set_fighting(world: &mut World, attacker: MobId, victim: MobId) {
    if let Some(mob) = world.mobs.get_mut(&attacker) {
        if mob.fighting.is_none() {
            mob.fighting = Some(victim);
            mob.position = Position::Fighting;
        }
    }
    if let Some(mob) = world.mobs.get_mut(&victim) {
        if mob.fighting.is_none() {
            mob.fighting = Some(attacker);
            mob.position = Position::Fighting;
        }
    }
}

/// One violence-tick round of combat for every engaged pair.
pub fn violence_update(world: &mut World, io: &mut GameIo) {
    let fighters: Vec<(MobId, MobId)> = world
        .mobs
        .values()
        .filter_map(|m| m.fighting.map(|v| (m.id, v)))
        .collect();
    for (attacker, victim) in fighters {
        // Either side may have died earlier in this tick.
        let co_located = match (world.mobs.get(&attacker), world.mobs.get(&victim)) {
            (Some(a), Some(v)) => a.room.is_some() && a.room == v.room,
            _ => false,
        };
        if !co_located {
            world.stop_fighting(attacker, false);
            continue;
        }
        if world
            .mobs
            .get(&attacker)
            .is_some_and(|a| a.position < Position::Fighting)
        {
            continue;
        }

        one_round(world, io, attacker, victim);

        // Scripted reactions to the round.
        if world.mobs.contains_key(&attacker) && world.mobs.contains_key(&victim) {
            if world.mobs.get(&attacker).is_some_and(mudstone_world::Mobile::is_npc) {
                let mut interp = Interpreter::new(io);
                mudstone_mobprog::percent_trigger(
                    world,
                    &mut interp,
                    attacker,
                    &ProgArgs::actor(victim),
                    TriggerKind::Kill,
                );
            }
            if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc) {
                let mut interp = Interpreter::new(io);
                mudstone_mobprog::percent_trigger(
                    world,
                    &mut interp,
                    victim,
                    &ProgArgs::actor(attacker),
                    TriggerKind::Fight,
                );
                let mut interp = Interpreter::new(io);
                mudstone_mobprog::hp_trigger(world, &mut interp, victim, attacker);
            }
        }
    }
}

/// One attacker swing: hit resolution then the damage pipeline.
fn one_round(world: &mut World, io: &mut GameIo, attacker: MobId, victim: MobId) {
    let Some(att) = world.mobs.get(&attacker) else { return };
    let Some(vic) = world.mobs.get(&victim) else { return };

    let to_hit = i32::from(att.level) + att.hitroll;
    let defense = (100 - vic.armor) / 10 + i32::from(vic.level) / 2;
    let roll = world.rng.gen_range(0..20);

    if roll == 0 || (roll != 19 && roll + to_hit < defense) {
        // A swing and a miss.
        act(world, io, "Your attack misses $N.", attacker, ActArg::None, ActArg::Mob(victim), ActTo::Char);
        act(world, io, "$n's attack misses you.", attacker, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
        return;
    }

    let (dice, dam_type) = attack_of(world, attacker);
    let base = dice + world.mobs.get(&attacker).map_or(0, |a| a.damroll);
    damage(world, io, attacker, victim, base.max(1), dam_type, true);
}

/// The attacker's damage dice and type: wielded weapon for armed
/// mobiles, prototype dice for NPCs, fists otherwise.
fn attack_of(world: &mut World, attacker: MobId) -> (i32, DamageType) {
    let weapon: Option<ObjId> = world
        .mobs
        .get(&attacker)
        .and_then(|m| m.equipped(WearSlot::Wield));
    if let Some(weapon) = weapon {
        if let Some(obj) = world.objs.get(&weapon) {
            if obj.item_type == ItemType::Weapon {
                let (number, size) = (obj.values[1].max(1), obj.values[2].max(1));
                let mut total = 0;
                for _ in 0..number {
                    total += world.rng.gen_range(1..=size);
                }
                return (total, DamageType::from_number(obj.values[3]));
            }
        }
    }
    let proto = world
        .mobs
        .get(&attacker)
        .and_then(|m| m.proto)
        .and_then(|v| world.registry.mob(v).cloned());
    match proto {
        Some(proto) => (proto.damage.roll(&mut world.rng), proto.dam_type),
        None => (world.rng.gen_range(1..=4), DamageType::Bash),
    }
}

/// Immunity bit for a damage type, in the imm/res/vuln flag words.
fn damage_bit(dam_type: DamageType) -> Flags {
    let letter = match dam_type {
        DamageType::Bash => 'E',
        DamageType::Pierce => 'F',
        DamageType::Slash => 'G',
        DamageType::Fire => 'H',
        DamageType::Cold => 'I',
        DamageType::Lightning => 'J',
        DamageType::Acid => 'K',
        DamageType::Poison => 'L',
        DamageType::Negative => 'M',
        DamageType::Holy => 'N',
        DamageType::Energy => 'O',
        DamageType::Mental => 'P',
        DamageType::None => return 0,
    };
    mudstone_types::letter_bit(letter)
}

/// The damage pipeline: scaling by immunity/resistance/vulnerability and
/// sanctuary, position update, and death resolution. Total on any input;
/// dead or missing entities are ignored.
pub fn damage(
    world: &mut World,
    io: &mut GameIo,
    attacker: MobId,
    victim: MobId,
    amount: i32,
    dam_type: DamageType,
    visible: bool,
) {
    if !world.mobs.contains_key(&victim) {
        return;
    }
    let bit = damage_bit(dam_type);
    let mut amount = amount;
    if let Some(vic) = world.mobs.get(&victim) {
        if vic.imm_flags & bit != 0 {
            amount = 0;
        } else if vic.res_flags & bit != 0 {
            amount -= amount / 3;
        } else if vic.vuln_flags & bit != 0 {
            amount += amount / 2;
        }
        if vic.has_affect(AFF_SANCTUARY) {
            amount /= 2;
        }
    }

    if attacker != victim {
        set_fighting(world, attacker, victim);
        // NPCs hold a grudge.
        let remembers = world
            .mobs
            .get(&victim)
            .is_some_and(|v| v.is_npc() && !v.memory.contains(&attacker));
        if remembers {
            if let Some(vic) = world.mobs.get_mut(&victim) {
                vic.memory.push(attacker);
            }
        }
    }

    if visible {
        let verb = damage_verb(amount);
        act(
            world,
            io,
            &format!("You {verb} $N!"),
            attacker,
            ActArg::None,
            ActArg::Mob(victim),
            ActTo::Char,
        );
        act(
            world,
            io,
            &format!("$n {verb}s you!"),
            attacker,
            ActArg::None,
            ActArg::Mob(victim),
            ActTo::Vict,
        );
    }

    let dead = {
        let Some(vic) = world.mobs.get_mut(&victim) else { return };
        vic.hit -= amount;
        update_pos(vic);
        vic.position == Position::Dead
    };

    if dead {
        raw_kill(world, io, attacker, victim);
    }
}

fn damage_verb(amount: i32) -> &'static str {
    match amount {
        i32::MIN..=0 => "miss",
        1..=4 => "scratch",
        5..=12 => "hit",
        13..=24 => "wound",
        25..=40 => "maul",
        41..=60 => "DEVASTATE",
        _ => "OBLITERATE",
    }
}

/// Position follows hit points on the way down.
fn update_pos(mob: &mut mudstone_world::Mobile) {
    if mob.hit > 0 {
        if mob.position <= Position::Stunned {
            mob.position = Position::Resting;
        }
        return;
    }
    if mob.is_npc() || mob.hit <= -11 {
        mob.position = Position::Dead;
    } else if mob.hit <= -6 {
        mob.position = Position::Mortal;
    } else if mob.hit <= -3 {
        mob.position = Position::Incap;
    } else {
        mob.position = Position::Stunned;
    }
}

/// Death: triggers, messages, corpse and loot, extraction. Player
/// victims respawn at the recall room.
fn raw_kill(world: &mut World, io: &mut GameIo, killer: MobId, victim: MobId) {
    // The death trigger runs before the corpse exists.
    if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc) {
        if let Some(mob) = world.mobs.get_mut(&victim) {
            mob.position = Position::Standing; // so the program can act
        }
        let mut interp = Interpreter::new(io);
        mudstone_mobprog::percent_trigger(
            world,
            &mut interp,
            victim,
            &ProgArgs::actor(killer),
            TriggerKind::Death,
        );
        if let Some(mob) = world.mobs.get_mut(&victim) {
            mob.position = Position::Dead;
        }
    }
    if !world.mobs.contains_key(&victim) {
        return; // the trigger purged it already
    }

    act(world, io, "$n is DEAD!!", victim, ActArg::None, ActArg::None, ActTo::Room);
    io.send_to_char(victim, "You have been KILLED!!\n\r");

    let victim_name = world
        .mobs
        .get(&victim)
        .map_or_else(String::new, |m| m.short_descr.to_string());
    let is_npc = world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc);
    wiznet::wiznet(
        world,
        io,
        &format!("{victim_name} got toasted by something in the world."),
        None,
        if is_npc { WiznetEvent::MobDeaths } else { WiznetEvent::Deaths },
        0,
    );

    world.stop_fighting(victim, true);
    make_corpse(world, io, victim);

    if is_npc {
        world.extract_mob(victim, true);
    } else {
        // Players wake up at the temple, battered. Their belongings are
        // already in the corpse.
        let recall = Vnum::new(io.config.game.recall_vnum);
        if let Some(room) = world.room_by_vnum(recall) {
            world.transfer_mob(victim, room);
        }
        if let Some(mob) = world.mobs.get_mut(&victim) {
            mob.hit = 1;
            mob.position = Position::Resting;
        }
    }
}

/// Builds a corpse, moves the victim's carried objects into it, and for
/// NPCs rolls the resolved loot table into it.
fn make_corpse(world: &mut World, io: &mut GameIo, victim: MobId) {
    let Some(room_id) = world.mobs.get(&victim).and_then(|m| m.room) else { return };
    let victim_name = world
        .mobs
        .get(&victim)
        .map_or_else(String::new, |m| m.first_name().to_string());
    let Some(corpse_id) = world.create_object(CORPSE_VNUM, 0) else {
        return;
    };
    if let Some(corpse) = world.objs.get_mut(&corpse_id) {
        corpse.item_type = ItemType::Corpse;
        corpse.extra_flags |= ITEM_ROT_DEATH;
        corpse.timer = 5;
        corpse.name = format!("corpse {victim_name}").into();
        corpse.short_descr = format!("the corpse of {victim_name}").into();
        corpse.description = format!("The corpse of {victim_name} is lying here.").into();
    }
    world.obj_to_room(corpse_id, room_id);

    // Inventory and equipment fall into the corpse.
    let carried: Vec<ObjId> = world
        .mobs
        .get(&victim)
        .map(|m| m.carrying.clone())
        .unwrap_or_default();
    for obj_id in carried {
        world.obj_to_obj(obj_id, corpse_id);
    }

    // Coins and the loot table.
    let (gold, silver) = world
        .mobs
        .get(&victim)
        .map_or((0, 0), |m| (m.gold, m.silver));
    if gold > 0 || silver > 0 {
        if let Some(money) = create_money(world, gold, silver) {
            world.obj_to_obj(money, corpse_id);
        }
        if let Some(mob) = world.mobs.get_mut(&victim) {
            mob.gold = 0;
            mob.silver = 0;
        }
    }

    let table = world
        .mobs
        .get(&victim)
        .filter(|m| m.is_npc())
        .and_then(|m| m.proto)
        .and_then(|v| world.registry.mob(v).cloned())
        .and_then(|p| p.loot_table.clone());
    if let Some(table) = table {
        let drops = mudstone_loot::generate_loot(&io.loot, &table, &mut world.rng);
        for drop in drops {
            match drop {
                mudstone_loot::LootDrop::Item { vnum, qty } => {
                    for _ in 0..qty {
                        let level = world.registry.object(vnum).map_or(1, |p| p.level);
                        if let Some(obj) = world.create_object(vnum, level) {
                            world.obj_to_obj(obj, corpse_id);
                        }
                    }
                }
                mudstone_loot::LootDrop::Coins { qty } => {
                    if let Some(money) = create_money(world, 0, i64::from(qty)) {
                        world.obj_to_obj(money, corpse_id);
                    }
                }
            }
        }
    }
}

/// Builds a coin pile object carrying the given value.
pub fn create_money(world: &mut World, gold: i64, silver: i64) -> Option<ObjId> {
    let money = world.create_object(MONEY_VNUM, 0)?;
    if let Some(obj) = world.objs.get_mut(&money) {
        obj.item_type = ItemType::Money;
        obj.values[0] = silver as i32;
        obj.values[1] = gold as i32;
        obj.short_descr = if gold > 0 && silver > 0 {
            format!("a pile of {gold} gold and {silver} silver").into()
        } else if gold > 0 {
            format!("{gold} gold coins").into()
        } else {
            format!("{silver} silver coins").into()
        };
        obj.description = "A pile of coins lies here.".into();
    }
    Some(money)
}
