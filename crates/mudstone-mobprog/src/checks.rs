//! If-check evaluation.
//!
//! Checks come in five syntactic forms:
//!
//! 1. keyword and value            — `if rand 30`
//! 2. keyword, operator, value     — `if people > 2`
//! 3. keyword and actor            — `if isnpc $n`
//! 4. keyword, actor, value        — `if carries $n sword`
//! 5. keyword, actor, op, value    — `if level $n >= 10`

use rand::Rng;

use mudstone_types::{Flags, ItemType, MobId, ObjId, Position, Vnum};
use mudstone_world::{Census, QuestState, World};

use crate::flow::ProgArgs;

fn bug_syntax(pvnum: Vnum, line: &str, which: u8) -> bool {
    tracing::warn!(target: "bug", prog = %pvnum, line, which, "mobprog: check syntax error");
    false
}

fn next_word<'a>(rest: &mut &'a str) -> &'a str {
    let trimmed = rest.trim_start();
    let end = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (word, tail) = trimmed.split_at(end);
    *rest = tail;
    word
}

fn num_eval(lval: i32, oper: &str, rval: i32) -> Option<bool> {
    Some(match oper {
        "==" => lval == rval,
        "!=" => lval != rval,
        ">=" => lval >= rval,
        "<=" => lval <= rval,
        ">" => lval > rval,
        "<" => lval < rval,
        _ => return None,
    })
}

/// Named flag lookup used by `affected`/`act`/`off`/`imm` checks. Only
/// the bits the simulation consults are addressable by name.
fn flag_lookup(table: &[(&str, Flags)], word: &str) -> Flags {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(word))
        .map_or(0, |(_, bit)| *bit)
}

const AFFECT_FLAGS: &[(&str, Flags)] = &[
    ("blind", mudstone_types::AFF_BLIND),
    ("invisible", mudstone_types::AFF_INVISIBLE),
    ("detect_invis", mudstone_types::AFF_DETECT_INVIS),
    ("detect_hidden", mudstone_types::AFF_DETECT_HIDDEN),
    ("sanctuary", mudstone_types::AFF_SANCTUARY),
    ("infrared", mudstone_types::AFF_INFRARED),
    ("curse", mudstone_types::AFF_CURSE),
    ("poison", mudstone_types::AFF_POISON),
    ("sneak", mudstone_types::AFF_SNEAK),
    ("hide", mudstone_types::AFF_HIDE),
    ("charm", mudstone_types::AFF_CHARM),
    ("flying", mudstone_types::AFF_FLYING),
    ("pass_door", mudstone_types::AFF_PASS_DOOR),
    ("haste", mudstone_types::AFF_HASTE),
    ("plague", mudstone_types::AFF_PLAGUE),
    ("regeneration", mudstone_types::AFF_REGENERATION),
];

const OFF_FLAGS: &[(&str, Flags)] = &[
    ("area_attack", letter('A')),
    ("backstab", letter('B')),
    ("bash", letter('C')),
    ("berserk", letter('D')),
    ("disarm", letter('E')),
    ("dodge", letter('F')),
    ("fade", letter('G')),
    ("fast", letter('H')),
    ("kick", letter('I')),
    ("parry", letter('L')),
    ("rescue", letter('M')),
    ("tail", letter('N')),
    ("trip", letter('O')),
    ("crush", letter('P')),
];

const IMM_FLAGS: &[(&str, Flags)] = &[
    ("summon", letter('A')),
    ("charm", letter('B')),
    ("magic", letter('C')),
    ("weapon", letter('D')),
    ("bash", letter('E')),
    ("pierce", letter('F')),
    ("slash", letter('G')),
    ("fire", letter('H')),
    ("cold", letter('I')),
    ("lightning", letter('J')),
    ("acid", letter('K')),
    ("poison", letter('L')),
    ("negative", letter('M')),
    ("holy", letter('N')),
    ("energy", letter('O')),
    ("mental", letter('P')),
];

const fn letter(c: char) -> Flags {
    match c {
        'A'..='Z' => 1i64 << (c as u32 - 'A' as u32),
        _ => 0,
    }
}

const ACT_FLAGS: &[(&str, Flags)] = &[
    ("npc", mudstone_types::ACT_IS_NPC),
    ("sentinel", mudstone_types::ACT_SENTINEL),
    ("scavenger", mudstone_types::ACT_SCAVENGER),
    ("aggressive", mudstone_types::ACT_AGGRESSIVE),
    ("stay_area", mudstone_types::ACT_STAY_AREA),
    ("wimpy", mudstone_types::ACT_WIMPY),
    ("pet", mudstone_types::ACT_PET),
    ("train", mudstone_types::ACT_TRAIN),
    ("practice", mudstone_types::ACT_PRACTICE),
];

/// Evaluates one check line (keyword already split off into `check`).
/// Unknown actors and malformed lines evaluate false with a bug record.
pub fn eval_check(
    world: &mut World,
    pvnum: Vnum,
    mob_id: MobId,
    args: &ProgArgs,
    rand_mob: &mut Option<MobId>,
    check: &str,
    rest: &str,
) -> bool {
    let mut rest = rest;
    let first = next_word(&mut rest).to_string();
    if first.is_empty() {
        return bug_syntax(pvnum, check, 1);
    }

    // Default the remembered target to the current actor.
    if world.mobs.get(&mob_id).is_some_and(|m| m.mprog_target.is_none()) {
        if let Some(actor) = args.actor {
            if let Some(mob) = world.mobs.get_mut(&mob_id) {
                mob.mprog_target = Some(actor);
            }
        }
    }

    // Form 1: keyword and plain value.
    match check {
        "rand" => {
            let threshold: i32 = first.parse().unwrap_or(0);
            return world.rng.gen_range(0..100) < threshold;
        }
        "mobhere" => {
            let Some(room) = world.mobs.get(&mob_id).and_then(|m| m.room) else {
                return false;
            };
            return if let Ok(vnum) = first.parse::<i32>() {
                world.find_mob_vnum_room(room, Vnum::new(vnum)).is_some()
            } else {
                world.find_mob_room(mob_id, &first).is_some()
            };
        }
        "objhere" => {
            let Some(room) = world.mobs.get(&mob_id).and_then(|m| m.room) else {
                return false;
            };
            return if let Ok(vnum) = first.parse::<i32>() {
                world.room_has_obj_vnum(room, Vnum::new(vnum))
            } else {
                world.find_obj_here(mob_id, &first).is_some()
            };
        }
        "mobexists" => return world.find_mob_world(mob_id, &first).is_some(),
        "objexists" => return world.find_obj_world(mob_id, &first).is_some(),
        _ => {}
    }

    // Form 2: keyword, operator, value over a room census.
    let census = match check {
        "people" => Some(world.count_people_room(mob_id, Census::All)),
        "players" => Some(world.count_people_room(mob_id, Census::Players)),
        "mobs" => Some(world.count_people_room(mob_id, Census::Npcs)),
        "clones" => Some(world.count_people_room(mob_id, Census::Clones)),
        "order" => Some(world.mob_order(mob_id)),
        "hour" => Some(world.clock.hour),
        _ => None,
    };
    if let Some(lval) = census {
        let rval: i32 = next_word(&mut rest).parse().unwrap_or(0);
        return num_eval(lval, &first, rval).unwrap_or_else(|| bug_syntax(pvnum, check, 2));
    }

    // Forms 3-5 name an actor with a $-code.
    let mut code_chars = first.chars();
    if code_chars.next() != Some('$') {
        return bug_syntax(pvnum, check, 3);
    }
    let code = code_chars.next().unwrap_or(' ');
    let mut target_mob: Option<MobId> = None;
    let mut target_obj: Option<ObjId> = None;
    match code {
        'i' => target_mob = Some(mob_id),
        'n' => target_mob = args.actor,
        't' => target_mob = args.victim,
        'r' => {
            if rand_mob.is_none() {
                *rand_mob = world.random_player_in_room(mob_id);
            }
            target_mob = *rand_mob;
        }
        'q' => target_mob = world.mobs.get(&mob_id).and_then(|m| m.mprog_target),
        'o' => target_obj = args.obj1,
        'p' => target_obj = args.obj2,
        _ => return bug_syntax(pvnum, check, 4),
    }
    if target_mob.is_none() && target_obj.is_none() {
        return false;
    }
    let mob_ref = target_mob.and_then(|m| world.mobs.get(&m));

    // Form 3: keyword and actor.
    match check {
        "ispc" => return mob_ref.is_some_and(|m| !m.is_npc()),
        "isnpc" => return mob_ref.is_some_and(mudstone_world::Mobile::is_npc),
        "isgood" => return mob_ref.is_some_and(mudstone_world::Mobile::is_good),
        "isevil" => return mob_ref.is_some_and(mudstone_world::Mobile::is_evil),
        "isneutral" => return mob_ref.is_some_and(mudstone_world::Mobile::is_neutral),
        "isimmort" => return mob_ref.is_some_and(mudstone_world::Mobile::is_immortal),
        "ischarm" => return mob_ref.is_some_and(|m| m.has_affect(mudstone_types::AFF_CHARM)),
        "isfollow" => {
            return mob_ref.is_some_and(|m| {
                m.master
                    .and_then(|master| world.mobs.get(&master))
                    .is_some_and(|master| master.room == m.room)
            })
        }
        "isactive" => return mob_ref.is_some_and(|m| m.position > Position::Sleeping),
        "isdelay" => return mob_ref.is_some_and(|m| m.mprog_delay > 0),
        "isvisible" => {
            return match (target_mob, target_obj) {
                (Some(target), _) => world.can_see(mob_id, target),
                (None, Some(obj)) => world.can_see_obj(mob_id, obj),
                _ => false,
            }
        }
        "hastarget" => {
            return mob_ref.is_some_and(|m| {
                m.mprog_target
                    .and_then(|t| world.mobs.get(&t))
                    .is_some_and(|t| t.room == m.room)
            })
        }
        "istarget" => {
            return world
                .mobs
                .get(&mob_id)
                .is_some_and(|m| m.mprog_target == target_mob && target_mob.is_some())
        }
        "exists" => return mob_ref.is_some() || target_obj.is_some(),
        _ => {}
    }

    // Form 4: keyword, actor, value.
    let value = first_of(&mut rest);
    match check {
        "affected" => {
            return mob_ref
                .is_some_and(|m| m.affect_flags & flag_lookup(AFFECT_FLAGS, &value) != 0)
        }
        "act" => {
            return mob_ref.is_some_and(|m| m.act_flags & flag_lookup(ACT_FLAGS, &value) != 0)
        }
        "off" => {
            return mob_ref.is_some_and(|m| m.off_flags & flag_lookup(OFF_FLAGS, &value) != 0)
        }
        "imm" => {
            return mob_ref.is_some_and(|m| m.imm_flags & flag_lookup(IMM_FLAGS, &value) != 0)
        }
        "carries" => {
            let Some(target) = target_mob else { return false };
            return if let Ok(vnum) = value.parse::<i32>() {
                world.has_item(target, Some(Vnum::new(vnum)), None, false)
            } else {
                world.find_obj_carry(target, &value).is_some()
            };
        }
        "wears" => {
            let Some(target) = target_mob else { return false };
            return if let Ok(vnum) = value.parse::<i32>() {
                world.has_item(target, Some(Vnum::new(vnum)), None, true)
            } else {
                world.find_obj_wear(target, &value).is_some()
            };
        }
        "has" => {
            let Some(target) = target_mob else { return false };
            return ItemType::parse(&value)
                .is_some_and(|t| world.has_item(target, None, Some(t), false));
        }
        "uses" => {
            let Some(target) = target_mob else { return false };
            return ItemType::parse(&value)
                .is_some_and(|t| world.has_item(target, None, Some(t), true));
        }
        "name" => {
            return match (mob_ref, target_obj.and_then(|o| world.objs.get(&o))) {
                (Some(m), _) => mudstone_world::is_name(&value, &m.name),
                (None, Some(o)) => mudstone_world::is_name(&value, &o.name),
                _ => false,
            }
        }
        "pos" => {
            return mob_ref
                .is_some_and(|m| Position::parse(&value) == Some(m.position))
        }
        "clan" => return mob_ref.is_some_and(|m| m.clan.eq_ignore_ascii_case(&value)),
        "race" => return mob_ref.is_some_and(|m| m.race.eq_ignore_ascii_case(&value)),
        "class" => return mob_ref.is_some_and(|m| m.class.eq_ignore_ascii_case(&value)),
        "objtype" => {
            return target_obj
                .and_then(|o| world.objs.get(&o))
                .is_some_and(|o| ItemType::parse(&value) == Some(o.item_type))
        }
        "canquest" => {
            let vnum = Vnum::new(value.parse().unwrap_or(0));
            return mob_ref.is_some_and(|m| !m.is_npc() && m.quest_state(vnum).is_none());
        }
        "hasquest" => {
            let vnum = Vnum::new(value.parse().unwrap_or(0));
            return mob_ref.is_some_and(|m| m.quest_state(vnum) == Some(QuestState::Open));
        }
        "canfinishquest" => {
            let vnum = Vnum::new(value.parse().unwrap_or(0));
            return mob_ref.is_some_and(|m| m.quest_state(vnum) == Some(QuestState::Open));
        }
        _ => {}
    }

    // Form 5: keyword, actor, operator, value.
    let oper = value;
    let rval: i32 = first_of(&mut rest).parse().unwrap_or(0);
    let obj_ref = target_obj.and_then(|o| world.objs.get(&o));
    let lval = match check {
        "vnum" => match (mob_ref, obj_ref) {
            (Some(m), _) => m.proto.map_or(0, Vnum::get),
            (None, Some(o)) => o.proto.get(),
            _ => 0,
        },
        "hpcnt" => mob_ref.map_or(0, mudstone_world::Mobile::hp_percent),
        "room" => target_mob
            .and_then(|m| world.mobs.get(&m))
            .and_then(|m| m.room)
            .and_then(|r| world.rooms.get(&r))
            .map_or(0, |r| r.vnum.get()),
        "sex" => mob_ref.map_or(0, |m| m.sex as i32),
        "level" => mob_ref.map_or(0, |m| i32::from(m.level)),
        "align" => mob_ref.map_or(0, |m| m.alignment),
        "money" => mob_ref.map_or(0, |m| m.money() as i32),
        "objval0" => obj_ref.map_or(0, |o| o.values[0]),
        "objval1" => obj_ref.map_or(0, |o| o.values[1]),
        "objval2" => obj_ref.map_or(0, |o| o.values[2]),
        "objval3" => obj_ref.map_or(0, |o| o.values[3]),
        "objval4" => obj_ref.map_or(0, |o| o.values[4]),
        "grpsize" => {
            let Some(target) = target_mob else { return false };
            world.count_people_room(target, Census::Group)
        }
        _ => return bug_syntax(pvnum, check, 5),
    };
    num_eval(lval, &oper, rval).unwrap_or_else(|| bug_syntax(pvnum, check, 5))
}

fn first_of(rest: &mut &str) -> String {
    next_word(rest).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(3, "==", 3, Some(true))]
    #[test_case(3, "!=", 3, Some(false))]
    #[test_case(2, "<", 3, Some(true))]
    #[test_case(2, "<=", 2, Some(true))]
    #[test_case(2, ">", 3, Some(false) ; "gt")]
    #[test_case(2, ">=", 3, Some(false) ; "gte")]
    #[test_case(2, "<>", 3, None)]
    fn num_eval_operators(lval: i32, oper: &str, rval: i32, expected: Option<bool>) {
        assert_eq!(num_eval(lval, oper, rval), expected);
    }

    #[test]
    fn next_word_walks_the_line() {
        let mut rest = "  carries $n  sword";
        assert_eq!(next_word(&mut rest), "carries");
        assert_eq!(next_word(&mut rest), "$n");
        assert_eq!(next_word(&mut rest), "sword");
        assert_eq!(next_word(&mut rest), "");
    }

    #[test]
    fn flag_lookup_is_case_insensitive() {
        assert_eq!(
            flag_lookup(AFFECT_FLAGS, "Charm"),
            mudstone_types::AFF_CHARM
        );
        assert_eq!(flag_lookup(AFFECT_FLAGS, "nosuch"), 0);
    }
}
