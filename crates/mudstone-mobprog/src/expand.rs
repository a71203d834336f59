//! `$`-code expansion.
//!
//! Before a program line executes it is expanded against the running mob
//! and the trigger's actors. Missing or invisible referents expand to
//! "someone" / "something" so a malformed script cannot dereference a
//! dead target.

use mudstone_types::{MobId, ObjId};
use mudstone_world::World;

use crate::flow::ProgArgs;

const SOMEONE: &str = "someone";
const SOMETHING: &str = "something";
const SOMEONES: &str = "someone's";

/// Expands every `$`-code in `format`.
pub fn expand_code(
    world: &mut World,
    mob_id: MobId,
    args: &ProgArgs,
    rand_mob: &mut Option<MobId>,
    format: &str,
) -> String {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let Some(code) = chars.next() else { break };
        if matches!(code, 'r' | 'R' | 'J' | 'K' | 'L') && rand_mob.is_none() {
            *rand_mob = world.random_player_in_room(mob_id);
        }
        let target = world.mobs.get(&mob_id).and_then(|m| m.mprog_target);
        let expansion: String = match code {
            'i' => first_keyword(world, Some(mob_id)).unwrap_or_else(|| SOMEONE.into()),
            'I' => short_descr(world, Some(mob_id)).unwrap_or_else(|| SOMEONE.into()),
            'n' => visible_name(world, mob_id, args.actor),
            'N' => visible_full_name(world, mob_id, args.actor),
            't' => visible_name(world, mob_id, args.victim),
            'T' => visible_full_name(world, mob_id, args.victim),
            'r' => visible_name(world, mob_id, *rand_mob),
            'R' => visible_full_name(world, mob_id, *rand_mob),
            'q' => visible_name(world, mob_id, target),
            'Q' => visible_full_name(world, mob_id, target),
            'j' => pronoun(world, Some(mob_id), Pronoun::Subject, SOMEONE),
            'e' => seen_pronoun(world, mob_id, args.actor, Pronoun::Subject, SOMEONE),
            'E' => seen_pronoun(world, mob_id, args.victim, Pronoun::Subject, SOMEONE),
            'J' => seen_pronoun(world, mob_id, *rand_mob, Pronoun::Subject, SOMEONE),
            'X' => seen_pronoun(world, mob_id, target, Pronoun::Subject, SOMEONE),
            'k' => pronoun(world, Some(mob_id), Pronoun::Object, SOMEONE),
            'm' => seen_pronoun(world, mob_id, args.actor, Pronoun::Object, SOMEONE),
            'M' => seen_pronoun(world, mob_id, args.victim, Pronoun::Object, SOMEONE),
            'K' => seen_pronoun(world, mob_id, *rand_mob, Pronoun::Object, SOMEONE),
            'Y' => seen_pronoun(world, mob_id, target, Pronoun::Object, SOMEONE),
            'l' => pronoun(world, Some(mob_id), Pronoun::Possessive, SOMEONES),
            's' => seen_pronoun(world, mob_id, args.actor, Pronoun::Possessive, SOMEONES),
            'S' => seen_pronoun(world, mob_id, args.victim, Pronoun::Possessive, SOMEONES),
            'L' => seen_pronoun(world, mob_id, *rand_mob, Pronoun::Possessive, SOMEONES),
            'Z' => seen_pronoun(world, mob_id, target, Pronoun::Possessive, SOMEONES),
            'o' => obj_keyword(world, mob_id, args.obj1),
            'O' => obj_short(world, mob_id, args.obj1),
            'p' => obj_keyword(world, mob_id, args.obj2),
            'P' => obj_short(world, mob_id, args.obj2),
            '$' => "$".into(),
            other => {
                tracing::warn!(target: "bug", code = %other, "mobprog: bad $-code");
                " <@@@> ".into()
            }
        };
        out.push_str(&expansion);
    }
    out
}

#[derive(Clone, Copy)]
enum Pronoun {
    Subject,
    Object,
    Possessive,
}

fn first_keyword(world: &World, id: Option<MobId>) -> Option<String> {
    world
        .mobs
        .get(&id?)
        .map(|m| m.first_name().to_string())
}

fn short_descr(world: &World, id: Option<MobId>) -> Option<String> {
    world.mobs.get(&id?).map(|m| m.short_descr.to_string())
}

/// First keyword, capitalized, when the running mob can see the target.
fn visible_name(world: &World, viewer: MobId, id: Option<MobId>) -> String {
    match id {
        Some(target) if world.can_see(viewer, target) => {
            let name = first_keyword(world, Some(target)).unwrap_or_else(|| SOMEONE.into());
            capitalize(&name)
        }
        _ => SOMEONE.into(),
    }
}

/// Short description for NPCs, bare name for players.
fn visible_full_name(world: &World, viewer: MobId, id: Option<MobId>) -> String {
    match id {
        Some(target) if world.can_see(viewer, target) => world
            .mobs
            .get(&target)
            .map(|m| {
                if m.is_npc() {
                    m.short_descr.to_string()
                } else {
                    m.name.to_string()
                }
            })
            .unwrap_or_else(|| SOMEONE.into()),
        _ => SOMEONE.into(),
    }
}

fn pronoun(world: &World, id: Option<MobId>, which: Pronoun, fallback: &str) -> String {
    match id.and_then(|m| world.mobs.get(&m)) {
        Some(mob) => match which {
            Pronoun::Subject => mob.sex.subjective(),
            Pronoun::Object => mob.sex.objective(),
            Pronoun::Possessive => mob.sex.possessive(),
        }
        .to_string(),
        None => fallback.to_string(),
    }
}

fn seen_pronoun(
    world: &World,
    viewer: MobId,
    id: Option<MobId>,
    which: Pronoun,
    fallback: &str,
) -> String {
    match id {
        Some(target) if world.can_see(viewer, target) => {
            pronoun(world, Some(target), which, fallback)
        }
        _ => fallback.to_string(),
    }
}

fn obj_keyword(world: &World, viewer: MobId, id: Option<ObjId>) -> String {
    match id {
        Some(obj) if world.can_see_obj(viewer, obj) => world
            .objs
            .get(&obj)
            .and_then(|o| o.name.split_whitespace().next().map(str::to_string))
            .unwrap_or_else(|| SOMETHING.into()),
        _ => SOMETHING.into(),
    }
}

fn obj_short(world: &World, viewer: MobId, id: Option<ObjId>) -> String {
    match id {
        Some(obj) if world.can_see_obj(viewer, obj) => world
            .objs
            .get(&obj)
            .map(|o| o.short_descr.to_string())
            .unwrap_or_else(|| SOMETHING.into()),
        _ => SOMETHING.into(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
