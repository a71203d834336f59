//! Spec funs: named special behaviors assigned to NPC prototypes by the
//! `#SPECIALS` section and dispatched from the mobile-AI tick.
//!
//! The directory is closed: lookup is by name into this table. A spec
//! fun returns true when it acted this tick, which suppresses the NPC's
//! wander step.

use rand::Rng;

use mudstone_types::{ItemType, MobId, Position, WEAR_TAKE};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::fight;
use crate::game::GameIo;

type SpecFn = fn(&mut World, &mut GameIo, MobId) -> bool;

static SPEC_TABLE: &[(&str, SpecFn)] = &[
    ("spec_cast_adept", spec_cast_adept),
    ("spec_guard", spec_guard),
    ("spec_janitor", spec_janitor),
];

/// Resolves a spec-fun name from the directory.
pub fn lookup(name: &str) -> Option<SpecFn> {
    SPEC_TABLE
        .iter()
        .find(|(entry, _)| entry.eq_ignore_ascii_case(name))
        .map(|(_, function)| *function)
}

/// Healer-adept: occasionally pats up a wounded mortal in the room.
fn spec_cast_adept(world: &mut World, io: &mut GameIo, actor: MobId) -> bool {
    let awake = world
        .mobs
        .get(&actor)
        .is_some_and(|m| m.position.is_awake());
    if !awake || world.rng.gen_range(0..100) < 60 {
        return false;
    }
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else {
        return false;
    };
    let wounded = world
        .rooms
        .get(&room_id)
        .map(|r| r.people.clone())
        .unwrap_or_default()
        .into_iter()
        .find(|&m| {
            m != actor
                && world
                    .mobs
                    .get(&m)
                    .is_some_and(|mob| !mob.is_npc() && mob.hit < mob.max_hit)
        });
    let Some(victim) = wounded else { return false };
    act(world, io, "$n utters the word 'judicandus'.", actor, ActArg::None, ActArg::None, ActTo::Room);
    if let Some(mob) = world.mobs.get_mut(&victim) {
        mob.hit = (mob.hit + 20).min(mob.max_hit);
    }
    act(world, io, "$n touches you; you feel better.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
    true
}

/// City guard: attacks criminals — here, anyone fighting in the room.
fn spec_guard(world: &mut World, io: &mut GameIo, actor: MobId) -> bool {
    let ready = world
        .mobs
        .get(&actor)
        .is_some_and(|m| m.position == Position::Standing && m.fighting.is_none());
    if !ready {
        return false;
    }
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else {
        return false;
    };
    let brawler = world
        .rooms
        .get(&room_id)
        .map(|r| r.people.clone())
        .unwrap_or_default()
        .into_iter()
        .find(|&m| m != actor && world.mobs.get(&m).is_some_and(|mob| mob.fighting.is_some()));
    let Some(victim) = brawler else { return false };
    act(world, io, "$n screams 'PROTECT THE INNOCENT!! BANZAI!!'", actor, ActArg::None, ActArg::None, ActTo::Room);
    fight::set_fighting(world, actor, victim);
    true
}

/// Janitor: picks up trash from the floor.
fn spec_janitor(world: &mut World, io: &mut GameIo, actor: MobId) -> bool {
    let awake = world
        .mobs
        .get(&actor)
        .is_some_and(|m| m.position.is_awake());
    if !awake {
        return false;
    }
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else {
        return false;
    };
    let trash = world
        .rooms
        .get(&room_id)
        .map(|r| r.contents.clone())
        .unwrap_or_default()
        .into_iter()
        .find(|&o| {
            world.objs.get(&o).is_some_and(|obj| {
                obj.wear_flags & WEAR_TAKE != 0
                    && matches!(obj.item_type, ItemType::Trash | ItemType::DrinkContainer)
            })
        });
    let Some(obj_id) = trash else { return false };
    world.obj_to_mob(obj_id, actor);
    act(world, io, "$n picks up some trash.", actor, ActArg::None, ActArg::None, ActTo::Room);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_lookup_is_by_name() {
        assert!(lookup("spec_guard").is_some());
        assert!(lookup("SPEC_JANITOR").is_some());
        assert!(lookup("spec_unwritten").is_none());
    }
}
