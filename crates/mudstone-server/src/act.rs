//! The act grammar: one format string fanned out to actor, victim, and
//! room with per-receiver substitution and visibility.
//!
//! Codes: `$n`/`$N` actor/victim name as the receiver sees them, `$e`/
//! `$E` subject pronoun, `$m`/`$M` object pronoun, `$s`/`$S` possessive,
//! `$p`/`$P` object short description, `$t`/`$T` literal text, `$d` door
//! keyword. Socials and wiznet format through the same grammar.

use mudstone_types::{MobId, ObjId, Position};
use mudstone_world::World;

use crate::game::GameIo;

/// Positional argument to [`act`]: an object, a mobile, or literal text.
#[derive(Debug, Clone, Copy, Default)]
pub enum ActArg<'a> {
    #[default]
    None,
    Obj(ObjId),
    Mob(MobId),
    Text(&'a str),
}

/// Who receives the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActTo {
    /// Everyone in the actor's room except the actor.
    Room,
    /// The actor alone.
    Char,
    /// The victim (`arg2` must be a mobile).
    Vict,
    /// Everyone except actor and victim.
    NotVict,
    /// Everyone in the room including the actor.
    All,
}

/// Formats and queues an act message to receivers at resting position or
/// better.
pub fn act(
    world: &World,
    io: &mut GameIo,
    format: &str,
    actor: MobId,
    arg1: ActArg<'_>,
    arg2: ActArg<'_>,
    to: ActTo,
) {
    act_pos(world, io, format, actor, arg1, arg2, to, Position::Resting);
}

/// [`act`] with an explicit minimum receiver position (wiznet uses
/// `Position::Dead` so link-dead immortals still hear it).
pub fn act_pos(
    world: &World,
    io: &mut GameIo,
    format: &str,
    actor: MobId,
    arg1: ActArg<'_>,
    arg2: ActArg<'_>,
    to: ActTo,
    min_pos: Position,
) {
    if format.is_empty() {
        return;
    }
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else {
        // Actor nowhere: only TO_CHAR can still deliver.
        if matches!(to, ActTo::Char) {
            let line = render(world, format, actor, actor, arg1, arg2);
            io.send_to_char(actor, &line);
        }
        return;
    };
    let victim = match arg2 {
        ActArg::Mob(mob) => Some(mob),
        _ => None,
    };
    let people: Vec<MobId> = world
        .rooms
        .get(&room_id)
        .map(|r| r.people.clone())
        .unwrap_or_default();

    for receiver in people {
        let Some(mob) = world.mobs.get(&receiver) else { continue };
        if mob.position < min_pos {
            continue;
        }
        let included = match to {
            ActTo::Room => receiver != actor,
            ActTo::Char => receiver == actor,
            ActTo::Vict => Some(receiver) == victim && receiver != actor,
            ActTo::NotVict => receiver != actor && Some(receiver) != victim,
            ActTo::All => true,
        };
        if !included {
            continue;
        }
        let line = render(world, format, receiver, actor, arg1, arg2);
        io.send_to_char(receiver, &line);
    }
}

/// Renders one format string for one receiver.
fn render(
    world: &World,
    format: &str,
    receiver: MobId,
    actor: MobId,
    arg1: ActArg<'_>,
    arg2: ActArg<'_>,
) -> String {
    let victim = match arg2 {
        ActArg::Mob(mob) => Some(mob),
        _ => None,
    };
    let mut out = String::with_capacity(format.len() + 16);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push_str(&seen_name(world, receiver, Some(actor))),
            Some('N') => out.push_str(&seen_name(world, receiver, victim)),
            Some('e') => out.push_str(pronoun(world, Some(actor), 0)),
            Some('E') => out.push_str(pronoun(world, victim, 0)),
            Some('m') => out.push_str(pronoun(world, Some(actor), 1)),
            Some('M') => out.push_str(pronoun(world, victim, 1)),
            Some('s') => out.push_str(pronoun(world, Some(actor), 2)),
            Some('S') => out.push_str(pronoun(world, victim, 2)),
            Some('p') => out.push_str(&obj_short(world, arg1)),
            Some('P') => out.push_str(&obj_short(world, arg2)),
            Some('t') => out.push_str(text_of(arg1)),
            Some('T') => out.push_str(text_of(arg2)),
            Some('d') => out.push_str(&door_name(arg2)),
            Some('$') => out.push('$'),
            Some(other) => {
                tracing::warn!(target: "bug", code = %other, "act: bad $-code");
            }
            None => {}
        }
    }
    // Sentence case plus line ending, as every act message expects.
    let mut line = capitalize_first(&out);
    line.push_str("\n\r");
    line
}

fn seen_name(world: &World, receiver: MobId, target: Option<MobId>) -> String {
    let Some(target) = target else {
        return "someone".to_string();
    };
    if !world.can_see(receiver, target) {
        return "someone".to_string();
    }
    match world.mobs.get(&target) {
        Some(mob) if mob.is_npc() => mob.short_descr.to_string(),
        Some(mob) => mob.first_name().to_string(),
        None => "someone".to_string(),
    }
}

fn pronoun(world: &World, target: Option<MobId>, which: usize) -> &'static str {
    match target.and_then(|m| world.mobs.get(&m)) {
        Some(mob) => match which {
            0 => mob.sex.subjective(),
            1 => mob.sex.objective(),
            _ => mob.sex.possessive(),
        },
        None => "it",
    }
}

fn obj_short(world: &World, arg: ActArg<'_>) -> String {
    match arg {
        ActArg::Obj(obj) => world
            .objs
            .get(&obj)
            .map_or_else(|| "something".to_string(), |o| o.short_descr.to_string()),
        _ => "something".to_string(),
    }
}

fn text_of(arg: ActArg<'_>) -> &str {
    match arg {
        ActArg::Text(text) => text,
        _ => "",
    }
}

fn door_name(arg: ActArg<'_>) -> String {
    match arg {
        ActArg::Text(text) if !text.is_empty() => text.to_string(),
        _ => "door".to_string(),
    }
}

/// Uppercases the first letter, skipping color escapes.
pub fn capitalize_first(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    // Skip over leading {X escapes.
    let mut prefix = String::new();
    while chars.peek() == Some(&'{') {
        prefix.push(chars.next().unwrap_or('{'));
        if let Some(code) = chars.next() {
            prefix.push(code);
        }
    }
    out.push_str(&prefix);
    match chars.next() {
        Some(first) => {
            out.extend(first.to_uppercase());
            out.extend(chars);
        }
        None => {}
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_skips_color_escapes() {
        assert_eq!(capitalize_first("{Ghello"), "{GHello");
        assert_eq!(capitalize_first("hello"), "Hello");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn render_substitutes_actor_and_pronouns() {
        let (mut world, _) = mudstone_world::sim::small_world();
        let room = world.room_by_vnum(mudstone_types::Vnum::new(3001)).unwrap();
        let rat = world.create_mobile(mudstone_types::Vnum::new(3000)).unwrap();
        world.mob_to_room(rat, room);
        let line = render(
            &world,
            "$n licks $s whiskers.",
            rat,
            rat,
            ActArg::None,
            ActArg::None,
        );
        assert_eq!(line, "A giant rat licks its whiskers.\n\r");
    }

    #[test]
    fn render_text_args() {
        let (mut world, _) = mudstone_world::sim::small_world();
        let room = world.room_by_vnum(mudstone_types::Vnum::new(3001)).unwrap();
        let rat = world.create_mobile(mudstone_types::Vnum::new(3000)).unwrap();
        world.mob_to_room(rat, room);
        let line = render(
            &world,
            "$n says '$T'",
            rat,
            rat,
            ActArg::None,
            ActArg::Text("hello"),
        );
        assert_eq!(line, "A giant rat says 'hello'\n\r");
    }
}
