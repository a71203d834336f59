//! Communication commands, plus quit and save.

use mudstone_mobprog::{Interpreter, ProgArgs, TriggerKind};
use mudstone_types::{MobId, Position, COMM_DEAF, COMM_NOEMOTE, COMM_NOSHOUT, COMM_NOTELL, COMM_QUIET};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::game::GameIo;
use crate::nanny;
use crate::wiznet::{self, WiznetEvent};

pub fn do_say(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Say what?\n\r");
        return;
    }
    act(world, io, "You say '{y$T{x'", actor, ActArg::None, ActArg::Text(argument), ActTo::Char);
    act(world, io, "$n says '{y$T{x'", actor, ActArg::None, ActArg::Text(argument), ActTo::Room);

    // Speech triggers for listening NPCs.
    let room = world.mobs.get(&actor).and_then(|m| m.room);
    let listeners: Vec<MobId> = room
        .and_then(|r| world.rooms.get(&r))
        .map(|r| r.people.clone())
        .unwrap_or_default();
    for listener in listeners {
        if listener == actor {
            continue;
        }
        if world.mobs.get(&listener).is_some_and(mudstone_world::Mobile::is_npc) {
            let mut interp = Interpreter::new(io);
            mudstone_mobprog::act_trigger(
                world,
                &mut interp,
                argument,
                listener,
                &ProgArgs::actor(actor),
                TriggerKind::Speech,
            );
        }
    }
}

pub fn do_tell(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let (target_word, message) = match argument.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (argument, ""),
    };
    if target_word.is_empty() || message.is_empty() {
        io.send_to_char(actor, "Tell whom what?\n\r");
        return;
    }
    if world
        .mobs
        .get(&actor)
        .is_some_and(|m| m.comm_flags & (COMM_NOTELL | COMM_QUIET) != 0)
    {
        io.send_to_char(actor, "Your message didn't get through.\n\r");
        return;
    }
    let Some(victim) = world.find_mob_world(actor, target_word) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    // NPCs without a driving descriptor cannot hear tells.
    if world.mobs.get(&victim).is_some_and(mudstone_world::Mobile::is_npc)
        && io.desc_of(victim).is_none()
    {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    }
    if world
        .mobs
        .get(&victim)
        .is_some_and(|v| v.comm_flags & (COMM_QUIET | COMM_DEAF) != 0)
    {
        act(world, io, "$E is not receiving tells.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
        return;
    }

    let actor_name = world
        .mobs
        .get(&actor)
        .map_or_else(|| "someone".to_string(), |m| {
            if world.can_see(victim, actor) {
                m.first_name().to_string()
            } else {
                "Someone".to_string()
            }
        });
    io.send_to_char(actor, &format!("{{gYou tell them '{message}'{{x\n\r"));
    io.send_to_char(victim, &format!("{{g{actor_name} tells you '{message}'{{x\n\r"));
    if let Some(victim_mob) = world.mobs.get_mut(&victim) {
        victim_mob.reply = Some(actor);
    }
}

pub fn do_reply(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let Some(target) = world.mobs.get(&actor).and_then(|m| m.reply) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    if argument.is_empty() {
        io.send_to_char(actor, "Reply what?\n\r");
        return;
    }
    let actor_name = world
        .mobs
        .get(&actor)
        .map_or_else(|| "someone".to_string(), |m| m.first_name().to_string());
    io.send_to_char(actor, &format!("{{gYou tell them '{argument}'{{x\n\r"));
    io.send_to_char(target, &format!("{{g{actor_name} tells you '{argument}'{{x\n\r"));
    if let Some(target_mob) = world.mobs.get_mut(&target) {
        target_mob.reply = Some(actor);
    }
}

pub fn do_shout(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Shout what?\n\r");
        return;
    }
    if world
        .mobs
        .get(&actor)
        .is_some_and(|m| m.comm_flags & COMM_NOSHOUT != 0)
    {
        io.send_to_char(actor, "The gods have revoked your shouting privileges.\n\r");
        return;
    }
    let actor_name = world
        .mobs
        .get(&actor)
        .map_or_else(|| "Someone".to_string(), |m| {
            crate::act::capitalize_first(m.first_name())
        });
    io.send_to_char(actor, &format!("You shout '{argument}'\n\r"));
    for (_, listener) in io.playing() {
        if listener == actor {
            continue;
        }
        if world
            .mobs
            .get(&listener)
            .is_some_and(|m| m.comm_flags & (COMM_DEAF | COMM_QUIET) == 0)
        {
            io.send_to_char(listener, &format!("{actor_name} shouts '{argument}'\n\r"));
        }
    }
    // Shouting takes a moment.
    if let Some(mob) = world.mobs.get_mut(&actor) {
        mob.wait = mob.wait.max(12);
    }
}

pub fn do_emote(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if world
        .mobs
        .get(&actor)
        .is_some_and(|m| !m.is_npc() && m.comm_flags & COMM_NOEMOTE != 0)
    {
        io.send_to_char(actor, "You can't show your emotions.\n\r");
        return;
    }
    if argument.is_empty() {
        io.send_to_char(actor, "Emote what?\n\r");
        return;
    }
    act(world, io, "$n $T", actor, ActArg::None, ActArg::Text(argument), ActTo::All);
}

pub fn do_quit(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get(&actor) else { return };
    if mob.is_npc() {
        return;
    }
    if mob.position == Position::Fighting {
        io.send_to_char(actor, "No way! You are fighting.\n\r");
        return;
    }
    io.send_to_char(actor, "Alas, all good things must come to an end.\n\r");
    act(world, io, "$n has left the game.", actor, ActArg::None, ActArg::None, ActTo::Room);

    let name = world
        .mobs
        .get(&actor)
        .map_or_else(String::new, |m| m.first_name().to_string());
    wiznet::wiznet(
        world,
        io,
        &format!("{name} rejoins the real world."),
        Some(actor),
        WiznetEvent::Logins,
        0,
    );
    tracing::info!(player = %name, "quit");

    nanny::save_character(world, io, actor);
    if let Some(desc) = io.desc_of(actor) {
        io.net.close(desc);
    }
    io.unbind_char(actor);
    world.extract_mob(actor, true);
}

pub fn do_save(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    if world.mobs.get(&actor).is_some_and(mudstone_world::Mobile::is_npc) {
        return;
    }
    nanny::save_character(world, io, actor);
    io.send_to_char(actor, "Saving. Remember that Mudstone saves automatically.\n\r");
}
