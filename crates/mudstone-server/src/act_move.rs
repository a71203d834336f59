//! Movement, doors, and position commands.

use mudstone_mobprog::Interpreter;
use mudstone_types::{
    Direction, DoorState, MobId, Position, AFF_PASS_DOOR, EX_NOPASS, ROOM_NO_RECALL,
};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::act_info::show_room;
use crate::game::GameIo;

pub fn do_north(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    move_char(world, io, actor, Direction::North, false);
}
pub fn do_east(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    move_char(world, io, actor, Direction::East, false);
}
pub fn do_south(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    move_char(world, io, actor, Direction::South, false);
}
pub fn do_west(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    move_char(world, io, actor, Direction::West, false);
}
pub fn do_up(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    move_char(world, io, actor, Direction::Up, false);
}
pub fn do_down(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    move_char(world, io, actor, Direction::Down, false);
}

/// Moves a mobile one room. `is_follow` marks cascaded follower moves;
/// the cascade cannot cycle because a follower chain has no self-links.
pub fn move_char(world: &mut World, io: &mut GameIo, actor: MobId, dir: Direction, is_follow: bool) {
    let Some(from_room) = world.mobs.get(&actor).and_then(|m| m.room) else {
        return;
    };

    let exit = world
        .rooms
        .get(&from_room)
        .and_then(|r| r.exit(dir))
        .map(|e| (e.to_room, e.to_vnum, e.state, e.exit_flags, e.keyword.to_string()));
    let Some((linked, to_vnum, state, exit_flags, keyword)) = exit else {
        io.send_to_char(actor, "Alas, you cannot go that way.\n\r");
        return;
    };
    // An unlinked exit may lead into a per-player area: the walker's own
    // instance is materialized on first entry.
    let to_room = match linked.or_else(|| enter_instanced_area(world, actor, to_vnum)) {
        Some(room) => room,
        None => {
            io.send_to_char(actor, "Alas, you cannot go that way.\n\r");
            return;
        }
    };

    if state.is_closed() {
        let pass_door = world
            .mobs
            .get(&actor)
            .is_some_and(|m| m.has_affect(AFF_PASS_DOOR));
        if !pass_door || exit_flags & EX_NOPASS != 0 {
            let door = keyword.split_whitespace().next().unwrap_or("door");
            io.send_to_char(actor, &format!("The {door} is closed.\n\r"));
            return;
        }
    }

    // Movement points; immortals walk for free.
    if let Some(mob) = world.mobs.get_mut(&actor) {
        if !mob.is_npc() && !mob.is_immortal() {
            if mob.moves < 1 {
                io.send_to_char(actor, "You are too exhausted.\n\r");
                return;
            }
            mob.moves -= 1;
        }
    }

    // An NPC in the room may intercept the departure.
    {
        let mut interp = Interpreter::new(io);
        if mudstone_mobprog::exit_trigger(world, &mut interp, actor, dir) {
            return;
        }
    }
    if !world.mobs.contains_key(&actor) {
        return; // the trigger may have disposed of the mover
    }

    act(
        world,
        io,
        "$n leaves $T.",
        actor,
        ActArg::None,
        ActArg::Text(dir.name()),
        ActTo::Room,
    );
    world.transfer_mob(actor, to_room);
    act(world, io, "$n has arrived.", actor, ActArg::None, ActArg::None, ActTo::Room);

    let is_player = world.mobs.get(&actor).is_some_and(|m| !m.is_npc());
    if is_player {
        show_room(world, io, actor, to_room);
    }

    // Greet triggers fire for the new room's NPCs; the entering NPC's own
    // ENTRY trigger fires after it moves.
    {
        let mut interp = Interpreter::new(io);
        mudstone_mobprog::greet_trigger(world, &mut interp, actor);
    }
    if world.mobs.get(&actor).is_some_and(mudstone_world::Mobile::is_npc) {
        let mut interp = Interpreter::new(io);
        mudstone_mobprog::percent_trigger(
            world,
            &mut interp,
            actor,
            &mudstone_mobprog::ProgArgs::default(),
            mudstone_world::TriggerKind::Entry,
        );
    }

    // Followers cascade.
    if !is_follow {
        let followers: Vec<MobId> = world
            .rooms
            .get(&from_room)
            .map(|r| r.people.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|&f| {
                world
                    .mobs
                    .get(&f)
                    .is_some_and(|m| m.master == Some(actor) && m.position == Position::Standing)
            })
            .collect();
        for follower in followers {
            act(
                world,
                io,
                "You follow $N.",
                follower,
                ActArg::None,
                ActArg::Mob(actor),
                ActTo::Char,
            );
            move_char(world, io, follower, dir, true);
        }
    }
}

/// Resolves an exit into a per-player area: players get their own
/// instance, created on first entry and reused after. NPCs stay out.
fn enter_instanced_area(
    world: &mut World,
    actor: MobId,
    to_vnum: mudstone_types::Vnum,
) -> Option<mudstone_types::RoomId> {
    if to_vnum.is_none() || world.mobs.get(&actor).is_none_or(mudstone_world::Mobile::is_npc) {
        return None;
    }
    let proto = world.registry.area_of_vnum(to_vnum)?.clone();
    if proto.instance_policy != mudstone_world::InstancePolicy::PerPlayer {
        return None;
    }
    let area_id = match world.instance_owned_by(proto.min_vnum, actor) {
        Some(existing) => existing,
        None => {
            let area_id = world.instantiate_area(proto.min_vnum, Some(actor)).ok()?;
            world.link_area_exits(area_id);
            mudstone_world::reset_area(world, area_id);
            area_id
        }
    };
    world.room_in_area(area_id, to_vnum)
}

/// Finds the door the argument names: a direction word or an exit
/// keyword.
fn find_door(world: &World, io: &mut GameIo, actor: MobId, argument: &str) -> Option<Direction> {
    let room_id = world.mobs.get(&actor).and_then(|m| m.room)?;
    let room = world.rooms.get(&room_id)?;
    let dir = Direction::parse(argument).or_else(|| {
        Direction::ALL.into_iter().find(|d| {
            room.exit(*d)
                .is_some_and(|e| mudstone_world::is_name(argument, &e.keyword))
        })
    });
    match dir {
        Some(dir) if room.exit(dir).is_some_and(mudstone_world::Exit::is_door) => Some(dir),
        Some(_) => {
            io.send_to_char(actor, "You can't do that.\n\r");
            None
        }
        None => {
            io.send_to_char(actor, "You see no door here.\n\r");
            None
        }
    }
}

/// Applies a door state on this side and the reciprocal side.
fn set_door(world: &mut World, actor: MobId, dir: Direction, state: DoorState) {
    let Some(room_id) = world.mobs.get(&actor).and_then(|m| m.room) else { return };
    let to_room = world
        .rooms
        .get(&room_id)
        .and_then(|r| r.exit(dir))
        .and_then(|e| e.to_room);
    if let Some(exit) = world
        .rooms
        .get_mut(&room_id)
        .and_then(|r| r.exit_mut(dir))
    {
        exit.state = state;
    }
    // The matching door on the far side swings with this one.
    if let Some(other) = to_room {
        let reverse = dir.reverse();
        let links_back = world
            .rooms
            .get(&other)
            .and_then(|r| r.exit(reverse))
            .is_some_and(|e| e.to_room == Some(room_id) && e.is_door());
        if links_back {
            if let Some(exit) = world
                .rooms
                .get_mut(&other)
                .and_then(|r| r.exit_mut(reverse))
            {
                exit.state = state;
            }
        }
    }
}

pub fn do_open(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Open what?\n\r");
        return;
    }
    let Some(dir) = find_door(world, io, actor, argument) else { return };
    let room_id = world.mobs.get(&actor).and_then(|m| m.room);
    let state = room_id
        .and_then(|r| world.rooms.get(&r))
        .and_then(|r| r.exit(dir))
        .map(|e| e.state);
    match state {
        Some(DoorState::Open) => io.send_to_char(actor, "It's already open.\n\r"),
        Some(DoorState::Locked) => io.send_to_char(actor, "It's locked.\n\r"),
        Some(DoorState::Closed) => {
            set_door(world, actor, dir, DoorState::Open);
            io.send_to_char(actor, "Ok.\n\r");
            act(world, io, "$n opens the $d.", actor, ActArg::None, ActArg::Text(dir.name()), ActTo::Room);
        }
        None => {}
    }
}

pub fn do_close(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Close what?\n\r");
        return;
    }
    let Some(dir) = find_door(world, io, actor, argument) else { return };
    let room_id = world.mobs.get(&actor).and_then(|m| m.room);
    let state = room_id
        .and_then(|r| world.rooms.get(&r))
        .and_then(|r| r.exit(dir))
        .map(|e| e.state);
    match state {
        Some(DoorState::Closed | DoorState::Locked) => {
            io.send_to_char(actor, "It's already closed.\n\r");
        }
        Some(DoorState::Open) => {
            set_door(world, actor, dir, DoorState::Closed);
            io.send_to_char(actor, "Ok.\n\r");
            act(world, io, "$n closes the $d.", actor, ActArg::None, ActArg::Text(dir.name()), ActTo::Room);
        }
        None => {}
    }
}

fn has_key(world: &World, actor: MobId, key: mudstone_types::Vnum) -> bool {
    !key.is_none() && world.has_item(actor, Some(key), None, false)
}

pub fn do_lock(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Lock what?\n\r");
        return;
    }
    let Some(dir) = find_door(world, io, actor, argument) else { return };
    let room_id = world.mobs.get(&actor).and_then(|m| m.room);
    let info = room_id
        .and_then(|r| world.rooms.get(&r))
        .and_then(|r| r.exit(dir))
        .map(|e| (e.state, e.key));
    match info {
        Some((DoorState::Open, _)) => io.send_to_char(actor, "It's not closed.\n\r"),
        Some((DoorState::Locked, _)) => io.send_to_char(actor, "It's already locked.\n\r"),
        Some((DoorState::Closed, key)) => {
            if !has_key(world, actor, key) {
                io.send_to_char(actor, "You lack the key.\n\r");
                return;
            }
            set_door(world, actor, dir, DoorState::Locked);
            io.send_to_char(actor, "*Click*\n\r");
            act(world, io, "$n locks the $d.", actor, ActArg::None, ActArg::Text(dir.name()), ActTo::Room);
        }
        None => {}
    }
}

pub fn do_unlock(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        io.send_to_char(actor, "Unlock what?\n\r");
        return;
    }
    let Some(dir) = find_door(world, io, actor, argument) else { return };
    let room_id = world.mobs.get(&actor).and_then(|m| m.room);
    let info = room_id
        .and_then(|r| world.rooms.get(&r))
        .and_then(|r| r.exit(dir))
        .map(|e| (e.state, e.key));
    match info {
        Some((DoorState::Open, _)) => io.send_to_char(actor, "It's not closed.\n\r"),
        Some((DoorState::Closed, _)) => io.send_to_char(actor, "It's already unlocked.\n\r"),
        Some((DoorState::Locked, key)) => {
            if !has_key(world, actor, key) {
                io.send_to_char(actor, "You lack the key.\n\r");
                return;
            }
            set_door(world, actor, dir, DoorState::Closed);
            io.send_to_char(actor, "*Click*\n\r");
            act(world, io, "$n unlocks the $d.", actor, ActArg::None, ActArg::Text(dir.name()), ActTo::Room);
        }
        None => {}
    }
}

pub fn do_recall(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    let Some(mob) = world.mobs.get(&actor) else { return };
    if mob.is_npc() {
        return;
    }
    if mob.position == Position::Fighting {
        io.send_to_char(actor, "You can't recall in the middle of a fight!\n\r");
        return;
    }
    if let Some(room_id) = mob.room {
        if world.room_flags(room_id) & ROOM_NO_RECALL != 0 {
            io.send_to_char(actor, "The gods have forsaken this place.\n\r");
            return;
        }
    }
    let recall = mudstone_types::Vnum::new(io.config.game.recall_vnum);
    let Some(target) = world.room_by_vnum(recall) else {
        io.send_to_char(actor, "You are completely lost.\n\r");
        return;
    };
    act(world, io, "$n prays for transportation!", actor, ActArg::None, ActArg::None, ActTo::Room);
    world.transfer_mob(actor, target);
    act(world, io, "$n appears in the room.", actor, ActArg::None, ActArg::None, ActTo::Room);
    show_room(world, io, actor, target);
}

fn change_position(
    world: &mut World,
    io: &mut GameIo,
    actor: MobId,
    target: Position,
    own_msg: &str,
    room_msg: &str,
) {
    let Some(mob) = world.mobs.get_mut(&actor) else { return };
    if mob.position == target {
        io.send_to_char(actor, "You are already doing that.\n\r");
        return;
    }
    if mob.position == Position::Fighting {
        io.send_to_char(actor, "Maybe you should finish this fight first?\n\r");
        return;
    }
    mob.position = target;
    io.send_to_char(actor, own_msg);
    act(world, io, room_msg, actor, ActArg::None, ActArg::None, ActTo::Room);
}

pub fn do_sit(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    change_position(world, io, actor, Position::Sitting, "You sit down.\n\r", "$n sits down.");
}

pub fn do_rest(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    change_position(
        world,
        io,
        actor,
        Position::Resting,
        "You rest.\n\r",
        "$n sits down and rests.",
    );
}

pub fn do_sleep(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    change_position(
        world,
        io,
        actor,
        Position::Sleeping,
        "You go to sleep.\n\r",
        "$n goes to sleep.",
    );
}

pub fn do_stand(world: &mut World, io: &mut GameIo, actor: MobId, _argument: &str) {
    change_position(world, io, actor, Position::Standing, "You stand up.\n\r", "$n stands up.");
}

pub fn do_wake(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    if argument.is_empty() {
        do_stand(world, io, actor, "");
        return;
    }
    let Some(victim) = world.find_mob_room(actor, argument) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return;
    };
    let awake = world.mobs.get(&victim).is_some_and(|v| v.position.is_awake());
    if awake {
        act(world, io, "$N is already awake.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
        return;
    }
    if let Some(v) = world.mobs.get_mut(&victim) {
        v.position = Position::Standing;
    }
    act(world, io, "You wake $M.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
    act(world, io, "$n wakes you.", actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);
}
