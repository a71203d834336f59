//! End-to-end simulation scenarios, driven through the dispatcher the
//! way a player's input would be.

use mudstone_net::NetServer;
use mudstone_server::{interp, reload, GameIo, ServerConfig};
use mudstone_types::{
    Direction, DoorState, MobId, Vnum, EX_CLOSED, EX_ISDOOR,
};
use mudstone_world::{
    sim, InstancePolicy, MobProgScript, ProgTrigger, Registry, TriggerKind, World,
};

fn game_io() -> GameIo {
    let net = NetServer::bind("127.0.0.1:0".parse().unwrap(), None).unwrap();
    GameIo::new(net, ServerConfig::default())
}

/// A world with rooms 3001/3002 joined north-south, the 3001 north exit
/// a closed door, and a rat prototype.
fn door_world() -> (World, MobId) {
    let mut registry = Registry::new();
    registry.insert_area(sim::area_proto(3000, 3099, InstancePolicy::Singleton));
    let mut south_room = sim::room_proto_with_exit(3001, Direction::North, 3002);
    if let Some(exit) = south_room.exits[Direction::North.index()].as_mut() {
        exit.exit_flags = EX_ISDOOR | EX_CLOSED;
        exit.keyword = "gate".into();
    }
    registry.insert_room(south_room);
    registry.insert_room(sim::room_proto_with_exit(3002, Direction::South, 3001));
    registry.insert_mob(sim::mob_proto(3000));
    let mut world = World::new(registry, 77);
    let area = world.instantiate_area(Vnum::new(3000), None).unwrap();
    world.link_area_exits(area);

    let player = world.create_player("Tester");
    let start = world.room_by_vnum(Vnum::new(3001)).unwrap();
    world.mob_to_room(player, start);
    (world, player)
}

#[test]
fn closed_door_blocks_movement() {
    let (mut world, player) = door_world();
    let mut io = game_io();
    let start = world.room_by_vnum(Vnum::new(3001)).unwrap();
    let timers: Vec<u32> = world.areas.values().map(|a| a.reset_timer).collect();

    interp::interpret(&mut world, &mut io, player, "north");

    assert_eq!(world.mobs[&player].room, Some(start), "door must block");
    let after: Vec<u32> = world.areas.values().map(|a| a.reset_timer).collect();
    assert_eq!(timers, after, "a refused move must not touch reset timers");
    assert!(world.audit().is_empty(), "{:?}", world.audit());
}

#[test]
fn open_then_move_goes_through() {
    let (mut world, player) = door_world();
    let mut io = game_io();
    let gate_room = world.room_by_vnum(Vnum::new(3002)).unwrap();

    interp::interpret(&mut world, &mut io, player, "open gate");
    interp::interpret(&mut world, &mut io, player, "north");

    assert_eq!(world.mobs[&player].room, Some(gate_room));
    // The reciprocal side of the door opened too.
    let south = world.rooms[&gate_room].exit(Direction::South).unwrap();
    assert_eq!(south.state, DoorState::Open);
}

/// A greeting NPC remembers whoever walks in, which is observable
/// without a connected descriptor.
#[test]
fn greet_trigger_runs_on_entry() {
    let mut registry = Registry::new();
    registry.insert_area(sim::area_proto(3000, 3099, InstancePolicy::Singleton));
    registry.insert_room(sim::room_proto_with_exit(3001, Direction::North, 3002));
    registry.insert_room(sim::room_proto_with_exit(3002, Direction::South, 3001));
    let mut greeter = sim::mob_proto(3000);
    greeter.mprogs.push(ProgTrigger {
        kind: TriggerKind::Greet,
        prog: Vnum::new(90),
        phrase: "100".into(),
    });
    registry.insert_mob(greeter);
    registry.insert_prog(MobProgScript {
        vnum: Vnum::new(90),
        code: "mob remember $n\n".into(),
    });
    let mut world = World::new(registry, 3);
    let area = world.instantiate_area(Vnum::new(3000), None).unwrap();
    world.link_area_exits(area);

    let npc_room = world.room_by_vnum(Vnum::new(3002)).unwrap();
    let npc = world.create_mobile(Vnum::new(3000)).unwrap();
    world.mob_to_room(npc, npc_room);

    let player = world.create_player("Walker");
    let start = world.room_by_vnum(Vnum::new(3001)).unwrap();
    world.mob_to_room(player, start);

    let mut io = game_io();
    interp::interpret(&mut world, &mut io, player, "north");

    assert_eq!(world.mobs[&player].room, Some(npc_room));
    assert_eq!(
        world.mobs[&npc].mprog_target,
        Some(player),
        "the greet program must have run"
    );
}

#[test]
fn reload_room_preserves_occupants() {
    let (mut world, player) = door_world();
    let mut io = game_io();
    let room = world.room_by_vnum(Vnum::new(3001)).unwrap();

    let second = world.create_player("Witness");
    world.mob_to_room(second, room);
    let npc = world.create_mobile(Vnum::new(3000)).unwrap();
    world.mob_to_room(npc, room);

    // Give the first player something to lose.
    let mut chest = sim::obj_proto(3010, mudstone_types::ItemType::Trash);
    chest.name = "trinket".into();
    world.registry.insert_object(chest);
    let trinket = world.create_object(Vnum::new(3010), 1).unwrap();
    world.obj_to_mob(trinket, player);

    reload::reload_room(&mut world, &mut io, player, room);

    let new_room = world.room_by_vnum(Vnum::new(3001)).unwrap();
    assert_ne!(new_room, room, "reload rebuilds a fresh instance");
    for mob in [player, second, npc] {
        assert_eq!(world.mobs[&mob].room, Some(new_room), "occupant restored");
    }
    assert!(world.mobs[&player].carrying.contains(&trinket));
    // Neighbors still reach the rebuilt room.
    let gate_room = world.room_by_vnum(Vnum::new(3002)).unwrap();
    let south = world.rooms[&gate_room].exit(Direction::South).unwrap();
    assert_eq!(south.to_room, Some(new_room));
    assert!(world.audit().is_empty(), "{:?}", world.audit());
}

#[test]
fn unknown_command_falls_back_to_social_then_huh() {
    let (mut world, player) = door_world();
    let mut io = game_io();
    // A social works as a command; neither should corrupt the graph.
    interp::interpret(&mut world, &mut io, player, "smile");
    interp::interpret(&mut world, &mut io, player, "xyzzyplugh");
    assert!(world.audit().is_empty());
}

/// Scenario: a per-player area materializes on first entry and is torn
/// down at the reset pulse after its visitor leaves.
#[test]
fn per_player_instance_lifecycle() {
    let mut registry = Registry::new();
    registry.insert_area(sim::area_proto(3000, 3099, InstancePolicy::Singleton));
    registry.insert_room(sim::room_proto_with_exit(3001, Direction::North, 100));
    let mut private = sim::area_proto(100, 199, InstancePolicy::PerPlayer);
    private.name = "The Private Vault".into();
    registry.insert_area(private);
    registry.insert_room(sim::room_proto_with_exit(100, Direction::South, 3001));
    registry.insert_mob(sim::mob_proto(3000));
    let mut world = World::new(registry, 11);
    let area = world.instantiate_area(Vnum::new(3000), None).unwrap();
    world.link_area_exits(area);

    let player = world.create_player("Visitor");
    let plaza = world.room_by_vnum(Vnum::new(3001)).unwrap();
    world.mob_to_room(player, plaza);

    let mut io = game_io();
    interp::interpret(&mut world, &mut io, player, "north");

    // A private instance now exists and holds the visitor.
    assert_eq!(world.areas.len(), 2);
    let inside = world.mobs[&player].room.unwrap();
    assert_ne!(inside, plaza);
    let vault = world.rooms[&inside].area;
    assert_eq!(world.areas[&vault].player_count, 1);

    // The same exit reuses the same instance.
    interp::interpret(&mut world, &mut io, player, "south");
    interp::interpret(&mut world, &mut io, player, "north");
    assert_eq!(world.areas.len(), 2, "no second instance for the owner");

    // Leave, then let reset pulses pass: the empty instance dies.
    interp::interpret(&mut world, &mut io, player, "south");
    for _ in 0..10_000 {
        mudstone_server::tick::pulse_update(&mut world, &mut io);
        if world.areas.len() == 1 {
            break;
        }
    }
    assert_eq!(world.areas.len(), 1, "empty per-player instance destroyed");
    assert!(!world.rooms.contains_key(&inside));
    assert!(world.audit().is_empty(), "{:?}", world.audit());
}

#[test]
fn kill_resolves_to_a_corpse_and_reset_brings_the_mob_back() {
    let (mut world, player) = door_world();
    let mut io = game_io();
    let room = world.room_by_vnum(Vnum::new(3001)).unwrap();

    // Engine-reserved prototypes, normally installed at boot.
    let mut corpse = sim::obj_proto(10, mudstone_types::ItemType::Corpse);
    corpse.wear_flags = 0;
    world.registry.insert_object(corpse);
    world.registry.insert_object(sim::obj_proto(2, mudstone_types::ItemType::Money));

    let rat = world.create_mobile(Vnum::new(3000)).unwrap();
    world.mob_to_room(rat, room);

    // An overwhelming blow.
    if let Some(mob) = world.mobs.get_mut(&player) {
        mob.level = 50;
        mob.damroll = 500;
        mob.hitroll = 50;
    }
    interp::interpret(&mut world, &mut io, player, "kill rat");
    for _ in 0..50 {
        if !world.mobs.contains_key(&rat) {
            break;
        }
        mudstone_server::fight::violence_update(&mut world, &mut io);
    }
    assert!(!world.mobs.contains_key(&rat), "the rat must die");
    let has_corpse = world.rooms[&room].contents.iter().any(|o| {
        world.objs.get(o).is_some_and(|obj| obj.item_type == mudstone_types::ItemType::Corpse)
    });
    assert!(has_corpse, "death leaves a corpse");
    assert_eq!(world.mobs[&player].fighting, None);
    assert!(world.audit().is_empty(), "{:?}", world.audit());
}
