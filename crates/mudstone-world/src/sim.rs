//! Deterministic world builders for tests.
//!
//! Available to other crates through the `sim` feature, so integration
//! and downstream tests can stand up a small world without touching the
//! area loader.

use mudstone_types::{AreaId, Dice, ItemType, MobId, Position, Sector, Sex, Size, Vnum};

use crate::area::InstancePolicy;
use crate::mobile::Mobile;
use crate::proto::{AreaProto, ExitProto, MobProto, ObjProto, RoomProto};
use crate::registry::Registry;
use crate::world::World;

pub fn bare_mobile(id: MobId) -> Mobile {
    Mobile {
        id,
        proto: None,
        name: "test mob".into(),
        short_descr: "a test mob".into(),
        long_descr: "A test mob is here.\n".into(),
        description: "".into(),
        race: "human".into(),
        class: "warrior".into(),
        clan: "".into(),
        level: 10,
        sex: Sex::Neutral,
        size: Size::Medium,
        alignment: 0,
        position: Position::Standing,
        default_pos: Position::Standing,
        hit: 100,
        max_hit: 100,
        mana: 100,
        max_mana: 100,
        moves: 100,
        max_moves: 100,
        gold: 0,
        silver: 0,
        hitroll: 0,
        damroll: 0,
        armor: 100,
        saving_throw: 0,
        act_flags: 0,
        affect_flags: 0,
        off_flags: 0,
        imm_flags: 0,
        res_flags: 0,
        vuln_flags: 0,
        comm_flags: 0,
        room: None,
        carrying: Vec::new(),
        equipment: Default::default(),
        affects: Vec::new(),
        fighting: None,
        master: None,
        leader: None,
        reply: None,
        on: None,
        mprog_target: None,
        memory: Vec::new(),
        mprog_delay: 0,
        wait: 0,
        timer: 0,
        player: None,
    }
}

pub fn room_proto(vnum: i32) -> RoomProto {
    RoomProto {
        vnum: Vnum::new(vnum),
        name: format!("Room {vnum}").into(),
        description: "A featureless test room.\n".into(),
        sector: Sector::Inside,
        room_flags: 0,
        exits: Default::default(),
        extra_descs: Vec::new(),
        resets: Vec::new(),
    }
}

pub fn room_proto_with_exit(vnum: i32, dir: mudstone_types::Direction, to: i32) -> RoomProto {
    let mut proto = room_proto(vnum);
    proto.exits[dir.index()] = Some(ExitProto {
        to_vnum: Vnum::new(to),
        key: Vnum::NONE,
        exit_flags: 0,
        keyword: "".into(),
        description: "".into(),
        orig_dir: dir,
    });
    proto
}

pub fn mob_proto(vnum: i32) -> MobProto {
    MobProto {
        vnum: Vnum::new(vnum),
        name: "rat giant".into(),
        short_descr: "a giant rat".into(),
        long_descr: "A giant rat scurries here.\n".into(),
        description: "".into(),
        race: "rodent".into(),
        act_flags: mudstone_types::ACT_IS_NPC,
        affect_flags: 0,
        off_flags: 0,
        imm_flags: 0,
        res_flags: 0,
        vuln_flags: 0,
        form_flags: 0,
        part_flags: 0,
        alignment: 0,
        group: 0,
        level: 2,
        hitroll: 1,
        hit: Dice::new(2, 6, 10),
        mana: Dice::new(1, 4, 10),
        damage: Dice::new(1, 4, 0),
        dam_type: mudstone_types::DamageType::Pierce,
        armor: [100, 100, 100, 100],
        start_pos: Position::Standing,
        default_pos: Position::Standing,
        sex: Sex::Neutral,
        wealth: 0,
        size: Size::Tiny,
        material: "flesh".into(),
        mprogs: Vec::new(),
        shop: None,
        spec_fun: None,
        loot_table: None,
    }
}

pub fn obj_proto(vnum: i32, item_type: ItemType) -> ObjProto {
    ObjProto {
        vnum: Vnum::new(vnum),
        name: "thing test".into(),
        short_descr: "a test thing".into(),
        description: "A test thing lies here.".into(),
        material: "wood".into(),
        item_type,
        extra_flags: 0,
        wear_flags: mudstone_types::WEAR_TAKE,
        values: [0; 5],
        weight: 1,
        cost: 10,
        condition: 100,
        level: 1,
        affects: Vec::new(),
        extra_descs: Vec::new(),
    }
}

pub fn area_proto(min: i32, max: i32, policy: InstancePolicy) -> AreaProto {
    AreaProto {
        name: "Test Area".into(),
        file_name: "test.are".into(),
        credits: "{ 1 10} Tests   Test Area".into(),
        min_vnum: Vnum::new(min),
        max_vnum: Vnum::new(max),
        builders: "None".into(),
        security: 9,
        reset_interval: 100,
        instance_policy: policy,
    }
}

/// Builds a world with one singleton area of three rooms (3001-3003)
/// linked 3001 -north-> 3002 -north-> 3003, a mob proto 3000 and an
/// object proto 3010 (container 3011).
pub fn small_world() -> (World, AreaId) {
    use mudstone_types::Direction;

    let mut registry = Registry::new();
    registry.insert_area(area_proto(3000, 3099, InstancePolicy::Singleton));
    registry.insert_room(room_proto_with_exit(3001, Direction::North, 3002));
    let mut middle = room_proto_with_exit(3002, Direction::North, 3003);
    middle.exits[Direction::South.index()] = Some(ExitProto {
        to_vnum: Vnum::new(3001),
        key: Vnum::NONE,
        exit_flags: 0,
        keyword: "".into(),
        description: "".into(),
        orig_dir: Direction::South,
    });
    registry.insert_room(middle);
    registry.insert_room(room_proto(3003));
    registry.insert_mob(mob_proto(3000));
    registry.insert_object(obj_proto(3010, ItemType::Trash));
    let mut container = obj_proto(3011, ItemType::Container);
    container.name = "chest test".into();
    registry.insert_object(container);

    let mut world = World::new(registry, 42);
    let area = world.instantiate_area(Vnum::new(3000), None).unwrap();
    world.link_area_exits(area);
    (world, area)
}

