//! Round-trip and registration tests over a complete area file.

use mudstone_area::{load_area_file, parse_area, render_area, save_area_file};
use mudstone_types::{Direction, Vnum};
use mudstone_world::{Registry, TriggerKind, World};

const PLAZA: &str = r"#AREADATA
Name The Grand Plaza~
Builders Alara~
VNUMs 3000 3099
Credits { 5 35} Alara   The Grand Plaza~
Security 9
Reset 300
Instance singleton
End

#MOBILES
#3000
keeper plaza~
the plaza keeper~
The plaza keeper polishes the fountain rail.
~
A stooped figure in gray livery.
~
human~
AB 0 350 0
10 2 2d8+40 1d6+60 1d6+2 2
-5 -5 -5 -3
0 0 0 0
8 8 1 400
0 0 2 flesh~
T GREET 3000 80~
L plaza_keeper~
#0

#OBJECTS
#3010
fountain marble~
a marble fountain~
A marble fountain burbles here.~
stone~
fountain 0 0
0 0 0 0 0
0 250 0 100
E fountain marble~
Cool water circles the basin.~
#0

#ROOMS
#3001
The Grand Plaza~
Polished flagstones stretch away beneath bright banners.
~
0 0 1
D0
You see the north gate.~
gate~
1 0 3002
S
#3002
The North Gate~
The gate arch frames the plaza to the south.
~
0 0 1
D2
~
~
0 0 3001
S
#0

#RESETS
M 3000 1 3001 1
G 3010 0 0 0
O 3010 2 3002 0
D 0 3001 0 1
S

#SHOPS
3000 2 3 0 0 0 120 80 6 22
0

#SPECIALS
M 3000 spec_guard
S

#MOBPROGS
#3000
if ispc $n
say Welcome to the plaza, $n.
endif~
#0

#LOOT
group plaza_coins 1
cp 5 20 weight 1
table plaza_keeper
use_group plaza_coins 100
#ENDLOOT

#HELPS
0 PLAZA~
The plaza is the heart of the city.~
0 $~

#$
";

#[test]
fn parse_extracts_every_section() {
    let loaded = parse_area(PLAZA, "plaza.are").unwrap();

    let area = loaded.area.as_ref().unwrap();
    assert_eq!(&*area.name, "The Grand Plaza");
    assert_eq!(area.min_vnum, Vnum::new(3000));
    assert_eq!(area.reset_interval, 300);

    assert_eq!(loaded.mobiles.len(), 1);
    let keeper = &loaded.mobiles[0];
    assert_eq!(keeper.level, 10);
    assert_eq!(keeper.mprogs.len(), 1);
    assert_eq!(keeper.mprogs[0].kind, TriggerKind::Greet);
    assert_eq!(keeper.loot_table.as_deref(), Some("plaza_keeper"));
    assert!(keeper.shop.is_some(), "shop section should attach to keeper");
    assert_eq!(keeper.spec_fun.as_deref(), Some("spec_guard"));

    assert_eq!(loaded.objects.len(), 1);
    assert_eq!(loaded.objects[0].extra_descs.len(), 1);

    assert_eq!(loaded.rooms.len(), 2);
    let plaza = &loaded.rooms[0];
    assert_eq!(plaza.resets.len(), 3, "M, its G rider, and the D reset");
    let gate = &loaded.rooms[1];
    assert_eq!(gate.resets.len(), 1);

    assert_eq!(loaded.progs.len(), 1);
    assert!(loaded.loot_text.contains("plaza_coins"));
    assert_eq!(loaded.helps.len(), 1);
    assert_eq!(loaded.helps[0].keywords, "PLAZA");
}

#[test]
fn save_load_save_is_byte_stable() {
    let first = render_area(&parse_area(PLAZA, "plaza.are").unwrap());
    let second = render_area(&parse_area(&first, "plaza.are").unwrap());
    assert_eq!(first, second);
}

#[test]
fn save_is_atomic_through_tmp_rename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plaza.are");
    let loaded = parse_area(PLAZA, "plaza.are").unwrap();
    save_area_file(&path, &loaded).unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reloaded = load_area_file(&path).unwrap();
    assert_eq!(reloaded.rooms.len(), 2);
}

#[test]
fn registered_area_instantiates_with_linked_exits() {
    let loaded = parse_area(PLAZA, "plaza.are").unwrap();
    let mut registry = Registry::new();
    let key = loaded.register(&mut registry).unwrap();

    let mut world = World::new(registry, 9);
    let area = world.instantiate_area(key, None).unwrap();
    world.link_area_exits(area);

    let plaza = world.room_by_vnum(Vnum::new(3001)).unwrap();
    let gate = world.room_by_vnum(Vnum::new(3002)).unwrap();
    let north = world.rooms[&plaza].exit(Direction::North).unwrap();
    assert_eq!(north.to_room, Some(gate));
    let south = world.rooms[&gate].exit(Direction::South).unwrap();
    assert_eq!(south.to_room, Some(plaza));

    // Reset pass materializes the keeper with his purse, the fountain,
    // and swings the plaza door shut.
    mudstone_world::reset_area(&mut world, area);
    assert_eq!(world.mob_count(Vnum::new(3000)), 1);
    assert_eq!(world.obj_count(Vnum::new(3010)), 2); // carried + gate copy
    assert_eq!(
        world.rooms[&plaza].exit(Direction::North).unwrap().state,
        mudstone_types::DoorState::Closed
    );
    assert!(world.audit().is_empty(), "{:?}", world.audit());
}

#[test]
fn json_render_and_parse_carries_prototypes() {
    let loaded = parse_area(PLAZA, "plaza.are").unwrap();
    let json = mudstone_area::render_area_json(&loaded).unwrap();
    let reloaded = mudstone_area::parse_area_json(&json).unwrap();
    assert_eq!(reloaded.rooms.len(), loaded.rooms.len());
    assert_eq!(reloaded.mobiles.len(), loaded.mobiles.len());
    // JSON carries no helps subsection.
    assert!(reloaded.helps.is_empty());
}

mod properties {
    use proptest::prelude::*;

    use mudstone_area::LoadedArea;
    use mudstone_types::{Sector, Vnum};
    use mudstone_world::{AreaProto, InstancePolicy, RoomProto};

    use super::{parse_area, render_area};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// The round-trip contract over generated content, not just the
        /// fixture: save(load(save(x))) is byte-equal to save(x).
        #[test]
        fn generated_areas_render_and_reparse_stably(
            room_name in "[A-Za-z][A-Za-z ]{0,24}",
            description in "[A-Za-z][A-Za-z ,.]{0,60}",
            room_flags in 0i64..(1i64 << 30),
            sector in 0i32..10,
            vnum in 3001i32..3099,
        ) {
            let loaded = LoadedArea {
                area: Some(AreaProto {
                    name: "Property Plaza".into(),
                    file_name: "prop.are".into(),
                    credits: "{ 1 10} Prop   Property Plaza".into(),
                    min_vnum: Vnum::new(3000),
                    max_vnum: Vnum::new(3099),
                    builders: "None".into(),
                    security: 9,
                    reset_interval: 300,
                    instance_policy: InstancePolicy::Singleton,
                }),
                rooms: vec![RoomProto {
                    vnum: Vnum::new(vnum),
                    name: room_name.into(),
                    description: description.into(),
                    sector: Sector::from_number(sector),
                    room_flags,
                    exits: Default::default(),
                    extra_descs: Vec::new(),
                    resets: Vec::new(),
                }],
                ..LoadedArea::default()
            };
            let first = render_area(&loaded);
            let reparsed = parse_area(&first, "prop.are").unwrap();
            let second = render_area(&reparsed);
            prop_assert_eq!(first, second);
        }
    }
}
