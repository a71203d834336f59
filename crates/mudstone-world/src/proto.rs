//! Prototypes: immutable templates keyed by vnum.
//!
//! Prototypes are built by the area loader at boot and shared behind `Arc`;
//! instances reference them by vnum through the registry. Nothing at
//! runtime mutates a prototype (the in-game editor is out of scope).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mudstone_types::{
    DamageType, Dice, Direction, Flags, Position, Sector, Sex, Size, Vnum, DIR_MAX,
};

use crate::affect::Affect;

/// Area instancing policy.
pub use crate::area::InstancePolicy;

/// An area template: vnum range, reset cadence, instancing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaProto {
    pub name: Arc<str>,
    /// File this area was loaded from (and saves back to).
    pub file_name: Arc<str>,
    /// Free-form attribution label shown by `areas`.
    pub credits: Arc<str>,
    pub min_vnum: Vnum,
    pub max_vnum: Vnum,
    /// Builder name list for the editor ACL.
    pub builders: Arc<str>,
    pub security: i32,
    /// Reset threshold in pulses; 0 defers to the server default.
    pub reset_interval: u32,
    pub instance_policy: InstancePolicy,
}

/// Extra description: keyword-addressed text on rooms and objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDesc {
    pub keyword: Arc<str>,
    pub description: Arc<str>,
}

/// An exit template. `to_vnum` is resolved to a live room per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitProto {
    pub to_vnum: Vnum,
    pub key: Vnum,
    /// Door bits (`EX_ISDOOR`, reset-time `EX_CLOSED`/`EX_LOCKED`, …).
    pub exit_flags: Flags,
    pub keyword: Arc<str>,
    pub description: Arc<str>,
    /// Direction this exit occupied before any `R` reset randomized the
    /// room; the persister writes exits back in original order.
    pub orig_dir: Direction,
}

/// A room template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomProto {
    pub vnum: Vnum,
    pub name: Arc<str>,
    pub description: Arc<str>,
    pub sector: Sector,
    pub room_flags: Flags,
    pub exits: [Option<ExitProto>; DIR_MAX],
    pub extra_descs: Vec<ExtraDesc>,
    /// Ordered reset script for this room.
    pub resets: Vec<Reset>,
}

/// One reset command, as parsed from the `#RESETS` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Reset {
    /// `M`: load a mobile if under the area and room caps.
    Mob {
        mob: Vnum,
        area_max: i32,
        room: Vnum,
        room_max: i32,
    },
    /// `O`: load an object into the room if under the world cap and the
    /// room does not already hold one.
    Obj { obj: Vnum, world_max: i32, room: Vnum },
    /// `P`: put an object inside the most recent `O` container.
    Put {
        obj: Vnum,
        world_max: i32,
        container: Vnum,
        container_max: i32,
    },
    /// `G`: give an object to the most recent `M` mobile.
    Give { obj: Vnum },
    /// `E`: equip an object on the most recent `M` mobile.
    Equip { obj: Vnum, slot: i32 },
    /// `D`: set a door state (0 open, 1 closed, 2 locked).
    Door {
        room: Vnum,
        direction: i32,
        state: i32,
    },
    /// `R`: randomize the first `count` exits of a room in place.
    Randomize { room: Vnum, count: i32 },
}

impl Reset {
    /// The section letter for this command.
    pub fn letter(&self) -> char {
        match self {
            Reset::Mob { .. } => 'M',
            Reset::Obj { .. } => 'O',
            Reset::Put { .. } => 'P',
            Reset::Give { .. } => 'G',
            Reset::Equip { .. } => 'E',
            Reset::Door { .. } => 'D',
            Reset::Randomize { .. } => 'R',
        }
    }
}

/// MobProg trigger kinds, in area-file spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerKind {
    Act,
    Speech,
    Random,
    Fight,
    HpCnt,
    Death,
    Entry,
    Greet,
    GrAll,
    Give,
    Bribe,
    Kill,
    Delay,
    Surr,
    Exit,
    ExAll,
}

impl TriggerKind {
    pub fn name(self) -> &'static str {
        match self {
            TriggerKind::Act => "ACT",
            TriggerKind::Speech => "SPEECH",
            TriggerKind::Random => "RANDOM",
            TriggerKind::Fight => "FIGHT",
            TriggerKind::HpCnt => "HPCNT",
            TriggerKind::Death => "DEATH",
            TriggerKind::Entry => "ENTRY",
            TriggerKind::Greet => "GREET",
            TriggerKind::GrAll => "GRALL",
            TriggerKind::Give => "GIVE",
            TriggerKind::Bribe => "BRIBE",
            TriggerKind::Kill => "KILL",
            TriggerKind::Delay => "DELAY",
            TriggerKind::Surr => "SURR",
            TriggerKind::Exit => "EXIT",
            TriggerKind::ExAll => "EXALL",
        }
    }

    pub fn parse(word: &str) -> Option<TriggerKind> {
        let upper = word.to_ascii_uppercase();
        [
            TriggerKind::Act,
            TriggerKind::Speech,
            TriggerKind::Random,
            TriggerKind::Fight,
            TriggerKind::HpCnt,
            TriggerKind::Death,
            TriggerKind::Entry,
            TriggerKind::Greet,
            TriggerKind::GrAll,
            TriggerKind::Give,
            TriggerKind::Bribe,
            TriggerKind::Kill,
            TriggerKind::Delay,
            TriggerKind::Surr,
            TriggerKind::Exit,
            TriggerKind::ExAll,
        ]
        .into_iter()
        .find(|t| t.name() == upper)
    }
}

/// A trigger entry on a mob prototype: when `kind` fires and the phrase
/// matches, run the script with vnum `prog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgTrigger {
    pub kind: TriggerKind,
    pub prog: Vnum,
    pub phrase: Arc<str>,
}

/// Shop data carried on shopkeeper prototypes. The economy itself is an
/// external collaborator; the simulation only loads and stores this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopData {
    pub buy_types: [i32; 5],
    pub profit_buy: i32,
    pub profit_sell: i32,
    pub open_hour: i32,
    pub close_hour: i32,
}

/// A mobile template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobProto {
    pub vnum: Vnum,
    /// Keyword list used for targeting.
    pub name: Arc<str>,
    pub short_descr: Arc<str>,
    pub long_descr: Arc<str>,
    pub description: Arc<str>,
    pub race: Arc<str>,
    pub act_flags: Flags,
    pub affect_flags: Flags,
    pub off_flags: Flags,
    pub imm_flags: Flags,
    pub res_flags: Flags,
    pub vuln_flags: Flags,
    pub form_flags: Flags,
    pub part_flags: Flags,
    pub alignment: i32,
    pub group: i32,
    pub level: i16,
    pub hitroll: i32,
    pub hit: Dice,
    pub mana: Dice,
    pub damage: Dice,
    pub dam_type: DamageType,
    pub armor: [i32; 4],
    pub start_pos: Position,
    pub default_pos: Position,
    pub sex: Sex,
    pub wealth: i64,
    pub size: Size,
    pub material: Arc<str>,
    pub mprogs: Vec<ProgTrigger>,
    pub shop: Option<ShopData>,
    /// Spec-fun name resolved against the server's function directory.
    pub spec_fun: Option<Arc<str>>,
    /// Loot table consulted on death; `None` falls back to the race table.
    pub loot_table: Option<Arc<str>>,
}

impl MobProto {
    pub fn has_trigger(&self, kind: TriggerKind) -> bool {
        self.mprogs.iter().any(|t| t.kind == kind)
    }
}

/// An object template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjProto {
    pub vnum: Vnum,
    pub name: Arc<str>,
    pub short_descr: Arc<str>,
    pub description: Arc<str>,
    pub material: Arc<str>,
    pub item_type: mudstone_types::ItemType,
    pub extra_flags: Flags,
    pub wear_flags: Flags,
    /// Five value slots interpreted per `item_type`.
    pub values: [i32; 5],
    pub weight: i32,
    pub cost: i32,
    pub condition: i32,
    pub level: i16,
    pub affects: Vec<Affect>,
    pub extra_descs: Vec<ExtraDesc>,
}

/// A mobprog script: vnum plus source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobProgScript {
    pub vnum: Vnum,
    pub code: Arc<str>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_kind_parse_round_trips() {
        for name in ["GREET", "EXALL", "HPCNT", "BRIBE"] {
            let kind = TriggerKind::parse(name).unwrap();
            assert_eq!(kind.name(), name);
        }
        assert_eq!(TriggerKind::parse("NOSUCH"), None);
    }

    #[test]
    fn reset_letters() {
        let r = Reset::Mob {
            mob: Vnum::new(3000),
            area_max: 2,
            room: Vnum::new(3001),
            room_max: 1,
        };
        assert_eq!(r.letter(), 'M');
        assert_eq!(
            Reset::Door {
                room: Vnum::new(3001),
                direction: 0,
                state: 1
            }
            .letter(),
            'D'
        );
    }
}
