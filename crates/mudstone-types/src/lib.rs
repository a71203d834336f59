//! # mudstone-types: core type definitions
//!
//! Shared vocabulary for the whole workspace: prototype vnums, runtime
//! entity ids, direction/position/sex enums, flag-bit constants matching
//! the letter-alphabet area-file encoding, dice triples, and the in-band
//! color palette.
//!
//! Everything here is plain data. No component logic lives in this crate.

mod color;
mod dice;
mod enums;
mod flags;
mod ids;

pub use color::{ColorMode, strip_color, translate_color};
pub use dice::Dice;
pub use enums::{
    DamageType, Direction, DoorState, ItemType, Position, Sector, Sex, Size, WearSlot,
    DIR_MAX, WEAR_SLOT_MAX,
};
pub use flags::*;
pub use ids::{AreaId, MobId, ObjId, RoomId, Vnum};

/// Trust ceiling; also the level of the implementors.
pub const MAX_LEVEL: i16 = 60;
/// First immortal level. Commands gated above this are wiz commands.
pub const LEVEL_IMMORTAL: i16 = MAX_LEVEL - 8;
/// Trust required for the most dangerous wiz commands.
pub const LEVEL_SUPREME: i16 = MAX_LEVEL;
/// Highest level an unassisted mortal can reach.
pub const LEVEL_HERO: i16 = LEVEL_IMMORTAL - 1;

/// Pulses per real-time second at the default cadence.
pub const PULSE_PER_SECOND: u32 = 4;
/// Pulses per mobile-AI tick.
pub const PULSE_MOBILE: u32 = 4;
/// Pulses per game hour (the "point tick" cadence).
pub const PULSE_TICK: u32 = 30 * PULSE_PER_SECOND;
/// Pulses between autosave sweeps.
pub const PULSE_AUTOSAVE: u32 = 180 * PULSE_PER_SECOND;

/// Hard cap applied to entity-list scans driven by user input.
pub const SEARCH_CAP: usize = 200;
