//! # mudstone-loot: weighted drop tables
//!
//! Loot is declared in text (a standalone loot file or a `#LOOT` area
//! section): `group` blocks hold weighted entries, `table` blocks hold an
//! ordered operation list and may inherit from a parent table. Tables are
//! resolved once after load (parent operations prepended, cycles detected
//! by tri-color marks); kill-time generation walks the resolved list with
//! multiplicative coin/chance modifiers and returns at most
//! [`MAX_LOOT_DROPS`] merged drops.

mod engine;
mod model;
mod parse;

pub use engine::generate_loot;
pub use model::{
    LootDb, LootDrop, LootEntry, LootEntryKind, LootGroup, LootOp, LootTable, MAX_LOOT_DROPS,
};
pub use parse::parse_loot_text;
