//! # mudstone-world: the entity graph
//!
//! The in-memory simulation state: areas, rooms, mobiles, objects, affects,
//! their prototypes, and the closed set of mutation primitives that all
//! higher-level code routes through so the graph invariants hold.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         World                            │
//! │  ┌──────────┐  ┌─────────────────────┐  ┌─────────────┐  │
//! │  │ Registry │  │ areas/rooms/mobs/   │  │ reset       │  │
//! │  │ (protos) │→ │ objs instance maps  │← │ engine      │  │
//! │  └──────────┘  └─────────────────────┘  └─────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Ownership is arena-style: the `World` owns every instance in id-keyed
//! maps; cross-entity links (`fighting`, `master`, exits, container
//! membership) are ids, and the extraction primitives clear every inbound
//! id so no dangling reference survives a quiescence point.
//!
//! Mutation primitives are total: they accept any well-typed input
//! (including mobiles with no room), never panic, and log a `bug` record
//! instead of aborting when asked to do something inconsistent.

mod affect;
mod area;
mod audit;
mod clock;
mod mobile;
mod object;
mod proto;
mod query;
mod registry;
mod reset;
mod room;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
mod world;

pub use affect::{Affect, AffectLocation, AffectWhere};
pub use area::{AreaInst, InstancePolicy};
pub use clock::{GameClock, Sky};
pub use mobile::{is_name, Mobile, PlayerRecord, QuestState};
pub use object::{ObjLocation, Object};
pub use proto::{
    AreaProto, ExitProto, ExtraDesc, MobProgScript, MobProto, ObjProto, ProgTrigger, Reset,
    RoomProto, ShopData, TriggerKind,
};
pub use query::{split_ordinal, Census};
pub use registry::Registry;
pub use reset::reset_area;
pub use room::{Exit, Room};
pub use world::{World, WorldError, WorldResult};

/// Emits a bug record: a recoverable internal inconsistency.
///
/// Bugs carry enough context to reproduce (vnums, ids); the caller is
/// expected to leave the graph valid and continue.
#[macro_export]
macro_rules! bug {
    ($($arg:tt)*) => {
        tracing::warn!(target: "bug", $($arg)*)
    };
}
