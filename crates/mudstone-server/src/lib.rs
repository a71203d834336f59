//! # mudstone-server: the game daemon
//!
//! Ties the workspace together: the single-threaded heartbeat that
//! multiplexes socket I/O, command interpretation, tick work, area
//! resets, and scheduled events over the world owned by this thread.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                        game loop                           │
//! │  poll sockets → read lines → nanny/interp → tick work →    │
//! │  flush output → reap dead descriptors → sleep to pulse     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! State splits in two: the [`mudstone_world::World`] (the entity graph)
//! and [`game::GameIo`] (descriptors, sessions, helps, loot, script VM,
//! global switches). Command handlers take both, which is also what lets
//! the mobprog host re-enter the dispatcher without aliasing the world.

pub mod act;
pub mod act_comm;
pub mod act_info;
pub mod act_move;
pub mod act_obj;
pub mod act_wiz;
pub mod boot;
pub mod config;
pub mod fight;
pub mod game;
pub mod game_loop;
pub mod help;
pub mod interp;
pub mod mob_cmds;
pub mod nanny;
pub mod reload;
pub mod socials;
pub mod spec_fns;
pub mod tick;
pub mod wiznet;

pub use boot::{boot, BootError};
pub use config::ServerConfig;
pub use game::{Game, GameIo, Session};
pub use game_loop::run;
