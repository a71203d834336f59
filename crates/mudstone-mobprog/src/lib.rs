//! # mudstone-mobprog: the scripted-NPC interpreter
//!
//! A small line-structured language attached to NPC prototypes and driven
//! by in-world triggers. Each line is a comment, a control word
//! (`if`/`or`/`and`/`else`/`endif`/`break`/`end`), a `mob` builtin, or a
//! plain command handed back to the regular command interpreter after
//! `$`-code expansion.
//!
//! The interpreter runs programs to completion: `mob delay` is not a
//! coroutine suspension, it arms a timer on the mobile and the `DELAY`
//! trigger fires later with the remembered target.
//!
//! Command re-entry goes through [`ProgramHost`], implemented by the
//! server, so position and trust checks apply to scripted commands
//! exactly as to typed ones. `mob call` re-enters the interpreter here,
//! which is how the call-depth limit is enforced.

mod checks;
mod expand;
mod flow;
mod trigger;

pub use checks::eval_check;
pub use expand::expand_code;
pub use flow::{run_program, Interpreter, ProgArgs, MAX_CALL_LEVEL, MAX_NESTED_LEVEL};
pub use trigger::{
    act_trigger, bribe_trigger, delay_trigger, exit_trigger, give_trigger, greet_trigger,
    hp_trigger, percent_trigger, random_trigger, surrender_trigger,
};

// The trigger vocabulary lives with the prototypes; re-exported here so
// trigger call sites need only this crate.
pub use mudstone_world::TriggerKind;

use mudstone_types::MobId;
use mudstone_world::World;

/// Command sink for program execution. The server routes `interpret`
/// through the normal dispatcher and `mob_interpret` through the mob
/// builtin table.
pub trait ProgramHost {
    fn interpret(&mut self, world: &mut World, actor: MobId, line: &str);
    fn mob_interpret(&mut self, world: &mut World, actor: MobId, line: &str);
}
