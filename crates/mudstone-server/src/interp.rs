//! The command dispatcher.
//!
//! The table is bucketed by first letter at first use; dispatch scans
//! only the bucket for the typed verb's letter, in table order, taking
//! the first prefix match the actor's trust allows. Table order within a
//! letter is priority order: movement verbs come first so `n` is north.

use std::sync::OnceLock;

use mudstone_script::{ExecContext, Value};
use mudstone_types::{MobId, Position, LEVEL_HERO, LEVEL_IMMORTAL, LEVEL_SUPREME, PLR_FREEZE, PLR_LOG};
use mudstone_world::World;

use crate::game::GameIo;
use crate::wiznet::{self, WiznetEvent};
use crate::{act_comm, act_info, act_move, act_obj, act_wiz, fight, reload, socials};

/// When a command line is committed to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPolicy {
    Normal,
    Always,
    Never,
}

/// A command handler: native code or a script-VM closure by name.
#[derive(Clone, Copy)]
pub enum Handler {
    Native(fn(&mut World, &mut GameIo, MobId, &str)),
    Script(&'static str),
}

/// One command table entry.
pub struct CmdEntry {
    pub name: &'static str,
    pub position: Position,
    pub trust: i16,
    pub log: LogPolicy,
    pub show: bool,
    pub handler: Handler,
}

const fn cmd(
    name: &'static str,
    position: Position,
    trust: i16,
    log: LogPolicy,
    show: bool,
    handler: Handler,
) -> CmdEntry {
    CmdEntry {
        name,
        position,
        trust,
        log,
        show,
        handler,
    }
}

use Handler::Native;
use LogPolicy::{Always, Never, Normal};
use Position::{Dead, Fighting, Resting, Sleeping, Standing};

/// The command table. Within a letter, order is priority order.
#[rustfmt::skip]
static CMD_TABLE: &[CmdEntry] = &[
    // Common movement first, so single letters resolve to them.
    cmd("north",     Standing, 0, Never,  false, Native(act_move::do_north)),
    cmd("east",      Standing, 0, Never,  false, Native(act_move::do_east)),
    cmd("south",     Standing, 0, Never,  false, Native(act_move::do_south)),
    cmd("west",      Standing, 0, Never,  false, Native(act_move::do_west)),
    cmd("up",        Standing, 0, Never,  false, Native(act_move::do_up)),
    cmd("down",      Standing, 0, Never,  false, Native(act_move::do_down)),

    // Common shortcuts before their longer competitors.
    cmd("look",      Resting,  0, Normal, true,  Native(act_info::do_look)),
    cmd("get",       Resting,  0, Normal, true,  Native(act_obj::do_get)),
    cmd("kill",      Fighting, 0, Normal, true,  Native(fight::do_kill)),

    cmd("areas",     Dead,     0, Normal, true,  Native(act_info::do_areas)),
    cmd("commands",  Dead,     0, Normal, true,  Native(act_info::do_commands)),
    cmd("close",     Resting,  0, Normal, true,  Native(act_move::do_close)),
    cmd("drop",      Resting,  0, Normal, true,  Native(act_obj::do_drop)),
    cmd("emote",     Resting,  0, Normal, true,  Native(act_comm::do_emote)),
    cmd("equipment", Dead,     0, Normal, true,  Native(act_info::do_equipment)),
    cmd("exits",     Resting,  0, Normal, true,  Native(act_info::do_exits)),
    cmd("flee",      Fighting, 0, Normal, true,  Native(fight::do_flee)),
    cmd("give",      Resting,  0, Normal, true,  Native(act_obj::do_give)),
    cmd("help",      Dead,     0, Normal, true,  Native(act_info::do_help)),
    cmd("inventory", Dead,     0, Normal, true,  Native(act_info::do_inventory)),
    cmd("lock",      Resting,  0, Normal, true,  Native(act_move::do_lock)),
    cmd("open",      Resting,  0, Normal, true,  Native(act_move::do_open)),
    cmd("put",       Resting,  0, Normal, true,  Native(act_obj::do_put)),
    cmd("quit",      Dead,     0, Normal, true,  Native(act_comm::do_quit)),
    cmd("recall",    Fighting, 0, Normal, true,  Native(act_move::do_recall)),
    cmd("remove",    Resting,  0, Normal, true,  Native(act_obj::do_remove)),
    cmd("reply",     Resting,  0, Normal, true,  Native(act_comm::do_reply)),
    cmd("rescue",    Fighting, 0, Normal, true,  Native(fight::do_rescue)),
    cmd("rest",      Sleeping, 0, Normal, true,  Native(act_move::do_rest)),
    cmd("save",      Dead,     0, Normal, true,  Native(act_comm::do_save)),
    cmd("say",       Resting,  0, Normal, true,  Native(act_comm::do_say)),
    cmd("'",         Resting,  0, Normal, false, Native(act_comm::do_say)),
    cmd("scan",      Resting,  0, Normal, true,  Native(act_info::do_scan)),
    cmd("score",     Dead,     0, Normal, true,  Native(act_info::do_score)),
    cmd("shout",     Resting,  3, Normal, true,  Native(act_comm::do_shout)),
    cmd("sit",       Sleeping, 0, Normal, true,  Native(act_move::do_sit)),
    cmd("sleep",     Sleeping, 0, Normal, true,  Native(act_move::do_sleep)),
    cmd("socials",   Dead,     0, Normal, true,  Native(act_info::do_socials)),
    cmd("stand",     Sleeping, 0, Normal, true,  Native(act_move::do_stand)),
    cmd("surrender", Fighting, 0, Normal, true,  Native(fight::do_surrender)),
    cmd("tell",      Resting,  0, Normal, true,  Native(act_comm::do_tell)),
    cmd("unlock",    Resting,  0, Normal, true,  Native(act_move::do_unlock)),
    cmd("version",   Dead,     0, Normal, true,  Handler::Script("cmd_version")),
    cmd("wake",      Sleeping, 0, Normal, true,  Native(act_move::do_wake)),
    cmd("wear",      Resting,  0, Normal, true,  Native(act_obj::do_wear)),
    cmd("who",       Dead,     0, Normal, true,  Native(act_info::do_who)),

    // Immortal commands, gated by trust.
    cmd("advance",   Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_advance)),
    cmd("at",        Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_at)),
    cmd("audit",     Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_audit)),
    cmd("deny",      Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_deny)),
    cmd("echo",      Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_echo)),
    cmd("force",     Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_force)),
    cmd("freeze",    Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_freeze)),
    cmd("goto",      Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_goto)),
    cmd("holylight", Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_holylight)),
    cmd("load",      Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_load)),
    cmd("mpstat",    Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_mpstat)),
    cmd("newlock",   Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_newlock)),
    cmd("pardon",    Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_pardon)),
    cmd("peace",     Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_peace)),
    cmd("purge",     Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_purge)),
    cmd("reboo",     Dead, LEVEL_SUPREME,    Normal, false, Native(act_wiz::do_reboo)),
    cmd("reboot",    Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_reboot)),
    cmd("reload",    Dead, LEVEL_IMMORTAL,   Always, true, Native(reload::do_reload)),
    cmd("restore",   Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_restore)),
    cmd("set",       Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_set)),
    cmd("shutdow",   Dead, LEVEL_SUPREME,    Normal, false, Native(act_wiz::do_shutdow)),
    cmd("shutdown",  Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_shutdown)),
    cmd("snoop",     Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_snoop)),
    cmd("stat",      Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_stat)),
    cmd("transfer",  Dead, LEVEL_IMMORTAL,   Always, true, Native(act_wiz::do_transfer)),
    cmd("wizlock",   Dead, LEVEL_SUPREME,    Always, true, Native(act_wiz::do_wizlock)),
    cmd("wiznet",    Dead, LEVEL_IMMORTAL,   Normal, true, Native(act_wiz::do_wiznet)),
];

/// First-letter buckets over `CMD_TABLE`; bucket 26 holds punctuation
/// verbs. Built once, preserving table order within a bucket.
fn buckets() -> &'static Vec<Vec<usize>> {
    static BUCKETS: OnceLock<Vec<Vec<usize>>> = OnceLock::new();
    BUCKETS.get_or_init(|| {
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); 27];
        for (index, entry) in CMD_TABLE.iter().enumerate() {
            let bucket = entry
                .name
                .chars()
                .next()
                .filter(char::is_ascii_lowercase)
                .map_or(26, |c| c as usize - 'a' as usize);
            buckets[bucket].push(index);
        }
        buckets
    })
}

fn find_command(verb: &str, trust: i16) -> Option<&'static CmdEntry> {
    let bucket = verb
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .filter(char::is_ascii_lowercase)
        .map_or(26, |c| c as usize - 'a' as usize);
    for &index in &buckets()[bucket] {
        let entry = &CMD_TABLE[index];
        if entry.trust <= trust && is_prefix(verb, entry.name) {
            return Some(entry);
        }
    }
    None
}

fn is_prefix(prefix: &str, name: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= name.len()
        && name[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// The main entry point for executing commands. Re-entered by `at`,
/// `force`, and mobprog lines.
pub fn interpret(world: &mut World, io: &mut GameIo, actor: MobId, argument: &str) {
    let argument = argument.trim_start();
    if argument.is_empty() {
        return;
    }

    // No hiding.
    world.reveal(actor);

    let Some(mob) = world.mobs.get(&actor) else { return };

    // Implement freeze command.
    if !mob.is_npc() && mob.act_flags & PLR_FREEZE != 0 {
        io.send_to_char(actor, "You're totally frozen!\n\r");
        return;
    }

    // Grab the command word. Special parsing so ' can be a command and
    // no space is needed after punctuation.
    let first = argument.chars().next().unwrap_or(' ');
    let (verb, rest) = if !first.is_ascii_alphanumeric() {
        let split = first.len_utf8();
        (&argument[..split], argument[split..].trim_start())
    } else {
        match argument.find(char::is_whitespace) {
            Some(split) => (&argument[..split], argument[split..].trim_start()),
            None => (argument, ""),
        }
    };

    let trust = mob.trust();
    let entry = find_command(verb, trust);

    // Log and snoop.
    let logged = match entry {
        Some(e) => e.log != Never,
        None => true,
    };
    let log_this = logged
        && (io.flags.log_all
            || entry.is_some_and(|e| e.log == Always)
            || world
                .mobs
                .get(&actor)
                .is_some_and(|m| !m.is_npc() && m.act_flags & PLR_LOG != 0));
    if log_this {
        let name = world
            .mobs
            .get(&actor)
            .map_or_else(|| "?".to_string(), |m| m.first_name().to_string());
        tracing::info!(target: "command", actor = %name, line = argument, "log");
        wiznet::wiznet(
            world,
            io,
            &format!("Log {name}: {argument}"),
            Some(actor),
            WiznetEvent::Secure,
            trust,
        );
    }

    let Some(entry) = entry else {
        // Look for the command in the socials table.
        if !socials::check_social(world, io, actor, verb, rest) {
            io.send_to_char(actor, "Huh?\n\r");
        }
        return;
    };

    // Character not in position for the command?
    let position = world.mobs.get(&actor).map_or(Position::Dead, |m| m.position);
    if position < entry.position {
        let refusal = match position {
            Position::Dead => "Lie still; you are DEAD.\n\r",
            Position::Mortal | Position::Incap => "You are hurt far too bad for that.\n\r",
            Position::Stunned => "You are too stunned to do that.\n\r",
            Position::Sleeping => "In your dreams, or what?\n\r",
            Position::Resting => "Nah... You feel too relaxed...\n\r",
            Position::Sitting => "Better stand up first.\n\r",
            Position::Fighting => "No way!  You are still fighting!\n\r",
            Position::Standing => "",
        };
        if !refusal.is_empty() {
            io.send_to_char(actor, refusal);
        }
        return;
    }

    // Dispatch the command.
    match entry.handler {
        Handler::Native(function) => function(world, io, actor, rest),
        Handler::Script(name) => {
            let closure = match io.vm.lookup(name) {
                Ok(closure) => closure,
                Err(e) => {
                    tracing::warn!(target: "bug", command = entry.name, error = %e,
                        "script command unbound");
                    return;
                }
            };
            let context = ExecContext {
                self_actor: Some(actor.get()),
                is_repl: false,
            };
            match io
                .vm
                .invoke(&closure, &context, &[Value::Text(rest.to_string())])
            {
                Ok(Value::Text(text)) => io.send_to_char(actor, &text),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(target: "bug", command = entry.name, error = %e,
                        "script command failed");
                }
            }
        }
    }
}

/// Commands visible to a given trust, for `commands` and `wizhelp`.
pub fn visible_commands(trust: i16) -> Vec<&'static str> {
    CMD_TABLE
        .iter()
        .filter(|e| e.show && e.trust <= trust)
        .map(|e| e.name)
        .collect()
}

/// The hero-level trust ceiling for mortal listings.
pub fn mortal_trust() -> i16 {
    LEVEL_HERO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letter_resolves_to_movement() {
        let entry = find_command("n", 1).unwrap();
        assert_eq!(entry.name, "north");
        let entry = find_command("e", 1).unwrap();
        assert_eq!(entry.name, "east");
    }

    #[test]
    fn prefix_match_respects_table_order() {
        // "s" must be south (movement first), "sa" say, "sc" scan.
        assert_eq!(find_command("s", 1).unwrap().name, "south");
        assert_eq!(find_command("sa", 1).unwrap().name, "save");
        assert_eq!(find_command("say", 1).unwrap().name, "say");
        assert_eq!(find_command("sc", 1).unwrap().name, "scan");
    }

    #[test]
    fn trust_gates_wiz_commands() {
        assert!(find_command("goto", 1).is_none());
        assert!(find_command("goto", LEVEL_IMMORTAL).is_some());
    }

    #[test]
    fn punctuation_verb_is_say() {
        let entry = find_command("'", 1).unwrap();
        assert_eq!(entry.name, "'");
    }

    #[test]
    fn unknown_verb_finds_nothing() {
        assert!(find_command("zzgibberish", 60).is_none());
    }
}
