//! The program driver: parses program lines and routes executable
//! commands to the host interpreter.

use mudstone_types::{MobId, ObjId, Vnum};
use mudstone_world::World;

use crate::checks::eval_check;
use crate::expand::expand_code;
use crate::ProgramHost;

/// Maximum nested `if`/`else`/`endif` levels (the block stack size).
pub const MAX_NESTED_LEVEL: usize = 12;
/// Maximum nested `mob call` re-entries.
pub const MAX_CALL_LEVEL: u32 = 5;

/// The actors a trigger hands to the program.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgArgs {
    /// The triggering actor (`$n`).
    pub actor: Option<MobId>,
    /// Secondary target (`$t`).
    pub victim: Option<MobId>,
    /// Primary object (`$o`).
    pub obj1: Option<ObjId>,
    /// Secondary object (`$p`).
    pub obj2: Option<ObjId>,
}

impl ProgArgs {
    pub fn actor(actor: MobId) -> Self {
        ProgArgs {
            actor: Some(actor),
            ..ProgArgs::default()
        }
    }
}

/// Re-entrant interpreter state: the host plus the `mob call` depth.
pub struct Interpreter<'a> {
    pub host: &'a mut dyn ProgramHost,
    depth: u32,
}

impl<'a> Interpreter<'a> {
    pub fn new(host: &'a mut dyn ProgramHost) -> Self {
        Interpreter { host, depth: 0 }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BlockState {
    /// An `if` has opened at this level and awaits its body.
    Begin,
    /// Executable statements.
    In,
    /// The level below just closed a block.
    End,
}

fn bug_flow(mvnum: Vnum, pvnum: Vnum, what: &str) {
    tracing::warn!(target: "bug", mob = %mvnum, prog = %pvnum, "mobprog: {what}");
}

/// Runs one program to completion. Nested `mob call`s re-enter through
/// the same interpreter; exceeding [`MAX_CALL_LEVEL`] aborts the nested
/// call and logs the prototype vnum.
pub fn run_program(
    world: &mut World,
    interp: &mut Interpreter<'_>,
    pvnum: Vnum,
    code: &str,
    mob_id: MobId,
    args: &ProgArgs,
) {
    let mvnum = world
        .mobs
        .get(&mob_id)
        .and_then(|m| m.proto)
        .unwrap_or(Vnum::NONE);

    interp.depth += 1;
    if interp.depth > MAX_CALL_LEVEL {
        bug_flow(mvnum, pvnum, "call depth exceeded");
        interp.depth -= 1;
        return;
    }

    let mut rand_mob: Option<MobId> = None;
    // One slot beyond the limit so the 12th nested level is usable and
    // the 13th aborts.
    let mut state = [BlockState::In; MAX_NESTED_LEVEL + 1];
    let mut cond = [true; MAX_NESTED_LEVEL + 1];
    let mut level: usize = 0;

    for raw_line in code.lines() {
        // The running mob can be extracted by its own commands.
        if !world.mobs.contains_key(&mob_id) {
            break;
        }
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('*') {
            continue;
        }
        let (control, data) = match line.find(char::is_whitespace) {
            Some(split) => (&line[..split], line[split..].trim_start()),
            None => (line, ""),
        };

        match control {
            "if" => {
                if state[level] == BlockState::Begin {
                    bug_flow(mvnum, pvnum, "misplaced if statement");
                    break;
                }
                state[level] = BlockState::Begin;
                level += 1;
                if level > MAX_NESTED_LEVEL {
                    bug_flow(mvnum, pvnum, "max nested level exceeded");
                    break;
                }
                if !cond[level - 1] {
                    cond[level] = false;
                    continue;
                }
                let (check, rest) = split_check(data);
                cond[level] =
                    eval_check(world, pvnum, mob_id, args, &mut rand_mob, check, rest);
                state[level] = BlockState::End;
            }
            "or" => {
                if level == 0 || state[level - 1] != BlockState::Begin {
                    bug_flow(mvnum, pvnum, "or without if");
                    break;
                }
                if !cond[level - 1] {
                    continue;
                }
                let (check, rest) = split_check(data);
                let eval = eval_check(world, pvnum, mob_id, args, &mut rand_mob, check, rest);
                cond[level] = eval || cond[level];
            }
            "and" => {
                if level == 0 || state[level - 1] != BlockState::Begin {
                    bug_flow(mvnum, pvnum, "and without if");
                    break;
                }
                if !cond[level - 1] {
                    continue;
                }
                let (check, rest) = split_check(data);
                let eval = eval_check(world, pvnum, mob_id, args, &mut rand_mob, check, rest);
                cond[level] = cond[level] && eval;
            }
            "endif" => {
                if level == 0 || state[level - 1] != BlockState::Begin {
                    bug_flow(mvnum, pvnum, "endif without if");
                    break;
                }
                cond[level] = true;
                state[level] = BlockState::In;
                level -= 1;
                state[level] = BlockState::End;
            }
            "else" => {
                if level == 0 || state[level - 1] != BlockState::Begin {
                    bug_flow(mvnum, pvnum, "else without if");
                    break;
                }
                if !cond[level - 1] {
                    continue;
                }
                state[level] = BlockState::In;
                cond[level] = !cond[level];
            }
            "break" | "end" if cond[level] => break,
            _ => {
                if level == 0 || cond[level] {
                    state[level] = BlockState::In;
                    let expanded = expand_code(world, mob_id, args, &mut rand_mob, line);
                    if control == "mob" {
                        let rest = expanded
                            .split_once(char::is_whitespace)
                            .map_or("", |(_, tail)| tail.trim_start());
                        dispatch_mob_command(world, interp, mob_id, rest);
                    } else {
                        interp.host.interpret(world, mob_id, &expanded);
                    }
                }
            }
        }
    }

    interp.depth -= 1;
}

fn split_check(data: &str) -> (&str, &str) {
    match data.find(char::is_whitespace) {
        Some(split) => (&data[..split], data[split..].trim_start()),
        None => (data, ""),
    }
}

/// Routes `mob <builtin>` lines. `call` is handled here rather than in
/// the host's builtin table, so the re-entry depth limit applies.
fn dispatch_mob_command(
    world: &mut World,
    interp: &mut Interpreter<'_>,
    mob_id: MobId,
    line: &str,
) {
    let (builtin, rest) = split_check(line);
    if builtin == "call" {
        mob_call(world, interp, mob_id, rest);
    } else {
        interp.host.mob_interpret(world, mob_id, line);
    }
}

/// `mob call <vnum> [victim|'null'] [obj1|'null'] [obj2|'null']`
fn mob_call(world: &mut World, interp: &mut Interpreter<'_>, mob_id: MobId, rest: &str) {
    let mvnum = world
        .mobs
        .get(&mob_id)
        .and_then(|m| m.proto)
        .unwrap_or(Vnum::NONE);
    let mut words = rest.split_whitespace();
    let Some(prog_vnum) = words.next().and_then(|w| w.parse::<i32>().ok()) else {
        bug_flow(mvnum, Vnum::NONE, "mob call: missing prog vnum");
        return;
    };
    let prog_vnum = Vnum::new(prog_vnum);
    let Some(prog) = world.registry.prog(prog_vnum).cloned() else {
        bug_flow(mvnum, prog_vnum, "mob call: no such prog");
        return;
    };

    let mut args = ProgArgs::default();
    if let Some(word) = words.next() {
        if word != "null" {
            args.actor = world.find_mob_room(mob_id, word);
        }
    }
    if let Some(word) = words.next() {
        if word != "null" {
            args.obj1 = world.find_obj_here(mob_id, word);
        }
    }
    if let Some(word) = words.next() {
        if word != "null" {
            args.obj2 = world.find_obj_here(mob_id, word);
        }
    }

    run_program(world, interp, prog_vnum, &prog.code, mob_id, &args);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mudstone_world::World;

    /// Records every line the program hands back for execution.
    struct RecordingHost {
        lines: Vec<String>,
        mob_lines: Vec<String>,
    }

    impl RecordingHost {
        fn new() -> Self {
            RecordingHost {
                lines: Vec::new(),
                mob_lines: Vec::new(),
            }
        }
    }

    impl ProgramHost for RecordingHost {
        fn interpret(&mut self, _world: &mut World, _actor: MobId, line: &str) {
            self.lines.push(line.to_string());
        }
        fn mob_interpret(&mut self, _world: &mut World, _actor: MobId, line: &str) {
            self.mob_lines.push(line.to_string());
        }
    }

    fn world_with_mob() -> (World, MobId) {
        let (mut world, _) = mudstone_world::sim::small_world();
        let room = world.room_by_vnum(Vnum::new(3001)).unwrap();
        let mob = world.create_mobile(Vnum::new(3000)).unwrap();
        world.mob_to_room(mob, room);
        (world, mob)
    }

    fn run(world: &mut World, mob: MobId, code: &str, host: &mut RecordingHost) {
        let mut interp = Interpreter::new(host);
        run_program(
            world,
            &mut interp,
            Vnum::new(1),
            code,
            mob,
            &ProgArgs::default(),
        );
    }

    #[test]
    fn plain_lines_route_to_interpreter() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(&mut world, mob, "say hello\nsmile\n", &mut host);
        assert_eq!(host.lines, vec!["say hello", "smile"]);
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(&mut world, mob, "* a comment\n\nsay one\n", &mut host);
        assert_eq!(host.lines, vec!["say one"]);
    }

    #[test]
    fn false_branch_is_not_executed() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(
            &mut world,
            mob,
            "if rand 0\nsay never\nelse\nsay always\nendif\n",
            &mut host,
        );
        // A zero threshold never passes the percent roll.
        assert_eq!(host.lines, vec!["say always"]);
    }

    #[test]
    fn or_rescues_a_false_if() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(
            &mut world,
            mob,
            "if rand 0\nor isnpc $i\nsay yes\nendif\n",
            &mut host,
        );
        assert_eq!(host.lines, vec!["say yes"]);
    }

    #[test]
    fn and_narrows_a_true_if() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(
            &mut world,
            mob,
            "if isnpc $i\nand rand 0\nsay no\nendif\nsay after\n",
            &mut host,
        );
        assert_eq!(host.lines, vec!["say after"]);
    }

    #[test]
    fn nested_ifs_respect_outer_falsity() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(
            &mut world,
            mob,
            "if rand 0\nif isnpc $i\nsay inner\nendif\nendif\nsay done\n",
            &mut host,
        );
        assert_eq!(host.lines, vec!["say done"]);
    }

    #[test]
    fn break_stops_the_program() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(&mut world, mob, "say one\nbreak\nsay two\n", &mut host);
        assert_eq!(host.lines, vec!["say one"]);
    }

    #[test]
    fn twelve_nested_levels_still_execute() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        let mut code = String::new();
        for _ in 0..12 {
            code.push_str("if isnpc $i\n");
        }
        code.push_str("say deep enough\n");
        for _ in 0..12 {
            code.push_str("endif\n");
        }
        run(&mut world, mob, &code, &mut host);
        assert_eq!(host.lines, vec!["say deep enough"]);
    }

    #[test]
    fn nesting_beyond_twelve_levels_aborts() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        let mut code = String::new();
        for _ in 0..13 {
            code.push_str("if isnpc $i\n");
        }
        code.push_str("say too deep\n");
        run(&mut world, mob, &code, &mut host);
        assert!(host.lines.is_empty(), "13th if must abort the program");
    }

    #[test]
    fn expansion_replaces_self_keyword() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(&mut world, mob, "emote pats $i on the back\n", &mut host);
        assert_eq!(host.lines.len(), 1);
        assert!(
            host.lines[0].starts_with("emote pats rat"),
            "got {:?}",
            host.lines[0]
        );
    }

    #[test]
    fn mob_lines_route_to_builtin_table() {
        let (mut world, mob) = world_with_mob();
        let mut host = RecordingHost::new();
        run(&mut world, mob, "mob echo something stirs\n", &mut host);
        assert_eq!(host.mob_lines, vec!["echo something stirs"]);
    }

    #[test]
    fn call_depth_limit_aborts_sixth_level() {
        use mudstone_world::MobProgScript;

        let (mut world, mob) = world_with_mob();
        // Prog 1 calls itself forever; the depth limit must cut it off
        // after five executions of "say ping".
        world.registry.insert_prog(MobProgScript {
            vnum: Vnum::new(1),
            code: "say ping\nmob call 1\n".into(),
        });
        let code = world.registry.prog(Vnum::new(1)).cloned().unwrap();
        let mut host = RecordingHost::new();
        let mut interp = Interpreter::new(&mut host);
        run_program(
            &mut world,
            &mut interp,
            Vnum::new(1),
            &code.code,
            mob,
            &ProgArgs::default(),
        );
        assert_eq!(host.lines.len(), MAX_CALL_LEVEL as usize);
    }
}
