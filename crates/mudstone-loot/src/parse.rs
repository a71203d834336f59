//! Loot file parser.
//!
//! Token stream of whitespace-separated words:
//!
//! ```text
//! group NAME ROLLS
//!   item VNUM MIN MAX weight W
//!   cp MIN MAX weight W
//! table NAME [parent PARENT]
//!   use_group NAME CHANCE
//!   add_item VNUM CHANCE MIN MAX
//!   add_cp CHANCE MIN MAX
//!   mul_cp PERCENT
//!   mul_all_chances PERCENT
//!   remove_item VNUM
//!   remove_group NAME
//! ```
//!
//! Malformed lines are bug records, not fatal: the parser skips to the
//! next recognizable token so one bad entry cannot take the file down.

use std::iter::Peekable;

use tracing::warn;

use mudstone_types::Vnum;

use crate::model::{LootDb, LootEntry, LootEntryKind, LootGroup, LootOp, LootTable};

/// Parses loot text into the database. Tables are not resolved here;
/// call [`LootDb::resolve_all`] once every source is loaded.
pub fn parse_loot_text(db: &mut LootDb, text: &str, source: &str) {
    let mut tokens = text.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        match token {
            "group" => parse_group(db, &mut tokens, source),
            "table" => parse_table(db, &mut tokens, source),
            "*" => {
                // Comment token: discard the rest of the logical line by
                // skipping to the next block keyword.
                while tokens
                    .peek()
                    .is_some_and(|t| *t != "group" && *t != "table")
                {
                    tokens.next();
                }
            }
            other => {
                warn!(target: "bug", source, token = other, "loot: unexpected token");
            }
        }
    }
}

type Tokens<'a> = Peekable<std::str::SplitWhitespace<'a>>;

fn next_int(tokens: &mut Tokens<'_>, what: &str, source: &str) -> Option<i32> {
    let token = tokens.next()?;
    match token.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(target: "bug", source, what, token, "loot: expected integer");
            None
        }
    }
}

fn expect(tokens: &mut Tokens<'_>, literal: &str, source: &str) -> bool {
    match tokens.next() {
        Some(token) if token == literal => true,
        other => {
            warn!(target: "bug", source, expected = literal, found = ?other,
                "loot: expected literal");
            false
        }
    }
}

fn parse_group(db: &mut LootDb, tokens: &mut Tokens<'_>, source: &str) {
    let Some(name) = tokens.next() else {
        warn!(target: "bug", source, "loot: group missing name");
        return;
    };
    let Some(rolls) = next_int(tokens, "group rolls", source) else {
        return;
    };
    let mut group = LootGroup {
        name: name.to_string(),
        rolls,
        entries: Vec::new(),
    };

    loop {
        match tokens.peek().copied() {
            Some("item") => {
                tokens.next();
                let Some(vnum) = next_int(tokens, "item vnum", source) else { break };
                let Some(min) = next_int(tokens, "item min", source) else { break };
                let Some(max) = next_int(tokens, "item max", source) else { break };
                if !expect(tokens, "weight", source) {
                    break;
                }
                let Some(weight) = next_int(tokens, "item weight", source) else { break };
                group.entries.push(LootEntry {
                    kind: LootEntryKind::Item(Vnum::new(vnum)),
                    min_qty: min,
                    max_qty: max,
                    weight,
                });
            }
            Some("cp") => {
                tokens.next();
                let Some(min) = next_int(tokens, "cp min", source) else { break };
                let Some(max) = next_int(tokens, "cp max", source) else { break };
                if !expect(tokens, "weight", source) {
                    break;
                }
                let Some(weight) = next_int(tokens, "cp weight", source) else { break };
                group.entries.push(LootEntry {
                    kind: LootEntryKind::Coins,
                    min_qty: min,
                    max_qty: max,
                    weight,
                });
            }
            _ => break,
        }
    }
    db.add_group(group);
}

fn parse_table(db: &mut LootDb, tokens: &mut Tokens<'_>, source: &str) {
    let Some(name) = tokens.next() else {
        warn!(target: "bug", source, "loot: table missing name");
        return;
    };
    let parent = if tokens.peek() == Some(&"parent") {
        tokens.next();
        tokens.next().map(str::to_string)
    } else {
        None
    };
    let mut table = LootTable::new(name, parent.as_deref());

    loop {
        let op = match tokens.peek().copied() {
            Some("use_group") => {
                tokens.next();
                let Some(group) = tokens.next() else { break };
                let Some(chance) = next_int(tokens, "use_group chance", source) else { break };
                LootOp::UseGroup {
                    group: group.to_string(),
                    chance,
                }
            }
            Some("add_item") => {
                tokens.next();
                let Some(vnum) = next_int(tokens, "add_item vnum", source) else { break };
                let Some(chance) = next_int(tokens, "add_item chance", source) else { break };
                let Some(min) = next_int(tokens, "add_item min", source) else { break };
                let Some(max) = next_int(tokens, "add_item max", source) else { break };
                LootOp::AddItem {
                    vnum: Vnum::new(vnum),
                    chance,
                    min,
                    max,
                }
            }
            Some("add_cp") => {
                tokens.next();
                let Some(chance) = next_int(tokens, "add_cp chance", source) else { break };
                let Some(min) = next_int(tokens, "add_cp min", source) else { break };
                let Some(max) = next_int(tokens, "add_cp max", source) else { break };
                LootOp::AddCoins { chance, min, max }
            }
            Some("mul_cp") => {
                tokens.next();
                let Some(percent) = next_int(tokens, "mul_cp percent", source) else { break };
                LootOp::MulCoins { percent }
            }
            Some("mul_all_chances") => {
                tokens.next();
                let Some(percent) = next_int(tokens, "mul_all_chances percent", source) else {
                    break;
                };
                LootOp::MulAllChances { percent }
            }
            Some("remove_item") => {
                tokens.next();
                let Some(vnum) = next_int(tokens, "remove_item vnum", source) else { break };
                LootOp::RemoveItem {
                    vnum: Vnum::new(vnum),
                }
            }
            Some("remove_group") => {
                tokens.next();
                let Some(group) = tokens.next() else { break };
                LootOp::RemoveGroup {
                    group: group.to_string(),
                }
            }
            _ => break,
        };
        table.ops.push(op);
    }
    db.add_table(table);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
group rat_pickings 2
item 3010 1 1 weight 3
cp 1 5 weight 1

table vermin
use_group rat_pickings 75
add_cp 50 1 3

table sewer_rat parent vermin
mul_cp 150
remove_item 3010
";

    #[test]
    fn parses_groups_and_tables() {
        let mut db = LootDb::new();
        parse_loot_text(&mut db, SAMPLE, "test");
        let group = db.find_group("rat_pickings").unwrap();
        assert_eq!(group.rolls, 2);
        assert_eq!(group.entries.len(), 2);
        assert_eq!(group.entries[0].kind, LootEntryKind::Item(Vnum::new(3010)));

        let vermin = db.find_table("vermin").unwrap();
        assert_eq!(vermin.ops.len(), 2);

        let rat = db.find_table("sewer_rat").unwrap();
        assert_eq!(rat.parent.as_deref(), Some("vermin"));
        assert_eq!(rat.ops.len(), 2);
    }

    #[test]
    fn resolution_after_parse_linearizes() {
        let mut db = LootDb::new();
        parse_loot_text(&mut db, SAMPLE, "test");
        db.resolve_all();
        let rat = db.find_table("sewer_rat").unwrap();
        assert_eq!(rat.resolved_ops.len(), 4);
        assert!(matches!(rat.resolved_ops[0], LootOp::UseGroup { .. }));
        assert!(matches!(rat.resolved_ops[3], LootOp::RemoveItem { .. }));
    }

    #[test]
    fn bad_tokens_do_not_poison_later_blocks() {
        let mut db = LootDb::new();
        parse_loot_text(&mut db, "junk group ok 1 cp 1 2 weight 1", "test");
        assert!(db.find_group("ok").is_some());
    }
}
