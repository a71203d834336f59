//! Loot data model and table resolution.

use tracing::warn;

use mudstone_types::Vnum;

/// Hard cap on distinct drops from one generation.
pub const MAX_LOOT_DROPS: usize = 64;

/// What one group entry yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootEntryKind {
    /// An item by prototype vnum.
    Item(Vnum),
    /// A band of coins.
    Coins,
}

/// One weighted entry in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootEntry {
    pub kind: LootEntryKind,
    pub min_qty: i32,
    pub max_qty: i32,
    /// Sampling weight; entries with non-positive weight never drop.
    pub weight: i32,
}

/// A named group: `rolls` weighted samples per use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LootGroup {
    pub name: String,
    pub rolls: i32,
    pub entries: Vec<LootEntry>,
}

/// One table operation, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LootOp {
    UseGroup { group: String, chance: i32 },
    AddItem { vnum: Vnum, chance: i32, min: i32, max: i32 },
    AddCoins { chance: i32, min: i32, max: i32 },
    MulCoins { percent: i32 },
    MulAllChances { percent: i32 },
    RemoveItem { vnum: Vnum },
    RemoveGroup { group: String },
}

/// Tri-color visit mark for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Visit {
    #[default]
    White,
    Visiting,
    Done,
}

/// A named table, possibly inheriting a parent's operations.
#[derive(Debug, Clone, Default)]
pub struct LootTable {
    pub name: String,
    pub parent: Option<String>,
    pub ops: Vec<LootOp>,
    /// Linearized operations: resolved parent ops first, then own.
    pub resolved_ops: Vec<LootOp>,
    visit: Visit,
}

impl LootTable {
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        LootTable {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            ..LootTable::default()
        }
    }
}

/// One generated drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LootDrop {
    Item { vnum: Vnum, qty: i32 },
    Coins { qty: i32 },
}

/// All groups and tables known to the world.
#[derive(Debug, Default)]
pub struct LootDb {
    pub groups: Vec<LootGroup>,
    pub tables: Vec<LootTable>,
}

impl LootDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_group(&self, name: &str) -> Option<&LootGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn find_table(&self, name: &str) -> Option<&LootTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Adds a group; an existing name wins (later files cannot shadow).
    pub fn add_group(&mut self, group: LootGroup) {
        if self.find_group(&group.name).is_none() {
            self.groups.push(group);
        }
    }

    pub fn add_table(&mut self, table: LootTable) {
        if self.find_table(&table.name).is_none() {
            self.tables.push(table);
        }
    }

    /// Resolves every table: parent ops prepended, own ops after. Cycles
    /// are logged and leave the affected tables unresolved (not fatal).
    pub fn resolve_all(&mut self) {
        for table in &mut self.tables {
            table.visit = Visit::White;
        }
        for index in 0..self.tables.len() {
            self.resolve_dfs(index);
        }
    }

    fn resolve_dfs(&mut self, index: usize) {
        match self.tables[index].visit {
            Visit::Visiting => {
                warn!(target: "bug", table = %self.tables[index].name,
                    "cycle in loot table inheritance");
                return;
            }
            Visit::Done => return,
            Visit::White => {}
        }
        self.tables[index].visit = Visit::Visiting;

        let mut resolved = Vec::new();
        if let Some(parent_name) = self.tables[index].parent.clone() {
            match self.tables.iter().position(|t| t.name == parent_name) {
                Some(parent_index) => {
                    self.resolve_dfs(parent_index);
                    resolved.extend(self.tables[parent_index].resolved_ops.iter().cloned());
                }
                None => {
                    warn!(target: "bug", table = %self.tables[index].name,
                        parent = %parent_name, "unknown parent loot table");
                }
            }
        }
        resolved.extend(self.tables[index].ops.iter().cloned());
        self.tables[index].resolved_ops = resolved;
        self.tables[index].visit = Visit::Done;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(name: &str, parent: Option<&str>, ops: Vec<LootOp>) -> LootTable {
        let mut table = LootTable::new(name, parent);
        table.ops = ops;
        table
    }

    #[test]
    fn resolution_prepends_parent_ops() {
        let mut db = LootDb::new();
        db.add_table(table_with(
            "base",
            None,
            vec![LootOp::AddCoins { chance: 100, min: 1, max: 2 }],
        ));
        db.add_table(table_with(
            "child",
            Some("base"),
            vec![LootOp::MulCoins { percent: 200 }],
        ));
        db.resolve_all();

        let child = db.find_table("child").unwrap();
        assert_eq!(child.resolved_ops.len(), 2);
        assert!(matches!(child.resolved_ops[0], LootOp::AddCoins { .. }));
        assert!(matches!(child.resolved_ops[1], LootOp::MulCoins { .. }));

        // The contract: resolved == resolve(parent) ++ own.
        let base = db.find_table("base").unwrap();
        let expected: Vec<LootOp> = base
            .resolved_ops
            .iter()
            .cloned()
            .chain(child.ops.iter().cloned())
            .collect();
        assert_eq!(child.resolved_ops, expected);
    }

    #[test]
    fn grandparent_chain_resolves_in_order() {
        let mut db = LootDb::new();
        db.add_table(table_with("a", None, vec![LootOp::MulCoins { percent: 1 }]));
        db.add_table(table_with("b", Some("a"), vec![LootOp::MulCoins { percent: 2 }]));
        db.add_table(table_with("c", Some("b"), vec![LootOp::MulCoins { percent: 3 }]));
        db.resolve_all();
        let percents: Vec<i32> = db
            .find_table("c")
            .unwrap()
            .resolved_ops
            .iter()
            .map(|op| match op {
                LootOp::MulCoins { percent } => *percent,
                _ => 0,
            })
            .collect();
        assert_eq!(percents, vec![1, 2, 3]);
    }

    #[test]
    fn cycles_are_detected_and_nonfatal() {
        let mut db = LootDb::new();
        db.add_table(table_with("x", Some("y"), vec![LootOp::MulCoins { percent: 1 }]));
        db.add_table(table_with("y", Some("x"), vec![LootOp::MulCoins { percent: 2 }]));
        db.resolve_all();
        // Both tables still end up with their own ops at the tail.
        assert!(!db.find_table("x").unwrap().resolved_ops.is_empty());
        assert!(!db.find_table("y").unwrap().resolved_ops.is_empty());
    }

    #[test]
    fn duplicate_names_keep_the_first() {
        let mut db = LootDb::new();
        db.add_group(LootGroup { name: "g".into(), rolls: 1, entries: Vec::new() });
        db.add_group(LootGroup { name: "g".into(), rolls: 9, entries: Vec::new() });
        assert_eq!(db.find_group("g").unwrap().rolls, 1);
    }
}
