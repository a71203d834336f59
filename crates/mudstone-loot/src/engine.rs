//! Kill-time loot generation.

use rand::Rng;
use tracing::warn;

use mudstone_types::Vnum;

use crate::model::{
    LootDb, LootDrop, LootEntry, LootEntryKind, LootGroup, LootOp, MAX_LOOT_DROPS,
};

/// Generates the drops for one kill from a resolved table.
///
/// Walks the resolved operation list in order. `mul_cp` and
/// `mul_all_chances` compose multiplicatively; `remove_item` and
/// `remove_group` populate skip lists consulted by later operations.
/// Identical drops merge by summation; at most [`MAX_LOOT_DROPS`]
/// distinct drops are returned.
pub fn generate_loot<R: Rng + ?Sized>(db: &LootDb, table_name: &str, rng: &mut R) -> Vec<LootDrop> {
    let mut drops: Vec<LootDrop> = Vec::new();
    let Some(table) = db.find_table(table_name) else {
        warn!(target: "bug", table = table_name, "generate_loot: unknown table");
        return drops;
    };

    let mut cp_mul: i64 = 100;
    let mut chance_mul: i64 = 100;
    let mut removed_items: Vec<Vnum> = Vec::new();
    let mut removed_groups: Vec<&str> = Vec::new();

    for op in &table.resolved_ops {
        match op {
            LootOp::MulCoins { percent } => {
                if *percent > 0 {
                    cp_mul = cp_mul * i64::from(*percent) / 100;
                }
            }
            LootOp::MulAllChances { percent } => {
                if *percent > 0 {
                    chance_mul = chance_mul * i64::from(*percent) / 100;
                }
            }
            LootOp::RemoveItem { vnum } => removed_items.push(*vnum),
            LootOp::RemoveGroup { group } => removed_groups.push(group.as_str()),

            LootOp::UseGroup { group, chance } => {
                if removed_groups.iter().any(|g| *g == group.as_str()) {
                    continue;
                }
                let effective = i64::from(*chance) * chance_mul / 100;
                if i64::from(rng.gen_range(1..=100)) > effective {
                    continue;
                }
                let Some(found) = db.find_group(group) else {
                    warn!(target: "bug", group = %group, table = table_name,
                        "generate_loot: unknown group");
                    continue;
                };
                roll_group(found, &removed_items, cp_mul, rng, &mut drops);
            }

            LootOp::AddItem {
                vnum,
                chance,
                min,
                max,
            } => {
                if removed_items.contains(vnum) {
                    continue;
                }
                let effective = i64::from(*chance) * chance_mul / 100;
                if i64::from(rng.gen_range(1..=100)) > effective {
                    continue;
                }
                let qty = range_roll(rng, *min, *max);
                push_drop(&mut drops, LootDrop::Item { vnum: *vnum, qty });
            }

            LootOp::AddCoins { chance, min, max } => {
                let effective = i64::from(*chance) * chance_mul / 100;
                if i64::from(rng.gen_range(1..=100)) > effective {
                    continue;
                }
                let qty = (i64::from(range_roll(rng, *min, *max)) * cp_mul / 100) as i32;
                push_drop(&mut drops, LootDrop::Coins { qty });
            }
        }
    }

    drops
}

fn roll_group<R: Rng + ?Sized>(
    group: &LootGroup,
    removed_items: &[Vnum],
    cp_mul: i64,
    rng: &mut R,
    drops: &mut Vec<LootDrop>,
) {
    if group.entries.is_empty() {
        return;
    }
    for _ in 0..group.rolls.max(0) {
        let Some(entry) = weighted_pick(&group.entries, rng) else {
            continue;
        };
        match entry.kind {
            LootEntryKind::Item(vnum) => {
                if removed_items.contains(&vnum) {
                    continue;
                }
                let qty = range_roll(rng, entry.min_qty, entry.max_qty);
                push_drop(drops, LootDrop::Item { vnum, qty });
            }
            LootEntryKind::Coins => {
                let base = range_roll(rng, entry.min_qty, entry.max_qty);
                let qty = (i64::from(base) * cp_mul / 100) as i32;
                push_drop(drops, LootDrop::Coins { qty });
            }
        }
    }
}

/// Weighted sample over entries with strictly positive weight.
fn weighted_pick<'a, R: Rng + ?Sized>(
    entries: &'a [LootEntry],
    rng: &mut R,
) -> Option<&'a LootEntry> {
    let total: i64 = entries
        .iter()
        .filter(|e| e.weight > 0)
        .map(|e| i64::from(e.weight))
        .sum();
    if total <= 0 {
        return None;
    }
    let mut roll = rng.gen_range(1..=total);
    for entry in entries {
        if entry.weight <= 0 {
            continue;
        }
        roll -= i64::from(entry.weight);
        if roll <= 0 {
            return Some(entry);
        }
    }
    None
}

fn range_roll<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rng.gen_range(low..=high)
}

/// Merges a drop into the list, respecting the distinct-drop cap.
fn push_drop(drops: &mut Vec<LootDrop>, drop: LootDrop) {
    let qty = match drop {
        LootDrop::Item { qty, .. } | LootDrop::Coins { qty } => qty,
    };
    if qty <= 0 {
        return;
    }
    for existing in drops.iter_mut() {
        match (existing, &drop) {
            (
                LootDrop::Item { vnum: a, qty: total },
                LootDrop::Item { vnum: b, qty: add },
            ) if a == b => {
                *total += add;
                return;
            }
            (LootDrop::Coins { qty: total }, LootDrop::Coins { qty: add }) => {
                *total += add;
                return;
            }
            _ => {}
        }
    }
    if drops.len() >= MAX_LOOT_DROPS {
        warn!(target: "bug", "generate_loot: drop cap reached");
        return;
    }
    drops.push(drop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_loot_text;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use test_case::test_case;

    fn db_from(text: &str) -> LootDb {
        let mut db = LootDb::new();
        parse_loot_text(&mut db, text, "test");
        db.resolve_all();
        db
    }

    #[test]
    fn coin_and_item_rates_are_balanced() {
        // One roll on a group with two equal-weight entries: over many
        // kills the item count and coin count converge, and any single
        // invocation yields at most 2 distinct drops.
        let db = db_from(
            "group g1 1\nitem 100 1 1 weight 1\ncp 10 10 weight 1\n\
             table t\nuse_group g1 100\n",
        );
        let mut rng = StdRng::seed_from_u64(2024);
        let mut items = 0u32;
        let mut coins = 0u32;
        for _ in 0..10_000 {
            let drops = generate_loot(&db, "t", &mut rng);
            assert!(drops.len() <= 2);
            for drop in drops {
                match drop {
                    LootDrop::Item { .. } => items += 1,
                    LootDrop::Coins { .. } => coins += 1,
                }
            }
        }
        let ratio = f64::from(items) / f64::from(coins);
        assert!((0.9..=1.1).contains(&ratio), "ratio {ratio} out of tolerance");
    }

    #[test_case(50, 50; "halved")]
    #[test_case(100, 100; "unchanged")]
    #[test_case(150, 150; "boosted")]
    #[test_case(300, 300; "tripled")]
    fn mul_cp_scales_coins(percent: i32, expected: i32) {
        let db = db_from(&format!(
            "group g 1\ncp 100 100 weight 1\n\
             table t\nmul_cp {percent}\nuse_group g 100\n",
        ));
        let mut rng = StdRng::seed_from_u64(7);
        let drops = generate_loot(&db, "t", &mut rng);
        assert_eq!(drops, vec![LootDrop::Coins { qty: expected }]);
    }

    #[test_case(0; "zero is ignored")]
    #[test_case(-40; "negative is ignored")]
    fn nonpositive_multipliers_are_ignored(percent: i32) {
        let db = db_from(&format!(
            "group g 1\ncp 100 100 weight 1\n\
             table t\nmul_cp {percent}\nuse_group g 100\n",
        ));
        let mut rng = StdRng::seed_from_u64(7);
        let drops = generate_loot(&db, "t", &mut rng);
        assert_eq!(drops, vec![LootDrop::Coins { qty: 100 }]);
    }

    #[test]
    fn mul_all_chances_composes_multiplicatively() {
        // Two 50% multipliers leave a 100% add at 25%.
        let db = db_from(
            "table t\nmul_all_chances 50\nmul_all_chances 50\nadd_cp 100 5 5\n",
        );
        let mut rng = StdRng::seed_from_u64(11);
        let mut hits = 0u32;
        for _ in 0..10_000 {
            if !generate_loot(&db, "t", &mut rng).is_empty() {
                hits += 1;
            }
        }
        let rate = f64::from(hits) / 10_000.0;
        assert!((0.20..=0.30).contains(&rate), "rate {rate} out of tolerance");
    }

    #[test]
    fn removed_items_and_groups_are_skipped() {
        let db = db_from(
            "group g 1\nitem 100 1 1 weight 1\n\
             table t\nremove_item 100\nremove_group g2\nuse_group g 100\nadd_item 100 100 1 1\n",
        );
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert!(generate_loot(&db, "t", &mut rng).is_empty());
        }
    }

    #[test]
    fn identical_drops_merge_by_summation() {
        let db = db_from(
            "table t\nadd_item 100 100 2 2\nadd_item 100 100 3 3\n",
        );
        let mut rng = StdRng::seed_from_u64(5);
        let drops = generate_loot(&db, "t", &mut rng);
        assert_eq!(
            drops,
            vec![LootDrop::Item { vnum: Vnum::new(100), qty: 5 }]
        );
    }

    #[test]
    fn distinct_drop_cap_holds() {
        // 100 distinct add_items at 100% would produce 100 drops; the
        // generator must stop at the cap.
        let mut text = String::from("table t\n");
        for vnum in 0..100 {
            text.push_str(&format!("add_item {} 100 1 1\n", 1000 + vnum));
        }
        let db = db_from(&text);
        let mut rng = StdRng::seed_from_u64(9);
        let drops = generate_loot(&db, "t", &mut rng);
        assert_eq!(drops.len(), MAX_LOOT_DROPS);
    }

    #[test]
    fn unknown_table_yields_nothing() {
        let db = db_from("table t\n");
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_loot(&db, "missing", &mut rng).is_empty());
    }
}
