//! Timed modifiers on mobiles and objects.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mudstone_types::Flags;

/// Which flag word an affect's bitvector applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectWhere {
    /// The mobile's affect bits.
    #[default]
    Affects,
    Immune,
    Resist,
    Vuln,
    /// Object extra flags (for enchantments).
    ObjectFlags,
    /// Weapon flags.
    WeaponFlags,
}

/// The stat slot an affect's modifier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectLocation {
    #[default]
    None,
    Strength,
    Dexterity,
    Intelligence,
    Wisdom,
    Constitution,
    Hitroll,
    Damroll,
    Armor,
    Hp,
    Mana,
    Move,
    SavingThrow,
}

/// One affect: origin skill, stat delta, flag delta, remaining duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affect {
    /// Name of the originating skill or spell.
    pub skill: Arc<str>,
    pub where_: AffectWhere,
    pub location: AffectLocation,
    pub modifier: i32,
    /// Remaining duration in ticks; -1 is permanent.
    pub duration: i32,
    pub level: i16,
    /// Bits applied to the `where_` word while the affect is present.
    pub bitvector: Flags,
}

impl Affect {
    pub fn is_permanent(&self) -> bool {
        self.duration < 0
    }

    /// Merges a joining affect into this one: durations add, levels
    /// average. Used when the same skill is applied twice.
    pub fn join(&mut self, other: &Affect) {
        self.level = (i32::from(self.level) + i32::from(other.level) / 2) as i16;
        if !self.is_permanent() && !other.is_permanent() {
            self.duration += other.duration;
        }
        self.modifier += other.modifier;
        self.bitvector |= other.bitvector;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affect(skill: &str, duration: i32, level: i16, modifier: i32) -> Affect {
        Affect {
            skill: skill.into(),
            where_: AffectWhere::Affects,
            location: AffectLocation::Hitroll,
            modifier,
            duration,
            level,
            bitvector: 0,
        }
    }

    #[test]
    fn join_sums_duration_and_averages_level() {
        let mut a = affect("bless", 10, 20, 2);
        a.join(&affect("bless", 6, 10, 1));
        assert_eq!(a.duration, 16);
        assert_eq!(a.level, 25);
        assert_eq!(a.modifier, 3);
    }

    #[test]
    fn join_keeps_permanent_duration() {
        let mut a = affect("sanctuary", -1, 50, 0);
        a.join(&affect("sanctuary", 12, 50, 0));
        assert!(a.is_permanent());
    }
}
