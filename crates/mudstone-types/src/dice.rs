//! Dice triples, as rolled by mob prototypes for hp/mana/damage.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A `number d size + bonus` dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dice {
    pub number: i32,
    pub size: i32,
    pub bonus: i32,
}

impl Dice {
    pub fn new(number: i32, size: i32, bonus: i32) -> Self {
        Dice { number, size, bonus }
    }

    /// Rolls the dice. Non-positive `number` or `size` contribute nothing
    /// beyond the bonus, so malformed prototypes stay harmless.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let mut total = self.bonus;
        if self.number > 0 && self.size > 0 {
            for _ in 0..self.number {
                total += rng.gen_range(1..=self.size);
            }
        }
        total
    }

    /// The lowest possible roll.
    pub fn min(&self) -> i32 {
        self.number.max(0) + self.bonus
    }

    /// The highest possible roll.
    pub fn max(&self) -> i32 {
        self.number.max(0) * self.size.max(0) + self.bonus
    }
}

impl std::fmt::Display for Dice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}+{}", self.number, self.size, self.bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn roll_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        let dice = Dice::new(3, 6, 10);
        for _ in 0..200 {
            let r = dice.roll(&mut rng);
            assert!(r >= dice.min() && r <= dice.max(), "roll {r} out of bounds");
        }
    }

    #[test]
    fn degenerate_dice_yield_bonus() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Dice::new(0, 6, 5).roll(&mut rng), 5);
        assert_eq!(Dice::new(2, 0, 7).roll(&mut rng), 7);
    }
}

#[cfg(test)]
mod properties {
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    proptest! {
        /// Any well-formed dice expression rolls inside its own bounds,
        /// whatever the RNG state.
        #[test]
        fn rolls_respect_min_and_max(
            number in 1i32..12,
            size in 1i32..20,
            bonus in -20i32..200,
            seed in any::<u64>(),
        ) {
            let dice = Dice { number, size, bonus };
            let mut rng = StdRng::seed_from_u64(seed);
            let roll = dice.roll(&mut rng);
            prop_assert!(roll >= dice.min());
            prop_assert!(roll <= dice.max());
        }
    }
}
