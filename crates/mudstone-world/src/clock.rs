//! Game time and weather.
//!
//! The clock advances one hour per point tick. Weather is a tiny state
//! machine nudged by a pressure random walk; it exists for the weather
//! messages and the `hour` mobprog check.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Sky state, in worsening order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sky {
    #[default]
    Cloudless,
    Cloudy,
    Raining,
    Lightning,
}

/// In-game calendar and weather state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    pub hour: i32,
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub sky: Sky,
    pub pressure: i32,
    change: i32,
}

impl Default for GameClock {
    fn default() -> Self {
        GameClock {
            hour: 12,
            day: 0,
            month: 0,
            year: 1,
            sky: Sky::Cloudless,
            pressure: 1000,
            change: 0,
        }
    }
}

impl GameClock {
    /// Advances one game hour, updating weather. Returns a message to
    /// broadcast to outdoor players, if the weather changed.
    pub fn advance_hour<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&'static str> {
        self.hour += 1;
        if self.hour == 24 {
            self.hour = 0;
            self.day += 1;
        }
        if self.day >= 35 {
            self.day = 0;
            self.month += 1;
        }
        if self.month >= 17 {
            self.month = 0;
            self.year += 1;
        }

        // Pressure random walk, bounded.
        self.change += rng.gen_range(-12..=12);
        self.change = self.change.clamp(-12, 12);
        self.pressure = (self.pressure + self.change).clamp(960, 1040);

        let next = match self.sky {
            Sky::Cloudless if self.pressure < 990 => Some(Sky::Cloudy),
            Sky::Cloudy if self.pressure < 970 => Some(Sky::Raining),
            Sky::Raining if self.pressure < 965 => Some(Sky::Lightning),
            Sky::Raining if self.pressure > 1010 => Some(Sky::Cloudy),
            Sky::Lightning if self.pressure > 990 => Some(Sky::Raining),
            Sky::Cloudy if self.pressure > 1020 => Some(Sky::Cloudless),
            _ => None,
        }?;

        let msg = match (self.sky, next) {
            (_, Sky::Cloudy) if self.sky == Sky::Cloudless => "The sky is getting cloudy.",
            (_, Sky::Raining) if self.sky == Sky::Cloudy => "It starts to rain.",
            (_, Sky::Lightning) => "Lightning flashes in the sky.",
            (Sky::Raining, Sky::Cloudy) => "The rain stopped.",
            (_, Sky::Cloudless) => "The clouds disappear.",
            _ => "The weather shifts.",
        };
        self.sky = next;
        Some(msg)
    }

    pub fn is_dark(&self) -> bool {
        self.hour < 5 || self.hour >= 21
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn hours_wrap_into_days() {
        let mut clock = GameClock { hour: 23, ..GameClock::default() };
        let mut rng = StdRng::seed_from_u64(0);
        clock.advance_hour(&mut rng);
        assert_eq!(clock.hour, 0);
        assert_eq!(clock.day, 1);
    }

    #[test]
    fn pressure_stays_bounded() {
        let mut clock = GameClock::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            clock.advance_hour(&mut rng);
            assert!((960..=1040).contains(&clock.pressure));
        }
    }
}
