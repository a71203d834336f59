//! Closed enumerations shared across the simulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The six exit directions, in area-file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North = 0,
    East = 1,
    South = 2,
    West = 3,
    Up = 4,
    Down = 5,
}

/// Number of exit slots per room.
pub const DIR_MAX: usize = 6;

impl Direction {
    pub const ALL: [Direction; DIR_MAX] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    pub fn from_index(i: usize) -> Option<Direction> {
        Self::ALL.get(i).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// The reverse direction, used for inbound-exit consistency checks.
    pub fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }

    /// Matches a (possibly abbreviated) direction word.
    pub fn parse(word: &str) -> Option<Direction> {
        if word.is_empty() {
            return None;
        }
        let lower = word.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.name().starts_with(lower.as_str()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Door state of an exit instance (and of the `D` reset command).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorState {
    #[default]
    Open,
    Closed,
    Locked,
}

impl DoorState {
    /// Decodes the `D` reset argument: 0 open, 1 closed, 2 closed+locked.
    pub fn from_reset_arg(n: i32) -> Option<DoorState> {
        match n {
            0 => Some(DoorState::Open),
            1 => Some(DoorState::Closed),
            2 => Some(DoorState::Locked),
            _ => None,
        }
    }

    pub fn is_closed(self) -> bool {
        !matches!(self, DoorState::Open)
    }
}

/// Mobile position, ordered from worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Dead = 0,
    Mortal = 1,
    Incap = 2,
    Stunned = 3,
    Sleeping = 4,
    Resting = 5,
    Sitting = 6,
    Fighting = 7,
    #[default]
    Standing = 8,
}

impl Position {
    pub fn name(self) -> &'static str {
        match self {
            Position::Dead => "dead",
            Position::Mortal => "mortally wounded",
            Position::Incap => "incapacitated",
            Position::Stunned => "stunned",
            Position::Sleeping => "sleeping",
            Position::Resting => "resting",
            Position::Sitting => "sitting",
            Position::Fighting => "fighting",
            Position::Standing => "standing",
        }
    }

    pub fn parse(word: &str) -> Option<Position> {
        let lower = word.to_ascii_lowercase();
        [
            Position::Dead,
            Position::Mortal,
            Position::Incap,
            Position::Stunned,
            Position::Sleeping,
            Position::Resting,
            Position::Sitting,
            Position::Fighting,
            Position::Standing,
        ]
        .into_iter()
        .find(|p| p.name().starts_with(lower.as_str()))
    }

    pub fn is_awake(self) -> bool {
        self > Position::Sleeping
    }

    /// Area-file numeric encoding.
    pub fn from_number(n: i32) -> Option<Position> {
        match n {
            0 => Some(Position::Dead),
            1 => Some(Position::Mortal),
            2 => Some(Position::Incap),
            3 => Some(Position::Stunned),
            4 => Some(Position::Sleeping),
            5 => Some(Position::Resting),
            6 => Some(Position::Sitting),
            7 => Some(Position::Fighting),
            8 => Some(Position::Standing),
            _ => None,
        }
    }
}

/// Grammatical sex, with the pronoun set used by act/mobprog expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[default]
    Neutral = 0,
    Male = 1,
    Female = 2,
}

impl Sex {
    pub fn subjective(self) -> &'static str {
        match self {
            Sex::Neutral => "it",
            Sex::Male => "he",
            Sex::Female => "she",
        }
    }

    pub fn objective(self) -> &'static str {
        match self {
            Sex::Neutral => "it",
            Sex::Male => "him",
            Sex::Female => "her",
        }
    }

    pub fn possessive(self) -> &'static str {
        match self {
            Sex::Neutral => "its",
            Sex::Male => "his",
            Sex::Female => "her",
        }
    }

    pub fn from_number(n: i32) -> Sex {
        match n {
            1 => Sex::Male,
            2 => Sex::Female,
            _ => Sex::Neutral,
        }
    }
}

/// Room terrain, used by movement cost and weather messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    #[default]
    Inside = 0,
    City = 1,
    Field = 2,
    Forest = 3,
    Hills = 4,
    Mountain = 5,
    WaterSwim = 6,
    WaterNoSwim = 7,
    Unused = 8,
    Air = 9,
    Desert = 10,
}

impl Sector {
    pub fn from_number(n: i32) -> Sector {
        match n {
            1 => Sector::City,
            2 => Sector::Field,
            3 => Sector::Forest,
            4 => Sector::Hills,
            5 => Sector::Mountain,
            6 => Sector::WaterSwim,
            7 => Sector::WaterNoSwim,
            8 => Sector::Unused,
            9 => Sector::Air,
            10 => Sector::Desert,
            _ => Sector::Inside,
        }
    }
}

/// Object type, selecting the interpretation of the five value slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    #[default]
    Trash = 0,
    Light = 1,
    Weapon = 2,
    Armor = 3,
    Container = 4,
    DrinkContainer = 5,
    Food = 6,
    Money = 7,
    Key = 8,
    Furniture = 9,
    Corpse = 10,
    Fountain = 11,
    Potion = 12,
    Scroll = 13,
    Wand = 14,
}

impl ItemType {
    pub fn name(self) -> &'static str {
        match self {
            ItemType::Trash => "trash",
            ItemType::Light => "light",
            ItemType::Weapon => "weapon",
            ItemType::Armor => "armor",
            ItemType::Container => "container",
            ItemType::DrinkContainer => "drink",
            ItemType::Food => "food",
            ItemType::Money => "money",
            ItemType::Key => "key",
            ItemType::Furniture => "furniture",
            ItemType::Corpse => "corpse",
            ItemType::Fountain => "fountain",
            ItemType::Potion => "potion",
            ItemType::Scroll => "scroll",
            ItemType::Wand => "wand",
        }
    }

    pub fn parse(word: &str) -> Option<ItemType> {
        let lower = word.to_ascii_lowercase();
        [
            ItemType::Trash,
            ItemType::Light,
            ItemType::Weapon,
            ItemType::Armor,
            ItemType::Container,
            ItemType::DrinkContainer,
            ItemType::Food,
            ItemType::Money,
            ItemType::Key,
            ItemType::Furniture,
            ItemType::Corpse,
            ItemType::Fountain,
            ItemType::Potion,
            ItemType::Scroll,
            ItemType::Wand,
        ]
        .into_iter()
        .find(|t| t.name() == lower)
    }
}

/// Equipment slot. One object per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WearSlot {
    Light = 0,
    FingerLeft = 1,
    FingerRight = 2,
    Neck = 3,
    Body = 4,
    Head = 5,
    Legs = 6,
    Feet = 7,
    Hands = 8,
    Arms = 9,
    Shield = 10,
    About = 11,
    Waist = 12,
    WristLeft = 13,
    WristRight = 14,
    Wield = 15,
    Hold = 16,
    Float = 17,
}

/// Number of wear slots.
pub const WEAR_SLOT_MAX: usize = 18;

impl WearSlot {
    pub const ALL: [WearSlot; WEAR_SLOT_MAX] = [
        WearSlot::Light,
        WearSlot::FingerLeft,
        WearSlot::FingerRight,
        WearSlot::Neck,
        WearSlot::Body,
        WearSlot::Head,
        WearSlot::Legs,
        WearSlot::Feet,
        WearSlot::Hands,
        WearSlot::Arms,
        WearSlot::Shield,
        WearSlot::About,
        WearSlot::Waist,
        WearSlot::WristLeft,
        WearSlot::WristRight,
        WearSlot::Wield,
        WearSlot::Hold,
        WearSlot::Float,
    ];

    /// Decodes the `E` reset wear-location argument.
    pub fn from_number(n: i32) -> Option<WearSlot> {
        Self::ALL.get(usize::try_from(n).ok()?).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Mobile body size.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Tiny = 0,
    Small = 1,
    #[default]
    Medium = 2,
    Large = 3,
    Huge = 4,
    Giant = 5,
}

/// Damage classification for resist/immune/vulnerable lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    #[default]
    None = 0,
    Bash = 1,
    Pierce = 2,
    Slash = 3,
    Fire = 4,
    Cold = 5,
    Lightning = 6,
    Acid = 7,
    Poison = 8,
    Negative = 9,
    Holy = 10,
    Energy = 11,
    Mental = 12,
}

impl DamageType {
    pub fn from_number(n: i32) -> DamageType {
        match n {
            1 => DamageType::Bash,
            2 => DamageType::Pierce,
            3 => DamageType::Slash,
            4 => DamageType::Fire,
            5 => DamageType::Cold,
            6 => DamageType::Lightning,
            7 => DamageType::Acid,
            8 => DamageType::Poison,
            9 => DamageType::Negative,
            10 => DamageType::Holy,
            11 => DamageType::Energy,
            12 => DamageType::Mental,
            _ => DamageType::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("n", Some(Direction::North))]
    #[test_case("dow", Some(Direction::Down))]
    #[test_case("EAST", Some(Direction::East))]
    #[test_case("q", None)]
    #[test_case("", None)]
    fn direction_parse(input: &str, expected: Option<Direction>) {
        assert_eq!(Direction::parse(input), expected);
    }

    #[test]
    fn direction_reverse_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.reverse().reverse(), d);
        }
    }

    #[test]
    fn position_ordering_matches_severity() {
        assert!(Position::Dead < Position::Stunned);
        assert!(Position::Sleeping < Position::Resting);
        assert!(!Position::Sleeping.is_awake());
        assert!(Position::Resting.is_awake());
    }

    #[test_case(0, Some(DoorState::Open))]
    #[test_case(1, Some(DoorState::Closed))]
    #[test_case(2, Some(DoorState::Locked))]
    #[test_case(3, None)]
    fn door_state_reset_decode(arg: i32, expected: Option<DoorState>) {
        assert_eq!(DoorState::from_reset_arg(arg), expected);
    }

    #[test]
    fn wear_slot_from_number_round_trips() {
        for slot in WearSlot::ALL {
            assert_eq!(WearSlot::from_number(slot.index() as i32), Some(slot));
        }
        assert_eq!(WearSlot::from_number(99), None);
    }
}
