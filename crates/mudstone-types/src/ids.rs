//! Entity identifiers.
//!
//! Prototypes are named by a stable `Vnum` that survives restarts and is
//! what area files and scripts refer to. Live instances get a process-local
//! 64-bit runtime id at creation; runtime ids are never reused within a
//! process and are what weak references hold.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Virtual number: the stable identifier of a prototype.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Vnum(pub i32);

impl Vnum {
    /// The "no vnum" sentinel used by reset commands and loot entries.
    pub const NONE: Vnum = Vnum(0);

    pub fn new(n: i32) -> Self {
        Vnum(n)
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn is_none(self) -> bool {
        self.0 <= 0
    }
}

impl fmt::Display for Vnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Vnum {
    fn from(n: i32) -> Self {
        Vnum(n)
    }
}

macro_rules! runtime_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(n: u64) -> Self {
                $name(n)
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

runtime_id!(
    /// Runtime id of a live mobile (NPC or player character).
    MobId
);
runtime_id!(
    /// Runtime id of a live object instance.
    ObjId
);
runtime_id!(
    /// Runtime id of a live room instance.
    RoomId
);
runtime_id!(
    /// Runtime id of a live area instance.
    AreaId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vnum_none_is_nonpositive() {
        assert!(Vnum::NONE.is_none());
        assert!(Vnum::new(-3).is_none());
        assert!(!Vnum::new(3001).is_none());
    }

    #[test]
    fn runtime_ids_are_distinct_types() {
        let m = MobId::new(7);
        let o = ObjId::new(7);
        // Same payload, different type; equality across types must not compile,
        // so just confirm payload round-trip here.
        assert_eq!(m.get(), o.get());
    }

    #[test]
    fn vnum_serde_is_transparent() {
        let v = Vnum::new(3001);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "3001");
        let back: Vnum = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
