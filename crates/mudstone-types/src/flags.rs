//! Flag-bit constants.
//!
//! Flags are stored as raw `i64` bitfields because the area-file format
//! encodes them with the letter alphabet (`A` = bit 0 … `Z` = bit 25,
//! `a` = bit 26 …) and builders OR arbitrary combinations together. The
//! named constants below cover the bits the simulation itself consults;
//! unknown bits are carried through load/save untouched.

/// Bitfield storage type for every flag word.
pub type Flags = i64;

/// Returns the bit value of one alphabet letter, or 0 for other bytes.
pub fn letter_bit(letter: char) -> Flags {
    match letter {
        'A'..='Z' => 1i64 << (letter as u32 - 'A' as u32),
        'a'..='z' => 1i64 << (letter as u32 - 'a' as u32 + 26),
        _ => 0,
    }
}

/// Tests a bit the way the C macros did.
pub fn has_bit(flags: Flags, bit: Flags) -> bool {
    flags & bit != 0
}

// Act flags (NPC behavior + player sanctions share the word, as in the
// original prototype format).
pub const ACT_IS_NPC: Flags = letter_a(0); // A
pub const ACT_SENTINEL: Flags = letter_a(1); // B: never wanders
pub const ACT_SCAVENGER: Flags = letter_a(2); // C
pub const ACT_AGGRESSIVE: Flags = letter_a(5); // F
pub const ACT_STAY_AREA: Flags = letter_a(6); // G
pub const ACT_WIMPY: Flags = letter_a(7); // H
pub const ACT_PET: Flags = letter_a(8); // I
pub const ACT_TRAIN: Flags = letter_a(9); // J
pub const ACT_PRACTICE: Flags = letter_a(10); // K

// Player-only act bits.
pub const PLR_AUTOLOOK: Flags = letter_a(1);
pub const PLR_COLOR: Flags = letter_a(4);
pub const PLR_HOLYLIGHT: Flags = letter_a(13);
pub const PLR_WIZINVIS: Flags = letter_a(14);
pub const PLR_FREEZE: Flags = letter_a(15);
pub const PLR_DENY: Flags = letter_a(16);
pub const PLR_LOG: Flags = letter_a(17);

// Affect bits.
pub const AFF_BLIND: Flags = letter_a(0);
pub const AFF_INVISIBLE: Flags = letter_a(1);
pub const AFF_DETECT_INVIS: Flags = letter_a(3);
pub const AFF_DETECT_HIDDEN: Flags = letter_a(5);
pub const AFF_SANCTUARY: Flags = letter_a(7);
pub const AFF_INFRARED: Flags = letter_a(8);
pub const AFF_CURSE: Flags = letter_a(9);
pub const AFF_POISON: Flags = letter_a(11);
pub const AFF_SNEAK: Flags = letter_a(14);
pub const AFF_HIDE: Flags = letter_a(15);
pub const AFF_CHARM: Flags = letter_a(17);
pub const AFF_FLYING: Flags = letter_a(18);
pub const AFF_PASS_DOOR: Flags = letter_a(19);
pub const AFF_HASTE: Flags = letter_a(20);
pub const AFF_PLAGUE: Flags = letter_a(22);
pub const AFF_REGENERATION: Flags = letter_a(24);

// Communication bits.
pub const COMM_QUIET: Flags = letter_a(0);
pub const COMM_DEAF: Flags = letter_a(1);
pub const COMM_NOEMOTE: Flags = letter_a(4);
pub const COMM_NOSHOUT: Flags = letter_a(5);
pub const COMM_NOTELL: Flags = letter_a(6);
pub const COMM_PROMPT: Flags = letter_a(11);
pub const COMM_COMBINE: Flags = letter_a(12);
pub const COMM_SNOOP_PROOF: Flags = letter_a(24);
pub const COMM_AFK: Flags = letter_a(25);

// Room flags.
pub const ROOM_DARK: Flags = letter_a(0);
pub const ROOM_NO_MOB: Flags = letter_a(2);
pub const ROOM_INDOORS: Flags = letter_a(3);
pub const ROOM_PRIVATE: Flags = letter_a(9);
pub const ROOM_SAFE: Flags = letter_a(10);
pub const ROOM_SOLITARY: Flags = letter_a(11);
pub const ROOM_NO_RECALL: Flags = letter_a(12);
pub const ROOM_LAW: Flags = letter_a(19);

// Exit flags (prototype reset state and instance state share these).
pub const EX_ISDOOR: Flags = letter_a(0);
pub const EX_CLOSED: Flags = letter_a(1);
pub const EX_LOCKED: Flags = letter_a(2);
pub const EX_PICKPROOF: Flags = letter_a(5);
pub const EX_NOPASS: Flags = letter_a(6);

// Object extra flags.
pub const ITEM_GLOW: Flags = letter_a(0);
pub const ITEM_HUM: Flags = letter_a(1);
pub const ITEM_INVIS: Flags = letter_a(4);
pub const ITEM_MAGIC: Flags = letter_a(5);
pub const ITEM_NODROP: Flags = letter_a(6);
pub const ITEM_ANTI_GOOD: Flags = letter_a(8);
pub const ITEM_ANTI_EVIL: Flags = letter_a(9);
pub const ITEM_NOREMOVE: Flags = letter_a(11);
pub const ITEM_INVENTORY: Flags = letter_a(12);
pub const ITEM_ROT_DEATH: Flags = letter_a(14);
pub const ITEM_ENCHANTED: Flags = letter_a(17);

// Object wear flags (where it may be worn, not where it is worn).
pub const WEAR_TAKE: Flags = letter_a(0);
pub const WEAR_FLAG_FINGER: Flags = letter_a(1);
pub const WEAR_FLAG_NECK: Flags = letter_a(2);
pub const WEAR_FLAG_BODY: Flags = letter_a(3);
pub const WEAR_FLAG_HEAD: Flags = letter_a(4);
pub const WEAR_FLAG_LEGS: Flags = letter_a(5);
pub const WEAR_FLAG_FEET: Flags = letter_a(6);
pub const WEAR_FLAG_HANDS: Flags = letter_a(7);
pub const WEAR_FLAG_ARMS: Flags = letter_a(8);
pub const WEAR_FLAG_SHIELD: Flags = letter_a(9);
pub const WEAR_FLAG_ABOUT: Flags = letter_a(10);
pub const WEAR_FLAG_WAIST: Flags = letter_a(11);
pub const WEAR_FLAG_WRIST: Flags = letter_a(12);
pub const WEAR_FLAG_WIELD: Flags = letter_a(13);
pub const WEAR_FLAG_HOLD: Flags = letter_a(14);
pub const WEAR_FLAG_FLOAT: Flags = letter_a(16);

// Wiznet subscription bits.
pub const WIZ_ON: Flags = letter_a(0);
pub const WIZ_PREFIX: Flags = letter_a(1);
pub const WIZ_LOGINS: Flags = letter_a(2);
pub const WIZ_SITES: Flags = letter_a(3);
pub const WIZ_LINKS: Flags = letter_a(4);
pub const WIZ_DEATHS: Flags = letter_a(5);
pub const WIZ_RESETS: Flags = letter_a(6);
pub const WIZ_MOBDEATHS: Flags = letter_a(7);
pub const WIZ_PENALTIES: Flags = letter_a(8);
pub const WIZ_SACCING: Flags = letter_a(9);
pub const WIZ_LEVELS: Flags = letter_a(10);
pub const WIZ_SECURE: Flags = letter_a(11);
pub const WIZ_SWITCHES: Flags = letter_a(12);
pub const WIZ_SNOOPS: Flags = letter_a(13);
pub const WIZ_RESTORE: Flags = letter_a(14);
pub const WIZ_LOAD: Flags = letter_a(15);
pub const WIZ_NEWBIE: Flags = letter_a(16);
pub const WIZ_SPAM: Flags = letter_a(18);
pub const WIZ_BUGS: Flags = letter_a(19);

/// `const fn` companion of [`letter_bit`] for building the tables above.
const fn letter_a(index: u32) -> Flags {
    1i64 << index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_bit_matches_alphabet_encoding() {
        assert_eq!(letter_bit('A'), 1);
        assert_eq!(letter_bit('B'), 2);
        assert_eq!(letter_bit('Z'), 1 << 25);
        assert_eq!(letter_bit('a'), 1 << 26);
        assert_eq!(letter_bit('d'), 1 << 29);
        assert_eq!(letter_bit('5'), 0);
    }

    #[test]
    fn named_bits_agree_with_letters() {
        assert_eq!(ACT_SENTINEL, letter_bit('B'));
        assert_eq!(AFF_HIDE, letter_bit('P'));
        assert_eq!(EX_LOCKED, letter_bit('C'));
        assert_eq!(WIZ_SECURE, letter_bit('L'));
    }
}
