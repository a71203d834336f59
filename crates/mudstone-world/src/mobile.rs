//! Mobile instances. NPCs and player characters share the structure; a
//! player character additionally carries a [`PlayerRecord`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use mudstone_types::{
    ColorMode, Flags, MobId, ObjId, Position, RoomId, Sex, Size, Vnum, WearSlot,
    WEAR_SLOT_MAX,
};

use crate::affect::Affect;

/// Quest progress, consulted by the mobprog quest checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestState {
    Open,
    Complete,
}

/// The persistent half of a player character.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// SHA-256 of the password, hex encoded.
    pub password_hash: String,
    /// Explicit trust override; 0 means "use level".
    pub trust: i16,
    pub title: String,
    pub prompt: String,
    pub wiznet: Flags,
    pub color: ColorMode,
    pub practices: i32,
    /// Seconds of play time from past sessions.
    pub played: i64,
    pub host: String,
    /// Quests by vnum.
    pub quests: Vec<(Vnum, QuestState)>,
    /// Timestamp of the newest note read per board.
    pub last_note: i64,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        PlayerRecord {
            password_hash: String::new(),
            trust: 0,
            title: String::new(),
            prompt: "<%hhp %mm %vmv> ".to_string(),
            wiznet: 0,
            color: ColorMode::Strip,
            practices: 5,
            played: 0,
            host: String::new(),
            quests: Vec::new(),
            last_note: 0,
        }
    }
}

/// A live mobile.
#[derive(Debug)]
pub struct Mobile {
    pub id: MobId,
    /// Prototype vnum; `None` for player characters.
    pub proto: Option<Vnum>,
    pub name: Arc<str>,
    pub short_descr: Arc<str>,
    pub long_descr: Arc<str>,
    pub description: Arc<str>,
    pub race: Arc<str>,
    pub class: Arc<str>,
    pub clan: Arc<str>,

    pub level: i16,
    pub sex: Sex,
    pub size: Size,
    pub alignment: i32,
    pub position: Position,
    pub default_pos: Position,

    pub hit: i32,
    pub max_hit: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub moves: i32,
    pub max_moves: i32,
    pub gold: i64,
    pub silver: i64,

    // Effective-stat cache maintained by affect_modify.
    pub hitroll: i32,
    pub damroll: i32,
    pub armor: i32,
    pub saving_throw: i32,

    pub act_flags: Flags,
    pub affect_flags: Flags,
    pub off_flags: Flags,
    pub imm_flags: Flags,
    pub res_flags: Flags,
    pub vuln_flags: Flags,
    pub comm_flags: Flags,

    pub room: Option<RoomId>,
    pub carrying: Vec<ObjId>,
    pub equipment: [Option<ObjId>; WEAR_SLOT_MAX],
    pub affects: Vec<Affect>,

    // Weak references, cleared when the referent is extracted.
    pub fighting: Option<MobId>,
    pub master: Option<MobId>,
    pub leader: Option<MobId>,
    pub reply: Option<MobId>,
    /// Furniture currently sat/rested on.
    pub on: Option<ObjId>,
    /// Remembered mobprog target (`mob remember`).
    pub mprog_target: Option<MobId>,
    /// Aggression memory: attackers this NPC remembers.
    pub memory: Vec<MobId>,

    /// Remaining mobprog delay in mobile-AI pulses; <= 0 disarmed.
    pub mprog_delay: i32,
    /// Command lag in pulses.
    pub wait: i32,
    /// Idle ticks, driving link-dead voiding and purge.
    pub timer: i32,

    pub player: Option<PlayerRecord>,
}

impl Mobile {
    pub fn is_npc(&self) -> bool {
        self.player.is_none()
    }

    /// Effective trust level for command gating.
    pub fn trust(&self) -> i16 {
        match &self.player {
            Some(p) if p.trust > 0 => p.trust,
            _ => self.level,
        }
    }

    pub fn is_immortal(&self) -> bool {
        self.trust() >= mudstone_types::LEVEL_IMMORTAL
    }

    pub fn is_good(&self) -> bool {
        self.alignment >= 350
    }

    pub fn is_evil(&self) -> bool {
        self.alignment <= -350
    }

    pub fn is_neutral(&self) -> bool {
        !self.is_good() && !self.is_evil()
    }

    pub fn hp_percent(&self) -> i32 {
        self.hit * 100 / self.max_hit.max(1)
    }

    /// Total coin value in silver.
    pub fn money(&self) -> i64 {
        self.silver + self.gold * 100
    }

    pub fn has_affect(&self, bit: Flags) -> bool {
        self.affect_flags & bit != 0
    }

    pub fn equipped(&self, slot: WearSlot) -> Option<ObjId> {
        self.equipment[slot.index()]
    }

    /// First keyword of the name list, for act messages.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("someone")
    }

    /// Matches a targeting keyword against the name list.
    pub fn answers_to(&self, keyword: &str) -> bool {
        is_name(keyword, &self.name)
    }

    pub fn quest_state(&self, quest: Vnum) -> Option<QuestState> {
        let player = self.player.as_ref()?;
        player
            .quests
            .iter()
            .find(|(v, _)| *v == quest)
            .map(|(_, s)| *s)
    }
}

/// Keyword matching: every word of `needle` must prefix-match some word of
/// `haystack`, case-insensitively. This is the targeting rule used across
/// the command surface.
pub fn is_name(needle: &str, haystack: &str) -> bool {
    if needle.trim().is_empty() {
        return false;
    }
    needle.split_whitespace().all(|part| {
        haystack
            .split_whitespace()
            .any(|word| word.len() >= part.len() && word[..part.len()].eq_ignore_ascii_case(part))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("guard", "cityguard guard", true)]
    #[test_case("gua", "cityguard guard", true)]
    #[test_case("guard city", "cityguard guard", true)]
    #[test_case("sword", "cityguard guard", false)]
    #[test_case("", "cityguard guard", false)]
    fn name_matching(needle: &str, haystack: &str, expected: bool) {
        assert_eq!(is_name(needle, haystack), expected);
    }

    #[test]
    fn hp_percent_guards_zero_max() {
        let mut mob = crate::sim::bare_mobile(MobId::new(1));
        mob.hit = 10;
        mob.max_hit = 0;
        assert_eq!(mob.hp_percent(), 1000);
    }
}
