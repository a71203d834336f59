//! Player files: one line-oriented key/value file per character under
//! `players/<letter>/<Name>`. Saves are temp-then-rename so a crash
//! mid-save preserves the previous file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use mudstone_types::{ColorMode, Flags, Position, Sex, Vnum};
use mudstone_world::{Affect, AffectWhere, PlayerRecord, QuestState};

use crate::error::{AreaError, AreaResult};
use crate::lexer::Lexer;
use crate::load::{affect_location, affect_location_word};

/// The persisted state of one player character.
#[derive(Debug, Clone)]
pub struct PlayerFile {
    pub name: String,
    pub record: PlayerRecord,
    pub level: i16,
    pub race: String,
    pub class: String,
    pub sex: Sex,
    pub position: Position,
    pub hit: i32,
    pub max_hit: i32,
    pub mana: i32,
    pub max_mana: i32,
    pub moves: i32,
    pub max_moves: i32,
    pub gold: i64,
    pub silver: i64,
    pub alignment: i32,
    pub room_vnum: Vnum,
    pub act_flags: Flags,
    pub comm_flags: Flags,
    pub affects: Vec<Affect>,
}

impl PlayerFile {
    pub fn new(name: &str) -> Self {
        PlayerFile {
            name: name.to_string(),
            record: PlayerRecord::default(),
            level: 1,
            race: "human".to_string(),
            class: "warrior".to_string(),
            sex: Sex::Neutral,
            position: Position::Standing,
            hit: 20,
            max_hit: 20,
            mana: 100,
            max_mana: 100,
            moves: 100,
            max_moves: 100,
            gold: 0,
            silver: 0,
            alignment: 0,
            room_vnum: Vnum::NONE,
            act_flags: 0,
            comm_flags: 0,
            affects: Vec::new(),
        }
    }
}

/// The on-disk path for a character name: `players/a/Alara`.
pub fn player_path(player_dir: &Path, name: &str) -> PathBuf {
    let letter = name
        .chars()
        .next()
        .map_or('x', |c| c.to_ascii_lowercase());
    player_dir.join(letter.to_string()).join(capitalize(name))
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Saves a player file atomically.
pub fn save_player(player_dir: &Path, file: &PlayerFile) -> AreaResult<()> {
    let path = player_path(player_dir, &file.name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AreaError::io(parent, e))?;
    }
    let rendered = render_player(file);
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, rendered).map_err(|e| AreaError::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| AreaError::io(&path, e))?;
    Ok(())
}

/// Loads a player file; `Ok(None)` when the character does not exist.
pub fn load_player(player_dir: &Path, name: &str) -> AreaResult<Option<PlayerFile>> {
    let path = player_path(player_dir, name);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(AreaError::io(&path, e)),
    };
    parse_player(&text).map(Some)
}

fn render_player(file: &PlayerFile) -> String {
    use std::fmt::Write as _;

    let mut out = String::from("#PLAYER\n");
    let _ = writeln!(out, "Name {}~", file.name);
    let _ = writeln!(out, "Pass {}~", file.record.password_hash);
    let _ = writeln!(out, "Level {}", file.level);
    let _ = writeln!(out, "Trust {}", file.record.trust);
    let _ = writeln!(out, "Race {}~", file.race);
    let _ = writeln!(out, "Class {}~", file.class);
    let _ = writeln!(out, "Sex {}", file.sex as i32);
    let _ = writeln!(out, "Position {}", file.position as i32);
    let _ = writeln!(
        out,
        "Vitals {} {} {} {} {} {}",
        file.hit, file.max_hit, file.mana, file.max_mana, file.moves, file.max_moves
    );
    let _ = writeln!(out, "Coins {} {}", file.gold, file.silver);
    let _ = writeln!(out, "Align {}", file.alignment);
    let _ = writeln!(out, "Room {}", file.room_vnum);
    let _ = writeln!(out, "Acts {} {}", file.act_flags, file.comm_flags);
    let _ = writeln!(out, "Title {}~", file.record.title);
    let _ = writeln!(out, "Prompt {}~", file.record.prompt);
    let _ = writeln!(out, "Wiznet {}", file.record.wiznet);
    let color = match file.record.color {
        ColorMode::Ansi => "ansi",
        ColorMode::Strip => "strip",
    };
    let _ = writeln!(out, "Color {color}");
    let _ = writeln!(out, "Practices {}", file.record.practices);
    let _ = writeln!(out, "Played {}", file.record.played);
    let _ = writeln!(out, "Host {}~", file.record.host);
    let _ = writeln!(out, "LastNote {}", file.record.last_note);
    for (vnum, state) in &file.record.quests {
        let word = match state {
            QuestState::Open => "open",
            QuestState::Complete => "complete",
        };
        let _ = writeln!(out, "Quest {vnum} {word}");
    }
    for affect in &file.affects {
        let _ = writeln!(
            out,
            "Affect {}~ {} {} {} {} {} {}",
            affect.skill,
            affect_where_word(affect.where_),
            affect_location_word(affect.location),
            affect.modifier,
            affect.duration,
            affect.level,
            affect.bitvector
        );
    }
    out.push_str("End\n");
    out
}

fn parse_player(text: &str) -> AreaResult<PlayerFile> {
    let mut lex = Lexer::new(text);
    let header = lex.word()?;
    if header != "#PLAYER" {
        return Err(AreaError::Malformed {
            section: "PLAYER",
            line: lex.line(),
            detail: format!("bad header '{header}'"),
        });
    }

    let mut file = PlayerFile::new("");
    loop {
        let key = lex.word()?.to_string();
        match key.as_str() {
            "End" => break,
            "Name" => file.name = lex.tilde_string()?,
            "Pass" => file.record.password_hash = lex.tilde_string()?,
            "Level" => file.level = lex.number()? as i16,
            "Trust" => file.record.trust = lex.number()? as i16,
            "Race" => file.race = lex.tilde_string()?,
            "Class" => file.class = lex.tilde_string()?,
            "Sex" => file.sex = Sex::from_number(lex.number()?),
            "Position" => {
                file.position =
                    Position::from_number(lex.number()?).unwrap_or(Position::Standing);
            }
            "Vitals" => {
                file.hit = lex.number()?;
                file.max_hit = lex.number()?;
                file.mana = lex.number()?;
                file.max_mana = lex.number()?;
                file.moves = lex.number()?;
                file.max_moves = lex.number()?;
            }
            "Coins" => {
                file.gold = i64::from(lex.number()?);
                file.silver = i64::from(lex.number()?);
            }
            "Align" => file.alignment = lex.number()?,
            "Room" => file.room_vnum = Vnum::new(lex.number()?),
            "Acts" => {
                file.act_flags = lex.flag()?;
                file.comm_flags = lex.flag()?;
            }
            "Title" => file.record.title = lex.tilde_string()?,
            "Prompt" => file.record.prompt = lex.tilde_string()?,
            "Wiznet" => file.record.wiznet = lex.flag()?,
            "Color" => {
                file.record.color = match lex.word()? {
                    "ansi" => ColorMode::Ansi,
                    _ => ColorMode::Strip,
                };
            }
            "Practices" => file.record.practices = lex.number()?,
            "Played" => file.record.played = i64::from(lex.number()?),
            "Host" => file.record.host = lex.tilde_string()?,
            "LastNote" => file.record.last_note = i64::from(lex.number()?),
            "Quest" => {
                let vnum = Vnum::new(lex.number()?);
                let state = match lex.word()? {
                    "complete" => QuestState::Complete,
                    _ => QuestState::Open,
                };
                file.record.quests.push((vnum, state));
            }
            "Affect" => {
                let skill = lex.tilde_string()?;
                let where_ = affect_where(lex.word()?);
                let location = affect_location(lex.word()?);
                let modifier = lex.number()?;
                let duration = lex.number()?;
                let level = lex.number()? as i16;
                let bitvector = lex.flag()?;
                file.affects.push(Affect {
                    skill: skill.into(),
                    where_,
                    location,
                    modifier,
                    duration,
                    level,
                    bitvector,
                });
            }
            other => {
                // Unknown keys are skipped so old servers can read newer
                // files; the skip assumes a one-line value.
                warn!(target: "bug", key = other, "player file: unknown key");
                lex.to_eol();
            }
        }
    }

    if file.name.is_empty() {
        return Err(AreaError::Malformed {
            section: "PLAYER",
            line: lex.line(),
            detail: "player file missing Name".to_string(),
        });
    }
    Ok(file)
}

fn affect_where_word(where_: AffectWhere) -> &'static str {
    match where_ {
        AffectWhere::Affects => "affects",
        AffectWhere::Immune => "immune",
        AffectWhere::Resist => "resist",
        AffectWhere::Vuln => "vuln",
        AffectWhere::ObjectFlags => "object",
        AffectWhere::WeaponFlags => "weapon",
    }
}

fn affect_where(word: &str) -> AffectWhere {
    match word {
        "immune" => AffectWhere::Immune,
        "resist" => AffectWhere::Resist,
        "vuln" => AffectWhere::Vuln,
        "object" => AffectWhere::ObjectFlags,
        "weapon" => AffectWhere::WeaponFlags,
        _ => AffectWhere::Affects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mudstone_world::AffectLocation;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = PlayerFile::new("Alara");
        file.level = 24;
        file.record.password_hash = "ab12".to_string();
        file.record.title = "the Unseen".to_string();
        file.record.quests.push((Vnum::new(9001), QuestState::Open));
        file.room_vnum = Vnum::new(3001);
        file.affects.push(Affect {
            skill: "sanctuary".into(),
            where_: AffectWhere::Affects,
            location: AffectLocation::None,
            modifier: 0,
            duration: 12,
            level: 24,
            bitvector: mudstone_types::AFF_SANCTUARY,
        });

        save_player(dir.path(), &file).unwrap();
        let loaded = load_player(dir.path(), "alara").unwrap().unwrap();
        assert_eq!(loaded.name, "Alara");
        assert_eq!(loaded.level, 24);
        assert_eq!(loaded.record.title, "the Unseen");
        assert_eq!(loaded.record.quests, vec![(Vnum::new(9001), QuestState::Open)]);
        assert_eq!(loaded.affects.len(), 1);
        assert_eq!(loaded.affects[0].duration, 12);
    }

    #[test]
    fn unknown_player_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_player(dir.path(), "Nobody").unwrap().is_none());
    }

    #[test]
    fn path_is_bucketed_by_first_letter() {
        let path = player_path(Path::new("players"), "alara");
        assert_eq!(path, Path::new("players").join("a").join("Alara"));
    }
}
