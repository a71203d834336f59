//! Area file parsing: section dispatch and per-section loaders.
//!
//! A malformed section is fatal to the load (and, at boot, to the boot).
//! Recoverable inconsistencies — an exit destination that never loads, a
//! reset naming a missing prototype — are handled later: exits are fixed
//! up after every area has loaded, and the reset engine logs and skips.

use tracing::warn;

use mudstone_types::{DamageType, Direction, ItemType, Position, Sector, Sex, Size, Vnum};
use mudstone_world::{
    Affect, AffectLocation, AffectWhere, AreaProto, ExitProto, ExtraDesc, InstancePolicy,
    MobProgScript, MobProto, ObjProto, ProgTrigger, Registry, Reset, RoomProto, ShopData,
    TriggerKind,
};

use crate::error::{AreaError, AreaResult};
use crate::intern::Interner;
use crate::lexer::{parse_dice, Lexer};

/// One `#HELPS` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    /// Minimum trust to see the entry; -1 entries show before login.
    pub level: i32,
    pub keywords: String,
    pub text: String,
}

/// Everything parsed from one area file, before registration.
#[derive(Debug, Default)]
pub struct LoadedArea {
    pub area: Option<AreaProto>,
    pub rooms: Vec<RoomProto>,
    pub mobiles: Vec<MobProto>,
    pub objects: Vec<ObjProto>,
    pub progs: Vec<MobProgScript>,
    pub helps: Vec<HelpEntry>,
    /// Raw `#LOOT` section text, handed to the loot engine.
    pub loot_text: String,
}

impl LoadedArea {
    /// Registers every prototype into the registry. Duplicate vnums are
    /// logged by the registry and skipped.
    pub fn register(self, registry: &mut Registry) -> Option<Vnum> {
        let key = self.area.as_ref().map(|a| a.min_vnum);
        if let Some(area) = self.area {
            registry.insert_area(area);
        }
        for room in self.rooms {
            registry.insert_room(room);
        }
        for mob in self.mobiles {
            registry.insert_mob(mob);
        }
        for object in self.objects {
            registry.insert_object(object);
        }
        for prog in self.progs {
            registry.insert_prog(prog);
        }
        key
    }
}

/// Parses one complete area file.
pub fn parse_area(text: &str, file_name: &str) -> AreaResult<LoadedArea> {
    let mut lex = Lexer::new(text);
    let mut loaded = LoadedArea::default();
    let mut interner = Interner::new();
    let mut resets: Vec<Reset> = Vec::new();
    let mut shops: Vec<(Vnum, ShopData)> = Vec::new();
    let mut specials: Vec<(Vnum, String)> = Vec::new();

    loop {
        if lex.at_eof() {
            break;
        }
        let hash = lex.letter()?;
        if hash != '#' {
            // Stray text between sections is tolerated, as the original
            // loader tolerated comments.
            lex.to_eol();
            continue;
        }
        let section = lex.word()?.to_string();
        match section.as_str() {
            "$" => break,
            "AREADATA" => loaded.area = Some(parse_areadata(&mut lex, file_name)?),
            "MOBILES" => parse_mobiles(&mut lex, &mut loaded.mobiles, &mut interner)?,
            "OBJECTS" => parse_objects(&mut lex, &mut loaded.objects, &mut interner)?,
            "ROOMS" => parse_rooms(&mut lex, &mut loaded.rooms, &mut interner)?,
            "RESETS" => parse_resets(&mut lex, &mut resets)?,
            "SHOPS" => parse_shops(&mut lex, &mut shops)?,
            "SPECIALS" => parse_specials(&mut lex, &mut specials)?,
            "MOBPROGS" => parse_mobprogs(&mut lex, &mut loaded.progs)?,
            "HELPS" => parse_helps(&mut lex, &mut loaded.helps)?,
            "LOOT" => {
                lex.to_eol();
                loaded.loot_text = lex.raw_until_line("#ENDLOOT")?;
            }
            other => {
                return Err(AreaError::UnknownSection {
                    section: other.to_string(),
                    line: lex.line(),
                })
            }
        }
    }

    attach_resets(&mut loaded, resets, file_name);
    attach_shops(&mut loaded, shops, file_name);
    attach_specials(&mut loaded, specials, file_name);
    Ok(loaded)
}

fn parse_areadata(lex: &mut Lexer<'_>, file_name: &str) -> AreaResult<AreaProto> {
    let mut name = String::new();
    let mut builders = String::from("None");
    let mut credits = String::new();
    let mut min_vnum = Vnum::NONE;
    let mut max_vnum = Vnum::NONE;
    let mut security = 9;
    // 0 means "unset"; the server substitutes its configured default.
    let mut reset_interval = 0;
    let mut instance_policy = InstancePolicy::Singleton;

    loop {
        let key = lex.word()?.to_string();
        match key.as_str() {
            "Name" => name = lex.tilde_string()?,
            "Builders" => builders = lex.tilde_string()?,
            "Credits" => credits = lex.tilde_string()?,
            "VNUMs" => {
                min_vnum = Vnum::new(lex.number()?);
                max_vnum = Vnum::new(lex.number()?);
            }
            "Security" => security = lex.number()?,
            "Reset" => reset_interval = lex.number()?.max(0) as u32,
            "Instance" => {
                let word = lex.word()?;
                instance_policy = match word {
                    "singleton" => InstancePolicy::Singleton,
                    "per_player" => InstancePolicy::PerPlayer,
                    other => {
                        return Err(AreaError::Malformed {
                            section: "AREADATA",
                            line: lex.line(),
                            detail: format!("bad instance policy '{other}'"),
                        })
                    }
                };
            }
            "End" => break,
            other => {
                return Err(AreaError::Malformed {
                    section: "AREADATA",
                    line: lex.line(),
                    detail: format!("unknown key '{other}'"),
                })
            }
        }
    }

    if min_vnum.is_none() || max_vnum.get() < min_vnum.get() {
        return Err(AreaError::Malformed {
            section: "AREADATA",
            line: lex.line(),
            detail: "missing or inverted VNUMs range".to_string(),
        });
    }

    Ok(AreaProto {
        name: name.into(),
        file_name: file_name.into(),
        credits: credits.into(),
        min_vnum,
        max_vnum,
        builders: builders.into(),
        security,
        reset_interval,
        instance_policy,
    })
}

/// Reads the `#<vnum>` header shared by mob/object/room/prog entries;
/// `#0` ends the section.
fn entry_vnum(lex: &mut Lexer<'_>, section: &'static str) -> AreaResult<Option<Vnum>> {
    let hash = lex.letter()?;
    if hash != '#' {
        return Err(AreaError::Malformed {
            section,
            line: lex.line(),
            detail: format!("expected '#', found '{hash}'"),
        });
    }
    let number = lex.number()?;
    if number == 0 {
        return Ok(None);
    }
    Ok(Some(Vnum::new(number)))
}

fn parse_mobiles(
    lex: &mut Lexer<'_>,
    out: &mut Vec<MobProto>,
    interner: &mut Interner,
) -> AreaResult<()> {
    while let Some(vnum) = entry_vnum(lex, "MOBILES")? {
        let name = lex.tilde_string()?;
        let short_descr = lex.tilde_string()?;
        let long_descr = lex.tilde_string()?;
        let description = lex.tilde_string()?;
        let race = lex.tilde_string()?;

        let act_flags = lex.flag()?;
        let affect_flags = lex.flag()?;
        let alignment = lex.number()?;
        let group = lex.number()?;

        let level = lex.number()? as i16;
        let hitroll = lex.number()?;
        let dice_line = lex.line();
        let hit = parse_dice(lex.word()?, dice_line)?;
        let mana = parse_dice(lex.word()?, dice_line)?;
        let damage = parse_dice(lex.word()?, dice_line)?;
        let dam_type = DamageType::from_number(lex.number()?);

        let armor = [lex.number()?, lex.number()?, lex.number()?, lex.number()?];

        let off_flags = lex.flag()?;
        let imm_flags = lex.flag()?;
        let res_flags = lex.flag()?;
        let vuln_flags = lex.flag()?;

        let start_pos = Position::from_number(lex.number()?).unwrap_or(Position::Standing);
        let default_pos = Position::from_number(lex.number()?).unwrap_or(Position::Standing);
        let sex = Sex::from_number(lex.number()?);
        let wealth = i64::from(lex.number()?);

        let form_flags = lex.flag()?;
        let part_flags = lex.flag()?;
        let size = size_from_number(lex.number()?);
        let material = lex.tilde_string()?;

        let mut mob = MobProto {
            vnum,
            name: name.into(),
            short_descr: short_descr.into(),
            long_descr: long_descr.into(),
            description: description.into(),
            race: interner.intern(&race),
            act_flags,
            affect_flags,
            off_flags,
            imm_flags,
            res_flags,
            vuln_flags,
            form_flags,
            part_flags,
            alignment,
            group,
            level,
            hitroll,
            hit,
            mana,
            damage,
            dam_type,
            armor,
            start_pos,
            default_pos,
            sex,
            wealth,
            size,
            material: interner.intern(&material),
            mprogs: Vec::new(),
            shop: None,
            spec_fun: None,
            loot_table: None,
        };

        // Optional rider lines: T (mobprog trigger), L (loot table).
        loop {
            match lex.peek_nonws() {
                Some('#') | None => break,
                Some('T') => {
                    lex.letter()?;
                    let kind_word = lex.word()?.to_string();
                    let Some(kind) = TriggerKind::parse(&kind_word) else {
                        return Err(AreaError::Malformed {
                            section: "MOBILES",
                            line: lex.line(),
                            detail: format!("unknown trigger '{kind_word}'"),
                        });
                    };
                    let prog = Vnum::new(lex.number()?);
                    let phrase = lex.tilde_string()?;
                    mob.mprogs.push(ProgTrigger {
                        kind,
                        prog,
                        phrase: phrase.into(),
                    });
                }
                Some('L') => {
                    lex.letter()?;
                    mob.loot_table = Some(lex.tilde_string()?.into());
                }
                Some(other) => {
                    return Err(AreaError::Malformed {
                        section: "MOBILES",
                        line: lex.line(),
                        detail: format!("unexpected '{other}' in mobile entry"),
                    })
                }
            }
        }
        out.push(mob);
    }
    Ok(())
}

fn size_from_number(n: i32) -> Size {
    match n {
        0 => Size::Tiny,
        1 => Size::Small,
        3 => Size::Large,
        4 => Size::Huge,
        5 => Size::Giant,
        _ => Size::Medium,
    }
}

fn parse_objects(
    lex: &mut Lexer<'_>,
    out: &mut Vec<ObjProto>,
    interner: &mut Interner,
) -> AreaResult<()> {
    while let Some(vnum) = entry_vnum(lex, "OBJECTS")? {
        let name = lex.tilde_string()?;
        let short_descr = lex.tilde_string()?;
        let description = lex.tilde_string()?;
        let material = lex.tilde_string()?;

        let type_line = lex.line();
        let type_word = lex.word()?.to_string();
        let Some(item_type) = ItemType::parse(&type_word) else {
            return Err(AreaError::Malformed {
                section: "OBJECTS",
                line: type_line,
                detail: format!("unknown item type '{type_word}'"),
            });
        };
        let extra_flags = lex.flag()?;
        let wear_flags = lex.flag()?;

        let values = [
            lex.number()?,
            lex.number()?,
            lex.number()?,
            lex.number()?,
            lex.number()?,
        ];
        let level = lex.number()? as i16;
        let weight = lex.number()?;
        let cost = lex.number()?;
        let condition = lex.number()?;

        let mut object = ObjProto {
            vnum,
            name: name.into(),
            short_descr: short_descr.into(),
            description: description.into(),
            material: interner.intern(&material),
            item_type,
            extra_flags,
            wear_flags,
            values,
            weight,
            cost,
            condition,
            level,
            affects: Vec::new(),
            extra_descs: Vec::new(),
        };

        // Rider lines: A (affect), E (extra description).
        loop {
            match lex.peek_nonws() {
                Some('#') | None => break,
                Some('A') => {
                    lex.letter()?;
                    let location = affect_location(lex.word()?);
                    let modifier = lex.number()?;
                    object.affects.push(Affect {
                        skill: "none".into(),
                        where_: AffectWhere::Affects,
                        location,
                        modifier,
                        duration: -1,
                        level,
                        bitvector: 0,
                    });
                }
                Some('E') => {
                    lex.letter()?;
                    let keyword = lex.tilde_string()?;
                    let description = lex.tilde_string()?;
                    object.extra_descs.push(ExtraDesc {
                        keyword: keyword.into(),
                        description: description.into(),
                    });
                }
                Some(other) => {
                    return Err(AreaError::Malformed {
                        section: "OBJECTS",
                        line: lex.line(),
                        detail: format!("unexpected '{other}' in object entry"),
                    })
                }
            }
        }
        out.push(object);
    }
    Ok(())
}

/// Maps an affect-location word from the file to the typed location.
pub fn affect_location(word: &str) -> AffectLocation {
    match word.to_ascii_lowercase().as_str() {
        "str" => AffectLocation::Strength,
        "dex" => AffectLocation::Dexterity,
        "int" => AffectLocation::Intelligence,
        "wis" => AffectLocation::Wisdom,
        "con" => AffectLocation::Constitution,
        "hitroll" => AffectLocation::Hitroll,
        "damroll" => AffectLocation::Damroll,
        "armor" | "ac" => AffectLocation::Armor,
        "hp" => AffectLocation::Hp,
        "mana" => AffectLocation::Mana,
        "move" => AffectLocation::Move,
        "saves" | "saving" => AffectLocation::SavingThrow,
        _ => AffectLocation::None,
    }
}

/// Inverse of [`affect_location`], for the persister.
pub fn affect_location_word(location: AffectLocation) -> &'static str {
    match location {
        AffectLocation::Strength => "str",
        AffectLocation::Dexterity => "dex",
        AffectLocation::Intelligence => "int",
        AffectLocation::Wisdom => "wis",
        AffectLocation::Constitution => "con",
        AffectLocation::Hitroll => "hitroll",
        AffectLocation::Damroll => "damroll",
        AffectLocation::Armor => "armor",
        AffectLocation::Hp => "hp",
        AffectLocation::Mana => "mana",
        AffectLocation::Move => "move",
        AffectLocation::SavingThrow => "saves",
        AffectLocation::None => "none",
    }
}

fn parse_rooms(
    lex: &mut Lexer<'_>,
    out: &mut Vec<RoomProto>,
    interner: &mut Interner,
) -> AreaResult<()> {
    while let Some(vnum) = entry_vnum(lex, "ROOMS")? {
        let name = lex.tilde_string()?;
        let description = lex.tilde_string()?;
        let _area_number = lex.number()?; // historical, always 0
        let room_flags = lex.flag()?;
        let sector = Sector::from_number(lex.number()?);

        let mut room = RoomProto {
            vnum,
            name: name.into(),
            description: description.into(),
            sector,
            room_flags,
            exits: Default::default(),
            extra_descs: Vec::new(),
            resets: Vec::new(),
        };

        loop {
            let letter = lex.letter()?;
            match letter {
                'S' => break,
                'D' => {
                    let dir_line = lex.line();
                    let dir_number = lex.number()?;
                    let Some(direction) = usize::try_from(dir_number)
                        .ok()
                        .and_then(Direction::from_index)
                    else {
                        return Err(AreaError::Malformed {
                            section: "ROOMS",
                            line: dir_line,
                            detail: format!("bad exit direction {dir_number}"),
                        });
                    };
                    let exit_description = lex.tilde_string()?;
                    let keyword = lex.tilde_string()?;
                    let exit_flags = lex.flag()?;
                    let key = Vnum::new(lex.number()?);
                    let to_vnum = Vnum::new(lex.number()?);
                    room.exits[direction.index()] = Some(ExitProto {
                        to_vnum,
                        key,
                        exit_flags,
                        keyword: interner.intern(&keyword),
                        description: exit_description.into(),
                        orig_dir: direction,
                    });
                }
                'E' => {
                    let keyword = lex.tilde_string()?;
                    let description = lex.tilde_string()?;
                    room.extra_descs.push(ExtraDesc {
                        keyword: keyword.into(),
                        description: description.into(),
                    });
                }
                other => {
                    return Err(AreaError::Malformed {
                        section: "ROOMS",
                        line: lex.line(),
                        detail: format!("unexpected '{other}' in room entry"),
                    })
                }
            }
        }
        out.push(room);
    }
    Ok(())
}

fn parse_resets(lex: &mut Lexer<'_>, out: &mut Vec<Reset>) -> AreaResult<()> {
    loop {
        let letter = lex.letter()?;
        let reset = match letter {
            'S' => return Ok(()),
            '*' => {
                lex.to_eol();
                continue;
            }
            'M' => Reset::Mob {
                mob: Vnum::new(lex.number()?),
                area_max: lex.number()?,
                room: Vnum::new(lex.number()?),
                room_max: lex.number()?,
            },
            'O' => {
                let reset = Reset::Obj {
                    obj: Vnum::new(lex.number()?),
                    world_max: lex.number()?,
                    room: Vnum::new(lex.number()?),
                };
                let _unused = lex.number()?;
                reset
            }
            'P' => Reset::Put {
                obj: Vnum::new(lex.number()?),
                world_max: lex.number()?,
                container: Vnum::new(lex.number()?),
                container_max: lex.number()?,
            },
            'G' => {
                let reset = Reset::Give {
                    obj: Vnum::new(lex.number()?),
                };
                let (_, _, _) = (lex.number()?, lex.number()?, lex.number()?);
                reset
            }
            'E' => {
                let obj = Vnum::new(lex.number()?);
                let _unused = lex.number()?;
                let slot = lex.number()?;
                let _unused2 = lex.number()?;
                Reset::Equip { obj, slot }
            }
            'D' => {
                let _unused = lex.number()?;
                Reset::Door {
                    room: Vnum::new(lex.number()?),
                    direction: lex.number()?,
                    state: lex.number()?,
                }
            }
            'R' => {
                let reset = Reset::Randomize {
                    room: Vnum::new(lex.number()?),
                    count: lex.number()?,
                };
                let (_, _) = (lex.number()?, lex.number()?);
                reset
            }
            other => {
                return Err(AreaError::Malformed {
                    section: "RESETS",
                    line: lex.line(),
                    detail: format!("unknown reset command '{other}'"),
                })
            }
        };
        out.push(reset);
    }
}

fn parse_shops(lex: &mut Lexer<'_>, out: &mut Vec<(Vnum, ShopData)>) -> AreaResult<()> {
    loop {
        let keeper = lex.number()?;
        if keeper == 0 {
            return Ok(());
        }
        let buy_types = [
            lex.number()?,
            lex.number()?,
            lex.number()?,
            lex.number()?,
            lex.number()?,
        ];
        let shop = ShopData {
            buy_types,
            profit_buy: lex.number()?,
            profit_sell: lex.number()?,
            open_hour: lex.number()?,
            close_hour: lex.number()?,
        };
        out.push((Vnum::new(keeper), shop));
    }
}

fn parse_specials(lex: &mut Lexer<'_>, out: &mut Vec<(Vnum, String)>) -> AreaResult<()> {
    loop {
        let letter = lex.letter()?;
        match letter {
            'S' => return Ok(()),
            '*' => {
                lex.to_eol();
            }
            'M' => {
                let vnum = Vnum::new(lex.number()?);
                let name = lex.word()?.to_string();
                out.push((vnum, name));
            }
            other => {
                return Err(AreaError::Malformed {
                    section: "SPECIALS",
                    line: lex.line(),
                    detail: format!("unknown specials line '{other}'"),
                })
            }
        }
    }
}

fn parse_mobprogs(lex: &mut Lexer<'_>, out: &mut Vec<MobProgScript>) -> AreaResult<()> {
    while let Some(vnum) = entry_vnum(lex, "MOBPROGS")? {
        let code = lex.tilde_string()?;
        out.push(MobProgScript {
            vnum,
            code: code.into(),
        });
    }
    Ok(())
}

fn parse_helps(lex: &mut Lexer<'_>, out: &mut Vec<HelpEntry>) -> AreaResult<()> {
    loop {
        let level = lex.number()?;
        let keywords = lex.tilde_string()?;
        if keywords == "$" {
            return Ok(());
        }
        let text = lex.tilde_string()?;
        out.push(HelpEntry {
            level,
            keywords,
            text,
        });
    }
}

/// Attaches the flat reset list to the rooms that anchor it. `M`, `O`,
/// `D`, and `R` name their room; `P`, `G`, and `E` ride with the room of
/// the preceding anchor.
fn attach_resets(loaded: &mut LoadedArea, resets: Vec<Reset>, file_name: &str) {
    let mut current: Option<Vnum> = None;
    for reset in resets {
        let anchor = match reset {
            Reset::Mob { room, .. }
            | Reset::Obj { room, .. }
            | Reset::Door { room, .. }
            | Reset::Randomize { room, .. } => {
                current = Some(room);
                current
            }
            Reset::Put { .. } | Reset::Give { .. } | Reset::Equip { .. } => current,
        };
        let Some(room_vnum) = anchor else {
            warn!(target: "bug", file = file_name, "reset with no anchoring room");
            continue;
        };
        match loaded.rooms.iter_mut().find(|r| r.vnum == room_vnum) {
            Some(room) => room.resets.push(reset),
            None => {
                warn!(target: "bug", file = file_name, vnum = %room_vnum, "reset for unknown room")
            }
        }
    }
}

fn attach_shops(loaded: &mut LoadedArea, shops: Vec<(Vnum, ShopData)>, file_name: &str) {
    for (keeper, shop) in shops {
        match loaded.mobiles.iter_mut().find(|m| m.vnum == keeper) {
            Some(mob) => mob.shop = Some(shop),
            None => {
                warn!(target: "bug", file = file_name, vnum = %keeper, "shop for unknown keeper")
            }
        }
    }
}

fn attach_specials(loaded: &mut LoadedArea, specials: Vec<(Vnum, String)>, file_name: &str) {
    for (vnum, name) in specials {
        match loaded.mobiles.iter_mut().find(|m| m.vnum == vnum) {
            Some(mob) => mob.spec_fun = Some(name.into()),
            None => {
                warn!(target: "bug", file = file_name, %vnum, "special for unknown mobile")
            }
        }
    }
}
