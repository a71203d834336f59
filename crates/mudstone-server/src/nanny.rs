//! The login state machine ("the nanny"): everything between accept and
//! the first dispatched command.

use sha2::{Digest, Sha256};

use mudstone_area::PlayerFile;
use mudstone_net::{echo_off, echo_on, go_ahead, DescId};
use mudstone_types::{MobId, Position, Vnum, LEVEL_IMMORTAL, PLR_DENY};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::act_info::show_room;
use crate::game::{ConnState, GameIo, HostPenalty, Session};
use crate::wiznet::{self, WiznetEvent};

const MAX_PASSWORD_ATTEMPTS: u8 = 3;
/// Pulses a host stays penalized after striking out on passwords.
const PENALTY_PULSES: u64 = 10 * 60 * 4;

const RACES: &[&str] = &["human", "elf", "dwarf", "giant"];
const CLASSES: &[&str] = &["mage", "cleric", "thief", "warrior"];
const WEAPONS: &[&str] = &["sword", "dagger", "mace"];

/// SHA-256, hex encoded: the password hash format of player files.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Greets a fresh connection.
pub fn greet(io: &mut GameIo, desc: DescId) {
    io.sessions.insert(desc, Session::new(desc));
    let greeting = io
        .helps
        .greeting()
        .map(str::to_string)
        .unwrap_or_else(|| "Welcome to Mudstone.\n\r".to_string());
    io.send_to_desc(desc, &greeting);
    io.send_to_desc(desc, "\n\rBy what name do you wish to be known? ");
}

fn prompt(io: &mut GameIo, desc: DescId, text: &str) {
    io.send_to_desc(desc, text);
    // Prompt mark for clients that negotiated for it.
    if let Some(d) = io.net.descriptor_mut(desc) {
        d.queue_bytes(go_ahead());
    }
}

fn valid_name(name: &str) -> bool {
    let length = name.chars().count();
    (2..=12).contains(&length)
        && name.chars().all(|c| c.is_ascii_alphabetic())
        && !name.eq_ignore_ascii_case("all")
        && !name.eq_ignore_ascii_case("self")
        && !name.eq_ignore_ascii_case("someone")
}

/// Advances the state machine with one input line.
pub fn handle_line(world: &mut World, io: &mut GameIo, desc: DescId, line: &str) {
    let Some(state) = io.sessions.get(&desc).map(|s| s.state) else {
        return;
    };
    match state {
        ConnState::GetName => get_name(world, io, desc, line.trim()),
        ConnState::GetOldPassword => get_old_password(world, io, desc, line),
        ConnState::ConfirmNewName => confirm_new_name(io, desc, line.trim()),
        ConnState::GetNewPassword => get_new_password(io, desc, line),
        ConnState::ConfirmNewPassword => confirm_new_password(io, desc, line),
        ConnState::GetNewRace => get_new_race(io, desc, line.trim()),
        ConnState::GetNewSex => get_new_sex(io, desc, line.trim()),
        ConnState::GetNewClass => get_new_class(io, desc, line.trim()),
        ConnState::GetAlignment => get_alignment(io, desc, line.trim()),
        ConnState::DefaultChoice => default_choice(io, desc, line.trim()),
        ConnState::GenGroups => gen_groups(io, desc, line.trim()),
        ConnState::PickWeapon => pick_weapon(io, desc, line.trim()),
        ConnState::ReadImotd => {
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.state = ConnState::ReadMotd;
            }
            show_motd(io, desc);
        }
        ConnState::ReadMotd => enter_game(world, io, desc),
        ConnState::BreakConnect | ConnState::Playing => {}
    }
}

fn get_name(world: &mut World, io: &mut GameIo, desc: DescId, name: &str) {
    if name.is_empty() {
        io.net.close(desc);
        return;
    }
    if !valid_name(name) {
        prompt(io, desc, "Illegal name, try another.\n\rName: ");
        return;
    }

    // Rate-limit record against the host.
    let host = io
        .net
        .descriptor(desc)
        .map(|d| d.host.clone())
        .unwrap_or_default();
    if let Some(penalty) = io.penalties.get(&host) {
        if penalty.failures >= u32::from(MAX_PASSWORD_ATTEMPTS) && io.pulse < penalty.until_pulse {
            prompt(io, desc, "Your site is temporarily denied. Try later.\n\r");
            io.net.close(desc);
            return;
        }
    }

    match mudstone_area::load_player(&io.config.player_dir(), name) {
        Ok(Some(file)) => {
            if file.act_flags & PLR_DENY != 0 {
                tracing::info!(host, name, "denied player rejected");
                prompt(io, desc, "You are denied access.\n\r");
                io.net.close(desc);
                return;
            }
            if io.flags.wizlock && file.level < LEVEL_IMMORTAL {
                prompt(io, desc, "The game is wizlocked.\n\r");
                io.net.close(desc);
                return;
            }
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.name = file.name.clone();
                session.file = Some(Box::new(file));
                session.state = ConnState::GetOldPassword;
            }
            if let Some(d) = io.net.descriptor_mut(desc) {
                d.hide_input = true;
                d.queue_bytes(echo_off());
            }
            prompt(io, desc, "Password: ");
        }
        Ok(None) => {
            if io.flags.newlock {
                prompt(io, desc, "The game is newlocked.\n\r");
                io.net.close(desc);
                return;
            }
            if io.flags.wizlock {
                prompt(io, desc, "The game is wizlocked.\n\r");
                io.net.close(desc);
                return;
            }
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.name = capitalize(name);
                session.state = ConnState::ConfirmNewName;
            }
            let display = capitalize(name);
            prompt(
                io,
                desc,
                &format!("Did I get that right, {display} (Y/N)? "),
            );
        }
        Err(e) => {
            tracing::warn!(target: "bug", name, error = %e, "player file unreadable");
            prompt(io, desc, "Your player file is corrupt; see an immortal.\n\r");
            io.net.close(desc);
        }
    }
    let _ = world;
}

fn get_old_password(world: &mut World, io: &mut GameIo, desc: DescId, line: &str) {
    let supplied = hash_password(line.trim_end());
    let expected = io
        .sessions
        .get(&desc)
        .and_then(|s| s.file.as_ref())
        .map(|f| f.record.password_hash.clone())
        .unwrap_or_default();

    if supplied != expected {
        let failed_out = {
            let Some(session) = io.sessions.get_mut(&desc) else { return };
            session.password_attempts += 1;
            session.password_attempts >= MAX_PASSWORD_ATTEMPTS
        };
        if failed_out {
            prompt(io, desc, "Wrong password.\n\r");
            let host = io
                .net
                .descriptor(desc)
                .map(|d| d.host.clone())
                .unwrap_or_default();
            let until_pulse = io.pulse + PENALTY_PULSES;
            let entry = io.penalties.entry(host.clone()).or_insert(HostPenalty::default());
            entry.failures += 1;
            entry.until_pulse = until_pulse;
            tracing::info!(host, "password strikeout");
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.state = ConnState::BreakConnect;
            }
            io.net.close(desc);
        } else {
            prompt(io, desc, "Wrong password.\n\rPassword: ");
        }
        return;
    }

    if let Some(d) = io.net.descriptor_mut(desc) {
        d.hide_input = false;
        d.queue_bytes(echo_on());
    }

    // Reconnect: the new descriptor takes over a character already in
    // the game; the old descriptor is dismissed with a notice.
    let name = io.sessions.get(&desc).map(|s| s.name.clone()).unwrap_or_default();
    if let Some(old_desc) = io.session_playing_name(world, &name) {
        let Some(mob_id) = io.char_of(old_desc) else { return };
        io.send_to_desc(old_desc, "This character is now in use from another connection.\n\r");
        if let Some(session) = io.sessions.get_mut(&old_desc) {
            session.character = None;
            session.state = ConnState::BreakConnect;
        }
        io.net.close(old_desc);
        io.bind_char(desc, mob_id);
        io.send_to_desc(desc, "Reconnecting. Type replay to see missed tells.\n\r");
        act(world, io, "$n has reconnected.", mob_id, ActArg::None, ActArg::None, ActTo::Room);
        let host = io.net.descriptor(desc).map(|d| d.host.clone()).unwrap_or_default();
        wiznet::wiznet(
            world,
            io,
            &format!("{name}@{host} reconnected."),
            Some(mob_id),
            WiznetEvent::Links,
            0,
        );
        return;
    }

    if let Some(session) = io.sessions.get_mut(&desc) {
        session.state = ConnState::ReadMotd;
    }
    show_motd(io, desc);
}

fn show_motd(io: &mut GameIo, desc: DescId) {
    let motd = io
        .helps
        .lookup("motd", mudstone_types::MAX_LEVEL)
        .map(|h| format!("{}\n\r", h.text.trim_end()))
        .unwrap_or_default();
    if !motd.is_empty() {
        io.send_to_desc(desc, &motd);
    }
    prompt(io, desc, "\n\r[Hit Return to continue]\n\r");
}

fn confirm_new_name(io: &mut GameIo, desc: DescId, line: &str) {
    match line.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('y') => {
            let name = io.sessions.get(&desc).map(|s| s.name.clone()).unwrap_or_default();
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.file = Some(Box::new(PlayerFile::new(&name)));
                session.state = ConnState::GetNewPassword;
            }
            if let Some(d) = io.net.descriptor_mut(desc) {
                d.hide_input = true;
                d.queue_bytes(echo_off());
            }
            prompt(io, desc, &format!("New character.\n\rGive me a password for {name}: "));
        }
        Some('n') => {
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.state = ConnState::GetName;
                session.name.clear();
                session.file = None;
            }
            prompt(io, desc, "Ok, what IS it, then? ");
        }
        _ => prompt(io, desc, "Please type Yes or No. "),
    }
}

fn get_new_password(io: &mut GameIo, desc: DescId, line: &str) {
    let password = line.trim_end();
    if password.chars().count() < 5 {
        prompt(io, desc, "Password must be at least five characters long.\n\rPassword: ");
        return;
    }
    if let Some(session) = io.sessions.get_mut(&desc) {
        if let Some(file) = session.file.as_mut() {
            file.record.password_hash = hash_password(password);
        }
        session.state = ConnState::ConfirmNewPassword;
    }
    prompt(io, desc, "Please retype password: ");
}

fn confirm_new_password(io: &mut GameIo, desc: DescId, line: &str) {
    let supplied = hash_password(line.trim_end());
    let stored = io
        .sessions
        .get(&desc)
        .and_then(|s| s.file.as_ref())
        .map(|f| f.record.password_hash.clone())
        .unwrap_or_default();
    if supplied != stored {
        if let Some(session) = io.sessions.get_mut(&desc) {
            if let Some(file) = session.file.as_mut() {
                file.record.password_hash.clear();
            }
            session.state = ConnState::GetNewPassword;
        }
        prompt(io, desc, "Passwords don't match.\n\rRetype password: ");
        return;
    }
    if let Some(d) = io.net.descriptor_mut(desc) {
        d.hide_input = false;
        d.queue_bytes(echo_on());
    }
    if let Some(session) = io.sessions.get_mut(&desc) {
        session.state = ConnState::GetNewRace;
    }
    prompt(
        io,
        desc,
        &format!("\n\rThe following races are available: {}.\n\rWhat is your race? ", RACES.join(" ")),
    );
}

fn get_new_race(io: &mut GameIo, desc: DescId, line: &str) {
    let Some(race) = RACES.iter().find(|r| matches_choice(line, r)) else {
        prompt(io, desc, "That is not a valid race.\n\rWhat is your race? ");
        return;
    };
    if let Some(session) = io.sessions.get_mut(&desc) {
        if let Some(file) = session.file.as_mut() {
            file.race = (*race).to_string();
        }
        session.state = ConnState::GetNewSex;
    }
    prompt(io, desc, "What is your sex (M/F/N)? ");
}

fn get_new_sex(io: &mut GameIo, desc: DescId, line: &str) {
    let sex = match line.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('m') => mudstone_types::Sex::Male,
        Some('f') => mudstone_types::Sex::Female,
        Some('n') => mudstone_types::Sex::Neutral,
        _ => {
            prompt(io, desc, "That's not a sex.\n\rWhat IS your sex? ");
            return;
        }
    };
    if let Some(session) = io.sessions.get_mut(&desc) {
        if let Some(file) = session.file.as_mut() {
            file.sex = sex;
        }
        session.state = ConnState::GetNewClass;
    }
    prompt(
        io,
        desc,
        &format!("Select a class ({}): ", CLASSES.join(" ")),
    );
}

fn get_new_class(io: &mut GameIo, desc: DescId, line: &str) {
    let Some(class) = CLASSES.iter().find(|c| matches_choice(line, c)) else {
        prompt(io, desc, "That's not a class.\n\rWhat IS your class? ");
        return;
    };
    if let Some(session) = io.sessions.get_mut(&desc) {
        if let Some(file) = session.file.as_mut() {
            file.class = (*class).to_string();
        }
        session.state = ConnState::GetAlignment;
    }
    prompt(io, desc, "You may be good, neutral, or evil.\n\rWhich alignment (G/N/E)? ");
}

fn get_alignment(io: &mut GameIo, desc: DescId, line: &str) {
    let alignment = match line.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('g') => 750,
        Some('n') => 0,
        Some('e') => -750,
        _ => {
            prompt(io, desc, "Which alignment (G/N/E)? ");
            return;
        }
    };
    if let Some(session) = io.sessions.get_mut(&desc) {
        if let Some(file) = session.file.as_mut() {
            file.alignment = alignment;
        }
        session.state = ConnState::DefaultChoice;
    }
    prompt(io, desc, "Do you wish to customize this character (Y/N)? ");
}

fn default_choice(io: &mut GameIo, desc: DescId, line: &str) {
    match line.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('y') => {
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.state = ConnState::GenGroups;
            }
            prompt(
                io,
                desc,
                "Pick skill groups; type 'done' when finished.\n\rChoice: ",
            );
        }
        Some('n') => {
            if let Some(session) = io.sessions.get_mut(&desc) {
                session.state = ConnState::PickWeapon;
            }
            prompt(
                io,
                desc,
                &format!("Pick a weapon ({}): ", WEAPONS.join(" ")),
            );
        }
        _ => prompt(io, desc, "Please answer (Y/N)? "),
    }
}

fn gen_groups(io: &mut GameIo, desc: DescId, line: &str) {
    if line.eq_ignore_ascii_case("done") {
        if let Some(session) = io.sessions.get_mut(&desc) {
            session.state = ConnState::PickWeapon;
        }
        prompt(
            io,
            desc,
            &format!("Pick a weapon ({}): ", WEAPONS.join(" ")),
        );
        return;
    }
    // Each pick costs a practice; the skill system itself lives behind
    // the class tables, out of this surface.
    if let Some(session) = io.sessions.get_mut(&desc) {
        if let Some(file) = session.file.as_mut() {
            if file.record.practices > 0 {
                file.record.practices -= 1;
            }
        }
    }
    prompt(io, desc, "Choice (or 'done'): ");
}

fn pick_weapon(io: &mut GameIo, desc: DescId, line: &str) {
    if !WEAPONS.iter().any(|w| matches_choice(line, w)) {
        prompt(io, desc, "That's not a valid weapon.\n\rChoice: ");
        return;
    }
    if let Some(session) = io.sessions.get_mut(&desc) {
        session.state = ConnState::ReadImotd;
    }
    let imotd = io
        .helps
        .lookup("imotd", mudstone_types::MAX_LEVEL)
        .map(|h| format!("{}\n\r", h.text.trim_end()))
        .unwrap_or_default();
    if !imotd.is_empty() {
        io.send_to_desc(desc, &imotd);
    }
    prompt(io, desc, "\n\r[Hit Return to continue]\n\r");
}

fn matches_choice(input: &str, choice: &str) -> bool {
    !input.is_empty()
        && input.len() <= choice.len()
        && choice[..input.len()].eq_ignore_ascii_case(input)
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Materializes the character and drops it into the world.
fn enter_game(world: &mut World, io: &mut GameIo, desc: DescId) {
    let Some(file) = io
        .sessions
        .get_mut(&desc)
        .and_then(|s| s.file.take())
    else {
        io.net.close(desc);
        return;
    };
    let is_new = file.level <= 1 && file.record.played == 0;

    let mob_id = world.create_player(&file.name);
    apply_file(world, mob_id, &file);
    io.bind_char(desc, mob_id);

    let start_vnum = if is_new || file.room_vnum.is_none() {
        Vnum::new(io.config.game.mud_school_vnum)
    } else {
        file.room_vnum
    };
    let start = world
        .room_by_vnum(start_vnum)
        .or_else(|| world.room_by_vnum(Vnum::new(io.config.game.recall_vnum)));
    let Some(room_id) = start else {
        tracing::error!("no start room available; dropping login");
        io.net.close(desc);
        return;
    };
    world.mob_to_room(mob_id, room_id);

    io.send_to_desc(desc, "\n\rWelcome to Mudstone. May your visit here be ... interesting.\n\r");
    act(world, io, "$n has entered the game.", mob_id, ActArg::None, ActArg::None, ActTo::Room);
    show_room(world, io, mob_id, room_id);

    let host = io
        .net
        .descriptor(desc)
        .map(|d| d.host.clone())
        .unwrap_or_default();
    let name = file.name.clone();
    tracing::info!(player = %name, host, "entered the game");
    wiznet::wiznet(
        world,
        io,
        &format!("{name}@{host} has logged on."),
        Some(mob_id),
        WiznetEvent::Logins,
        0,
    );
    if is_new {
        wiznet::wiznet(
            world,
            io,
            &format!("Newbie alert! {name} sighted."),
            Some(mob_id),
            WiznetEvent::Newbie,
            0,
        );
        // First save reserves the name.
        save_character(world, io, mob_id);
    }

    let mut interp = mudstone_mobprog::Interpreter::new(io);
    mudstone_mobprog::greet_trigger(world, &mut interp, mob_id);
}

/// Copies a player file onto a live mobile.
fn apply_file(world: &mut World, mob_id: MobId, file: &PlayerFile) {
    let Some(mob) = world.mobs.get_mut(&mob_id) else { return };
    mob.level = file.level.max(1);
    mob.race = file.race.as_str().into();
    mob.class = file.class.as_str().into();
    mob.sex = file.sex;
    mob.position = if file.position > Position::Stunned {
        file.position
    } else {
        Position::Standing
    };
    mob.hit = file.hit;
    mob.max_hit = file.max_hit;
    mob.mana = file.mana;
    mob.max_mana = file.max_mana;
    mob.moves = file.moves;
    mob.max_moves = file.max_moves;
    mob.gold = file.gold;
    mob.silver = file.silver;
    mob.alignment = file.alignment;
    mob.act_flags = file.act_flags;
    mob.comm_flags = file.comm_flags;
    mob.player = Some(file.record.clone());
    let affects = file.affects.clone();
    for affect in affects {
        world.affect_to_mob(mob_id, affect);
    }
}

/// Snapshots a live character into its player file and saves it with
/// temp-then-rename. Failures are bugs, not crashes; the previous file
/// survives.
pub fn save_character(world: &World, io: &GameIo, mob_id: MobId) {
    let Some(mob) = world.mobs.get(&mob_id) else { return };
    let Some(record) = &mob.player else { return };

    let room_vnum = mob
        .room
        .and_then(|r| world.rooms.get(&r))
        .map_or(Vnum::NONE, |r| r.vnum);
    let file = PlayerFile {
        name: mob.first_name().to_string(),
        record: record.clone(),
        level: mob.level,
        race: mob.race.to_string(),
        class: mob.class.to_string(),
        sex: mob.sex,
        position: if mob.position > Position::Stunned {
            mob.position
        } else {
            Position::Standing
        },
        hit: mob.hit,
        max_hit: mob.max_hit,
        mana: mob.mana,
        max_mana: mob.max_mana,
        moves: mob.moves,
        max_moves: mob.max_moves,
        gold: mob.gold,
        silver: mob.silver,
        alignment: mob.alignment,
        room_vnum,
        act_flags: mob.act_flags,
        comm_flags: mob.comm_flags,
        affects: mob.affects.clone(),
    };
    if let Err(e) = mudstone_area::save_player(&io.config.player_dir(), &file) {
        tracing::warn!(target: "bug", player = %file.name, error = %e, "player save failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_stable_hex() {
        let hash = hash_password("swordfish");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_password("swordfish"));
        assert_ne!(hash, hash_password("Swordfish"));
    }

    #[test]
    fn name_validation() {
        assert!(valid_name("Alara"));
        assert!(!valid_name("x"));
        assert!(!valid_name("all"));
        assert!(!valid_name("has space"));
        assert!(!valid_name("number9"));
    }

    #[test]
    fn choice_matching_is_prefix_based() {
        assert!(matches_choice("warr", "warrior"));
        assert!(matches_choice("WAR", "warrior"));
        assert!(!matches_choice("warriors", "warrior"));
        assert!(!matches_choice("", "warrior"));
    }
}
