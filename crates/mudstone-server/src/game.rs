//! Game state outside the entity graph: sessions, descriptors, global
//! switches, and the glue between them.

use std::collections::HashMap;

use mudstone_area::PlayerFile;
use mudstone_loot::LootDb;
use mudstone_net::{DescId, NetServer};
use mudstone_script::ScriptVm;
use mudstone_types::MobId;
use mudstone_world::World;

use crate::config::ServerConfig;
use crate::help::HelpTree;

/// Login state machine states. `Playing` routes input to the command
/// dispatcher; everything else routes to the nanny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    GetName,
    ConfirmNewName,
    GetOldPassword,
    GetNewPassword,
    ConfirmNewPassword,
    GetNewRace,
    GetNewSex,
    GetNewClass,
    GetAlignment,
    DefaultChoice,
    GenGroups,
    PickWeapon,
    ReadImotd,
    ReadMotd,
    BreakConnect,
    Playing,
}

/// One connected session: a descriptor plus login progress.
#[derive(Debug)]
pub struct Session {
    pub desc: DescId,
    pub state: ConnState,
    /// Character name typed at the name prompt.
    pub name: String,
    /// The character, once created or loaded.
    pub character: Option<MobId>,
    /// Loaded or in-progress player file during the login chain.
    pub file: Option<Box<PlayerFile>>,
    pub password_attempts: u8,
}

impl Session {
    pub fn new(desc: DescId) -> Self {
        Session {
            desc,
            state: ConnState::GetName,
            name: String::new(),
            character: None,
            file: None,
            password_attempts: 0,
        }
    }
}

/// Failed-login penalty record per host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPenalty {
    pub failures: u32,
    /// Pulse at which the penalty lapses.
    pub until_pulse: u64,
}

/// Global switches toggled by wiz commands and the shutdown path.
#[derive(Debug, Default)]
pub struct GameFlags {
    /// Refuse all logins below immortal trust.
    pub wizlock: bool,
    /// Refuse new character creation.
    pub newlock: bool,
    /// Log every command line.
    pub log_all: bool,
    /// The loop exits at the top of the next pulse.
    pub down: bool,
}

/// Everything the server owns besides the world: the session layer,
/// login state, helps, loot, the script VM, and global flags. Kept
/// separate from the world so command handlers (and the mobprog host)
/// can borrow both halves at once.
pub struct GameIo {
    pub net: NetServer,
    pub sessions: HashMap<DescId, Session>,
    /// Reverse index: playing character to its descriptor.
    pub char_desc: HashMap<MobId, DescId>,
    pub loot: LootDb,
    pub helps: HelpTree,
    pub vm: ScriptVm,
    pub config: ServerConfig,
    pub flags: GameFlags,
    pub penalties: HashMap<String, HostPenalty>,
    /// Pulse counter since boot.
    pub pulse: u64,
}

impl GameIo {
    pub fn new(net: NetServer, config: ServerConfig) -> Self {
        GameIo {
            net,
            sessions: HashMap::new(),
            char_desc: HashMap::new(),
            loot: LootDb::new(),
            helps: HelpTree::default(),
            vm: ScriptVm::new(),
            config,
            flags: GameFlags::default(),
            penalties: HashMap::new(),
            pulse: 0,
        }
    }

    /// Queues text to a descriptor.
    pub fn send_to_desc(&mut self, desc: DescId, text: &str) {
        self.net.send(desc, text);
    }

    /// Queues text to a playing character, if anyone is driving it.
    pub fn send_to_char(&mut self, mob: MobId, text: &str) {
        if let Some(&desc) = self.char_desc.get(&mob) {
            self.net.send(desc, text);
        }
    }

    /// The descriptor driving a character.
    pub fn desc_of(&self, mob: MobId) -> Option<DescId> {
        self.char_desc.get(&mob).copied()
    }

    /// The character behind a descriptor, if playing.
    pub fn char_of(&self, desc: DescId) -> Option<MobId> {
        self.sessions.get(&desc).and_then(|s| s.character)
    }

    /// Binds a character to a descriptor (login complete or takeover).
    pub fn bind_char(&mut self, desc: DescId, mob: MobId) {
        if let Some(session) = self.sessions.get_mut(&desc) {
            session.character = Some(mob);
            session.state = ConnState::Playing;
        }
        self.char_desc.insert(mob, desc);
    }

    /// Unbinds on disconnect or extraction.
    pub fn unbind_char(&mut self, mob: MobId) {
        if let Some(desc) = self.char_desc.remove(&mob) {
            if let Some(session) = self.sessions.get_mut(&desc) {
                session.character = None;
            }
        }
    }

    /// All playing characters, in descriptor accept order.
    pub fn playing(&self) -> Vec<(DescId, MobId)> {
        self.net
            .descriptor_ids()
            .into_iter()
            .filter_map(|desc| {
                let session = self.sessions.get(&desc)?;
                if session.state == ConnState::Playing {
                    Some((desc, session.character?))
                } else {
                    None
                }
            })
            .collect()
    }

    /// The session owning a named playing character, for reconnect
    /// takeover.
    pub fn session_playing_name(&self, world: &World, name: &str) -> Option<DescId> {
        self.sessions
            .values()
            .find(|s| {
                s.state == ConnState::Playing
                    && s.character
                        .and_then(|m| world.mobs.get(&m))
                        .is_some_and(|m| m.name.eq_ignore_ascii_case(name))
            })
            .map(|s| s.desc)
    }
}

/// The whole server: the entity graph plus everything around it.
pub struct Game {
    pub world: World,
    pub io: GameIo,
}

/// The mobprog host: program command lines re-enter the dispatcher, so
/// position and trust checks apply to scripted commands uniformly.
impl mudstone_mobprog::ProgramHost for GameIo {
    fn interpret(&mut self, world: &mut World, actor: MobId, line: &str) {
        crate::interp::interpret(world, self, actor, line);
    }

    fn mob_interpret(&mut self, world: &mut World, actor: MobId, line: &str) {
        crate::mob_cmds::mob_interpret(world, self, actor, line);
    }
}
