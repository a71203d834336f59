//! Wiznet: filtered event fan-out to subscribed immortal sessions.

use mudstone_types::{
    Flags, MobId, WIZ_DEATHS, WIZ_LEVELS, WIZ_LINKS, WIZ_LOAD, WIZ_LOGINS, WIZ_MOBDEATHS,
    WIZ_NEWBIE, WIZ_ON, WIZ_PENALTIES, WIZ_PREFIX, WIZ_RESETS, WIZ_RESTORE, WIZ_SECURE,
    WIZ_SITES, WIZ_SNOOPS, WIZ_SWITCHES,
};
use mudstone_world::World;

use crate::game::GameIo;

/// Subscription channels. `General` matches any subscriber with wiznet
/// switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WiznetEvent {
    General,
    Logins,
    Sites,
    Links,
    Deaths,
    MobDeaths,
    Resets,
    Penalties,
    Levels,
    Secure,
    Switches,
    Snoops,
    Restore,
    Load,
    Newbie,
}

impl WiznetEvent {
    fn flag(self) -> Flags {
        match self {
            WiznetEvent::General => 0,
            WiznetEvent::Logins => WIZ_LOGINS,
            WiznetEvent::Sites => WIZ_SITES,
            WiznetEvent::Links => WIZ_LINKS,
            WiznetEvent::Deaths => WIZ_DEATHS,
            WiznetEvent::MobDeaths => WIZ_MOBDEATHS,
            WiznetEvent::Resets => WIZ_RESETS,
            WiznetEvent::Penalties => WIZ_PENALTIES,
            WiznetEvent::Levels => WIZ_LEVELS,
            WiznetEvent::Secure => WIZ_SECURE,
            WiznetEvent::Switches => WIZ_SWITCHES,
            WiznetEvent::Snoops => WIZ_SNOOPS,
            WiznetEvent::Restore => WIZ_RESTORE,
            WiznetEvent::Load => WIZ_LOAD,
            WiznetEvent::Newbie => WIZ_NEWBIE,
        }
    }

    /// Channel name for the `wiznet` command.
    pub fn name(self) -> &'static str {
        match self {
            WiznetEvent::General => "on",
            WiznetEvent::Logins => "logins",
            WiznetEvent::Sites => "sites",
            WiznetEvent::Links => "links",
            WiznetEvent::Deaths => "deaths",
            WiznetEvent::MobDeaths => "mobdeaths",
            WiznetEvent::Resets => "resets",
            WiznetEvent::Penalties => "penalties",
            WiznetEvent::Levels => "levels",
            WiznetEvent::Secure => "secure",
            WiznetEvent::Switches => "switches",
            WiznetEvent::Snoops => "snoops",
            WiznetEvent::Restore => "restore",
            WiznetEvent::Load => "load",
            WiznetEvent::Newbie => "newbie",
        }
    }
}

/// Channels addressable by the `wiznet` command.
pub const CHANNELS: &[(WiznetEvent, Flags)] = &[
    (WiznetEvent::Logins, WIZ_LOGINS),
    (WiznetEvent::Sites, WIZ_SITES),
    (WiznetEvent::Links, WIZ_LINKS),
    (WiznetEvent::Deaths, WIZ_DEATHS),
    (WiznetEvent::MobDeaths, WIZ_MOBDEATHS),
    (WiznetEvent::Resets, WIZ_RESETS),
    (WiznetEvent::Penalties, WIZ_PENALTIES),
    (WiznetEvent::Levels, WIZ_LEVELS),
    (WiznetEvent::Secure, WIZ_SECURE),
    (WiznetEvent::Switches, WIZ_SWITCHES),
    (WiznetEvent::Snoops, WIZ_SNOOPS),
    (WiznetEvent::Restore, WIZ_RESTORE),
    (WiznetEvent::Load, WIZ_LOAD),
    (WiznetEvent::Newbie, WIZ_NEWBIE),
];

/// Delivers a message to every subscribed immortal session: wiznet on,
/// the event's bit set, trust at least `min_trust`, and not the actor
/// being reported on.
pub fn wiznet(
    world: &World,
    io: &mut GameIo,
    message: &str,
    exclude: Option<MobId>,
    event: WiznetEvent,
    min_trust: i16,
) {
    let flag = event.flag();
    for (_, mob_id) in io.playing() {
        if Some(mob_id) == exclude {
            continue;
        }
        let Some(mob) = world.mobs.get(&mob_id) else { continue };
        if !mob.is_immortal() || mob.trust() < min_trust {
            continue;
        }
        let Some(player) = &mob.player else { continue };
        if player.wiznet & WIZ_ON == 0 {
            continue;
        }
        if flag != 0 && player.wiznet & flag == 0 {
            continue;
        }
        let line = if player.wiznet & WIZ_PREFIX != 0 {
            format!("{{Z--> {message}{{x\n\r")
        } else {
            format!("{{Z{message}{{x\n\r")
        };
        io.send_to_char(mob_id, &line);
    }
}
