//! The socials table and its fallback dispatch.
//!
//! A social carries up to seven act-grammar messages; the dispatcher
//! falls through to this table when no command matches.

use mudstone_types::{MobId, Position, AFF_CHARM, COMM_NOEMOTE};
use mudstone_world::World;

use crate::act::{act, ActArg, ActTo};
use crate::game::GameIo;

/// One social's message set. Empty strings suppress that message.
pub struct Social {
    pub name: &'static str,
    pub char_no_arg: &'static str,
    pub others_no_arg: &'static str,
    pub char_found: &'static str,
    pub others_found: &'static str,
    pub vict_found: &'static str,
    pub char_auto: &'static str,
    pub others_auto: &'static str,
}

const fn social(
    name: &'static str,
    char_no_arg: &'static str,
    others_no_arg: &'static str,
    char_found: &'static str,
    others_found: &'static str,
    vict_found: &'static str,
    char_auto: &'static str,
    others_auto: &'static str,
) -> Social {
    Social {
        name,
        char_no_arg,
        others_no_arg,
        char_found,
        others_found,
        vict_found,
        char_auto,
        others_auto,
    }
}

/// A representative social set; the mechanism is what matters, builders
/// extend the table.
#[rustfmt::skip]
pub static SOCIAL_TABLE: &[Social] = &[
    social("bow",
        "You bow deeply.", "$n bows deeply.",
        "You bow before $M.", "$n bows before $N.", "$n bows before you.",
        "You bow to yourself. Dizzying.", "$n bows to $mself."),
    social("cackle",
        "You throw back your head and cackle with insane glee!",
        "$n throws back $s head and cackles with insane glee!",
        "You cackle gleefully at $N.", "$n cackles gleefully at $N.",
        "$n cackles gleefully at you. Better keep your distance.",
        "You cackle at yourself. Perhaps a rest is in order.",
        "$n cackles at $mself. Make a note of this."),
    social("chuckle",
        "You chuckle politely.", "$n chuckles politely.",
        "You chuckle at $S joke.", "$n chuckles at $N's joke.",
        "$n chuckles at your joke.",
        "You chuckle at your own joke.", "$n chuckles at $s own joke."),
    social("comfort",
        "", "",
        "You comfort $M.", "$n comforts $N.", "$n comforts you.",
        "You make a pathetic attempt at comforting yourself.",
        "$n has no one to comfort but $mself."),
    social("cry",
        "Waaaaah ...", "$n bursts into tears.",
        "You cry on $S shoulder.", "$n cries on $N's shoulder.",
        "$n cries on your shoulder.",
        "You cry to yourself.", "$n sobs quietly to $mself."),
    social("dance",
        "Feels silly, doesn't it?", "$n tries to break dance, but nearly breaks $s neck!",
        "You sweep $M into a romantic waltz.",
        "$n sweeps $N into a romantic waltz.",
        "$n sweeps you into a romantic waltz.",
        "You skip and dance around by yourself.",
        "$n dances a little jig by $mself."),
    social("frown",
        "What's bothering you?", "$n frowns.",
        "You frown at what $E did.", "$n frowns at $N.", "$n frowns at you. Hmm.",
        "You frown at yourself. Poor baby.", "$n frowns at $mself. Poor baby."),
    social("grin",
        "You grin evilly.", "$n grins evilly.",
        "You grin evilly at $M.", "$n grins evilly at $N.",
        "$n grins evilly at you. Hmmm.",
        "You grin at yourself. You must be getting very bored.",
        "$n grins at $mself. Weird."),
    social("laugh",
        "You laugh.", "$n laughs.",
        "You laugh at $M mercilessly.", "$n laughs at $N mercilessly.",
        "$n laughs at you mercilessly. Hmmmph.",
        "You laugh at yourself. I would too.",
        "$n laughs at $mself. Let's all join in!"),
    social("nod",
        "You nod.", "$n nods.",
        "You nod in recognition to $M.", "$n nods in recognition to $N.",
        "$n nods in recognition to you. You DO know $m, right?",
        "You nod at yourself. Are you getting senile?",
        "$n nods at $mself. $e must be getting senile."),
    social("poke",
        "Poke whom?", "",
        "You poke $M in the ribs.", "$n pokes $N in the ribs.",
        "$n pokes you in the ribs.",
        "You poke yourself in the ribs, feeling very silly.",
        "$n pokes $mself in the ribs, looking very sheepish."),
    social("shrug",
        "You shrug.", "$n shrugs helplessly.",
        "You shrug in response to $s question.",
        "$n shrugs in response to $N's question.",
        "$n shrugs in response to your question.",
        "You shrug to yourself.", "$n shrugs to $mself. Weird."),
    social("smile",
        "You smile happily.", "$n smiles happily.",
        "You smile at $M.", "$n beams a smile at $N.", "$n smiles at you.",
        "You smile at yourself.", "$n smiles at $mself."),
    social("snore",
        "Zzzzzzzzzzzzzzzzz.", "$n snores loudly.",
        "You snore loudly at $M.", "$n snores loudly at $N.",
        "$n snores loudly in your direction.",
        "You snore at yourself. How rude.", "$n snores at $mself. Strange."),
    social("wave",
        "You wave.", "$n waves happily.",
        "You wave goodbye to $M.", "$n waves goodbye to $N.",
        "$n waves goodbye to you. Have a good journey.",
        "Are you going on adventures as well?", "$n waves goodbye to $mself."),
    social("wink",
        "You wink suggestively.", "$n winks suggestively.",
        "You wink suggestively at $M.", "$n winks at $N.",
        "$n winks suggestively at you.",
        "You wink at yourself?? What are you up to?",
        "$n winks at $mself. There's got to be a message in there."),
];

fn find_social(verb: &str) -> Option<&'static Social> {
    SOCIAL_TABLE.iter().find(|s| {
        !verb.is_empty()
            && verb.len() <= s.name.len()
            && s.name[..verb.len()].eq_ignore_ascii_case(verb)
    })
}

/// Attempts a social. Returns false when no social matches so the
/// dispatcher can fall through to `Huh?`.
pub fn check_social(
    world: &mut World,
    io: &mut GameIo,
    actor: MobId,
    verb: &str,
    argument: &str,
) -> bool {
    let Some(social) = find_social(verb) else {
        return false;
    };

    let Some(mob) = world.mobs.get(&actor) else { return true };
    if !mob.is_npc() && mob.comm_flags & COMM_NOEMOTE != 0 {
        io.send_to_char(actor, "You are anti-social!\n\r");
        return true;
    }

    match mob.position {
        Position::Dead => {
            io.send_to_char(actor, "Lie still; you are DEAD.\n\r");
            return true;
        }
        Position::Incap | Position::Mortal => {
            io.send_to_char(actor, "You are hurt far too bad for that.\n\r");
            return true;
        }
        Position::Stunned => {
            io.send_to_char(actor, "You are too stunned to do that.\n\r");
            return true;
        }
        Position::Sleeping if social.name != "snore" => {
            io.send_to_char(actor, "In your dreams, or what?\n\r");
            return true;
        }
        _ => {}
    }

    let target_word = argument.split_whitespace().next().unwrap_or("");
    if target_word.is_empty() {
        act(world, io, social.others_no_arg, actor, ActArg::None, ActArg::None, ActTo::Room);
        act(world, io, social.char_no_arg, actor, ActArg::None, ActArg::None, ActTo::Char);
        return true;
    }

    let Some(victim) = world.find_mob_room(actor, target_word) else {
        io.send_to_char(actor, "They aren't here.\n\r");
        return true;
    };

    if victim == actor {
        act(world, io, social.others_auto, actor, ActArg::None, ActArg::None, ActTo::Room);
        act(world, io, social.char_auto, actor, ActArg::None, ActArg::None, ActTo::Char);
        return true;
    }

    act(world, io, social.others_found, actor, ActArg::None, ActArg::Mob(victim), ActTo::NotVict);
    act(world, io, social.char_found, actor, ActArg::None, ActArg::Mob(victim), ActTo::Char);
    act(world, io, social.vict_found, actor, ActArg::None, ActArg::Mob(victim), ActTo::Vict);

    // An idle, awake, uncharmed NPC answers in kind or with a slap.
    let responds = world.mobs.get(&victim).is_some_and(|v| {
        v.is_npc()
            && !v.has_affect(AFF_CHARM)
            && v.position.is_awake()
            && io.desc_of(victim).is_none()
    });
    if responds && world.mobs.get(&actor).is_some_and(|m| !m.is_npc()) {
        use rand::Rng;
        if world.rng.gen_range(0..16) < 9 {
            act(world, io, social.others_found, victim, ActArg::None, ActArg::Mob(actor), ActTo::NotVict);
            act(world, io, social.char_found, victim, ActArg::None, ActArg::Mob(actor), ActTo::Char);
            act(world, io, social.vict_found, victim, ActArg::None, ActArg::Mob(actor), ActTo::Vict);
        } else {
            act(world, io, "$n slaps $N.", victim, ActArg::None, ActArg::Mob(actor), ActTo::NotVict);
            act(world, io, "You slap $N.", victim, ActArg::None, ActArg::Mob(actor), ActTo::Char);
            act(world, io, "$n slaps you.", victim, ActArg::None, ActArg::Mob(actor), ActTo::Vict);
        }
    }
    true
}

/// Social names for the `socials` listing.
pub fn social_names() -> Vec<&'static str> {
    SOCIAL_TABLE.iter().map(|s| s.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_lookup_finds_socials() {
        assert_eq!(find_social("smi").unwrap().name, "smile");
        assert_eq!(find_social("wav").unwrap().name, "wave");
        assert!(find_social("xyzzy").is_none());
    }

    #[test]
    fn table_is_sorted_by_name() {
        let names: Vec<_> = SOCIAL_TABLE.iter().map(|s| s.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }
}
