//! The heartbeat: one cooperative loop multiplexing sockets and ticks.
//!
//! Per pulse, strictly in order: poll and read, process one command per
//! descriptor (honoring wait states), tick work, output flush, reap.
//! Inputs before ticks before outputs, so a player sees the effect of
//! their command on the same turn. The remainder of the pulse is spent
//! back in the poll collecting input for the next turn.

use std::time::{Duration, Instant};

use mudstone_net::NetEvent;
use mudstone_world::World;

use crate::game::{ConnState, Game, GameIo};
use crate::nanny;
use crate::tick;

/// Runs the loop until shutdown. Returns normally only on a clean exit.
pub fn run(game: &mut Game) -> std::io::Result<()> {
    let pulse = Duration::from_millis(game.io.config.game.pulse_millis.max(50));

    #[cfg(unix)]
    let shutdown_flag = {
        use std::sync::atomic::AtomicBool;
        use std::sync::Arc;
        let flag = Arc::new(AtomicBool::new(false));
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            let _ = signal_hook::flag::register(signal, Arc::clone(&flag));
        }
        flag
    };

    let mut pending_events: Vec<NetEvent> = Vec::new();
    loop {
        let pulse_start = Instant::now();

        if game.io.flags.down {
            tracing::info!("heartbeat stopping");
            game.io.net.flush_all();
            return Ok(());
        }
        #[cfg(unix)]
        if shutdown_flag.load(std::sync::atomic::Ordering::Relaxed) {
            tracing::info!("signal received, shutting down");
            crate::act_wiz::do_shutdown(
                &mut game.world,
                &mut game.io,
                mudstone_types::MobId::new(0),
                "",
            );
            continue;
        }

        // Greet connections that arrived during the previous sleep.
        for event in pending_events.drain(..) {
            handle_lifecycle(&mut game.world, &mut game.io, event);
        }

        process_input(&mut game.world, &mut game.io);
        tick::pulse_update(&mut game.world, &mut game.io);
        game.io.net.flush_all();

        let reaped = game.io.net.reap();
        for event in reaped {
            handle_lifecycle(&mut game.world, &mut game.io, event);
        }

        // Sleep out the pulse inside the poll, gathering input.
        let elapsed = pulse_start.elapsed();
        let remaining = pulse.saturating_sub(elapsed);
        match game.io.net.pump(remaining.max(Duration::from_millis(1))) {
            Ok(events) => pending_events = events,
            Err(e) => {
                tracing::error!(error = %e, "poll failure");
                return Err(std::io::Error::other(e.to_string()));
            }
        }
    }
}

fn handle_lifecycle(world: &mut World, io: &mut GameIo, event: NetEvent) {
    match event {
        NetEvent::Connected(desc) => {
            nanny::greet(io, desc);
        }
        NetEvent::Disconnected(desc) => {
            // A playing character lingers link-dead; the idle tick
            // reaps it later. Login-phase sessions just vanish.
            if let Some(session) = io.sessions.remove(&desc) {
                if let Some(mob_id) = session.character {
                    io.char_desc.remove(&mob_id);
                    if world.mobs.contains_key(&mob_id) {
                        tracing::info!(desc = %desc, "player went link-dead");
                        nanny::save_character(world, io, mob_id);
                    }
                }
            }
        }
    }
}

/// One command per descriptor per pulse, in accept order. A lagged
/// mobile (positive wait) burns the pulse instead of acting.
fn process_input(world: &mut World, io: &mut GameIo) {
    for desc in io.net.descriptor_ids() {
        let state = match io.sessions.get(&desc) {
            Some(session) => session.state,
            None => continue,
        };

        // Wait-state lag applies only to playing characters.
        if state == ConnState::Playing {
            if let Some(mob) = io.char_of(desc).and_then(|m| world.mobs.get_mut(&m)) {
                if mob.wait > 0 {
                    mob.wait -= 1;
                    continue;
                }
            }
        }

        let line = match io.net.descriptor_mut(desc).and_then(|d| d.next_command()) {
            Some(line) => line,
            None => continue,
        };

        match state {
            ConnState::Playing => {
                if let Some(mob_id) = io.char_of(desc) {
                    // Typing is proof of life.
                    if let Some(mob) = world.mobs.get_mut(&mob_id) {
                        mob.timer = 0;
                        // A voided player snaps back on input.
                        if mob.room.is_none() {
                            let recall =
                                mudstone_types::Vnum::new(io.config.game.recall_vnum);
                            if let Some(room) = world.room_by_vnum(recall) {
                                world.mob_to_room(mob_id, room);
                            }
                        }
                    }
                    crate::interp::interpret(world, io, mob_id, &line);
                }
            }
            ConnState::BreakConnect => {}
            _ => nanny::handle_line(world, io, desc, &line),
        }
    }
}
