// tick.rs — The cooperative scheduler loop and inbound message dispatch.
// Converted in spirit from myq2-server/src/sv_main.rs's SV_Frame: drain
// input, run world logic on independent timers, sleep briefly, repeat.
// No threads, no channels — the loop is the sole mutator of `Server`.

use std::net::SocketAddr;
use std::thread;
use std::time::{Duration, Instant};

use skirmish_common::protocol::{decode, Header, Message, RestartReason};

use crate::npc::PlayerSnapshot;
use crate::{broadcast, combat, net};
use crate::server::Server;

const BROADCAST_INTERVAL: Duration = Duration::from_millis(50);
const AI_INTERVAL: Duration = Duration::from_millis(50);
const REAP_INTERVAL: Duration = Duration::from_millis(1000);
const LOOP_SLEEP: Duration = Duration::from_millis(1);

/// Runs the scheduler forever. Shutdown on a termination signal is the
/// process's problem, not this loop's — killing the process is the only
/// way out.
pub fn run(server: &mut Server) {
    let mut last_broadcast = Instant::now();
    let mut last_ai = Instant::now();
    let mut last_reap = Instant::now();

    loop {
        let now = Instant::now();

        while let Some((from, bytes)) = net::try_recv(&server.socket) {
            if let Some((header, message)) = decode(&bytes) {
                server.sessions.touch(from, now);
                dispatch(server, from, header, message, now);
            }
        }

        if now.duration_since(last_broadcast) >= BROADCAST_INTERVAL {
            last_broadcast = now;
            let msg = broadcast::world_state(server);
            broadcast::broadcast_all(server, &msg);
        }

        if now.duration_since(last_ai) >= AI_INTERVAL {
            let dt = now.duration_since(last_ai).as_secs_f32();
            last_ai = now;
            advance_ai(server, dt);
            let msg = broadcast::entity_state(server);
            broadcast::broadcast_all(server, &msg);
        }

        if now.duration_since(last_reap) >= REAP_INTERVAL {
            last_reap = now;
            server.sessions.reap(now);
        }

        thread::sleep(LOOP_SLEEP);
    }
}

/// Advances every chaser and patroller by `dt`, relaying any damage they
/// deal to their victims as `player-damage` messages.
fn advance_ai(server: &mut Server, dt: f32) {
    let ai_enabled = server.config.ai_enabled;
    let players: Vec<PlayerSnapshot> = server
        .sessions
        .active_players()
        .map(|p| PlayerSnapshot { id: p.id, pos: p.state.pos })
        .collect();

    let mut events = Vec::new();
    for chaser in server.chasers.iter_mut().filter(|c| c.active) {
        chaser.update(dt, &players, ai_enabled, &mut server.rng, &mut events);
    }
    for patroller in server.patrollers.iter_mut().filter(|p| p.active) {
        patroller.update(dt, &players, ai_enabled, &mut events);
    }

    for event in events {
        broadcast::player_damage(server, event.target_id, event.damage, event.attacker_entity_id, event.knockback);
    }
}

/// Dispatches one decoded inbound message. Every handler here is the only
/// place server state changes in response to a client — AI advances and
/// broadcasts happen only on the scheduler's own timers.
pub fn dispatch(server: &mut Server, from: SocketAddr, header: Header, message: Message, now: Instant) {
    match message {
        Message::Join { name } => {
            let spawn_pos = server.random_spawn();
            if let Some(session) = server.sessions.join(from, name, spawn_pos, now) {
                let assigned_id = session.id;
                let state = session.state.clone();
                broadcast::send_to(server, from, &Message::JoinAck { assigned_id, state });
            }
        }
        Message::Leave => {
            server.sessions.leave(from);
        }
        Message::Update { mut state } => {
            if let Some(session) = server.sessions.find_player_by_id_mut(header.sender_id) {
                if session.addr == from {
                    state.id = header.sender_id;
                    session.state = state;
                }
            }
        }
        Message::Ping => {
            broadcast::send_to(server, from, &Message::Pong);
        }
        Message::EntityDamage { target_id, damage, attacker_id } => {
            broadcast::relay_to_host(server, &Message::EntityDamage { target_id, damage, attacker_id });
            if let Some(reason) = combat::handle_entity_damage(server, target_id, damage, attacker_id) {
                trigger_restart(server, reason);
            }
        }
        Message::ArrowSpawn { arrow_id, pos, dir, shooter_id } => {
            broadcast::relay_to_others(server, &Message::ArrowSpawn { arrow_id, pos, dir, shooter_id }, from);
        }
        Message::ArrowHit { arrow_id, hit_pos, hit_entity_id } => {
            broadcast::relay_to_others(server, &Message::ArrowHit { arrow_id, hit_pos, hit_entity_id }, from);
        }
        Message::Spectate => {
            if server.sessions.spectate(from, now) {
                broadcast::send_to(server, from, &Message::SpectateAck);
            }
        }
        Message::GameRestart { reason } => {
            // The server never detects a player's death itself (health
            // bookkeeping lives client-side, see combat.rs), so
            // reason=player-died can only ever originate from a client
            // report; pass it through rather than collapsing it to manual.
            trigger_restart(server, reason);
        }
        Message::Heartbeat => {}
        Message::JoinAck { .. }
        | Message::WorldState { .. }
        | Message::Pong
        | Message::EntityState { .. }
        | Message::PlayerDamage { .. }
        | Message::SpectateAck => {
            // Server-originated kinds received from a client are malformed
            // traffic, not a protocol error worth logging.
        }
    }
}

/// Runs the global restart and immediately pushes the reset out: a restart
/// broadcast, then fresh entity-state and world-state snapshots so clients
/// do not wait for the next AI/broadcast tick.
fn trigger_restart(server: &mut Server, reason: RestartReason) {
    combat::restart(server, reason);
    broadcast::broadcast_all(server, &Message::GameRestart { reason });
    let entities = broadcast::entity_state(server);
    broadcast::broadcast_all(server, &entities);
    let world = broadcast::world_state(server);
    broadcast::broadcast_all(server, &world);
}
