// server.rs — The authoritative `Server` value. Converted in spirit from
// myq2-server/src/server.rs's ServerContext: one struct owning every piece
// of mutable state, handed by `&mut` reference into every handler, instead
// of the C original's process-wide globals.

use std::net::UdpSocket;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ServerConfig;
use crate::npc::chaser::Chaser;
use crate::npc::patroller::Patroller;
use crate::session::{random_spawn_position, SessionTable};

/// Fixed spawn anchors for the chasers, one per entity — a restart must
/// return each chaser to its own original spawn point. Reuses the player
/// spawn anchors plus one extra so the four chasers aren't all stacked on
/// the same tile.
const CHASER_SPAWN_POINTS: [[f32; 3]; 4] = [
    [-60.0, 2.0, -80.0],
    [-40.0, 2.0, -100.0],
    [-80.0, 2.0, -40.0],
    [-60.0, 2.0, -40.0],
];

/// The patroller circles the landing spot's (x, z), per
/// `npc::patroller::LANDING_SPOT`.
const PATROLLER_CENTER: [f32; 2] = [0.0, 50.0];

pub struct Server {
    pub config: ServerConfig,
    pub socket: UdpSocket,
    pub sessions: SessionTable,
    pub chasers: Vec<Chaser>,
    pub patrollers: Vec<Patroller>,
    pub rng: StdRng,
    /// Outbound message sequence — strictly increasing across every
    /// server-originated message.
    sequence: u32,
    /// The world-state snapshot counter carried in `Message::WorldState`'s
    /// own payload, distinct from the per-message wire sequence above.
    state_seq: u32,
}

impl Server {
    pub fn new(config: ServerConfig, socket: UdpSocket) -> Server {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Server::with_seed(config, socket, seed)
    }

    /// Deterministic constructor for tests.
    pub fn with_seed(config: ServerConfig, socket: UdpSocket, seed: u64) -> Server {
        let mut rng = StdRng::seed_from_u64(seed);

        let chasers = CHASER_SPAWN_POINTS
            .iter()
            .enumerate()
            .map(|(i, pos)| Chaser::spawn((i + 1) as u32, *pos, &mut rng))
            .collect();

        let patrollers = vec![Patroller::spawn(CHASER_SPAWN_POINTS.len() as u32 + 1, PATROLLER_CENTER)];

        Server {
            config,
            socket,
            sessions: SessionTable::new(),
            chasers,
            patrollers,
            rng,
            sequence: 0,
            state_seq: 0,
        }
    }

    /// The next outbound sequence number, incrementing the shared counter.
    pub fn next_sequence(&mut self) -> u32 {
        self.sequence += 1;
        self.sequence
    }

    /// The next world-state snapshot counter.
    pub fn next_state_seq(&mut self) -> u32 {
        self.state_seq += 1;
        self.state_seq
    }

    pub fn random_spawn(&mut self) -> skirmish_common::math::Vec3 {
        random_spawn_position(&mut self.rng)
    }
}
