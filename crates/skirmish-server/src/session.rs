// session.rs — Player session table, spectator table, and the spawn-point
// allocator. Converted in spirit from myq2-server/src/sv_user.rs's client
// list (array of fixed capacity, looked up by address or by slot), but this
// game has no persistent userinfo string or connection handshake: a join
// is accepted or it isn't, in one packet.

use std::f32::consts::TAU;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rand::Rng;

use skirmish_common::math::Vec3;
use skirmish_common::protocol::{CharacterClass, PlayerAnimState, PlayerStateRecord};

pub const MAX_PLAYERS: usize = 32;
pub const MAX_SPECTATORS: usize = 32;

/// A session is reaped once it has been silent for this long.
pub const LIVENESS_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawn anchors near the Tower of Hakutnas (original_source/server/game_server.c).
const SPAWN_POINTS: [Vec3; 3] = [
    [-60.0, 2.0, -80.0],
    [-40.0, 2.0, -100.0],
    [-80.0, 2.0, -40.0],
];
const SPAWN_JITTER_RADIUS: f32 = 8.0;

/// Samples one of the fixed anchors and jitters it within a disk of radius
/// `SPAWN_JITTER_RADIUS` in the horizontal plane, matching the original's
/// angle/distance sampling rather than a uniform box.
pub fn random_spawn_position(rng: &mut impl Rng) -> Vec3 {
    let anchor = SPAWN_POINTS[rng.gen_range(0..SPAWN_POINTS.len())];
    let angle: f32 = rng.gen_range(0.0..TAU);
    let distance: f32 = rng.gen_range(0.0..SPAWN_JITTER_RADIUS);
    [
        anchor[0] + angle.cos() * distance,
        anchor[1],
        anchor[2] + angle.sin() * distance,
    ]
}

pub struct PlayerSession {
    pub id: u32,
    pub name: String,
    pub addr: SocketAddr,
    pub last_seen: Instant,
    pub state: PlayerStateRecord,
    pub active: bool,
}

pub struct Spectator {
    pub addr: SocketAddr,
    pub last_seen: Instant,
    pub active: bool,
}

pub struct SessionTable {
    players: Vec<Option<PlayerSession>>,
    spectators: Vec<Option<Spectator>>,
    next_id: u32,
}

impl SessionTable {
    pub fn new() -> SessionTable {
        SessionTable {
            players: (0..MAX_PLAYERS).map(|_| None).collect(),
            spectators: (0..MAX_SPECTATORS).map(|_| None).collect(),
            next_id: 1,
        }
    }

    pub fn find_player_by_addr(&self, addr: SocketAddr) -> Option<&PlayerSession> {
        self.players.iter().flatten().find(|p| p.active && p.addr == addr)
    }

    pub fn find_player_by_addr_mut(&mut self, addr: SocketAddr) -> Option<&mut PlayerSession> {
        self.players.iter_mut().flatten().find(|p| p.active && p.addr == addr)
    }

    pub fn find_player_by_id(&self, id: u32) -> Option<&PlayerSession> {
        self.players.iter().flatten().find(|p| p.active && p.id == id)
    }

    pub fn find_player_by_id_mut(&mut self, id: u32) -> Option<&mut PlayerSession> {
        self.players.iter_mut().flatten().find(|p| p.active && p.id == id)
    }

    pub fn find_spectator_by_addr_mut(&mut self, addr: SocketAddr) -> Option<&mut Spectator> {
        self.spectators.iter_mut().flatten().find(|s| s.active && s.addr == addr)
    }

    fn remove_spectator(&mut self, addr: SocketAddr) {
        for slot in self.spectators.iter_mut() {
            if slot.as_ref().is_some_and(|s| s.active && s.addr == addr) {
                *slot = None;
            }
        }
    }

    /// Accepts a join from a new endpoint. Promotes the endpoint out of the
    /// spectator table first if it was spectating. Reuses the first empty
    /// or inactive slot. Silently drops the join (returns `None`) when every
    /// slot holds an active session — no rejection packet is ever sent.
    pub fn join(&mut self, addr: SocketAddr, name: String, spawn_pos: Vec3, now: Instant) -> Option<&PlayerSession> {
        self.remove_spectator(addr);

        let slot = self.players.iter().position(|p| p.as_ref().map_or(true, |s| !s.active))?;
        let id = self.next_id;
        self.next_id += 1;

        let state = PlayerStateRecord {
            id,
            pos: spawn_pos,
            yaw: 0.0,
            state: PlayerAnimState::Idle,
            combat_mode: false,
            class: CharacterClass::Paladin,
            health: 100.0,
            animation: String::new(),
            active: true,
        };

        self.players[slot] = Some(PlayerSession { id, name, addr, last_seen: now, state, active: true });
        self.players[slot].as_ref()
    }

    /// Accepts a spectate request. Silently dropped if the spectator table
    /// is full.
    pub fn spectate(&mut self, addr: SocketAddr, now: Instant) -> bool {
        if self.find_spectator_by_addr_mut(addr).is_some() {
            return true;
        }
        match self.spectators.iter().position(|s| s.as_ref().map_or(true, |s| !s.active)) {
            Some(slot) => {
                self.spectators[slot] = Some(Spectator { addr, last_seen: now, active: true });
                true
            }
            None => false,
        }
    }

    /// Deactivates the session bound to `addr`, if any (explicit leave).
    pub fn leave(&mut self, addr: SocketAddr) {
        if let Some(p) = self.find_player_by_addr_mut(addr) {
            p.active = false;
        }
    }

    /// Updates the liveness timestamp for whichever session (player or
    /// spectator) owns this endpoint. Called on every accepted inbound packet.
    pub fn touch(&mut self, addr: SocketAddr, now: Instant) {
        if let Some(p) = self.find_player_by_addr_mut(addr) {
            p.last_seen = now;
            return;
        }
        if let Some(s) = self.find_spectator_by_addr_mut(addr) {
            s.last_seen = now;
        }
    }

    /// Deactivates any session whose last-seen timestamp is older than
    /// `LIVENESS_TIMEOUT`. Silent: no message is sent, the next snapshot
    /// simply omits the entry.
    pub fn reap(&mut self, now: Instant) {
        for slot in self.players.iter_mut() {
            if let Some(p) = slot {
                if p.active && now.duration_since(p.last_seen) > LIVENESS_TIMEOUT {
                    p.active = false;
                }
            }
        }
        for slot in self.spectators.iter_mut() {
            if let Some(s) = slot {
                if s.active && now.duration_since(s.last_seen) > LIVENESS_TIMEOUT {
                    s.active = false;
                }
            }
        }
    }

    pub fn active_players(&self) -> impl Iterator<Item = &PlayerSession> {
        self.players.iter().flatten().filter(|p| p.active)
    }

    pub fn active_players_mut(&mut self) -> impl Iterator<Item = &mut PlayerSession> {
        self.players.iter_mut().flatten().filter(|p| p.active)
    }

    pub fn active_spectator_addrs(&self) -> impl Iterator<Item = SocketAddr> + '_ {
        self.spectators.iter().flatten().filter(|s| s.active).map(|s| s.addr)
    }

    pub fn active_player_count(&self) -> usize {
        self.active_players().count()
    }

    /// The active session with the smallest assigned id — the legacy
    /// "host" used for the entity-damage relay.
    pub fn host(&self) -> Option<&PlayerSession> {
        self.active_players().min_by_key(|p| p.id)
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        SessionTable::new()
    }
}
