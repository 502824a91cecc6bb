// protocol.rs — Wire codec for the Skirmish Keep UDP protocol.
// Converted in spirit from myq2-common/src/common.rs (MSG_Read*/MSG_Write*)
// and myq2-common/src/net.rs, generalized from Quake 2's netchan framing to
// this game's fixed-layout, unreliable-datagram messages.
//
// Every multi-byte field is little-endian on the wire. This protocol is not
// portable across host endianness beyond that: fields are encoded and
// decoded one at a time below, never by transmuting a packed struct over
// the wire buffer, so the in-memory representation of this crate's types
// is free to differ from the wire layout.

use crate::math::{read_fixed_string, write_fixed_string, Vec3};

pub const HEADER_SIZE: usize = 9;
pub const NAME_LEN: usize = 32;
pub const ANIM_LEN: usize = 32;
pub const PLAYER_RECORD_SIZE: usize = 60;
pub const ENTITY_RECORD_SIZE: usize = 34;
pub const MAX_PLAYERS_PER_SNAPSHOT: usize = 32;
pub const MAX_ENTITIES_PER_SNAPSHOT: usize = 64;

/// Largest datagram the server will accept off the wire.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// `sender_id` value reserved for server-originated messages.
pub const SERVER_SENDER_ID: u32 = 0;

// =============================================================================
// Message kind — the wire projection of `Message`'s tag.
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Join,
    JoinAck,
    Leave,
    WorldState,
    Update,
    Ping,
    Pong,
    EntityState,
    EntityDamage,
    ArrowSpawn,
    ArrowHit,
    PlayerDamage,
    GameRestart,
    Spectate,
    SpectateAck,
    Heartbeat,
}

impl MessageKind {
    fn wire_value(self) -> u8 {
        match self {
            MessageKind::Join => 1,
            MessageKind::JoinAck => 2,
            MessageKind::Leave => 3,
            MessageKind::WorldState => 4,
            MessageKind::Update => 5,
            MessageKind::Ping => 7,
            MessageKind::Pong => 8,
            MessageKind::EntityState => 9,
            MessageKind::EntityDamage => 10,
            MessageKind::ArrowSpawn => 11,
            MessageKind::ArrowHit => 12,
            MessageKind::Heartbeat => 14,
            MessageKind::Spectate => 15,
            MessageKind::SpectateAck => 16,
            MessageKind::PlayerDamage => 17,
            MessageKind::GameRestart => 18,
        }
    }

    fn from_wire_value(v: u8) -> Option<MessageKind> {
        Some(match v {
            1 => MessageKind::Join,
            2 => MessageKind::JoinAck,
            3 => MessageKind::Leave,
            4 => MessageKind::WorldState,
            5 => MessageKind::Update,
            7 => MessageKind::Ping,
            8 => MessageKind::Pong,
            9 => MessageKind::EntityState,
            10 => MessageKind::EntityDamage,
            11 => MessageKind::ArrowSpawn,
            12 => MessageKind::ArrowHit,
            14 => MessageKind::Heartbeat,
            15 => MessageKind::Spectate,
            16 => MessageKind::SpectateAck,
            17 => MessageKind::PlayerDamage,
            18 => MessageKind::GameRestart,
            _ => return None,
        })
    }
}

/// The 9-byte header every message begins with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: MessageKind,
    pub sequence: u32,
    /// Sender's assigned identifier, or `SERVER_SENDER_ID` for server-originated messages.
    pub sender_id: u32,
}

// =============================================================================
// High-level record types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayerAnimState {
    Idle = 0,
    Walking = 1,
    Running = 2,
    Attacking = 3,
    Blocking = 4,
    Jumping = 5,
    Casting = 6,
    DrawingBow = 7,
    HoldingBow = 8,
    Dead = 9,
}

impl PlayerAnimState {
    fn from_wire(v: u8) -> PlayerAnimState {
        match v {
            1 => PlayerAnimState::Walking,
            2 => PlayerAnimState::Running,
            3 => PlayerAnimState::Attacking,
            4 => PlayerAnimState::Blocking,
            5 => PlayerAnimState::Jumping,
            6 => PlayerAnimState::Casting,
            7 => PlayerAnimState::DrawingBow,
            8 => PlayerAnimState::HoldingBow,
            9 => PlayerAnimState::Dead,
            _ => PlayerAnimState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacterClass {
    Paladin = 0,
    Archer = 1,
}

impl CharacterClass {
    fn from_wire(v: u8) -> CharacterClass {
        match v {
            1 => CharacterClass::Archer,
            _ => CharacterClass::Paladin,
        }
    }
}

/// The player-state record broadcast to everyone; 60 bytes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStateRecord {
    pub id: u32,
    pub pos: Vec3,
    pub yaw: f32,
    pub state: PlayerAnimState,
    pub combat_mode: bool,
    pub class: CharacterClass,
    pub health: f32,
    pub animation: String,
    pub active: bool,
}

impl PlayerStateRecord {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.id.to_le_bytes());
        for c in self.pos {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.extend_from_slice(&self.yaw.to_le_bytes());
        out.push(self.state as u8);
        out.push(self.combat_mode as u8);
        out.push(self.class as u8);
        out.extend_from_slice(&self.health.to_le_bytes());
        out.extend_from_slice(&write_fixed_string::<ANIM_LEN>(&self.animation));
        out.push(self.active as u8);
    }

    fn decode(r: &mut Reader) -> Option<PlayerStateRecord> {
        let id = r.read_u32()?;
        let pos = r.read_vec3()?;
        let yaw = r.read_f32()?;
        let state = PlayerAnimState::from_wire(r.read_u8()?);
        let combat_mode = r.read_u8()? != 0;
        let class = CharacterClass::from_wire(r.read_u8()?);
        let health = r.read_f32()?;
        let animation = read_fixed_string::<ANIM_LEN>(&r.read_array::<ANIM_LEN>()?);
        let active = r.read_u8()? != 0;
        Some(PlayerStateRecord {
            id,
            pos,
            yaw,
            state,
            combat_mode,
            class,
            health,
            animation,
            active,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntityKind {
    Chaser = 0,
    Patroller = 1,
}

impl EntityKind {
    fn from_wire(v: u8) -> Option<EntityKind> {
        match v {
            0 => Some(EntityKind::Chaser),
            1 => Some(EntityKind::Patroller),
            _ => None,
        }
    }
}

/// An NPC snapshot record. `extra_u32`/`extra_f32` carry the
/// patroller's lap count and patrol angle; chasers leave them zeroed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: u32,
    pub pos: Vec3,
    pub yaw: f32,
    pub state: u8,
    pub health: f32,
    pub extra_u32: u32,
    pub extra_f32: f32,
}

impl EntityRecord {
    fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.kind as u8);
        out.extend_from_slice(&self.id.to_le_bytes());
        for c in self.pos {
            out.extend_from_slice(&c.to_le_bytes());
        }
        out.extend_from_slice(&self.yaw.to_le_bytes());
        out.push(self.state);
        out.extend_from_slice(&self.health.to_le_bytes());
        out.extend_from_slice(&self.extra_u32.to_le_bytes());
        out.extend_from_slice(&self.extra_f32.to_le_bytes());
    }

    fn decode(r: &mut Reader) -> Option<EntityRecord> {
        let kind = EntityKind::from_wire(r.read_u8()?)?;
        let id = r.read_u32()?;
        let pos = r.read_vec3()?;
        let yaw = r.read_f32()?;
        let state = r.read_u8()?;
        let health = r.read_f32()?;
        let extra_u32 = r.read_u32()?;
        let extra_f32 = r.read_f32()?;
        Some(EntityRecord {
            kind,
            id,
            pos,
            yaw,
            state,
            health,
            extra_u32,
            extra_f32,
        })
    }
}

// =============================================================================
// Message — the decoded payload, keyed by MessageKind.
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Join { name: String },
    JoinAck { assigned_id: u32, state: PlayerStateRecord },
    Leave,
    WorldState { state_seq: u32, players: Vec<PlayerStateRecord> },
    Update { state: PlayerStateRecord },
    Ping,
    Pong,
    EntityState { entities: Vec<EntityRecord> },
    EntityDamage { target_id: u32, damage: f32, attacker_id: u32 },
    ArrowSpawn { arrow_id: u32, pos: Vec3, dir: Vec3, shooter_id: u32 },
    ArrowHit { arrow_id: u32, hit_pos: Vec3, hit_entity_id: u32 },
    PlayerDamage { target_id: u32, damage: f32, attacker_entity_id: u32, knockback: Vec3 },
    GameRestart { reason: RestartReason },
    Spectate,
    SpectateAck,
    Heartbeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RestartReason {
    PlayerDied = 0,
    NpcDied = 1,
    Manual = 2,
}

impl RestartReason {
    fn from_wire(v: u32) -> RestartReason {
        match v {
            0 => RestartReason::PlayerDied,
            1 => RestartReason::NpcDied,
            _ => RestartReason::Manual,
        }
    }
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Join { .. } => MessageKind::Join,
            Message::JoinAck { .. } => MessageKind::JoinAck,
            Message::Leave => MessageKind::Leave,
            Message::WorldState { .. } => MessageKind::WorldState,
            Message::Update { .. } => MessageKind::Update,
            Message::Ping => MessageKind::Ping,
            Message::Pong => MessageKind::Pong,
            Message::EntityState { .. } => MessageKind::EntityState,
            Message::EntityDamage { .. } => MessageKind::EntityDamage,
            Message::ArrowSpawn { .. } => MessageKind::ArrowSpawn,
            Message::ArrowHit { .. } => MessageKind::ArrowHit,
            Message::PlayerDamage { .. } => MessageKind::PlayerDamage,
            Message::GameRestart { .. } => MessageKind::GameRestart,
            Message::Spectate => MessageKind::Spectate,
            Message::SpectateAck => MessageKind::SpectateAck,
            Message::Heartbeat => MessageKind::Heartbeat,
        }
    }

    /// Encodes the full datagram: header followed by this message's payload.
    pub fn encode(&self, sequence: u32, sender_id: u32) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + 64);
        out.push(self.kind().wire_value());
        out.extend_from_slice(&sequence.to_le_bytes());
        out.extend_from_slice(&sender_id.to_le_bytes());

        match self {
            Message::Join { name } => {
                out.extend_from_slice(&write_fixed_string::<NAME_LEN>(name));
            }
            Message::JoinAck { assigned_id, state } => {
                out.extend_from_slice(&assigned_id.to_le_bytes());
                state.encode(&mut out);
            }
            Message::Leave | Message::Ping | Message::Pong | Message::Spectate
            | Message::SpectateAck | Message::Heartbeat => {}
            Message::WorldState { state_seq, players } => {
                out.extend_from_slice(&state_seq.to_le_bytes());
                out.push(players.len().min(MAX_PLAYERS_PER_SNAPSHOT) as u8);
                for p in players.iter().take(MAX_PLAYERS_PER_SNAPSHOT) {
                    p.encode(&mut out);
                }
            }
            Message::Update { state } => {
                state.encode(&mut out);
            }
            Message::EntityState { entities } => {
                out.push(entities.len().min(MAX_ENTITIES_PER_SNAPSHOT) as u8);
                for e in entities.iter().take(MAX_ENTITIES_PER_SNAPSHOT) {
                    e.encode(&mut out);
                }
            }
            Message::EntityDamage { target_id, damage, attacker_id } => {
                out.extend_from_slice(&target_id.to_le_bytes());
                out.extend_from_slice(&damage.to_le_bytes());
                out.extend_from_slice(&attacker_id.to_le_bytes());
            }
            Message::ArrowSpawn { arrow_id, pos, dir, shooter_id } => {
                out.extend_from_slice(&arrow_id.to_le_bytes());
                for c in pos {
                    out.extend_from_slice(&c.to_le_bytes());
                }
                for c in dir {
                    out.extend_from_slice(&c.to_le_bytes());
                }
                out.extend_from_slice(&shooter_id.to_le_bytes());
            }
            Message::ArrowHit { arrow_id, hit_pos, hit_entity_id } => {
                out.extend_from_slice(&arrow_id.to_le_bytes());
                for c in hit_pos {
                    out.extend_from_slice(&c.to_le_bytes());
                }
                out.extend_from_slice(&hit_entity_id.to_le_bytes());
            }
            Message::PlayerDamage { target_id, damage, attacker_entity_id, knockback } => {
                out.extend_from_slice(&target_id.to_le_bytes());
                out.extend_from_slice(&damage.to_le_bytes());
                out.extend_from_slice(&attacker_entity_id.to_le_bytes());
                for c in knockback {
                    out.extend_from_slice(&c.to_le_bytes());
                }
            }
            Message::GameRestart { reason } => {
                out.extend_from_slice(&(*reason as u32).to_le_bytes());
            }
        }
        out
    }
}

/// Parses a datagram into its header and message. Returns `None` for any
/// malformed input: short datagrams, unknown kinds, or a payload smaller
/// than the kind declares — never an `Err`, since a drop is the only
/// defined response.
pub fn decode(buf: &[u8]) -> Option<(Header, Message)> {
    if buf.len() < HEADER_SIZE {
        return None;
    }
    let kind = MessageKind::from_wire_value(buf[0])?;
    let sequence = u32::from_le_bytes([buf[1], buf[2], buf[3], buf[4]]);
    let sender_id = u32::from_le_bytes([buf[5], buf[6], buf[7], buf[8]]);
    let header = Header { kind, sequence, sender_id };

    let mut r = Reader::new(&buf[HEADER_SIZE..]);
    let message = match kind {
        MessageKind::Join => Message::Join { name: read_fixed_string::<NAME_LEN>(&r.read_array::<NAME_LEN>()?) },
        MessageKind::JoinAck => {
            let assigned_id = r.read_u32()?;
            let state = PlayerStateRecord::decode(&mut r)?;
            Message::JoinAck { assigned_id, state }
        }
        MessageKind::Leave => Message::Leave,
        MessageKind::WorldState => {
            let state_seq = r.read_u32()?;
            let count = r.read_u8()? as usize;
            let mut players = Vec::with_capacity(count.min(MAX_PLAYERS_PER_SNAPSHOT));
            for _ in 0..count {
                players.push(PlayerStateRecord::decode(&mut r)?);
            }
            Message::WorldState { state_seq, players }
        }
        MessageKind::Update => Message::Update { state: PlayerStateRecord::decode(&mut r)? },
        MessageKind::Ping => Message::Ping,
        MessageKind::Pong => Message::Pong,
        MessageKind::EntityState => {
            let count = r.read_u8()? as usize;
            let mut entities = Vec::with_capacity(count.min(MAX_ENTITIES_PER_SNAPSHOT));
            for _ in 0..count {
                entities.push(EntityRecord::decode(&mut r)?);
            }
            Message::EntityState { entities }
        }
        MessageKind::EntityDamage => Message::EntityDamage {
            target_id: r.read_u32()?,
            damage: r.read_f32()?,
            attacker_id: r.read_u32()?,
        },
        MessageKind::ArrowSpawn => Message::ArrowSpawn {
            arrow_id: r.read_u32()?,
            pos: r.read_vec3()?,
            dir: r.read_vec3()?,
            shooter_id: r.read_u32()?,
        },
        MessageKind::ArrowHit => Message::ArrowHit {
            arrow_id: r.read_u32()?,
            hit_pos: r.read_vec3()?,
            hit_entity_id: r.read_u32()?,
        },
        MessageKind::PlayerDamage => Message::PlayerDamage {
            target_id: r.read_u32()?,
            damage: r.read_f32()?,
            attacker_entity_id: r.read_u32()?,
            knockback: r.read_vec3()?,
        },
        MessageKind::GameRestart => Message::GameRestart { reason: RestartReason::from_wire(r.read_u32()?) },
        MessageKind::Spectate => Message::Spectate,
        MessageKind::SpectateAck => Message::SpectateAck,
        MessageKind::Heartbeat => Message::Heartbeat,
    };

    Some((header, message))
}

// =============================================================================
// Reader — a read cursor over a payload slice. Every getter returns `None`
// once the declared payload runs short, matching msg_read_*'s underrun
// handling except the Rust signature makes the short-read case impossible
// to ignore.
// =============================================================================

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Reader<'a> {
        Reader { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        let bytes = self.read_array::<4>()?;
        Some(u32::from_le_bytes(bytes))
    }

    fn read_f32(&mut self) -> Option<f32> {
        let bytes = self.read_array::<4>()?;
        Some(f32::from_le_bytes(bytes))
    }

    fn read_vec3(&mut self) -> Option<Vec3> {
        Some([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        if self.pos + N > self.data.len() {
            return None;
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_player(id: u32) -> PlayerStateRecord {
        PlayerStateRecord {
            id,
            pos: [0.0, 0.0, 0.0],
            yaw: 0.0,
            state: PlayerAnimState::Idle,
            combat_mode: false,
            class: CharacterClass::Paladin,
            health: 100.0,
            animation: String::new(),
            active: true,
        }
    }

    /// One player at the origin must be exactly 9 + 4 + 1 + 60 = 74 bytes
    /// on the wire: header + state_seq + player count + one record.
    #[test]
    fn world_state_single_player_matches_conformance_fixture() {
        let msg = Message::WorldState { state_seq: 1, players: vec![sample_player(1)] };
        let bytes = msg.encode(1, SERVER_SENDER_ID);
        assert_eq!(bytes.len(), 74);
        assert_eq!(PLAYER_RECORD_SIZE, 60);
    }

    #[test]
    fn encode_decode_round_trips_join() {
        let msg = Message::Join { name: "Elwynn".to_string() };
        let bytes = msg.encode(5, 0);
        let (header, decoded) = decode(&bytes).expect("valid datagram");
        assert_eq!(header.kind, MessageKind::Join);
        assert_eq!(header.sequence, 5);
        assert_eq!(decoded, msg);
    }

    #[test]
    fn encode_decode_round_trips_entity_state_with_patroller_extras() {
        let entities = vec![EntityRecord {
            kind: EntityKind::Patroller,
            id: 7,
            pos: [1.0, 2.0, 3.0],
            yaw: 90.0,
            state: 0,
            health: 500.0,
            extra_u32: 3,
            extra_f32: 1.57,
        }];
        let msg = Message::EntityState { entities: entities.clone() };
        let bytes = msg.encode(9, SERVER_SENDER_ID);
        let (_, decoded) = decode(&bytes).expect("valid datagram");
        assert_eq!(decoded, Message::EntityState { entities });
    }

    #[test]
    fn short_datagram_is_dropped() {
        let bytes = [1u8, 2, 3];
        assert_eq!(decode(&bytes), None);
    }

    #[test]
    fn unknown_kind_is_dropped() {
        let mut bytes = vec![250u8];
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(decode(&bytes), None);
    }

    #[test]
    fn truncated_payload_is_dropped() {
        // A join-ack header with no payload at all: declares a bigger
        // payload than it has.
        let mut bytes = vec![MessageKind::JoinAck.wire_value()];
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert_eq!(decode(&bytes), None);
    }
}
