// npc/mod.rs — NPC AI state machines. Converted in spirit from
// myq2-game/src/g_ai.rs's AiContext pattern (a context struct the state
// functions borrow) and myq2-game/src/m_move.rs / g_monster.rs's
// per-monster move-state functions, but flattened: each NPC here is one
// plain struct with an explicit `update` method instead of edicts indexed
// into a global array.

pub mod chaser;
pub mod patroller;

use skirmish_common::math::Vec3;

/// A read-only view of one active player, handed to the AI each tick.
/// The AI never mutates player state directly — damage flows out as
/// `PlayerDamageEvent`s for the combat arbiter to apply.
#[derive(Debug, Clone, Copy)]
pub struct PlayerSnapshot {
    pub id: u32,
    pub pos: Vec3,
}

/// Emitted by an attacking NPC when its hit window lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerDamageEvent {
    pub target_id: u32,
    pub damage: f32,
    pub attacker_entity_id: u32,
    pub knockback: Vec3,
}

/// Horizontal (xz-plane) distance. All of this game's AI range checks
/// ignore altitude — there is no jumping to reason about on the server.
pub fn horizontal_distance(a: &Vec3, b: &Vec3) -> f32 {
    let dx = a[0] - b[0];
    let dz = a[2] - b[2];
    (dx * dx + dz * dz).sqrt()
}

/// Yaw, in degrees, that faces from `from` toward `to` in the horizontal plane.
pub fn face_toward(from: &Vec3, to: &Vec3) -> f32 {
    let dx = to[0] - from[0];
    let dz = to[2] - from[2];
    dx.atan2(dz).to_degrees()
}

/// The nearest player snapshot within `radius`, if any.
pub fn nearest_within(pos: &Vec3, players: &[PlayerSnapshot], radius: f32) -> Option<PlayerSnapshot> {
    players
        .iter()
        .map(|p| (*p, horizontal_distance(pos, &p.pos)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
        .map(|(p, _)| p)
}
