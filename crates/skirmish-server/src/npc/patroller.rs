// patroller.rs — Patrolling flyer AI: circular patrol -> descent -> wait ->
// attack -> ascent. Converted in spirit from myq2-game/src/m_move.rs's
// (MoveContext, sv_movestep, m_move_to_goal) and g_monster.rs's move-state
// functions, generalized to this game's six-state patroller.

use std::f32::consts::TAU;

use skirmish_common::math::{vector_length, vector_subtract, vector_normalize, Vec3};

use super::{horizontal_distance, nearest_within, PlayerDamageEvent, PlayerSnapshot};

pub const PATROL_RADIUS: f32 = 100.0;
pub const PATROL_HEIGHT: f32 = 80.0;
pub const PATROL_SPEED: f32 = 25.0;
pub const LAPS_BEFORE_LANDING: u32 = 2;
pub const WAIT_TIME: f32 = 5.0;
pub const ATTACK_RANGE: f32 = 40.0;
pub const ATTACK_TIMER_DURATION: f32 = 2.0;
pub const TAKEOFF_SPEED: f32 = 15.0;
pub const TAKEOFF_HEIGHT_FRACTION: f32 = 0.8;
pub const LANDING_APPROACH_HEIGHT: f32 = 20.0;
pub const LANDING_APPROACH_THRESHOLD: f32 = 10.0;
pub const LANDING_SNAP_THRESHOLD: f32 = 5.0;
pub const LANDING_DESCENT_MIN_SPEED: f32 = 2.0;

/// Fixed world coordinate the patroller lands at (original_source's
/// DRAGON_LANDING_SPOT_{X,Y,Z}).
pub const LANDING_SPOT: Vec3 = [0.0, 5.0, 50.0];

pub const MAX_HEALTH: f32 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PatrollerState {
    Patrol = 0,
    FlyingToLand = 1,
    Landing = 2,
    Wait = 3,
    TakingOff = 4,
    Attacking = 5,
}

pub struct Patroller {
    pub id: u32,
    pub pos: Vec3,
    pub yaw: f32,
    pub state: PatrollerState,
    pub health: f32,
    pub active: bool,
    pub patrol_center: [f32; 2],
    pub patrol_angle: f32,
    pub laps_completed: u32,
    pub wait_timer: f32,
    pub attack_timer: f32,
    /// 0 means no target.
    pub target: u32,
}

impl Patroller {
    pub fn spawn(id: u32, patrol_center: [f32; 2]) -> Patroller {
        let pos = patrol_point(patrol_center, 0.0);
        Patroller {
            id,
            pos,
            yaw: 0.0,
            state: PatrollerState::Patrol,
            health: MAX_HEALTH,
            active: true,
            patrol_center,
            patrol_angle: 0.0,
            laps_completed: 0,
            wait_timer: 0.0,
            attack_timer: 0.0,
            target: 0,
        }
    }

    /// A patroller's death triggers the global restart same as a chaser's,
    /// but the restart path only respawns chasers and players (see
    /// DESIGN.md) — this is an intentional asymmetry, not an oversight.
    pub fn take_damage(&mut self, damage: f32) -> bool {
        self.health -= damage;
        if self.health <= 0.0 {
            self.active = false;
            true
        } else {
            false
        }
    }

    pub fn update(&mut self, dt: f32, players: &[PlayerSnapshot], ai_enabled: bool, out: &mut Vec<PlayerDamageEvent>) {
        match self.state {
            PatrollerState::Patrol => self.update_patrol(dt, players, ai_enabled),
            PatrollerState::FlyingToLand => self.update_flying_to_land(dt),
            PatrollerState::Landing => self.update_landing(dt),
            PatrollerState::Wait => self.update_wait(dt, players, ai_enabled),
            PatrollerState::Attacking => self.update_attacking(dt, players, out),
            PatrollerState::TakingOff => self.update_taking_off(dt),
        }
    }

    fn update_patrol(&mut self, dt: f32, _players: &[PlayerSnapshot], _ai_enabled: bool) {
        self.patrol_angle += (PATROL_SPEED / PATROL_RADIUS) * dt;
        if self.patrol_angle >= TAU {
            self.patrol_angle -= TAU;
            self.laps_completed += 1;
            if self.laps_completed >= LAPS_BEFORE_LANDING {
                self.laps_completed = 0;
                self.state = PatrollerState::FlyingToLand;
                return;
            }
        }

        let target = patrol_point(self.patrol_center, self.patrol_angle);
        self.steer_toward(&target, PATROL_SPEED * dt);
    }

    fn update_flying_to_land(&mut self, dt: f32) {
        let approach = [LANDING_SPOT[0], LANDING_SPOT[1] + LANDING_APPROACH_HEIGHT, LANDING_SPOT[2]];
        self.steer_toward(&approach, PATROL_SPEED * dt);
        if vector_length(&vector_subtract(&approach, &self.pos)) <= LANDING_APPROACH_THRESHOLD {
            self.state = PatrollerState::Landing;
        }
    }

    fn update_landing(&mut self, dt: f32) {
        let distance = vector_length(&vector_subtract(&LANDING_SPOT, &self.pos));
        if distance <= LANDING_SNAP_THRESHOLD {
            self.pos = LANDING_SPOT;
            self.state = PatrollerState::Wait;
            self.wait_timer = 0.0;
            return;
        }
        let speed = distance.clamp(LANDING_DESCENT_MIN_SPEED, PATROL_SPEED);
        self.steer_toward(&LANDING_SPOT, speed * dt);
    }

    fn update_wait(&mut self, dt: f32, players: &[PlayerSnapshot], ai_enabled: bool) {
        if ai_enabled {
            if let Some(target) = nearest_within(&self.pos, players, ATTACK_RANGE) {
                self.target = target.id;
                self.attack_timer = ATTACK_TIMER_DURATION;
                self.state = PatrollerState::Attacking;
                return;
            }
        }
        self.wait_timer += dt;
        if self.wait_timer >= WAIT_TIME {
            self.state = PatrollerState::TakingOff;
        }
    }

    fn update_attacking(&mut self, dt: f32, players: &[PlayerSnapshot], _out: &mut Vec<PlayerDamageEvent>) {
        self.attack_timer -= dt;
        if self.attack_timer <= 0.0 {
            let still_in_range = players
                .iter()
                .find(|p| p.id == self.target)
                .map(|p| horizontal_distance(&self.pos, &p.pos) <= ATTACK_RANGE)
                .unwrap_or(false);
            if still_in_range {
                self.attack_timer = ATTACK_TIMER_DURATION;
            } else {
                self.target = 0;
                self.state = PatrollerState::Wait;
                self.wait_timer = 0.0;
            }
        }
    }

    fn update_taking_off(&mut self, dt: f32) {
        self.pos[1] += TAKEOFF_SPEED * dt;
        if self.pos[1] >= PATROL_HEIGHT * TAKEOFF_HEIGHT_FRACTION {
            self.patrol_angle = 0.0;
            self.state = PatrollerState::Patrol;
        }
    }

    fn steer_toward(&mut self, target: &Vec3, max_step: f32) {
        let mut dir = vector_subtract(target, &self.pos);
        let distance = vector_length(&dir);
        if distance <= f32::EPSILON {
            return;
        }
        vector_normalize(&mut dir);
        let step = max_step.min(distance);
        self.pos = [
            self.pos[0] + dir[0] * step,
            self.pos[1] + dir[1] * step,
            self.pos[2] + dir[2] * step,
        ];
        self.yaw = dir[0].atan2(dir[2]).to_degrees();
    }
}

fn patrol_point(center: [f32; 2], angle: f32) -> Vec3 {
    [
        center[0] + angle.cos() * PATROL_RADIUS,
        PATROL_HEIGHT + 5.0 * (2.0 * angle).sin(),
        center[1] + angle.sin() * 0.7 * PATROL_RADIUS,
    ]
}
