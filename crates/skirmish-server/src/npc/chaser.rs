// chaser.rs — Melee chaser AI: roam -> chase -> attack, with a mid-animation
// hit window. Converted in spirit from myq2-game/src/g_ai.rs's
// ai_run/ai_charge state handling and myq2-game/src/m_move.rs's
// sv_new_chase_dir/m_move_to_goal, generalized to this game's five-state
// chaser.

use std::f32::consts::TAU;

use rand::Rng;

use skirmish_common::math::{vector_ma, vector_scale, vector_subtract, vector_normalize, Vec3, VEC3_ORIGIN};

use super::{face_toward, horizontal_distance, nearest_within, PlayerDamageEvent, PlayerSnapshot};

pub const MAX_HEALTH: f32 = 100.0;
pub const DETECTION_RADIUS: f32 = 10.0;
pub const LOSE_RADIUS: f32 = 20.0;
pub const ATTACK_DISTANCE: f32 = 2.0;
pub const ROAM_SPEED: f32 = 2.0;
pub const CHASE_SPEED: f32 = 5.0;
pub const ROAM_CHANGE_INTERVAL: f32 = 3.0;
pub const ATTACK_DURATION: f32 = 1.5;
pub const ATTACK_DAMAGE: f32 = 70.0;
pub const KNOCKBACK_FORCE: f32 = 12.0;
pub const KNOCKBACK_VERTICAL: f32 = 0.3;
pub const HIT_WINDOW_START: f32 = 0.30;
pub const HIT_WINDOW_END: f32 = 0.70;
pub const STUN_DURATION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ChaserState {
    Roaming = 0,
    Chasing = 1,
    Attacking = 2,
    Idle = 3,
    Stunned = 4,
}

pub struct Chaser {
    pub id: u32,
    pub pos: Vec3,
    pub yaw: f32,
    pub state: ChaserState,
    pub health: f32,
    pub active: bool,
    /// 0 means no target.
    pub target: u32,
    pub roam_dir: [f32; 2],
    pub roam_timer: f32,
    pub attack_remaining: f32,
    pub attack_total: f32,
    pub stun_timer: f32,
    pub hit_this_attack: bool,
    pub spawn_pos: Vec3,
}

impl Chaser {
    pub fn spawn(id: u32, spawn_pos: Vec3, rng: &mut impl Rng) -> Chaser {
        let mut chaser = Chaser {
            id,
            pos: spawn_pos,
            yaw: 0.0,
            state: ChaserState::Roaming,
            health: MAX_HEALTH,
            active: true,
            target: 0,
            roam_dir: [0.0, 0.0],
            roam_timer: 0.0,
            attack_remaining: 0.0,
            attack_total: 0.0,
            stun_timer: 0.0,
            hit_this_attack: false,
            spawn_pos,
        };
        chaser.pick_new_roam_direction(rng);
        chaser
    }

    fn pick_new_roam_direction(&mut self, rng: &mut impl Rng) {
        let angle: f32 = rng.gen_range(0.0..TAU);
        self.roam_dir = [angle.cos(), angle.sin()];
        self.roam_timer = ROAM_CHANGE_INTERVAL;
    }

    /// Resets to full health at the original spawn point, roaming in a
    /// fresh direction. Called on a global restart.
    pub fn respawn(&mut self, rng: &mut impl Rng) {
        self.pos = self.spawn_pos;
        self.health = MAX_HEALTH;
        self.active = true;
        self.state = ChaserState::Roaming;
        self.target = 0;
        self.attack_remaining = 0.0;
        self.attack_total = 0.0;
        self.stun_timer = 0.0;
        self.hit_this_attack = false;
        self.pick_new_roam_direction(rng);
    }

    /// Damage from a player's entity-damage message: always steals
    /// aggression and stuns. Returns true once health has dropped to zero
    /// or below, so the caller can trigger the restart path.
    pub fn take_damage(&mut self, damage: f32, attacker_id: u32) -> bool {
        self.health -= damage;
        self.state = ChaserState::Stunned;
        self.stun_timer = STUN_DURATION;
        self.hit_this_attack = false;
        self.target = attacker_id;
        if self.health <= 0.0 {
            self.active = false;
            true
        } else {
            false
        }
    }

    fn find_target<'a>(&self, players: &'a [PlayerSnapshot]) -> Option<&'a PlayerSnapshot> {
        players.iter().find(|p| p.id == self.target)
    }

    /// Advances the state machine by `dt` seconds. `ai_enabled = false`
    /// forces idle every tick (multiplayer-test mode) without otherwise
    /// touching timers. Damage dealt this tick is pushed to `out`.
    pub fn update(&mut self, dt: f32, players: &[PlayerSnapshot], ai_enabled: bool, rng: &mut impl Rng, out: &mut Vec<PlayerDamageEvent>) {
        if !ai_enabled {
            self.state = ChaserState::Idle;
            return;
        }

        match self.state {
            ChaserState::Idle => {}
            ChaserState::Roaming => self.update_roaming(dt, players, rng),
            ChaserState::Chasing => self.update_chasing(dt, players),
            ChaserState::Attacking => self.update_attacking(dt, players, out),
            ChaserState::Stunned => self.update_stunned(dt),
        }
    }

    fn update_roaming(&mut self, dt: f32, players: &[PlayerSnapshot], rng: &mut impl Rng) {
        self.roam_timer -= dt;
        if self.roam_timer <= 0.0 {
            self.pick_new_roam_direction(rng);
        }

        let step = vector_scale(&[self.roam_dir[0], 0.0, self.roam_dir[1]], ROAM_SPEED * dt);
        self.pos = vector_ma(&self.pos, 1.0, &step);
        self.yaw = self.roam_dir[0].atan2(self.roam_dir[1]).to_degrees();

        if let Some(target) = nearest_within(&self.pos, players, DETECTION_RADIUS) {
            self.target = target.id;
            self.state = ChaserState::Chasing;
        }
    }

    fn update_chasing(&mut self, dt: f32, players: &[PlayerSnapshot]) {
        let target = match self.find_target(players) {
            Some(t) => *t,
            None => {
                self.target = 0;
                self.state = ChaserState::Roaming;
                return;
            }
        };

        let distance = horizontal_distance(&self.pos, &target.pos);
        if distance > LOSE_RADIUS {
            self.target = 0;
            self.state = ChaserState::Roaming;
            return;
        }

        self.yaw = face_toward(&self.pos, &target.pos);

        if distance <= ATTACK_DISTANCE {
            self.state = ChaserState::Attacking;
            self.attack_remaining = ATTACK_DURATION;
            self.attack_total = ATTACK_DURATION;
            self.hit_this_attack = false;
            return;
        }

        let mut dir = vector_subtract(&[target.pos[0], 0.0, target.pos[2]], &[self.pos[0], 0.0, self.pos[2]]);
        vector_normalize(&mut dir);
        let step = vector_scale(&dir, CHASE_SPEED * dt);
        self.pos = vector_ma(&self.pos, 1.0, &step);
    }

    fn update_attacking(&mut self, dt: f32, players: &[PlayerSnapshot], out: &mut Vec<PlayerDamageEvent>) {
        self.attack_remaining = (self.attack_remaining - dt).max(0.0);
        let progress = 1.0 - (self.attack_remaining / self.attack_total);

        if !self.hit_this_attack && (HIT_WINDOW_START..=HIT_WINDOW_END).contains(&progress) {
            if let Some(target) = self.find_target(players) {
                let distance = horizontal_distance(&self.pos, &target.pos);
                if distance <= ATTACK_DISTANCE * 2.0 {
                    self.hit_this_attack = true;
                    let mut horizontal = vector_subtract(
                        &[target.pos[0], 0.0, target.pos[2]],
                        &[self.pos[0], 0.0, self.pos[2]],
                    );
                    if vector_normalize(&mut horizontal) == 0.0 {
                        horizontal = VEC3_ORIGIN;
                    }
                    let knockback_dir = [horizontal[0], KNOCKBACK_VERTICAL, horizontal[2]];
                    out.push(PlayerDamageEvent {
                        target_id: target.id,
                        damage: ATTACK_DAMAGE,
                        attacker_entity_id: self.id,
                        knockback: vector_scale(&knockback_dir, KNOCKBACK_FORCE),
                    });
                }
            }
        }

        if self.attack_remaining <= 0.0 {
            self.state = ChaserState::Chasing;
        }
    }

    fn update_stunned(&mut self, dt: f32) {
        self.stun_timer -= dt;
        if self.stun_timer <= 0.0 {
            self.state = if self.target != 0 { ChaserState::Chasing } else { ChaserState::Roaming };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(7)
    }

    /// A motionless player at distance 1.5 receives exactly one
    /// player-damage message with damage 70 and a horizontal knockback of
    /// magnitude 12, within one attack cycle.
    #[test]
    fn attacking_deals_exactly_one_hit_per_cycle() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        let player = PlayerSnapshot { id: 42, pos: [1.5, 0.0, 0.0] };

        chaser.state = ChaserState::Attacking;
        chaser.attack_remaining = ATTACK_DURATION;
        chaser.attack_total = ATTACK_DURATION;
        chaser.target = player.id;
        chaser.hit_this_attack = false;

        let mut events = Vec::new();
        // Step through the whole attack in small slices so the hit window
        // (30%-70% of the animation) is actually crossed tick-by-tick.
        for _ in 0..30 {
            chaser.update(ATTACK_DURATION / 30.0, &[player], true, &mut rng, &mut events);
        }

        assert_eq!(events.len(), 1);
        let hit = &events[0];
        assert_eq!(hit.target_id, 42);
        assert_eq!(hit.damage, ATTACK_DAMAGE);
        let horizontal_mag = (hit.knockback[0].powi(2) + hit.knockback[2].powi(2)).sqrt();
        assert!((horizontal_mag - KNOCKBACK_FORCE).abs() < 1e-4);
        assert_eq!(chaser.state, ChaserState::Chasing);
    }

    #[test]
    fn out_of_range_target_during_hit_window_deals_no_damage() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        let far_player = PlayerSnapshot { id: 42, pos: [50.0, 0.0, 0.0] };
        chaser.state = ChaserState::Attacking;
        chaser.attack_remaining = ATTACK_DURATION;
        chaser.attack_total = ATTACK_DURATION;
        chaser.target = far_player.id;

        let mut events = Vec::new();
        for _ in 0..30 {
            chaser.update(ATTACK_DURATION / 30.0, &[far_player], true, &mut rng, &mut events);
        }
        assert!(events.is_empty());
    }

    #[test]
    fn roaming_player_within_detection_radius_triggers_chase() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        let player = PlayerSnapshot { id: 9, pos: [5.0, 0.0, 0.0] };
        let mut events = Vec::new();
        chaser.update(0.1, &[player], true, &mut rng, &mut events);
        assert_eq!(chaser.state, ChaserState::Chasing);
        assert_eq!(chaser.target, 9);
    }

    #[test]
    fn losing_sight_of_target_returns_to_roaming() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        chaser.state = ChaserState::Chasing;
        chaser.target = 9;
        let far_player = PlayerSnapshot { id: 9, pos: [100.0, 0.0, 0.0] };
        let mut events = Vec::new();
        chaser.update(0.1, &[far_player], true, &mut rng, &mut events);
        assert_eq!(chaser.state, ChaserState::Roaming);
        assert_eq!(chaser.target, 0);
    }

    #[test]
    fn taking_damage_stuns_and_steals_aggression() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        chaser.hit_this_attack = true;
        let died = chaser.take_damage(30.0, 77);
        assert!(!died);
        assert_eq!(chaser.state, ChaserState::Stunned);
        assert_eq!(chaser.target, 77);
        assert!(!chaser.hit_this_attack);
        assert_eq!(chaser.health, 70.0);
    }

    #[test]
    fn lethal_damage_deactivates_the_chaser() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        let died = chaser.take_damage(150.0, 77);
        assert!(died);
        assert!(!chaser.active);
    }

    /// After a restart, a previously-spawned chaser is active again with
    /// full health at its original spawn.
    #[test]
    fn respawn_restores_full_health_and_original_position() {
        let mut rng = rng();
        let spawn_pos = [10.0, 2.0, -5.0];
        let mut chaser = Chaser::spawn(3, spawn_pos, &mut rng);
        chaser.take_damage(100.0, 1);
        chaser.pos = [999.0, 999.0, 999.0];

        chaser.respawn(&mut rng);

        assert!(chaser.active);
        assert_eq!(chaser.health, MAX_HEALTH);
        assert_eq!(chaser.pos, spawn_pos);
        assert_eq!(chaser.state, ChaserState::Roaming);
        assert_eq!(chaser.target, 0);
    }

    #[test]
    fn multiplayer_test_mode_forces_idle_every_tick() {
        let mut rng = rng();
        let mut chaser = Chaser::spawn(1, [0.0, 0.0, 0.0], &mut rng);
        chaser.state = ChaserState::Chasing;
        let player = PlayerSnapshot { id: 9, pos: [1.0, 0.0, 0.0] };
        let mut events = Vec::new();
        chaser.update(0.1, &[player], false, &mut rng, &mut events);
        assert_eq!(chaser.state, ChaserState::Idle);
        assert!(events.is_empty());
    }
}
