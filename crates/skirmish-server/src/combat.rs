// combat.rs — Damage application and the global restart.
// Converted in spirit from myq2-game/src/g_combat.rs's t_damage, but this
// game's damage model has no armor, no damage flags, and no radius
// splash: an entity-damage packet names its target and its amount, full stop.

use skirmish_common::protocol::{PlayerAnimState, RestartReason};

use crate::logging::log_info;
use crate::server::Server;

/// Looks up the target by entity id and applies damage to it. Unknown
/// target ids are dropped silently — this is the only lookup failure mode,
/// there is no error to propagate.
///
/// Returns `Some(reason)` once the target's health reaches zero, so the
/// caller can trigger the restart broadcast.
pub fn handle_entity_damage(server: &mut Server, target_id: u32, damage: f32, attacker_id: u32) -> Option<RestartReason> {
    if let Some(chaser) = server.chasers.iter_mut().find(|c| c.id == target_id) {
        log_info(&format!("chaser {target_id} took {damage} damage from {attacker_id}"));
        if chaser.take_damage(damage, attacker_id) {
            return Some(RestartReason::NpcDied);
        }
        return None;
    }

    if let Some(patroller) = server.patrollers.iter_mut().find(|p| p.id == target_id) {
        log_info(&format!("patroller {target_id} took {damage} damage from {attacker_id}"));
        if patroller.take_damage(damage) {
            return Some(RestartReason::NpcDied);
        }
        return None;
    }

    None
}

/// Global restart: every chaser that was ever spawned comes back to full
/// health at its original position; every currently active player respawns
/// at a fresh point. Patrollers are deliberately excluded — see DESIGN.md's
/// note on the restart/death asymmetry.
pub fn restart(server: &mut Server, reason: RestartReason) {
    log_info(&format!("restart: {reason:?}"));

    for chaser in server.chasers.iter_mut() {
        chaser.respawn(&mut server.rng);
    }

    let new_positions: Vec<_> = (0..server.sessions.active_player_count())
        .map(|_| crate::session::random_spawn_position(&mut server.rng))
        .collect();

    for (player, pos) in server.sessions.active_players_mut().zip(new_positions) {
        player.state.health = 100.0;
        player.state.state = PlayerAnimState::Idle;
        player.state.active = true;
        player.state.pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
    use std::time::Instant;

    fn test_server() -> Server {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        Server::with_seed(ServerConfig::default(), socket, 42)
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    /// Two 50-damage hits on a 100-health chaser kill it and report npc-died.
    #[test]
    fn two_hits_of_fifty_kill_a_chaser_and_trigger_restart() {
        let mut server = test_server();
        let chaser_id = server.chasers[0].id;

        let first = handle_entity_damage(&mut server, chaser_id, 50.0, chaser_id);
        assert!(first.is_none());

        let second = handle_entity_damage(&mut server, chaser_id, 50.0, chaser_id);
        assert_eq!(second, Some(RestartReason::NpcDied));
        assert!(!server.chasers[0].active);
    }

    #[test]
    fn restart_revives_every_chaser_at_full_health_and_original_spawn() {
        let mut server = test_server();
        let chaser_id = server.chasers[0].id;
        let spawn_pos = server.chasers[0].spawn_pos;
        handle_entity_damage(&mut server, chaser_id, 1000.0, chaser_id);
        assert!(!server.chasers[0].active);

        restart(&mut server, RestartReason::NpcDied);

        assert!(server.chasers[0].active);
        assert_eq!(server.chasers[0].health, crate::npc::chaser::MAX_HEALTH);
        assert_eq!(server.chasers[0].pos, spawn_pos);
    }

    #[test]
    fn restart_heals_and_respawns_every_active_player() {
        let mut server = test_server();
        let now = Instant::now();
        server.sessions.join(addr(1), "A".to_string(), [0.0, 0.0, 0.0], now);
        if let Some(p) = server.sessions.find_player_by_addr_mut(addr(1)) {
            p.state.health = 1.0;
        }

        restart(&mut server, RestartReason::NpcDied);

        let player = server.sessions.find_player_by_addr(addr(1)).unwrap();
        assert_eq!(player.state.health, 100.0);
        assert_eq!(player.state.state, PlayerAnimState::Idle);
    }

    #[test]
    fn damage_to_unknown_entity_id_is_a_no_op() {
        let mut server = test_server();
        let result = handle_entity_damage(&mut server, 99999, 10.0, 1);
        assert!(result.is_none());
    }
}
