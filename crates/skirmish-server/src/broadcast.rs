// broadcast.rs — Snapshot construction and outbound fan-out. Converted in
// spirit from myq2-server/src/sv_send.rs's SV_Multicast/SV_BroadcastCommand,
// but there is no multicast grouping here: every snapshot goes to every
// active endpoint, and the few relays enumerate their own recipient list
// instead of going through a PVS/area filter.

use std::net::SocketAddr;

use skirmish_common::math::Vec3;
use skirmish_common::protocol::{EntityKind, EntityRecord, Message};

use crate::net;
use crate::server::Server;

/// Builds the world-state snapshot: every active player, in session-table
/// order, capped at `MAX_PLAYERS_PER_SNAPSHOT` by the codec itself.
pub fn world_state(server: &mut Server) -> Message {
    let state_seq = server.next_state_seq();
    let players = server.sessions.active_players().map(|p| p.state.clone()).collect();
    Message::WorldState { state_seq, players }
}

/// Builds the entity-state snapshot: every active chaser and patroller.
/// A patroller's lap count and patrol angle ride in `extra_u32`/`extra_f32`;
/// chasers leave both zeroed.
pub fn entity_state(server: &Server) -> Message {
    let mut entities: Vec<EntityRecord> = server
        .chasers
        .iter()
        .filter(|c| c.active)
        .map(|c| EntityRecord {
            kind: EntityKind::Chaser,
            id: c.id,
            pos: c.pos,
            yaw: c.yaw,
            state: c.state as u8,
            health: c.health,
            extra_u32: 0,
            extra_f32: 0.0,
        })
        .collect();

    entities.extend(server.patrollers.iter().filter(|p| p.active).map(|p| EntityRecord {
        kind: EntityKind::Patroller,
        id: p.id,
        pos: p.pos,
        yaw: p.yaw,
        state: p.state as u8,
        health: p.health,
        extra_u32: p.laps_completed,
        extra_f32: p.patrol_angle,
    }));

    Message::EntityState { entities }
}

/// Sends one message to one endpoint, stamping it with the next sequence number.
pub fn send_to(server: &mut Server, addr: SocketAddr, msg: &Message) {
    let sequence = server.next_sequence();
    let bytes = msg.encode(sequence, skirmish_common::protocol::SERVER_SENDER_ID);
    net::send_to(&server.socket, addr, &bytes);
}

/// Sends one message to every active player and spectator. Used for the
/// periodic world-state/entity-state broadcasts, and `GameRestart`.
pub fn broadcast_all(server: &mut Server, msg: &Message) {
    let addrs: Vec<SocketAddr> = server
        .sessions
        .active_players()
        .map(|p| p.addr)
        .chain(server.sessions.active_spectator_addrs())
        .collect();
    for addr in addrs {
        send_to(server, addr, msg);
    }
}

/// Sends one message to every active player except `except`, used to relay
/// arrow-spawn and arrow-hit notifications back out to everyone but the
/// player who fired or reported the hit.
pub fn relay_to_others(server: &mut Server, msg: &Message, except: SocketAddr) {
    let addrs: Vec<SocketAddr> = server.sessions.active_players().map(|p| p.addr).filter(|a| *a != except).collect();
    for addr in addrs {
        send_to(server, addr, msg);
    }
}

/// Relays an entity-damage report to the host only — the active session
/// with the smallest assigned id. A legacy artifact of the single-host
/// authority this protocol inherited (see DESIGN.md); silently does
/// nothing if there is no host to relay to.
pub fn relay_to_host(server: &mut Server, msg: &Message) {
    if let Some(host_addr) = server.sessions.host().map(|p| p.addr) {
        send_to(server, host_addr, msg);
    }
}

pub fn player_damage(server: &mut Server, target_id: u32, damage: f32, attacker_entity_id: u32, knockback: Vec3) {
    if let Some(target_addr) = server.sessions.find_player_by_id(target_id).map(|p| p.addr) {
        let msg = Message::PlayerDamage { target_id, damage, attacker_entity_id, knockback };
        send_to(server, target_addr, &msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::{IpAddr, Ipv4Addr, UdpSocket};
    use std::time::Instant;

    fn test_server() -> Server {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        Server::with_seed(ServerConfig::default(), socket, 11)
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
    }

    #[test]
    fn world_state_lists_only_active_players() {
        let mut server = test_server();
        server.sessions.join(addr(1), "A".to_string(), [0.0, 0.0, 0.0], Instant::now());
        server.sessions.join(addr(2), "B".to_string(), [0.0, 0.0, 0.0], Instant::now());
        server.sessions.leave(addr(2));

        match world_state(&mut server) {
            Message::WorldState { players, .. } => assert_eq!(players.len(), 1),
            _ => panic!("expected world state"),
        }
    }

    #[test]
    fn entity_state_includes_every_spawned_chaser_and_the_patroller() {
        let server = test_server();
        match entity_state(&server) {
            Message::EntityState { entities } => {
                assert_eq!(entities.iter().filter(|e| e.kind == EntityKind::Chaser).count(), server.chasers.len());
                assert_eq!(entities.iter().filter(|e| e.kind == EntityKind::Patroller).count(), server.patrollers.len());
            }
            _ => panic!("expected entity state"),
        }
    }

    #[test]
    fn dead_chaser_drops_out_of_the_entity_snapshot() {
        let mut server = test_server();
        server.chasers[0].active = false;
        match entity_state(&server) {
            Message::EntityState { entities } => {
                assert_eq!(entities.iter().filter(|e| e.kind == EntityKind::Chaser).count(), server.chasers.len() - 1);
            }
            _ => panic!("expected entity state"),
        }
    }

    #[test]
    fn patroller_record_carries_laps_and_angle_as_extras() {
        let mut server = test_server();
        server.patrollers[0].laps_completed = 1;
        server.patrollers[0].patrol_angle = 2.5;
        match entity_state(&server) {
            Message::EntityState { entities } => {
                let record = entities.iter().find(|e| e.kind == EntityKind::Patroller).unwrap();
                assert_eq!(record.extra_u32, 1);
                assert_eq!(record.extra_f32, 2.5);
            }
            _ => panic!("expected entity state"),
        }
    }

    #[test]
    fn sequence_numbers_strictly_increase_across_sends() {
        let mut server = test_server();
        server.sessions.join(addr(1), "A".to_string(), [0.0, 0.0, 0.0], Instant::now());
        let first = server.next_sequence();
        let second = server.next_sequence();
        assert!(second > first);
    }
}
