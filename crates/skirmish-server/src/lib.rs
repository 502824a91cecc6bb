//! Authoritative game loop for Skirmish Keep: session table, NPC AI,
//! combat arbiter, and the cooperative tick scheduler. `main.rs` is a thin
//! shell around [`tick::run`].

pub mod broadcast;
pub mod combat;
pub mod config;
pub mod logging;
pub mod net;
pub mod npc;
pub mod server;
pub mod session;
pub mod tick;
