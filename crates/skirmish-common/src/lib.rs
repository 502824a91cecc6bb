#![allow(clippy::too_many_arguments)]

//! Shared wire protocol and math for the Skirmish Keep authoritative server.
//!
//! This crate carries nothing that depends on live game state — it is the
//! layer both the server and any future client would link against.

pub mod math;
pub mod protocol;
