//! Remote forwarding service boundary: port trait, result shapes, wire payloads.

pub mod port;
pub mod types;
pub mod wire;
