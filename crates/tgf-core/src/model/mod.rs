//! Configuration model: credentials being assembled plus forwarding pairs.
//!
//! Pure data + mutations; no I/O.

pub mod credentials;
pub mod forwarding;
