//! Core domain + application logic for the Telegram forwarder wizard.
//!
//! This crate is intentionally framework-agnostic. The remote forwarding service
//! lives behind a port (`api::port::ForwarderApi`) implemented in adapter crates,
//! and presentation lives in the console crate.

pub mod api;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod model;
pub mod poller;
pub mod task;
pub mod utils;
pub mod wait_timer;
pub mod wizard;

pub use errors::{Error, Result};
