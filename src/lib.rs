//! Trapnode firmware library.
//!
//! Exposes the wake-cycle logic and its adapters for the binary and for
//! host-side integration testing.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod compose;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fsm;
pub mod loki;
pub mod pins;
pub mod scheduler;
pub mod wake;

// Each of these picks its ESP-IDF or simulation implementation internally.
pub mod adapters;
pub mod drivers;
pub mod sensors;
