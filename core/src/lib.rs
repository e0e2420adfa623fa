//! bargeflow core: discrete-event simulation of barge, tug and OGV
//! cargo transfer across a tide-gated channel.
//!
//! RULES:
//!   - One scenario is one `Simulation`; nothing is process-wide.
//!   - Runs are single-threaded and deterministic for a given seed.
//!   - The core performs no I/O; tables arrive already loaded.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod fleet;
pub mod gate;
pub mod ogv;
pub mod resource;
pub mod rng;
pub mod stats;
pub mod table;
pub mod tow;
pub mod types;
pub mod vessel;
