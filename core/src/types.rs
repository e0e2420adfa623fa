//! Shared primitive types used across the entire simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulated time. One unit = one minute since simulation start.
pub type Timestamp = u64;

/// Minutes in one simulated day.
pub const MINUTES_PER_DAY: Timestamp = 24 * 60;

/// Index of a cargo-carrying vessel in the simulation's fleet, in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VesselId(pub usize);

/// Index of a tug in the tug pool, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TugId(pub usize);

/// Handle of an exclusive resource (loader or unloading berth).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub usize);

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel#{}", self.0)
    }
}

impl fmt::Display for TugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tug#{}", self.0)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}

/// One loading cycle's worth of work: tonnes to load and the loader
/// intensity in tonnes per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadingOrder {
    pub cargo:     f64,
    pub intensity: f64,
}

impl LoadingOrder {
    pub fn new(cargo: f64, intensity: f64) -> Self {
        Self { cargo, intensity }
    }

    /// Build an order from an hourly loader rate.
    pub fn per_hour(cargo: f64, tonnes_per_hour: f64) -> Self {
        Self::new(cargo, tonnes_per_hour / 60.0)
    }
}
