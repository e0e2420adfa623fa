use crate::{
    tow::TowLeg,
    types::{Timestamp, TugId},
    vessel::VesselState,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // ── Configuration ──────────────────────────────────────────
    #[error("Tide table was not set")]
    MissingTideTable,

    #[error("Lookup table is empty")]
    EmptyTable,

    #[error("Duplicate table key {key}")]
    DuplicateKey { key: f64 },

    #[error("No vessels registered")]
    NoVessels,

    #[error("No {leg} tugs registered but vessel '{vessel}' requires a tow")]
    NoTugs { vessel: String, leg: TowLeg },

    #[error("Invalid route: {reason}")]
    InvalidRoute { reason: String },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Vessel '{vessel}' has no usable velocity ({velocity})")]
    InvalidVelocity { vessel: String, velocity: f64 },

    #[error("Key {key} not in table bounds [{min}, {max}]")]
    KeyOutOfRange { key: f64, min: f64, max: f64 },

    #[error("Unknown tug {tug}")]
    UnknownTug { tug: TugId },

    // ── Invariant violations ───────────────────────────────────
    #[error("Order queue of '{vessel}' is empty")]
    OrderQueueEmpty { vessel: String },

    #[error("Ordered '{vessel}' to load more than possible: asked {requested}, already {cargo} / {capacity}")]
    CapacityExceeded {
        vessel:    String,
        requested: f64,
        cargo:     f64,
        capacity:  f64,
    },

    #[error("Negative {what} requested for '{vessel}': {value}")]
    NegativeQuantity {
        vessel: String,
        what:   &'static str,
        value:  f64,
    },

    #[error("No handler for state {state:?} of '{vessel}'")]
    UnhandledState { vessel: String, state: VesselState },

    #[error("History of '{vessel}' out of order: {at} recorded after {last}")]
    HistoryOutOfOrder {
        vessel: String,
        last:   Timestamp,
        at:     Timestamp,
    },

    #[error("Tug '{tug}' already tows {max} vessel(s)")]
    TowCapacityExceeded { tug: String, max: usize },

    #[error("Vessel '{vessel}' cannot be towed")]
    NotTowable { vessel: String },

    #[error("Reservation [{start}, {end}) on '{resource}' overlaps an existing lock")]
    ReservationOverlap {
        resource: String,
        start:    Timestamp,
        end:      Timestamp,
    },

    // ── Exhaustion ─────────────────────────────────────────────
    #[error("Impossible to pass the rief: draft {draft:.2} never reached within tide period {period}")]
    NoTideWindow { draft: f64, period: Timestamp },

    #[error("No more OGVs at {at}")]
    OgvFleetExhausted { at: Timestamp },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a run abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The scenario was built wrong; fix the inputs.
    Configuration,
    /// A defect: the engine broke one of its own invariants.
    Invariant,
    /// The scenario is infeasible with these parameters.
    Exhaustion,
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Serialization(_)
            | Self::MissingTideTable
            | Self::EmptyTable
            | Self::DuplicateKey { .. }
            | Self::NoVessels
            | Self::NoTugs { .. }
            | Self::InvalidRoute { .. }
            | Self::InvalidParameter { .. }
            | Self::InvalidVelocity { .. }
            | Self::KeyOutOfRange { .. }
            | Self::UnknownTug { .. }
            | Self::Other(_) => ErrorKind::Configuration,

            Self::OrderQueueEmpty { .. }
            | Self::CapacityExceeded { .. }
            | Self::NegativeQuantity { .. }
            | Self::UnhandledState { .. }
            | Self::HistoryOutOfOrder { .. }
            | Self::TowCapacityExceeded { .. }
            | Self::NotTowable { .. }
            | Self::ReservationOverlap { .. } => ErrorKind::Invariant,

            Self::NoTideWindow { .. }
            | Self::OgvFleetExhausted { .. } => ErrorKind::Exhaustion,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
