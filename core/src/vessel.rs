//! Vessels: barges, tugs and ocean-going vessels.
//!
//! Every vessel carries its own local clock and history. Vessel kinds are
//! a tagged variant; draft and velocity dispatch on the tag. Cargo-carrying
//! barges may take draft from a shared `DraftTable`, may be towable, and
//! may need preparation time before crossing the rief.

use crate::{
    error::{SimError, SimResult},
    event::History,
    table::DraftTable,
    types::{Timestamp, VesselId},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselState {
    Loading,
    Unloading,
    GoingLoad,
    GoingUnload,
    Waiting,
    RiefPassed,
    Docking,
    Moving,
}

impl VesselState {
    /// Stable label used in logs and statistics queries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading     => "LOADING...",
            Self::Unloading   => "UNLOADING...",
            Self::GoingLoad   => "GOING_LOAD",
            Self::GoingUnload => "GOING_UNLOAD",
            Self::Waiting     => "WAITING...",
            Self::RiefPassed  => "RIEF_PASSED",
            Self::Docking     => "DOCKING",
            Self::Moving      => "MOVING",
        }
    }
}

/// Draft of a loaded barge.
#[derive(Debug, Clone)]
pub enum DraftPolicy {
    Constant(f64),
    Table(Arc<DraftTable>),
}

#[derive(Debug, Clone)]
pub struct BargeSpec {
    pub ballast_draft:       f64,
    pub cargo_draft:         DraftPolicy,
    /// Safety margin added to every draft.
    pub draft_bonus:         f64,
    /// Nautical miles per minute.
    pub ballast_velocity:    f64,
    pub cargo_velocity:      f64,
    pub docking_time:        Timestamp,
    pub undocking_time:      Timestamp,
    pub anchoring_time:      Timestamp,
    pub unanchoring_time:    Timestamp,
    pub rief_preparing_time: Timestamp,
    pub towable:             bool,
}

#[derive(Debug, Clone)]
pub struct TowSpec {
    pub ballast_draft:    f64,
    pub towing_velocity:  f64,
    pub moving_velocity:  f64,
    pub max_towed:        usize,
    /// Time to make fast alongside a barge.
    pub coupling_time:    Timestamp,
}

impl Default for TowSpec {
    fn default() -> Self {
        Self {
            ballast_draft:   1.26,
            towing_velocity: 4.0 / 60.0,
            moving_velocity: 5.0 / 60.0,
            max_towed:       1,
            coupling_time:   15,
        }
    }
}

#[derive(Debug, Clone)]
pub enum VesselKind {
    Barge(BargeSpec),
    Tow(TowSpec),
    Ogv,
}

/// Capability flags derived from the vessel kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub uses_table:    bool,
    pub towable:       bool,
    pub has_rief_prep: bool,
}

#[derive(Debug, Clone)]
pub struct Vessel {
    pub id:       String,
    pub kind:     VesselKind,
    pub capacity: f64,
    pub cargo:    f64,
    pub clock:    Timestamp,
    /// Nautical miles travelled this run.
    pub distance: f64,
    /// Completed discharges this run.
    pub loads:    u32,
    /// Barges currently on the hook; only tugs ever hold any.
    pub(crate) towed: Vec<VesselId>,
    state:   VesselState,
    history: History,
}

impl Vessel {
    pub fn new(id: impl Into<String>, kind: VesselKind, capacity: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            capacity,
            cargo: 0.0,
            clock: 0,
            distance: 0.0,
            loads: 0,
            towed: Vec::new(),
            state: VesselState::Loading,
            history: History::new(),
        }
    }

    pub fn barge(id: impl Into<String>, spec: BargeSpec, capacity: f64) -> Self {
        Self::new(id, VesselKind::Barge(spec), capacity)
    }

    pub fn tow(id: impl Into<String>, spec: TowSpec) -> Self {
        Self::new(id, VesselKind::Tow(spec), 0.0)
    }

    pub fn ogv(id: impl Into<String>, capacity: f64) -> Self {
        Self::new(id, VesselKind::Ogv, capacity)
    }

    pub fn state(&self) -> VesselState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn towed(&self) -> &[VesselId] {
        &self.towed
    }

    pub fn barge_spec(&self) -> Option<&BargeSpec> {
        match &self.kind {
            VesselKind::Barge(spec) => Some(spec),
            _ => None,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match &self.kind {
            VesselKind::Barge(spec) => Capabilities {
                uses_table:    matches!(spec.cargo_draft, DraftPolicy::Table(_)),
                towable:       spec.towable,
                has_rief_prep: spec.rief_preparing_time > 0,
            },
            VesselKind::Tow(_) | VesselKind::Ogv => Capabilities::default(),
        }
    }

    /// Record a state change at the current clock.
    pub fn remember(&mut self, state: VesselState, comment: impl Into<String>) -> SimResult<()> {
        self.history.record(&self.id, self.clock, state, comment)?;
        self.state = state;
        Ok(())
    }

    /// Advance the local clock by `minutes`.
    pub fn spend(&mut self, minutes: Timestamp) {
        self.clock += minutes;
    }

    pub fn load(&mut self, cargo: f64) -> SimResult<()> {
        if cargo < 0.0 {
            return Err(SimError::NegativeQuantity {
                vessel: self.id.clone(),
                what:   "load",
                value:  cargo,
            });
        }
        if cargo + self.cargo > self.capacity {
            return Err(SimError::CapacityExceeded {
                vessel:    self.id.clone(),
                requested: cargo,
                cargo:     self.cargo,
                capacity:  self.capacity,
            });
        }
        self.cargo += cargo;
        Ok(())
    }

    /// Empty the hold. Returns what was aboard.
    pub fn unload(&mut self) -> f64 {
        let unloaded = self.cargo;
        self.cargo = 0.0;
        self.loads += 1;
        unloaded
    }

    /// Current speed in nautical miles per minute.
    pub fn velocity(&self) -> f64 {
        match &self.kind {
            VesselKind::Barge(spec) if self.cargo > 0.0 => spec.cargo_velocity,
            VesselKind::Barge(spec) => spec.ballast_velocity,
            VesselKind::Tow(spec) if self.towed.is_empty() => spec.moving_velocity,
            VesselKind::Tow(spec) => spec.towing_velocity,
            VesselKind::Ogv => 0.0,
        }
    }

    /// Own hull draft. A tug's effective draft also depends on what it tows;
    /// see `tow_draft`.
    pub fn draft(&self) -> SimResult<f64> {
        match &self.kind {
            VesselKind::Barge(spec) if self.cargo > 0.0 => {
                let loaded = match &spec.cargo_draft {
                    DraftPolicy::Constant(d) => *d,
                    DraftPolicy::Table(table) => table.get(self.cargo)?,
                };
                Ok(loaded + spec.draft_bonus)
            }
            VesselKind::Barge(spec) => Ok(spec.ballast_draft + spec.draft_bonus),
            VesselKind::Tow(spec) => Ok(spec.ballast_draft),
            VesselKind::Ogv => Ok(0.0),
        }
    }

    /// Sail `distance` nautical miles at the current velocity.
    /// Returns the minutes spent.
    pub fn sail(&mut self, distance: f64) -> SimResult<Timestamp> {
        if distance < 0.0 {
            return Err(SimError::NegativeQuantity {
                vessel: self.id.clone(),
                what:   "move",
                value:  distance,
            });
        }
        if distance == 0.0 {
            return Ok(0);
        }
        let velocity = self.velocity();
        if !(velocity > 0.0 && velocity.is_finite()) {
            return Err(SimError::InvalidVelocity {
                vessel: self.id.clone(),
                velocity,
            });
        }
        let minutes = (distance / velocity).round() as Timestamp;
        self.clock += minutes;
        self.distance += distance;
        Ok(minutes)
    }

    /// Back to the start-of-run condition.
    pub fn reset(&mut self) {
        self.clock = 0;
        self.cargo = 0.0;
        self.distance = 0.0;
        self.loads = 0;
        self.towed.clear();
        self.state = VesselState::Loading;
        self.history.clear();
    }
}

/// Effective draft of a tug with its tow: the deepest of its own hull and
/// every towed barge.
pub fn tow_draft(tug_draft: f64, towed_drafts: impl IntoIterator<Item = f64>) -> f64 {
    towed_drafts.into_iter().fold(tug_draft, f64::max)
}
