//! Tug pools.
//!
//! A towed barge changes tugs once per crossing. The river pool works
//! the leg from the loader over the rief to the handoff point; the sea
//! pool works the leg from the handoff point to the unloading berths.
//!
//! Within a pool, tugs shuttle between two stations: the loading side
//! and the unloading side of their leg. Every tug is at exactly one side
//! at all times. A barge needing a tow summons a tug at its side; if none
//! is stationed there, the least-advanced tug on the other side runs over
//! empty first.

use crate::{
    clock::synchronize,
    error::{SimError, SimResult},
    fleet::Fleet,
    types::{Timestamp, TugId, VesselId},
    vessel::{tow_draft, Vessel, VesselKind, VesselState},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The stretch of the route a tug pool works.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowLeg {
    /// Loader to handoff point, across the rief.
    #[default]
    River,
    /// Handoff point to the unloading berths.
    Sea,
}

impl fmt::Display for TowLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::River => f.write_str("river"),
            Self::Sea => f.write_str("sea"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Loading,
    Unloading,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Self::Loading => Self::Unloading,
            Self::Unloading => Self::Loading,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => f.write_str("loading side"),
            Self::Unloading => f.write_str("unloading side"),
        }
    }
}

#[derive(Debug, Clone)]
struct TugSlot {
    vessel: Vessel,
    side:   Side,
    /// Station at run start.
    home:   Side,
}

#[derive(Debug, Clone, Default)]
pub struct TugPool {
    leg:      TowLeg,
    tugs:     Vec<TugSlot>,
    /// Nautical miles between the two stations.
    distance: f64,
}

impl TugPool {
    pub fn new(leg: TowLeg, distance: f64) -> Self {
        Self { leg, tugs: Vec::new(), distance }
    }

    pub fn leg(&self) -> TowLeg {
        self.leg
    }

    pub fn add(&mut self, vessel: Vessel, side: Side) -> SimResult<TugId> {
        if !matches!(vessel.kind, VesselKind::Tow(_)) {
            return Err(SimError::InvalidParameter {
                name:   vessel.id.clone(),
                reason: "only tugs can join the tug pool".into(),
            });
        }
        self.tugs.push(TugSlot { vessel, side, home: side });
        Ok(TugId(self.tugs.len() - 1))
    }

    pub fn len(&self) -> usize {
        self.tugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tugs.is_empty()
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    fn slot(&self, id: TugId) -> SimResult<&TugSlot> {
        self.tugs.get(id.0).ok_or(SimError::UnknownTug { tug: id })
    }

    fn slot_mut(&mut self, id: TugId) -> SimResult<&mut TugSlot> {
        self.tugs.get_mut(id.0).ok_or(SimError::UnknownTug { tug: id })
    }

    pub fn vessel(&self, id: TugId) -> SimResult<&Vessel> {
        Ok(&self.slot(id)?.vessel)
    }

    pub fn vessel_mut(&mut self, id: TugId) -> SimResult<&mut Vessel> {
        Ok(&mut self.slot_mut(id)?.vessel)
    }

    pub fn side(&self, id: TugId) -> SimResult<Side> {
        Ok(self.slot(id)?.side)
    }

    pub fn set_side(&mut self, id: TugId, side: Side) -> SimResult<()> {
        self.slot_mut(id)?.side = side;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (TugId, &Vessel, Side)> {
        self.tugs
            .iter()
            .enumerate()
            .map(|(i, slot)| (TugId(i), &slot.vessel, slot.side))
    }

    /// Send every tug back to its home station with a fresh clock.
    pub fn reset(&mut self) -> SimResult<()> {
        for slot in &mut self.tugs {
            slot.vessel.reset();
            slot.side = slot.home;
            slot.vessel
                .remember(VesselState::Waiting, format!("stationed at {}, waiting for barge", slot.side))?;
        }
        Ok(())
    }

    /// Least-advanced tug stationed at `side`; lowest index on ties.
    fn pick(&self, side: Side) -> Option<TugId> {
        self.tugs
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.side == side)
            .min_by_key(|(i, slot)| (slot.vessel.clock, *i))
            .map(|(i, _)| TugId(i))
    }

    /// Get a tug to `side` and couple it with `barge`.
    pub fn summon(&mut self, side: Side, barge_id: VesselId, barge: &mut Vessel) -> SimResult<TugId> {
        if self.tugs.is_empty() {
            return Err(SimError::NoTugs { vessel: barge.id.clone(), leg: self.leg });
        }
        let id = match self.pick(side) {
            Some(id) => id,
            None => {
                let id = self
                    .pick(side.opposite())
                    .ok_or_else(|| SimError::NoTugs { vessel: barge.id.clone(), leg: self.leg })?;
                self.reposition(id, side)?;
                id
            }
        };
        self.tow_barge(id, barge_id, barge)?;
        Ok(id)
    }

    /// Run a tug empty to the other station.
    fn reposition(&mut self, id: TugId, side: Side) -> SimResult<()> {
        let distance = self.distance;
        let slot = self.slot_mut(id)?;
        slot.vessel
            .remember(VesselState::Moving, format!("moving to {side} to meet a barge"))?;
        slot.vessel.sail(distance)?;
        slot.side = side;
        slot.vessel
            .remember(VesselState::Waiting, format!("at {side}, waiting for barge"))?;
        log::debug!("{} repositioned to {side}, clock {}", slot.vessel.id, slot.vessel.clock);
        Ok(())
    }

    /// Couple `barge` to tug `id`: clocks meet at the later of the two,
    /// then both spend the tug's coupling time.
    pub fn tow_barge(&mut self, id: TugId, barge_id: VesselId, barge: &mut Vessel) -> SimResult<()> {
        if !barge.capabilities().towable {
            return Err(SimError::NotTowable { vessel: barge.id.clone() });
        }
        let leg = self.leg;
        let tug = &mut self.slot_mut(id)?.vessel;
        let VesselKind::Tow(spec) = &tug.kind else {
            return Err(SimError::UnknownTug { tug: id });
        };
        let (max_towed, coupling_time) = (spec.max_towed, spec.coupling_time);
        if tug.towed.len() >= max_towed {
            return Err(SimError::TowCapacityExceeded { tug: tug.id.clone(), max: max_towed });
        }

        let shared = synchronize(tug.clock, barge.clock);
        if barge.clock < shared {
            barge.remember(VesselState::Waiting, format!("waiting for {leg} tug {}", tug.id))?;
        }
        if tug.clock < shared {
            tug.remember(VesselState::Waiting, format!("waiting for barge {}", barge.id))?;
        }
        tug.clock = shared;
        barge.clock = shared;

        tug.remember(VesselState::Docking, format!("coupling {}", barge.id))?;
        barge.remember(VesselState::Docking, format!("coupling with {}", tug.id))?;
        tug.spend(coupling_time);
        barge.spend(coupling_time);
        tug.towed.push(barge_id);
        Ok(())
    }

    /// Effective draft of tug `id` with everything it tows.
    pub fn draft(&self, id: TugId, fleet: &Fleet) -> SimResult<f64> {
        let tug = self.vessel(id)?;
        let towed = tug
            .towed
            .iter()
            .map(|b| fleet.vessel(*b).draft())
            .collect::<SimResult<Vec<_>>>()?;
        Ok(tow_draft(tug.draft()?, towed))
    }

    /// Release every towed barge, charging `operation_time` per barge.
    /// Each released barge leaves with the tug's clock.
    pub fn drop_barges(
        &mut self,
        id: TugId,
        operation_time: Timestamp,
        fleet: &mut Fleet,
    ) -> SimResult<Vec<VesselId>> {
        let tug = &mut self.slot_mut(id)?.vessel;
        let released = std::mem::take(&mut tug.towed);
        for &barge_id in &released {
            let barge = fleet.vessel_mut(barge_id);
            let shared = synchronize(tug.clock, barge.clock);
            tug.clock = shared;
            barge.clock = shared;
            tug.remember(VesselState::Docking, format!("releasing {}", barge.id))?;
            barge.remember(VesselState::Docking, format!("released by {}", tug.id))?;
            tug.spend(operation_time);
            barge.clock = tug.clock;
        }
        tug.remember(VesselState::Waiting, "waiting for barge")?;
        Ok(released)
    }
}
