//! Post-run statistics, read off the histories of a finished run.
//!
//! Barge figures are averaged per barge, tug figures per tug of each
//! pool, all in hours. Queue waits match their comment exactly, since
//! "loader busy" is a substring of "unloader busy". Nothing here feeds back into the simulation.

use crate::{engine::Simulation, event::History, tow::TowLeg, vessel::VesselState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub total_cargo:           f64,
    pub barges:                usize,
    pub tugs:                  usize,
    pub sea_tugs:              usize,
    /// Mean completed discharges per barge.
    pub passes:                f64,
    pub lost_waiting_tide:     f64,
    pub lost_waiting_loader:   f64,
    pub lost_waiting_unloader: f64,
    pub lost_waiting_ogv:      f64,
    pub lost_waiting_tug:      f64,
    pub lost_waiting_sea_tug:  f64,
    pub loading:               f64,
    pub unloading:             f64,
    pub tugs_moving:           f64,
    pub tugs_waiting:          f64,
    pub sea_tugs_moving:       f64,
    pub sea_tugs_waiting:      f64,
}

fn sum(histories: &[&History], f: impl Fn(&History) -> u64) -> u64 {
    histories.iter().map(|h| f(*h)).sum()
}

fn hours(minutes: u64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    minutes as f64 / 60.0 / count as f64
}

impl RunStats {
    pub fn collect(sim: &Simulation) -> Self {
        let barges: Vec<&History> = sim.fleet().iter().map(|ctx| ctx.vessel.history()).collect();
        let tugs: Vec<&History> = sim.tugs(TowLeg::River).iter().map(|(_, tug, _)| tug.history()).collect();
        let sea: Vec<&History> = sim.tugs(TowLeg::Sea).iter().map(|(_, tug, _)| tug.history()).collect();
        let (nb, nt, ns) = (barges.len(), tugs.len(), sea.len());

        let loads: u64 = sim.fleet().iter().map(|ctx| u64::from(ctx.vessel.loads)).sum();

        Self {
            total_cargo:           sim.total_cargo(),
            barges:                nb,
            tugs:                  nt,
            sea_tugs:              ns,
            passes:                if nb == 0 { 0.0 } else { loads as f64 / nb as f64 },
            lost_waiting_tide:     hours(sum(&barges, |h| h.time_matching("low tide")), nb)
                                 + hours(sum(&tugs, |h| h.time_matching("low tide")), nt),
            lost_waiting_loader:   hours(sum(&barges, |h| h.time_with_comment("loader busy")), nb),
            lost_waiting_unloader: hours(sum(&barges, |h| h.time_with_comment("unloader busy")), nb),
            lost_waiting_ogv:      hours(sum(&barges, |h| h.time_matching("no OGV")), nb),
            lost_waiting_tug:      hours(sum(&barges, |h| h.time_matching("waiting for river tug")), nb),
            lost_waiting_sea_tug:  hours(sum(&barges, |h| h.time_matching("waiting for sea tug")), nb),
            loading:               hours(sum(&barges, |h| h.time_in_state(VesselState::Loading)), nb),
            unloading:             hours(sum(&barges, |h| h.time_in_state(VesselState::Unloading)), nb),
            tugs_moving:           hours(sum(&tugs, |h| h.time_in_state(VesselState::Moving)), nt),
            tugs_waiting:          hours(sum(&tugs, |h| h.time_matching("waiting for barge")), nt),
            sea_tugs_moving:       hours(sum(&sea, |h| h.time_in_state(VesselState::Moving)), ns),
            sea_tugs_waiting:      hours(sum(&sea, |h| h.time_matching("waiting for barge")), ns),
        }
    }
}
