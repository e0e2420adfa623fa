//! Ocean-going vessels: arrival schedule, turnover and berth binding.
//!
//! RULE: OGVs are served strictly in arrival order. The first OGV still
//! LOADING or GOING_LOAD is the one every barge discharges into.
//!
//! The whole horizon's arrivals are drawn up front from the
//! `OgvArrivals` stream, so the schedule depends only on the seed.

use crate::{
    config::OgvConfig,
    error::{SimError, SimResult},
    rng::SimRng,
    types::Timestamp,
    vessel::{Vessel, VesselState},
};

/// One change a discharge makes to an OGV.
#[derive(Debug, Clone, Copy)]
enum Discharge {
    /// An arriving OGV docks and spends the changeover.
    Dock { index: usize },
    /// Part of the cargo goes in; the OGV keeps loading.
    Top { index: usize, amount: f64, at: Timestamp },
    /// The OGV fills up and departs.
    Fill { index: usize, amount: f64, at: Timestamp },
}

#[derive(Debug)]
struct DischargePlan {
    wait:  Timestamp,
    steps: Vec<Discharge>,
}

#[derive(Debug, Clone, Default)]
pub struct OgvFleet {
    ogvs:            Vec<Vessel>,
    changeover_time: Timestamp,
    /// Berth ordinal → index of the OGV it currently serves.
    bindings:        Vec<Option<usize>>,
}

impl OgvFleet {
    /// One OGV ready at time zero, then one per `period` until one
    /// period past the horizon, each with normally distributed jitter.
    pub fn schedule(
        config: &OgvConfig,
        horizon: Timestamp,
        berths: usize,
        rng: &mut SimRng,
    ) -> SimResult<Self> {
        if config.period == 0 {
            return Err(SimError::InvalidParameter {
                name:   "ogv.period".into(),
                reason: "must be positive".into(),
            });
        }
        let mut arrivals = Vec::new();
        let mut arrival = config.period;
        while arrival <= horizon + config.period {
            let jittered = arrival as f64 + rng.normal(0.0, config.period_std_dev);
            arrivals.push(jittered.round().max(0.0) as Timestamp);
            arrival += config.period;
        }
        log::debug!("scheduled {} OGV arrivals over {horizon} min", arrivals.len());
        Self::from_arrivals(config.capacity, config.changeover_time, berths, &arrivals)
    }

    /// Build a fleet from explicit arrival clocks. Arrivals are served in
    /// time order regardless of the order given.
    pub fn from_arrivals(
        capacity: f64,
        changeover_time: Timestamp,
        berths: usize,
        arrivals: &[Timestamp],
    ) -> SimResult<Self> {
        let mut ready = Vessel::ogv("OGV #0", capacity);
        ready.remember(VesselState::Loading, "ready")?;

        let mut clocks = arrivals.to_vec();
        clocks.sort_unstable();

        let mut ogvs = vec![ready];
        for (n, clock) in clocks.into_iter().enumerate() {
            let mut ogv = Vessel::ogv(format!("OGV #{}", n + 1), capacity);
            ogv.clock = clock;
            ogv.remember(VesselState::GoingLoad, "approaching")?;
            ogvs.push(ogv);
        }
        Ok(Self { ogvs, changeover_time, bindings: vec![None; berths] })
    }

    pub fn len(&self) -> usize {
        self.ogvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ogvs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Vessel> {
        self.ogvs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vessel> {
        self.ogvs.iter()
    }

    pub fn changeover_time(&self) -> Timestamp {
        self.changeover_time
    }

    /// Index of the first OGV still loading or on its way in.
    pub fn closest_index(&self, at: Timestamp) -> SimResult<usize> {
        self.ogvs
            .iter()
            .position(|ogv| matches!(ogv.state(), VesselState::Loading | VesselState::GoingLoad))
            .ok_or(SimError::OgvFleetExhausted { at })
    }

    pub fn closest(&self, at: Timestamp) -> SimResult<&Vessel> {
        Ok(&self.ogvs[self.closest_index(at)?])
    }

    /// Minutes a barge arriving at `now` would wait before `cargo` is
    /// fully deposited. Leaves the fleet untouched.
    pub fn expected_wait(&self, cargo: f64, now: Timestamp) -> SimResult<Timestamp> {
        Ok(self.plan(cargo, now)?.wait)
    }

    /// Minutes a barge arriving at `now` waits before `cargo` is fully
    /// deposited. Fills OGVs in order; an overflow departs the full OGV and
    /// charges the changeover before the remainder goes to the next one.
    pub fn waiting_time(&mut self, cargo: f64, now: Timestamp) -> SimResult<Timestamp> {
        let plan = self.plan(cargo, now)?;
        let changeover = self.changeover_time;
        let last = self.ogvs.len().saturating_sub(1);
        for step in plan.steps {
            match step {
                Discharge::Dock { index } => {
                    let ogv = &mut self.ogvs[index];
                    ogv.remember(VesselState::Loading, "docking")?;
                    ogv.spend(changeover);
                }
                Discharge::Top { index, amount, at } => {
                    let ogv = &mut self.ogvs[index];
                    ogv.load(amount)?;
                    ogv.clock = at;
                    ogv.remember(
                        VesselState::Loading,
                        format!("loaded {amount:.0}, total {:.0}", ogv.cargo),
                    )?;
                }
                Discharge::Fill { index, amount, at } => {
                    let ogv = &mut self.ogvs[index];
                    ogv.cargo = ogv.capacity;
                    ogv.clock = at;
                    ogv.remember(
                        VesselState::Loading,
                        format!("loaded {amount:.0}, total {:.0}", ogv.cargo),
                    )?;
                    ogv.spend(changeover);
                    ogv.remember(VesselState::GoingUnload, "full, departing")?;
                    if index == last {
                        log::warn!("{} was the last scheduled OGV; departed at {}", ogv.id, ogv.clock);
                    }
                }
            }
        }
        Ok(plan.wait)
    }

    /// Walk the OGVs `cargo` would go into, without touching them.
    fn plan(&self, cargo: f64, now: Timestamp) -> SimResult<DischargePlan> {
        if cargo < 0.0 {
            return Err(SimError::NegativeQuantity {
                vessel: "OGV fleet".into(),
                what:   "discharge",
                value:  cargo,
            });
        }
        let changeover = self.changeover_time;
        let mut steps = Vec::new();
        let mut wait = 0;
        let mut now = now;
        let mut remaining = cargo;

        let mut index = self.closest_index(now)?;
        let first = &self.ogvs[index];
        let (mut clock, mut load, mut state) = (first.clock, first.cargo, first.state());

        loop {
            let capacity = self.ogvs[index].capacity;
            if clock > now {
                wait += clock - now;
                now = clock;
            }
            match state {
                VesselState::GoingLoad => {
                    steps.push(Discharge::Dock { index });
                    state = VesselState::Loading;
                    clock += changeover;
                }
                VesselState::Loading if capacity > load + remaining => {
                    steps.push(Discharge::Top { index, amount: remaining, at: now });
                    return Ok(DischargePlan { wait, steps });
                }
                VesselState::Loading => {
                    let fits = capacity - load;
                    steps.push(Discharge::Fill { index, amount: fits, at: now });
                    remaining -= fits;
                    if remaining <= 0.0 {
                        return Ok(DischargePlan { wait, steps });
                    }
                    wait += changeover;
                    now += changeover;

                    index += 1;
                    let next = self.ogvs.get(index).ok_or(SimError::OgvFleetExhausted { at: now })?;
                    (clock, load, state) = (next.clock, next.cargo, next.state());
                }
                state => {
                    return Err(SimError::UnhandledState { vessel: self.ogvs[index].id.clone(), state });
                }
            }
        }
    }

    /// Make sure berth `berth` serves a live OGV. Returns the changeover
    /// minutes charged; zero when the current binding still holds.
    pub fn bind_berth(&mut self, berth: usize, now: Timestamp) -> SimResult<Timestamp> {
        let bound = self.bindings.get(berth).copied().ok_or_else(|| SimError::InvalidParameter {
            name:   format!("berth {berth}"),
            reason: format!("only {} berth(s) bound to the OGV fleet", self.bindings.len()),
        })?;
        let live = bound.is_some_and(|i| self.ogvs[i].state() != VesselState::GoingUnload);
        if live {
            return Ok(0);
        }
        let index = self.closest_index(now)?;
        self.bindings[berth] = Some(index);
        log::debug!("berth {berth} rebound to {} at {now}", self.ogvs[index].id);
        Ok(self.changeover_time)
    }

    pub fn bound_ogv(&self, berth: usize) -> Option<&Vessel> {
        self.bindings.get(berth).copied().flatten().map(|i| &self.ogvs[i])
    }
}
