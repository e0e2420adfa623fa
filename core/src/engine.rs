//! The simulation driver: one scenario, one run at a time.
//!
//! DISPATCH LOOP (fixed, never reordered):
//!   1. Pick the cargo vessel with the lowest local clock
//!      (lowest registration index on ties).
//!   2. Run the handler for its current state.
//!   3. Stop once that vessel's clock reaches the horizon.
//!
//! RULES:
//!   - The driver owns every vessel, tug, resource and OGV; handlers
//!     reach them by id only.
//!   - Every exclusive-resource lock is preceded by a slot query.
//!   - All randomness flows through the RngBank.
//!   - Every state change is recorded in the owning vessel's history.

use crate::{
    config::{OgvConfig, RouteConfig},
    error::{SimError, SimResult},
    event::LogEntry,
    fleet::{Fleet, VesselContext},
    gate,
    ogv::OgvFleet,
    resource::ResourcePool,
    rng::{RngBank, StreamSlot},
    table::TideTable,
    tow::{Side, TowLeg, TugPool},
    types::{LoadingOrder, ResourceId, Timestamp, TugId, VesselId},
    vessel::{BargeSpec, Vessel, VesselKind, VesselState},
};
use std::sync::Arc;

pub struct Simulation {
    route:          RouteConfig,
    ogv_config:     OgvConfig,
    /// Tonnes per minute discharged at any berth.
    unloading_rate: f64,
    rng_bank:       RngBank,
    tide:           Option<Arc<TideTable>>,
    fleet:          Fleet,
    river_tugs:     TugPool,
    sea_tugs:       TugPool,
    resources:      ResourcePool,
    ogvs:           OgvFleet,
    total_cargo:    f64,
}

impl Simulation {
    pub fn new(
        route: RouteConfig,
        ogv_config: OgvConfig,
        unloading_rate: f64,
        berths: usize,
        seed: u64,
    ) -> Self {
        Self {
            route,
            ogv_config,
            unloading_rate,
            rng_bank: RngBank::new(seed),
            tide: None,
            fleet: Fleet::new(),
            river_tugs: TugPool::new(TowLeg::River, route.dist_to_handoff),
            sea_tugs: TugPool::new(TowLeg::Sea, route.total_distance - route.dist_to_handoff),
            resources: ResourcePool::new(berths),
            ogvs: OgvFleet::default(),
            total_cargo: 0.0,
        }
    }

    pub fn set_tides(&mut self, tide: Arc<TideTable>) {
        self.tide = Some(tide);
    }

    /// Register a cargo barge with its order queue.
    pub fn add_vessel(&mut self, vessel: Vessel, orders: Vec<LoadingOrder>) -> SimResult<VesselId> {
        if !matches!(vessel.kind, VesselKind::Barge(_)) {
            return Err(SimError::InvalidParameter {
                name:   vessel.id.clone(),
                reason: "only barges carry loading orders".into(),
            });
        }
        Ok(self.fleet.add(VesselContext::new(vessel, orders)))
    }

    pub fn add_tug(&mut self, tug: Vessel, leg: TowLeg, side: Side) -> SimResult<TugId> {
        self.tug_pool_mut(leg).add(tug, side)
    }

    fn tug_pool_mut(&mut self, leg: TowLeg) -> &mut TugPool {
        match leg {
            TowLeg::River => &mut self.river_tugs,
            TowLeg::Sea => &mut self.sea_tugs,
        }
    }

    /// Run from a clean start until the dispatched vessel reaches
    /// `horizon`. Returns the tonnes discharged into OGVs.
    pub fn run(&mut self, horizon: Timestamp) -> SimResult<f64> {
        let tide = self.tide.clone().ok_or(SimError::MissingTideTable)?;
        let period = tide.period()?;
        if self.fleet.is_empty() {
            return Err(SimError::NoVessels);
        }
        let towing = self.fleet.iter().any(|ctx| ctx.vessel.capabilities().towable);
        self.route.validate(towing)?;
        if !(self.unloading_rate > 0.0) {
            return Err(SimError::InvalidParameter {
                name:   "unloading_rate".into(),
                reason: format!("must be positive, got {}", self.unloading_rate),
            });
        }
        if self.resources.berth_count() == 0 {
            return Err(SimError::InvalidParameter {
                name:   "berths".into(),
                reason: "at least one unloading berth is required".into(),
            });
        }

        log::info!(
            "run start: {} barge(s), {}+{} river/sea tug(s), {} berth(s), tide period {period} min, horizon {horizon} min, seed {}",
            self.fleet.len(),
            self.river_tugs.len(),
            self.sea_tugs.len(),
            self.resources.berth_count(),
            self.rng_bank.seed(),
        );

        self.reset(horizon)?;

        let mut steps = 0u64;
        while let Some(id) = self.fleet.next_vessel() {
            self.step(id, &tide)?;
            steps += 1;
            if self.fleet.vessel(id).clock >= horizon {
                break;
            }
        }

        log::info!("run end: {:.0} t moved in {steps} dispatches", self.total_cargo);
        Ok(self.total_cargo)
    }

    fn reset(&mut self, horizon: Timestamp) -> SimResult<()> {
        self.fleet.reset();
        for i in (1..self.fleet.len()).step_by(2) {
            self.fleet
                .vessel_mut(VesselId(i))
                .remember(VesselState::GoingLoad, "starting from the unloading side")?;
        }
        self.river_tugs.set_distance(self.route.dist_to_handoff);
        self.river_tugs.reset()?;
        self.sea_tugs.set_distance(self.route.total_distance - self.route.dist_to_handoff);
        self.sea_tugs.reset()?;
        self.resources.clear();
        let mut rng = self.rng_bank.for_stream(StreamSlot::OgvArrivals);
        self.ogvs = OgvFleet::schedule(&self.ogv_config, horizon, self.resources.berth_count(), &mut rng)?;
        self.total_cargo = 0.0;
        Ok(())
    }

    fn step(&mut self, id: VesselId, tide: &TideTable) -> SimResult<()> {
        let state = self.fleet.vessel(id).state();
        match state {
            VesselState::Loading     => self.load(id)?,
            VesselState::GoingUnload => self.go_unloading(id, tide)?,
            VesselState::Unloading   => self.unload(id)?,
            VesselState::GoingLoad   => self.go_loading(id, tide)?,
            other => {
                return Err(SimError::UnhandledState {
                    vessel: self.fleet.vessel(id).id.clone(),
                    state:  other,
                })
            }
        }
        let vessel = self.fleet.vessel(id);
        log::debug!("{} {:?} → {:?} at {}", vessel.id, state, vessel.state(), vessel.clock);
        Ok(())
    }

    fn load(&mut self, id: VesselId) -> SimResult<()> {
        let ctx = self.fleet.get_mut(id);
        let order = ctx
            .pending
            .pop_front()
            .ok_or_else(|| SimError::OrderQueueEmpty { vessel: ctx.vessel.id.clone() })?;
        let vessel = &mut ctx.vessel;
        if !(order.intensity > 0.0) {
            return Err(SimError::InvalidParameter {
                name:   format!("{} loading intensity", vessel.id),
                reason: format!("must be positive, got {}", order.intensity),
            });
        }
        let spec = spec_of(vessel)?;
        vessel.load(order.cargo)?;

        let loading = (order.cargo / order.intensity).round() as Timestamp;
        let busy = spec.docking_time + loading + spec.undocking_time;
        let loader = self.resources.get_mut(ResourcePool::LOADER);
        let wait = loader.time_to_slot(vessel.clock, busy);
        if wait > 0 {
            vessel.remember(VesselState::Waiting, "loader busy")?;
            vessel.spend(wait);
        }
        loader.lock(vessel.clock, busy, Some(vessel.id.as_str()))?;

        vessel.remember(VesselState::Loading, "docking at loader")?;
        vessel.spend(spec.docking_time);
        vessel.remember(
            VesselState::Loading,
            format!("loaded {:.0} on {:.0}/h", order.cargo, order.intensity * 60.0),
        )?;
        vessel.spend(loading);
        vessel.remember(VesselState::Loading, "undocking")?;
        vessel.spend(spec.undocking_time);

        let draft = vessel.draft()?;
        vessel.remember(VesselState::GoingUnload, format!("draft {draft:.3}"))
    }

    fn go_unloading(&mut self, id: VesselId, tide: &TideTable) -> SimResult<()> {
        let route = self.route;
        let berth = if self.fleet.vessel(id).capabilities().towable {
            self.tow_across(id, Side::Loading, tide)?;
            self.tow_to_berth(id)?
        } else {
            let vessel = self.fleet.vessel_mut(id);
            gate::prepare_for_rief(vessel)?;
            let draft = vessel.draft()?;
            gate::pass_gate(vessel, draft, tide, route.dist_to_gate, route.total_distance - route.dist_to_gate)?;

            let (berth, wait) = earliest_berth(&self.resources, vessel.clock)?;
            if wait > 0 {
                vessel.remember(VesselState::Waiting, "unloader busy")?;
                vessel.spend(wait);
            }
            berth
        };

        let ctx = self.fleet.get_mut(id);
        ctx.berth = Some(berth);
        ctx.vessel.remember(
            VesselState::Unloading,
            format!("arrived at {}", self.resources.get(berth).name),
        )
    }

    fn unload(&mut self, id: VesselId) -> SimResult<()> {
        let ctx = self.fleet.get_mut(id);
        let berth = ctx.berth.take().ok_or_else(|| SimError::UnhandledState {
            vessel: ctx.vessel.id.clone(),
            state:  VesselState::Unloading,
        })?;
        let vessel = &mut ctx.vessel;
        let spec = spec_of(vessel)?;

        let changeover = self.ogvs.bind_berth(ResourcePool::berth_index(berth), vessel.clock)?;
        if changeover > 0 {
            vessel.remember(VesselState::Waiting, "berth changeover")?;
            vessel.spend(changeover);
        }

        let cargo = vessel.unload();
        let unloading = (cargo / self.unloading_rate).round() as Timestamp;
        let resource = self.resources.get_mut(berth);
        // The OGV wait depends on when the barge docks and the slot length
        // on the OGV wait; move the start until both agree.
        let mut start = vessel.clock + resource.time_to_unlock(vessel.clock);
        let busy = loop {
            let ogv_wait = self.ogvs.expected_wait(cargo, start + spec.docking_time)?;
            let busy = spec.docking_time + ogv_wait + unloading + spec.undocking_time;
            let slot = start + resource.time_to_slot(start, busy);
            if slot == start {
                break busy;
            }
            start = slot;
        };
        if start > vessel.clock {
            vessel.remember(VesselState::Waiting, "unloader busy")?;
            vessel.clock = start;
        }
        resource.lock(vessel.clock, busy, Some(vessel.id.as_str()))?;

        vessel.remember(VesselState::Unloading, format!("docking at {}", resource.name))?;
        vessel.spend(spec.docking_time);
        let ogv_wait = self.ogvs.waiting_time(cargo, vessel.clock)?;
        if ogv_wait > 0 {
            vessel.remember(VesselState::Waiting, "no OGV on unloader")?;
            vessel.spend(ogv_wait);
        }
        self.total_cargo += cargo;
        vessel.remember(
            VesselState::Unloading,
            format!("unloaded {cargo:.0}, collected {:.0}", self.total_cargo),
        )?;
        vessel.spend(unloading);
        vessel.remember(VesselState::Unloading, "undocking")?;
        vessel.spend(spec.undocking_time);

        let draft = vessel.draft()?;
        vessel.remember(VesselState::GoingLoad, format!("draft {draft:.3}"))
    }

    fn go_loading(&mut self, id: VesselId, tide: &TideTable) -> SimResult<()> {
        let route = self.route;
        if self.fleet.vessel(id).capabilities().towable {
            let tug_id = self.sea_tow(id, Side::Unloading)?;
            let anchoring = spec_of(self.fleet.vessel(id))?.anchoring_time;
            self.sea_tugs.drop_barges(tug_id, anchoring, &mut self.fleet)?;
            self.sea_tugs.set_side(tug_id, Side::Loading)?;
            self.tow_across(id, Side::Unloading, tide)?;
            self.fleet
                .vessel_mut(id)
                .remember(VesselState::Loading, "at loader anchorage")
        } else {
            let vessel = self.fleet.vessel_mut(id);
            gate::prepare_for_rief(vessel)?;
            let draft = vessel.draft()?;
            gate::pass_gate(vessel, draft, tide, route.total_distance - route.dist_to_gate, route.dist_to_gate)?;
            vessel.remember(VesselState::Loading, "arrived at loader")
        }
    }

    /// Tug-assisted crossing of the rief between the loader and the
    /// handoff point, starting from `side`.
    fn tow_across(&mut self, id: VesselId, side: Side, tide: &TideTable) -> SimResult<()> {
        let route = self.route;
        let (heading, to_gate, from_gate) = match side {
            Side::Loading => (
                VesselState::GoingUnload,
                route.dist_to_gate,
                route.dist_to_handoff - route.dist_to_gate,
            ),
            Side::Unloading => (
                VesselState::GoingLoad,
                route.dist_to_handoff - route.dist_to_gate,
                route.dist_to_gate,
            ),
        };

        let tug_id = self.river_tugs.summon(side, id, self.fleet.vessel_mut(id))?;
        let draft = self.river_tugs.draft(tug_id, &self.fleet)?;

        let barge = self.fleet.vessel_mut(id);
        let anchoring = spec_of(barge)?.anchoring_time;
        let tug = self.river_tugs.vessel_mut(tug_id)?;
        barge.remember(heading, format!("towed by {}", tug.id))?;
        tug.remember(heading, format!("towing {}, draft {draft:.3}", barge.id))?;
        gate::pass_gate(tug, draft, tide, to_gate, from_gate)?;
        barge.distance += route.dist_to_handoff;

        self.river_tugs.drop_barges(tug_id, anchoring, &mut self.fleet)?;
        self.river_tugs.set_side(tug_id, side.opposite())
    }

    /// A sea tug takes barge `id` over the sea leg, starting from `side`.
    /// The barge is still on the hook on return.
    fn sea_tow(&mut self, id: VesselId, side: Side) -> SimResult<TugId> {
        let heading = match side {
            Side::Loading => VesselState::GoingUnload,
            Side::Unloading => VesselState::GoingLoad,
        };
        let tug_id = self.sea_tugs.summon(side, id, self.fleet.vessel_mut(id))?;
        let distance = self.sea_tugs.distance();

        let barge = self.fleet.vessel_mut(id);
        let tug = self.sea_tugs.vessel_mut(tug_id)?;
        barge.remember(heading, format!("towed by {}", tug.id))?;
        tug.remember(heading, format!("towing {}", barge.id))?;
        tug.sail(distance)?;
        barge.distance += distance;
        barge.clock = tug.clock;
        Ok(tug_id)
    }

    /// Sea leg out to the berths. While every berth is busy the tug holds
    /// the barge, then both spend two docking times working it alongside.
    fn tow_to_berth(&mut self, id: VesselId) -> SimResult<ResourceId> {
        let tug_id = self.sea_tow(id, Side::Loading)?;

        let barge = self.fleet.vessel_mut(id);
        let docking = spec_of(barge)?.docking_time;
        let (berth, wait) = earliest_berth(&self.resources, barge.clock)?;
        if wait > 0 {
            let tug = self.sea_tugs.vessel_mut(tug_id)?;
            barge.remember(VesselState::Waiting, "unloader busy")?;
            tug.remember(VesselState::Waiting, format!("holding {} for a berth", barge.id))?;
            barge.spend(wait);
            tug.spend(wait);
            barge.remember(VesselState::Docking, "dancing with barges")?;
            tug.remember(VesselState::Docking, format!("working {} alongside", barge.id))?;
            barge.spend(2 * docking);
            tug.spend(2 * docking);
        }

        self.sea_tugs.drop_barges(tug_id, 0, &mut self.fleet)?;
        self.sea_tugs.set_side(tug_id, Side::Unloading)?;
        Ok(berth)
    }

    pub fn vessel(&self, id: VesselId) -> &Vessel {
        self.fleet.vessel(id)
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn tugs(&self, leg: TowLeg) -> &TugPool {
        match leg {
            TowLeg::River => &self.river_tugs,
            TowLeg::Sea => &self.sea_tugs,
        }
    }

    pub fn ogvs(&self) -> &OgvFleet {
        &self.ogvs
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn route(&self) -> &RouteConfig {
        &self.route
    }

    pub fn seed(&self) -> u64 {
        self.rng_bank.seed()
    }

    pub fn total_cargo(&self) -> f64 {
        self.total_cargo
    }

    fn all_vessels(&self) -> impl Iterator<Item = &Vessel> {
        self.fleet
            .iter()
            .map(|ctx| &ctx.vessel)
            .chain(self.river_tugs.iter().map(|(_, tug, _)| tug))
            .chain(self.sea_tugs.iter().map(|(_, tug, _)| tug))
            .chain(self.ogvs.iter())
    }

    /// Every history record of the last run, ordered by time; equal
    /// times keep barges, then river tugs, sea tugs and OGVs, each in
    /// registration order.
    pub fn event_log(&self) -> Vec<LogEntry> {
        let mut log: Vec<LogEntry> = self
            .all_vessels()
            .flat_map(|vessel| {
                vessel.history().entries().iter().map(|entry| LogEntry {
                    vessel:  vessel.id.clone(),
                    at:      entry.at,
                    state:   entry.state,
                    comment: entry.comment.clone(),
                })
            })
            .collect();
        log.sort_by_key(|entry| entry.at);
        log
    }

    /// Plain-text log of every vessel and resource.
    pub fn render_log(&self) -> String {
        let mut out = String::new();
        for vessel in self.all_vessels() {
            out.push_str(&vessel.history().render(&vessel.id));
        }
        for resource in self.resources.iter() {
            out.push_str(&resource.render());
        }
        out
    }
}

fn earliest_berth(resources: &ResourcePool, at: Timestamp) -> SimResult<(ResourceId, Timestamp)> {
    resources.earliest_berth(at).ok_or_else(|| SimError::InvalidParameter {
        name:   "berths".into(),
        reason: "no unloading berth registered".into(),
    })
}

fn spec_of(vessel: &Vessel) -> SimResult<BargeSpec> {
    vessel.barge_spec().cloned().ok_or_else(|| SimError::InvalidParameter {
        name:   vessel.id.clone(),
        reason: "not a barge".into(),
    })
}
