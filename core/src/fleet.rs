//! The cargo fleet: every barge of a scenario with its loading orders.

use crate::{
    types::{LoadingOrder, ResourceId, VesselId},
    vessel::Vessel,
};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct VesselContext {
    pub vessel:  Vessel,
    /// Orders as supplied; restored into `pending` at every run start.
    orders:      Vec<LoadingOrder>,
    pub pending: VecDeque<LoadingOrder>,
    /// Berth acquired on arrival at the unloading side.
    pub berth:   Option<ResourceId>,
}

impl VesselContext {
    pub fn new(vessel: Vessel, orders: Vec<LoadingOrder>) -> Self {
        let pending = orders.iter().copied().collect();
        Self { vessel, orders, pending, berth: None }
    }

    pub fn orders(&self) -> &[LoadingOrder] {
        &self.orders
    }

    fn reset(&mut self) {
        self.vessel.reset();
        self.pending = self.orders.iter().copied().collect();
        self.berth = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    contexts: Vec<VesselContext>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, context: VesselContext) -> VesselId {
        self.contexts.push(context);
        VesselId(self.contexts.len() - 1)
    }

    pub fn get(&self, id: VesselId) -> &VesselContext {
        &self.contexts[id.0]
    }

    pub fn get_mut(&mut self, id: VesselId) -> &mut VesselContext {
        &mut self.contexts[id.0]
    }

    pub fn vessel(&self, id: VesselId) -> &Vessel {
        &self.contexts[id.0].vessel
    }

    pub fn vessel_mut(&mut self, id: VesselId) -> &mut Vessel {
        &mut self.contexts[id.0].vessel
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VesselContext> {
        self.contexts.iter()
    }

    /// The least-advanced vessel. Equal clocks go to the earliest registered.
    pub fn next_vessel(&self) -> Option<VesselId> {
        self.contexts
            .iter()
            .enumerate()
            .min_by_key(|(i, ctx)| (ctx.vessel.clock, *i))
            .map(|(i, _)| VesselId(i))
    }

    pub fn reset(&mut self) {
        self.contexts.iter_mut().for_each(VesselContext::reset);
    }
}
