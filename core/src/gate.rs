//! Tide-gated passage over the rief.
//!
//! RULE: a vessel crosses only at a minute when the tide depth is at
//! least its draft. The draft is fixed by the caller for the whole
//! crossing, so a tug passes with the deepest of its tow.

use crate::{
    error::SimResult,
    table::TideTable,
    types::Timestamp,
    vessel::{Vessel, VesselState},
};

/// Sail `to_gate`, wait for water under `draft`, cross, sail `from_gate`.
/// Returns the minutes spent waiting for tide.
pub fn pass_gate(
    vessel: &mut Vessel,
    draft: f64,
    tide: &TideTable,
    to_gate: f64,
    from_gate: f64,
) -> SimResult<Timestamp> {
    vessel.sail(to_gate)?;

    let wait = tide.time_to_depth(vessel.clock, draft)?;
    if wait > 0 {
        let depth = tide.depth_at(vessel.clock)?;
        vessel.remember(VesselState::Waiting, format!("low tide {depth:.3}, draft {draft:.3}"))?;
        vessel.spend(wait);
    }
    let depth = tide.depth_at(vessel.clock)?;
    vessel.remember(VesselState::RiefPassed, format!("tide {depth:.3}"))?;

    vessel.sail(from_gate)?;
    Ok(wait)
}

/// Pre-crossing preparation for vessels that need it. The vessel
/// resumes its previous state and comment once done.
pub fn prepare_for_rief(vessel: &mut Vessel) -> SimResult<()> {
    let prep = vessel.barge_spec().map_or(0, |spec| spec.rief_preparing_time);
    if prep == 0 {
        return Ok(());
    }
    let state = vessel.state();
    let comment = vessel.history().last().map(|e| e.comment.clone()).unwrap_or_default();
    vessel.remember(VesselState::Docking, "assembling for rief")?;
    vessel.spend(prep);
    vessel.remember(state, comment)
}
