//! The parameter grid and single-scenario execution.
//!
//! Every point is built from the base config and run in isolation; a
//! failing point never affects the next one.

use bargeflow_core::{
    config::{ScenarioConfig, TugConfig},
    engine::Simulation,
    error::{SimError, SimResult},
    stats::RunStats,
    table::{DraftTable, TideTable},
    tow::TowLeg,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of one scenario run.
pub type Outcome = Result<RunStats, SimError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPoint {
    pub barges:          usize,
    pub tonnes_per_hour: f64,
    pub cargo:           f64,
    pub river_tugs:      usize,
    pub sea_tugs:        usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub barges:          Vec<usize>,
    pub tonnes_per_hour: Vec<f64>,
    pub cargoes:         Vec<f64>,
    /// (river, sea) tug counts.
    pub tugs:            Vec<(usize, usize)>,
}

impl SweepPlan {
    /// Cargo from `min` to `max` inclusive in `step` increments.
    pub fn cargo_range(min: f64, max: f64, step: f64) -> Vec<f64> {
        if !(step > 0.0) || min > max {
            return vec![min];
        }
        let count = ((max - min) / step + 1e-9).floor() as usize;
        (0..=count).map(|i| min + step * i as f64).collect()
    }

    /// Every (river, sea) pair of the two count lists.
    pub fn tug_pairs(river: &[usize], sea: &[usize]) -> Vec<(usize, usize)> {
        river.iter().flat_map(|&r| sea.iter().map(move |&s| (r, s))).collect()
    }

    /// Rate-major, then barge count, then tugs, then cargo.
    pub fn points(&self) -> Vec<ScenarioPoint> {
        let mut points = Vec::new();
        for &tonnes_per_hour in &self.tonnes_per_hour {
            for &barges in &self.barges {
                for &(river_tugs, sea_tugs) in &self.tugs {
                    for &cargo in &self.cargoes {
                        points.push(ScenarioPoint { barges, tonnes_per_hour, cargo, river_tugs, sea_tugs });
                    }
                }
            }
        }
        points
    }
}

/// Tug count of one pool across every group of `base`.
pub fn tug_count(base: &ScenarioConfig, leg: TowLeg) -> usize {
    base.tugs.iter().filter(|g| g.leg == leg).map(|g| g.count).sum()
}

/// Collapse the `leg` groups into one group of `count` tugs, keeping the
/// first group's tug parameters.
fn set_tug_count(tugs: &mut Vec<TugConfig>, leg: TowLeg, count: usize) {
    let template = tugs
        .iter()
        .find(|g| g.leg == leg)
        .cloned()
        .unwrap_or(TugConfig { leg, ..TugConfig::default() });
    tugs.retain(|g| g.leg != leg);
    if count > 0 {
        tugs.push(TugConfig { count, ..template });
    }
}

/// Apply `point` to the first fleet group and the tug pools of `base`.
pub fn scenario_for(base: &ScenarioConfig, point: &ScenarioPoint) -> SimResult<ScenarioConfig> {
    let mut config = base.clone();
    let entry = config.fleet.first_mut().ok_or(SimError::NoVessels)?;
    entry.count = point.barges;
    entry.tonnes_per_hour = point.tonnes_per_hour;
    entry.cargo = point.cargo;
    set_tug_count(&mut config.tugs, TowLeg::River, point.river_tugs);
    set_tug_count(&mut config.tugs, TowLeg::Sea, point.sea_tugs);
    Ok(config)
}

pub fn run_point(
    base: &ScenarioConfig,
    point: &ScenarioPoint,
    tide: &Arc<TideTable>,
    drafts: Option<&Arc<DraftTable>>,
) -> SimResult<(RunStats, Simulation)> {
    let config = scenario_for(base, point)?;
    let mut sim = config.build(Arc::clone(tide), drafts.cloned())?;
    sim.run(config.horizon())?;
    Ok((RunStats::collect(&sim), sim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bargeflow_core::{config::VesselPreset, error::ErrorKind, tow::Side};

    fn tide() -> Arc<TideTable> {
        Arc::new(TideTable::from_samples([(0, 5.0), (372, 3.5), (744, 5.0)]).unwrap())
    }

    fn base() -> ScenarioConfig {
        ScenarioConfig { horizon_days: 5, ..ScenarioConfig::default_test() }
    }

    #[test]
    fn cargo_range_is_inclusive() {
        assert_eq!(SweepPlan::cargo_range(3000.0, 3600.0, 200.0), vec![3000.0, 3200.0, 3400.0, 3600.0]);
        assert_eq!(SweepPlan::cargo_range(3000.0, 3100.0, 200.0), vec![3000.0]);
    }

    #[test]
    fn plan_covers_the_whole_grid() {
        let plan = SweepPlan {
            barges:          vec![1, 2, 3],
            tonnes_per_hour: vec![1500.0, 2000.0],
            cargoes:         vec![4000.0, 5000.0],
            tugs:            SweepPlan::tug_pairs(&[1, 2], &[1]),
        };
        let points = plan.points();
        assert_eq!(points.len(), 24);
        assert_eq!(points[0], point(1, 1500.0, 4000.0, (1, 1)));
        assert_eq!(points[2], point(1, 1500.0, 4000.0, (2, 1)));
        assert_eq!(points[23], point(3, 2000.0, 5000.0, (2, 1)));
    }

    #[test]
    fn tug_pairs_cross_both_lists() {
        assert_eq!(SweepPlan::tug_pairs(&[0, 1], &[2, 3]), vec![(0, 2), (0, 3), (1, 2), (1, 3)]);
    }

    fn point(barges: usize, tonnes_per_hour: f64, cargo: f64, tugs: (usize, usize)) -> ScenarioPoint {
        ScenarioPoint { barges, tonnes_per_hour, cargo, river_tugs: tugs.0, sea_tugs: tugs.1 }
    }

    fn towed_base() -> ScenarioConfig {
        let mut config = base();
        config.fleet[0].preset = VesselPreset::Washtub;
        config.tugs.push(TugConfig { count: 3, side: Side::Unloading, ..TugConfig::default() });
        config.tugs.push(TugConfig { count: 1, ..TugConfig::default() });
        config
    }

    #[test]
    fn point_sets_each_tug_pool() {
        let config = scenario_for(&towed_base(), &point(2, 2000.0, 5000.0, (2, 1))).expect("scenario");
        assert_eq!(tug_count(&config, TowLeg::River), 2);
        assert_eq!(tug_count(&config, TowLeg::Sea), 1);
        let river: Vec<_> = config.tugs.iter().filter(|g| g.leg == TowLeg::River).collect();
        assert_eq!(river.len(), 1, "River groups should collapse into one");
        assert_eq!(river[0].side, Side::Unloading, "First group's parameters are kept");

        let config = scenario_for(&towed_base(), &point(2, 2000.0, 5000.0, (1, 0))).expect("scenario");
        assert!(config.tugs.iter().all(|g| g.leg == TowLeg::River));
    }

    #[test]
    fn tug_counts_drive_the_towed_run() {
        let (stats, _) = run_point(&towed_base(), &point(2, 2000.0, 5000.0, (1, 2)), &tide(), None).expect("run");
        assert_eq!((stats.tugs, stats.sea_tugs), (1, 2));
        assert!(stats.total_cargo > 0.0);

        let err = run_point(&towed_base(), &point(2, 2000.0, 5000.0, (1, 0)), &tide(), None)
            .err()
            .expect("no sea tugs");
        assert!(matches!(err, SimError::NoTugs { leg: TowLeg::Sea, .. }), "Got {err:?}");
    }

    #[test]
    fn a_point_runs_independently() {
        let (stats, sim) = run_point(&base(), &point(2, 2000.0, 5000.0, (0, 0)), &tide(), None).expect("run");
        assert_eq!(stats.barges, 2);
        assert_eq!(sim.fleet().len(), 2);
        assert!(stats.total_cargo > 0.0);
    }

    #[test]
    fn a_failing_point_reports_its_kind() {
        let err = run_point(&base(), &point(1, 2000.0, 50_000.0, (0, 0)), &tide(), None).err().expect("oversized cargo");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}
