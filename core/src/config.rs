//! Scenario configuration: route, OGV schedule, fleet and tugs.
//!
//! Loaded from one JSON file by the sweep runner, or built in code via
//! `default_test()`. `build` turns a config plus lookup tables into a
//! ready-to-run `Simulation`.

use crate::{
    clock::days,
    engine::Simulation,
    error::{SimError, SimResult},
    table::{DraftTable, TideTable},
    tow::{Side, TowLeg},
    types::{LoadingOrder, Timestamp},
    vessel::{BargeSpec, DraftPolicy, TowSpec, Vessel},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

/// Distances in nautical miles, measured from the loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Loader to unloading berths.
    pub total_distance:  f64,
    /// Loader to the rief.
    pub dist_to_gate:    f64,
    /// Loader to the point where tugs hand barges over.
    pub dist_to_handoff: f64,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self { total_distance: 23.5, dist_to_gate: 3.78, dist_to_handoff: 6.0 }
    }
}

impl RouteConfig {
    /// The handoff point only matters when something is towed; it must
    /// then lie past the rief and short of the berths.
    pub fn validate(&self, towing: bool) -> SimResult<()> {
        let invalid = |reason: String| Err(SimError::InvalidRoute { reason });
        if !(self.total_distance > 0.0 && self.total_distance.is_finite()) {
            return invalid(format!("total distance {} must be positive", self.total_distance));
        }
        if !(0.0..=self.total_distance).contains(&self.dist_to_gate) {
            return invalid(format!(
                "rief at {} outside route [0, {}]",
                self.dist_to_gate, self.total_distance
            ));
        }
        if towing && !(self.dist_to_gate..=self.total_distance).contains(&self.dist_to_handoff) {
            return invalid(format!(
                "handoff at {} must lie between the rief ({}) and the berths ({})",
                self.dist_to_handoff, self.dist_to_gate, self.total_distance
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OgvConfig {
    /// Minutes between scheduled arrivals.
    pub period:          Timestamp,
    /// Standard deviation of arrival jitter, minutes.
    pub period_std_dev:  f64,
    /// Minutes to swap a full OGV for the next one.
    pub changeover_time: Timestamp,
    pub capacity:        f64,
}

impl Default for OgvConfig {
    fn default() -> Self {
        Self {
            period:          24 * 60,
            period_std_dev:  8.0 * 60.0,
            changeover_time: 30,
            capacity:        63_000.0,
        }
    }
}

/// Hull types with their stock particulars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselPreset {
    /// Self-propelled barge; loaded draft from the draft table.
    Barge,
    /// Barge-towing combination; assembles before every rief crossing.
    Btc,
    /// Dumb barge with no engine; moved by river and sea tugs.
    Washtub,
}

impl VesselPreset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Barge   => "BARGE",
            Self::Btc     => "BTC",
            Self::Washtub => "WASHTUB",
        }
    }

    pub fn capacity(&self) -> f64 {
        match self {
            Self::Barge   => 7200.0,
            Self::Btc     => 12_000.0,
            Self::Washtub => 6000.0,
        }
    }

    /// Stock spec. `cargo_draft` overrides the preset's loaded draft;
    /// without it a `Barge` needs the draft table.
    pub fn spec(
        &self,
        drafts: Option<&Arc<DraftTable>>,
        cargo_draft: Option<f64>,
    ) -> SimResult<BargeSpec> {
        let constant = cargo_draft.map(DraftPolicy::Constant);
        let spec = match self {
            Self::Barge => BargeSpec {
                ballast_draft:       3.0,
                cargo_draft:         match (constant, drafts) {
                    (Some(policy), _) => policy,
                    (None, Some(table)) => DraftPolicy::Table(Arc::clone(table)),
                    (None, None) => {
                        return Err(SimError::InvalidParameter {
                            name:   "drafts".into(),
                            reason: "the barge preset needs a draft table or a cargo_draft".into(),
                        })
                    }
                },
                draft_bonus:         0.6,
                ballast_velocity:    6.5 / 60.0,
                cargo_velocity:      5.5 / 60.0,
                docking_time:        45,
                undocking_time:      45,
                anchoring_time:      20,
                unanchoring_time:    20,
                rief_preparing_time: 0,
                towable:             false,
            },
            Self::Btc => BargeSpec {
                ballast_draft:       0.9,
                cargo_draft:         constant.unwrap_or(DraftPolicy::Constant(3.0)),
                draft_bonus:         0.0,
                ballast_velocity:    5.5 / 60.0,
                cargo_velocity:      4.5 / 60.0,
                docking_time:        45,
                undocking_time:      45,
                anchoring_time:      20,
                unanchoring_time:    20,
                rief_preparing_time: 45,
                towable:             false,
            },
            Self::Washtub => BargeSpec {
                ballast_draft:       0.96,
                cargo_draft:         constant.unwrap_or(DraftPolicy::Constant(2.86)),
                draft_bonus:         0.0,
                ballast_velocity:    0.0,
                cargo_velocity:      0.0,
                docking_time:        45,
                undocking_time:      45,
                anchoring_time:      20,
                unanchoring_time:    20,
                rief_preparing_time: 60,
                towable:             true,
            },
        };
        Ok(spec)
    }
}

fn default_orders() -> usize {
    1000
}

/// A group of identical barges with identical order queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetEntry {
    pub preset:          VesselPreset,
    pub count:           usize,
    /// Tonnes loaded per order.
    pub cargo:           f64,
    pub tonnes_per_hour: f64,
    /// Orders queued per barge.
    #[serde(default = "default_orders")]
    pub orders:          usize,
    /// Overrides the preset's towable flag.
    #[serde(default)]
    pub towable:         Option<bool>,
    /// Overrides the preset's loaded draft, metres.
    #[serde(default)]
    pub cargo_draft:     Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TugConfig {
    pub count:         usize,
    /// Pool the group joins.
    pub leg:           TowLeg,
    /// Station at run start.
    pub side:          Side,
    pub ballast_draft: f64,
    /// Knots with a barge on the hook.
    pub towing_knots:  f64,
    /// Knots running free.
    pub moving_knots:  f64,
    pub max_towed:     usize,
    pub coupling_time: Timestamp,
}

impl Default for TugConfig {
    fn default() -> Self {
        let spec = TowSpec::default();
        Self {
            count:         1,
            leg:           TowLeg::River,
            side:          Side::Loading,
            ballast_draft: spec.ballast_draft,
            towing_knots:  spec.towing_velocity * 60.0,
            moving_knots:  spec.moving_velocity * 60.0,
            max_towed:     spec.max_towed,
            coupling_time: spec.coupling_time,
        }
    }
}

impl TugConfig {
    pub fn spec(&self) -> TowSpec {
        TowSpec {
            ballast_draft:   self.ballast_draft,
            towing_velocity: self.towing_knots / 60.0,
            moving_velocity: self.moving_knots / 60.0,
            max_towed:       self.max_towed,
            coupling_time:   self.coupling_time,
        }
    }
}

fn default_horizon_days() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub seed:                    u64,
    pub berths:                  usize,
    pub unloading_rate_per_hour: f64,
    #[serde(default = "default_horizon_days")]
    pub horizon_days:            u64,
    #[serde(default)]
    pub route:                   RouteConfig,
    #[serde(default)]
    pub ogv:                     OgvConfig,
    pub fleet:                   Vec<FleetEntry>,
    #[serde(default)]
    pub tugs:                    Vec<TugConfig>,
}

impl ScenarioConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ScenarioConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Minimal hard-coded config for tests: two BTCs, one berth, no tugs.
    pub fn default_test() -> Self {
        Self {
            seed:                    42,
            berths:                  1,
            unloading_rate_per_hour: 759.0,
            horizon_days:            30,
            route:                   RouteConfig::default(),
            ogv:                     OgvConfig::default(),
            fleet:                   vec![FleetEntry {
                preset:          VesselPreset::Btc,
                count:           2,
                cargo:           5000.0,
                tonnes_per_hour: 2000.0,
                orders:          default_orders(),
                towable:         None,
                cargo_draft:     None,
            }],
            tugs:                    Vec::new(),
        }
    }

    pub fn horizon(&self) -> Timestamp {
        days(self.horizon_days)
    }

    /// Instantiate every barge and tug. Barges are named per preset in
    /// fleet order (`BTC #1`, `BTC #2`, …), river tugs `TUG #1`, …, sea
    /// tugs `SEA TUG #1`, ….
    pub fn build(
        &self,
        tide: Arc<TideTable>,
        drafts: Option<Arc<DraftTable>>,
    ) -> SimResult<Simulation> {
        let mut sim = Simulation::new(
            self.route,
            self.ogv.clone(),
            self.unloading_rate_per_hour / 60.0,
            self.berths,
            self.seed,
        );
        sim.set_tides(tide);

        let mut counters: HashMap<VesselPreset, usize> = HashMap::new();
        for entry in &self.fleet {
            let capacity = entry.preset.capacity();
            if !(entry.cargo > 0.0 && entry.cargo <= capacity) {
                return Err(SimError::InvalidParameter {
                    name:   format!("{} cargo", entry.preset.name()),
                    reason: format!("{} not within (0, {capacity}]", entry.cargo),
                });
            }
            if !(entry.tonnes_per_hour > 0.0) {
                return Err(SimError::InvalidParameter {
                    name:   format!("{} tonnes_per_hour", entry.preset.name()),
                    reason: format!("must be positive, got {}", entry.tonnes_per_hour),
                });
            }
            let mut spec = entry.preset.spec(drafts.as_ref(), entry.cargo_draft)?;
            if let Some(towable) = entry.towable {
                spec.towable = towable;
            }
            let order = LoadingOrder::per_hour(entry.cargo, entry.tonnes_per_hour);
            for _ in 0..entry.count {
                let n = counters.entry(entry.preset).or_default();
                *n += 1;
                let vessel = Vessel::barge(format!("{} #{n}", entry.preset.name()), spec.clone(), capacity);
                sim.add_vessel(vessel, vec![order; entry.orders])?;
            }
        }

        let (mut river, mut sea) = (0, 0);
        for group in &self.tugs {
            for _ in 0..group.count {
                let name = match group.leg {
                    TowLeg::River => {
                        river += 1;
                        format!("TUG #{river}")
                    }
                    TowLeg::Sea => {
                        sea += 1;
                        format!("SEA TUG #{sea}")
                    }
                };
                sim.add_tug(Vessel::tow(name, group.spec()), group.leg, group.side)?;
            }
        }
        Ok(sim)
    }
}
