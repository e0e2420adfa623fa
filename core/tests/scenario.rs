//! End-to-end runs of whole scenarios.

use bargeflow_core::{
    config::{OgvConfig, RouteConfig, ScenarioConfig},
    engine::Simulation,
    stats::RunStats,
    table::TideTable,
    types::{LoadingOrder, VesselId},
    vessel::{BargeSpec, DraftPolicy, Vessel, VesselState},
};
use std::sync::Arc;

const HORIZON: u64 = 43_200; // 30 days
const CARGO: f64 = 5000.0;

/// Semi-diurnal tide: 1 m at half period, 5 m at the period edges.
fn tide() -> Arc<TideTable> {
    let samples = (0..=12).map(|i| {
        let minute = i * 62;
        let phase = std::f64::consts::TAU * minute as f64 / 744.0;
        (minute, 3.0 + 2.0 * phase.cos())
    });
    Arc::new(TideTable::from_samples(samples).expect("tide samples"))
}

fn barge_spec() -> BargeSpec {
    BargeSpec {
        ballast_draft:       2.0,
        cargo_draft:         DraftPolicy::Constant(3.6),
        draft_bonus:         0.0,
        ballast_velocity:    6.5 / 60.0,
        cargo_velocity:      5.5 / 60.0,
        docking_time:        45,
        undocking_time:      45,
        anchoring_time:      20,
        unanchoring_time:    20,
        rief_preparing_time: 0,
        towable:             false,
    }
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn single_barge(seed: u64) -> Simulation {
    init_logging();
    let mut sim = Simulation::new(RouteConfig::default(), OgvConfig::default(), 759.0 / 60.0, 1, seed);
    sim.set_tides(tide());
    let orders = vec![LoadingOrder::per_hour(CARGO, 2000.0); 1000];
    sim.add_vessel(Vessel::barge("BARGE #1", barge_spec(), 7200.0), orders)
        .expect("add barge");
    sim
}

fn is_cycle_state(state: VesselState) -> bool {
    matches!(
        state,
        VesselState::Loading | VesselState::GoingUnload | VesselState::Unloading | VesselState::GoingLoad
    )
}

#[test]
fn single_barge_month_moves_whole_loads() {
    let mut sim = single_barge(1);
    let total = sim.run(HORIZON).expect("run");

    assert!(total > 0.0, "Nothing was moved in 30 days");
    assert_eq!(total % CARGO, 0.0, "Total {total} is not a whole number of loads");
    let barge = sim.vessel(VesselId(0));
    assert_eq!(barge.loads as f64 * CARGO, total);
    // Fastest possible round trip is well over 1100 minutes.
    assert!(total <= (HORIZON / 1100 + 1) as f64 * CARGO, "Implausible total {total}");
    assert!(barge.clock >= HORIZON);
}

#[test]
fn single_barge_cycles_through_its_states() {
    let mut sim = single_barge(2);
    sim.run(HORIZON).expect("run");
    let history = sim.vessel(VesselId(0)).history();

    let mut cycle: Vec<VesselState> = history
        .entries()
        .iter()
        .map(|e| e.state)
        .filter(|s| is_cycle_state(*s))
        .collect();
    cycle.dedup();

    let expected = [
        VesselState::Loading,
        VesselState::GoingUnload,
        VesselState::Unloading,
        VesselState::GoingLoad,
    ];
    assert!(cycle.len() > 8, "Expected several cycles, got {cycle:?}");
    for (i, state) in cycle.iter().enumerate() {
        assert_eq!(*state, expected[i % 4], "Cycle broken at step {i}: {cycle:?}");
    }

    for pair in history.entries().windows(2) {
        assert!(
            pair[0].at < pair[1].at,
            "History not strictly increasing: {} then {}",
            pair[0].at,
            pair[1].at
        );
    }
}

#[test]
fn crossings_only_happen_on_enough_water() {
    let mut sim = single_barge(3);
    sim.run(HORIZON).expect("run");
    let tide = tide();

    let mut heading = VesselState::Loading;
    for entry in sim.vessel(VesselId(0)).history().entries() {
        match entry.state {
            VesselState::GoingUnload | VesselState::GoingLoad => heading = entry.state,
            VesselState::RiefPassed => {
                let draft = if heading == VesselState::GoingUnload { 3.6 } else { 2.0 };
                let depth = tide.depth_at(entry.at).unwrap();
                assert!(depth >= draft, "Crossed at {} with depth {depth} < draft {draft}", entry.at);
            }
            _ => {}
        }
    }
}

fn fleet_scenario() -> Simulation {
    init_logging();
    let mut config = ScenarioConfig::default_test();
    config.fleet[0].count = 4;
    config.build(tide(), None).expect("build")
}

#[test]
fn reservations_never_overlap() {
    let mut sim = fleet_scenario();
    sim.run(HORIZON).expect("run");

    for resource in sim.resources().iter() {
        let spans: Vec<(u64, u64)> = resource
            .reservations()
            .map(|(start, r)| (start, start + r.duration))
            .collect();
        assert!(!spans.is_empty(), "{} was never used", resource.name);
        for pair in spans.windows(2) {
            assert!(
                pair[0].1 <= pair[1].0,
                "{}: [{}, {}) overlaps [{}, {})",
                resource.name,
                pair[0].0,
                pair[0].1,
                pair[1].0,
                pair[1].1
            );
        }
    }
}

#[test]
fn berth_stays_reserved_through_the_whole_discharge() {
    let mut sim = fleet_scenario();
    sim.run(HORIZON).expect("run");

    let mut discharges = 0;
    for ctx in sim.fleet().iter() {
        let entries = ctx.vessel.history().entries();
        for (i, entry) in entries.iter().enumerate() {
            let Some(name) = entry.comment.strip_prefix("docking at ") else {
                continue;
            };
            if entry.state != VesselState::Unloading {
                continue;
            }
            let Some(left) = entries[i..].iter().find(|e| e.state == VesselState::GoingLoad) else {
                continue;
            };
            let berth = sim
                .resources()
                .iter()
                .find(|r| r.name == name)
                .unwrap_or_else(|| panic!("{} docked at unknown {name}", ctx.vessel.id));
            let (start, reservation) = berth
                .reservations()
                .find(|(start, r)| *start == entry.at && r.holder.as_deref() == Some(ctx.vessel.id.as_str()))
                .unwrap_or_else(|| panic!("{} docked at {name} at {} without a reservation", ctx.vessel.id, entry.at));
            assert_eq!(
                start + reservation.duration,
                left.at,
                "{} held {name} for {} but left at {}",
                ctx.vessel.id,
                reservation.duration,
                left.at
            );
            discharges += 1;
        }
    }
    assert!(discharges > 0, "No barge ever discharged");
}

#[test]
fn shared_loader_makes_barges_wait() {
    let mut sim = fleet_scenario();
    let total = sim.run(HORIZON).expect("run");
    let stats = RunStats::collect(&sim);

    assert_eq!(stats.total_cargo, total);
    assert_eq!(stats.barges, 4);
    assert_eq!(stats.tugs, 0);
    assert!(stats.loading > 0.0);
    assert!(stats.unloading > 0.0);
    assert!(
        stats.lost_waiting_loader + stats.lost_waiting_unloader > 0.0,
        "Four barges on one loader and one berth never queued: {stats:?}"
    );

    let barges = sim.fleet().len() as f64;
    let hours_with = |comment: &str| {
        sim.fleet()
            .iter()
            .map(|ctx| ctx.vessel.history().time_with_comment(comment))
            .sum::<u64>() as f64
            / 60.0
            / barges
    };
    assert_eq!(stats.lost_waiting_loader, hours_with("loader busy"));
    assert_eq!(stats.lost_waiting_unloader, hours_with("unloader busy"));
    let json = serde_json::to_string(&stats).expect("stats serialize");
    assert!(json.contains("lost_waiting_tide"));
}

#[test]
fn event_log_is_time_ordered_and_complete() {
    let mut sim = fleet_scenario();
    sim.run(HORIZON).expect("run");

    let log = sim.event_log();
    for pair in log.windows(2) {
        assert!(pair[0].at <= pair[1].at);
    }
    let barge_records: usize = sim.fleet().iter().map(|ctx| ctx.vessel.history().len()).sum();
    let ogv_records: usize = sim.ogvs().iter().map(|ogv| ogv.history().len()).sum();
    assert_eq!(log.len(), barge_records + ogv_records);

    let text = sim.render_log();
    assert!(text.contains("Log of \"BTC #1\""));
    assert!(text.contains("Log of \"OGV #0\""));
    assert!(text.contains("Log of \"Loader\""));
    assert!(text.contains("locked: "));
}

#[test]
fn alternate_barges_start_on_the_unloading_side() {
    let mut sim = fleet_scenario();
    sim.run(HORIZON).expect("run");
    for (i, ctx) in sim.fleet().iter().enumerate() {
        let entries = ctx.vessel.history().entries();
        let first_crossing = entries.iter().position(|e| e.state == VesselState::RiefPassed);
        let first_loading = entries.iter().position(|e| e.state == VesselState::Loading);
        let (crossing, loading) = (first_crossing.expect("crossed"), first_loading.expect("loaded"));
        if i % 2 == 1 {
            assert!(crossing < loading, "{} should cross before its first load", ctx.vessel.id);
        } else {
            assert!(loading < crossing, "{} should load before its first crossing", ctx.vessel.id);
        }
    }
}
