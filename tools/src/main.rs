//! sweep-runner: throughput sweep over barge fleet configurations.
//!
//! Usage:
//!   sweep-runner --tides tides_data.txt --drafts draft.txt --days 30
//!   sweep-runner --config scenario.json --tides tides_data.txt --db sweep.db --log-dir logs
//!   sweep-runner --config washtubs.json --river-tugs 1,2 --sea-tugs 1,2,3
//!
//! Sweeps barge count, loader rate and order cargo for the first fleet
//! group of the scenario, and the river and sea tug counts. Every scenario
//! result goes to the SQLite store; the best cargo per (rate, barges, tugs)
//! also gets a full text log.

mod store;
mod sweep;
mod tables;

use anyhow::{Context, Result};
use bargeflow_core::{config::ScenarioConfig, stats::RunStats, tow::TowLeg};
use std::{collections::BTreeMap, env, path::Path, sync::Arc};
use store::SweepStore;
use sweep::{run_point, tug_count, ScenarioPoint, SweepPlan};
use tables::Scaling;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut config = match flag_value(&args, "--config") {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default_test(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);
    config.horizon_days = parse_arg(&args, "--days", config.horizon_days);

    let tides_path = flag_value(&args, "--tides").unwrap_or("tides_data.txt");
    let tide_bonus = parse_arg(&args, "--tide-bonus", 1.4f64);
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let log_dir = flag_value(&args, "--log-dir");

    let tide = Arc::new(tables::load_tide_table(tides_path, tide_bonus)?);
    let drafts = flag_value(&args, "--drafts")
        .map(|path| tables::load_draft_table(path, Scaling::default()))
        .transpose()?
        .map(Arc::new);

    let plan = SweepPlan {
        barges:          (1..=parse_arg(&args, "--max-barges", 4usize)).collect(),
        tonnes_per_hour: parse_list(&args, "--rates", &[1500.0, 2000.0, 2500.0]),
        cargoes:         SweepPlan::cargo_range(
            parse_arg(&args, "--cargo-min", 3000.0f64),
            parse_arg(&args, "--cargo-max", 7200.0f64),
            parse_arg(&args, "--cargo-step", 200.0f64),
        ),
        tugs:            SweepPlan::tug_pairs(
            &parse_list(&args, "--river-tugs", &[tug_count(&config, TowLeg::River)]),
            &parse_list(&args, "--sea-tugs", &[tug_count(&config, TowLeg::Sea)]),
        ),
    };

    println!("bargeflow sweep-runner");
    println!("  seed:      {}", config.seed);
    println!("  days:      {}", config.horizon_days);
    println!("  tides:     {tides_path}");
    println!("  db:        {db}");
    println!("  scenarios: {}", plan.points().len());
    println!();

    let store = SweepStore::open(db)?;
    store.migrate()?;
    let sweep_id = uuid::Uuid::new_v4().to_string();
    store.insert_sweep(&sweep_id, config.seed, env!("CARGO_PKG_VERSION"), &serde_json::to_string(&config)?)?;

    let mut best: BTreeMap<BestKey, (ScenarioPoint, RunStats)> = BTreeMap::new();
    let mut failures = 0usize;

    for point in plan.points() {
        let outcome = run_point(&config, &point, &tide, drafts.as_ref()).map(|(stats, _)| stats);
        match &outcome {
            Ok(stats) => {
                log::debug!("{point:?}: {:.0} t", stats.total_cargo);
                let key = (point.barges, point.tonnes_per_hour.to_bits(), point.river_tugs, point.sea_tugs);
                let better = best.get(&key).map_or(true, |(_, b)| stats.total_cargo > b.total_cargo);
                if better {
                    best.insert(key, (point, stats.clone()));
                }
            }
            Err(err) => {
                failures += 1;
                log::warn!("{point:?} failed ({:?}): {err}", err.kind());
            }
        }
        store.insert_result(&sweep_id, &point, &outcome)?;
    }

    print_summary(&best, failures);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("Cannot create {dir}"))?;
        for (point, _) in best.values() {
            write_log(Path::new(dir), &config, point, &tide, drafts.as_ref())?;
        }
    }

    println!();
    println!("sweep {sweep_id} stored in {db}");
    Ok(())
}

/// (barges, rate bits, river tugs, sea tugs)
type BestKey = (usize, u64, usize, usize);

fn print_summary(best: &BTreeMap<BestKey, (ScenarioPoint, RunStats)>, failures: usize) {
    println!("=== BEST PER FLEET ===");
    println!(
        "  rate t/h  barges  tugs r/s  cargo t   moved t    passes  tide h  loader h  unloader h  ogv h  tug h  sea tug h"
    );
    let mut rows: Vec<_> = best.values().collect();
    rows.sort_by(|a, b| {
        a.0.tonnes_per_hour
            .total_cmp(&b.0.tonnes_per_hour)
            .then(a.0.barges.cmp(&b.0.barges))
            .then(a.0.river_tugs.cmp(&b.0.river_tugs))
            .then(a.0.sea_tugs.cmp(&b.0.sea_tugs))
    });
    for (point, stats) in rows {
        println!(
            "  {:>8.0}  {:>6}  {:>4}/{:<3}  {:>7.0}  {:>9.0}  {:>6.1}  {:>6.1}  {:>8.1}  {:>10.1}  {:>5.1}  {:>5.1}  {:>9.1}",
            point.tonnes_per_hour,
            point.barges,
            point.river_tugs,
            point.sea_tugs,
            point.cargo,
            stats.total_cargo,
            stats.passes,
            stats.lost_waiting_tide,
            stats.lost_waiting_loader,
            stats.lost_waiting_unloader,
            stats.lost_waiting_ogv,
            stats.lost_waiting_tug,
            stats.lost_waiting_sea_tug,
        );
    }
    if failures > 0 {
        println!("  ({failures} scenario(s) failed; see the store for details)");
    }
}

/// Rerun `point` and write every vessel and resource history.
fn write_log(
    dir: &Path,
    config: &ScenarioConfig,
    point: &ScenarioPoint,
    tide: &Arc<bargeflow_core::table::TideTable>,
    drafts: Option<&Arc<bargeflow_core::table::DraftTable>>,
) -> Result<()> {
    let (stats, sim) = run_point(config, point, tide, drafts)?;
    let path = dir.join(format!(
        "Log_{}barges_{:.0}tph_{:.0}t_{}r{}s.txt",
        point.barges, point.tonnes_per_hour, point.cargo, point.river_tugs, point.sea_tugs
    ));
    let header = format!(
        "Statistics for {} barge(s), loading rate = {:.0} t/h, cargo = {:.0} t, tugs = {} river / {} sea\n{}\n",
        point.barges,
        point.tonnes_per_hour,
        point.cargo,
        point.river_tugs,
        point.sea_tugs,
        serde_json::to_string_pretty(&stats)?,
    );
    std::fs::write(&path, header + &sim.render_log())
        .with_context(|| format!("Cannot write {}", path.display()))?;
    log::info!("log written to {}", path.display());
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

/// Comma-separated values; the default when the flag is absent or empty.
fn parse_list<T: std::str::FromStr + Clone>(args: &[String], flag: &str, default: &[T]) -> Vec<T> {
    let parsed: Vec<T> = flag_value(args, flag)
        .map(|list| list.split(',').filter_map(|v| v.trim().parse().ok()).collect())
        .unwrap_or_default();
    if parsed.is_empty() {
        default.to_vec()
    } else {
        parsed
    }
}
