//! SQLite persistence for sweep results.
//!
//! RULE: Only store.rs talks to the database.

use crate::sweep::{Outcome, ScenarioPoint};
use anyhow::Result;
#[cfg(test)]
use bargeflow_core::stats::RunStats;
use rusqlite::{params, Connection};

pub struct SweepStore {
    conn: Connection,
}

/// One stored scenario row.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub point:       ScenarioPoint,
    pub total_cargo: Option<f64>,
    pub stats:       Option<RunStats>,
    pub error_kind:  Option<String>,
}

impl SweepStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_sweep.sql"))?;
        Ok(())
    }

    // ── Sweep ──────────────────────────────────────────────────

    pub fn insert_sweep(&self, sweep_id: &str, seed: u64, version: &str, config_json: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sweep (sweep_id, seed, version, config_json, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![sweep_id, seed as i64, version, config_json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    // ── Scenario results ───────────────────────────────────────

    pub fn insert_result(&self, sweep_id: &str, point: &ScenarioPoint, outcome: &Outcome) -> Result<()> {
        let (total, stats_json, error_kind, error) = match outcome {
            Ok(stats) => (Some(stats.total_cargo), Some(serde_json::to_string(stats)?), None, None),
            Err(err) => (None, None, Some(format!("{:?}", err.kind())), Some(err.to_string())),
        };
        self.conn.execute(
            "INSERT INTO scenario_result
               (sweep_id, barges, tonnes_per_hour, cargo, river_tugs, sea_tugs,
                total_cargo, stats_json, error_kind, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                sweep_id,
                point.barges as i64,
                point.tonnes_per_hour,
                point.cargo,
                point.river_tugs as i64,
                point.sea_tugs as i64,
                total,
                stats_json,
                error_kind,
                error,
            ],
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn results(&self, sweep_id: &str) -> Result<Vec<ResultRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT barges, tonnes_per_hour, cargo, river_tugs, sea_tugs,
                    total_cargo, stats_json, error_kind
             FROM scenario_result WHERE sweep_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![sweep_id], |row| {
                Ok((
                    ScenarioPoint {
                        barges:          row.get::<_, i64>(0)? as usize,
                        tonnes_per_hour: row.get(1)?,
                        cargo:           row.get(2)?,
                        river_tugs:      row.get::<_, i64>(3)? as usize,
                        sea_tugs:        row.get::<_, i64>(4)? as usize,
                    },
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(point, total_cargo, stats_json, error_kind)| -> Result<ResultRow> {
                let stats = stats_json.map(|json| serde_json::from_str(&json)).transpose()?;
                Ok(ResultRow { point, total_cargo, stats, error_kind })
            })
            .collect()
    }
}
