//! Plain-text table loaders: draft curves and daily tide sheets.
//!
//! Both formats are whitespace-separated numbers, one record per line.
//! Malformed lines are logged and skipped; blank lines are ignored.

use anyhow::{Context, Result};
use bargeflow_core::table::{DraftTable, TideTable};

/// Linear transform applied to every key/value pair on load.
#[derive(Debug, Clone, Copy)]
pub struct Scaling {
    pub key_multiplier:   f64,
    pub value_multiplier: f64,
    pub key_offset:       f64,
    pub value_offset:     f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self { key_multiplier: 1.0, value_multiplier: 1.0, key_offset: 0.0, value_offset: 0.0 }
    }
}

/// Parse `key value` lines.
pub fn parse_key_values(text: &str, scaling: Scaling) -> Vec<(f64, f64)> {
    let mut pairs = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace().map(str::parse::<f64>);
        match (fields.next(), fields.next()) {
            (Some(Ok(key)), Some(Ok(value))) => pairs.push((
                key * scaling.key_multiplier + scaling.key_offset,
                value * scaling.value_multiplier + scaling.value_offset,
            )),
            _ => log::warn!("Unable to parse \"{line}\": expected \"<key> <value>\""),
        }
    }
    pairs
}

pub fn load_draft_table(path: &str, scaling: Scaling) -> Result<DraftTable> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let pairs = parse_key_values(&text, scaling);
    let table = DraftTable::from_samples(pairs).with_context(|| format!("Bad draft table {path}"))?;
    log::info!("draft table {path}: {} samples", table.len());
    Ok(table)
}

/// Parse `day h0 … h23` lines. Days must run 1, 2, 3, …; a line
/// breaking the sequence or short of 24 values is skipped.
pub fn parse_daily_tides(text: &str) -> Vec<f64> {
    let mut hourly = Vec::new();
    let mut prev_day = 0u32;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let day = fields.next().and_then(|d| d.parse::<u32>().ok());
        if day != Some(prev_day + 1) {
            log::warn!("Unable to parse \"{line}\": expected day {}", prev_day + 1);
            continue;
        }
        let hours: Vec<f64> = fields.map_while(|h| h.parse().ok()).collect();
        if hours.len() < 24 {
            log::warn!("Unable to parse \"{line}\": a day needs 24 hourly depths");
            continue;
        }
        hourly.extend_from_slice(&hours[..24]);
        prev_day += 1;
    }
    hourly
}

/// Consecutive samples `step` minutes apart, each raised by `bonus`
/// (chart datum correction).
pub fn tide_table_from_samples(samples: &[f64], step: u64, bonus: f64) -> Result<TideTable> {
    let table = TideTable::from_samples(
        samples
            .iter()
            .enumerate()
            .map(|(i, depth)| (i as u64 * step, depth + bonus)),
    )?;
    Ok(table)
}

pub fn load_tide_table(path: &str, bonus: f64) -> Result<TideTable> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let hourly = parse_daily_tides(&text);
    if hourly.is_empty() {
        anyhow::bail!("No tide data in {path}");
    }
    let table = tide_table_from_samples(&hourly, 60, bonus)?;
    log::info!("tide table {path}: {} days, period {} min", hourly.len() / 24, table.period()?);
    Ok(table)
}
