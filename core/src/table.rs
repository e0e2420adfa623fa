//! Interpolated lookup tables.
//!
//! An `InterpolatedTable` is an ordered set of (key, value) samples.
//! `get` returns the exact sample on a key hit and the straight line
//! between the neighbouring samples otherwise. There is no extrapolation:
//! keys outside the sampled range fail.
//!
//! Two tables drive the simulation:
//!   - `DraftTable`: hull draft (m) as a function of loaded cargo (t).
//!   - `TideTable`:  channel depth (m) as a function of minute within one
//!                   tidal period. The last key is the period.

use crate::{
    error::{SimError, SimResult},
    types::Timestamp,
};

/// A key type usable in an interpolated table.
pub trait TableKey: Copy + PartialOrd + std::fmt::Debug {
    fn as_f64(self) -> f64;
}

impl TableKey for u64 {
    fn as_f64(self) -> f64 { self as f64 }
}

impl TableKey for f64 {
    fn as_f64(self) -> f64 { self }
}

#[derive(Debug, Clone, Default)]
pub struct InterpolatedTable<K: TableKey> {
    /// Sorted by key, keys unique.
    samples: Vec<(K, f64)>,
}

/// Draft (m) by cargo aboard (t).
pub type DraftTable = InterpolatedTable<f64>;

impl<K: TableKey> InterpolatedTable<K> {
    pub fn new() -> Self {
        Self { samples: Vec::new() }
    }

    /// Build a table from samples in any order.
    pub fn from_samples(samples: impl IntoIterator<Item = (K, f64)>) -> SimResult<Self> {
        let mut table = Self::new();
        for (key, value) in samples {
            table.add(key, value)?;
        }
        Ok(table)
    }

    /// Insert a sample. Keys must be unique and comparable.
    pub fn add(&mut self, key: K, value: f64) -> SimResult<()> {
        if key.partial_cmp(&key).is_none() {
            return Err(SimError::KeyOutOfRange {
                key: key.as_f64(),
                min: f64::NAN,
                max: f64::NAN,
            });
        }
        let pos = self.samples.partition_point(|(k, _)| *k < key);
        if self.samples.get(pos).is_some_and(|(k, _)| *k == key) {
            return Err(SimError::DuplicateKey { key: key.as_f64() });
        }
        self.samples.insert(pos, (key, value));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_key(&self) -> Option<K> {
        self.samples.first().map(|(k, _)| *k)
    }

    pub fn last_key(&self) -> Option<K> {
        self.samples.last().map(|(k, _)| *k)
    }

    /// Look up `key`, interpolating linearly between neighbours.
    pub fn get(&self, key: K) -> SimResult<f64> {
        let (Some(first), Some(last)) = (self.samples.first(), self.samples.last()) else {
            return Err(SimError::EmptyTable);
        };

        // Index of the first sample strictly above `key`.
        let upper = self.samples.partition_point(|(k, _)| *k <= key);
        if upper > 0 && self.samples[upper - 1].0 == key {
            return Ok(self.samples[upper - 1].1);
        }
        if upper == 0 || upper == self.samples.len() {
            return Err(SimError::KeyOutOfRange {
                key: key.as_f64(),
                min: first.0.as_f64(),
                max: last.0.as_f64(),
            });
        }

        let (lo_key, lo_val) = self.samples[upper - 1];
        let (hi_key, hi_val) = self.samples[upper];
        let slope = (hi_val - lo_val) / (hi_key.as_f64() - lo_key.as_f64());
        Ok(lo_val + slope * (key.as_f64() - lo_key.as_f64()))
    }
}

/// Channel depth over one tidal period, repeated indefinitely.
#[derive(Debug, Clone, Default)]
pub struct TideTable {
    table: InterpolatedTable<Timestamp>,
}

impl TideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = (Timestamp, f64)>) -> SimResult<Self> {
        Ok(Self { table: InterpolatedTable::from_samples(samples)? })
    }

    pub fn add(&mut self, minute: Timestamp, depth: f64) -> SimResult<()> {
        self.table.add(minute, depth)
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Length of one tidal period: the last sampled minute.
    pub fn period(&self) -> SimResult<Timestamp> {
        match self.table.last_key() {
            Some(p) if p > 0 => Ok(p),
            _ => Err(SimError::EmptyTable),
        }
    }

    /// Depth available at absolute simulated time `time`.
    pub fn depth_at(&self, time: Timestamp) -> SimResult<f64> {
        let period = self.period()?;
        self.table.get(time % period)
    }

    /// Minutes to wait from `time` until the depth reaches `min_depth`.
    ///
    /// Scans minute by minute: the tide curve is not monotonic within a
    /// period, so no bisection. Fails when no minute of a full period has
    /// enough water.
    pub fn time_to_depth(&self, time: Timestamp, min_depth: f64) -> SimResult<Timestamp> {
        let period = self.period()?;
        let mut wait = 0;
        while wait < period {
            if self.depth_at(time + wait)? >= min_depth {
                return Ok(wait);
            }
            wait += 1;
        }
        Err(SimError::NoTideWindow { draft: min_depth, period })
    }
}
