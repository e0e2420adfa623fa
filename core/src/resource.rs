//! Exclusive resources: the loader and the unloading berths.
//!
//! A resource is an append-only timeline of reservations keyed by start
//! time. RULE: a caller must ask `time_to_slot` (or `time_to_unlock`) and
//! wait that long before calling `lock`. Reservations never overlap and are
//! never removed during a run.

use crate::{
    clock::{format_duration, format_time},
    error::{SimError, SimResult},
    types::{ResourceId, Timestamp},
};
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub duration: Timestamp,
    pub holder:   Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExclusiveResource {
    pub name:     String,
    reservations: BTreeMap<Timestamp, Reservation>,
}

impl ExclusiveResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reservations: BTreeMap::new(),
        }
    }

    /// The reservation covering `time`, as `(start, end)`.
    fn covering(&self, time: Timestamp) -> Option<(Timestamp, Timestamp)> {
        let (&start, res) = self.reservations.range(..=time).next_back()?;
        let end = start + res.duration;
        (time < end).then_some((start, end))
    }

    /// Time left until the reservation covering `time` ends, following
    /// back-to-back reservations. Zero when the resource is free at `time`.
    pub fn time_to_unlock(&self, time: Timestamp) -> Timestamp {
        let mut free_at = time;
        while let Some((_, end)) = self.covering(free_at) {
            free_at = end;
        }
        free_at - time
    }

    /// Smallest wait `w` such that `[time + w, time + w + duration)` overlaps
    /// no reservation.
    pub fn time_to_slot(&self, time: Timestamp, duration: Timestamp) -> Timestamp {
        let mut start = time + self.time_to_unlock(time);
        // Push past every later reservation that would cut into the slot.
        while let Some((&next_start, _)) = self.reservations.range(start + 1..).next() {
            if next_start >= start + duration {
                break;
            }
            start = next_start + self.time_to_unlock(next_start);
        }
        start - time
    }

    /// Record the reservation `[start, start + duration)`.
    /// Fails if it overlaps an existing reservation.
    pub fn lock(
        &mut self,
        start: Timestamp,
        duration: Timestamp,
        holder: Option<&str>,
    ) -> SimResult<()> {
        if duration > 0 && self.time_to_slot(start, duration) != 0 {
            return Err(SimError::ReservationOverlap {
                resource: self.name.clone(),
                start,
                end: start + duration,
            });
        }
        if duration == 0 {
            return Ok(());
        }
        self.reservations.insert(
            start,
            Reservation {
                duration,
                holder: holder.map(str::to_string),
            },
        );
        Ok(())
    }

    /// True when no reservation starts after `time`.
    pub fn is_free_after(&self, time: Timestamp) -> bool {
        self.reservations.range(time + 1..).next().is_none()
    }

    pub fn clear(&mut self) {
        self.reservations.clear();
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Reservations in start order, as `(start, reservation)`.
    pub fn reservations(&self) -> impl Iterator<Item = (Timestamp, &Reservation)> {
        self.reservations.iter().map(|(s, r)| (*s, r))
    }

    /// Total minutes reserved.
    pub fn busy_time(&self) -> Timestamp {
        self.reservations.values().map(|r| r.duration).sum()
    }

    /// Plain-text audit log of every reservation.
    pub fn render(&self) -> String {
        let mut out = format!("\nLog of \"{}\":\n", self.name);
        for (start, res) in &self.reservations {
            let _ = write!(
                out,
                "locked: {}\t - {}\t(used for {})",
                format_time(*start),
                format_time(start + res.duration),
                format_duration(res.duration),
            );
            if let Some(holder) = &res.holder {
                let _ = write!(out, "\t{holder}");
            }
            out.push('\n');
        }
        out
    }
}

/// Arena of exclusive resources owned by the driver.
/// The loader is always `ResourceId(0)`; berths follow.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    resources: Vec<ExclusiveResource>,
}

impl ResourcePool {
    pub const LOADER: ResourceId = ResourceId(0);

    pub fn new(berths: usize) -> Self {
        let mut resources = vec![ExclusiveResource::new("Loader")];
        resources.extend((1..=berths).map(|n| ExclusiveResource::new(format!("Unloader #{n}"))));
        Self { resources }
    }

    pub fn get(&self, id: ResourceId) -> &ExclusiveResource {
        &self.resources[id.0]
    }

    pub fn get_mut(&mut self, id: ResourceId) -> &mut ExclusiveResource {
        &mut self.resources[id.0]
    }

    pub fn loader(&self) -> &ExclusiveResource {
        self.get(Self::LOADER)
    }

    pub fn berth_ids(&self) -> impl Iterator<Item = ResourceId> {
        (1..self.resources.len()).map(ResourceId)
    }

    pub fn berth_count(&self) -> usize {
        self.resources.len() - 1
    }

    /// Zero-based berth ordinal of a berth handle.
    pub fn berth_index(id: ResourceId) -> usize {
        id.0 - 1
    }

    /// The berth that frees up first at `time`; lowest index on ties.
    pub fn earliest_berth(&self, time: Timestamp) -> Option<(ResourceId, Timestamp)> {
        self.berth_ids()
            .map(|id| (id, self.get(id).time_to_unlock(time)))
            .min_by_key(|(id, wait)| (*wait, *id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusiveResource> {
        self.resources.iter()
    }

    pub fn clear(&mut self) {
        self.resources.iter_mut().for_each(ExclusiveResource::clear);
    }
}
