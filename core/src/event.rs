//! Vessel event history: the run's only output besides the cargo total.
//!
//! RULE: a history is append-only and chronologically ordered.
//! Recording earlier than the last record is an engine defect.
//! Recording at the same minute as the last record replaces it, so
//! zero-length phases collapse into the phase that follows.

use crate::{
    clock::format_time,
    error::{SimError, SimResult},
    types::Timestamp,
    vessel::VesselState,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at:      Timestamp,
    pub state:   VesselState,
    pub comment: String,
}

impl HistoryEntry {
    /// `"<STATE LABEL>\t<comment>"`: the string statistics grep over.
    pub fn label(&self) -> String {
        format!("{}\t{}", self.state.label(), self.comment)
    }
}

#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. `owner` names the vessel for error reporting.
    pub fn record(
        &mut self,
        owner: &str,
        at: Timestamp,
        state: VesselState,
        comment: impl Into<String>,
    ) -> SimResult<()> {
        let entry = HistoryEntry { at, state, comment: comment.into() };
        match self.entries.last_mut() {
            Some(last) if at < last.at => Err(SimError::HistoryOutOfOrder {
                vessel: owner.to_string(),
                last: last.at,
                at,
            }),
            Some(last) if at == last.at => {
                *last = entry;
                Ok(())
            }
            _ => {
                self.entries.push(entry);
                Ok(())
            }
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Sum of the durations of records whose label contains `needle`.
    /// A record lasts until the next one; the final record counts as zero.
    pub fn time_matching(&self, needle: &str) -> Timestamp {
        self.entries
            .windows(2)
            .filter(|w| w[0].label().contains(needle))
            .map(|w| w[1].at - w[0].at)
            .sum()
    }

    /// Sum of the durations of records whose comment is exactly `comment`.
    pub fn time_with_comment(&self, comment: &str) -> Timestamp {
        self.entries
            .windows(2)
            .filter(|w| w[0].comment == comment)
            .map(|w| w[1].at - w[0].at)
            .sum()
    }

    /// Sum of the durations of records in exactly `state`.
    pub fn time_in_state(&self, state: VesselState) -> Timestamp {
        self.entries
            .windows(2)
            .filter(|w| w[0].state == state)
            .map(|w| w[1].at - w[0].at)
            .sum()
    }

    /// Plain-text log block for one vessel.
    pub fn render(&self, owner: &str) -> String {
        let mut out = format!("\nLog of \"{owner}\":\n");
        for entry in &self.entries {
            let _ = writeln!(out, "{}\t{}", format_time(entry.at), entry.label());
        }
        out
    }
}

/// One flattened history record, as exported for external log writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub vessel:  String,
    pub at:      Timestamp,
    pub state:   VesselState,
    pub comment: String,
}
