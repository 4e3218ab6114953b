//! Sync window planning and chunking
//!
//! A run covers the days since the last sync point plus any days queued for a
//! retry. Fetched entries are validated, collapsed to one per day, and split
//! into gateway-sized chunks with the most recent days first.

use crate::core::state::SyncState;
use crate::domain::StepDayEntry;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Days one run asks the provider for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncWindow {
    /// First day of the main range
    pub start: NaiveDate,
    /// Last day of the main range (today)
    pub end: NaiveDate,
    /// Queued retry days outside the main range
    pub pending: BTreeSet<NaiveDate>,
    /// Queued days later than today, left behind when the clock moved back
    pub future_pending: BTreeSet<NaiveDate>,
    /// Whether no sync point existed yet
    pub cold_start: bool,
}

impl SyncWindow {
    /// Plan the window for `state` as of `today`
    ///
    /// A cold start covers the `backfill_days` days ending today. Otherwise the
    /// range starts on the day of the last sync point, so a day that was only
    /// partially complete at the last sync is sent again.
    pub fn plan(state: &SyncState, today: NaiveDate, backfill_days: u32) -> Self {
        let (start, cold_start) = match state.last_synced_day() {
            Some(day) => (day.min(today), false),
            None => {
                let back = i64::from(backfill_days.max(1)) - 1;
                (today - Duration::days(back), true)
            }
        };

        let pending = state
            .pending_days
            .iter()
            .copied()
            .filter(|d| *d < start)
            .collect();

        // The main range covers these once the clock catches up with them.
        let future_pending = state
            .pending_days
            .iter()
            .copied()
            .filter(|d| *d > today)
            .collect();

        Self {
            start,
            end: today,
            pending,
            future_pending,
            cold_start,
        }
    }

    /// Inclusive ranges to request, main range first
    ///
    /// Pending days are grouped into contiguous runs so a long backlog costs
    /// one provider call per gap rather than one per day.
    pub fn fetch_ranges(&self) -> Vec<(NaiveDate, NaiveDate)> {
        let mut ranges = vec![(self.start, self.end)];

        let mut run: Option<(NaiveDate, NaiveDate)> = None;
        for day in &self.pending {
            run = match run {
                Some((from, to)) if to.succ_opt() == Some(*day) => Some((from, *day)),
                Some(finished) => {
                    ranges.push(finished);
                    Some((*day, *day))
                }
                None => Some((*day, *day)),
            };
        }
        if let Some(last) = run {
            ranges.push(last);
        }

        ranges
    }

    /// Number of distinct days covered
    pub fn day_count(&self) -> usize {
        let main = (self.end - self.start).num_days() + 1;
        usize::try_from(main.max(0)).unwrap_or(0) + self.pending.len()
    }
}

/// Entries ready to submit, plus what was thrown away
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedEntries {
    /// Valid entries, one per day, oldest first
    pub entries: Vec<StepDayEntry>,
    /// Entries that failed validation
    pub dropped_invalid: usize,
    /// Validation messages for the dropped entries
    pub drop_reasons: Vec<String>,
}

/// Validate fetched entries and collapse duplicates
///
/// Invalid entries are dropped and never counted as synced. When the provider
/// reports the same day more than once, the last report wins.
pub fn prepare_entries(fetched: Vec<StepDayEntry>, today: NaiveDate) -> PreparedEntries {
    let mut by_day: BTreeMap<NaiveDate, StepDayEntry> = BTreeMap::new();
    let mut prepared = PreparedEntries::default();

    for entry in fetched {
        match entry.validate(today) {
            Ok(()) => {
                by_day.insert(entry.date, entry);
            }
            Err(e) => {
                tracing::warn!(date = %entry.date, reason = %e, "Dropping invalid step entry");
                prepared.dropped_invalid += 1;
                prepared.drop_reasons.push(e.to_string());
            }
        }
    }

    prepared.entries = by_day.into_values().collect();
    prepared
}

/// Split entries into chunks of at most `max`, most recent days first
pub fn chunk_entries(mut entries: Vec<StepDayEntry>, max: usize) -> Vec<Vec<StepDayEntry>> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
        .chunks(max.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}
