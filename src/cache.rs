//! In-memory multi-day cache of fetched prayer times.
//!
//! Session-scoped: created empty at startup, grows via fetch operations,
//! nothing is persisted. At most one record per calendar date.

use crate::types::DayRecord;
use chrono::{Duration, NaiveDate};
use smallvec::SmallVec;

/// Unordered collection of `DayRecord`, keyed by calendar date.
///
/// The typical session holds a handful of days (yesterday through a few
/// days ahead), so the backing store is inline-allocated.
#[derive(Debug, Clone, Default)]
pub struct DayCache {
    records: SmallVec<[DayRecord; 4]>,
}

impl DayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes any existing entry for the record's date, then inserts it.
    /// Last write wins per date, not per fetch order.
    pub fn upsert_one(&mut self, record: DayRecord) {
        self.records.retain(|r| r.date != record.date);
        tracing::debug!(date = %record.date, "cache upsert");
        self.records.push(record);
    }

    /// Replaces the window `[window_start, window_start + window_days)`.
    ///
    /// Every cached entry whose date falls inside the window is evicted
    /// before `records` are inserted, so a range fetch fully supersedes
    /// prior data for that window. If fewer records were returned than the
    /// window covers, coverage silently shrinks rather than erroring.
    /// Entries outside the window are untouched.
    pub fn upsert_range(
        &mut self,
        records: Vec<DayRecord>,
        window_start: NaiveDate,
        window_days: i64,
    ) {
        let window_end = window_start + Duration::days(window_days);
        self.records
            .retain(|r| r.date < window_start || r.date >= window_end);
        tracing::debug!(
            start = %window_start,
            days = window_days,
            inserted = records.len(),
            "cache range upsert"
        );
        self.records.extend(records);
    }

    /// Looks up the record for a calendar date.
    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.records.iter().find(|r| r.date == date)
    }

    /// All records, sorted ascending by date.
    pub fn all(&self) -> Vec<&DayRecord> {
        let mut sorted: Vec<&DayRecord> = self.records.iter().collect();
        sorted.sort_by_key(|r| r.date);
        sorted
    }

    /// The latest-dated record, used as a stale fallback by the selector.
    pub fn latest(&self) -> Option<&DayRecord> {
        self.records.iter().max_by_key(|r| r.date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops every cached record (e.g. when the calculation method changes).
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
