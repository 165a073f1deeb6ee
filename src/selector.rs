//! Active-period selection: decides whether today's or tomorrow's record
//! is the currently relevant one, and signals backfill fetches for
//! missing days.

use crate::cache::DayCache;
use crate::types::SelectionState;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;

/// Result of one selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub state: SelectionState,
    /// A date the caller should fetch to fill a gap, signalled at most
    /// once while that fetch is outstanding. `None` when nothing is
    /// missing or a fetch for the date is already in flight.
    pub backfill: Option<NaiveDate>,
}

/// Stateful selector. The only state it carries is the set of in-flight
/// backfill dates, which keeps repeated selection passes idempotent:
/// identical inputs yield identical `SelectionState` and never a
/// duplicate backfill request.
#[derive(Debug, Default)]
pub struct ActiveSelector {
    in_flight: HashSet<NaiveDate>,
}

impl ActiveSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the currently relevant day record.
    ///
    /// 1. Today's record, if cached and `now` is before its Iftar.
    /// 2. Otherwise tomorrow's record, if cached.
    /// 3. Otherwise the latest cached record as a stale fallback, with a
    ///    backfill request for tomorrow (unless one is already pending).
    /// 4. Empty cache: no active record, no side effects.
    pub fn select(&mut self, cache: &DayCache, now: NaiveDateTime) -> Selection {
        if cache.is_empty() {
            return Selection {
                state: SelectionState::default(),
                backfill: None,
            };
        }

        let today = now.date();
        if let Some(record) = cache.get(today) {
            if now < record.iftar_time {
                return Selection {
                    state: SelectionState {
                        is_next_day: false,
                        active: Some(record.clone()),
                    },
                    backfill: None,
                };
            }
        }

        let Some(tomorrow) = today.succ_opt() else {
            // Calendar overflow; nothing sensible to roll over to.
            return Selection {
                state: SelectionState {
                    is_next_day: true,
                    active: cache.latest().cloned(),
                },
                backfill: None,
            };
        };

        if let Some(record) = cache.get(tomorrow) {
            return Selection {
                state: SelectionState {
                    is_next_day: true,
                    active: Some(record.clone()),
                },
                backfill: None,
            };
        }

        // Stale fallback until the backfill lands.
        let backfill = if self.in_flight.insert(tomorrow) {
            tracing::debug!(date = %tomorrow, "requesting backfill fetch");
            Some(tomorrow)
        } else {
            None
        };

        Selection {
            state: SelectionState {
                is_next_day: true,
                active: cache.latest().cloned(),
            },
            backfill,
        }
    }

    /// Marks a backfill fetch as finished successfully. The date is now
    /// expected to be in the cache.
    pub fn complete_backfill(&mut self, date: NaiveDate) {
        self.in_flight.remove(&date);
    }

    /// Marks a backfill fetch as failed so a later selection pass may
    /// request it again.
    pub fn abandon_backfill(&mut self, date: NaiveDate) {
        self.in_flight.remove(&date);
    }
}

/// Which of the selected day's two times the countdown should point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTarget {
    Sehri,
    Iftar,
}

/// UI-facing tie-break for the displayed countdown target.
///
/// Both still in the future: whichever is chronologically sooner.
/// Sehri passed but Iftar not: Iftar. Both passed: Sehri (the caller has
/// already rolled the selection to the next day, whose Sehri lies ahead).
pub fn countdown_target(
    sehri_time: NaiveDateTime,
    iftar_time: NaiveDateTime,
    now: NaiveDateTime,
) -> CountdownTarget {
    match (now < sehri_time, now < iftar_time) {
        (true, true) => {
            if sehri_time <= iftar_time {
                CountdownTarget::Sehri
            } else {
                CountdownTarget::Iftar
            }
        }
        (false, true) => CountdownTarget::Iftar,
        _ => CountdownTarget::Sehri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DayRecord;
    use chrono::NaiveDate;

    fn record(date: NaiveDate) -> DayRecord {
        DayRecord {
            date,
            sehri_time: date.and_hms_opt(5, 10, 0).unwrap(),
            iftar_time: date.and_hms_opt(18, 30, 0).unwrap(),
            method_name: "University of Islamic Sciences, Karachi".to_string(),
            method_id: 1,
            gregorian_date: date.format("%A, %-d %B %Y").to_string(),
            hijri_date: "1 Ramadan, 1445 AH".to_string(),
            hijri_date_ar: "1 رمضان, 1445".to_string(),
            timestamp: 1_710_000_000,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn test_today_before_iftar() {
        let mut cache = DayCache::new();
        cache.upsert_one(record(date(11)));
        cache.upsert_one(record(date(12)));

        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(12, 0, 0).unwrap();
        let selection = selector.select(&cache, now);

        assert!(!selection.state.is_next_day);
        assert_eq!(selection.state.active.unwrap().date, date(11));
        assert!(selection.backfill.is_none());
    }

    #[test]
    fn test_after_iftar_rolls_to_tomorrow() {
        let mut cache = DayCache::new();
        cache.upsert_one(record(date(11)));
        cache.upsert_one(record(date(12)));

        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(19, 0, 0).unwrap();
        let selection = selector.select(&cache, now);

        assert!(selection.state.is_next_day);
        assert_eq!(selection.state.active.unwrap().date, date(12));
        assert!(selection.backfill.is_none());
    }

    #[test]
    fn test_stale_fallback_requests_backfill_once() {
        let mut cache = DayCache::new();
        cache.upsert_one(record(date(10)));
        cache.upsert_one(record(date(11)));

        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(19, 0, 0).unwrap();

        let first = selector.select(&cache, now);
        assert!(first.state.is_next_day);
        assert_eq!(first.state.active.as_ref().unwrap().date, date(11));
        assert_eq!(first.backfill, Some(date(12)));

        // Idempotent: second pass with unchanged inputs yields the same
        // state and no duplicate backfill request.
        let second = selector.select(&cache, now);
        assert_eq!(second.state, first.state);
        assert!(second.backfill.is_none());
    }

    #[test]
    fn test_backfill_completion_consumes_in_flight() {
        let mut cache = DayCache::new();
        cache.upsert_one(record(date(11)));

        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(19, 0, 0).unwrap();
        assert_eq!(selector.select(&cache, now).backfill, Some(date(12)));

        cache.upsert_one(record(date(12)));
        selector.complete_backfill(date(12));

        let selection = selector.select(&cache, now);
        assert_eq!(selection.state.active.unwrap().date, date(12));
        assert!(selection.backfill.is_none());
    }

    #[test]
    fn test_abandoned_backfill_can_retry() {
        let mut cache = DayCache::new();
        cache.upsert_one(record(date(11)));

        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(19, 0, 0).unwrap();
        assert_eq!(selector.select(&cache, now).backfill, Some(date(12)));

        selector.abandon_backfill(date(12));
        assert_eq!(selector.select(&cache, now).backfill, Some(date(12)));
    }

    #[test]
    fn test_empty_cache_selects_nothing() {
        let cache = DayCache::new();
        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(12, 0, 0).unwrap();

        let selection = selector.select(&cache, now);
        assert!(selection.state.active.is_none());
        assert!(selection.backfill.is_none());
    }

    #[test]
    fn test_missing_today_with_cached_tomorrow() {
        let mut cache = DayCache::new();
        cache.upsert_one(record(date(12)));

        let mut selector = ActiveSelector::new();
        let now = date(11).and_hms_opt(12, 0, 0).unwrap();
        let selection = selector.select(&cache, now);

        assert!(selection.state.is_next_day);
        assert_eq!(selection.state.active.unwrap().date, date(12));
    }

    #[test]
    fn test_countdown_target_tie_break() {
        let d = date(11);
        let sehri = d.and_hms_opt(5, 10, 0).unwrap();
        let iftar = d.and_hms_opt(18, 30, 0).unwrap();

        // Both future: sooner wins.
        let before_dawn = d.and_hms_opt(3, 0, 0).unwrap();
        assert_eq!(countdown_target(sehri, iftar, before_dawn), CountdownTarget::Sehri);

        // Sehri passed, Iftar ahead.
        let midday = d.and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(countdown_target(sehri, iftar, midday), CountdownTarget::Iftar);

        // Both passed: next day's Sehri.
        let night = d.and_hms_opt(22, 0, 0).unwrap();
        assert_eq!(countdown_target(sehri, iftar, night), CountdownTarget::Sehri);

        // Tomorrow's record viewed tonight: both in the future, Sehri sooner.
        let tomorrow = date(12);
        let t_sehri = tomorrow.and_hms_opt(5, 9, 0).unwrap();
        let t_iftar = tomorrow.and_hms_opt(18, 31, 0).unwrap();
        assert_eq!(countdown_target(t_sehri, t_iftar, night), CountdownTarget::Sehri);
    }
}
