//! Application state: one explicit struct owning every collaborator.
//!
//! No ambient singletons; the persistence store, geolocation provider,
//! and notification sink are injected at construction and everything
//! else (client, cache, selector, scheduler) lives inside the struct.

use crate::cache::DayCache;
use crate::calendar::adjust_hijri_date;
use crate::error::IftarError;
use crate::location::{GeoOptions, GeolocationProvider, PermissionState};
use crate::network::AladhanClient;
use crate::schedule::{notification_request, NotificationHandle, NotificationScheduler, NotificationSink};
use crate::selector::{countdown_target, ActiveSelector, CountdownTarget};
use crate::store::{self, KeyValueStore, Preferences};
use crate::types::{
    CalculationMethod, Coordinates, DayRecord, Language, NotificationKind, NotificationPrefs,
};
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tokio::sync::Notify;

/// Days fetched per refresh: yesterday through two days ahead, so the
/// selector always has today and tomorrow on hand.
pub const FETCH_WINDOW_DAYS: i64 = 4;

/// Selection re-evaluation cadence.
pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// What the UI layer renders: the selected day's times plus display strings.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySnapshot {
    pub sehri_time: NaiveDateTime,
    pub iftar_time: NaiveDateTime,
    pub is_next_day: bool,
    pub gregorian_date: String,
    /// Hijri display string, adjustment applied, Arabic variant for
    /// Arabic/Urdu sessions.
    pub hijri_date: String,
    pub method_name: String,
    pub target: CountdownTarget,
}

/// Inputs the armed notifications were derived from; any change forces a
/// cancel-and-rearm pass.
#[derive(Debug, Clone, PartialEq)]
struct ArmedInputs {
    sehri_time: NaiveDateTime,
    iftar_time: NaiveDateTime,
    language: Language,
    prefs: NotificationPrefs,
}

/// Signals the polling loop to stop.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.notify.notify_one();
    }
}

/// The session's application state.
pub struct App<S, G, N>
where
    S: KeyValueStore,
    G: GeolocationProvider,
    N: NotificationSink,
{
    store: S,
    geo: G,
    geo_options: GeoOptions,
    client: AladhanClient,
    cache: DayCache,
    selector: ActiveSelector,
    scheduler: NotificationScheduler<N>,
    prefs: Preferences,
    location: Option<Coordinates>,
    snapshot: Option<DisplaySnapshot>,
    armed_for: Option<ArmedInputs>,
    sehri_handle: NotificationHandle,
    iftar_handle: NotificationHandle,
    shutdown: Arc<Notify>,
}

impl<S, G, N> App<S, G, N>
where
    S: KeyValueStore,
    G: GeolocationProvider,
    N: NotificationSink,
{
    /// Builds the app against the production timings endpoint.
    /// Preferences and the last-known location are loaded immediately.
    pub fn new(store: S, geo: G, sink: Arc<N>) -> Result<Self, IftarError> {
        let client = AladhanClient::new()?;
        Ok(Self::with_client(store, geo, sink, client))
    }

    /// Builds the app with an explicit client (tests point it at a mock
    /// server).
    pub fn with_client(store: S, geo: G, sink: Arc<N>, client: AladhanClient) -> Self {
        let prefs = Preferences::load(&store);
        let location = store::load_stored_location(&store);
        Self {
            store,
            geo,
            geo_options: GeoOptions::default(),
            client,
            cache: DayCache::new(),
            selector: ActiveSelector::new(),
            scheduler: NotificationScheduler::new(sink),
            prefs,
            location,
            snapshot: None,
            armed_for: None,
            sehri_handle: NotificationHandle::INVALID,
            iftar_handle: NotificationHandle::INVALID,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Obtains coordinates, reusing the persisted location from a prior
    /// grant when possible.
    ///
    /// # Errors
    /// `PermissionDenied` when the platform reports a denied permission or
    /// the user refuses the prompt; the attempt is terminal but the user
    /// may retry later. Provider `Timeout`/`Unavailable` errors pass
    /// through.
    pub async fn acquire_location(&mut self) -> Result<Coordinates, IftarError> {
        if self.geo.permission_state() == PermissionState::Denied {
            store::store_permission_granted(&mut self.store, false);
            return Err(IftarError::PermissionDenied(
                "location permission was previously denied".to_string(),
            ));
        }

        if store::stored_permission_granted(&self.store) {
            if let Some(coords) = store::load_stored_location(&self.store) {
                tracing::debug!(%coords, "using stored location");
                self.location = Some(coords);
                return Ok(coords);
            }
        }

        match self.geo.current_position(&self.geo_options).await {
            Ok(coords) => {
                store::store_permission_granted(&mut self.store, true);
                store::store_location(&mut self.store, coords)?;
                self.location = Some(coords);
                Ok(coords)
            }
            Err(err) => {
                store::store_permission_granted(&mut self.store, false);
                Err(err)
            }
        }
    }

    /// Applies a manually entered location, bypassing the provider.
    pub fn set_manual_location(&mut self, input: &str) -> Result<Coordinates, IftarError> {
        let coords = crate::location::parse_manual_coordinates(input)?;
        store::store_location(&mut self.store, coords)?;
        store::store_permission_granted(&mut self.store, true);
        self.location = Some(coords);
        Ok(coords)
    }

    /// Fetches the sliding window `[yesterday, yesterday + 4)` and runs a
    /// selection pass.
    ///
    /// # Errors
    /// Fetch errors propagate untouched; the cache keeps whatever it held
    /// for dates outside the attempted window.
    pub async fn refresh(&mut self, now: NaiveDateTime) -> Result<(), IftarError> {
        let coords = self
            .location
            .ok_or_else(|| IftarError::Unavailable("no location acquired".to_string()))?;

        let start = now.date().pred_opt().unwrap_or_else(|| now.date());
        let records = self
            .client
            .fetch_range(coords, start, FETCH_WINDOW_DAYS, self.prefs.calculation_method)
            .await?;
        self.cache.upsert_range(records, start, FETCH_WINDOW_DAYS);

        self.tick(now).await;
        Ok(())
    }

    /// One selection pass: picks the active day, performs at most one
    /// backfill fetch when tomorrow is missing, republishes the display
    /// snapshot, and rearms notifications when their inputs changed.
    ///
    /// Backfill failures are logged, not surfaced; the stale fallback
    /// remains on display and a later pass may retry.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Option<DisplaySnapshot> {
        let mut selection = self.selector.select(&self.cache, now);

        if let Some(date) = selection.backfill.take() {
            match self.location {
                Some(coords) => {
                    match self
                        .client
                        .fetch_day(coords, date, self.prefs.calculation_method)
                        .await
                    {
                        Ok(record) => {
                            self.cache.upsert_one(record);
                            self.selector.complete_backfill(date);
                            selection = self.selector.select(&self.cache, now);
                        }
                        Err(err) => {
                            tracing::warn!(%date, %err, "backfill fetch failed");
                            self.selector.abandon_backfill(date);
                        }
                    }
                }
                None => self.selector.abandon_backfill(date),
            }
        }

        let is_next_day = selection.state.is_next_day;
        let snapshot = selection
            .state
            .active
            .map(|record| self.publish(&record, is_next_day, now));
        self.snapshot = snapshot.clone();
        snapshot
    }

    fn publish(&mut self, record: &DayRecord, is_next_day: bool, now: NaiveDateTime) -> DisplaySnapshot {
        let raw_hijri = if self.prefs.language.prefers_arabic_hijri() {
            &record.hijri_date_ar
        } else {
            &record.hijri_date
        };
        let snapshot = DisplaySnapshot {
            sehri_time: record.sehri_time,
            iftar_time: record.iftar_time,
            is_next_day,
            gregorian_date: record.gregorian_date.clone(),
            hijri_date: adjust_hijri_date(raw_hijri, self.prefs.hijri_adjustment),
            method_name: record.method_name.clone(),
            target: countdown_target(record.sehri_time, record.iftar_time, now),
        };

        let inputs = ArmedInputs {
            sehri_time: record.sehri_time,
            iftar_time: record.iftar_time,
            language: self.prefs.language,
            prefs: self.prefs.notifications,
        };
        if self.armed_for.as_ref() != Some(&inputs) {
            self.rearm_notifications(now, record);
            self.armed_for = Some(inputs);
        }

        snapshot
    }

    /// Cancels both kinds, then arms whichever are enabled. Invariant:
    /// at most one live scheduled notification per kind.
    fn rearm_notifications(&mut self, now: NaiveDateTime, record: &DayRecord) {
        let prefs = self.prefs.notifications;
        let language = self.prefs.language;

        self.scheduler.cancel_kind(NotificationKind::Sehri);
        self.sehri_handle = NotificationHandle::INVALID;
        if prefs.sehri_enabled {
            let request =
                notification_request(NotificationKind::Sehri, prefs.sehri_lead_minutes, language);
            self.sehri_handle = self.scheduler.schedule(
                now,
                record.sehri_time,
                prefs.sehri_lead_minutes,
                NotificationKind::Sehri,
                request,
            );
        }

        self.scheduler.cancel_kind(NotificationKind::Iftar);
        self.iftar_handle = NotificationHandle::INVALID;
        if prefs.iftar_enabled {
            let request =
                notification_request(NotificationKind::Iftar, prefs.iftar_lead_minutes, language);
            self.iftar_handle = self.scheduler.schedule(
                now,
                record.iftar_time,
                prefs.iftar_lead_minutes,
                NotificationKind::Iftar,
                request,
            );
        }
    }

    /// Switches the calculation method and refetches: cached records were
    /// produced by the old method, so the fresh window supersedes them.
    pub async fn set_calculation_method(
        &mut self,
        method: CalculationMethod,
        now: NaiveDateTime,
    ) -> Result<(), IftarError> {
        if self.prefs.calculation_method == method {
            return Ok(());
        }
        self.prefs.calculation_method = method;
        self.prefs.save(&mut self.store)?;
        self.refresh(now).await
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), IftarError> {
        self.prefs.language = language;
        self.prefs.save(&mut self.store)
    }

    pub fn set_hijri_adjustment(&mut self, adjustment: i32) -> Result<(), IftarError> {
        self.prefs.hijri_adjustment = adjustment;
        self.prefs.save(&mut self.store)
    }

    pub fn set_notification_prefs(&mut self, prefs: NotificationPrefs) -> Result<(), IftarError> {
        self.prefs.notifications = prefs;
        self.prefs.save(&mut self.store)
    }

    /// Runs the 1-minute polling loop until [`ShutdownHandle::shutdown`]
    /// is called, then tears down all outstanding timers.
    pub async fn run(&mut self, poll_interval: std::time::Duration) {
        let shutdown = Arc::clone(&self.shutdown);
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Local::now().naive_local();
                    self.tick(now).await;
                }
                _ = shutdown.notified() => break,
            }
        }

        self.scheduler.shutdown();
        tracing::debug!("polling loop stopped");
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            notify: Arc::clone(&self.shutdown),
        }
    }

    pub fn snapshot(&self) -> Option<&DisplaySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn cache(&self) -> &DayCache {
        &self.cache
    }

    pub fn sehri_handle(&self) -> NotificationHandle {
        self.sehri_handle
    }

    pub fn iftar_handle(&self) -> NotificationHandle {
        self.iftar_handle
    }

    /// Number of currently armed notification timers.
    pub fn armed_notifications(&self) -> usize {
        self.scheduler.armed_count()
    }

    /// Cancels all timers explicitly (equivalent to what `run` does on
    /// shutdown, for callers driving `tick` themselves).
    pub fn teardown(&mut self) {
        self.scheduler.shutdown();
        self.armed_for = None;
        self.sehri_handle = NotificationHandle::INVALID;
        self.iftar_handle = NotificationHandle::INVALID;
    }
}
