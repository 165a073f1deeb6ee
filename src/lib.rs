//! # iftar
//!
//! Ramadan Sehri/Iftar timing engine: fetches prayer times from the
//! Al-Adhan API for a location, caches a few days of results, decides
//! which day is currently relevant (today until its Iftar passes, then
//! tomorrow), and arms local notifications ahead of each time.
//!
//! The UI layer (rendering, dialogs, install banners) is out of scope;
//! this crate exposes the business logic behind it through explicit
//! ports: a key-value store, a geolocation provider, and a notification
//! sink.

pub mod app;
pub mod cache;
pub mod calendar;
pub mod error;
pub mod location;
pub mod network;
pub mod schedule;
pub mod selector;
pub mod store;
pub mod types;

pub use app::{App, DisplaySnapshot, ShutdownHandle, FETCH_WINDOW_DAYS, POLL_INTERVAL};
pub use cache::DayCache;
pub use calendar::adjust_hijri_date;
pub use error::IftarError;
pub use location::{parse_manual_coordinates, FixedLocationProvider, GeoOptions, GeolocationProvider, PermissionState};
pub use network::{AladhanClient, ALADHAN_BASE_URL};
pub use schedule::{
    notification_request, NotificationHandle, NotificationRequest, NotificationScheduler,
    NotificationSink,
};
pub use selector::{countdown_target, ActiveSelector, CountdownTarget, Selection};
pub use store::{KeyValueStore, MemoryStore, Preferences};
pub use types::{
    CalculationMethod, Coordinates, DayRecord, Language, NotificationKind, NotificationPrefs,
    SelectionState,
};

pub mod prelude {
    pub use crate::app::{App, DisplaySnapshot};
    pub use crate::cache::DayCache;
    pub use crate::error::IftarError;
    pub use crate::selector::{ActiveSelector, CountdownTarget};
    pub use crate::types::*;
}
