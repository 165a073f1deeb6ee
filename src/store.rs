//! Key-value persistence port and the preferences stored through it.
//!
//! The storage backend is injected so a real deployment can persist to
//! disk (or a browser origin) while tests use [`MemoryStore`]. Values are
//! simple scalars or JSON, read once at startup and written on change.

use crate::error::IftarError;
use crate::types::{CalculationMethod, Coordinates, Language, NotificationPrefs};
use std::collections::HashMap;

/// Minimal key-value persistence port.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store: the default session store and the test fake.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// Stable storage keys.
pub mod keys {
    pub const LANGUAGE: &str = "language";
    pub const CALCULATION_METHOD: &str = "calculation_method";
    pub const HIJRI_ADJUSTMENT: &str = "hijri_adjustment";
    pub const NOTIFICATION_PREFS: &str = "notification_prefs";
    pub const USER_LOCATION: &str = "user_location";
    pub const LOCATION_PERMISSION_GRANTED: &str = "location_permission_granted";
}

/// User preferences, persisted as individual keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preferences {
    pub language: Language,
    pub calculation_method: CalculationMethod,
    pub hijri_adjustment: i32,
    pub notifications: NotificationPrefs,
}

impl Preferences {
    /// Loads preferences, falling back to defaults for missing or corrupt
    /// values (a bad stored value must not brick the session).
    pub fn load(store: &impl KeyValueStore) -> Self {
        let mut prefs = Preferences::default();

        if let Some(raw) = store.get(keys::LANGUAGE) {
            match raw.parse() {
                Ok(language) => prefs.language = language,
                Err(err) => tracing::warn!(%raw, %err, "ignoring stored language"),
            }
        }
        if let Some(raw) = store.get(keys::CALCULATION_METHOD) {
            match raw.parse() {
                Ok(method) => prefs.calculation_method = method,
                Err(err) => tracing::warn!(%raw, %err, "ignoring stored calculation method"),
            }
        }
        if let Some(raw) = store.get(keys::HIJRI_ADJUSTMENT) {
            match raw.parse() {
                Ok(adjustment) => prefs.hijri_adjustment = adjustment,
                Err(_) => tracing::warn!(%raw, "ignoring stored hijri adjustment"),
            }
        }
        if let Some(raw) = store.get(keys::NOTIFICATION_PREFS) {
            match serde_json::from_str(&raw) {
                Ok(notifications) => prefs.notifications = notifications,
                Err(err) => tracing::warn!(%err, "ignoring stored notification prefs"),
            }
        }

        prefs
    }

    /// Writes every preference back to the store.
    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<(), IftarError> {
        store.set(keys::LANGUAGE, self.language.as_str());
        store.set(keys::CALCULATION_METHOD, self.calculation_method.as_str());
        store.set(keys::HIJRI_ADJUSTMENT, &self.hijri_adjustment.to_string());
        let notifications = serde_json::to_string(&self.notifications)
            .map_err(|e| IftarError::parse(format!("notification prefs: {e}")))?;
        store.set(keys::NOTIFICATION_PREFS, &notifications);
        Ok(())
    }
}

/// Reads the persisted last-known location, if any.
pub fn load_stored_location(store: &impl KeyValueStore) -> Option<Coordinates> {
    let raw = store.get(keys::USER_LOCATION)?;
    match serde_json::from_str(&raw) {
        Ok(coords) => Some(coords),
        Err(err) => {
            tracing::warn!(%err, "ignoring stored location");
            None
        }
    }
}

/// Persists the last-known location.
pub fn store_location(
    store: &mut impl KeyValueStore,
    coords: Coordinates,
) -> Result<(), IftarError> {
    let raw = serde_json::to_string(&coords)
        .map_err(|e| IftarError::parse(format!("location: {e}")))?;
    store.set(keys::USER_LOCATION, &raw);
    Ok(())
}

/// Whether a prior session recorded a granted location permission.
pub fn stored_permission_granted(store: &impl KeyValueStore) -> bool {
    store
        .get(keys::LOCATION_PERMISSION_GRANTED)
        .is_some_and(|v| v == "true")
}

/// Records the outcome of the latest permission attempt.
pub fn store_permission_granted(store: &mut impl KeyValueStore, granted: bool) {
    store.set(
        keys::LOCATION_PERMISSION_GRANTED,
        if granted { "true" } else { "false" },
    );
}
