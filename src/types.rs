use crate::error::IftarError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geographic coordinates in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Creates coordinates, validating the decimal-degree ranges.
    ///
    /// # Errors
    /// Returns `InvalidInput` if latitude is outside [-90, 90] or longitude
    /// is outside [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, IftarError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(IftarError::invalid_input(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(IftarError::invalid_input(format!(
                "longitude {longitude} outside [-180, 180]"
            )));
        }
        Ok(Self { latitude, longitude })
    }

    /// Creates coordinates without range validation.
    pub fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}°, {:.4}°", self.latitude, self.longitude)
    }
}

/// Published astronomical conventions for computing prayer times,
/// as enumerated by the Al-Adhan timings API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    /// University of Islamic Sciences, Karachi.
    Karachi,
    /// Islamic Society of North America.
    Isna,
    /// Muslim World League.
    Mwl,
    /// Umm al-Qura, Makkah.
    Makkah,
    /// Egyptian General Authority of Survey.
    Egypt,
    /// Institute of Geophysics, University of Tehran.
    Tehran,
    /// Shia Ithna-Ashari, Leva Research Institute, Qum.
    Shia,
}

impl CalculationMethod {
    /// The upstream API's numeric identifier for this method.
    pub fn id(&self) -> u8 {
        match self {
            CalculationMethod::Karachi => 1,
            CalculationMethod::Isna => 2,
            CalculationMethod::Mwl => 3,
            CalculationMethod::Makkah => 4,
            CalculationMethod::Egypt => 5,
            CalculationMethod::Tehran => 7,
            CalculationMethod::Shia => 0,
        }
    }

    /// Stable lowercase key used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::Karachi => "karachi",
            CalculationMethod::Isna => "isna",
            CalculationMethod::Mwl => "mwl",
            CalculationMethod::Makkah => "makkah",
            CalculationMethod::Egypt => "egypt",
            CalculationMethod::Tehran => "tehran",
            CalculationMethod::Shia => "shia",
        }
    }

    /// Human-readable method name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::Isna => "Islamic Society of North America",
            CalculationMethod::Mwl => "Muslim World League",
            CalculationMethod::Makkah => "Umm al-Qura, Makkah",
            CalculationMethod::Egypt => "Egyptian General Authority of Survey",
            CalculationMethod::Tehran => "Institute of Geophysics, University of Tehran",
            CalculationMethod::Shia => "Shia Ithna-Ashari, Leva Research Institute, Qum",
        }
    }
}

impl Default for CalculationMethod {
    fn default() -> Self {
        Self::Karachi
    }
}

impl FromStr for CalculationMethod {
    type Err = IftarError;

    /// Unknown method names fail fast rather than silently defaulting.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "karachi" => Ok(CalculationMethod::Karachi),
            "isna" => Ok(CalculationMethod::Isna),
            "mwl" => Ok(CalculationMethod::Mwl),
            "makkah" => Ok(CalculationMethod::Makkah),
            "egypt" => Ok(CalculationMethod::Egypt),
            "tehran" => Ok(CalculationMethod::Tehran),
            "shia" => Ok(CalculationMethod::Shia),
            other => Err(IftarError::invalid_input(format!(
                "unknown calculation method: {other}"
            ))),
        }
    }
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Languages the notification text is localized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
    Ur,
    Hi,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
            Language::Ur => "ur",
            Language::Hi => "hi",
        }
    }

    /// Arabic and Urdu render the Arabic variant of the Hijri date string.
    pub fn prefers_arabic_hijri(&self) -> bool {
        matches!(self, Language::Ar | Language::Ur)
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl FromStr for Language {
    type Err = IftarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            "ur" => Ok(Language::Ur),
            "hi" => Ok(Language::Hi),
            other => Err(IftarError::invalid_input(format!("unknown language: {other}"))),
        }
    }
}

/// One calendar day's computed Sehri/Iftar times plus display metadata.
///
/// Records are created by fetch operations and replaced wholesale,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Calendar-date identity key (no time component).
    pub date: NaiveDate,
    /// Start of fasting (source field "Imsak"), anchored to `date`.
    pub sehri_time: NaiveDateTime,
    /// End of fasting at sunset (source field "Maghrib"), anchored to `date`.
    pub iftar_time: NaiveDateTime,
    /// Calculation method name reported by the source API.
    pub method_name: String,
    /// Calculation method id reported by the source API.
    pub method_id: u8,
    /// Display string, e.g. "Monday, 11 March 2024".
    pub gregorian_date: String,
    /// Display string, e.g. "1 Ramadan, 1445 AH".
    pub hijri_date: String,
    /// Arabic variant of the Hijri display string.
    pub hijri_date_ar: String,
    /// Source API's epoch reference for the day.
    pub timestamp: i64,
}

/// Which cached day is currently relevant. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    /// True when the active record is not today's (Iftar already passed,
    /// or today's record is missing).
    pub is_next_day: bool,
    /// The selected record, or `None` when the cache is empty.
    pub active: Option<DayRecord>,
}

/// The two notification kinds, each with a stable coalescing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Sehri,
    Iftar,
}

impl NotificationKind {
    /// Tag used by the sink to replace a prior notification of the same kind
    /// instead of stacking duplicates.
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationKind::Sehri => "sehri-notification",
            NotificationKind::Iftar => "iftar-notification",
        }
    }
}

/// Per-kind notification preferences (persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    pub sehri_enabled: bool,
    pub iftar_enabled: bool,
    pub sehri_lead_minutes: i64,
    pub iftar_lead_minutes: i64,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            sehri_enabled: true,
            iftar_enabled: true,
            sehri_lead_minutes: 15,
            iftar_lead_minutes: 15,
        }
    }
}
