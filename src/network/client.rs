//! Al-Adhan timings API client.
//!
//! One request per day: the response carries the full set of prayer
//! timings plus Gregorian/Hijri calendar metadata; only the fasting
//! boundaries (Imsak, Maghrib) and the display strings are kept.

use crate::error::IftarError;
use crate::types::{CalculationMethod, Coordinates, DayRecord};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// Production endpoint.
pub const ALADHAN_BASE_URL: &str = "https://api.aladhan.com";

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

/// HTTP client for the Al-Adhan timings API.
///
/// Fetch operations never touch the cache; inserting results is the
/// caller's responsibility.
#[derive(Debug, Clone)]
pub struct AladhanClient {
    http: reqwest::Client,
    base_url: String,
}

impl AladhanClient {
    pub fn new() -> Result<Self, IftarError> {
        Self::with_base_url(ALADHAN_BASE_URL)
    }

    /// Client against a non-default endpoint (tests point this at a mock
    /// server).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, IftarError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IftarError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetches one day's Sehri/Iftar times.
    ///
    /// Sehri is the "Imsak" timing, Iftar the "Maghrib" timing; both are
    /// `HH:MM` wall-clock strings anchored to `date` as-is, with no
    /// timezone conversion arithmetic.
    ///
    /// # Errors
    /// `Network` on transport failure or non-2xx status, `Parse` when the
    /// response cannot be mapped to the expected shape.
    pub async fn fetch_day(
        &self,
        coords: Coordinates,
        date: NaiveDate,
        method: CalculationMethod,
    ) -> Result<DayRecord, IftarError> {
        // school=1 (Shafi), adjustment=1 for higher latitudes, matching
        // the upstream defaults this engine was tuned against.
        let url = format!(
            "{}/v1/timings/{}?latitude={}&longitude={}&method={}&school=1&adjustment=1",
            self.base_url,
            format_date_for_api(date),
            coords.latitude,
            coords.longitude,
            method.id(),
        );
        tracing::debug!(%url, %date, "fetching prayer times");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| IftarError::Network(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IftarError::Network(format!(
                "upstream returned status {status}"
            )));
        }

        let body: TimingsResponse = response
            .json()
            .await
            .map_err(|e| IftarError::parse(format!("unexpected response shape: {e}")))?;

        day_record_from_response(date, body)
    }

    /// Fetches `[start_date, start_date + num_days)`, one request per day,
    /// sequentially (implicitly respecting upstream rate limits), results
    /// in date order.
    ///
    /// Deliberate simplification: any single day failing fails the whole
    /// range with no partial result; callers keep their previously cached
    /// data for dates outside the attempted window.
    pub async fn fetch_range(
        &self,
        coords: Coordinates,
        start_date: NaiveDate,
        num_days: i64,
        method: CalculationMethod,
    ) -> Result<Vec<DayRecord>, IftarError> {
        let mut records = Vec::with_capacity(num_days.max(0) as usize);
        for offset in 0..num_days {
            let date = start_date + Duration::days(offset);
            records.push(self.fetch_day(coords, date, method).await?);
        }
        Ok(records)
    }
}

/// Formats a date as the API's `DD-MM-YYYY` path segment.
pub fn format_date_for_api(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Anchors an `HH:MM` wall-clock string to a calendar date.
///
/// The string is interpreted as already being in the target timezone;
/// a trailing annotation such as `"05:17 (EET)"` is ignored. Seconds are
/// zeroed.
pub fn convert_time_string(value: &str, date: NaiveDate) -> Result<NaiveDateTime, IftarError> {
    let clock = value
        .split_whitespace()
        .next()
        .ok_or_else(|| IftarError::parse("empty time string"))?;

    let (hours_str, minutes_str) = clock
        .split_once(':')
        .ok_or_else(|| IftarError::parse(format!("expected HH:MM, got: {value}")))?;
    let hours: u32 = hours_str
        .parse()
        .map_err(|_| IftarError::parse(format!("unparsable hour in: {value}")))?;
    let minutes: u32 = minutes_str
        .parse()
        .map_err(|_| IftarError::parse(format!("unparsable minute in: {value}")))?;

    date.and_hms_opt(hours, minutes, 0)
        .ok_or_else(|| IftarError::parse(format!("time out of range: {value}")))
}

// Response mapping: only the fields this engine consumes.

#[derive(Debug, Deserialize)]
struct TimingsResponse {
    data: TimingsData,
}

#[derive(Debug, Deserialize)]
struct TimingsData {
    timings: Timings,
    date: ApiDate,
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct Timings {
    #[serde(rename = "Imsak")]
    imsak: String,
    #[serde(rename = "Maghrib")]
    maghrib: String,
}

#[derive(Debug, Deserialize)]
struct ApiDate {
    timestamp: String,
    gregorian: GregorianDate,
    hijri: HijriDate,
}

#[derive(Debug, Deserialize)]
struct GregorianDate {
    day: String,
    year: String,
    weekday: NamedEn,
    month: NamedEn,
}

#[derive(Debug, Deserialize)]
struct NamedEn {
    en: String,
}

#[derive(Debug, Deserialize)]
struct HijriDate {
    day: String,
    year: String,
    month: HijriMonth,
}

#[derive(Debug, Deserialize)]
struct HijriMonth {
    en: String,
    ar: String,
}

#[derive(Debug, Deserialize)]
struct Meta {
    method: MethodMeta,
}

#[derive(Debug, Deserialize)]
struct MethodMeta {
    id: u8,
    name: String,
}

fn day_record_from_response(
    date: NaiveDate,
    body: TimingsResponse,
) -> Result<DayRecord, IftarError> {
    let data = body.data;

    let sehri_time = convert_time_string(&data.timings.imsak, date)?;
    let iftar_time = convert_time_string(&data.timings.maghrib, date)?;

    let timestamp: i64 = data
        .date
        .timestamp
        .parse()
        .map_err(|_| IftarError::parse(format!("unparsable timestamp: {}", data.date.timestamp)))?;

    let g = &data.date.gregorian;
    let gregorian_date = format!("{}, {} {} {}", g.weekday.en, g.day, g.month.en, g.year);

    let h = &data.date.hijri;
    let hijri_date = format!("{} {}, {} AH", h.day, h.month.en, h.year);
    let hijri_date_ar = format!("{} {}, {}", h.day, h.month.ar, h.year);

    Ok(DayRecord {
        date,
        sehri_time,
        iftar_time,
        method_name: data.meta.method.name,
        method_id: data.meta.method.id,
        gregorian_date,
        hijri_date,
        hijri_date_ar,
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn timings_json(imsak: &str, maghrib: &str) -> serde_json::Value {
        serde_json::json!({
            "code": 200,
            "status": "OK",
            "data": {
                "timings": {
                    "Fajr": "05:27",
                    "Imsak": imsak,
                    "Maghrib": maghrib,
                    "Sunset": maghrib,
                },
                "date": {
                    "readable": "11 Mar 2024",
                    "timestamp": "1710115200",
                    "gregorian": {
                        "date": "11-03-2024",
                        "day": "11",
                        "year": "2024",
                        "weekday": { "en": "Monday" },
                        "month": { "number": 3, "en": "March" },
                    },
                    "hijri": {
                        "date": "01-09-1445",
                        "day": "1",
                        "year": "1445",
                        "weekday": { "en": "Al Athnayn", "ar": "الاثنين" },
                        "month": { "number": 9, "en": "Ramadan", "ar": "رَمَضان" },
                    },
                },
                "meta": {
                    "latitude": 21.4225,
                    "longitude": 39.8262,
                    "method": {
                        "id": 1,
                        "name": "University of Islamic Sciences, Karachi",
                    },
                },
            },
        })
    }

    #[test]
    fn test_format_date_for_api() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date_for_api(date), "05-03-2024");
    }

    #[test]
    fn test_convert_time_string() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let parsed = convert_time_string("05:17", date).unwrap();
        assert_eq!(parsed.date(), date);
        assert_eq!((parsed.hour(), parsed.minute(), parsed.second()), (5, 17, 0));

        // Trailing timezone annotation is ignored.
        let parsed = convert_time_string("18:42 (EET)", date).unwrap();
        assert_eq!((parsed.hour(), parsed.minute()), (18, 42));
    }

    #[test]
    fn test_convert_time_string_rejects_malformed() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert!(matches!(convert_time_string("0517", date), Err(IftarError::Parse(_))));
        assert!(matches!(convert_time_string("25:00", date), Err(IftarError::Parse(_))));
        assert!(matches!(convert_time_string("aa:bb", date), Err(IftarError::Parse(_))));
        assert!(matches!(convert_time_string("", date), Err(IftarError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_day_maps_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/timings/11-03-2024"))
            .and(query_param("latitude", "21.4225"))
            .and(query_param("longitude", "39.8262"))
            .and(query_param("method", "1"))
            .and(query_param("school", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timings_json("05:17", "18:42")))
            .mount(&server)
            .await;

        let client = AladhanClient::with_base_url(server.uri()).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let record = client
            .fetch_day(
                Coordinates::new_unchecked(21.4225, 39.8262),
                date,
                CalculationMethod::Karachi,
            )
            .await
            .unwrap();

        assert_eq!(record.date, date);
        assert_eq!(record.sehri_time, date.and_hms_opt(5, 17, 0).unwrap());
        assert_eq!(record.iftar_time, date.and_hms_opt(18, 42, 0).unwrap());
        assert_eq!(record.method_id, 1);
        assert_eq!(record.method_name, "University of Islamic Sciences, Karachi");
        assert_eq!(record.gregorian_date, "Monday, 11 March 2024");
        assert_eq!(record.hijri_date, "1 Ramadan, 1445 AH");
        assert_eq!(record.hijri_date_ar, "1 رَمَضان, 1445");
        assert_eq!(record.timestamp, 1_710_115_200);
    }

    #[tokio::test]
    async fn test_fetch_day_non_2xx_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AladhanClient::with_base_url(server.uri()).unwrap();
        let result = client
            .fetch_day(
                Coordinates::new_unchecked(0.0, 0.0),
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                CalculationMethod::Karachi,
            )
            .await;

        assert!(matches!(result, Err(IftarError::Network(_))));
    }

    #[tokio::test]
    async fn test_fetch_day_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "code": 200, "data": {} })),
            )
            .mount(&server)
            .await;

        let client = AladhanClient::with_base_url(server.uri()).unwrap();
        let result = client
            .fetch_day(
                Coordinates::new_unchecked(0.0, 0.0),
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                CalculationMethod::Karachi,
            )
            .await;

        assert!(matches!(result, Err(IftarError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_range_sequential_in_date_order() {
        let server = MockServer::start().await;
        for (day, imsak) in [("11", "05:17"), ("12", "05:16")] {
            Mock::given(method("GET"))
                .and(path(format!("/v1/timings/{day}-03-2024")))
                .respond_with(
                    ResponseTemplate::new(200).set_body_json(timings_json(imsak, "18:42")),
                )
                .mount(&server)
                .await;
        }

        let client = AladhanClient::with_base_url(server.uri()).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let records = client
            .fetch_range(
                Coordinates::new_unchecked(21.4225, 39.8262),
                start,
                2,
                CalculationMethod::Karachi,
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, start);
        assert_eq!(records[1].date, start.succ_opt().unwrap());
        assert_eq!(records[1].sehri_time.format("%H:%M").to_string(), "05:16");
    }

    #[tokio::test]
    async fn test_fetch_range_fails_whole_on_single_day_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/timings/11-03-2024"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timings_json("05:17", "18:42")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/timings/12-03-2024"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AladhanClient::with_base_url(server.uri()).unwrap();
        let result = client
            .fetch_range(
                Coordinates::new_unchecked(21.4225, 39.8262),
                NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                2,
                CalculationMethod::Karachi,
            )
            .await;

        assert!(matches!(result, Err(IftarError::Network(_))));
    }
}
