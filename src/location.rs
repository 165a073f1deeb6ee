//! Geolocation port.
//!
//! Position lookup is an async request/response call returning a result,
//! not a callback chain. Implementations wrap whatever positioning source
//! the host platform offers; [`FixedLocationProvider`] covers manual
//! overrides and tests.

use crate::error::IftarError;
use crate::types::Coordinates;
use async_trait::async_trait;
use std::time::Duration;

/// Position query configuration, mirroring the common geolocation options.
#[derive(Debug, Clone, Copy)]
pub struct GeoOptions {
    pub enable_high_accuracy: bool,
    /// How long to wait for a position before giving up.
    pub timeout: Duration,
    /// Accept a cached position up to this old.
    pub maximum_age: Duration,
}

impl Default for GeoOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

/// Permission state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

/// Async position source.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Current permission state, without prompting the user.
    fn permission_state(&self) -> PermissionState;

    /// One-shot position query. May prompt for permission.
    ///
    /// # Errors
    /// `PermissionDenied` when the user refuses, `Timeout` when no
    /// position arrives within `options.timeout`, `Unavailable` when the
    /// platform has no positioning capability.
    async fn current_position(&self, options: &GeoOptions) -> Result<Coordinates, IftarError>;
}

/// Provider that always returns a fixed position. Used for manual
/// location overrides and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    coords: Coordinates,
}

impl FixedLocationProvider {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocationProvider {
    fn permission_state(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn current_position(&self, _options: &GeoOptions) -> Result<Coordinates, IftarError> {
        Ok(self.coords)
    }
}

/// Parses manually entered coordinates of the form `"lat, lon"`.
///
/// # Errors
/// Returns `InvalidInput` when the text is not two comma-separated
/// numbers or the values fall outside valid ranges.
pub fn parse_manual_coordinates(input: &str) -> Result<Coordinates, IftarError> {
    let mut parts = input.split(',');
    let (Some(lat_part), Some(lon_part), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(IftarError::invalid_input(format!(
            "expected \"latitude, longitude\", got: {input}"
        )));
    };

    let latitude: f64 = lat_part
        .trim()
        .parse()
        .map_err(|_| IftarError::invalid_input(format!("unparsable latitude: {lat_part}")))?;
    let longitude: f64 = lon_part
        .trim()
        .parse()
        .map_err(|_| IftarError::invalid_input(format!("unparsable longitude: {lon_part}")))?;

    Coordinates::new(latitude, longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manual_coordinates() {
        let coords = parse_manual_coordinates("21.4225, 39.8262").unwrap();
        assert!((coords.latitude - 21.4225).abs() < 1e-9);
        assert!((coords.longitude - 39.8262).abs() < 1e-9);

        // Whitespace and negative values.
        let coords = parse_manual_coordinates(" -6.2088 ,106.8456").unwrap();
        assert!((coords.latitude + 6.2088).abs() < 1e-9);
    }

    #[test]
    fn test_parse_manual_coordinates_rejects_garbage() {
        assert!(matches!(
            parse_manual_coordinates("mecca"),
            Err(IftarError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_manual_coordinates("1.0"),
            Err(IftarError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_manual_coordinates("1.0, 2.0, 3.0"),
            Err(IftarError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_manual_coordinates("95.0, 10.0"),
            Err(IftarError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_fixed_provider() {
        let provider = FixedLocationProvider::new(Coordinates::new_unchecked(21.4225, 39.8262));
        assert_eq!(provider.permission_state(), PermissionState::Granted);
        let coords = provider
            .current_position(&GeoOptions::default())
            .await
            .unwrap();
        assert!((coords.longitude - 39.8262).abs() < 1e-9);
    }
}
