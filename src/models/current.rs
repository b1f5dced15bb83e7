//! Current conditions model and shared value objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Location;

/// Closed, provider-agnostic classification of a weather state.
///
/// Unmapped provider codes degrade to `Unknown` rather than failing
/// normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCode {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storm,
    Drizzle,
    Fog,
    Unknown,
}

/// Where and when a payload came from
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderMetadata {
    /// Provider name (e.g. "openweather")
    pub provider_name: String,
    /// Provider API version, when known
    pub provider_version: Option<String>,
    /// When we fetched the payload
    pub fetched_at: DateTime<Utc>,
}

/// Flags describing a payload that was usable but incomplete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataQualityFlag {
    MissingRequired,
    MissingOptional,
    OutOfRange,
    Partial,
}

/// Data-quality annotation attached to an entity that was normalized
/// despite gaps in the provider payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataQuality {
    pub flags: Vec<DataQualityFlag>,
    pub message: Option<String>,
}

/// Current observed conditions at a location.
///
/// Temperatures are Celsius, wind speed km/h, pressure hPa, visibility
/// meters; the normalizer is the single place those units are produced.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Location these conditions describe
    pub location: Location,
    /// Observation timestamp (UTC)
    pub observed_at: DateTime<Utc>,
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Apparent temperature in Celsius
    pub feels_like_c: Option<f64>,
    /// Classified condition
    pub condition_code: ConditionCode,
    /// Human-readable condition label
    pub condition_label: String,
    /// Relative humidity (0-100)
    pub humidity_pct: Option<f64>,
    /// Atmospheric pressure in hPa
    pub pressure_hpa: Option<f64>,
    /// Wind speed in km/h
    pub wind_speed_kmh: Option<f64>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction_deg: Option<f64>,
    /// Cloud coverage (0-100)
    pub cloud_coverage_pct: Option<f64>,
    /// Visibility in meters
    pub visibility_m: Option<f64>,
    /// Precipitation over the last hour in mm (rain or snow)
    pub precipitation_last_hour_mm: Option<f64>,
    /// Provenance of this entity
    pub provider: ProviderMetadata,
    /// Set when the payload was usable but incomplete
    pub data_quality: Option<DataQuality>,
}
