//! Forecast timeline models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConditionCode, DataQuality, Location, ProviderMetadata};

/// Step size of a forecast timeline.
///
/// A timeline never mixes granularities; fine and daily series for the same
/// location are separate timelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastGranularity {
    /// Fine-grained steps (roughly 3-hourly)
    Fine,
    /// One slice per calendar day
    Daily,
}

/// One point (or day) of a forecast timeline
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastSlice {
    /// Slice timestamp (UTC); daily slices are stamped at 12:00 UTC
    pub timestamp: DateTime<Utc>,
    /// Temperature in Celsius (representative midpoint for daily slices)
    pub temperature_c: f64,
    /// Apparent temperature in Celsius
    pub feels_like_c: Option<f64>,
    /// Classified condition
    pub condition_code: ConditionCode,
    /// Human-readable condition label
    pub condition_label: String,
    /// Precipitation probability (0-100)
    pub precipitation_probability_pct: Option<f64>,
    /// Wind speed in km/h
    pub wind_speed_kmh: Option<f64>,
    /// Wind direction in degrees
    pub wind_direction_deg: Option<f64>,
    /// Minimum temperature in Celsius (daily slices)
    pub min_temperature_c: Option<f64>,
    /// Maximum temperature in Celsius (daily slices)
    pub max_temperature_c: Option<f64>,
}

/// An ordered forecast series for one location at one granularity
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastTimeline {
    /// Location this timeline describes
    pub location: Location,
    /// Step size of the slices
    pub granularity: ForecastGranularity,
    /// Slices in strictly ascending timestamp order
    pub slices: Vec<ForecastSlice>,
    /// Provenance of this timeline
    pub provider: ProviderMetadata,
    /// Set when the payload was usable but incomplete
    pub data_quality: Option<DataQuality>,
}

impl ForecastTimeline {
    /// First slice of the timeline, if any
    #[must_use]
    pub fn first_slice(&self) -> Option<&ForecastSlice> {
        self.slices.first()
    }

    /// Whether slices are strictly ascending by timestamp
    #[must_use]
    pub fn is_strictly_ordered(&self) -> bool {
        self.slices
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    }

    /// Overall min/max temperature across the timeline, honoring embedded
    /// per-slice bounds when present
    #[must_use]
    pub fn temperature_range(&self) -> Option<(f64, f64)> {
        if self.slices.is_empty() {
            return None;
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for slice in &self.slices {
            min = min.min(slice.min_temperature_c.unwrap_or(slice.temperature_c));
            max = max.max(slice.max_temperature_c.unwrap_or(slice.temperature_c));
        }
        Some((min, max))
    }
}
