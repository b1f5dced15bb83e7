//! Daily downsampling of fine-grained forecast slices
//!
//! Used when the provider sends no native daily series: fine slices are
//! grouped by UTC calendar day and collapsed into one representative slice
//! per day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::ForecastSlice;

/// The hour (UTC) a derived daily slice is stamped at.
const DAILY_REFERENCE_HOUR: u32 = 12;

/// Collapse fine-grained slices into one slice per UTC calendar day.
///
/// Per day: `min` is the minimum over each slice's own minimum (falling back
/// to its point temperature), `max` analogous, and the representative
/// temperature is the midpoint of the two. The representative condition is
/// taken from the day's earliest slice; that choice is arbitrary but
/// deterministic. Empty input yields an empty output, not an error.
#[must_use]
pub fn aggregate_daily(slices: &[ForecastSlice]) -> Vec<ForecastSlice> {
    if slices.is_empty() {
        return Vec::new();
    }

    let mut by_day: BTreeMap<NaiveDate, Vec<&ForecastSlice>> = BTreeMap::new();
    for slice in slices {
        by_day
            .entry(slice.timestamp.date_naive())
            .or_default()
            .push(slice);
    }

    let mut daily = Vec::with_capacity(by_day.len());

    for (day, mut day_slices) in by_day {
        day_slices.sort_by_key(|s| s.timestamp);

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for slice in &day_slices {
            let low = slice.min_temperature_c.unwrap_or(slice.temperature_c);
            let high = slice.max_temperature_c.unwrap_or(slice.temperature_c);
            if low < min {
                min = low;
            }
            if high > max {
                max = high;
            }
        }

        if !min.is_finite() || !max.is_finite() {
            continue;
        }

        let Some(noon) = day.and_hms_opt(DAILY_REFERENCE_HOUR, 0, 0) else {
            continue;
        };
        let earliest = day_slices[0];

        daily.push(ForecastSlice {
            timestamp: noon.and_utc(),
            temperature_c: (min + max) / 2.0,
            feels_like_c: None,
            condition_code: earliest.condition_code,
            condition_label: earliest.condition_label.clone(),
            precipitation_probability_pct: None,
            wind_speed_kmh: None,
            wind_direction_deg: None,
            min_temperature_c: Some(min),
            max_temperature_c: Some(max),
        });
    }

    daily
}
