//! Normalization of One Call hourly/daily series into forecast timelines

use chrono::DateTime;

use crate::aggregate::aggregate_daily;
use crate::error::WeatherError;
use crate::models::{
    ConditionCode, DataQuality, DataQualityFlag, ForecastGranularity, ForecastSlice,
    ForecastTimeline, Location,
};

use super::condition::classify;
use super::types::{OneCallResponse, RawDailyEntry, RawHourlyEntry, RawWeatherEntry};
use super::{capitalize_label, merge_location, mps_to_kmh, provider_metadata};

/// Keep every third hourly entry so the fine timeline runs in roughly
/// 3-hour steps.
const HOURLY_DOWNSAMPLE_STEP: usize = 3;

/// Result of forecast normalization, with enough bookkeeping for the
/// service to emit degradation telemetry.
#[derive(Debug, Clone)]
pub struct ForecastNormalization {
    /// Fine and/or daily timelines, in that order
    pub timelines: Vec<ForecastTimeline>,
    /// Hourly entries skipped because they were unusable
    pub fine_dropped: usize,
    /// Daily entries skipped because they were unusable
    pub daily_dropped: usize,
    /// True when the daily timeline was derived from fine slices instead of
    /// a provider daily series
    pub daily_synthesized: bool,
}

/// Validate and normalize the forecast series of a One Call payload.
///
/// Produces a `Fine` timeline from downsampled hourly entries and a `Daily`
/// timeline from the provider daily series, deriving the daily series from
/// fine slices when the provider sent none. A payload with no usable series
/// at all is a contract error.
pub fn normalize_forecast(
    raw: &OneCallResponse,
    requested: &Location,
) -> Result<ForecastNormalization, WeatherError> {
    let (lat, lon) = match (raw.lat, raw.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => {
            return Err(WeatherError::contract(
                "Invalid payload: missing or invalid coordinates",
            ));
        }
    };

    let timezone = raw
        .timezone
        .as_deref()
        .filter(|tz| !tz.is_empty())
        .ok_or_else(|| WeatherError::contract("Invalid payload: missing timezone"))?;

    let location = merge_location(requested, lat, lon, Some(timezone));

    let hourly = raw.hourly.as_deref().unwrap_or_default();
    let sampled: Vec<&RawHourlyEntry> = hourly
        .iter()
        .enumerate()
        .filter(|(index, _)| index % HOURLY_DOWNSAMPLE_STEP == 0)
        .map(|(_, entry)| entry)
        .collect();

    let mut fine_slices = Vec::with_capacity(sampled.len());
    let mut fine_dropped = 0usize;
    for entry in &sampled {
        match map_hourly_entry(entry) {
            Some(slice) => fine_slices.push(slice),
            None => fine_dropped += 1,
        }
    }

    let daily_entries = raw.daily.as_deref().unwrap_or_default();
    let mut daily_slices = Vec::with_capacity(daily_entries.len());
    let mut daily_dropped = 0usize;
    for entry in daily_entries {
        match map_daily_entry(entry) {
            Some(slice) => daily_slices.push(slice),
            None => daily_dropped += 1,
        }
    }

    let mut daily_synthesized = false;
    if daily_slices.is_empty() && !fine_slices.is_empty() {
        daily_slices = aggregate_daily(&fine_slices);
        daily_synthesized = !daily_slices.is_empty();
    }

    let mut timelines = Vec::with_capacity(2);

    if !fine_slices.is_empty() {
        timelines.push(ForecastTimeline {
            location: location.clone(),
            granularity: ForecastGranularity::Fine,
            slices: fine_slices,
            provider: provider_metadata(),
            data_quality: partial_quality(fine_dropped),
        });
    }

    if !daily_slices.is_empty() {
        timelines.push(ForecastTimeline {
            location: location.clone(),
            granularity: ForecastGranularity::Daily,
            slices: daily_slices,
            provider: provider_metadata(),
            data_quality: partial_quality(daily_dropped),
        });
    }

    if timelines.is_empty() {
        return Err(WeatherError::contract(
            "Invalid payload: no usable hourly or daily forecast data",
        ));
    }

    Ok(ForecastNormalization {
        timelines,
        fine_dropped,
        daily_dropped,
        daily_synthesized,
    })
}

fn partial_quality(dropped: usize) -> Option<DataQuality> {
    if dropped == 0 {
        return None;
    }
    Some(DataQuality {
        flags: vec![DataQualityFlag::Partial],
        message: Some(format!("{dropped} forecast entries were unusable and skipped")),
    })
}

fn condition_of(weather: Option<&Vec<RawWeatherEntry>>) -> (ConditionCode, String) {
    let primary = weather.and_then(|entries| entries.first());
    let code = primary
        .map(|w| classify(w.id, w.main.as_deref().unwrap_or_default()))
        .unwrap_or(ConditionCode::Unknown);
    let label = primary
        .and_then(|w| w.description.as_deref().or(w.main.as_deref()))
        .map(capitalize_label)
        .unwrap_or_else(|| "Unknown".to_string());
    (code, label)
}

/// Clamp a provider probability (0..1) into percent (0..100).
fn pop_to_pct(pop: Option<f64>) -> Option<f64> {
    pop.filter(|p| p.is_finite())
        .map(|p| (p * 100.0).clamp(0.0, 100.0))
}

fn map_hourly_entry(entry: &RawHourlyEntry) -> Option<ForecastSlice> {
    let timestamp = entry.dt.and_then(|dt| DateTime::from_timestamp(dt, 0))?;
    let temperature_c = entry.temp.filter(|t| t.is_finite())?;

    let (condition_code, condition_label) = condition_of(entry.weather.as_ref());

    Some(ForecastSlice {
        timestamp,
        temperature_c,
        feels_like_c: entry.feels_like,
        condition_code,
        condition_label,
        precipitation_probability_pct: pop_to_pct(entry.pop),
        wind_speed_kmh: entry.wind_speed.map(mps_to_kmh),
        wind_direction_deg: entry.wind_deg,
        min_temperature_c: None,
        max_temperature_c: None,
    })
}

fn map_daily_entry(entry: &RawDailyEntry) -> Option<ForecastSlice> {
    let timestamp = entry.dt.and_then(|dt| DateTime::from_timestamp(dt, 0))?;
    let temp = entry.temp.as_ref()?;
    let temperature_c = temp.day.filter(|t| t.is_finite())?;

    let (condition_code, condition_label) = condition_of(entry.weather.as_ref());

    Some(ForecastSlice {
        timestamp,
        temperature_c,
        feels_like_c: entry.feels_like.as_ref().and_then(|f| f.day),
        condition_code,
        condition_label,
        precipitation_probability_pct: pop_to_pct(entry.pop),
        wind_speed_kmh: entry.wind_speed.map(mps_to_kmh),
        wind_direction_deg: entry.wind_deg,
        min_temperature_c: temp.min,
        max_temperature_c: temp.max,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    fn requested() -> Location {
        Location::new(40.4168, -3.7038)
    }

    fn hourly_entry(dt: i64, temp: f64) -> serde_json::Value {
        json!({
            "dt": dt,
            "temp": temp,
            "feels_like": temp - 1.0,
            "wind_speed": 5.0,
            "wind_deg": 180,
            "pop": 0.25,
            "weather": [ { "id": 500, "main": "Rain", "description": "light rain" } ]
        })
    }

    fn payload_with_hourly(entries: Vec<serde_json::Value>) -> OneCallResponse {
        serde_json::from_value(json!({
            "lat": 40.4168,
            "lon": -3.7038,
            "timezone": "Europe/Madrid",
            "hourly": entries,
        }))
        .unwrap()
    }

    #[test]
    fn test_hourly_is_downsampled_to_three_hour_steps() {
        // 9 hourly entries, one hour apart -> indices 0, 3, 6 survive
        let base = 1_700_000_000;
        let entries = (0..9)
            .map(|i| hourly_entry(base + i * 3600, 10.0 + i as f64))
            .collect();

        let normalized = normalize_forecast(&payload_with_hourly(entries), &requested()).unwrap();

        let fine = normalized
            .timelines
            .iter()
            .find(|t| t.granularity == ForecastGranularity::Fine)
            .expect("fine timeline");
        assert_eq!(fine.slices.len(), 3);
        assert_eq!(fine.slices[0].temperature_c, 10.0);
        assert_eq!(fine.slices[1].temperature_c, 13.0);
        assert_eq!(fine.slices[2].temperature_c, 16.0);
        assert!(fine.is_strictly_ordered());
        assert_eq!(fine.slices[0].precipitation_probability_pct, Some(25.0));

        // wind 5 m/s -> 18 km/h
        assert!((fine.slices[0].wind_speed_kmh.unwrap() - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_daily_synthesized_from_fine_when_provider_daily_absent() {
        let base = 1_700_000_000;
        let entries = (0..9)
            .map(|i| hourly_entry(base + i * 3600, 10.0 + i as f64))
            .collect();

        let normalized = normalize_forecast(&payload_with_hourly(entries), &requested()).unwrap();

        assert!(normalized.daily_synthesized);
        let daily = normalized
            .timelines
            .iter()
            .find(|t| t.granularity == ForecastGranularity::Daily)
            .expect("daily timeline");
        assert!(!daily.slices.is_empty());
        assert!(daily.slices[0].min_temperature_c.is_some());
    }

    #[test]
    fn test_provider_daily_is_used_when_present() {
        let payload: OneCallResponse = serde_json::from_value(json!({
            "lat": 40.4168,
            "lon": -3.7038,
            "timezone": "Europe/Madrid",
            "daily": [
                {
                    "dt": 1_700_000_000,
                    "temp": { "day": 15.0, "min": 9.0, "max": 19.0 },
                    "feels_like": { "day": 14.0 },
                    "wind_speed": 4.0,
                    "pop": 0.8,
                    "weather": [ { "id": 800, "main": "Clear", "description": "clear sky" } ]
                }
            ]
        }))
        .unwrap();

        let normalized = normalize_forecast(&payload, &requested()).unwrap();
        assert!(!normalized.daily_synthesized);
        assert_eq!(normalized.timelines.len(), 1);

        let daily = &normalized.timelines[0];
        assert_eq!(daily.granularity, ForecastGranularity::Daily);
        assert_eq!(daily.slices[0].temperature_c, 15.0);
        assert_eq!(daily.slices[0].min_temperature_c, Some(9.0));
        assert_eq!(daily.slices[0].max_temperature_c, Some(19.0));
        assert_eq!(daily.slices[0].feels_like_c, Some(14.0));
        assert_eq!(daily.slices[0].precipitation_probability_pct, Some(80.0));
        assert_eq!(daily.slices[0].condition_code, ConditionCode::Clear);
    }

    #[test]
    fn test_unusable_entries_are_skipped_and_flagged() {
        let base = 1_700_000_000;
        let mut entries: Vec<serde_json::Value> = Vec::new();
        entries.push(hourly_entry(base, 10.0));
        entries.push(json!({"dt": base + 3600})); // dropped by downsampling anyway
        entries.push(hourly_entry(base + 2 * 3600, 12.0));
        entries.push(json!({"temp": 11.0})); // sampled, missing dt -> dropped
        entries.push(hourly_entry(base + 4 * 3600, 13.0));
        entries.push(hourly_entry(base + 5 * 3600, 14.0));
        entries.push(hourly_entry(base + 6 * 3600, 15.0)); // sampled, kept

        let normalized = normalize_forecast(&payload_with_hourly(entries), &requested()).unwrap();
        assert_eq!(normalized.fine_dropped, 1);

        let fine = normalized
            .timelines
            .iter()
            .find(|t| t.granularity == ForecastGranularity::Fine)
            .expect("fine timeline");
        assert_eq!(fine.slices.len(), 2);
        let quality = fine.data_quality.as_ref().expect("quality flags");
        assert!(quality.flags.contains(&DataQualityFlag::Partial));
    }

    #[test]
    fn test_no_usable_series_is_contract_error() {
        let payload: OneCallResponse = serde_json::from_value(json!({
            "lat": 40.4168,
            "lon": -3.7038,
            "timezone": "Europe/Madrid",
            "hourly": [ {"dt": null}, {"temp": 3.0} ]
        }))
        .unwrap();

        let error = normalize_forecast(&payload, &requested()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Contract);
        assert!(error.to_string().contains("no usable hourly or daily forecast data"));
    }

    #[test]
    fn test_missing_timezone_is_contract_error() {
        let payload: OneCallResponse = serde_json::from_value(json!({
            "lat": 40.4168,
            "lon": -3.7038,
            "hourly": [ hourly_entry(1_700_000_000, 10.0) ]
        }))
        .unwrap();

        let error = normalize_forecast(&payload, &requested()).unwrap_err();
        assert!(error.to_string().contains("timezone"));
    }

    #[test]
    fn test_pop_is_clamped_into_percent_range() {
        let mut entry = hourly_entry(1_700_000_000, 10.0);
        entry["pop"] = json!(1.7);

        let normalized =
            normalize_forecast(&payload_with_hourly(vec![entry]), &requested()).unwrap();
        let fine = &normalized.timelines[0];
        assert_eq!(fine.slices[0].precipitation_probability_pct, Some(100.0));
    }
}
