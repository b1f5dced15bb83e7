//! Normalization of the One Call `current` block into domain conditions

use chrono::DateTime;

use crate::error::WeatherError;
use crate::models::{ConditionCode, CurrentConditions, DataQuality, DataQualityFlag, Location};

use super::condition::classify;
use super::types::OneCallResponse;
use super::{capitalize_label, merge_location, mps_to_kmh, provider_metadata};

/// Temperatures outside this window are treated as corrupted payloads, not
/// unit bugs; the coldest/hottest surface readings on record sit inside it.
const MIN_REASONABLE_TEMPERATURE_C: f64 = -90.0;
const MAX_REASONABLE_TEMPERATURE_C: f64 = 60.0;

/// Validate and normalize the current-conditions block of a One Call
/// payload.
///
/// Contract errors name the first violated field. Optional gaps degrade to
/// data-quality flags instead of failing.
pub fn normalize_current(
    raw: &OneCallResponse,
    requested: &Location,
) -> Result<CurrentConditions, WeatherError> {
    let (lat, lon) = match (raw.lat, raw.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => {
            return Err(WeatherError::contract(
                "Invalid payload: missing or invalid coordinates",
            ));
        }
    };

    let current = raw
        .current
        .as_ref()
        .ok_or_else(|| WeatherError::contract("Invalid payload: missing current block"))?;

    let observed_at = current
        .dt
        .and_then(|dt| DateTime::from_timestamp(dt, 0))
        .ok_or_else(|| WeatherError::contract("Invalid payload: missing or invalid timestamp"))?;

    let temperature_c = current
        .temp
        .filter(|t| t.is_finite())
        .ok_or_else(|| WeatherError::contract("Invalid payload: missing or invalid temperature"))?;

    if !(MIN_REASONABLE_TEMPERATURE_C..=MAX_REASONABLE_TEMPERATURE_C).contains(&temperature_c) {
        return Err(WeatherError::contract(
            "Invalid payload: temperature outside reasonable range",
        ));
    }

    let location = merge_location(requested, lat, lon, raw.timezone.as_deref());

    let primary_weather = current.weather.as_ref().and_then(|entries| entries.first());
    let condition_code = primary_weather
        .map(|w| classify(w.id, w.main.as_deref().unwrap_or_default()))
        .unwrap_or(ConditionCode::Unknown);
    let condition_label = primary_weather
        .and_then(|w| w.description.as_deref().or(w.main.as_deref()))
        .map(capitalize_label)
        .unwrap_or_else(|| "Unknown".to_string());

    let mut flags = Vec::new();
    if primary_weather.is_none() {
        flags.push(DataQualityFlag::MissingOptional);
    }
    let data_quality = if flags.is_empty() {
        None
    } else {
        Some(DataQuality {
            flags,
            message: Some("Current conditions are missing optional provider fields".to_string()),
        })
    };

    let precipitation_last_hour_mm = current
        .rain
        .as_ref()
        .and_then(|r| r.one_hour)
        .or_else(|| current.snow.as_ref().and_then(|s| s.one_hour));

    Ok(CurrentConditions {
        location,
        observed_at,
        temperature_c,
        feels_like_c: current.feels_like,
        condition_code,
        condition_label,
        humidity_pct: current.humidity,
        pressure_hpa: current.pressure,
        wind_speed_kmh: current.wind_speed.map(mps_to_kmh),
        wind_direction_deg: current.wind_deg,
        cloud_coverage_pct: current.clouds,
        visibility_m: current.visibility,
        precipitation_last_hour_mm,
        provider: provider_metadata(),
        data_quality,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::models::ConditionCode;

    fn success_payload() -> OneCallResponse {
        serde_json::from_value(json!({
            "lat": 40.4168,
            "lon": -3.7038,
            "timezone": "Europe/Madrid",
            "timezone_offset": 3600,
            "current": {
                "dt": 1_700_000_000,
                "temp": 18.5,
                "feels_like": 18.0,
                "pressure": 1015,
                "humidity": 65,
                "wind_speed": 3.5,
                "wind_deg": 250,
                "clouds": 40,
                "visibility": 10000,
                "rain": { "1h": 0.3 },
                "weather": [
                    { "id": 801, "main": "Clouds", "description": "few clouds", "icon": "02d" }
                ]
            }
        }))
        .unwrap()
    }

    fn requested() -> Location {
        Location::new(40.4168, -3.7038).with_id("madrid")
    }

    #[test]
    fn test_maps_valid_payload_to_domain() {
        let current = normalize_current(&success_payload(), &requested()).unwrap();

        assert_eq!(current.location.latitude, 40.4168);
        assert_eq!(current.location.longitude, -3.7038);
        assert_eq!(current.location.id.as_deref(), Some("madrid"));
        assert_eq!(current.location.timezone.as_deref(), Some("Europe/Madrid"));

        assert_eq!(current.temperature_c, 18.5);
        assert_eq!(current.feels_like_c, Some(18.0));
        assert_eq!(current.condition_code, ConditionCode::Cloudy);
        assert_eq!(current.condition_label, "Few clouds");
        assert_eq!(current.humidity_pct, Some(65.0));
        assert_eq!(current.pressure_hpa, Some(1015.0));

        // wind_speed 3.5 m/s -> 12.6 km/h
        let wind = current.wind_speed_kmh.unwrap();
        assert!((wind - 12.6).abs() < 1e-9);

        assert_eq!(current.cloud_coverage_pct, Some(40.0));
        assert_eq!(current.visibility_m, Some(10_000.0));
        assert_eq!(current.precipitation_last_hour_mm, Some(0.3));

        assert_eq!(current.provider.provider_name, "openweather");
        assert_eq!(current.provider.provider_version.as_deref(), Some("3.0"));
        assert_eq!(current.observed_at.timestamp(), 1_700_000_000);
        assert!(current.data_quality.is_none());
    }

    #[test]
    fn test_missing_temperature_is_contract_error_naming_field() {
        let mut payload = success_payload();
        if let Some(current) = payload.current.as_mut() {
            current.temp = None;
        }

        let error = normalize_current(&payload, &requested()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Contract);
        assert!(error.to_string().contains("temperature"));
    }

    #[test]
    fn test_out_of_range_temperature_is_contract_error() {
        let mut payload = success_payload();
        if let Some(current) = payload.current.as_mut() {
            current.temp = Some(120.0);
        }

        let error = normalize_current(&payload, &requested()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Contract);
        assert!(error.to_string().contains("temperature outside reasonable range"));
    }

    #[test]
    fn test_nan_temperature_is_contract_error() {
        let mut payload = success_payload();
        if let Some(current) = payload.current.as_mut() {
            current.temp = Some(f64::NAN);
        }

        let error = normalize_current(&payload, &requested()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Contract);
    }

    #[test]
    fn test_missing_coordinates_is_contract_error() {
        let mut payload = success_payload();
        payload.lon = None;

        let error = normalize_current(&payload, &requested()).unwrap_err();
        assert!(error.to_string().contains("coordinates"));
    }

    #[test]
    fn test_missing_current_block_is_contract_error() {
        let mut payload = success_payload();
        payload.current = None;

        let error = normalize_current(&payload, &requested()).unwrap_err();
        assert!(error.to_string().contains("current block"));
    }

    #[test]
    fn test_missing_timestamp_is_contract_error() {
        let mut payload = success_payload();
        if let Some(current) = payload.current.as_mut() {
            current.dt = None;
        }

        let error = normalize_current(&payload, &requested()).unwrap_err();
        assert!(error.to_string().contains("timestamp"));
    }

    #[test]
    fn test_missing_weather_entry_degrades_to_unknown_with_flag() {
        let mut payload = success_payload();
        if let Some(current) = payload.current.as_mut() {
            current.weather = None;
        }

        let current = normalize_current(&payload, &requested()).unwrap();
        assert_eq!(current.condition_code, ConditionCode::Unknown);
        assert_eq!(current.condition_label, "Unknown");
        let quality = current.data_quality.unwrap();
        assert!(quality.flags.contains(&DataQualityFlag::MissingOptional));
    }

    #[test]
    fn test_snow_fills_precipitation_when_rain_absent() {
        let mut payload = success_payload();
        if let Some(current) = payload.current.as_mut() {
            current.rain = None;
            current.snow = Some(super::super::types::RawPrecipitation { one_hour: Some(1.2) });
        }

        let current = normalize_current(&payload, &requested()).unwrap();
        assert_eq!(current.precipitation_last_hour_mm, Some(1.2));
    }
}
