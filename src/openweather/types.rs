//! OpenWeather One Call response structures
//!
//! Every field is optional on purpose: deserialization never rejects a
//! payload, so the normalizers own all contract decisions and can name the
//! first violated field in their errors.

use serde::Deserialize;

/// Combined current/forecast/alerts response from the One Call endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OneCallResponse {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub timezone: Option<String>,
    pub timezone_offset: Option<i64>,
    pub current: Option<RawCurrent>,
    pub hourly: Option<Vec<RawHourlyEntry>>,
    pub daily: Option<Vec<RawDailyEntry>>,
    pub alerts: Option<Vec<RawAlertEntry>>,
}

/// Condition descriptor attached to current/hourly/daily blocks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWeatherEntry {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Precipitation volume block (`rain` / `snow`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPrecipitation {
    #[serde(rename = "1h")]
    pub one_hour: Option<f64>,
}

/// Current conditions block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCurrent {
    pub dt: Option<i64>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub clouds: Option<f64>,
    pub visibility: Option<f64>,
    pub rain: Option<RawPrecipitation>,
    pub snow: Option<RawPrecipitation>,
    pub weather: Option<Vec<RawWeatherEntry>>,
}

/// One hourly forecast entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHourlyEntry {
    pub dt: Option<i64>,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub clouds: Option<f64>,
    pub visibility: Option<f64>,
    /// Precipitation probability, 0..1
    pub pop: Option<f64>,
    pub weather: Option<Vec<RawWeatherEntry>>,
}

/// Temperature block of a daily forecast entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDailyTemp {
    pub day: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Apparent-temperature block of a daily forecast entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDailyFeelsLike {
    pub day: Option<f64>,
}

/// One daily forecast entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDailyEntry {
    pub dt: Option<i64>,
    pub temp: Option<RawDailyTemp>,
    pub feels_like: Option<RawDailyFeelsLike>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_deg: Option<f64>,
    pub clouds: Option<f64>,
    /// Precipitation probability, 0..1
    pub pop: Option<f64>,
    pub weather: Option<Vec<RawWeatherEntry>>,
}

/// One alert entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAlertEntry {
    pub sender_name: Option<String>,
    pub event: Option<String>,
    /// Unix seconds
    pub start: Option<i64>,
    /// Unix seconds
    pub end: Option<i64>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}
