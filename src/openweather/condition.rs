//! Condition classification for OpenWeather condition codes
//!
//! OpenWeather bands its numeric condition ids: 2xx thunderstorm, 3xx
//! drizzle, 5xx rain, 6xx snow, 7xx atmosphere (mist/fog/haze), 800 clear,
//! 801-804 clouds. The numeric id is the primary signal; the free-form
//! `main` text is only consulted when the id is absent or unmapped.

use crate::models::ConditionCode;

/// Classify a provider condition into the closed condition enum.
///
/// Total over all inputs; anything unrecognized yields
/// [`ConditionCode::Unknown`].
#[must_use]
pub fn classify(id: Option<i64>, main: &str) -> ConditionCode {
    if let Some(id) = id {
        match id {
            200..=299 => return ConditionCode::Storm,
            300..=399 => return ConditionCode::Drizzle,
            500..=599 => return ConditionCode::Rain,
            600..=699 => return ConditionCode::Snow,
            700..=799 => return ConditionCode::Fog,
            800 => return ConditionCode::Clear,
            801..=899 => return ConditionCode::Cloudy,
            _ => {}
        }
    }

    let normalized = main.to_lowercase();
    if normalized.contains("rain") {
        return ConditionCode::Rain;
    }
    if normalized.contains("snow") {
        return ConditionCode::Snow;
    }
    if normalized.contains("storm") || normalized.contains("thunder") {
        return ConditionCode::Storm;
    }

    ConditionCode::Unknown
}
