//! Normalization of One Call alert entries into domain alerts

use chrono::{DateTime, Utc};

use crate::error::WeatherError;
use crate::models::{
    AlertSeverity, DataQuality, DataQualityFlag, Location, WeatherAlert,
};

use super::types::{OneCallResponse, RawAlertEntry};
use super::{merge_location, provider_metadata};

const MAX_SLUG_LEN: usize = 40;

/// Validate and normalize the alerts section of a One Call payload.
///
/// A payload without alert entries is a successful empty result, not an
/// error; the provider simply has nothing active for the location.
pub fn normalize_alerts(
    raw: &OneCallResponse,
    requested: &Location,
) -> Result<Vec<WeatherAlert>, WeatherError> {
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

    let entries = match raw.alerts.as_deref() {
        Some(entries) if !entries.is_empty() => entries,
        _ => return Ok(Vec::new()),
    };

    let location = merge_location(requested, lat, lon, Some(timezone));

    let alerts = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| map_alert_entry(entry, index, lat, lon, &location))
        .collect();

    Ok(alerts)
}

fn map_alert_entry(
    entry: &RawAlertEntry,
    index: usize,
    lat: f64,
    lon: f64,
    location: &Location,
) -> WeatherAlert {
    let title = normalize_string(entry.event.as_deref());
    let title = if title.is_empty() {
        "Weather alert".to_string()
    } else {
        title
    };

    let description = {
        let text = normalize_string(entry.description.as_deref());
        if text.is_empty() { None } else { Some(text) }
    };

    let source = {
        let text = normalize_string(entry.sender_name.as_deref());
        if text.is_empty() { None } else { Some(text) }
    };

    WeatherAlert {
        id: build_alert_id(entry, index, lat, lon),
        location: location.clone(),
        title,
        description,
        severity: map_severity(entry),
        starts_at: to_utc(entry.start),
        ends_at: to_utc(entry.end),
        source,
        category: infer_category(entry),
        tags: entry.tags.clone(),
        provider: provider_metadata(),
        data_quality: build_data_quality(entry),
    }
}

fn to_utc(unix_seconds: Option<i64>) -> Option<DateTime<Utc>> {
    unix_seconds.and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn normalize_string(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_string()
}

/// Deterministic alert id: rounded coordinates, event start (or index) and
/// the slugged title. Re-normalizing the same provider entry always yields
/// the same id, which is what list stability and dedup rely on.
fn build_alert_id(entry: &RawAlertEntry, index: usize, lat: f64, lon: f64) -> String {
    let base_title = normalize_string(entry.event.as_deref());
    let title_slug = if base_title.is_empty() {
        slugify(&format!("alert-{index}"))
    } else {
        slugify(&base_title)
    };

    let start_part = match entry.start {
        Some(start) => start.to_string(),
        None => format!("idx-{index}"),
    };

    let lat_part = (lat * 1000.0).round() as i64;
    let lon_part = (lon * 1000.0).round() as i64;

    format!("owm-alert:{lat_part}:{lon_part}:{start_part}:{title_slug}")
}

fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_was_dash = false;
    for ch in value.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash && !slug.is_empty() {
            slug.push('-');
            last_was_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug.truncate(MAX_SLUG_LEN);
    slug
}

fn map_severity(entry: &RawAlertEntry) -> AlertSeverity {
    let tags: Vec<String> = entry
        .tags
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|t| t.to_lowercase())
        .collect();
    let title = entry.event.as_deref().unwrap_or_default().to_lowercase();
    let description = entry
        .description
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let has_tag = |tag: &str| tags.iter().any(|t| t == tag);

    if has_tag("extreme") || title.contains("red") || description.contains("red warning") {
        return AlertSeverity::Extreme;
    }

    if has_tag("severe") || title.contains("warning") || description.contains("warning") {
        return AlertSeverity::Severe;
    }

    if has_tag("moderate") || title.contains("watch") {
        return AlertSeverity::Moderate;
    }

    if has_tag("minor") || has_tag("advisory") {
        return AlertSeverity::Minor;
    }

    AlertSeverity::Unknown
}

fn infer_category(entry: &RawAlertEntry) -> Option<String> {
    let title = entry.event.as_deref().unwrap_or_default().to_lowercase();
    let description = entry
        .description
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let tags = entry
        .tags
        .as_deref()
        .unwrap_or_default()
        .join(" ")
        .to_lowercase();

    let haystack = format!("{title} {description} {tags}");

    let category = if haystack.contains("wind") {
        "wind"
    } else if haystack.contains("storm") || haystack.contains("thunder") {
        "storm"
    } else if haystack.contains("rain") || haystack.contains("flood") {
        "rain"
    } else if haystack.contains("snow") || haystack.contains("ice") {
        "snow"
    } else if haystack.contains("heat") {
        "heat"
    } else if haystack.contains("cold") || haystack.contains("frost") {
        "cold"
    } else if haystack.contains("fog") {
        "fog"
    } else {
        return None;
    };

    Some(category.to_string())
}

fn build_data_quality(entry: &RawAlertEntry) -> Option<DataQuality> {
    let mut flags = Vec::new();

    if normalize_string(entry.event.as_deref()).is_empty() {
        flags.push(DataQualityFlag::MissingRequired);
    }

    if normalize_string(entry.description.as_deref()).is_empty() {
        flags.push(DataQualityFlag::MissingOptional);
    }

    if entry.start.is_none() || entry.end.is_none() {
        flags.push(DataQualityFlag::Partial);
    }

    if flags.is_empty() {
        return None;
    }

    Some(DataQuality {
        flags,
        message: Some("Alert has missing or partial fields from provider payload".to_string()),
    })
}
