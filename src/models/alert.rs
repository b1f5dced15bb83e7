//! Weather alert model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DataQuality, Location, ProviderMetadata};

/// Severity ladder for active alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Minor,
    Moderate,
    Severe,
    Extreme,
    Unknown,
}

/// An active weather alert for a location.
///
/// `id` is derived from provider fields (rounded coordinates, event start or
/// index, normalized title), so re-normalizing the same underlying event
/// always yields the same id. UI lists and dedup depend on that stability.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherAlert {
    /// Stable, deterministic identifier
    pub id: String,
    /// Location the alert applies to
    pub location: Location,
    /// Alert headline
    pub title: String,
    /// Longer description, when the provider sent one
    pub description: Option<String>,
    /// Classified severity
    pub severity: AlertSeverity,
    /// Alert start time (UTC)
    pub starts_at: Option<DateTime<Utc>>,
    /// Alert end time (UTC)
    pub ends_at: Option<DateTime<Utc>>,
    /// Issuing authority, when known
    pub source: Option<String>,
    /// Inferred category (wind, storm, rain, snow, heat, cold, fog)
    pub category: Option<String>,
    /// Provider-supplied tags, passed through untouched
    pub tags: Option<Vec<String>>,
    /// Provenance of this entity
    pub provider: ProviderMetadata,
    /// Set when the payload was usable but incomplete
    pub data_quality: Option<DataQuality>,
}
