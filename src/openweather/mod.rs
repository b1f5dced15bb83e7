//! OpenWeather provider integration
//!
//! The [`OpenWeatherClient`] performs the network call, the normalizers in
//! this module turn the raw payload into strict domain entities, and the
//! [`OpenWeatherService`] orchestrates both and emits telemetry. The cache
//! only ever talks to the [`WeatherService`] trait.

pub mod client;
pub mod condition;
pub mod types;

mod alerts;
mod current;
mod forecast;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::models::{ForecastGranularity, Location, ProviderMetadata, WeatherBundle};
use crate::telemetry::{
    ApiErrorEvent, ApiRequestEvent, ApiSuccessEvent, DataAspect, DataDegradedEvent, LogSink,
    TelemetryLocation, TelemetrySink,
};

pub use alerts::normalize_alerts;
pub use client::OpenWeatherClient;
pub use condition::classify;
pub use current::normalize_current;
pub use forecast::{ForecastNormalization, normalize_forecast};

/// Provider name attached to entities and telemetry
pub const PROVIDER_NAME: &str = "openweather";
/// Provider API version attached to entities
pub const PROVIDER_VERSION: &str = "3.0";

const OPERATION: &str = "one_call_bundle";

/// Convert wind speed from provider m/s to domain km/h.
///
/// This is the single conversion point shared by the current and forecast
/// mapping paths.
pub(crate) fn mps_to_kmh(meters_per_second: f64) -> f64 {
    meters_per_second * 3.6
}

/// Uppercase the first character of a provider condition label.
pub(crate) fn capitalize_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Provenance stamp for entities built from the current fetch.
pub(crate) fn provider_metadata() -> ProviderMetadata {
    ProviderMetadata {
        provider_name: PROVIDER_NAME.to_string(),
        provider_version: Some(PROVIDER_VERSION.to_string()),
        fetched_at: Utc::now(),
    }
}

/// The requested location enriched with the coordinates and timezone the
/// provider echoed back. The requested identifier survives so entities stay
/// attached to the caller's cache key.
pub(crate) fn merge_location(
    requested: &Location,
    lat: f64,
    lon: f64,
    timezone: Option<&str>,
) -> Location {
    Location {
        latitude: lat,
        longitude: lon,
        id: requested.id.clone(),
        name: requested.name.clone(),
        country: requested.country.clone(),
        timezone: timezone
            .map(ToString::to_string)
            .or_else(|| requested.timezone.clone()),
    }
}

/// One fetch of everything the provider knows about a location.
#[async_trait]
pub trait WeatherService: Send + Sync {
    /// Fetch and normalize the combined current/forecast/alerts bundle.
    async fn fetch_bundle(&self, location: &Location) -> Result<WeatherBundle, WeatherError>;
}

/// Production [`WeatherService`] backed by the OpenWeather One Call API.
pub struct OpenWeatherService {
    client: OpenWeatherClient,
    telemetry: Arc<dyn TelemetrySink>,
}

impl OpenWeatherService {
    /// Create a service with the default logging telemetry sink.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        Self::with_telemetry(config, Arc::new(LogSink))
    }

    /// Create a service with a caller-provided telemetry sink.
    pub fn with_telemetry(
        config: &WeatherConfig,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self, WeatherError> {
        let client = OpenWeatherClient::new(config)?;
        Ok(Self { client, telemetry })
    }

    async fn fetch_bundle_inner(
        &self,
        location: &Location,
    ) -> Result<WeatherBundle, WeatherError> {
        let raw = self.client.fetch_one_call(location).await?;

        let current = normalize_current(&raw, location)?;
        let forecast = normalize_forecast(&raw, location)?;
        let alerts = normalize_alerts(&raw, location)?;

        self.emit_degradations(&raw, &forecast);

        Ok(WeatherBundle {
            current,
            forecast_timelines: forecast.timelines,
            alerts,
            provider: provider_metadata(),
        })
    }

    fn emit_degradations(
        &self,
        raw: &types::OneCallResponse,
        forecast: &ForecastNormalization,
    ) {
        let now = Utc::now();

        if forecast.fine_dropped > 0 {
            self.telemetry.on_data_degraded(&DataDegradedEvent {
                provider: PROVIDER_NAME,
                operation: OPERATION,
                aspect: DataAspect::ForecastFine,
                reason: "hourly_entries_unusable",
                had_input: true,
                has_output: forecast
                    .timelines
                    .iter()
                    .any(|t| t.granularity == ForecastGranularity::Fine),
                timestamp: now,
            });
        }

        if forecast.daily_dropped > 0 || forecast.daily_synthesized {
            self.telemetry.on_data_degraded(&DataDegradedEvent {
                provider: PROVIDER_NAME,
                operation: OPERATION,
                aspect: DataAspect::ForecastDaily,
                reason: if forecast.daily_synthesized {
                    "daily_series_derived_from_fine_slices"
                } else {
                    "daily_entries_unusable"
                },
                had_input: raw.daily.as_deref().is_some_and(|d| !d.is_empty()),
                has_output: forecast
                    .timelines
                    .iter()
                    .any(|t| t.granularity == ForecastGranularity::Daily),
                timestamp: now,
            });
        }

        if raw.alerts.is_none() {
            self.telemetry.on_data_degraded(&DataDegradedEvent {
                provider: PROVIDER_NAME,
                operation: OPERATION,
                aspect: DataAspect::Alerts,
                reason: "alerts_missing_from_payload",
                had_input: false,
                has_output: false,
                timestamp: now,
            });
        }
    }
}

#[async_trait]
impl WeatherService for OpenWeatherService {
    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    async fn fetch_bundle(&self, location: &Location) -> Result<WeatherBundle, WeatherError> {
        let started = Instant::now();
        let telemetry_location = Some(TelemetryLocation::from_location(location));

        self.telemetry.on_api_request(&ApiRequestEvent {
            provider: PROVIDER_NAME,
            operation: OPERATION,
            location: telemetry_location.clone(),
            timestamp: Utc::now(),
        });

        match self.fetch_bundle_inner(location).await {
            Ok(bundle) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                debug!(
                    duration_ms,
                    timelines = bundle.forecast_timelines.len(),
                    alerts = bundle.alerts.len(),
                    "weather bundle fetched"
                );
                self.telemetry.on_api_success(&ApiSuccessEvent {
                    provider: PROVIDER_NAME,
                    operation: OPERATION,
                    location: telemetry_location,
                    duration_ms,
                    timestamp: Utc::now(),
                });
                Ok(bundle)
            }
            Err(error) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.telemetry.on_api_error(&ApiErrorEvent {
                    provider: PROVIDER_NAME,
                    operation: OPERATION,
                    location: telemetry_location,
                    duration_ms,
                    error_kind: error.kind(),
                    error_message: error.to_string(),
                    timestamp: Utc::now(),
                });
                Err(error)
            }
        }
    }
}
