//! Structured telemetry events and the pluggable sink they are delivered to
//!
//! The weather service emits one event per provider-call transition
//! (request, success, error) plus degradation events when a payload was
//! fetched but could not be fully normalized. Sinks are injected at service
//! construction; the default sink logs through `tracing`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::LoggingConfig;
use crate::error::ErrorKind;
use crate::models::Location;

/// Coarsened location attached to telemetry events.
///
/// Coordinates are rounded to two decimals so sinks never see precise
/// positions; identifiers and timezone are dropped entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub country: Option<String>,
}

impl TelemetryLocation {
    /// Sanitize a location for telemetry use
    #[must_use]
    pub fn from_location(location: &Location) -> Self {
        let (latitude, longitude) = location.rounded_coordinates(2);
        Self {
            latitude,
            longitude,
            name: location.name.clone(),
            country: location.country.clone(),
        }
    }
}

/// A provider call is about to start
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequestEvent {
    pub provider: &'static str,
    pub operation: &'static str,
    pub location: Option<TelemetryLocation>,
    pub timestamp: DateTime<Utc>,
}

/// A provider call completed successfully
#[derive(Debug, Clone, Serialize)]
pub struct ApiSuccessEvent {
    pub provider: &'static str,
    pub operation: &'static str,
    pub location: Option<TelemetryLocation>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// A provider call failed
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorEvent {
    pub provider: &'static str,
    pub operation: &'static str,
    pub location: Option<TelemetryLocation>,
    pub duration_ms: u64,
    #[serde(serialize_with = "serialize_kind")]
    pub error_kind: ErrorKind,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

fn serialize_kind<S: serde::Serializer>(kind: &ErrorKind, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(kind)
}

/// Which aspect of a bundle was degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataAspect {
    ForecastFine,
    ForecastDaily,
    Alerts,
}

/// A payload was fetched but part of it could not be normalized into output
#[derive(Debug, Clone, Serialize)]
pub struct DataDegradedEvent {
    pub provider: &'static str,
    pub operation: &'static str,
    pub aspect: DataAspect,
    pub reason: &'static str,
    pub had_input: bool,
    pub has_output: bool,
    pub timestamp: DateTime<Utc>,
}

/// Receiver for weather telemetry events.
///
/// All methods default to no-ops so sinks only implement what they care
/// about.
pub trait TelemetrySink: Send + Sync {
    fn on_api_request(&self, _event: &ApiRequestEvent) {}
    fn on_api_success(&self, _event: &ApiSuccessEvent) {}
    fn on_api_error(&self, _event: &ApiErrorEvent) {}
    fn on_data_degraded(&self, _event: &DataDegradedEvent) {}
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TelemetrySink for NoopSink {}

/// Default sink that forwards events to `tracing` at debug level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn on_api_request(&self, event: &ApiRequestEvent) {
        debug!(provider = event.provider, operation = event.operation, "weather request started");
    }

    fn on_api_success(&self, event: &ApiSuccessEvent) {
        debug!(
            provider = event.provider,
            operation = event.operation,
            duration_ms = event.duration_ms,
            "weather request succeeded"
        );
    }

    fn on_api_error(&self, event: &ApiErrorEvent) {
        debug!(
            provider = event.provider,
            operation = event.operation,
            duration_ms = event.duration_ms,
            kind = %event.error_kind,
            message = %event.error_message,
            "weather request failed"
        );
    }

    fn on_data_degraded(&self, event: &DataDegradedEvent) {
        debug!(
            provider = event.provider,
            operation = event.operation,
            aspect = ?event.aspect,
            reason = event.reason,
            had_input = event.had_input,
            has_output = event.has_output,
            "weather data degraded"
        );
    }
}

/// Initialize process-wide logging from the logging configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.format.as_str() {
        "json" => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install subscriber: {e}"))?,
        _ => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install subscriber: {e}"))?,
    }

    Ok(())
}
