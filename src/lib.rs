//! `skycast` - location-keyed weather resource cache and provider core
//!
//! This library is the headless core of a map-centric weather client. It
//! fetches current conditions, forecast timelines and active alerts from a
//! weather provider as one combined bundle, validates and normalizes the
//! loosely-typed payload into strict domain entities, and serves them from
//! a location-keyed cache with TTL freshness, request coalescing and
//! stale-while-revalidate refreshes.
//!
//! UI, map rendering and routing live elsewhere and talk to this crate
//! through [`WeatherCache`] and the read accessors keyed by
//! [`LocationKey`].

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod openweather;
pub mod telemetry;

// Re-export core types for public API
pub use aggregate::aggregate_daily;
pub use cache::{Resource, ResourceStatus, WeatherCache};
pub use config::{CacheConfig, LoggingConfig, SkycastConfig, WeatherConfig};
pub use error::{ErrorKind, WeatherError};
pub use models::{
    AlertSeverity, ConditionCode, CurrentConditions, DataQuality, DataQualityFlag,
    ForecastGranularity, ForecastSlice, ForecastTimeline, Location, LocationKey,
    ProviderMetadata, WeatherAlert, WeatherBundle,
};
pub use openweather::{OpenWeatherService, WeatherService};
pub use telemetry::{LogSink, NoopSink, TelemetrySink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherError>;
