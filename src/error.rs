//! Error types and handling for the `skycast` weather core

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Failure classification used by callers to decide retry/backoff policy.
///
/// The kind is assigned exactly once, at the boundary where the failure is
/// first observed, and is never downgraded while the error travels through
/// the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure (DNS, connect, timeout). Potentially transient.
    Network,
    /// Unexpected non-2xx response from the provider.
    Http,
    /// Provider payload violates the expected schema.
    Contract,
    /// Provider throttling; carries a retry hint when the provider sent one.
    RateLimit,
    /// Missing or rejected API credential, or invalid local configuration.
    Config,
    /// Anything not yet classified.
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::Contract => "contract",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Config => "config",
            ErrorKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Main error type for the weather core.
///
/// `Clone` because the cache records the same failure into the current,
/// forecast and alerts slots of a location.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeatherError {
    /// Transport-level failure while talking to the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx provider response that is not a rate limit or credential issue
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Provider payload did not match the expected contract
    #[error("Contract violation: {0}")]
    Contract(String),

    /// Provider throttled the request
    #[error("Rate limited: {message}")]
    RateLimit {
        message: String,
        retry_after_ms: Option<u64>,
    },

    /// Configuration or credential problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unclassified failure
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl WeatherError {
    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new HTTP error with the offending status code
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new contract error
    pub fn contract<S: Into<String>>(message: S) -> Self {
        Self::Contract(message.into())
    }

    /// Create a new rate-limit error with an optional retry hint
    pub fn rate_limit<S: Into<String>>(message: S, retry_after_ms: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after_ms,
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new unknown error
    pub fn unknown<S: Into<String>>(message: S) -> Self {
        Self::Unknown(message.into())
    }

    /// Classification of this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Network(_) => ErrorKind::Network,
            WeatherError::Http { .. } => ErrorKind::Http,
            WeatherError::Contract(_) => ErrorKind::Contract,
            WeatherError::RateLimit { .. } => ErrorKind::RateLimit,
            WeatherError::Config(_) => ErrorKind::Config,
            WeatherError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status code attached to this error, if any
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            WeatherError::Http { status, .. } => Some(*status),
            WeatherError::RateLimit { .. } => Some(429),
            _ => None,
        }
    }

    /// Provider retry hint, if the provider sent one
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            WeatherError::RateLimit { retry_after_ms, .. } => {
                retry_after_ms.map(Duration::from_millis)
            }
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry after this error
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network | ErrorKind::RateLimit)
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::Network(_) => {
                "Unable to reach the weather service. Please check your internet connection."
                    .to_string()
            }
            WeatherError::Http { status, .. } => {
                format!("The weather service returned an unexpected response (HTTP {status}).")
            }
            WeatherError::Contract(_) => {
                "The weather service returned data we could not understand.".to_string()
            }
            WeatherError::RateLimit { retry_after_ms, .. } => match retry_after_ms {
                Some(ms) => format!(
                    "Too many requests to the weather service. Try again in {} seconds.",
                    ms / 1000
                ),
                None => "Too many requests to the weather service. Try again later.".to_string(),
            },
            WeatherError::Config(_) => {
                "Weather service configuration error. Please check your API key.".to_string()
            }
            WeatherError::Unknown(_) => "Something went wrong fetching weather.".to_string(),
        }
    }
}
