//! HTTP client for the OpenWeather One Call endpoint
//!
//! The client builds the request, performs exactly one network call and
//! classifies failures into the typed error taxonomy. It deliberately does
//! not retry: backoff policy belongs to whoever wraps the cache.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, warn};

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::models::Location;

use super::types::OneCallResponse;

/// Low-level OpenWeather client. No domain knowledge: it returns the
/// provider-shaped payload and leaves validation to the normalizers.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    units: String,
    language: Option<String>,
}

impl OpenWeatherClient {
    /// Create a new client from the weather configuration.
    ///
    /// Fails with a `config` error when the API key is missing, so a broken
    /// deployment is caught at construction instead of on the first fetch.
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                WeatherError::config("Missing OpenWeather API key (weather.api_key)")
            })?
            .to_string();

        let timeout = Duration::from_secs(config.timeout_seconds.into());
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            units: config.units.clone(),
            language: config.language.clone(),
        })
    }

    /// Fetch the combined current/forecast/alerts bundle for a location
    pub async fn fetch_one_call(
        &self,
        location: &Location,
    ) -> Result<OneCallResponse, WeatherError> {
        let url = self.build_one_call_url(location);

        debug!(
            lat = location.latitude,
            lon = location.longitude,
            "requesting OpenWeather one call bundle"
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "transport failure calling OpenWeather");
            WeatherError::network(format!("Request to OpenWeather failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_failure_status(status, &response));
        }

        response.json::<OneCallResponse>().await.map_err(|e| {
            WeatherError::contract(format!("Invalid JSON from OpenWeather one call endpoint: {e}"))
        })
    }

    fn build_one_call_url(&self, location: &Location) -> String {
        let mut url = format!(
            "{}/onecall?lat={}&lon={}&appid={}&units={}",
            self.base_url,
            location.latitude,
            location.longitude,
            urlencoding::encode(&self.api_key),
            self.units,
        );
        if let Some(lang) = &self.language {
            url.push_str("&lang=");
            url.push_str(&urlencoding::encode(lang));
        }
        url
    }
}

/// Map a non-2xx response to the most specific error kind.
fn classify_failure_status(status: StatusCode, response: &Response) -> WeatherError {
    match status.as_u16() {
        429 => {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(|secs| secs * 1000);

            warn!(?retry_after_ms, "OpenWeather rate limit exceeded (HTTP 429)");
            WeatherError::rate_limit("OpenWeather rate limit exceeded (HTTP 429)", retry_after_ms)
        }
        code @ (401 | 403) => {
            warn!(status = code, "OpenWeather rejected the API credential");
            WeatherError::config(format!(
                "OpenWeather rejected the API credential (HTTP {code}). Please check your API key and plan."
            ))
        }
        code => WeatherError::http(
            code,
            format!(
                "OpenWeather request failed with status: {} - {}",
                code,
                status.canonical_reason().unwrap_or("Unknown error")
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ErrorKind;

    fn test_config(base_url: String) -> WeatherConfig {
        WeatherConfig {
            api_key: Some("test_api_key_123".to_string()),
            base_url,
            units: "metric".to_string(),
            language: None,
            timeout_seconds: 5,
        }
    }

    fn madrid() -> Location {
        Location::new(40.4168, -3.7038)
    }

    #[test]
    fn test_new_requires_api_key() {
        let mut config = test_config("https://example.org".to_string());
        config.api_key = None;

        let result = OpenWeatherClient::new(&config);
        assert!(matches!(result, Err(WeatherError::Config(_))));
    }

    #[test]
    fn test_url_contains_required_parameters() {
        let client = OpenWeatherClient::new(&test_config("https://example.org/".to_string()))
            .expect("client");
        let url = client.build_one_call_url(&madrid());

        assert!(url.starts_with("https://example.org/onecall?"));
        assert!(url.contains("lat=40.4168"));
        assert!(url.contains("lon=-3.7038"));
        assert!(url.contains("appid=test_api_key_123"));
        assert!(url.contains("units=metric"));
        assert!(!url.contains("lang="));
    }

    #[test]
    fn test_url_includes_optional_language() {
        let mut config = test_config("https://example.org".to_string());
        config.language = Some("de".to_string());
        let client = OpenWeatherClient::new(&config).expect("client");

        let url = client.build_one_call_url(&madrid());
        assert!(url.ends_with("&lang=de"));
    }

    #[tokio::test]
    async fn test_fetch_parses_successful_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .and(query_param("appid", "test_api_key_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "lat": 40.4168,
                "lon": -3.7038,
                "timezone": "Europe/Madrid",
                "current": { "dt": 1700000000, "temp": 18.5 }
            })))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(&test_config(server.uri())).expect("client");
        let payload = client.fetch_one_call(&madrid()).await.expect("payload");

        assert_eq!(payload.lat, Some(40.4168));
        assert_eq!(payload.current.and_then(|c| c.temp), Some(18.5));
    }

    #[tokio::test]
    async fn test_429_maps_to_rate_limit_with_retry_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "60"))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(&test_config(server.uri())).expect("client");
        let error = client.fetch_one_call(&madrid()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::RateLimit);
        assert_eq!(error.status_code(), Some(429));
        assert_eq!(
            error.retry_after(),
            Some(std::time::Duration::from_secs(60))
        );
    }

    #[tokio::test]
    async fn test_429_without_header_has_no_retry_hint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(&test_config(server.uri())).expect("client");
        let error = client.fetch_one_call(&madrid()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::RateLimit);
        assert!(error.retry_after().is_none());
    }

    #[tokio::test]
    async fn test_401_maps_to_config_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(&test_config(server.uri())).expect("client");
        let error = client.fetch_one_call(&madrid()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Config);
    }

    #[tokio::test]
    async fn test_other_status_maps_to_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(&test_config(server.uri())).expect("client");
        let error = client.fetch_one_call(&madrid()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Http);
        assert_eq!(error.status_code(), Some(503));
    }

    #[tokio::test]
    async fn test_invalid_json_on_success_maps_to_contract_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/onecall"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
            .mount(&server)
            .await;

        let client = OpenWeatherClient::new(&test_config(server.uri())).expect("client");
        let error = client.fetch_one_call(&madrid()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Contract);
    }

    #[tokio::test]
    async fn test_unreachable_server_maps_to_network_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = OpenWeatherClient::new(&test_config(uri)).expect("client");
        let error = client.fetch_one_call(&madrid()).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Network);
    }
}
