use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use super::http_client::{HttpClient, RetryPolicy};
use crate::app::ports::{ElevationProvider, ProviderKind};
use crate::config::ElevationConfig;
use crate::domain::Coordinates;
use crate::error::{Result, ScraperError};

#[derive(Debug, Deserialize)]
struct ElevationResultDto {
    elevation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OpenTopoResponseDto {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<ElevationResultDto>,
}

#[derive(Debug, Deserialize)]
struct OpenElevationResponseDto {
    #[serde(default)]
    results: Vec<ElevationResultDto>,
}

#[derive(Debug, Serialize)]
struct OpenElevationLocation {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
struct OpenElevationRequest {
    locations: Vec<OpenElevationLocation>,
}

/// OpenTopoData answers with a status field; anything but "OK" is a failed lookup
pub fn parse_opentopo(body: &[u8]) -> Result<Option<f64>> {
    let response: OpenTopoResponseDto = serde_json::from_slice(body)?;
    if response.status != "OK" {
        return Err(ScraperError::api(format!(
            "OpenTopoData status {}: {}",
            response.status,
            response.error.unwrap_or_default()
        )));
    }
    Ok(response.results.first().and_then(|result| result.elevation))
}

pub fn parse_open_elevation(body: &[u8]) -> Result<Option<f64>> {
    let response: OpenElevationResponseDto = serde_json::from_slice(body)?;
    Ok(response.results.first().and_then(|result| result.elevation))
}

/// `GET {url}?locations=lat,lon` against an OpenTopoData dataset (SRTM 30 m by default)
pub struct OpenTopoDataProvider {
    http: HttpClient,
    url: String,
}

impl OpenTopoDataProvider {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[async_trait]
impl ElevationProvider for OpenTopoDataProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenTopoData
    }

    #[instrument(skip(self), fields(provider = "opentopo"))]
    async fn lookup(&self, coordinates: Coordinates) -> Result<Option<f64>> {
        let request = self
            .http
            .inner()
            .get(&self.url)
            .query(&[("locations", coordinates.to_string())]);
        let response = self.http.send(request).await?;
        let body = response.bytes().await?;
        parse_opentopo(&body)
    }
}

/// `POST {"locations":[{latitude, longitude}]}` against an Open-Elevation server
pub struct OpenElevationProvider {
    http: HttpClient,
    url: String,
}

impl OpenElevationProvider {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

#[async_trait]
impl ElevationProvider for OpenElevationProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenElevation
    }

    #[instrument(skip(self), fields(provider = "open-elevation"))]
    async fn lookup(&self, coordinates: Coordinates) -> Result<Option<f64>> {
        let payload = OpenElevationRequest {
            locations: vec![OpenElevationLocation {
                latitude: coordinates.lat,
                longitude: coordinates.lon,
            }],
        };
        let request = self.http.inner().post(&self.url).json(&payload);
        let response = self.http.send(request).await?;
        let body = response.bytes().await?;
        parse_open_elevation(&body)
    }
}

/// Build the configured provider. Lookups are never retried: a failure passes the element through.
pub fn provider_for(config: &ElevationConfig) -> Result<Arc<dyn ElevationProvider>> {
    let http = HttpClient::new(Duration::from_secs(config.timeout_seconds), RetryPolicy::none())?;
    let provider: Arc<dyn ElevationProvider> = match config.provider {
        ProviderKind::OpenTopoData => Arc::new(OpenTopoDataProvider::new(http, &config.opentopo_url)),
        ProviderKind::OpenElevation => {
            Arc::new(OpenElevationProvider::new(http, &config.open_elevation_url))
        }
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opentopo_ok_response() {
        let body = br#"{"results":[{"dataset":"srtm30m","elevation":850.3,"location":{"lat":45.5,"lng":25.45}}],"status":"OK"}"#;
        assert_eq!(parse_opentopo(body).unwrap(), Some(850.3));
    }

    #[test]
    fn test_opentopo_null_elevation_is_no_value() {
        let body = br#"{"results":[{"elevation":null}],"status":"OK"}"#;
        assert_eq!(parse_opentopo(body).unwrap(), None);
    }

    #[test]
    fn test_opentopo_error_status_is_a_failure() {
        let body = br#"{"error":"Too many requests","status":"INVALID_REQUEST"}"#;
        let error = parse_opentopo(body).unwrap_err();
        assert!(error.to_string().contains("Too many requests"));
    }

    #[test]
    fn test_open_elevation_response() {
        let body = br#"{"results":[{"latitude":45.5,"longitude":25.45,"elevation":1204}]}"#;
        assert_eq!(parse_open_elevation(body).unwrap(), Some(1204.0));
        assert_eq!(parse_open_elevation(br#"{"results":[]}"#).unwrap(), None);
    }

    #[test]
    fn test_open_elevation_request_shape() {
        let payload = OpenElevationRequest {
            locations: vec![OpenElevationLocation {
                latitude: 45.5,
                longitude: 25.45,
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({"locations": [{"latitude": 45.5, "longitude": 25.45}]})
        );
    }

    #[test]
    fn test_provider_for_honours_config() {
        let mut config = ElevationConfig::default();
        assert_eq!(provider_for(&config).unwrap().kind(), ProviderKind::OpenTopoData);
        config.provider = ProviderKind::OpenElevation;
        assert_eq!(provider_for(&config).unwrap().kind(), ProviderKind::OpenElevation);
    }
}
