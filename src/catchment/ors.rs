//! OpenRouteService isochrone client.

use anyhow::{Context, Result};
use geo::Point;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{IsochroneProvider, IsochroneResponse};
use crate::config::RoutingConfig;
use crate::error::ProviderError;
use crate::models::Crs;

#[derive(Debug, Serialize)]
struct IsochroneRequest {
    locations: Vec<[f64; 2]>,
    range: Vec<u32>,
    range_type: &'static str,
}

/// Isochrones from the OpenRouteService v2 API
pub struct OpenRouteService {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl OpenRouteService {
    pub fn new(config: &RoutingConfig) -> Result<Self> {
        let api_key = config.resolved_api_key().with_context(|| {
            format!(
                "No OpenRouteService API key: set routing.api_key or {}",
                crate::config::API_KEY_ENV
            )
        })?;

        let client = Client::builder()
            .user_agent("healthreach/0.1 (catchment analysis)")
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: isochrone_endpoint(&config.base_url, &config.profile)?,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `{base_url}/v2/isochrones/{profile}`, keeping any path prefix of the base URL
fn isochrone_endpoint(base_url: &str, profile: &str) -> Result<Url> {
    let mut base = base_url.trim_end_matches('/').to_string();
    base.push('/');
    let base = Url::parse(&base).with_context(|| format!("Invalid routing base URL: {}", base_url))?;
    base.join(&format!("v2/isochrones/{}", profile))
        .with_context(|| format!("Invalid routing profile: {}", profile))
}

impl IsochroneProvider for OpenRouteService {
    fn crs(&self) -> Crs {
        Crs::wgs84()
    }

    async fn isochrone(
        &self,
        location: Point<f64>,
        time_budget_secs: u32,
    ) -> Result<IsochroneResponse, ProviderError> {
        let body = IsochroneRequest {
            locations: vec![[location.x(), location.y()]],
            range: vec![time_budget_secs],
            range_type: "time",
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/json, application/geo+json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let isochrone = response.json::<IsochroneResponse>().await.map_err(|e| {
            if e.is_decode() {
                ProviderError::Malformed(e.to_string())
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        debug!(
            "Isochrone at ({}, {}) returned {} features",
            location.x(),
            location.y(),
            isochrone.features.len()
        );
        Ok(isochrone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let url = isochrone_endpoint("https://api.openrouteservice.org", "driving-car").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.openrouteservice.org/v2/isochrones/driving-car"
        );

        let url = isochrone_endpoint("http://localhost:8080/ors/", "cycling-regular").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/ors/v2/isochrones/cycling-regular"
        );

        assert!(isochrone_endpoint("not a url", "driving-car").is_err());
    }

    #[test]
    fn test_request_body() {
        let body = IsochroneRequest {
            locations: vec![[88.5, 23.4]],
            range: vec![1800],
            range_type: "time",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"locations": [[88.5, 23.4]], "range": [1800], "range_type": "time"})
        );
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let config = RoutingConfig {
            api_key: Some("  ".to_string()),
            ..RoutingConfig::default()
        };
        // a blank configured key falls through to the environment
        if std::env::var(crate::config::API_KEY_ENV).is_err() {
            assert!(OpenRouteService::new(&config).is_err());
        }
    }
}
