use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    Config,
    error::{FetchError, WeatherError},
    model::Coordinate,
    provider::{Geocoder, ProviderId, fetch_json, trim_base_url},
};

const DEFAULT_BASE_URL: &str = "https://api.opencagedata.com";

/// Forward geocoding through OpenCage.
#[derive(Debug, Clone)]
pub struct OpenCageGeocoder {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenCageGeocoder {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let api_key = config.require_api_key(ProviderId::OpenCage)?;
        let geocoder = Self::new(api_key.to_owned());

        Ok(match config.provider_base_url(ProviderId::OpenCage) {
            Some(url) => geocoder.with_base_url(url),
            None => geocoder,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

#[derive(Debug, Deserialize)]
struct OcGeometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OcResult {
    geometry: OcGeometry,
}

#[derive(Debug, Deserialize)]
struct OcResponse {
    #[serde(default)]
    results: Vec<OcResult>,
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinate>, FetchError> {
        let url = format!("{}/geocode/v1/json", self.base_url);
        debug!(%url, place, "Fetching coordinates");

        let request = self.http.get(url).query(&[
            ("q", place),
            ("key", self.api_key.as_str()),
            ("limit", "1"),
        ]);
        let parsed: OcResponse = fetch_json(ProviderId::OpenCage, request).await?;

        Ok(parsed
            .results
            .into_iter()
            .next()
            .map(|r| Coordinate::new(r.geometry.lat, r.geometry.lng)))
    }
}
