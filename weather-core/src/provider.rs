use crate::{
    Config,
    error::{FetchError, WeatherError},
    model::Coordinate,
    provider::{opencage::OpenCageGeocoder, openmeteo::OpenMeteoArchive, openweather::OpenWeatherProvider},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod opencage;
pub mod openmeteo;
pub mod openweather;

/// OpenWeather reports wind in m/s under metric units.
pub(crate) const MPS_TO_KMH: f64 = 3.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    OpenMeteo,
    OpenCage,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::OpenCage => "opencage",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::OpenMeteo, ProviderId::OpenCage]
    }

    /// Open-Meteo's archive is free; a key is only used for the commercial tier.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderId::OpenMeteo)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "openmeteo" => Ok(ProviderId::OpenMeteo),
            "opencage" => Ok(ProviderId::OpenCage),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, openmeteo, opencage."
            )),
        }
    }
}

/// Current conditions as reported upstream; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentRaw {
    pub location_name: Option<String>,
    pub description: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

/// One day of an archive window. Sensor gaps show up as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDay {
    pub date: String,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalRaw {
    pub days: Vec<RawDay>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSample {
    /// Provider-local timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub local_time: String,
    pub description: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastRaw {
    pub samples: Vec<ForecastSample>,
}

#[async_trait]
pub trait CurrentProvider: Send + Sync + Debug {
    async fn fetch_current(&self, coord: Coordinate, lang: &str) -> Result<CurrentRaw, FetchError>;
}

#[async_trait]
pub trait HistoricalProvider: Send + Sync + Debug {
    /// Daily readings for `start..=end`.
    async fn fetch_historical_window(
        &self,
        coord: Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalRaw, FetchError>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch_forecast(&self, coord: Coordinate, lang: &str) -> Result<ForecastRaw, FetchError>;
}

#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Best match for a free-text place name, `None` when nothing matched.
    async fn geocode(&self, place: &str) -> Result<Option<Coordinate>, FetchError>;
}

/// The three upstreams an aggregation fans out to.
#[derive(Debug, Clone)]
pub struct Providers {
    pub current: Arc<dyn CurrentProvider>,
    pub historical: Arc<dyn HistoricalProvider>,
    pub forecast: Arc<dyn ForecastProvider>,
}

impl Providers {
    /// OpenWeather serves both current conditions and the forecast.
    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let http = Client::new();
        let openweather = Arc::new(OpenWeatherProvider::from_config(config)?.with_client(http.clone()));
        let archive = OpenMeteoArchive::from_config(config).with_client(http);

        Ok(Self {
            current: openweather.clone(),
            historical: Arc::new(archive),
            forecast: openweather,
        })
    }
}

/// Construct the geocoder from config; fails when no OpenCage key is set.
pub fn geocoder_from_config(config: &Config) -> Result<Box<dyn Geocoder>, WeatherError> {
    Ok(Box::new(OpenCageGeocoder::from_config(config)?))
}

/// Single round trip: send, check status, decode. No retries.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    provider: ProviderId,
    request: RequestBuilder,
) -> Result<T, FetchError> {
    let res = request
        .send()
        .await
        .map_err(|source| FetchError::Transport { provider, source })?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| FetchError::Transport { provider, source })?;

    if !status.is_success() {
        return Err(FetchError::Status {
            provider,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::Decode { provider, source })
}

pub(crate) fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
