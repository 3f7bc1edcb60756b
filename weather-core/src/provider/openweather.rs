use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    Config,
    error::{FetchError, WeatherError},
    model::Coordinate,
    provider::{
        CurrentProvider, CurrentRaw, ForecastProvider, ForecastRaw, ForecastSample, MPS_TO_KMH,
        ProviderId, fetch_json, trim_base_url,
    },
};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let api_key = config.require_api_key(ProviderId::OpenWeather)?;
        let provider = Self::new(api_key.to_owned());

        Ok(match config.provider_base_url(ProviderId::OpenWeather) {
            Some(url) => provider.with_base_url(url),
            None => provider,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    fn request(&self, endpoint: &str, coord: Coordinate, lang: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/data/2.5/{endpoint}", self.base_url);
        debug!(%url, lat = coord.lat, lon = coord.lon, lang, "Fetching OpenWeather {endpoint}");

        self.http.get(url).query(&[
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("units", "metric".to_string()),
            ("lang", lang.to_string()),
            ("appid", self.api_key.clone()),
        ])
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: Option<String>,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: Option<OwMain>,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

fn first_description(weather: Vec<OwWeather>) -> Option<String> {
    weather.into_iter().next().and_then(|w| w.description)
}

fn wind_kmh(wind: Option<OwWind>) -> Option<f64> {
    wind.and_then(|w| w.speed).map(|mps| mps * MPS_TO_KMH)
}

impl From<OwCurrentResponse> for CurrentRaw {
    fn from(parsed: OwCurrentResponse) -> Self {
        CurrentRaw {
            location_name: parsed.name.filter(|n| !n.trim().is_empty()),
            description: first_description(parsed.weather),
            temperature_c: parsed.main.as_ref().and_then(|m| m.temp),
            humidity_pct: parsed.main.as_ref().and_then(|m| m.humidity),
            wind_speed_kmh: wind_kmh(parsed.wind),
        }
    }
}

impl From<OwForecastEntry> for ForecastSample {
    fn from(entry: OwForecastEntry) -> Self {
        ForecastSample {
            local_time: entry.dt_txt,
            description: first_description(entry.weather),
            temperature_c: entry.main.as_ref().and_then(|m| m.temp),
            humidity_pct: entry.main.as_ref().and_then(|m| m.humidity),
            wind_speed_kmh: wind_kmh(entry.wind),
        }
    }
}

#[async_trait]
impl CurrentProvider for OpenWeatherProvider {
    async fn fetch_current(&self, coord: Coordinate, lang: &str) -> Result<CurrentRaw, FetchError> {
        let parsed: OwCurrentResponse =
            fetch_json(ProviderId::OpenWeather, self.request("weather", coord, lang)).await?;
        Ok(parsed.into())
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    async fn fetch_forecast(&self, coord: Coordinate, lang: &str) -> Result<ForecastRaw, FetchError> {
        let parsed: OwForecastResponse =
            fetch_json(ProviderId::OpenWeather, self.request("forecast", coord, lang)).await?;

        Ok(ForecastRaw {
            samples: parsed.list.into_iter().map(ForecastSample::from).collect(),
        })
    }
}
