use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    Config,
    error::FetchError,
    model::Coordinate,
    provider::{HistoricalProvider, HistoricalRaw, ProviderId, RawDay, fetch_json, trim_base_url},
};

const DEFAULT_BASE_URL: &str = "https://archive-api.open-meteo.com";
const DAILY_FIELDS: &str = "temperature_2m_max,temperature_2m_min,precipitation_sum,weathercode";

/// Open-Meteo historical archive.
#[derive(Debug, Clone)]
pub struct OpenMeteoArchive {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl Default for OpenMeteoArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoArchive {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut archive = Self::new();
        archive.api_key = config.provider_api_key(ProviderId::OpenMeteo).map(str::to_owned);
        match config.provider_base_url(ProviderId::OpenMeteo) {
            Some(url) => archive.with_base_url(url),
            None => archive,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }
}

/// Parallel arrays indexed by day; any reading may be null.
#[derive(Debug, Default, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<i64>>,
}

#[derive(Debug, Deserialize)]
struct OmArchiveResponse {
    daily: Option<OmDaily>,
}

fn at<T: Copy>(values: &[Option<T>], index: usize) -> Option<T> {
    values.get(index).copied().flatten()
}

impl From<OmDaily> for HistoricalRaw {
    fn from(daily: OmDaily) -> Self {
        let days = daily
            .time
            .iter()
            .enumerate()
            .map(|(i, date)| RawDay {
                date: date.clone(),
                temperature_max: at(&daily.temperature_2m_max, i),
                temperature_min: at(&daily.temperature_2m_min, i),
                precipitation: at(&daily.precipitation_sum, i),
                weather_code: at(&daily.weathercode, i),
            })
            .collect();

        HistoricalRaw { days }
    }
}

#[async_trait]
impl HistoricalProvider for OpenMeteoArchive {
    async fn fetch_historical_window(
        &self,
        coord: Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalRaw, FetchError> {
        let url = format!("{}/v1/archive", self.base_url);
        debug!(%url, %start, %end, "Fetching Open-Meteo archive window");

        let mut query = vec![
            ("latitude", coord.lat.to_string()),
            ("longitude", coord.lon.to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
            ("daily", DAILY_FIELDS.to_string()),
            ("timezone", "auto".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }

        let parsed: OmArchiveResponse =
            fetch_json(ProviderId::OpenMeteo, self.http.get(url).query(&query)).await?;

        Ok(parsed.daily.map(HistoricalRaw::from).unwrap_or_default())
    }
}
