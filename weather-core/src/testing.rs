//! Hand-written upstream fakes for unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

use crate::{
    error::FetchError,
    model::Coordinate,
    provider::{
        CurrentProvider, CurrentRaw, ForecastProvider, ForecastRaw, ForecastSample, Geocoder,
        HistoricalProvider, HistoricalRaw, ProviderId, Providers, RawDay,
    },
};

pub(crate) fn upstream_error(provider: ProviderId) -> FetchError {
    FetchError::Status { provider, status: 503, body: "service unavailable".into() }
}

pub(crate) fn full_day(date: NaiveDate) -> RawDay {
    RawDay {
        date: date.to_string(),
        temperature_max: Some(20.0),
        temperature_min: Some(10.0),
        precipitation: Some(1.5),
        weather_code: Some(3),
    }
}

pub(crate) fn null_day(date: NaiveDate) -> RawDay {
    RawDay { date: date.to_string(), ..Default::default() }
}

/// Every day in `start..=end`, built by `make`.
pub(crate) fn window(
    start: NaiveDate,
    end: NaiveDate,
    make: impl Fn(NaiveDate) -> RawDay,
) -> HistoricalRaw {
    HistoricalRaw { days: start.iter_days().take_while(|d| *d <= end).map(make).collect() }
}

/// Archive whose answer is computed from (attempt, start, end).
pub(crate) struct FnArchive<F> {
    respond: F,
    calls: AtomicU32,
}

impl<F> FnArchive<F>
where
    F: Fn(u32, NaiveDate, NaiveDate) -> Result<HistoricalRaw, FetchError> + Send + Sync,
{
    pub(crate) fn new(respond: F) -> Self {
        Self { respond, calls: AtomicU32::new(0) }
    }
}

impl<F> FnArchive<F> {
    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> fmt::Debug for FnArchive<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnArchive").field("calls", &self.calls()).finish()
    }
}

#[async_trait]
impl<F> HistoricalProvider for FnArchive<F>
where
    F: Fn(u32, NaiveDate, NaiveDate) -> Result<HistoricalRaw, FetchError> + Send + Sync,
{
    async fn fetch_historical_window(
        &self,
        _coord: Coordinate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalRaw, FetchError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.respond)(attempt, start, end)
    }
}

/// Current-conditions fake; `None` simulates an outright upstream failure.
#[derive(Debug, Default)]
pub(crate) struct StaticCurrent {
    pub(crate) raw: Option<CurrentRaw>,
    pub(crate) calls: AtomicU32,
}

#[async_trait]
impl CurrentProvider for StaticCurrent {
    async fn fetch_current(&self, _coord: Coordinate, _lang: &str) -> Result<CurrentRaw, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.raw.clone().ok_or_else(|| upstream_error(ProviderId::OpenWeather))
    }
}

#[derive(Debug, Default)]
pub(crate) struct StaticForecast {
    pub(crate) raw: Option<ForecastRaw>,
}

#[async_trait]
impl ForecastProvider for StaticForecast {
    async fn fetch_forecast(&self, _coord: Coordinate, _lang: &str) -> Result<ForecastRaw, FetchError> {
        self.raw.clone().ok_or_else(|| upstream_error(ProviderId::OpenWeather))
    }
}

/// `Err` when `fail` is set, otherwise the configured match (or none).
#[derive(Debug, Default)]
pub(crate) struct StaticGeocoder {
    pub(crate) hit: Option<Coordinate>,
    pub(crate) fail: bool,
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, _place: &str) -> Result<Option<Coordinate>, FetchError> {
        if self.fail {
            return Err(upstream_error(ProviderId::OpenCage));
        }
        Ok(self.hit)
    }
}

pub(crate) fn sunny_current() -> CurrentRaw {
    CurrentRaw {
        location_name: Some("New York".into()),
        description: Some("clear sky".into()),
        temperature_c: Some(22.0),
        humidity_pct: Some(55.0),
        wind_speed_kmh: Some(12.6),
    }
}

pub(crate) fn sample(local_time: &str) -> ForecastSample {
    ForecastSample {
        local_time: local_time.to_string(),
        description: Some("few clouds".into()),
        temperature_c: Some(18.0),
        humidity_pct: Some(60.0),
        wind_speed_kmh: Some(9.0),
    }
}

/// 5 days of 3-hourly samples starting at `first_day 00:00`.
pub(crate) fn five_day_series(first_day: NaiveDate) -> ForecastRaw {
    let samples = first_day
        .iter_days()
        .take(5)
        .flat_map(|day| (0..24).step_by(3).map(move |h| format!("{day} {h:02}:00:00")))
        .map(|t| sample(&t))
        .collect();
    ForecastRaw { samples }
}

pub(crate) fn providers(
    current: Option<CurrentRaw>,
    historical: Arc<dyn HistoricalProvider>,
    forecast: Option<ForecastRaw>,
) -> Providers {
    Providers {
        current: Arc::new(StaticCurrent { raw: current, calls: AtomicU32::new(0) }),
        historical,
        forecast: Arc::new(StaticForecast { raw: forecast }),
    }
}
