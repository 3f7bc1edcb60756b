use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

use crate::error::WeatherError;

/// Marker stored in place of a reading the upstream could not supply.
pub const NO_DATA: &str = "No Data";
/// Date stored on sentinel past/future entries.
pub const NOT_AVAILABLE: &str = "N/A";
/// Location used when the current-conditions provider reports no place name.
pub const UNKNOWN_LOCATION: &str = "Unknown";
/// Wind speed recorded when the provider omits it. Nonzero so that
/// "no wind data" stays distinguishable from a calm reading.
pub const DEFAULT_WIND_SPEED_KMH: f64 = 0.7;
pub const DEFAULT_LANG: &str = "en";

/// Store-assigned record identifier.
pub type RecordId = Uuid;

pub fn parse_record_id(raw: &str) -> Result<RecordId, WeatherError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| WeatherError::ClientInput(format!("Invalid record id '{raw}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Owner of a record: either a free-form identifier or a reference to a
/// store-native id. Serialized as a plain string either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    StoreRef(Uuid),
    Raw(String),
}

impl UserId {
    pub fn parse(raw: &str) -> Self {
        match Uuid::parse_str(raw) {
            Ok(id) => UserId::StoreRef(id),
            Err(_) => UserId::Raw(raw.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, UserId::Raw(s) if s.trim().is_empty())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::StoreRef(id) => write!(f, "{id}"),
            UserId::Raw(s) => f.write_str(s),
        }
    }
}

/// A numeric reading that may have been replaced by the [`NO_DATA`] marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Value(T),
    NoData,
}

impl<T: Serialize> Serialize for Reading<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Value(v) => v.serialize(serializer),
            Reading::NoData => serializer.serialize_str(NO_DATA),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Reading<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr<T> {
            Value(T),
            Marker(String),
        }

        match Repr::<T>::deserialize(deserializer)? {
            Repr::Value(v) => Ok(Reading::Value(v)),
            Repr::Marker(s) if s == NO_DATA => Ok(Reading::NoData),
            Repr::Marker(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"{NO_DATA}\", got \"{s}\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentSnapshot {
    #[serde(rename = "weather")]
    pub weather_description: String,
    #[serde(rename = "temperature")]
    pub temperature_c: f64,
    #[serde(rename = "humidity")]
    pub humidity_pct: f64,
    #[serde(rename = "wind_speed")]
    pub wind_speed_kmh: f64,
}

impl CurrentSnapshot {
    /// Builds a snapshot, filling each missing field with its own default.
    pub fn with_defaults(
        weather_description: Option<String>,
        temperature_c: Option<f64>,
        humidity_pct: Option<f64>,
        wind_speed_kmh: Option<f64>,
    ) -> Self {
        Self {
            weather_description: weather_description
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| NO_DATA.to_string()),
            temperature_c: temperature_c.unwrap_or(0.0),
            humidity_pct: humidity_pct.unwrap_or(0.0),
            wind_speed_kmh: wind_speed_kmh.unwrap_or(DEFAULT_WIND_SPEED_KMH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastDay {
    pub date: String,
    pub temperature_max: Reading<f64>,
    pub temperature_min: Reading<f64>,
    pub precipitation: Reading<f64>,
    pub weather_code: Reading<i64>,
}

impl PastDay {
    pub fn no_data() -> Self {
        Self {
            date: NOT_AVAILABLE.to_string(),
            temperature_max: Reading::NoData,
            temperature_min: Reading::NoData,
            precipitation: Reading::NoData,
            weather_code: Reading::NoData,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureDay {
    pub date: String,
    #[serde(rename = "weather")]
    pub weather_description: String,
    #[serde(rename = "temperature", default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "humidity", default, skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<f64>,
    #[serde(rename = "wind_speed", default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_kmh: Option<f64>,
}

impl FutureDay {
    pub fn no_data() -> Self {
        Self {
            date: NOT_AVAILABLE.to_string(),
            weather_description: NO_DATA.to_string(),
            temperature_c: None,
            humidity_pct: None,
            wind_speed_kmh: None,
        }
    }
}

/// The merged result of one aggregation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeWeatherRecord {
    pub user: UserId,
    pub location: String,
    #[serde(rename = "coordinates")]
    pub coordinate: Coordinate,
    #[serde(rename = "current_weather")]
    pub current: CurrentSnapshot,
    #[serde(rename = "past_weather")]
    pub past: Vec<PastDay>,
    #[serde(rename = "future_weather")]
    pub future: Vec<FutureDay>,
    #[serde(rename = "queriedAt")]
    pub queried_at: DateTime<Utc>,
}

/// A record as held by the store, with its assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub record: CompositeWeatherRecord,
}

#[derive(Debug, Clone)]
pub struct AggregationRequest {
    pub coordinate: Coordinate,
    pub user: UserId,
    pub lang: Option<String>,
}

impl AggregationRequest {
    pub fn new(lat: f64, lon: f64, user: &str) -> Self {
        Self {
            coordinate: Coordinate::new(lat, lon),
            user: UserId::parse(user),
            lang: None,
        }
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn lang(&self) -> &str {
        self.lang
            .as_deref()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_LANG)
    }

    /// Rejects requests that must not reach any upstream.
    pub fn validate(&self) -> Result<(), WeatherError> {
        if !self.coordinate.lat.is_finite() || !self.coordinate.lon.is_finite() {
            return Err(WeatherError::ClientInput(
                "Latitude and longitude are required".to_string(),
            ));
        }
        if self.user.is_blank() {
            return Err(WeatherError::ClientInput("userId is required".to_string()));
        }
        Ok(())
    }
}

/// Input of the manual create path.
#[derive(Debug, Clone)]
pub struct ManualRecord {
    pub user: UserId,
    pub location: String,
    pub weather_description: String,
    pub temperature_c: f64,
    pub wind_speed_kmh: Option<f64>,
    pub humidity_pct: Option<f64>,
}

impl ManualRecord {
    pub fn validate(&self) -> Result<(), WeatherError> {
        if self.location.trim().is_empty()
            || self.weather_description.trim().is_empty()
            || !self.temperature_c.is_finite()
            || self.user.is_blank()
        {
            return Err(WeatherError::ClientInput(
                "Location, weather, temperature, and userId are required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_record(self, queried_at: DateTime<Utc>) -> CompositeWeatherRecord {
        CompositeWeatherRecord {
            user: self.user,
            location: self.location,
            coordinate: Coordinate::new(0.0, 0.0),
            current: CurrentSnapshot::with_defaults(
                Some(self.weather_description),
                Some(self.temperature_c),
                self.humidity_pct,
                self.wind_speed_kmh,
            ),
            past: Vec::new(),
            future: Vec::new(),
            queried_at,
        }
    }
}

/// Partial edit of a stored record. Only location and current fields are editable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub location: Option<String>,
    pub weather_description: Option<String>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self == &RecordPatch::default()
    }

    pub fn apply(&self, record: &mut CompositeWeatherRecord) {
        if let Some(location) = &self.location {
            record.location = location.clone();
        }
        if let Some(weather) = &self.weather_description {
            record.current.weather_description = weather.clone();
        }
        if let Some(t) = self.temperature_c {
            record.current.temperature_c = t;
        }
        if let Some(h) = self.humidity_pct {
            record.current.humidity_pct = h;
        }
        if let Some(w) = self.wind_speed_kmh {
            record.current.wind_speed_kmh = w;
        }
    }
}
