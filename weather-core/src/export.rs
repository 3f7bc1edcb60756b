//! Flatten stored records into CSV or a JSON array of rows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::WeatherError, model::StoredRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "weather_data.csv",
            ExportFormat::Json => "weather_data.json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExportFormat {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(WeatherError::ClientInput(format!(
                "Unknown export format '{value}'. Supported formats: csv, json."
            ))),
        }
    }
}

/// One exported line. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "queriedAt")]
    pub queried_at: DateTime<Utc>,
    pub location: String,
    #[serde(rename = "current_weather.weather")]
    pub weather: String,
    #[serde(rename = "current_weather.temperature")]
    pub temperature: f64,
    #[serde(rename = "current_weather.wind_speed")]
    pub wind_speed: f64,
    #[serde(rename = "current_weather.humidity")]
    pub humidity: f64,
}

impl From<&StoredRecord> for ExportRow {
    fn from(stored: &StoredRecord) -> Self {
        let record = &stored.record;
        ExportRow {
            queried_at: record.queried_at,
            location: record.location.clone(),
            weather: record.current.weather_description.clone(),
            temperature: record.current.temperature_c,
            wind_speed: record.current.wind_speed_kmh,
            humidity: record.current.humidity_pct,
        }
    }
}

/// Serialize every record. An empty input is an error, not an empty file.
pub fn export(records: &[StoredRecord], format: ExportFormat) -> Result<Vec<u8>, WeatherError> {
    if records.is_empty() {
        return Err(WeatherError::NoData);
    }

    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();
    match format {
        ExportFormat::Csv => to_csv(&rows),
        ExportFormat::Json => {
            serde_json::to_vec_pretty(&rows).map_err(|e| WeatherError::Export(e.to_string()))
        }
    }
}

fn to_csv(rows: &[ExportRow]) -> Result<Vec<u8>, WeatherError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row).map_err(|e| WeatherError::Export(e.to_string()))?;
    }
    writer.into_inner().map_err(|e| WeatherError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompositeWeatherRecord, Coordinate, CurrentSnapshot, PastDay, UserId};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn stored(location: &str) -> StoredRecord {
        StoredRecord {
            id: Uuid::new_v4(),
            record: CompositeWeatherRecord {
                user: UserId::Raw("u".into()),
                location: location.to_string(),
                coordinate: Coordinate::new(1.0, 2.0),
                current: CurrentSnapshot::with_defaults(Some("light rain".into()), Some(14.5), Some(80.0), None),
                past: vec![PastDay::no_data()],
                future: vec![],
                queried_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap(),
            },
        }
    }

    #[test]
    fn empty_store_is_reported_as_no_data() {
        for format in [ExportFormat::Csv, ExportFormat::Json] {
            let err = export(&[], format).unwrap_err();
            assert!(matches!(err, WeatherError::NoData));
            assert_eq!(err.category(), "no_data");
        }
    }

    #[test]
    fn csv_has_fixed_column_order() {
        let bytes = export(&[stored("Oslo"), stored("Bergen, NO")], ExportFormat::Csv).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "queriedAt,location,current_weather.weather,current_weather.temperature,current_weather.wind_speed,current_weather.humidity"
        );
        assert_eq!(lines[1], "2024-05-01T08:30:00Z,Oslo,light rain,14.5,0.7,80.0");
        assert!(lines[2].contains("\"Bergen, NO\""));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_rows_match_csv_columns() {
        let bytes = export(&[stored("Oslo")], ExportFormat::Json).unwrap();
        let rows: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(rows.as_array().unwrap().len(), 1);
        assert_eq!(rows[0]["location"], "Oslo");
        assert_eq!(rows[0]["current_weather.wind_speed"], 0.7);
        assert_eq!(rows[0]["queriedAt"], "2024-05-01T08:30:00Z");
    }

    #[test]
    fn format_parsing() {
        assert_eq!(ExportFormat::try_from("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::try_from("json").unwrap().default_file_name(), "weather_data.json");
        assert!(ExportFormat::try_from("xml").is_err());
    }
}
