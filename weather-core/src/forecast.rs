use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use crate::{
    model::{FutureDay, NO_DATA},
    provider::{ForecastRaw, ForecastSample},
};

/// Number of upcoming days kept per record.
pub const FORECAST_DAYS: usize = 2;
const PROVIDER_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn is_midday(at: &NaiveDateTime) -> bool {
    at.hour() == 12 && at.minute() == 0 && at.second() == 0
}

/// Keep the first [`FORECAST_DAYS`] samples taken at local noon, oldest first.
///
/// Returns an empty vec when the series has no noon sample at all.
pub fn select_midday(raw: ForecastRaw) -> Vec<FutureDay> {
    let mut midday: Vec<(NaiveDateTime, ForecastSample)> = raw
        .samples
        .into_iter()
        .filter_map(|sample| match NaiveDateTime::parse_from_str(&sample.local_time, PROVIDER_TIME_FORMAT) {
            Ok(at) => is_midday(&at).then_some((at, sample)),
            Err(err) => {
                debug!(local_time = %sample.local_time, error = %err, "Skipping forecast sample with unreadable time");
                None
            }
        })
        .collect();

    midday.sort_by_key(|(at, _)| *at);

    midday
        .into_iter()
        .take(FORECAST_DAYS)
        .map(|(at, sample)| FutureDay {
            date: at.date().format("%Y-%m-%d").to_string(),
            weather_description: sample.description.unwrap_or_else(|| NO_DATA.to_string()),
            temperature_c: sample.temperature_c,
            humidity_pct: sample.humidity_pct,
            wind_speed_kmh: sample.wind_speed_kmh,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{five_day_series, sample};
    use chrono::NaiveDate;

    #[test]
    fn five_day_series_yields_two_noon_samples_in_order() {
        let raw = five_day_series(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(raw.samples.len(), 40);

        let future = select_midday(raw);

        let dates: Vec<_> = future.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, ["2024-05-01", "2024-05-02"]);
        assert_eq!(future[0].weather_description, "few clouds");
        assert_eq!(future[0].temperature_c, Some(18.0));
    }

    #[test]
    fn series_without_noon_is_empty() {
        let raw = ForecastRaw {
            samples: vec![sample("2024-05-01 09:00:00"), sample("2024-05-01 15:00:00")],
        };
        assert!(select_midday(raw).is_empty());
    }

    #[test]
    fn out_of_order_samples_are_sorted_before_taking() {
        let raw = ForecastRaw {
            samples: vec![
                sample("2024-05-03 12:00:00"),
                sample("not a time"),
                sample("2024-05-02 12:00:00"),
                sample("2024-05-04 12:00:00"),
            ],
        };

        let dates: Vec<_> = select_midday(raw).into_iter().map(|d| d.date).collect();
        assert_eq!(dates, ["2024-05-02", "2024-05-03"]);
    }

    #[test]
    fn missing_description_becomes_no_data() {
        let mut noon = sample("2024-05-01 12:00:00");
        noon.description = None;
        noon.wind_speed_kmh = None;

        let future = select_midday(ForecastRaw { samples: vec![noon] });

        assert_eq!(future.len(), 1);
        assert_eq!(future[0].weather_description, NO_DATA);
        assert_eq!(future[0].wind_speed_kmh, None);
    }
}
