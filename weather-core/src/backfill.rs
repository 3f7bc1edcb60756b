//! Historical backfill: walk progressively older archive windows until enough
//! complete days are collected or the attempt budget runs out.
//!
//! Per-day sensor gaps are tolerated (the day is dropped), but an outright
//! fetch failure or an empty window aborts the whole search and yields the
//! single-entry "No Data" sentinel, discarding anything collected so far.

use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::{
    model::{Coordinate, PastDay, Reading},
    provider::{HistoricalProvider, RawDay},
};

/// Complete past days wanted per record.
pub const TARGET_DAYS: usize = 3;
/// Hard ceiling on archive round trips per resolution.
pub const MAX_ATTEMPTS: u32 = 10;
const WINDOW_SPAN_DAYS: i64 = 3;

/// Window requested on `attempt`: `[today - (attempt + 3), today - attempt]`.
pub fn window_for_attempt(today: NaiveDate, attempt: u32) -> (NaiveDate, NaiveDate) {
    let end = today - Duration::days(i64::from(attempt));
    let start = end - Duration::days(WINDOW_SPAN_DAYS);
    (start, end)
}

/// Collect up to [`TARGET_DAYS`] complete past days.
///
/// Returns the days in acceptance order (not re-sorted by date), or the
/// one-entry sentinel when nothing usable was found.
pub async fn resolve_past_days(
    provider: &dyn HistoricalProvider,
    coord: Coordinate,
    today: NaiveDate,
) -> Vec<PastDay> {
    let mut collected: Vec<PastDay> = Vec::with_capacity(TARGET_DAYS);
    let mut attempt = 0;

    while collected.len() < TARGET_DAYS && attempt < MAX_ATTEMPTS {
        let (start, end) = window_for_attempt(today, attempt);

        let window = match provider.fetch_historical_window(coord, start, end).await {
            Ok(window) => window,
            Err(err) => {
                warn!(attempt, %start, %end, error = %err, "Historical fetch failed, abandoning backfill");
                return vec![PastDay::no_data()];
            }
        };

        if window.days.is_empty() {
            warn!(attempt, %start, %end, "Historical window returned no days, abandoning backfill");
            return vec![PastDay::no_data()];
        }

        let received = window.days.len();
        for day in window.days.into_iter().filter_map(accept_day) {
            // Consecutive windows overlap by all but one day.
            if !collected.iter().any(|d| d.date == day.date) {
                collected.push(day);
            }
        }
        collected.truncate(TARGET_DAYS);

        debug!(attempt, %start, %end, received, collected = collected.len(), "Historical window merged");
        attempt += 1;
    }

    if collected.is_empty() {
        warn!(attempts = attempt, "No complete historical days found");
        vec![PastDay::no_data()]
    } else {
        collected
    }
}

/// A day needs max, min and weather code; missing precipitation counts as 0.
fn accept_day(day: RawDay) -> Option<PastDay> {
    let (Some(max), Some(min), Some(code)) =
        (day.temperature_max, day.temperature_min, day.weather_code)
    else {
        return None;
    };

    Some(PastDay {
        date: day.date,
        temperature_max: Reading::Value(max),
        temperature_min: Reading::Value(min),
        precipitation: Reading::Value(day.precipitation.unwrap_or(0.0)),
        weather_code: Reading::Value(code),
    })
}
