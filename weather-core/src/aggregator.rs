//! Fan out to the three upstreams and merge their results into one record.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use crate::{
    backfill::resolve_past_days,
    error::WeatherError,
    forecast::select_midday,
    model::{AggregationRequest, CompositeWeatherRecord, CurrentSnapshot, FutureDay, PastDay, UNKNOWN_LOCATION},
    provider::{CurrentRaw, Providers},
};

/// Run all three branches concurrently and compose the record.
///
/// Current conditions are mandatory: if that fetch fails the other branches
/// are dropped and nothing is produced. Past and future degrade to sentinels.
pub async fn aggregate(
    providers: &Providers,
    request: &AggregationRequest,
    today: NaiveDate,
) -> Result<CompositeWeatherRecord, WeatherError> {
    let coord = request.coordinate;
    let lang = request.lang();

    let current = async {
        providers
            .current
            .fetch_current(coord, lang)
            .await
            .map_err(WeatherError::from)
    };

    let past = async {
        Ok::<_, WeatherError>(resolve_past_days(providers.historical.as_ref(), coord, today).await)
    };

    let future = async {
        let selected = match providers.forecast.fetch_forecast(coord, lang).await {
            Ok(raw) => select_midday(raw),
            Err(err) => {
                warn!(error = %err, "Forecast fetch failed, storing placeholder");
                Vec::new()
            }
        };
        Ok::<_, WeatherError>(selected)
    };

    let (current, past, future) = tokio::try_join!(current, past, future)?;

    let record = compose(request, current, past, future, Utc::now());
    info!(
        location = %record.location,
        past_days = record.past.len(),
        future_days = record.future.len(),
        "Aggregated weather"
    );
    Ok(record)
}

/// Apply per-field defaults and assemble the record.
pub fn compose(
    request: &AggregationRequest,
    current: CurrentRaw,
    past: Vec<PastDay>,
    future: Vec<FutureDay>,
    queried_at: DateTime<Utc>,
) -> CompositeWeatherRecord {
    let location = current
        .location_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    let snapshot = CurrentSnapshot::with_defaults(
        current.description,
        current.temperature_c,
        current.humidity_pct,
        current.wind_speed_kmh,
    );

    let past = if past.is_empty() { vec![PastDay::no_data()] } else { past };
    let future = if future.is_empty() { vec![FutureDay::no_data()] } else { future };

    CompositeWeatherRecord {
        user: request.user.clone(),
        location,
        coordinate: request.coordinate,
        current: snapshot,
        past,
        future,
        queried_at,
    }
}
