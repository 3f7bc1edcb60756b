//! Entry points used by binaries: aggregation, history CRUD, lookup, export.

use chrono::{Local, Utc};
use std::sync::Arc;
use tracing::info;

use crate::{
    aggregator::aggregate,
    error::WeatherError,
    export::{ExportFormat, export},
    model::{AggregationRequest, Coordinate, ManualRecord, RecordId, RecordPatch, StoredRecord},
    provider::{Geocoder, Providers},
    store::{HistoryFilter, RecordStore},
};

/// Aggregates upstream weather and persists the result.
#[derive(Debug, Clone)]
pub struct WeatherService {
    providers: Providers,
    store: Arc<dyn RecordStore>,
}

impl WeatherService {
    pub fn new(providers: Providers, store: Arc<dyn RecordStore>) -> Self {
        Self { providers, store }
    }

    /// Validate, aggregate, store. Every call creates a new record.
    pub async fn fetch_and_store(&self, request: AggregationRequest) -> Result<StoredRecord, WeatherError> {
        request.validate()?;
        info!(
            user = %request.user,
            lat = request.coordinate.lat,
            lon = request.coordinate.lon,
            "Fetching weather"
        );

        let today = Local::now().date_naive();
        let record = aggregate(&self.providers, &request, today).await?;
        Ok(self.store.insert(record).await?)
    }
}

/// History queries, manual edits and export over the record store.
#[derive(Debug, Clone)]
pub struct RecordService {
    store: Arc<dyn RecordStore>,
}

impl RecordService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn history(&self, filter: &HistoryFilter) -> Result<Vec<StoredRecord>, WeatherError> {
        Ok(self.store.query(filter).await?)
    }

    pub async fn create_manual(&self, manual: ManualRecord) -> Result<StoredRecord, WeatherError> {
        manual.validate()?;
        Ok(self.store.insert(manual.into_record(Utc::now())).await?)
    }

    pub async fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<StoredRecord, WeatherError> {
        if patch.is_empty() {
            return Err(WeatherError::ClientInput("Nothing to update".to_string()));
        }

        self.store
            .update(id, patch)
            .await?
            .ok_or_else(|| WeatherError::NotFound(format!("Record not found: {id}")))
    }

    pub async fn delete(&self, id: RecordId) -> Result<(), WeatherError> {
        if self.store.delete(id).await? {
            info!(%id, "Deleted weather record");
            Ok(())
        } else {
            Err(WeatherError::NotFound(format!("Record not found: {id}")))
        }
    }

    /// Export the whole store, ignoring any filter.
    pub async fn export(&self, format: ExportFormat) -> Result<Vec<u8>, WeatherError> {
        let records = self.store.all().await?;
        export(&records, format)
    }
}

/// Resolve a place name to coordinates of its best match.
pub async fn locate(geocoder: &dyn Geocoder, place: &str) -> Result<Coordinate, WeatherError> {
    let place = place.trim();
    if place.is_empty() {
        return Err(WeatherError::ClientInput("Location name is required".to_string()));
    }

    geocoder
        .geocode(place)
        .await?
        .ok_or_else(|| WeatherError::NotFound(format!("Location not found: {place}")))
}
