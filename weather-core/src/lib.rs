//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Adapters for the current-conditions, archive, forecast and geocoding upstreams
//! - The aggregation pipeline (historical backfill, forecast selection, defaulting)
//! - A document store for composite records, with history queries and export
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod aggregator;
pub mod backfill;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{Config, ProviderConfig};
pub use error::{FetchError, StoreError, WeatherError};
pub use export::ExportFormat;
pub use model::{
    AggregationRequest, CompositeWeatherRecord, Coordinate, CurrentSnapshot, FutureDay, ManualRecord,
    PastDay, RecordId, RecordPatch, StoredRecord, UserId,
};
pub use provider::{ProviderId, Providers};
pub use service::{RecordService, WeatherService, locate};
pub use store::{DocumentStore, HistoryFilter, RecordStore};
