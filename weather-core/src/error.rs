use std::path::PathBuf;

use thiserror::Error;

use crate::provider::ProviderId;

/// Failure of a single upstream round trip.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to send request to {provider}: {source}")]
    Transport {
        provider: ProviderId,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: ProviderId,
        status: u16,
        body: String,
    },

    #[error("Failed to parse {provider} response: {source}")]
    Decode {
        provider: ProviderId,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn provider(&self) -> ProviderId {
        match self {
            FetchError::Transport { provider, .. }
            | FetchError::Status { provider, .. }
            | FetchError::Decode { provider, .. } => *provider,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read record store {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write record store {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record store {} is not valid JSON: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced to callers of the core. Each carries a stable category
/// (see [`WeatherError::category`]) plus a human-readable message.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{0}")]
    ClientInput(String),

    #[error("Upstream failure: {0}")]
    Upstream(#[from] FetchError),

    #[error("{0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("No weather data available for export")]
    NoData,

    #[error("Export failed: {0}")]
    Export(String),

    #[error("{0}")]
    Config(String),
}

impl WeatherError {
    pub fn category(&self) -> &'static str {
        match self {
            WeatherError::ClientInput(_) => "client_input",
            WeatherError::Upstream(_) => "upstream_failure",
            WeatherError::NotFound(_) => "not_found",
            WeatherError::Store(_) => "store_error",
            WeatherError::NoData => "no_data",
            WeatherError::Export(_) => "export_error",
            WeatherError::Config(_) => "config_error",
        }
    }
}
