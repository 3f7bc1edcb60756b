//! Persistence and history queries over composite records.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use parking_lot::RwLock;
use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::{StoreError, WeatherError},
    model::{CompositeWeatherRecord, RecordId, RecordPatch, StoredRecord, UserId},
};

/// Records returned when no filter is given.
pub const RECENT_LIMIT: usize = 10;
/// Records returned when any filter is given.
pub const FILTERED_LIMIT: usize = 50;

/// Independent, AND-combined history filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Exact owner match.
    pub user: Option<UserId>,
    /// Calendar day (local time) in which the record was queried.
    pub date: Option<NaiveDate>,
    /// Case-insensitive substring of the location name.
    pub location: Option<String>,
}

impl HistoryFilter {
    /// Build a filter from raw request strings. Blank values count as absent.
    pub fn parse(
        user: Option<&str>,
        date: Option<&str>,
        location: Option<&str>,
    ) -> Result<Self, WeatherError> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        let date = present(date)
            .map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|_| {
                    WeatherError::ClientInput(format!("Invalid date '{d}', expected YYYY-MM-DD"))
                })
            })
            .transpose()?;

        Ok(Self {
            user: present(user).map(UserId::parse),
            date,
            location: present(location).map(str::to_string),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.date.is_none() && self.location.is_none()
    }

    pub fn limit(&self) -> usize {
        if self.is_empty() { RECENT_LIMIT } else { FILTERED_LIMIT }
    }

    pub fn matches(&self, record: &CompositeWeatherRecord) -> bool {
        if let Some(user) = &self.user {
            if &record.user != user {
                return false;
            }
        }

        if let Some(date) = self.date {
            let (from, until) = day_bounds(date);
            if record.queried_at < from || record.queried_at >= until {
                return false;
            }
        }

        if let Some(needle) = &self.location {
            if !record.location.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

/// `[date 00:00, date+1 00:00)` in local time, as UTC instants.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = local_midnight(date);
    (from, local_midnight(date + Duration::days(1)))
}

/// Start of the local day. When a DST jump skips midnight the day starts at
/// the first wall-clock time that exists.
fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let mut naive = date.and_time(NaiveTime::MIN);
    loop {
        if let Some(local) = Local.from_local_datetime(&naive).earliest() {
            return local.with_timezone(&Utc);
        }
        naive += Duration::minutes(15);
    }
}

/// Generic document store for composite records.
#[async_trait]
pub trait RecordStore: Send + Sync + Debug {
    /// Assigns a fresh id; never updates an existing record.
    async fn insert(&self, record: CompositeWeatherRecord) -> Result<StoredRecord, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<StoredRecord>, StoreError>;

    /// `None` when no record has this id.
    async fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<Option<StoredRecord>, StoreError>;

    /// `false` when no record has this id.
    async fn delete(&self, id: RecordId) -> Result<bool, StoreError>;

    /// Matches sorted by `queried_at` descending, capped by [`HistoryFilter::limit`].
    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<StoredRecord>, StoreError>;

    /// Everything, in insertion order.
    async fn all(&self) -> Result<Vec<StoredRecord>, StoreError>;
}

/// In-memory document collection, optionally mirrored to a JSON file that is
/// rewritten after every mutation.
#[derive(Debug, Default)]
pub struct DocumentStore {
    path: Option<PathBuf>,
    docs: RwLock<Vec<StoredRecord>>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or lazily create) a store backed by `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let docs = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|source| StoreError::Read { path: path.clone(), source })?;
            if contents.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|source| StoreError::Corrupt { path: path.clone(), source })?
            }
        } else {
            Vec::new()
        };

        debug!(path = %path.display(), records = docs.len(), "Opened record store");
        Ok(Self { path: Some(path), docs: RwLock::new(docs) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self, docs: &[StoredRecord]) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| StoreError::Write { path: parent.to_path_buf(), source })?;
        }

        let json = serde_json::to_string_pretty(docs)?;
        fs::write(path, json).map_err(|source| StoreError::Write { path: path.clone(), source })
    }

    /// Persist `next` and only then make it visible.
    fn commit(&self, docs: &mut Vec<StoredRecord>, next: Vec<StoredRecord>) -> Result<(), StoreError> {
        self.persist(&next)?;
        *docs = next;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for DocumentStore {
    async fn insert(&self, record: CompositeWeatherRecord) -> Result<StoredRecord, StoreError> {
        let stored = StoredRecord { id: Uuid::new_v4(), record };

        let mut docs = self.docs.write();
        let mut next = docs.clone();
        next.push(stored.clone());
        self.commit(&mut docs, next)?;

        info!(id = %stored.id, location = %stored.record.location, "Stored weather record");
        Ok(stored)
    }

    async fn get(&self, id: RecordId) -> Result<Option<StoredRecord>, StoreError> {
        Ok(self.docs.read().iter().find(|d| d.id == id).cloned())
    }

    async fn update(&self, id: RecordId, patch: &RecordPatch) -> Result<Option<StoredRecord>, StoreError> {
        let mut docs = self.docs.write();
        let Some(index) = docs.iter().position(|d| d.id == id) else {
            return Ok(None);
        };

        let mut next = docs.clone();
        patch.apply(&mut next[index].record);
        let updated = next[index].clone();
        self.commit(&mut docs, next)?;

        Ok(Some(updated))
    }

    async fn delete(&self, id: RecordId) -> Result<bool, StoreError> {
        let mut docs = self.docs.write();
        if !docs.iter().any(|d| d.id == id) {
            return Ok(false);
        }

        let next = docs.iter().filter(|d| d.id != id).cloned().collect();
        self.commit(&mut docs, next)?;
        Ok(true)
    }

    async fn query(&self, filter: &HistoryFilter) -> Result<Vec<StoredRecord>, StoreError> {
        let mut hits: Vec<StoredRecord> = self
            .docs
            .read()
            .iter()
            .filter(|d| filter.matches(&d.record))
            .cloned()
            .collect();

        hits.sort_by(|a, b| b.record.queried_at.cmp(&a.record.queried_at));
        hits.truncate(filter.limit());

        debug!(?filter, hits = hits.len(), "History query");
        Ok(hits)
    }

    async fn all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.docs.read().clone())
    }
}
