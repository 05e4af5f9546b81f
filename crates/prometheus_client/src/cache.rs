//! Tenant-partitioned, persisted cache for Prometheus query results.
//!
//! The cache is loaded once at startup, shared by reference for the whole
//! run, mutated concurrently by validation workers, and dumped back to disk
//! at the end of the run. Partitions are keyed by the rule group's source
//! tenants so that results fetched for one tenant set are never served to
//! another.
//!
//! Locking is two-level: a coarse lock guards the tenant-key to partition
//! registry (held only during lookup/creation), and each partition carries
//! its own reader/writer locks for its three result maps. Concurrent access
//! to different tenant sets therefore never contends.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

/// Separator used when deriving a tenant key from a source-tenant list.
///
/// Tenants are joined in the order the rule group declares them; the key for
/// an empty list is the empty string (the default tenant).
const TENANT_KEY_SEPARATOR: &str = "|";

/// Outcome of one instant query, as remembered by the cache.
///
/// A failed query is cached too (with `error` set) so that repeated failing
/// queries do not re-issue failing network calls within one run. `duration`
/// is the originally measured backend round-trip in nanoseconds; cache hits
/// report that original measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryStats {
    /// Error message from the backend, if the query failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of series the query returned.
    pub series: u64,
    /// Backend round-trip time in nanoseconds.
    pub duration: u64,
}

/// Persisted shape of one tenant partition.
///
/// Field names are a durable contract: cache files written by earlier
/// versions of the tool must stay readable.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PersistedPartition {
    #[serde(default)]
    queries_stats: HashMap<String, QueryStats>,
    #[serde(default)]
    known_labels: Vec<String>,
    #[serde(default)]
    selector_matching_series: HashMap<String, u64>,
}

/// Persisted shape of the whole cache file.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCache {
    prometheus_url: String,
    created: DateTime<Utc>,
    #[serde(default)]
    source_tenants: HashMap<String, PersistedPartition>,
}

/// Cached results for one tenant set.
///
/// Every getter returns owned data (a defensive copy) so callers can never
/// mutate cache-owned state through a returned value. All accessors take a
/// reader or writer lock scoped to this partition only.
#[derive(Debug, Default)]
pub struct Partition {
    queries: RwLock<HashMap<String, QueryStats>>,
    known_labels: RwLock<Option<Vec<String>>>,
    selector_series: RwLock<HashMap<String, u64>>,
}

impl Partition {
    fn from_persisted(persisted: PersistedPartition) -> Self {
        Self {
            queries: RwLock::new(persisted.queries_stats),
            known_labels: RwLock::new(if persisted.known_labels.is_empty() {
                None
            } else {
                Some(persisted.known_labels)
            }),
            selector_series: RwLock::new(persisted.selector_matching_series),
        }
    }

    fn to_persisted(&self) -> PersistedPartition {
        PersistedPartition {
            queries_stats: self.queries.read().map(|q| q.clone()).unwrap_or_default(),
            known_labels: self
                .known_labels
                .read()
                .map(|l| l.clone().unwrap_or_default())
                .unwrap_or_default(),
            selector_matching_series: self
                .selector_series
                .read()
                .map(|s| s.clone())
                .unwrap_or_default(),
        }
    }

    /// Returns the remembered outcome of `query`, if any.
    pub fn query_stats(&self, query: &str) -> Option<QueryStats> {
        self.queries
            .read()
            .ok()
            .and_then(|q| q.get(query).cloned())
    }

    /// Remembers the outcome of `query`.
    pub fn set_query_stats(&self, query: &str, stats: QueryStats) {
        if let Ok(mut queries) = self.queries.write() {
            queries.insert(query.to_string(), stats);
        }
    }

    /// Returns a copy of the cached label names, or `None` when labels have
    /// not been fetched for this tenant set yet.
    pub fn known_labels(&self) -> Option<Vec<String>> {
        self.known_labels.read().ok().and_then(|l| l.clone())
    }

    /// Stores the label names known for this tenant set.
    pub fn set_known_labels(&self, labels: Vec<String>) {
        if let Ok(mut known) = self.known_labels.write() {
            *known = Some(labels);
        }
    }

    /// Returns the remembered series-match count for `selector`, if any.
    pub fn selector_series(&self, selector: &str) -> Option<u64> {
        self.selector_series
            .read()
            .ok()
            .and_then(|s| s.get(selector).copied())
    }

    /// Remembers the series-match count for `selector`.
    pub fn set_selector_series(&self, selector: &str, count: u64) {
        if let Ok(mut series) = self.selector_series.write() {
            series.insert(selector.to_string(), count);
        }
    }
}

/// Process-wide cache of backend results, partitioned by tenant set.
///
/// Created once at startup via [`Cache::load`], shared by reference
/// (`Arc<Cache>`) across all validation workers, and written back to disk
/// with [`Cache::dump`] at the end of the run. Not safe for concurrent use
/// from multiple OS processes sharing the same file.
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    prometheus_url: String,
    created: DateTime<Utc>,
    partitions: RwLock<HashMap<String, Arc<Partition>>>,
}

impl Cache {
    /// Loads the cache from `path`, or starts empty.
    ///
    /// Loading never fails: a missing file is created empty, an unreadable
    /// or malformed file is logged as a warning and replaced by an empty
    /// in-memory cache. If the persisted record is older than `max_age` or
    /// was produced against a different `prometheus_url`, all persisted
    /// partitions are discarded so the run never validates against stale or
    /// foreign-backend data.
    pub fn load(path: &Path, prometheus_url: &str, max_age: Duration) -> Self {
        let empty = || Self {
            path: path.to_path_buf(),
            prometheus_url: prometheus_url.to_string(),
            created: Utc::now(),
            partitions: RwLock::new(HashMap::new()),
        };

        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No cache file found, starting with an empty cache");
                let cache = empty();
                cache.dump();
                return cache;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Failed to read cache file, starting with an empty cache");
                return empty();
            }
        };

        let persisted: PersistedCache = match serde_json::from_slice(&raw) {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Cache file is malformed, starting with an empty cache");
                return empty();
            }
        };

        if persisted.prometheus_url != prometheus_url {
            info!(
                cached_url = %persisted.prometheus_url,
                configured_url = %prometheus_url,
                "Cache file was produced against a different Prometheus, discarding it"
            );
            return empty();
        }

        let age = Utc::now().signed_duration_since(persisted.created);
        if !max_age.is_zero() && age.to_std().map(|a| a > max_age).unwrap_or(true) {
            info!(
                created = %persisted.created,
                max_age = ?max_age,
                "Cache file is older than the configured maximum age, discarding it"
            );
            return empty();
        }

        let partitions = persisted
            .source_tenants
            .into_iter()
            .map(|(key, partition)| (key, Arc::new(Partition::from_persisted(partition))))
            .collect::<HashMap<_, _>>();
        debug!(
            path = %path.display(),
            partitions = partitions.len(),
            "Loaded cache file"
        );

        Self {
            path: path.to_path_buf(),
            prometheus_url: prometheus_url.to_string(),
            created: persisted.created,
            partitions: RwLock::new(partitions),
        }
    }

    /// Derives the partition key for a source-tenant list.
    ///
    /// Tenants are joined in declaration order; reordering the same tenants
    /// yields a different key. This matches the on-disk contract of cache
    /// files written by earlier versions.
    pub fn tenant_key(tenants: &[String]) -> String {
        tenants.join(TENANT_KEY_SEPARATOR)
    }

    /// Returns the partition for the given tenant set, creating it if this
    /// is the first time the tenant set is seen.
    ///
    /// For a given key exactly one partition is ever created, and every
    /// caller observes the same instance, no matter how many callers race on
    /// a not-yet-seen key.
    pub fn source_tenants_data(&self, tenants: &[String]) -> Arc<Partition> {
        let key = Self::tenant_key(tenants);

        if let Ok(partitions) = self.partitions.read() {
            if let Some(partition) = partitions.get(&key) {
                return Arc::clone(partition);
            }
        }

        // Double-checked under the writer lock: another caller may have
        // registered the partition between the read above and here.
        let mut partitions = match self.partitions.write() {
            Ok(partitions) => partitions,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            partitions
                .entry(key)
                .or_insert_with(|| Arc::new(Partition::default())),
        )
    }

    /// Serializes the whole cache to its configured file path.
    ///
    /// Produces a consistent snapshot under read locks; a write failure is
    /// logged and otherwise ignored so a full-disk CI runner never fails a
    /// validation run.
    pub fn dump(&self) {
        let source_tenants = match self.partitions.read() {
            Ok(partitions) => partitions
                .iter()
                .map(|(key, partition)| (key.clone(), partition.to_persisted()))
                .collect::<HashMap<_, _>>(),
            Err(_) => {
                warn!("Cache registry lock poisoned, skipping cache dump");
                return;
            }
        };

        let persisted = PersistedCache {
            prometheus_url: self.prometheus_url.clone(),
            created: self.created,
            source_tenants,
        };

        let serialized = match serde_json::to_vec_pretty(&persisted) {
            Ok(serialized) => serialized,
            Err(err) => {
                warn!(error = %err, "Failed to serialize cache, skipping cache dump");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, serialized) {
            warn!(path = %self.path.display(), error = %err, "Failed to write cache file");
            return;
        }
        debug!(path = %self.path.display(), "Dumped cache file");
    }
}
