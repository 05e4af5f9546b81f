//! Crate for querying a Prometheus-compatible HTTP API.
//!
//! This crate provides a client for the three read-only calls the rule
//! validators need: instant query evaluation, label-name listing, and
//! selector-match testing. Every call is read-through the tenant-partitioned
//! [`cache::Cache`], so a validation run touches the backend at most once per
//! distinct `(tenant set, query)` pair.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

pub mod errors;
pub use errors::Error;

pub mod cache;
pub use cache::{Cache, QueryStats};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Header carrying the tenant set on multi-tenant backends (Cortex/Mimir).
const DEFAULT_TENANT_HEADER: &str = "X-Scope-OrgID";

/// Configuration for [`PrometheusClient`].
#[derive(Debug, Clone)]
pub struct PrometheusClientConfig {
    /// Base URL of the Prometheus-compatible API.
    pub url: String,
    /// Per-call timeout. `Duration::ZERO` means no deadline.
    pub timeout: Duration,
    /// Headers attached to every request (for example authorization).
    pub headers: HashMap<String, String>,
    /// Name of the header carrying the tenant set, when a rule group
    /// declares source tenants.
    pub tenant_header: String,
}

impl Default for PrometheusClientConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::ZERO,
            headers: HashMap::new(),
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
        }
    }
}

/// Envelope every Prometheus API endpoint answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: String,
    // No serde default here: it would require `T: Default` from the derive,
    // and a missing field already decodes as `None`.
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

/// Payload of `/api/v1/query`.
#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: serde_json::Value,
}

/// A client for the read-only Prometheus HTTP API, backed by the
/// tenant-partitioned cache.
///
/// The base header set is immutable after construction; per-call tenant
/// headers are layered onto a copy, so concurrent calls never observe a
/// half-written header set.
#[derive(Debug)]
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: Url,
    config: PrometheusClientConfig,
    cache: Arc<Cache>,
}

impl PrometheusClient {
    /// Creates a new client for the given backend, backed by `cache`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] when the configured URL does not parse,
    /// [`Error::InvalidHeader`] when a configured header is not valid HTTP
    /// header syntax, and [`Error::ClientBuild`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(config: PrometheusClientConfig, cache: Arc<Cache>) -> Result<Self, Error> {
        let mut base_url =
            Url::parse(&config.url).map_err(|err| Error::InvalidUrl(err.to_string()))?;
        // Url::join replaces the last path segment unless the base ends in a
        // slash, which would silently drop a route prefix.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        // Validate configured headers up front so a typo fails the run
        // before any file is processed, not on the first remote check.
        for (name, value) in &config.headers {
            build_header(name, value)?;
        }
        build_header(&config.tenant_header, "tenant")?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| Error::ClientBuild(err.to_string()))?;

        Ok(Self {
            http,
            base_url,
            config,
            cache,
        })
    }

    /// The tenant-partitioned cache backing this client.
    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    /// Evaluates `expr` as an instant query for the given tenant set.
    ///
    /// Returns the number of series the query matched and the backend
    /// round-trip time. Results, including failures, are served from the
    /// cache on repeat calls; the duration of a cache hit is the originally
    /// measured one.
    #[instrument(skip(self, expr), fields(expr = %expr))]
    pub async fn evaluate_query(
        &self,
        tenants: &[String],
        expr: &str,
    ) -> Result<(u64, Duration), Error> {
        let partition = self.cache.source_tenants_data(tenants);
        if let Some(stats) = partition.query_stats(expr) {
            debug!("Serving query result from cache");
            return match stats.error {
                Some(error) => Err(Error::CachedFailure(error)),
                None => Ok((stats.series, Duration::from_nanos(stats.duration))),
            };
        }

        let started = Instant::now();
        let result = self.query_series_count(tenants, expr).await;
        let duration = started.elapsed();

        match &result {
            Ok(series) => partition.set_query_stats(
                expr,
                QueryStats {
                    error: None,
                    series: *series,
                    duration: duration.as_nanos() as u64,
                },
            ),
            Err(err) => partition.set_query_stats(
                expr,
                QueryStats {
                    error: Some(err.to_string()),
                    series: 0,
                    duration: duration.as_nanos() as u64,
                },
            ),
        }

        result.map(|series| (series, duration))
    }

    /// Lists all label names known to the backend for the given tenant set.
    ///
    /// The returned vector is a copy; mutating it never affects the cache.
    #[instrument(skip(self))]
    pub async fn list_labels(&self, tenants: &[String]) -> Result<Vec<String>, Error> {
        let partition = self.cache.source_tenants_data(tenants);
        if let Some(labels) = partition.known_labels() {
            debug!("Serving label names from cache");
            return Ok(labels);
        }

        let endpoint = "api/v1/labels";
        let response: ApiResponse<Vec<String>> = self.get(endpoint, tenants, &[]).await?;
        let labels = unwrap_data(response, endpoint)?;
        partition.set_known_labels(labels.clone());
        Ok(labels)
    }

    /// Counts the series matching a literal selector for the given tenant
    /// set.
    #[instrument(skip(self, selector), fields(selector = %selector))]
    pub async fn match_selector(&self, tenants: &[String], selector: &str) -> Result<u64, Error> {
        let partition = self.cache.source_tenants_data(tenants);
        if let Some(count) = partition.selector_series(selector) {
            debug!("Serving selector match count from cache");
            return Ok(count);
        }

        let endpoint = "api/v1/series";
        let response: ApiResponse<Vec<serde_json::Value>> = self
            .get(endpoint, tenants, &[("match[]", selector)])
            .await?;
        let series = unwrap_data(response, endpoint)?;
        let count = series.len() as u64;
        partition.set_selector_series(selector, count);
        Ok(count)
    }

    async fn query_series_count(&self, tenants: &[String], expr: &str) -> Result<u64, Error> {
        let endpoint = "api/v1/query";
        let response: ApiResponse<QueryData> =
            self.get(endpoint, tenants, &[("query", expr)]).await?;
        let data = unwrap_data(response, endpoint)?;

        // The vector/matrix result types carry one entry per series; scalar
        // and string results count as a single value.
        match data.result_type.as_str() {
            "vector" | "matrix" => match data.result.as_array() {
                Some(series) => Ok(series.len() as u64),
                None => Err(Error::InvalidResponse {
                    endpoint: endpoint.to_string(),
                    reason: format!("{} result is not an array", data.result_type),
                }),
            },
            "scalar" | "string" => Ok(1),
            other => Err(Error::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: format!("unknown result type `{other}`"),
            }),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        tenants: &[String],
        query_params: &[(&str, &str)],
    ) -> Result<ApiResponse<T>, Error> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|err| Error::InvalidUrl(err.to_string()))?;

        let mut request = self
            .http
            .get(url)
            .headers(self.call_headers(tenants)?)
            .query(query_params);
        if !self.config.timeout.is_zero() {
            request = request.timeout(self.config.timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
                body,
            });
        }

        let parsed: ApiResponse<T> = response.json().await?;
        if !parsed.warnings.is_empty() {
            warn!(endpoint, warnings = ?parsed.warnings, "Prometheus returned warnings");
        }
        Ok(parsed)
    }

    /// Builds the header set for one call: the immutable base headers plus
    /// the tenant header when the rule group declares source tenants.
    fn call_headers(&self, tenants: &[String]) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::with_capacity(self.config.headers.len() + 1);
        for (name, value) in &self.config.headers {
            let (name, value) = build_header(name, value)?;
            headers.insert(name, value);
        }
        if !tenants.is_empty() {
            let (name, value) = build_header(&self.config.tenant_header, &tenants.join("|"))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

fn build_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), Error> {
    let name = HeaderName::try_from(name).map_err(|err| Error::InvalidHeader {
        name: name.to_string(),
        reason: err.to_string(),
    })?;
    let value = HeaderValue::try_from(value).map_err(|err| Error::InvalidHeader {
        name: name.to_string(),
        reason: err.to_string(),
    })?;
    Ok((name, value))
}

fn unwrap_data<T>(response: ApiResponse<T>, endpoint: &str) -> Result<T, Error> {
    if response.status != "success" {
        return Err(Error::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: response
                .error
                .unwrap_or_else(|| format!("status `{}`", response.status)),
        });
    }
    response.data.ok_or_else(|| Error::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: "missing data field".to_string(),
    })
}
