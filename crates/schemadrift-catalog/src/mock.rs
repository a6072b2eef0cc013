//! Mock metadata source for testing
//!
//! This source returns predefined rows without connecting to any database.
//! It's useful for:
//! - Unit testing inventory and presence matrix logic
//! - Exercising the concurrent survey without real hosts
//! - Demos and examples without real credentials
//! - Simulating per-host failures and latency
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemadrift_catalog::{MockSource, MetadataSource};
//! use schemadrift_core::{HostConfig, MetadataRow};
//!
//! let source = MockSource::new();
//! let host = HostConfig::new("db1", "auditor", "app").with_name("prod");
//! source.add_rows("prod", vec![MetadataRow::new("public", "users", "id")]).await;
//!
//! let rows = source.fetch_rows(&host).await?;
//! ```

use crate::source::{FetchError, MetadataSource};
use schemadrift_core::{HostConfig, HostId, MetadataRow};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock metadata source for testing
///
/// Rows and errors are keyed by [`HostId`]. A host with neither configured
/// behaves like an unreachable server.
pub struct MockSource {
    /// Predefined rows by host
    rows: Arc<RwLock<HashMap<HostId, Vec<MetadataRow>>>>,

    /// Errors to return for specific hosts
    errors: Arc<RwLock<HashMap<HostId, FetchError>>>,

    /// Simulated latency for every host (milliseconds)
    latency_ms: u64,

    /// Simulated latency overrides per host (milliseconds)
    host_latency_ms: Arc<HashMap<HostId, u64>>,

    /// Fetches currently running
    in_flight: Arc<AtomicUsize>,

    /// Highest number of simultaneous fetches observed
    peak_in_flight: Arc<AtomicUsize>,

    /// Total fetch calls
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    /// Create a new mock source with no predefined hosts
    pub fn new() -> Self {
        MockSourceBuilder::new().build()
    }

    /// Set the rows returned for a host
    pub async fn add_rows(&self, host: impl Into<HostId>, rows: Vec<MetadataRow>) {
        self.rows.write().await.insert(host.into(), rows);
    }

    /// Configure an error to be returned for a specific host
    ///
    /// Errors take precedence over rows.
    pub async fn add_error(&self, host: impl Into<HostId>, error: FetchError) {
        self.errors.write().await.insert(host.into(), error);
    }

    /// Configure simulated latency for all hosts
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of hosts with predefined rows
    pub async fn host_count(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Highest number of fetches that were running at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Total number of `fetch_rows` calls
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self, host: &HostId) {
        let latency = self.host_latency_ms.get(host).copied().unwrap_or(self.latency_ms);
        if latency > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(latency)).await;
        }
    }

    async fn lookup(&self, host: &HostId) -> Result<Vec<MetadataRow>, FetchError> {
        if let Some(error) = self.errors.read().await.get(host) {
            return Err(error.clone());
        }

        self.rows
            .read()
            .await
            .get(host)
            .cloned()
            .ok_or_else(|| FetchError::NetworkError(format!("could not reach {}", host)))
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockSource {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            errors: Arc::clone(&self.errors),
            latency_ms: self.latency_ms,
            host_latency_ms: Arc::clone(&self.host_latency_ms),
            in_flight: Arc::clone(&self.in_flight),
            peak_in_flight: Arc::clone(&self.peak_in_flight),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockSource {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn fetch_rows(&self, host: &HostConfig) -> Result<Vec<MetadataRow>, FetchError> {
        let id = host.id();

        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        self.simulate_latency(&id).await;
        let result = self.lookup(&id).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn test_connection(&self, host: &HostConfig) -> Result<(), FetchError> {
        let id = host.id();
        self.simulate_latency(&id).await;
        self.lookup(&id).await.map(|_| ())
    }
}

/// Builder for creating MockSource with multiple hosts
///
/// # Example
///
/// ```rust,ignore
/// let source = MockSourceBuilder::new()
///     .with_host("prod", vec![MetadataRow::new("public", "users", "id")])
///     .with_error("replica", FetchError::NetworkError("refused".to_string()))
///     .with_latency(50)
///     .build();
/// ```
pub struct MockSourceBuilder {
    rows: HashMap<HostId, Vec<MetadataRow>>,
    errors: HashMap<HostId, FetchError>,
    latency_ms: u64,
    host_latency_ms: HashMap<HostId, u64>,
}

impl MockSourceBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            errors: HashMap::new(),
            latency_ms: 0,
            host_latency_ms: HashMap::new(),
        }
    }

    /// Add rows for a host
    pub fn with_host(mut self, host: impl Into<HostId>, rows: Vec<MetadataRow>) -> Self {
        self.rows.insert(host.into(), rows);
        self
    }

    /// Add rows for a host from `(schema, table, column)` tuples
    pub fn with_columns(self, host: impl Into<HostId>, columns: &[(&str, &str, &str)]) -> Self {
        let rows = columns
            .iter()
            .map(|(schema, table, column)| MetadataRow::new(*schema, *table, *column))
            .collect();
        self.with_host(host, rows)
    }

    /// Add an error for a specific host
    pub fn with_error(mut self, host: impl Into<HostId>, error: FetchError) -> Self {
        self.errors.insert(host.into(), error);
        self
    }

    /// Configure latency for every host
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Configure latency for one host
    pub fn with_host_latency(mut self, host: impl Into<HostId>, latency_ms: u64) -> Self {
        self.host_latency_ms.insert(host.into(), latency_ms);
        self
    }

    /// Build the MockSource
    pub fn build(self) -> MockSource {
        MockSource {
            rows: Arc::new(RwLock::new(self.rows)),
            errors: Arc::new(RwLock::new(self.errors)),
            latency_ms: self.latency_ms,
            host_latency_ms: Arc::new(self.host_latency_ms),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for MockSourceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str) -> HostConfig {
        HostConfig::new("localhost", "auditor", "app").with_name(name)
    }

    #[tokio::test]
    async fn test_mock_source_basic() {
        let source = MockSource::new();
        source
            .add_rows("prod", vec![
                MetadataRow::new("public", "users", "id"),
                MetadataRow::new("public", "users", "email"),
            ])
            .await;

        let rows = source.fetch_rows(&host("prod")).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].column, "id");
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_unknown_host_is_unreachable() {
        let source = MockSource::new();
        let result = source.fetch_rows(&host("ghost")).await;
        assert!(matches!(result, Err(FetchError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_mock_source_empty_host_is_valid() {
        let source = MockSourceBuilder::new().with_host("empty", Vec::new()).build();
        let rows = source.fetch_rows(&host("empty")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_mock_source_error_takes_precedence() {
        let source = MockSourceBuilder::new()
            .with_columns("prod", &[("s", "t", "c")])
            .with_error("prod", FetchError::AuthenticationError("bad password".to_string()))
            .build();

        let result = source.fetch_rows(&host("prod")).await;
        assert!(matches!(result, Err(FetchError::AuthenticationError(_))));
        assert!(source.test_connection(&host("prod")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_source_keys_by_derived_id() {
        let unnamed = HostConfig::new("db2", "auditor", "app");
        let source = MockSourceBuilder::new()
            .with_columns("db2:5432/app", &[("s", "t", "c")])
            .build();

        assert_eq!(source.fetch_rows(&unnamed).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_clone_shares_state() {
        let source = MockSource::new();
        let cloned = source.clone();

        source.add_rows("prod", Vec::new()).await;

        assert_eq!(cloned.host_count().await, 1);
        cloned.fetch_rows(&host("prod")).await.unwrap();
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_latency() {
        let source = MockSourceBuilder::new()
            .with_host("slow", Vec::new())
            .with_host_latency("slow", 20)
            .build();

        let start = std::time::Instant::now();
        source.fetch_rows(&host("slow")).await.unwrap();
        assert!(start.elapsed() >= std::time::Duration::from_millis(20));
    }
}
