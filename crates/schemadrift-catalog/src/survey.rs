//! Concurrent multi-host metadata survey
//!
//! Each host is fetched on its own task, bounded by a semaphore. Failures are
//! collected per host; one host failing never cancels the others.

use crate::source::{FetchError, MetadataSource};
use schemadrift_core::{HostConfig, HostId, MetadataRow, UnavailableHost};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Survey tuning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyOptions {
    /// Maximum hosts fetched at once (at least 1)
    pub max_concurrency: usize,

    /// Per-host fetch timeout
    pub timeout: Option<Duration>,
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            timeout: None,
        }
    }
}

/// A host whose fetch failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub host: HostId,
    pub error: FetchError,
}

impl From<&HostFailure> for UnavailableHost {
    fn from(failure: &HostFailure) -> Self {
        UnavailableHost {
            host: failure.host.clone(),
            reason: failure.error.to_string(),
        }
    }
}

/// Rows fetched from one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRows {
    pub host: HostId,
    pub rows: Vec<MetadataRow>,
}

/// Result of surveying every configured host
///
/// Both lists keep configured host order.
#[derive(Debug, Clone, Default)]
pub struct SurveyOutcome {
    pub fetched: Vec<HostRows>,
    pub failures: Vec<HostFailure>,
}

impl SurveyOutcome {
    /// Whether the host's rows were fetched
    pub fn is_available(&self, host: &HostId) -> bool {
        self.fetched.iter().any(|h| &h.host == host)
    }

    /// Failure recorded for a host, if any
    pub fn failure_for(&self, host: &HostId) -> Option<&HostFailure> {
        self.failures.iter().find(|f| &f.host == host)
    }

    /// Failures in report form
    pub fn unavailable(&self) -> Vec<UnavailableHost> {
        self.failures.iter().map(UnavailableHost::from).collect()
    }
}

/// Fetch rows from every host concurrently
pub async fn survey(
    source: Arc<dyn MetadataSource>,
    hosts: &[HostConfig],
    options: &SurveyOptions,
) -> SurveyOutcome {
    let semaphore = Arc::new(Semaphore::new(options.max_concurrency.max(1)));

    tracing::info!(
        source = source.name(),
        hosts = hosts.len(),
        max_concurrency = options.max_concurrency,
        "surveying hosts"
    );

    let handles: Vec<_> = hosts
        .iter()
        .cloned()
        .map(|host| {
            let source = Arc::clone(&source);
            let semaphore = Arc::clone(&semaphore);
            let timeout = options.timeout;

            tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return Err(FetchError::ConfigError("survey cancelled".to_string())),
                };

                fetch_one(source.as_ref(), &host, timeout).await
            })
        })
        .collect();

    let mut outcome = SurveyOutcome::default();

    // Awaiting in order keeps results in configured order; the tasks
    // themselves are already running concurrently.
    for (host, handle) in hosts.iter().zip(handles) {
        let id = host.id();
        let result = handle
            .await
            .unwrap_or_else(|e| Err(FetchError::QueryError(format!("fetch task failed: {}", e))));

        match result {
            Ok(rows) => {
                tracing::info!(host = %id, rows = rows.len(), "fetched metadata");
                outcome.fetched.push(HostRows { host: id, rows });
            }
            Err(error) => {
                tracing::warn!(host = %id, error = %error, "metadata fetch failed");
                outcome.failures.push(HostFailure { host: id, error });
            }
        }
    }

    outcome
}

async fn fetch_one(
    source: &dyn MetadataSource,
    host: &HostConfig,
    timeout: Option<Duration>,
) -> Result<Vec<MetadataRow>, FetchError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, source.fetch_rows(host))
            .await
            .map_err(|_| FetchError::Timeout(limit))?,
        None => source.fetch_rows(host).await,
    }
}
