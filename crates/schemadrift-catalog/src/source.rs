//! Metadata source trait for fetching schema inventories

use schemadrift_core::{HostConfig, MetadataRow};
use std::time::Duration;

/// Errors that can occur when fetching metadata from a host
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Query failed: {0}")]
    QueryError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Trait for sources that can list every column of a host's database
///
/// Implementations open whatever connection they need inside each call and
/// release it before returning, on success and on error.
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Get the source name (e.g., "PostgreSQL")
    fn name(&self) -> &'static str;

    /// Fetch every `(schema, table, column)` triple visible on the host
    ///
    /// Order is unspecified and duplicates are allowed; the caller
    /// normalizes into a set.
    async fn fetch_rows(&self, host: &HostConfig) -> Result<Vec<MetadataRow>, FetchError>;

    /// Test the connection to the host
    ///
    /// This is useful for validating credentials before a full survey.
    async fn test_connection(&self, host: &HostConfig) -> Result<(), FetchError>;
}
