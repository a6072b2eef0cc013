//! PostgreSQL metadata source using information_schema
//!
//! This source queries `information_schema.columns` on each host. It works with:
//! - PostgreSQL 9.4+
//! - Amazon Redshift
//! - CockroachDB
//! - Other PostgreSQL-compatible databases
//!
//! Every call opens its own connection (plain or TLS via native-tls), runs a
//! single query, materializes the rows and drops the client, which ends the
//! background connection task.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let source = PostgresSource::new();
//! let host = HostConfig::new("db1.internal", "auditor", "app").with_password("secret");
//! let rows = source.fetch_rows(&host).await?;
//! ```
//!
//! Reference: https://www.postgresql.org/docs/current/information-schema-columns.html

use crate::source::{FetchError, MetadataSource};
use schemadrift_core::{HostConfig, MetadataRow};

#[cfg(feature = "postgres")]
use schemadrift_core::HostId;

#[cfg(feature = "postgres")]
use tokio_postgres::{error::SqlState, Client, Config as PgConfig, NoTls};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

/// Column inventory query
///
/// information_schema exposes names as `sql_identifier`; cast to text so the
/// driver decodes them as plain strings.
pub const COLUMNS_QUERY: &str = r#"
    SELECT
        table_schema::text,
        table_name::text,
        column_name::text
    FROM information_schema.columns
"#;

#[cfg(feature = "postgres")]
const DEFAULT_APPLICATION_NAME: &str = "schemadrift";

/// PostgreSQL metadata source
#[derive(Debug, Clone, Default)]
pub struct PostgresSource {
    _private: (),
}

impl PostgresSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build driver configuration from a host descriptor
    #[cfg(feature = "postgres")]
    fn pg_config(host: &HostConfig) -> Result<PgConfig, FetchError> {
        let mut config = PgConfig::new();
        config
            .host(&host.host)
            .port(host.port)
            .user(&host.user)
            .dbname(&host.dbname)
            .application_name(
                host.application_name
                    .as_deref()
                    .unwrap_or(DEFAULT_APPLICATION_NAME),
            );

        let password = host
            .resolve_password()
            .map_err(|e| FetchError::ConfigError(e.to_string()))?;
        if let Some(password) = password {
            config.password(password);
        }

        if let Some(secs) = host.connect_timeout_secs {
            config.connect_timeout(std::time::Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Open a client for the host, spawning its connection driver
    #[cfg(feature = "postgres")]
    async fn connect(&self, host: &HostConfig) -> Result<Client, FetchError> {
        let config = Self::pg_config(host)?;
        let id = host.id();

        tracing::debug!(host = %id, tls = host.tls, "connecting to PostgreSQL");

        if host.tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| FetchError::ConfigError(format!(
                    "Failed to create TLS connector: {}", e
                )))?;

            let tls = MakeTlsConnector::new(connector);

            let (client, connection) = config
                .connect(tls)
                .await
                .map_err(|e| classify_error(&id, e))?;

            spawn_connection(id, connection);
            Ok(client)
        } else {
            let (client, connection) = config
                .connect(NoTls)
                .await
                .map_err(|e| classify_error(&id, e))?;

            spawn_connection(id, connection);
            Ok(client)
        }
    }
}

/// Drive the connection in the background until the client is dropped
#[cfg(feature = "postgres")]
fn spawn_connection<F>(host: HostId, connection: F)
where
    F: std::future::Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(host = %host, error = %e, "PostgreSQL connection error");
        }
    });
}

/// Map a driver error onto the fetch error kinds
#[cfg(feature = "postgres")]
fn classify_error(host: &HostId, error: tokio_postgres::Error) -> FetchError {
    let message = format!("{}: {}", host, error);

    if let Some(code) = error.code() {
        if *code == SqlState::INVALID_PASSWORD
            || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION
        {
            return FetchError::AuthenticationError(message);
        }
        if *code == SqlState::INSUFFICIENT_PRIVILEGE {
            return FetchError::PermissionDenied(message);
        }
        return FetchError::QueryError(message);
    }

    let io_failure = std::error::Error::source(&error)
        .map(|source| source.is::<std::io::Error>())
        .unwrap_or(false);

    if io_failure || error.is_closed() {
        FetchError::NetworkError(message)
    } else {
        FetchError::QueryError(message)
    }
}

#[async_trait::async_trait]
impl MetadataSource for PostgresSource {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn fetch_rows(&self, host: &HostConfig) -> Result<Vec<MetadataRow>, FetchError> {
        let id = host.id();
        let client = self.connect(host).await?;

        let rows = client
            .query(COLUMNS_QUERY, &[])
            .await
            .map_err(|e| classify_error(&id, e))?;

        // Releases the connection; the driver task exits on its own
        drop(client);

        rows.iter()
            .map(|row| -> Result<MetadataRow, FetchError> {
                let schema: String = row.try_get(0).map_err(|e| invalid(&id, e))?;
                let table: String = row.try_get(1).map_err(|e| invalid(&id, e))?;
                let column: String = row.try_get(2).map_err(|e| invalid(&id, e))?;
                Ok(MetadataRow::new(schema, table, column))
            })
            .collect()
    }

    #[cfg(not(feature = "postgres"))]
    async fn fetch_rows(&self, _host: &HostConfig) -> Result<Vec<MetadataRow>, FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self, host: &HostConfig) -> Result<(), FetchError> {
        let id = host.id();
        let client = self.connect(host).await?;

        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| classify_error(&id, e))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self, _host: &HostConfig) -> Result<(), FetchError> {
        Err(FetchError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }
}

#[cfg(feature = "postgres")]
fn invalid(host: &HostId, error: tokio_postgres::Error) -> FetchError {
    FetchError::InvalidResponse(format!("{}: {}", host, error))
}
