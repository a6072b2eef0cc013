//! Integration tests for metadata sources
//!
//! These tests run the full pipeline (source → survey → inventory → presence
//! matrix) against the mock source. Tests requiring a real database are
//! marked with `#[ignore]` and can be run with `cargo test -- --ignored`.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all non-ignored tests (no credentials required)
//! cargo test -p schemadrift-catalog --test integration_tests
//!
//! # Run PostgreSQL integration tests
//! PGHOST=localhost \
//! PGPORT=5432 \
//! PGDATABASE=mydb \
//! PGUSER=user \
//! PGPASSWORD=pass \
//! cargo test -p schemadrift-catalog --features postgres --test integration_tests -- --ignored
//! ```

mod fixtures;

use pretty_assertions::assert_eq;
use schemadrift_catalog::{
    survey, FetchError, MockSourceBuilder, SurveyOptions, SurveyOutcome,
};
use schemadrift_core::{Granularity, HostId, InventoryReport};
use schemadrift_engine::{compute_diff, HostSets, InventoryBuilder};
use std::sync::Arc;

// =============================================================================
// Helper Functions
// =============================================================================

fn builder(granularity: Granularity) -> InventoryBuilder {
    InventoryBuilder::new(granularity).with_excluded_schemas(["information_schema", "pg_catalog"])
}

fn host_sets(outcome: &SurveyOutcome, builder: &InventoryBuilder) -> HostSets {
    outcome
        .fetched
        .iter()
        .map(|fetched| (fetched.host.clone(), builder.build(&fetched.host, &fetched.rows)))
        .collect()
}

fn three_host_source() -> schemadrift_catalog::MockSource {
    MockSourceBuilder::new()
        .with_host("primary", fixtures::primary_rows())
        .with_host("replica", fixtures::replica_rows())
        .with_host("staging", fixtures::staging_rows())
        .build()
}

fn hosts() -> Vec<schemadrift_core::HostConfig> {
    vec![
        fixtures::host("primary"),
        fixtures::host("replica"),
        fixtures::host("staging"),
    ]
}

// =============================================================================
// End-to-end Tests (No credentials required)
// =============================================================================

#[tokio::test]
async fn test_column_level_presence_matrix() {
    let outcome = survey(Arc::new(three_host_source()), &hosts(), &SurveyOptions::default()).await;
    assert!(outcome.failures.is_empty());

    let sets = host_sets(&outcome, &builder(Granularity::Column));
    let matrix = compute_diff(&sets, &HostId::from("primary")).unwrap();

    let names: Vec<&str> = matrix.rows.iter().map(|r| r.object_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "billing.invoices.id",
            "billing.invoices.order_id",
            "public.feature_flags.id",
            "public.feature_flags.name",
            "public.orders.id",
            "public.orders.total_amount",
            "public.orders.user_id",
            "public.users.created_at",
            "public.users.email",
            "public.users.id",
        ]
    );
    assert_eq!(matrix.drift_count(), 5);
}

#[tokio::test]
async fn test_staging_only_objects_surface_against_baseline() {
    let outcome = survey(Arc::new(three_host_source()), &hosts(), &SurveyOptions::default()).await;
    let sets = host_sets(&outcome, &builder(Granularity::Column));
    let matrix = compute_diff(&sets, &HostId::from("primary")).unwrap();

    let flag = matrix
        .rows
        .iter()
        .find(|r| r.object_name.as_str() == "public.feature_flags.name")
        .expect("staging-only column must be reported");

    assert_eq!(flag.get(&HostId::from("primary")), Some(false));
    assert_eq!(flag.get(&HostId::from("replica")), Some(false));
    assert_eq!(flag.get(&HostId::from("staging")), Some(true));
}

#[tokio::test]
async fn test_missing_on_replica() {
    let outcome = survey(Arc::new(three_host_source()), &hosts(), &SurveyOptions::default()).await;
    let sets = host_sets(&outcome, &builder(Granularity::Column));
    let matrix = compute_diff(&sets, &HostId::from("primary")).unwrap();

    let missing: Vec<&str> = matrix
        .missing_on(&HostId::from("replica"))
        .into_iter()
        .map(|id| id.as_str())
        .collect();

    assert_eq!(
        missing,
        vec![
            "billing.invoices.id",
            "billing.invoices.order_id",
            "public.feature_flags.id",
            "public.feature_flags.name",
            "public.orders.total_amount",
        ]
    );
}

#[tokio::test]
async fn test_table_level_presence_matrix() {
    let outcome = survey(Arc::new(three_host_source()), &hosts(), &SurveyOptions::default()).await;
    let sets = host_sets(&outcome, &builder(Granularity::Table));
    let matrix = compute_diff(&sets, &HostId::from("primary")).unwrap();

    let names: Vec<&str> = matrix.rows.iter().map(|r| r.object_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["billing.invoices", "public.feature_flags", "public.orders", "public.users"]
    );

    let drifted: Vec<&str> = matrix.drift_rows().map(|r| r.object_name.as_str()).collect();
    assert_eq!(drifted, vec!["billing.invoices", "public.feature_flags"]);
}

#[tokio::test]
async fn test_failed_host_is_reported_not_treated_as_empty() {
    let source = MockSourceBuilder::new()
        .with_host("primary", fixtures::primary_rows())
        .with_error("replica", FetchError::NetworkError("connection refused".to_string()))
        .with_host("staging", fixtures::staging_rows())
        .build();

    let outcome = survey(Arc::new(source), &hosts(), &SurveyOptions::default()).await;
    let sets = host_sets(&outcome, &builder(Granularity::Column));
    let matrix = compute_diff(&sets, &HostId::from("primary")).unwrap();

    // The replica is absent from the matrix rather than shown as all-false
    assert_eq!(matrix.hosts, vec![HostId::from("primary"), HostId::from("staging")]);
    assert!(matrix.rows.iter().all(|r| r.get(&HostId::from("replica")).is_none()));

    let report = InventoryReport::new(matrix, Granularity::Column, outcome.unavailable());
    assert_eq!(report.summary.hosts_unavailable, 1);
    assert_eq!(report.unavailable[0].host, HostId::from("replica"));
    assert!(report.unavailable[0].reason.contains("connection refused"));
    assert_eq!(report.summary.drifted, 2);
}

#[tokio::test]
async fn test_failed_baseline_cannot_be_compared() {
    let source = MockSourceBuilder::new()
        .with_error("primary", FetchError::AuthenticationError("bad password".to_string()))
        .with_host("replica", fixtures::replica_rows())
        .build();

    let hosts = vec![fixtures::host("primary"), fixtures::host("replica")];
    let outcome = survey(Arc::new(source), &hosts, &SurveyOptions::default()).await;
    let sets = host_sets(&outcome, &builder(Granularity::Column));

    assert!(compute_diff(&sets, &HostId::from("primary")).is_err());
}

#[tokio::test]
async fn test_identical_hosts_report_every_object() {
    let source = MockSourceBuilder::new()
        .with_host("a", fixtures::primary_rows())
        .with_host("b", fixtures::primary_rows())
        .build();

    let hosts = vec![fixtures::host("a"), fixtures::host("b")];
    let outcome = survey(Arc::new(source), &hosts, &SurveyOptions::default()).await;
    let sets = host_sets(&outcome, &builder(Granularity::Column));
    let matrix = compute_diff(&sets, &HostId::from("a")).unwrap();

    assert_eq!(matrix.rows.len(), 8);
    assert!(matrix.is_consistent());
}

#[tokio::test]
async fn test_report_is_deterministic() {
    let mut rendered = Vec::new();

    for _ in 0..2 {
        let outcome = survey(Arc::new(three_host_source()), &hosts(), &SurveyOptions::default()).await;
        let sets = host_sets(&outcome, &builder(Granularity::Column));
        let matrix = compute_diff(&sets, &HostId::from("replica")).unwrap();
        rendered.push(serde_json::to_string(&matrix.rows).unwrap());
    }

    assert_eq!(rendered[0], rendered[1]);
}

// =============================================================================
// PostgreSQL Tests (Require credentials)
// =============================================================================

#[cfg(feature = "postgres")]
mod postgres_tests {
    use super::*;
    use schemadrift_catalog::{MetadataSource, PostgresSource};
    use schemadrift_core::HostConfig;

    /// Check if PostgreSQL credentials are available
    fn has_postgres_credentials() -> bool {
        std::env::var("PGHOST").is_ok()
    }

    fn postgres_host() -> HostConfig {
        let mut host = HostConfig::new(
            std::env::var("PGHOST").unwrap_or_else(|_| "localhost".to_string()),
            std::env::var("PGUSER").unwrap_or_else(|_| "postgres".to_string()),
            std::env::var("PGDATABASE").unwrap_or_else(|_| "postgres".to_string()),
        )
        .with_name("live");
        host.port = std::env::var("PGPORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432);
        host.password_env = Some("PGPASSWORD".to_string());
        host
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_connection() {
        if !has_postgres_credentials() {
            eprintln!("Skipping: PGHOST not set");
            return;
        }

        let source = PostgresSource::new();
        source.test_connection(&postgres_host()).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_fetch_rows() {
        if !has_postgres_credentials() {
            eprintln!("Skipping: PGHOST not set");
            return;
        }

        let source = PostgresSource::new();
        let rows = source.fetch_rows(&postgres_host()).await.unwrap();

        // information_schema always describes itself
        assert!(rows.iter().any(|r| r.schema == "information_schema"));
    }

    #[tokio::test]
    #[ignore]
    async fn test_postgres_host_matches_itself() {
        if !has_postgres_credentials() {
            eprintln!("Skipping: PGHOST not set");
            return;
        }

        let mut twin = postgres_host();
        twin.name = Some("twin".to_string());
        let hosts = vec![postgres_host(), twin];

        let outcome = survey(Arc::new(PostgresSource::new()), &hosts, &SurveyOptions::default()).await;
        assert!(outcome.failures.is_empty());

        let sets = host_sets(&outcome, &builder(Granularity::Column));
        let matrix = compute_diff(&sets, &HostId::from("live")).unwrap();
        assert!(matrix.is_consistent());
    }
}
