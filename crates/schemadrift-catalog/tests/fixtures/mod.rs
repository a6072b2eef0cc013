//! Test fixtures for metadata source integration tests
//!
//! Column inventories for a small application database as it might look on
//! a primary, a lagging replica, and a staging copy with extra work-in-progress
//! objects.

use schemadrift_core::{HostConfig, MetadataRow};

fn rows(columns: &[(&str, &str, &str)]) -> Vec<MetadataRow> {
    columns
        .iter()
        .map(|(schema, table, column)| MetadataRow::new(*schema, *table, *column))
        .collect()
}

/// Host descriptor labelled `name`
pub fn host(name: &str) -> HostConfig {
    HostConfig::new(format!("{}.internal", name), "auditor", "app").with_name(name)
}

/// Full schema on the primary
pub fn primary_rows() -> Vec<MetadataRow> {
    rows(&[
        ("public", "users", "id"),
        ("public", "users", "email"),
        ("public", "users", "created_at"),
        ("public", "orders", "id"),
        ("public", "orders", "user_id"),
        ("public", "orders", "total_amount"),
        ("billing", "invoices", "id"),
        ("billing", "invoices", "order_id"),
        ("information_schema", "tables", "table_name"),
    ])
}

/// Replica missing the latest migration (`orders.total_amount`) and the
/// whole `billing` schema
pub fn replica_rows() -> Vec<MetadataRow> {
    rows(&[
        ("public", "users", "id"),
        ("public", "users", "email"),
        ("public", "users", "created_at"),
        ("public", "orders", "id"),
        ("public", "orders", "user_id"),
        ("information_schema", "tables", "table_name"),
    ])
}

/// Staging with an extra table that exists nowhere else, returned with
/// duplicate rows the way a join-based catalog query can
pub fn staging_rows() -> Vec<MetadataRow> {
    let mut staging = primary_rows();
    staging.extend(rows(&[
        ("public", "feature_flags", "id"),
        ("public", "feature_flags", "name"),
        ("public", "feature_flags", "name"),
    ]));
    staging
}
