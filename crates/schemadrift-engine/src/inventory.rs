//! Per-host inventory building
//!
//! Turns the raw row sequence a metadata source returned for one host into
//! the set of canonical identifiers the diff engine compares.

use schemadrift_core::identifier::needs_escaping;
use schemadrift_core::{CanonicalIdentifier, Granularity, HostId, MetadataRow};
use std::collections::{BTreeSet, HashSet};

/// Canonical identifiers present on one host
///
/// A set, so duplicate rows from a source collapse.
pub type HostInventory = BTreeSet<CanonicalIdentifier>;

/// Builds [`HostInventory`] values with a fixed granularity and schema filter
#[derive(Debug, Clone, Default)]
pub struct InventoryBuilder {
    granularity: Granularity,
    exclude_schemas: HashSet<String>,
}

impl InventoryBuilder {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            exclude_schemas: HashSet::new(),
        }
    }

    /// Skip rows whose schema is in `schemas` (exact, case-sensitive match)
    pub fn with_excluded_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_schemas.extend(schemas.into_iter().map(Into::into));
        self
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Normalize one host's rows into its inventory
    pub fn build<'a, I>(&self, host: &HostId, rows: I) -> HostInventory
    where
        I: IntoIterator<Item = &'a MetadataRow>,
    {
        let mut inventory = HostInventory::new();
        let mut escaped = 0usize;
        let mut skipped = 0usize;

        for row in rows {
            if self.exclude_schemas.contains(&row.schema) {
                skipped += 1;
                continue;
            }

            if needs_escaping(row) {
                escaped += 1;
            }

            inventory.insert(self.granularity.identify(row));
        }

        if escaped > 0 {
            tracing::warn!(
                host = %host,
                count = escaped,
                "identifier components contain '.' or '\\'; names are escaped in the report"
            );
        }

        tracing::debug!(
            host = %host,
            identifiers = inventory.len(),
            skipped,
            granularity = %self.granularity,
            "built host inventory"
        );

        inventory
    }
}
