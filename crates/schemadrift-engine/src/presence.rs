//! Presence matrix computation
//!
//! Compares every identifier observed on any host against every host. The
//! universe is the union of all inventories, not just the baseline's, so an
//! object that exists only on a secondary host still shows up as a row with
//! the baseline column set to `false`.

use indexmap::IndexMap;
use schemadrift_core::{CanonicalIdentifier, HostId, PresenceMatrix, ReportRow, OBJECT_NAME_FIELD};
use std::collections::BTreeSet;

use crate::inventory::HostInventory;

/// Inventories keyed by host, in configured host order
pub type HostSets = IndexMap<HostId, HostInventory>;

/// Errors from [`compute_diff`]
///
/// All are configuration problems. Data content (empty inventories, no
/// overlap at all) is never an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("no host inventories to compare")]
    NoHosts,

    #[error("baseline host '{0}' has no inventory")]
    UnknownBaseline(HostId),

    #[error("host '{0}' would shadow the object_name field of every row")]
    ReservedHostName(HostId),
}

/// Build the presence matrix for `host_sets` relative to `baseline`
///
/// Columns are the baseline followed by the remaining hosts in map order.
/// Rows are sorted ascending by canonical identifier.
pub fn compute_diff(host_sets: &HostSets, baseline: &HostId) -> Result<PresenceMatrix, DiffError> {
    if host_sets.is_empty() {
        return Err(DiffError::NoHosts);
    }

    if !host_sets.contains_key(baseline) {
        return Err(DiffError::UnknownBaseline(baseline.clone()));
    }

    if let Some(host) = host_sets.keys().find(|host| host.as_str() == OBJECT_NAME_FIELD) {
        return Err(DiffError::ReservedHostName(host.clone()));
    }

    let hosts: Vec<HostId> = std::iter::once(baseline.clone())
        .chain(host_sets.keys().filter(|host| *host != baseline).cloned())
        .collect();

    let universe: BTreeSet<&CanonicalIdentifier> = host_sets.values().flatten().collect();

    let rows = universe
        .into_iter()
        .map(|id| {
            let presence = hosts
                .iter()
                .map(|host| (host.clone(), host_sets[host].contains(id)))
                .collect();

            ReportRow {
                object_name: id.clone(),
                presence,
            }
        })
        .collect();

    Ok(PresenceMatrix {
        baseline: baseline.clone(),
        hosts,
        rows,
    })
}
