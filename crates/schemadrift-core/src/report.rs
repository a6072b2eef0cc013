//! Report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::host::HostId;
use crate::identifier::{CanonicalIdentifier, Granularity};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Fixed key of the identifier in every report row
///
/// Host ids share the row's key space, so no host may use this label.
pub const OBJECT_NAME_FIELD: &str = "object_name";

/// One identifier and its presence on every host
///
/// Serialized flat: `{"object_name": "s.t.c", "<host>": true, ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub object_name: CanonicalIdentifier,

    /// Presence per host, in report column order
    #[serde(flatten)]
    pub presence: IndexMap<HostId, bool>,
}

impl ReportRow {
    pub fn new(object_name: CanonicalIdentifier) -> Self {
        Self {
            object_name,
            presence: IndexMap::new(),
        }
    }

    /// Presence flag for a host, `None` if the host is not a report column
    pub fn get(&self, host: &HostId) -> Option<bool> {
        self.presence.get(host).copied()
    }

    /// Number of hosts the identifier exists on
    pub fn present_count(&self) -> usize {
        self.presence.values().filter(|present| **present).count()
    }

    /// Presence differs across at least two hosts
    pub fn is_drift(&self) -> bool {
        let present = self.present_count();
        present != 0 && present != self.presence.len()
    }
}

/// Identifiers × hosts → presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceMatrix {
    /// Reference host
    pub baseline: HostId,

    /// Report columns, baseline first
    pub hosts: Vec<HostId>,

    /// Rows sorted by `object_name`
    pub rows: Vec<ReportRow>,
}

impl PresenceMatrix {
    /// Rows whose presence is not uniform across hosts
    pub fn drift_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| row.is_drift())
    }

    pub fn drift_count(&self) -> usize {
        self.drift_rows().count()
    }

    /// True when every identifier exists on every host
    pub fn is_consistent(&self) -> bool {
        self.drift_count() == 0
    }

    /// Identifiers absent from the given host
    pub fn missing_on(&self, host: &HostId) -> Vec<&CanonicalIdentifier> {
        self.rows
            .iter()
            .filter(|row| row.get(host) == Some(false))
            .map(|row| &row.object_name)
            .collect()
    }
}

/// A host whose inventory could not be collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailableHost {
    pub host: HostId,

    /// Error text from the metadata source
    pub reason: String,
}

/// Summary statistics for a report
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventorySummary {
    /// Distinct identifiers across all surveyed hosts
    pub objects: usize,

    /// Identifiers not present on every surveyed host
    pub drifted: usize,

    /// Hosts whose inventory is in the matrix
    pub hosts_surveyed: usize,

    /// Hosts that failed and are absent from the matrix
    pub hosts_unavailable: usize,
}

/// Inventory report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Comparison level
    pub granularity: Granularity,

    /// Summary statistics
    pub summary: InventorySummary,

    /// Presence matrix over surveyed hosts
    pub matrix: PresenceMatrix,

    /// Hosts missing from the matrix and why
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<UnavailableHost>,
}

impl InventoryReport {
    pub fn new(matrix: PresenceMatrix, granularity: Granularity, unavailable: Vec<UnavailableHost>) -> Self {
        let summary = InventorySummary {
            objects: matrix.rows.len(),
            drifted: matrix.drift_count(),
            hosts_surveyed: matrix.hosts.len(),
            hosts_unavailable: unavailable.len(),
        };

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            granularity,
            summary,
            matrix,
            unavailable,
        }
    }

    /// At least one identifier is missing from some surveyed host
    pub fn has_drift(&self) -> bool {
        self.summary.drifted > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
