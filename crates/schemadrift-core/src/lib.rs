//! SchemaDrift Core
//!
//! Core domain model with stable, versioned types.
//! The canonical identifier encoding and the report schema are part of the
//! public output format - change them only with a new report version.

pub mod host;
pub mod identifier;
pub mod report;
pub mod config;

pub use host::{HostId, MetadataRow};
pub use identifier::{CanonicalIdentifier, Granularity};
pub use report::{OBJECT_NAME_FIELD, InventoryReport, InventorySummary, PresenceMatrix, ReportRow, ReportVersion, UnavailableHost};
pub use config::{ConfigError, HostConfig, HostsFile};
