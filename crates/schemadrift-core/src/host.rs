//! Host identity and raw metadata rows

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable label for a configured host
///
/// Used as the map key for inventories and as the report column name, so it
/// never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(String);

impl HostId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostId {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for HostId {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One `(schema, table, column)` triple as returned by a metadata source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataRow {
    /// Schema name (`table_schema`)
    pub schema: String,

    /// Table name
    pub table: String,

    /// Column name
    pub column: String,
}

impl MetadataRow {
    pub fn new(schema: impl Into<String>, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }
}
