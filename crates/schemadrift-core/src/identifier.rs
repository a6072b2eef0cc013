//! Canonical identifiers and the identifier normalizer
//!
//! Every structural element observed on a host is flattened into a single
//! string so that inventories from different hosts can be compared with plain
//! set operations. Components are joined with `.`; a literal `.` or `\` inside
//! a component is escaped with `\`, so the mapping stays injective even for
//! quoted names such as `"web.v2"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::host::MetadataRow;

/// Separator placed between identifier components
pub const SEPARATOR: char = '.';

/// Escape character used for separators (and itself) inside a component
pub const ESCAPE: char = '\\';

/// A flattened `schema.table.column` identifier
///
/// Ordering is plain lexicographic ordering on the canonical string, which
/// groups identifiers by schema, then table, then column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalIdentifier(String);

impl CanonicalIdentifier {
    /// Normalize a `(schema, table, column)` triple
    ///
    /// Total and pure: any input strings are accepted, empty components are
    /// kept as empty segments.
    pub fn normalize(schema: &str, table: &str, column: &str) -> Self {
        Self::join(&[schema, table, column])
    }

    /// Normalize a `(schema, table)` pair for table-level inventories
    pub fn normalize_table(schema: &str, table: &str) -> Self {
        Self::join(&[schema, table])
    }

    /// Normalize a bare schema name for schema-level inventories
    pub fn normalize_schema(schema: &str) -> Self {
        Self::join(&[schema])
    }

    /// Wrap a string that is already in canonical form
    ///
    /// Used when reading identifiers back from a saved report or writing
    /// literal fixtures. No escaping is applied.
    pub fn from_canonical(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    fn join(components: &[&str]) -> Self {
        let capacity = components.iter().map(|c| c.len() + 1).sum();
        let mut out = String::with_capacity(capacity);

        for (i, component) in components.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            escape_into(&mut out, component);
        }

        Self(out)
    }

    /// Decode the identifier back into its unescaped components
    pub fn components(&self) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut chars = self.0.chars();

        while let Some(ch) = chars.next() {
            match ch {
                ESCAPE => {
                    // A trailing lone escape can only come from from_canonical
                    if let Some(next) = chars.next() {
                        current.push(next);
                    } else {
                        current.push(ESCAPE);
                    }
                }
                SEPARATOR => parts.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }

        parts.push(current);
        parts
    }

    /// The canonical string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn escape_into(out: &mut String, component: &str) {
    for ch in component.chars() {
        if ch == SEPARATOR || ch == ESCAPE {
            out.push(ESCAPE);
        }
        out.push(ch);
    }
}

/// Whether any component of a row needed escaping
///
/// Not an error: the identifier is still unambiguous, but operators reading a
/// report should know the printed name contains escapes.
pub fn needs_escaping(row: &MetadataRow) -> bool {
    [&row.schema, &row.table, &row.column]
        .iter()
        .any(|c| c.contains(SEPARATOR) || c.contains(ESCAPE))
}

/// Level at which structure is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Compare schema names only
    Schema,

    /// Compare `schema.table`
    Table,

    /// Compare `schema.table.column`
    #[default]
    Column,
}

impl Granularity {
    /// Canonical identifier of a row at this granularity
    pub fn identify(&self, row: &MetadataRow) -> CanonicalIdentifier {
        match self {
            Self::Schema => CanonicalIdentifier::normalize_schema(&row.schema),
            Self::Table => CanonicalIdentifier::normalize_table(&row.schema, &row.table),
            Self::Column => CanonicalIdentifier::normalize(&row.schema, &row.table, &row.column),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Column => "column",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "schema" | "schemas" => Ok(Self::Schema),
            "table" | "tables" => Ok(Self::Table),
            "column" | "columns" => Ok(Self::Column),
            other => Err(format!(
                "unknown granularity '{}' (expected schema, table or column)",
                other
            )),
        }
    }
}
