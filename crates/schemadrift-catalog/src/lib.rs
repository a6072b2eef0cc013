//! Metadata sources for schema inventories
//!
//! This crate provides sources that list every `(schema, table, column)`
//! triple on a database host, plus a concurrent survey over many hosts.
//!
//! ## Features
//!
//! Enable database support via Cargo features:
//! - `postgres` - PostgreSQL/Redshift support
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemadrift_catalog::{survey, PostgresSource, SurveyOptions};
//!
//! let outcome = survey(Arc::new(PostgresSource::new()), &hosts_file.hosts, &SurveyOptions::default()).await;
//! for failure in &outcome.failures {
//!     eprintln!("{}: {}", failure.host, failure.error);
//! }
//! ```

pub mod source;
pub mod postgres;
pub mod mock;
pub mod survey;

pub use source::{MetadataSource, FetchError};
pub use postgres::PostgresSource;
pub use mock::{MockSource, MockSourceBuilder};
pub use survey::{survey, HostFailure, HostRows, SurveyOptions, SurveyOutcome};
