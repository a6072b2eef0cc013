//! SchemaDrift engine - Core business logic
//!
//! This crate implements the comparison logic for SchemaDrift:
//! - Inventory building (metadata rows to canonical identifier sets)
//! - Presence matrix computation across hosts
//!
//! Everything here is synchronous and pure; fetching rows from databases
//! lives in `schemadrift-catalog`.

pub mod inventory;
pub mod presence;

pub use inventory::{HostInventory, InventoryBuilder};
pub use presence::{compute_diff, DiffError, HostSets};
