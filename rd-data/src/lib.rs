//! Loading snapshots and tabular inputs for the R&D credit engine.
//!
//! - [`SnapshotLoader`] reads a full [`rd_core::CreditCalculationInput`] from JSON.
//! - [`csv_loader`] reads historical data, contractor and supply expenses from CSV.
//! - [`logging`] installs the `tracing` subscriber used by the `rd-credit` binary.

pub mod csv_loader;
pub mod loader;
pub mod logging;
pub mod utils;

pub use csv_loader::CsvLoadError;
pub use loader::{SnapshotLoadError, SnapshotLoader};
