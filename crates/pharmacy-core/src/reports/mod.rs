//! Management reports.
//!
//! Reports are computed from stored records and returned as plain
//! serializable rows, each list sorted by its count (descending) with ties
//! broken by id.

mod prescriptions;
mod sales;
mod stock;

pub use prescriptions::*;
pub use sales::*;
pub use stock::*;

/// Name shown for a record that has since been deleted.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Serialize any report to pretty JSON.
pub fn to_json<T: serde::Serialize + ?Sized>(report: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
