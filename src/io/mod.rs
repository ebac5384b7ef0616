//! Input/output helpers.
//!
//! - batch CSV ingest + validation (`ingest`)
//! - result-table exports (CSV/JSON) (`export`)
//!
//! Spreadsheet styling and HTML rendering live outside this crate; these
//! helpers only move flat record tables in and out.

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
