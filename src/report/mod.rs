//! Reporting utilities: reconciliation and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/quantification code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

pub mod format;
pub mod reconcile;

pub use format::*;
pub use reconcile::*;
