//! Calibration evaluation, splitting, and sample quantification.
//!
//! - `accuracy`: back-calculate every standard through a fitted line
//! - `partition`: split a poorly behaving calibration into two sets and
//!   derive the response-ratio cutoff that routes unknown samples
//! - `quantify`: turn sample responses into concentrations and recoveries

pub mod accuracy;
pub mod partition;
pub mod quantify;

pub use accuracy::*;
pub use partition::*;
pub use quantify::*;
