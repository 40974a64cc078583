//! Trigger-to-output latency measurement
//!
//! The correlator pairs each trigger edge with the first output packet
//! (SBUS frame or PWM pulse) that reflects the new switch position. The
//! resulting delays feed the summary statistics and the CSV export.

mod correlator;
pub mod export;
mod stats;

pub use correlator::{Correlator, Expectation, Packet};
pub use stats::LatencySummary;
