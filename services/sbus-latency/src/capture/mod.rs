//! Logic analyzer capture input
//!
//! 1. Read the CSV export (header row, then one row per sample)
//! 2. Pick one channel column
//! 3. Reduce it to level transitions
//! 4. Drop glitch pairs shorter than the debounce window

mod reader;
mod transitions;

pub use reader::Capture;
pub use transitions::Transition;
