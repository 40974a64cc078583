//! SBUS frame reconstruction
//!
//! SBUS is a 100 kbaud, 8E2, inverted UART carrying 25-byte frames:
//! - Byte 0: header (0x0F)
//! - Bytes 1-22: 16 channels x 11 bits, LSB first
//! - Byte 23: flags (ch17, ch18, frame lost, failsafe)
//! - Byte 24: footer (0x00)
//!
//! Frames are separated by an idle gap of several milliseconds, which is the
//! only framing information available in a raw logic capture.

mod assembler;
mod frame;

pub use assembler::assemble_frames;
pub use frame::{Frame, SwitchByte};

#[cfg(test)]
pub(crate) use frame::{test_support, FLAG_FAILSAFE, FLAG_FRAME_LOST};
