//! SBUS frame decoding from raw line timing

use std::fmt;

use crate::capture::Transition;
use crate::config::SerialProfile;
use crate::latency::{Expectation, Packet};

/// Bytes in one SBUS frame
pub const FRAME_LEN: usize = 25;

/// Index of the flags byte
pub const STATUS_BYTE: usize = 23;

/// Flags bit set by the receiver when a frame was lost
pub const FLAG_FRAME_LOST: u8 = 0x04;

/// Flags bit set by the receiver when it entered failsafe
pub const FLAG_FAILSAFE: u8 = 0x08;

/// One burst of serial activity, kept as raw transitions
///
/// Bytes are decoded on demand by sampling the line level at fixed offsets
/// from the first transition, so a frame never needs a clock recovery step.
#[derive(Debug, Clone)]
pub struct Frame {
    transitions: Vec<Transition>,
    profile: SerialProfile,
}

impl Frame {
    /// Open a frame on its first transition
    pub fn new(first: Transition, profile: SerialProfile) -> Self {
        Self {
            transitions: vec![first],
            profile,
        }
    }

    pub(super) fn push(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Time of the first transition (ms)
    pub fn start(&self) -> f64 {
        self.transitions[0].time_ms
    }

    /// Time of the last transition (ms)
    pub fn end(&self) -> f64 {
        self.transitions[self.transitions.len() - 1].time_ms
    }

    /// Line level in effect at `time`
    ///
    /// This is the level of the last transition at or before `time`, or 0
    /// before the first one.
    pub fn value(&self, time: f64) -> u8 {
        let idx = self.transitions.partition_point(|t| t.time_ms <= time);
        if idx == 0 {
            0
        } else {
            self.transitions[idx - 1].level
        }
    }

    /// Decode byte `index` of the frame, LSB first
    pub fn byte(&self, index: usize) -> u8 {
        let profile = &self.profile;
        let mut t =
            self.start() + profile.byte_period_ms * index as f64 + profile.first_bit_offset_ms;
        let mut value = 0u8;

        for bit in 0..8 {
            let level = self.value(t);
            let bit_value = if profile.inverted { 1 - level } else { level };
            value |= bit_value << bit;
            t += profile.bit_period_ms;
        }

        value
    }

    /// All decoded bytes
    pub fn bytes(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.byte(i);
        }
        bytes
    }

    /// Flags byte reports a lost frame
    pub fn is_lost(&self) -> bool {
        self.byte(STATUS_BYTE) & FLAG_FRAME_LOST != 0
    }

    /// Flags byte reports failsafe
    pub fn is_failsafe(&self) -> bool {
        self.byte(STATUS_BYTE) & FLAG_FAILSAFE != 0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.bytes())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}ms", self.start())?;
        for byte in self.bytes() {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

impl Packet for Frame {
    fn start(&self) -> f64 {
        Frame::start(self)
    }

    fn end(&self) -> f64 {
        Frame::end(self)
    }
}

/// Expected value of one payload byte for each switch position
///
/// On an SBUS link byte 1 carries the low bits of the channel the switch is
/// mapped to, so two distinct channel values produce two distinct bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchByte {
    pub index: usize,
    pub highval: u8,
    pub lowval: u8,
}

impl SwitchByte {
    pub fn new(highval: u8, lowval: u8) -> Self {
        Self {
            index: 1,
            highval,
            lowval,
        }
    }
}

impl Expectation<Frame> for SwitchByte {
    fn matches(&self, frame: &Frame, level: u8) -> bool {
        let expected = if level == 1 { self.highval } else { self.lowval };
        frame.byte(self.index) == expected
    }
}

/// Line-level synthesis of SBUS frames for tests
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    const BIT_MS: f64 = 0.010;
    const BYTE_MS: f64 = 0.120;

    /// Transitions of an inverted 8E2 UART sending `bytes` from `start_ms`
    pub fn encode_frame(start_ms: f64, bytes: &[u8]) -> Vec<Transition> {
        let mut transitions = Vec::new();
        // Inverted idle line is low
        let mut line = 0u8;

        for (i, &byte) in bytes.iter().enumerate() {
            let parity = (byte.count_ones() % 2) as u8;
            let mut bits = vec![0u8];
            bits.extend((0..8).map(|b| (byte >> b) & 1));
            bits.push(parity);
            bits.extend([1, 1]);

            let byte_start = start_ms + BYTE_MS * i as f64;
            for (slot, bit) in bits.into_iter().enumerate() {
                let level = 1 - bit;
                if level != line {
                    transitions.push(Transition::new(byte_start + BIT_MS * slot as f64, level));
                    line = level;
                }
            }
        }

        transitions
    }

    /// A full 25-byte frame with the given channel byte and flags
    pub fn sbus_bytes(channel_byte: u8, flags: u8) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = 0x0F;
        bytes[1] = channel_byte;
        for (i, b) in bytes.iter_mut().enumerate().take(STATUS_BYTE).skip(2) {
            *b = (i as u8).wrapping_mul(37);
        }
        bytes[STATUS_BYTE] = flags;
        bytes
    }

    /// A decoded frame carrying `bytes`, starting at `start_ms`
    pub fn frame_at(start_ms: f64, bytes: &[u8]) -> Frame {
        let transitions = encode_frame(start_ms, bytes);
        let mut frame = Frame::new(transitions[0], SerialProfile::SBUS);
        for &t in &transitions[1..] {
            frame.push(t);
        }
        frame
    }
}
