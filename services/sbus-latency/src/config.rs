//! Analysis configuration
//!
//! Column selection and export options come from the command line. The serial
//! timing profile and the filter windows come from environment variables and
//! fall back to the SBUS defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default SBUS byte 1 value while the trigger is high
pub const DEFAULT_HIGHVAL: u8 = 0x13;

/// Default SBUS byte 1 value while the trigger is low
pub const DEFAULT_LOWVAL: u8 = 0xAC;

/// Timing of the serial line being decoded, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SerialProfile {
    /// Duration of one byte on the wire (start + 8 data + parity + 2 stop bits)
    pub byte_period_ms: f64,

    /// Offset from the byte start to the middle of its first data bit
    pub first_bit_offset_ms: f64,

    /// Duration of one bit
    pub bit_period_ms: f64,

    /// Idle time on the line that separates two frames
    pub frame_gap_ms: f64,

    /// Line level is inverted relative to the bit value
    pub inverted: bool,
}

impl SerialProfile {
    /// SBUS at 100 kbaud, 8E2, inverted
    pub const SBUS: Self = Self {
        byte_period_ms: 0.12,
        first_bit_offset_ms: 0.015,
        bit_period_ms: 0.010,
        frame_gap_ms: 2.0,
        inverted: true,
    };

    /// Load the profile from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    /// Load the profile from any key/value source, falling back to SBUS
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let sbus = Self::SBUS;
        Self {
            byte_period_ms: parse_var(lookup("SBUS_BYTE_PERIOD_MS"))
                .unwrap_or(sbus.byte_period_ms),
            first_bit_offset_ms: parse_var(lookup("SBUS_FIRST_BIT_OFFSET_MS"))
                .unwrap_or(sbus.first_bit_offset_ms),
            bit_period_ms: parse_var(lookup("SBUS_BIT_PERIOD_MS"))
                .unwrap_or(sbus.bit_period_ms),
            frame_gap_ms: parse_var(lookup("SBUS_FRAME_GAP_MS"))
                .unwrap_or(sbus.frame_gap_ms),
            inverted: parse_var(lookup("SBUS_INVERTED")).unwrap_or(sbus.inverted),
        }
    }
}

impl Default for SerialProfile {
    fn default() -> Self {
        Self::SBUS
    }
}

/// Output signal to correlate against the trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Signal {
    /// SBUS frames, matched on the value of byte 1
    Sbus {
        column: usize,
        highval: u8,
        lowval: u8,
    },
    /// Raw PWM pulses, matched on pulse width
    Pwm { column: usize, threshold_us: f64 },
}

impl Signal {
    pub fn column(&self) -> usize {
        match self {
            Signal::Sbus { column, .. } | Signal::Pwm { column, .. } => *column,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Sbus { .. } => write!(f, "SBUS frame"),
            Signal::Pwm { .. } => write!(f, "PWM pulse"),
        }
    }
}

/// Where and how to export per-event delays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub path: PathBuf,
    pub title: String,
    pub append: bool,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Logic analyzer CSV export
    pub capture_path: PathBuf,

    /// Column of the trigger (switch) channel
    pub trigger_column: usize,

    pub signal: Signal,

    pub export: Option<ExportConfig>,

    /// Two edges closer than this are dropped as a glitch
    pub debounce_window_ms: f64,

    pub profile: SerialProfile,
}

impl Config {
    /// Default debounce window
    pub const DEBOUNCE_WINDOW_MS: f64 = 0.002;

    /// Default PWM pulse width separating the low and high switch positions
    pub const PWM_THRESHOLD_US: f64 = 1500.0;

    pub fn debounce_from_env() -> f64 {
        Self::debounce_from_lookup(env_var)
    }

    pub fn debounce_from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> f64 {
        parse_var(lookup("DEBOUNCE_WINDOW_MS")).unwrap_or(Self::DEBOUNCE_WINDOW_MS)
    }

    pub fn pwm_threshold_from_env() -> f64 {
        Self::pwm_threshold_from_lookup(env_var)
    }

    pub fn pwm_threshold_from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> f64 {
        parse_var(lookup("PWM_THRESHOLD_US")).unwrap_or(Self::PWM_THRESHOLD_US)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Unparseable values fall back to the default like missing ones
fn parse_var<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|s| s.trim().parse().ok())
}

/// Parse a byte given in decimal or with a `0x` prefix
pub fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid byte value {:?}: {}", s, e))
}
