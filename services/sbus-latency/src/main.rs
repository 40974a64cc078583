//! SBUS Latency - switch-to-output delay from logic analyzer captures
//!
//! Reads a CSV capture holding a trigger channel (a switch wired to the
//! radio) and an output channel (the receiver's SBUS line or a servo PWM
//! output), decodes the output, and measures how long each switch toggle takes
//! to show up on it.

mod capture;
mod config;
mod error;
mod latency;
mod pwm;
mod sbus;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, trace, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use capture::Capture;
use config::{
    parse_byte, Config, ExportConfig, SerialProfile, Signal, DEFAULT_HIGHVAL, DEFAULT_LOWVAL,
};
use latency::{export::export_delays, Correlator, LatencySummary};
use pwm::{assemble_pulses, PulseWidth};
use sbus::{assemble_frames, Frame, SwitchByte};

#[derive(Parser, Debug)]
#[command(version, about = "Measure switch to SBUS/PWM latency from a logic analyzer CSV capture")]
struct Args {
    /// File to parse
    file: PathBuf,

    /// The column in the csv file where is your trigger
    #[arg(long)]
    trigger: usize,

    /// The column in the csv file where is your PWM output
    #[arg(long)]
    pwm: Option<usize>,

    /// The column in the csv file where is your SBUS output
    #[arg(long)]
    sbus: Option<usize>,

    /// The value of SBUS byte 1 when trigger=HIGH
    #[arg(long, default_value_t = DEFAULT_HIGHVAL, value_parser = parse_byte)]
    highval: u8,

    /// The value of SBUS byte 1 when trigger=LOW
    #[arg(long, default_value_t = DEFAULT_LOWVAL, value_parser = parse_byte)]
    lowval: u8,

    /// CSV file to export latency values
    #[arg(long)]
    export: Option<PathBuf>,

    /// CSV column title
    #[arg(long, default_value = "Unknown")]
    title: String,

    /// Merge into an existing export file instead of overwriting it
    #[arg(long)]
    append: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let Some(config) = build_config(args) else {
        error!("Either a PWM or SBUS column in CSV must be specified");
        return Ok(());
    };

    info!("Configuration:");
    info!("  Capture: {}", config.capture_path.display());
    info!("  Trigger column: {}", config.trigger_column);
    info!("  Output: {} on column {}", config.signal, config.signal.column());
    info!("  Debounce window: {}ms", config.debounce_window_ms);

    run(&config)
}

/// Assemble the configuration, or `None` when no output column was given
fn build_config(args: Args) -> Option<Config> {
    let signal = match (args.sbus, args.pwm) {
        (Some(column), pwm) => {
            if let Some(pwm_column) = pwm {
                warn!("Both SBUS and PWM columns given, ignoring PWM column {}", pwm_column);
            }
            Signal::Sbus {
                column,
                highval: args.highval,
                lowval: args.lowval,
            }
        }
        (None, Some(column)) => Signal::Pwm {
            column,
            threshold_us: Config::pwm_threshold_from_env(),
        },
        (None, None) => return None,
    };

    Some(Config {
        capture_path: args.file,
        trigger_column: args.trigger,
        signal,
        export: args.export.map(|path| ExportConfig {
            path,
            title: args.title,
            append: args.append,
        }),
        debounce_window_ms: Config::debounce_from_env(),
        profile: SerialProfile::from_env(),
    })
}

fn run(config: &Config) -> Result<()> {
    let delays = analyze(config)?;

    if let Some(export) = &config.export {
        let written = export_delays(
            &export.path,
            &export.title,
            export.append,
            delays.iter().map(|&(_, delay_ms)| delay_ms),
        )
        .with_context(|| format!("Failed to export delays to {}", export.path.display()))?;
        info!("Exported {} delays to {} as {:?}", written, export.path.display(), export.title);
    }

    let summary = LatencySummary::from_delays(delays.iter().copied())
        .context("Cannot compute delay statistics")?;
    println!("Delay between the switch toggle and the end of the {}:", config.signal);
    println!("{}", summary);
    Ok(())
}

/// Correlate the capture and return `(trigger_time_ms, delay_ms)` pairs
fn analyze(config: &Config) -> Result<Vec<(f64, f64)>> {
    let path = &config.capture_path;
    let capture = Capture::from_path(path)
        .with_context(|| format!("Failed to read capture {}", path.display()))?;
    if capture.is_empty() {
        warn!("Capture {} holds no samples", path.display());
    } else {
        info!("Loaded {} samples from {}", capture.len(), path.display());
    }

    let triggers = capture
        .transitions(config.trigger_column, config.debounce_window_ms)
        .context("Failed to extract trigger transitions")?;
    let output = capture
        .transitions(config.signal.column(), config.debounce_window_ms)
        .context("Failed to extract output transitions")?;
    info!(
        "Transitions: {} on trigger, {} on output",
        triggers.len(),
        output.len()
    );

    let delays: Vec<(f64, f64)> = match config.signal {
        Signal::Sbus { highval, lowval, .. } => {
            let frames = assemble_frames(&output, &config.profile);
            info!("SBUS frames: {}", frames.len());
            report_frame_flags(&frames);

            Correlator::new(&triggers, &frames, SwitchByte::new(highval, lowval))
                .inspect(|sample| {
                    trace!(
                        "Trigger @ {:.3}ms level {}: frame {}",
                        sample.trigger_time,
                        sample.trigger_level,
                        sample.packet
                    )
                })
                .map(|sample| (sample.trigger_time, sample.delay_ms))
                .collect()
        }
        Signal::Pwm { threshold_us, .. } => {
            let pulses = assemble_pulses(&output);
            info!("PWM pulses: {}", pulses.len());

            Correlator::new(&triggers, &pulses, PulseWidth { threshold_us })
                .inspect(|sample| {
                    trace!(
                        "Trigger @ {:.3}ms level {}: pulse @ {:.3}ms, {:.0}us",
                        sample.trigger_time,
                        sample.trigger_level,
                        sample.packet.rise_ms,
                        sample.packet.width_us()
                    )
                })
                .map(|sample| (sample.trigger_time, sample.delay_ms))
                .collect()
        }
    };

    info!(
        "Correlated {} of {} trigger transitions",
        delays.len(),
        triggers.len().saturating_sub(1)
    );
    Ok(delays)
}

fn report_frame_flags(frames: &[Frame]) {
    for frame in frames {
        trace!(
            "Frame @ {:.3}ms, {} edges: {}",
            frame.start(),
            frame.transitions().len(),
            frame.to_hex()
        );
        for line in flag_lines(frame) {
            println!("{}", line);
        }
    }
}

/// Lost and failsafe diagnostics of one frame, part of the program output
fn flag_lines(frame: &Frame) -> Vec<String> {
    let start_s = frame.start() / 1000.0;
    let mut lines = Vec::new();
    if frame.is_lost() {
        lines.push(format!("Frame lost bit @ {:.6}s: {}", start_s, frame));
    }
    if frame.is_failsafe() {
        lines.push(format!("Failsafe bit @ {:.6}s: {}", start_s, frame));
    }
    lines
}
