//! Servo PWM pulse extraction
//!
//! A servo output repeats a high pulse every few milliseconds; its width
//! (typically 1000-2000 µs) encodes the channel value. A switch maps to two
//! widths on either side of the center.

use tracing::debug;

use crate::capture::Transition;
use crate::latency::{Expectation, Packet};

/// One high period of a PWM line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    /// Rising edge (ms)
    pub rise_ms: f64,
    /// Falling edge (ms)
    pub fall_ms: f64,
}

impl Pulse {
    pub fn width_us(&self) -> f64 {
        (self.fall_ms - self.rise_ms) * 1000.0
    }
}

impl Packet for Pulse {
    fn start(&self) -> f64 {
        self.rise_ms
    }

    fn end(&self) -> f64 {
        self.fall_ms
    }
}

/// Pair each rising edge with the next falling edge
///
/// A falling edge with no preceding rise (capture started mid-pulse) and a
/// rise with no following fall (capture ended mid-pulse) are ignored.
pub fn assemble_pulses(transitions: &[Transition]) -> Vec<Pulse> {
    let mut pulses = Vec::new();
    let mut rise: Option<f64> = None;

    for transition in transitions {
        match (transition.level, rise) {
            (1, _) => rise = Some(transition.time_ms),
            (0, Some(rise_ms)) => {
                pulses.push(Pulse {
                    rise_ms,
                    fall_ms: transition.time_ms,
                });
                rise = None;
            }
            _ => {}
        }
    }

    if pulses.len() > 1 {
        let span = pulses[pulses.len() - 1].rise_ms - pulses[0].rise_ms;
        debug!(
            "Assembled {} pulses, average period {:.3}ms",
            pulses.len(),
            span / (pulses.len() - 1) as f64
        );
    }
    pulses
}

/// Pulse width threshold separating the two switch positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseWidth {
    pub threshold_us: f64,
}

impl Expectation<Pulse> for PulseWidth {
    fn matches(&self, pulse: &Pulse, level: u8) -> bool {
        (pulse.width_us() > self.threshold_us) == (level == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latency::Correlator;

    /// PWM line with one pulse every 20 ms starting at `first_ms`
    fn pwm_line(first_ms: f64, widths_us: &[f64]) -> Vec<Transition> {
        let mut transitions = vec![Transition::new(0.0, 0)];
        for (i, width) in widths_us.iter().enumerate() {
            let rise = first_ms + 20.0 * i as f64;
            transitions.push(Transition::new(rise, 1));
            transitions.push(Transition::new(rise + width / 1000.0, 0));
        }
        transitions
    }

    #[test]
    fn test_assemble_pulses() {
        let line = pwm_line(5.0, &[1000.0, 2000.0, 1500.0]);
        let pulses = assemble_pulses(&line);

        assert_eq!(pulses.len(), 3);
        assert_eq!(pulses[0].rise_ms, 5.0);
        assert!((pulses[0].width_us() - 1000.0).abs() < 1e-6);
        assert!((pulses[1].width_us() - 2000.0).abs() < 1e-6);
        assert_eq!(pulses[2].start(), 45.0);
    }

    #[test]
    fn test_partial_pulses_are_ignored() {
        let line = vec![
            Transition::new(0.0, 1),
            Transition::new(0.5, 0),
            Transition::new(20.0, 1),
            Transition::new(21.0, 0),
            Transition::new(40.0, 1), // capture ends while high
        ];
        let pulses = assemble_pulses(&line);
        // A capture starting high counts its first edge as a rise
        assert_eq!(pulses.len(), 2);
        assert_eq!(pulses[1].rise_ms, 20.0);

        let line = vec![Transition::new(0.0, 0), Transition::new(1.0, 0)];
        assert!(assemble_pulses(&line).is_empty());
    }

    #[test]
    fn test_pulse_width_correlation() {
        let triggers = vec![
            Transition::new(0.0, 0),
            Transition::new(30.0, 1),
            Transition::new(70.0, 0),
        ];
        // Pulses rise at 5, 25, 45, 65, 85 ms
        let pulses = assemble_pulses(&pwm_line(5.0, &[1000.0, 1000.0, 2000.0, 2000.0, 1000.0]));
        let expect = PulseWidth {
            threshold_us: 1500.0,
        };

        let samples: Vec<_> = Correlator::new(&triggers, &pulses, expect).collect();
        assert_eq!(samples.len(), 2);

        // High at 30 ms: first wide pulse after it rises at 45 ms and lasts 2 ms
        assert_eq!(samples[0].packet.rise_ms, 45.0);
        assert!((samples[0].delay_ms - 17.0).abs() < 1e-9);

        // Low at 70 ms: pulse at 85 ms, 1 ms wide
        assert_eq!(samples[1].packet.rise_ms, 85.0);
        assert!((samples[1].delay_ms - 16.0).abs() < 1e-9);
    }
}
