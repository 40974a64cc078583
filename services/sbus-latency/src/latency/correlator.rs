//! Trigger edge to output packet correlation

use tracing::debug;

use crate::capture::Transition;

/// A unit of output activity with a time span
pub trait Packet {
    /// Time of the first edge (ms)
    fn start(&self) -> f64;

    /// Time of the last edge (ms)
    fn end(&self) -> f64;

    /// Packet starts at or after `t`
    fn is_after(&self, t: f64) -> bool {
        self.start() >= t
    }
}

/// Decides whether a packet carries the output expected for a trigger level
pub trait Expectation<P> {
    fn matches(&self, packet: &P, level: u8) -> bool;
}

/// One matched trigger edge
#[derive(Debug)]
pub struct DelaySample<'a, P> {
    /// Time of the trigger edge (ms)
    pub trigger_time: f64,
    pub trigger_level: u8,
    /// First packet after the edge reflecting the new level
    pub packet: &'a P,
    /// Time from the edge to the end of the packet (ms)
    pub delay_ms: f64,
}

/// Lazy iterator of delay samples
///
/// The first trigger transition is the initial state of the switch and is
/// never correlated. Triggers with no matching packet are skipped.
///
/// Packets and triggers are both time ordered, so the search for each trigger
/// resumes at the first packet starting at or after it instead of rescanning
/// the whole list; the selected packet is the same either way.
pub struct Correlator<'a, P, E> {
    triggers: std::slice::Iter<'a, Transition>,
    packets: &'a [P],
    expectation: E,
    cursor: usize,
}

impl<'a, P: Packet, E: Expectation<P>> Correlator<'a, P, E> {
    pub fn new(triggers: &'a [Transition], packets: &'a [P], expectation: E) -> Self {
        Self {
            triggers: triggers.get(1..).unwrap_or_default().iter(),
            packets,
            expectation,
            cursor: 0,
        }
    }
}

impl<'a, P: Packet, E: Expectation<P>> Iterator for Correlator<'a, P, E> {
    type Item = DelaySample<'a, P>;

    fn next(&mut self) -> Option<Self::Item> {
        for trigger in self.triggers.by_ref() {
            let t0 = trigger.time_ms;
            while self.cursor < self.packets.len() && !self.packets[self.cursor].is_after(t0) {
                self.cursor += 1;
            }

            let packets: &'a [P] = self.packets;
            let found = packets[self.cursor..]
                .iter()
                .find(|packet| self.expectation.matches(packet, trigger.level));

            match found {
                Some(packet) => {
                    return Some(DelaySample {
                        trigger_time: t0,
                        trigger_level: trigger.level,
                        packet,
                        delay_ms: packet.end() - t0,
                    });
                }
                None => debug!(
                    "No matching packet for trigger at {:.3}ms (level {})",
                    t0, trigger.level
                ),
            }
        }
        None
    }
}
