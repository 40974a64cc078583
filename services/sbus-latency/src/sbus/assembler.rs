//! Gap-based frame grouping

use tracing::debug;

use super::frame::Frame;
use crate::capture::Transition;
use crate::config::SerialProfile;

/// Split a serial line's transitions into frames
///
/// A new frame starts on the first transition and whenever the time since the
/// previous transition exceeds the profile's frame gap. Every transition
/// belongs to exactly one frame, in order.
pub fn assemble_frames(transitions: &[Transition], profile: &SerialProfile) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut current: Option<Frame> = None;
    let mut last_time: Option<f64> = None;

    for &transition in transitions {
        let opens_frame = match last_time {
            Some(last) => transition.time_ms - last > profile.frame_gap_ms,
            None => true,
        };

        if opens_frame {
            if let Some(frame) = current.take() {
                frames.push(frame);
            }
            current = Some(Frame::new(transition, *profile));
        } else if let Some(frame) = current.as_mut() {
            frame.push(transition);
        }

        last_time = Some(transition.time_ms);
    }
    frames.extend(current);

    debug!(
        "Assembled {} frames from {} transitions",
        frames.len(),
        transitions.len()
    );
    frames
}
