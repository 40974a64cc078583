//! Level transitions and glitch suppression

/// A level change on one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Time of the change in milliseconds
    pub time_ms: f64,
    /// New level, 0 or 1
    pub level: u8,
}

impl Transition {
    pub fn new(time_ms: f64, level: u8) -> Self {
        Self { time_ms, level }
    }
}

/// Drop pairs of adjacent transitions closer than `window_ms`
///
/// Both edges of a pair are removed and scanning resumes after the pair, so a
/// short pulse that reverts to the previous level disappears entirely. Only
/// immediate neighbours are compared. The last transition is always kept when
/// it has no successor.
pub fn debounce(candidates: &[Transition], window_ms: f64) -> Vec<Transition> {
    let mut debounced = Vec::with_capacity(candidates.len());
    let mut i = 0;

    while i < candidates.len() {
        let current = candidates[i];
        if let Some(next) = candidates.get(i + 1) {
            if next.time_ms - current.time_ms < window_ms {
                i += 2;
                continue;
            }
        }
        debounced.push(current);
        i += 1;
    }

    debounced
}
