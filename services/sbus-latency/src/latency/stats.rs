//! Delay summary statistics

use std::fmt;

use crate::error::{LatencyError, Result};

/// An extreme delay and the trigger time it was observed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub delay_ms: f64,
    pub trigger_time_ms: f64,
}

/// Summary of all correlated delays
#[derive(Debug, Clone, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub average_ms: f64,
    pub min: Extremum,
    pub max: Extremum,
}

impl LatencySummary {
    /// Summarize `(trigger_time_ms, delay_ms)` pairs
    ///
    /// Ties keep the earliest occurrence. An empty input has no average and is
    /// reported as [`LatencyError::EmptyResultSet`].
    pub fn from_delays<I>(delays: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut count = 0usize;
        let mut total = 0.0;
        let mut min: Option<Extremum> = None;
        let mut max: Option<Extremum> = None;

        for (trigger_time_ms, delay_ms) in delays {
            count += 1;
            total += delay_ms;
            let current = Extremum {
                delay_ms,
                trigger_time_ms,
            };
            if min.map_or(true, |m| delay_ms < m.delay_ms) {
                min = Some(current);
            }
            if max.map_or(true, |m| delay_ms > m.delay_ms) {
                max = Some(current);
            }
        }

        match (min, max) {
            (Some(min), Some(max)) => Ok(Self {
                count,
                average_ms: total / count as f64,
                min,
                max,
            }),
            _ => Err(LatencyError::EmptyResultSet),
        }
    }
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Count = {} transitions", self.count)?;
        writeln!(f, "  Average = {:.1}ms", self.average_ms)?;
        writeln!(
            f,
            "  Mini = {:.1}ms @ {:.6}s",
            self.min.delay_ms,
            self.min.trigger_time_ms / 1000.0
        )?;
        write!(
            f,
            "  Maxi = {:.1}ms @ {:.6}s",
            self.max.delay_ms,
            self.max.trigger_time_ms / 1000.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let summary =
            LatencySummary::from_delays([(1000.0, 3.0), (2000.0, 5.0), (3000.0, 4.0)]).unwrap();

        assert_eq!(summary.count, 3);
        assert_eq!(summary.average_ms, 4.0);
        assert_eq!(summary.min.delay_ms, 3.0);
        assert_eq!(summary.min.trigger_time_ms / 1000.0, 1.0);
        assert_eq!(summary.max.delay_ms, 5.0);
        // The maximum is reported with the time of the trigger that produced it
        assert_eq!(summary.max.trigger_time_ms, 2000.0);
    }

    #[test]
    fn test_ties_keep_first() {
        let summary = LatencySummary::from_delays([(10.0, 2.0), (20.0, 2.0)]).unwrap();
        assert_eq!(summary.min.trigger_time_ms, 10.0);
        assert_eq!(summary.max.trigger_time_ms, 10.0);
    }

    #[test]
    fn test_empty_result_set() {
        let result = LatencySummary::from_delays(std::iter::empty());
        assert!(matches!(result, Err(LatencyError::EmptyResultSet)));
    }

    #[test]
    fn test_display() {
        let summary =
            LatencySummary::from_delays([(1000.0, 3.0), (2000.0, 5.0), (3000.0, 4.0)]).unwrap();
        let text = summary.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "  Count = 3 transitions",
                "  Average = 4.0ms",
                "  Mini = 3.0ms @ 1.000000s",
                "  Maxi = 5.0ms @ 2.000000s",
            ]
        );
    }
}
