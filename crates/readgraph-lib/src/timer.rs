//! Wall-clock timing of pipeline stages
//!
//! Used for progress reporting only; nothing branches on the measured
//! times.

use crate::hasher::{new_map, DetHashMap};
use std::time::Instant;
use tracing::warn;

/// Label of the whole-run timer
pub const TOTAL: &str = "total";

/// Named stopwatches
#[derive(Debug)]
pub struct StageTimer {
    running: DetHashMap<String, Instant>,
    elapsed: Vec<(String, f64)>,
}

impl Default for StageTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTimer {
    /// Create a timer with no running stages
    pub fn new() -> Self {
        Self {
            running: new_map(),
            elapsed: Vec::new(),
        }
    }

    /// Start (or restart) the stopwatch for `label`
    pub fn start(&mut self, label: &str) {
        self.running.insert(label.to_string(), Instant::now());
    }

    /// Stop the stopwatch for `label` and return elapsed seconds
    ///
    /// Stopping a label that was never started logs a warning and
    /// returns 0.
    pub fn stop(&mut self, label: &str) -> f64 {
        match self.running.remove(label) {
            Some(started) => {
                let secs = started.elapsed().as_secs_f64();
                self.elapsed.push((label.to_string(), secs));
                secs
            }
            None => {
                warn!("Timer stopped for unknown stage {label:?}");
                0.0
            }
        }
    }

    /// Completed stages in the order they were stopped
    pub fn stages(&self) -> &[(String, f64)] {
        &self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        let mut timer = StageTimer::new();
        timer.start(TOTAL);
        timer.start("load");
        let load = timer.stop("load");
        let total = timer.stop(TOTAL);
        assert!(load >= 0.0);
        assert!(total >= load);
        let labels: Vec<_> = timer.stages().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["load", TOTAL]);
    }

    #[test]
    fn test_stop_unknown_label() {
        let mut timer = StageTimer::new();
        assert_eq!(timer.stop("never"), 0.0);
        assert!(timer.stages().is_empty());
    }
}
