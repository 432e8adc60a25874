//! Warm-up performance accumulator
//!
//! Measures the first few applied frame updates phase by phase, emits one
//! summary when the sample cap is reached, then goes inert.

use std::time::Duration;

/// Default number of applied updates to profile
pub const DEFAULT_SAMPLE_CAP: u32 = 10;

/// A timed phase of a frame update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Frame source lookup and decode
    Decode,
    /// Row-order normalization
    Flip,
    /// Texture upload
    Copy,
    /// Whole update, decode through commit
    Total,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Decode, Phase::Flip, Phase::Copy, Phase::Total];

    fn index(self) -> usize {
        match self {
            Phase::Decode => 0,
            Phase::Flip => 1,
            Phase::Copy => 2,
            Phase::Total => 3,
        }
    }
}

/// Update counters reported alongside the timing averages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateCounts {
    pub applied: u64,
    pub skipped: u64,
}

/// Averages over the profiled updates
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub samples: u32,
    pub avg_decode: Duration,
    pub avg_flip: Duration,
    pub avg_copy: Duration,
    pub avg_total: Duration,
    pub counts: UpdateCounts,
}

impl PerformanceSummary {
    pub fn average(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Decode => self.avg_decode,
            Phase::Flip => self.avg_flip,
            Phase::Copy => self.avg_copy,
            Phase::Total => self.avg_total,
        }
    }

    fn log(&self) {
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        tracing::info!(
            samples = self.samples,
            decode_ms = ms(self.avg_decode),
            flip_ms = ms(self.avg_flip),
            copy_ms = ms(self.avg_copy),
            total_ms = ms(self.avg_total),
            applied = self.counts.applied,
            skipped = self.counts.skipped,
            "Frame update warm-up stats"
        );
    }
}

/// One-shot profiler for the first `cap` applied updates
#[derive(Debug, Clone)]
pub struct PerformanceAccumulator {
    totals: [Duration; 4],
    samples: u32,
    cap: u32,
    summary: Option<PerformanceSummary>,
}

impl Default for PerformanceAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_CAP)
    }
}

impl PerformanceAccumulator {
    /// Create an accumulator; a cap of 0 disables profiling
    pub fn new(cap: u32) -> Self {
        Self {
            totals: [Duration::ZERO; 4],
            samples: 0,
            cap,
            summary: None,
        }
    }

    /// Whether timings are still being collected
    pub fn is_recording(&self) -> bool {
        self.samples < self.cap
    }

    /// Add `duration` to the running total for `phase`
    pub fn record(&mut self, phase: Phase, duration: Duration) {
        if self.is_recording() {
            self.totals[phase.index()] += duration;
        }
    }

    /// Count one applied update.
    ///
    /// Returns the summary on the call that reaches the cap, `None` otherwise.
    pub fn sample(&mut self, counts: UpdateCounts) -> Option<&PerformanceSummary> {
        if !self.is_recording() {
            return None;
        }
        self.samples += 1;
        if self.samples < self.cap {
            return None;
        }

        let avg = |phase: Phase| self.totals[phase.index()] / self.samples;
        let summary = PerformanceSummary {
            samples: self.samples,
            avg_decode: avg(Phase::Decode),
            avg_flip: avg(Phase::Flip),
            avg_copy: avg(Phase::Copy),
            avg_total: avg(Phase::Total),
            counts,
        };
        summary.log();
        self.summary = Some(summary);
        self.summary.as_ref()
    }

    /// Running total for `phase`
    pub fn total(&self, phase: Phase) -> Duration {
        self.totals[phase.index()]
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// The finalized summary, once the cap has been reached
    pub fn summary(&self) -> Option<&PerformanceSummary> {
        self.summary.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(applied: u64) -> UpdateCounts {
        UpdateCounts { applied, skipped: 0 }
    }

    #[test]
    fn test_emits_exactly_once_at_cap() {
        let mut acc = PerformanceAccumulator::new(3);
        let mut emitted = 0;
        for i in 1..=6 {
            acc.record(Phase::Decode, Duration::from_millis(3));
            acc.record(Phase::Total, Duration::from_millis(4));
            if acc.sample(counts(i)).is_some() {
                emitted += 1;
                assert_eq!(i, 3);
            }
        }
        assert_eq!(emitted, 1);
        assert_eq!(acc.samples(), 3);
        assert!(!acc.is_recording());

        let summary = acc.summary().unwrap();
        assert_eq!(summary.samples, 3);
        assert_eq!(summary.avg_decode, Duration::from_millis(3));
        assert_eq!(summary.average(Phase::Total), Duration::from_millis(4));
        assert_eq!(summary.counts.applied, 3);
    }

    #[test]
    fn test_inert_after_cap() {
        let mut acc = PerformanceAccumulator::new(1);
        acc.record(Phase::Copy, Duration::from_millis(2));
        assert!(acc.sample(counts(1)).is_some());
        acc.record(Phase::Copy, Duration::from_millis(50));
        assert_eq!(acc.total(Phase::Copy), Duration::from_millis(2));
    }

    #[test]
    fn test_zero_cap_disables() {
        let mut acc = PerformanceAccumulator::new(0);
        assert!(!acc.is_recording());
        acc.record(Phase::Flip, Duration::from_millis(1));
        assert!(acc.sample(counts(1)).is_none());
        assert_eq!(acc.total(Phase::Flip), Duration::ZERO);
        assert!(acc.summary().is_none());
    }

    #[test]
    fn test_default_cap() {
        assert_eq!(PerformanceAccumulator::default().cap(), 10);
    }
}
