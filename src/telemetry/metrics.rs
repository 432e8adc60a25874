//! Frame rate counter and frame timing statistics

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default trailing window for the average frame rate
pub const DEFAULT_AVERAGE_WINDOW: Duration = Duration::from_secs(5);

/// Frame timing statistics
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Average frame time in milliseconds
    pub avg_ms: f64,
    /// Minimum frame time in milliseconds
    pub min_ms: f64,
    /// Maximum frame time in milliseconds
    pub max_ms: f64,
    /// 95th percentile frame time
    pub p95_ms: f64,
    /// Number of samples in the statistics
    pub sample_count: usize,
}

/// Frame profiler for the host render loop
///
/// Reports an instantaneous FPS, refreshed once per second, and an average
/// FPS over a trailing window.
pub struct FrameProfiler {
    /// Frame start times inside the averaging window
    frame_starts: VecDeque<Instant>,
    window: Duration,
    /// Start of the current one-second counting interval
    second_start: Option<Instant>,
    frames_this_second: u32,
    fps: f64,
}

impl Default for FrameProfiler {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_WINDOW)
    }
}

impl FrameProfiler {
    pub fn new(window: Duration) -> Self {
        Self {
            frame_starts: VecDeque::with_capacity(300),
            window,
            second_start: None,
            frames_this_second: 0,
            fps: 0.0,
        }
    }

    /// Mark the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.begin_frame_at(Instant::now());
    }

    /// Mark the beginning of a frame that started at `now`
    pub fn begin_frame_at(&mut self, now: Instant) {
        self.frame_starts.push_back(now);
        while let Some(&oldest) = self.frame_starts.front() {
            if now.duration_since(oldest) > self.window {
                self.frame_starts.pop_front();
            } else {
                break;
            }
        }

        let second_start = *self.second_start.get_or_insert(now);
        self.frames_this_second += 1;
        let elapsed = now.duration_since(second_start);
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames_this_second as f64 / elapsed.as_secs_f64();
            tracing::debug!(fps = self.fps, "Frame rate");
            self.frames_this_second = 0;
            self.second_start = Some(now);
        }
    }

    /// FPS measured over the last completed one-second interval
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// FPS averaged over the trailing window
    pub fn average_fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.frame_starts.front(), self.frame_starts.back()) else {
            return 0.0;
        };
        let duration = last.duration_since(*first).as_secs_f64();
        if duration > 0.0 {
            (self.frame_starts.len() - 1) as f64 / duration
        } else {
            0.0
        }
    }

    /// Frame time statistics over the trailing window
    pub fn stats(&self) -> FrameStats {
        let mut times: Vec<f64> = self
            .frame_starts
            .iter()
            .zip(self.frame_starts.iter().skip(1))
            .map(|(a, b)| b.duration_since(*a).as_secs_f64() * 1000.0)
            .collect();
        if times.is_empty() {
            return FrameStats::default();
        }
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let sum: f64 = times.iter().sum();
        FrameStats {
            avg_ms: sum / times.len() as f64,
            min_ms: times[0],
            max_ms: times[times.len() - 1],
            p95_ms: times[((times.len() - 1) as f64 * 0.95) as usize],
            sample_count: times.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(profiler: &mut FrameProfiler, start: Instant, frames: u32, interval: Duration) -> Instant {
        let mut now = start;
        for _ in 0..frames {
            profiler.begin_frame_at(now);
            now += interval;
        }
        now
    }

    #[test]
    fn test_fps_updates_once_per_second() {
        let mut profiler = FrameProfiler::default();
        let start = Instant::now();
        run(&mut profiler, start, 30, Duration::from_millis(20));
        // 30 frames at 20ms only spans 580ms
        assert_eq!(profiler.fps(), 0.0);

        run(&mut profiler, start + Duration::from_millis(600), 21, Duration::from_millis(20));
        assert!((profiler.fps() - 51.0).abs() < 0.5, "fps = {}", profiler.fps());
    }

    #[test]
    fn test_average_over_trailing_window() {
        let mut profiler = FrameProfiler::new(Duration::from_secs(1));
        let start = Instant::now();
        // Slow frames fall out of the window
        let now = run(&mut profiler, start, 5, Duration::from_millis(500));
        run(&mut profiler, now, 101, Duration::from_millis(10));
        assert!((profiler.average_fps() - 100.0).abs() < 1.0, "avg = {}", profiler.average_fps());
    }

    #[test]
    fn test_empty_profiler() {
        let profiler = FrameProfiler::default();
        assert_eq!(profiler.fps(), 0.0);
        assert_eq!(profiler.average_fps(), 0.0);
        assert_eq!(profiler.stats().sample_count, 0);
    }

    #[test]
    fn test_stats() {
        let mut profiler = FrameProfiler::default();
        run(&mut profiler, Instant::now(), 11, Duration::from_millis(16));
        let stats = profiler.stats();
        assert_eq!(stats.sample_count, 10);
        assert!((stats.avg_ms - 16.0).abs() < 0.01);
        assert!((stats.max_ms - 16.0).abs() < 0.01);
    }
}
