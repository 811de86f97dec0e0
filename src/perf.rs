/// Frame timing utilities for the demo loop and ad-hoc stage measurements.
use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        println!("[PERF] {}: {:.2}ms", self.name, elapsed.as_secs_f64() * 1000.0);
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}

/// Counts frames and reports the frame rate once per interval.
pub struct FpsCounter {
    frames: u32,
    interval: Duration,
    last_report: Instant,
}

impl FpsCounter {
    pub fn new(interval: Duration) -> Self {
        Self {
            frames: 0,
            interval,
            last_report: Instant::now(),
        }
    }

    /// Count one frame. Returns the measured FPS when a report is due.
    pub fn tick(&mut self) -> Option<f64> {
        self.frames += 1;

        let elapsed = self.last_report.elapsed();
        if elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.frames = 0;
        self.last_report = Instant::now();
        Some(fps)
    }
}
