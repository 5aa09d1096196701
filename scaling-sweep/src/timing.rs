//! Trial timing window.

use std::time::Instant;

/// Opened immediately before a dispatch, read once its completion wait returns.
/// Buffer allocation and readback happen outside the window.
pub struct TrialTimer {
    opened: Instant,
}

impl TrialTimer {
    pub fn open() -> Self {
        Self {
            opened: Instant::now(),
        }
    }

    /// Milliseconds since the window opened.
    pub fn elapsed_ms(&self) -> f64 {
        self.opened.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_window_covers_blocking_wait() {
        let timer = TrialTimer::open();
        std::thread::sleep(Duration::from_millis(10));
        let ms = timer.elapsed_ms();
        assert!(ms >= 9.0, "window closed early at {ms} ms");
    }

    #[test]
    fn test_work_before_open_is_excluded() {
        std::thread::sleep(Duration::from_millis(30));
        let timer = TrialTimer::open();
        let ms = timer.elapsed_ms();
        assert!((0.0..30.0).contains(&ms), "window includes setup: {ms} ms");
    }
}
