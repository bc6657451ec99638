//! Splash progress: the slower of a minimum display time and the photo preload.

use std::time::Duration;

use crate::layout::easing::SPLASH_EASE;

/// The splash is shown at least this long.
pub const MIN_SPLASH_DURATION: Duration = Duration::from_millis(2500);

/// After this long, missing photos no longer hold the splash back.
pub const SAFETY_TIMEOUT: Duration = Duration::from_secs(10);

/// Percentage at which the preload is considered done.
pub const COMPLETE_AT: f64 = 99.5;

/// Pause at 100% before the board replaces the splash.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadProgress {
    total: usize,
    loaded: usize,
}

impl PreloadProgress {
    pub fn new(total: usize) -> Self {
        Self { total, loaded: 0 }
    }

    /// Records one finished photo. Failed decodes count too.
    pub fn mark_loaded(&mut self) {
        self.loaded = (self.loaded + 1).min(self.total);
    }

    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn time_percent(&self, elapsed: Duration) -> f64 {
        let t = elapsed.as_secs_f64() / MIN_SPLASH_DURATION.as_secs_f64();
        SPLASH_EASE.ease(t) * 100.0
    }

    pub fn asset_percent(&self, elapsed: Duration) -> f64 {
        if self.total == 0 || elapsed >= SAFETY_TIMEOUT {
            return 100.0;
        }
        self.loaded as f64 / self.total as f64 * 100.0
    }

    pub fn percent(&self, elapsed: Duration) -> f64 {
        self.time_percent(elapsed).min(self.asset_percent(elapsed))
    }

    /// Whole-number value shown by the splash counter.
    pub fn counter(&self, elapsed: Duration) -> u32 {
        self.percent(elapsed).round() as u32
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        self.percent(elapsed) >= COMPLETE_AT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_gates_fast_loads() {
        let mut progress = PreloadProgress::new(2);
        progress.mark_loaded();
        progress.mark_loaded();
        assert_eq!(progress.asset_percent(Duration::ZERO), 100.0);
        assert!(progress.percent(Duration::from_millis(500)) < 100.0);
        assert!(!progress.is_complete(Duration::from_millis(500)));
        assert!(progress.is_complete(MIN_SPLASH_DURATION));
        assert_eq!(progress.counter(MIN_SPLASH_DURATION), 100);
    }

    #[test]
    fn assets_gate_slow_loads() {
        let mut progress = PreloadProgress::new(4);
        progress.mark_loaded();
        assert_eq!(progress.percent(Duration::from_secs(5)), 25.0);
        assert!(!progress.is_complete(Duration::from_secs(5)));
        for _ in 0..3 {
            progress.mark_loaded();
        }
        assert!(progress.is_complete(Duration::from_secs(5)));
    }

    #[test]
    fn safety_timeout_forces_completion() {
        let progress = PreloadProgress::new(8);
        assert_eq!(progress.percent(Duration::from_secs(9)), 0.0);
        assert!(progress.is_complete(SAFETY_TIMEOUT));
    }

    #[test]
    fn empty_preload_only_waits_for_time() {
        let progress = PreloadProgress::new(0);
        assert_eq!(progress.asset_percent(Duration::ZERO), 100.0);
        assert_eq!(progress.percent(Duration::ZERO), 0.0);
        assert!(progress.is_complete(Duration::from_secs(3)));
    }

    #[test]
    fn loaded_never_exceeds_total() {
        let mut progress = PreloadProgress::new(1);
        progress.mark_loaded();
        progress.mark_loaded();
        assert_eq!(progress.loaded(), 1);
        assert_eq!(progress.total(), 1);
    }
}
