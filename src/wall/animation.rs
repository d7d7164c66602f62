//! Headless stand-in for the wall's animations.
//!
//! There is nothing to draw without a display, but the timing still matters:
//! the control side shows its "scanning" indicator for as long as the sweep
//! takes, so the headless wall waits as long as the on-screen one would.

use super::orchestrator::{Animator, CopyRecord};
use std::time::Duration;
use tracing::debug;

/// Pixels the scan bar moves per tick.
pub const SWEEP_STEP_PX: f64 = 16.0;

/// Tick length of the scan bar.
pub const SWEEP_TICK: Duration = Duration::from_millis(16);

/// Pause after the bar returns, before it is hidden.
pub const SWEEP_SETTLE: Duration = Duration::from_millis(200);

/// Scan bar width on a 1920px wall.
pub const DEFAULT_BAR_WIDTH: f64 = 40.0;

/// Drift then settle of a new card.
pub const ENTRANCE_DURATION: Duration = Duration::from_millis(1250 + 420);

/// How long the scan bar takes to cross the screen and come back.
///
/// The bar travels off-screen at `bar_width`, then returns at half width.
pub fn sweep_duration(screen_width: f64, bar_width: f64) -> Duration {
    let return_width = (bar_width / 2.0).round().max(1.0);
    let forward_ticks = ((screen_width + bar_width) / SWEEP_STEP_PX).ceil();
    let return_ticks = ((screen_width + 2.0 * return_width) / SWEEP_STEP_PX).ceil();
    SWEEP_TICK * (forward_ticks + return_ticks) as u32 + SWEEP_SETTLE
}

#[derive(Debug, Clone, Copy)]
pub struct TimedAnimator {
    pub sweep: Duration,
    pub entrance: Duration,
}

impl TimedAnimator {
    /// Timings of a wall `screen_width` pixels wide with a `bar_width` scan bar.
    pub fn for_screen(screen_width: f64, bar_width: f64) -> Self {
        Self {
            sweep: sweep_duration(screen_width, bar_width),
            entrance: ENTRANCE_DURATION,
        }
    }
}

impl Animator for TimedAnimator {
    async fn sweep(&mut self) {
        debug!(duration_ms = self.sweep.as_millis() as u64, "sweep");
        tokio::time::sleep(self.sweep).await;
    }

    async fn entrance(&mut self, record: &CopyRecord) {
        // The original is placed without animation.
        if record.generation.is_original() {
            return;
        }
        tokio::time::sleep(self.entrance).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_covers_both_passes_and_the_settle() {
        // 1920 + 32 forward = 122 ticks; 1920 + 32 back = 122 ticks.
        assert_eq!(sweep_duration(1920.0, 32.0), Duration::from_millis(244 * 16 + 200));
    }

    #[test]
    fn narrow_bars_still_return() {
        let d = sweep_duration(160.0, 1.0);
        // forward ceil(161/16)=11, back ceil(162/16)=11
        assert_eq!(d, Duration::from_millis(22 * 16 + 200));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_waits_for_its_duration() {
        let mut animator = TimedAnimator {
            sweep: Duration::from_secs(3),
            entrance: ENTRANCE_DURATION,
        };
        let start = tokio::time::Instant::now();
        animator.sweep().await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
