//! Display math: countdown strings and completion percentage.

use super::state::TimerState;

/// Render milliseconds as `mm:ss`.
///
/// Whole seconds are ceiling-rounded so 1 ms of remaining time shows as the
/// next full second -- the display never reads `00:00` while time remains.
pub fn format_time(ms: u64) -> String {
    let total_secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

/// Completion percentage of the current phase, clamped to [0, 100].
///
/// Measured against the current mode's configured duration, not a fixed
/// constant, so it stays correct across presets and mode switches.
pub fn progress_pct(state: &TimerState) -> f64 {
    let total = state.current_duration_ms();
    if total == 0 {
        return 0.0;
    }
    let elapsed = total.saturating_sub(state.remaining_ms);
    (elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
