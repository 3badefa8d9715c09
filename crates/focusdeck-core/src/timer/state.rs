//! The persisted timer record and the pure mode-flip rule.
//!
//! `TimerState` is the single source of truth for the pomodoro session. It is
//! persisted as a camelCase JSON document after every mutation and read back
//! once at engine construction. Every field carries a serde default so a
//! record written by an older or partial writer still loads (missing fields
//! are filled in, never a hard failure).

use serde::{Deserialize, Serialize};

use super::preset::{CustomDurations, Preset, PresetName};

/// Milliseconds per configured minute.
pub const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Work,
    Break,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Work => "work",
            Mode::Break => "break",
        }
    }
}

/// The sole persisted timer entity.
///
/// `last_tick_at` (epoch milliseconds) is only meaningful in the persisted
/// record: it is stamped on save while running and is the authority for
/// reconciling time that passed while no tick loop was alive. The in-memory
/// copy is authoritative for everything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    pub mode: Mode,
    pub remaining_ms: u64,
    pub preset: PresetName,
    pub is_running: bool,
    /// Completed work phases only. Break completions never count.
    pub completed_sessions: u32,
    /// Wall-clock instant of the last persistence while running; None when paused.
    pub last_tick_at: Option<u64>,
    /// Active phase lengths, in minutes.
    pub work_duration: u64,
    pub break_duration: u64,
    /// Last-used custom values, retained even while a catalog preset is active.
    pub custom_work_duration: u64,
    pub custom_break_duration: u64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::from_preset(PresetName::Pomodoro, None)
    }
}

impl TimerState {
    /// Build a fresh state from a preset. Overrides apply only to the custom
    /// preset; nothing is preserved from any prior state (the engine carries
    /// session count and retained custom durations forward explicitly).
    pub fn from_preset(name: PresetName, overrides: Option<CustomDurations>) -> Self {
        let entry = Preset::get(name);
        let (work, brk) = match (name, overrides) {
            (PresetName::Custom, Some(c)) => (c.work_min, c.break_min),
            _ => (entry.work_min, entry.break_min),
        };
        let custom = Preset::get(PresetName::Custom);
        let (custom_work, custom_break) = if name == PresetName::Custom {
            (work, brk)
        } else {
            (custom.work_min, custom.break_min)
        };
        Self {
            mode: Mode::Work,
            remaining_ms: work.saturating_mul(MS_PER_MINUTE),
            preset: name,
            is_running: false,
            completed_sessions: 0,
            last_tick_at: None,
            work_duration: work,
            break_duration: brk,
            custom_work_duration: custom_work,
            custom_break_duration: custom_break,
        }
    }

    /// Full duration of the current phase in milliseconds.
    pub fn current_duration_ms(&self) -> u64 {
        let minutes = match self.mode {
            Mode::Work => self.work_duration,
            Mode::Break => self.break_duration,
        };
        minutes.saturating_mul(MS_PER_MINUTE)
    }

    /// The mode-flip rule, shared by natural expiry and manual skip.
    ///
    /// work -> break credits one completed session; break -> work does not.
    /// The result is never running and never carries a tick timestamp.
    pub fn transition_to_next(&self) -> TimerState {
        let mut next = self.clone();
        match self.mode {
            Mode::Work => {
                next.mode = Mode::Break;
                next.completed_sessions = self.completed_sessions.saturating_add(1);
                next.remaining_ms = self.break_duration.saturating_mul(MS_PER_MINUTE);
            }
            Mode::Break => {
                next.mode = Mode::Work;
                next.remaining_ms = self.work_duration.saturating_mul(MS_PER_MINUTE);
            }
        }
        next.is_running = false;
        next.last_tick_at = None;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle_pomodoro() {
        let s = TimerState::default();
        assert_eq!(s.mode, Mode::Work);
        assert_eq!(s.preset, PresetName::Pomodoro);
        assert_eq!(s.remaining_ms, 25 * MS_PER_MINUTE);
        assert!(!s.is_running);
        assert_eq!(s.completed_sessions, 0);
        assert!(s.last_tick_at.is_none());
    }

    #[test]
    fn work_to_break_credits_a_session() {
        let s = TimerState::default();
        let next = s.transition_to_next();
        assert_eq!(next.mode, Mode::Break);
        assert_eq!(next.completed_sessions, 1);
        assert_eq!(next.remaining_ms, 5 * MS_PER_MINUTE);
        assert!(!next.is_running);
        assert!(next.last_tick_at.is_none());
    }

    #[test]
    fn break_to_work_does_not_credit() {
        let mut s = TimerState::default();
        s.mode = Mode::Break;
        s.completed_sessions = 3;
        let next = s.transition_to_next();
        assert_eq!(next.mode, Mode::Work);
        assert_eq!(next.completed_sessions, 3);
        assert_eq!(next.remaining_ms, 25 * MS_PER_MINUTE);
    }

    #[test]
    fn transition_is_pure() {
        let s = TimerState::default();
        let _ = s.transition_to_next();
        assert_eq!(s, TimerState::default());
    }

    #[test]
    fn from_preset_deepwork() {
        let s = TimerState::from_preset(PresetName::DeepWork, None);
        assert_eq!(s.work_duration, 50);
        assert_eq!(s.break_duration, 10);
        assert_eq!(s.remaining_ms, 50 * MS_PER_MINUTE);
        assert_eq!(s.mode, Mode::Work);
        // Retained custom fields fall back to the catalog entry.
        assert_eq!(s.custom_work_duration, 25);
        assert_eq!(s.custom_break_duration, 5);
    }

    #[test]
    fn from_preset_custom_uses_overrides() {
        let s = TimerState::from_preset(
            PresetName::Custom,
            Some(CustomDurations {
                work_min: 40,
                break_min: 8,
            }),
        );
        assert_eq!(s.work_duration, 40);
        assert_eq!(s.break_duration, 8);
        assert_eq!(s.custom_work_duration, 40);
        assert_eq!(s.custom_break_duration, 8);
        assert_eq!(s.remaining_ms, 40 * MS_PER_MINUTE);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(TimerState::default()).unwrap();
        assert!(json.get("remainingMs").is_some());
        assert!(json.get("isRunning").is_some());
        assert!(json.get("completedSessions").is_some());
        assert!(json.get("lastTickAt").is_some());
        assert!(json.get("customWorkDuration").is_some());
    }

    #[test]
    fn missing_fields_fill_from_defaults() {
        let s: TimerState =
            serde_json::from_str(r#"{"mode":"break","remainingMs":1234}"#).unwrap();
        assert_eq!(s.mode, Mode::Break);
        assert_eq!(s.remaining_ms, 1234);
        assert_eq!(s.preset, PresetName::Pomodoro);
        assert_eq!(s.work_duration, 25);
        assert!(!s.is_running);
    }
}
