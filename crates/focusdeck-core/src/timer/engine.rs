//! The pomodoro session state machine.
//!
//! The engine is a wall-clock-based state machine with no internal thread:
//! the caller drives it by invoking `tick()` once per quantum (the CLI watch
//! loop is the one scheduler). Every mutating operation completes
//! synchronously and flips `is_running` before returning, so a tick can never
//! observe a state that is mid-transition; a tick against a non-running
//! state is a no-op.
//!
//! ## Observable states
//!
//! ```text
//! {work, break} x {running, paused}
//! ```
//!
//! Phase completion is a transient instant resolved atomically inside
//! `tick()` -- `remaining_ms == 0` is never an externally visible state.
//!
//! Time that passes while no tick loop is alive (process exit, suspend) is
//! reconciled once, at load, by the injected store. While the loop IS alive
//! the quantum is best-effort: ticks can drift under OS scheduling, and the
//! engine makes no hard real-time promise beyond one-second granularity.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PomodoroEngine::new(SqliteStateStore::open()?);
//! engine.start();
//! // In a loop, once per second:
//! engine.tick();
//! ```

use chrono::Utc;

use crate::events::{EventBus, EventKind, HandlerResult, Subscription, TimerEvent};
use crate::storage::StateStore;

use super::format::{format_time, progress_pct};
use super::preset::{CustomDurations, Preset, PresetName};
use super::state::{TimerState, MS_PER_MINUTE};

/// Fixed real-time interval between ticks, in milliseconds.
pub const TICK_QUANTUM_MS: u64 = 1000;

/// Core session engine. Owns the current state, persists through the
/// injected store after every mutation, and fans out milestone events.
pub struct PomodoroEngine<S: StateStore> {
    store: S,
    state: TimerState,
    bus: EventBus,
}

impl<S: StateStore> PomodoroEngine<S> {
    /// Construct from a store. The persisted record is read once here, with
    /// elapsed wall-clock time reconciled by the store.
    pub fn new(store: S) -> Self {
        let state = store.load();
        Self {
            store,
            state,
            bus: EventBus::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current state, as a defensive copy.
    pub fn state(&self) -> TimerState {
        self.state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    /// Remaining time as `mm:ss` (ceiling-rounded seconds).
    pub fn formatted_time(&self) -> String {
        format_time(self.state.remaining_ms)
    }

    /// Completion percentage of the current phase, in [0, 100].
    pub fn progress(&self) -> f64 {
        progress_pct(&self.state)
    }

    pub fn presets(&self) -> &'static [Preset] {
        Preset::catalog()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> Subscription
    where
        F: FnMut(&TimerEvent) -> HandlerResult + 'static,
    {
        self.bus.subscribe(kind, handler)
    }

    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.bus.unsubscribe(sub)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the countdown. No-op if already running.
    pub fn start(&mut self) {
        if self.state.is_running {
            return;
        }
        let previous = self.state.clone();
        self.state.is_running = true;
        self.store.save(&self.state);
        self.emit_state_change(Some(previous));
    }

    /// Stop the countdown. No-op if not running.
    pub fn pause(&mut self) {
        if !self.state.is_running {
            return;
        }
        let previous = self.state.clone();
        self.state.is_running = false;
        self.store.save(&self.state);
        self.emit_state_change(Some(previous));
    }

    pub fn toggle(&mut self) {
        if self.state.is_running {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stop and restore the current mode's full duration. Mode, preset, and
    /// session count are untouched.
    pub fn reset(&mut self) {
        let previous = self.state.clone();
        self.state.is_running = false;
        self.state.remaining_ms = self.state.current_duration_ms();
        self.store.save(&self.state);
        self.emit_state_change(Some(previous));
    }

    /// Replace the state wholesale from a preset. The session count and the
    /// retained custom durations survive the switch; everything else is
    /// rebuilt. Consumers see a state change with no previous state --
    /// full-replacement semantics, not a delta.
    pub fn select_preset(&mut self, name: PresetName, overrides: Option<CustomDurations>) {
        let previous = self.state.clone();
        let mut next = TimerState::from_preset(name, overrides);
        next.completed_sessions = previous.completed_sessions;
        match (name, overrides) {
            (PresetName::Custom, None) => {
                // Re-selecting custom without overrides resumes the last-used
                // custom durations.
                next.work_duration = previous.custom_work_duration;
                next.break_duration = previous.custom_break_duration;
                next.custom_work_duration = previous.custom_work_duration;
                next.custom_break_duration = previous.custom_break_duration;
                next.remaining_ms = next.work_duration.saturating_mul(MS_PER_MINUTE);
            }
            (PresetName::Custom, Some(_)) => {}
            _ => {
                next.custom_work_duration = previous.custom_work_duration;
                next.custom_break_duration = previous.custom_break_duration;
            }
        }
        self.state = next;
        self.store.save(&self.state);
        self.emit_state_change(None);
    }

    /// Shorthand for selecting the custom preset with explicit durations.
    pub fn set_custom_durations(&mut self, work_min: u64, break_min: u64) {
        self.select_preset(
            PresetName::Custom,
            Some(CustomDurations {
                work_min,
                break_min,
            }),
        );
    }

    /// User-initiated abort of the current phase: applies the transition
    /// rule and announces the mode switch. No completion event -- a skip is
    /// not a natural expiry.
    pub fn skip_session(&mut self) {
        let from = self.state.mode;
        self.state = self.state.transition_to_next();
        self.store.save(&self.state);
        self.bus.publish(&TimerEvent::ModeSwitch {
            from,
            to: self.state.mode,
            completed_sessions: self.state.completed_sessions,
            at: Utc::now(),
        });
    }

    /// Wipe the persisted record and return to the default state. The
    /// session count is discarded.
    pub fn reset_all(&mut self) {
        self.store.clear();
        self.state = self.store.load();
        self.emit_state_change(None);
    }

    /// Advance the countdown by exactly one quantum. Driven by the caller
    /// once per second; no-op unless running.
    ///
    /// On expiry the transition rule is applied atomically: the countdown
    /// stops, the new state is persisted, and `Complete` then `ModeSwitch`
    /// fire, in that order.
    pub fn tick(&mut self) {
        if !self.state.is_running {
            return;
        }
        self.state.remaining_ms = self.state.remaining_ms.saturating_sub(TICK_QUANTUM_MS);
        if self.state.remaining_ms == 0 {
            let completed_mode = self.state.mode;
            self.state = self.state.transition_to_next();
            self.store.save(&self.state);
            let at = Utc::now();
            self.bus.publish(&TimerEvent::Complete {
                completed_mode,
                next_mode: self.state.mode,
                completed_sessions: self.state.completed_sessions,
                at,
            });
            self.bus.publish(&TimerEvent::ModeSwitch {
                from: completed_mode,
                to: self.state.mode,
                completed_sessions: self.state.completed_sessions,
                at,
            });
        } else {
            self.store.save(&self.state);
            self.bus.publish(&TimerEvent::Tick {
                mode: self.state.mode,
                remaining_ms: self.state.remaining_ms,
                at: Utc::now(),
            });
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn emit_state_change(&mut self, previous: Option<TimerState>) {
        self.bus.publish(&TimerEvent::StateChange {
            previous,
            current: self.state.clone(),
            at: Utc::now(),
        });
    }
}
