//! The persisted timer state store.
//!
//! One record, one JSON document. The store owns the two policies the engine
//! must never see fail:
//!
//! - **load** merges absent/malformed records into defaults and reconciles
//!   wall-clock time that passed while no tick loop was alive: if the record
//!   was running, `now - lastTickAt` is subtracted from the remaining time
//!   (floored at zero), and hitting zero applies exactly one phase
//!   transition inline.
//! - **save/clear** never propagate failures; the in-memory state stays
//!   authoritative for the running process, so a failed write only risks a
//!   stale read by a *different* process later. That limitation is accepted,
//!   as is last-write-wins between concurrent instances.
//!
//! Implementations differ only in where the record lives and which clock
//! stamps it: [`SqliteStateStore`] for production, [`MemoryStateStore`] for
//! test isolation.

use std::cell::RefCell;
use std::rc::Rc;

use crate::clock::{Clock, SystemClock};
use crate::error::StorageError;
use crate::timer::TimerState;

use super::database::Database;

/// Key of the timer record in the kv table.
pub const STATE_KEY: &str = "timer_state";

pub trait StateStore {
    fn clock(&self) -> &dyn Clock;

    fn read_record(&self) -> Result<Option<String>, StorageError>;
    fn write_record(&self, json: &str) -> Result<(), StorageError>;
    fn delete_record(&self) -> Result<(), StorageError>;

    /// Read the persisted record, fail-soft, with elapsed time reconciled.
    /// The returned state always has every field populated.
    fn load(&self) -> TimerState {
        let raw = match self.read_record() {
            Ok(Some(raw)) => raw,
            Ok(None) => return TimerState::default(),
            Err(e) => {
                eprintln!("Warning: failed to read timer state: {e}");
                return TimerState::default();
            }
        };
        let state: TimerState = match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(e) => {
                eprintln!("Warning: malformed timer state, using defaults: {e}");
                return TimerState::default();
            }
        };
        reconcile(state, self.clock().now_ms())
    }

    /// Persist the record verbatim except `lastTickAt`, which is stamped
    /// "now" while running and cleared otherwise. Failures are logged and
    /// swallowed.
    fn save(&self, state: &TimerState) {
        let mut record = state.clone();
        record.last_tick_at = if record.is_running {
            Some(self.clock().now_ms())
        } else {
            None
        };
        match serde_json::to_string(&record) {
            Ok(json) => {
                if let Err(e) = self.write_record(&json) {
                    eprintln!("Warning: failed to persist timer state: {e}");
                }
            }
            Err(e) => eprintln!("Warning: failed to serialize timer state: {e}"),
        }
    }

    /// Remove the persisted record entirely. Idempotent.
    fn clear(&self) {
        if let Err(e) = self.delete_record() {
            eprintln!("Warning: failed to clear timer state: {e}");
        }
    }
}

/// Reconcile time that passed while the record sat unobserved.
///
/// At most one transition is applied here; anything beyond one phase of
/// absence collapses into "that phase completed, the next one is waiting".
/// The in-memory `last_tick_at` is cleared -- it is re-stamped on save.
fn reconcile(mut state: TimerState, now_ms: u64) -> TimerState {
    if state.is_running {
        if let Some(last) = state.last_tick_at {
            let elapsed = now_ms.saturating_sub(last);
            state.remaining_ms = state.remaining_ms.saturating_sub(elapsed);
            if state.remaining_ms == 0 {
                state = state.transition_to_next();
            }
        }
    }
    state.last_tick_at = None;
    state
}

/// Production store: the record lives in the SQLite kv table.
pub struct SqliteStateStore {
    db: Database,
    clock: Rc<dyn Clock>,
}

impl SqliteStateStore {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Rc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: Rc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Open the default on-disk database and wrap it.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(Database::open()?))
    }
}

impl StateStore for SqliteStateStore {
    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn read_record(&self) -> Result<Option<String>, StorageError> {
        self.db.kv_get(STATE_KEY)
    }

    fn write_record(&self, json: &str) -> Result<(), StorageError> {
        self.db.kv_set(STATE_KEY, json)
    }

    fn delete_record(&self) -> Result<(), StorageError> {
        self.db.kv_delete(STATE_KEY)
    }
}

/// In-memory store for tests and ephemeral sessions.
pub struct MemoryStateStore {
    record: RefCell<Option<String>>,
    clock: Rc<dyn Clock>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::with_clock(Rc::new(SystemClock))
    }

    pub fn with_clock(clock: Rc<dyn Clock>) -> Self {
        Self {
            record: RefCell::new(None),
            clock,
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStateStore {
    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn read_record(&self) -> Result<Option<String>, StorageError> {
        Ok(self.record.borrow().clone())
    }

    fn write_record(&self, json: &str) -> Result<(), StorageError> {
        *self.record.borrow_mut() = Some(json.to_string());
        Ok(())
    }

    fn delete_record(&self) -> Result<(), StorageError> {
        *self.record.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::timer::{Mode, PresetName, MS_PER_MINUTE};

    fn store_at(ms: u64) -> (MemoryStateStore, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(ms));
        let store = MemoryStateStore::with_clock(clock.clone());
        (store, clock)
    }

    #[test]
    fn empty_store_loads_defaults() {
        let (store, _) = store_at(0);
        assert_eq!(store.load(), TimerState::default());
    }

    #[test]
    fn malformed_record_loads_defaults() {
        let (store, _) = store_at(0);
        store.write_record("{not json").unwrap();
        assert_eq!(store.load(), TimerState::default());
    }

    #[test]
    fn unknown_preset_in_record_degrades_to_pomodoro() {
        let (store, _) = store_at(0);
        store
            .write_record(r#"{"preset":"hyperfocus","remainingMs":5000}"#)
            .unwrap();
        let state = store.load();
        assert_eq!(state.preset, PresetName::Pomodoro);
        assert_eq!(state.remaining_ms, 5000);
    }

    #[test]
    fn save_stamps_last_tick_only_while_running() {
        let (store, clock) = store_at(42_000);
        let mut state = TimerState::default();

        store.save(&state);
        let record: TimerState =
            serde_json::from_str(&store.read_record().unwrap().unwrap()).unwrap();
        assert_eq!(record.last_tick_at, None);

        state.is_running = true;
        clock.set(43_000);
        store.save(&state);
        let record: TimerState =
            serde_json::from_str(&store.read_record().unwrap().unwrap()).unwrap();
        assert_eq!(record.last_tick_at, Some(43_000));
    }

    #[test]
    fn paused_round_trip_is_lossless() {
        let (store, clock) = store_at(100_000);
        let mut state = TimerState::default();
        state.remaining_ms = 90_000;
        state.completed_sessions = 7;

        store.save(&state);
        clock.advance(3_600_000); // an hour passes; paused state must not drain
        let loaded = store.load();

        assert_eq!(loaded.remaining_ms, 90_000);
        assert_eq!(loaded.completed_sessions, 7);
        assert_eq!(loaded.last_tick_at, None);
        assert_eq!(loaded, state);
    }

    #[test]
    fn running_state_drains_elapsed_time_on_load() {
        let (store, clock) = store_at(1_000_000);
        let mut state = TimerState::default();
        state.is_running = true;
        state.remaining_ms = 10 * MS_PER_MINUTE;

        store.save(&state);
        clock.advance(4 * MS_PER_MINUTE);
        let loaded = store.load();

        assert_eq!(loaded.remaining_ms, 6 * MS_PER_MINUTE);
        assert!(loaded.is_running);
        assert_eq!(loaded.mode, Mode::Work);
    }

    #[test]
    fn expiry_while_away_applies_one_transition() {
        let (store, clock) = store_at(500_000);
        let mut state = TimerState::default();
        state.is_running = true;
        state.remaining_ms = 10_000;

        store.save(&state);
        clock.advance(30_000); // 30s elapsed > 10s remaining
        let loaded = store.load();

        assert_eq!(loaded.mode, Mode::Break);
        assert!(!loaded.is_running);
        assert_eq!(loaded.completed_sessions, 1);
        assert_eq!(loaded.remaining_ms, 5 * MS_PER_MINUTE);
    }

    #[test]
    fn long_absence_still_transitions_once() {
        let (store, clock) = store_at(0);
        let mut state = TimerState::default();
        state.is_running = true;
        state.remaining_ms = 1_000;

        store.save(&state);
        clock.advance(24 * 60 * MS_PER_MINUTE); // a day away
        let loaded = store.load();

        // One transition only: the work phase completed, the break is waiting.
        assert_eq!(loaded.mode, Mode::Break);
        assert_eq!(loaded.completed_sessions, 1);
        assert_eq!(loaded.remaining_ms, 5 * MS_PER_MINUTE);
    }

    #[test]
    fn clear_is_idempotent() {
        let (store, _) = store_at(0);
        store.save(&TimerState::default());
        store.clear();
        store.clear();
        assert!(store.read_record().unwrap().is_none());
        assert_eq!(store.load(), TimerState::default());
    }
}
