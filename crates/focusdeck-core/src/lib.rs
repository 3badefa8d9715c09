//! # Focusdeck Core Library
//!
//! Core business logic for Focusdeck, a personal productivity suite built
//! around a persisted pomodoro session engine. The library is CLI-first:
//! every operation is available through the standalone CLI binary, and any
//! richer frontend is a thin presentation layer over the same crate.
//!
//! ## Architecture
//!
//! - **Session engine**: a wall-clock-based state machine; the caller drives
//!   it by calling `tick()` once per second. Elapsed time across restarts is
//!   reconstructed from persisted timestamps, not a live countdown.
//! - **State store**: the single timer record, persisted after every
//!   mutation, reconciled at load. Injected into the engine so tests can run
//!   against an in-memory store with a manual clock.
//! - **Events**: a typed publish/subscribe bridge; subscribers are isolated
//!   from each other and from the engine.
//! - **Storage**: SQLite for the timer record, session history, and the
//!   local task list; TOML for configuration.
//! - **Sync**: a client for the remote bulk task persistence API.
//!
//! ## Key Components
//!
//! - [`PomodoroEngine`]: the session state machine
//! - [`StateStore`]: persisted timer record with load-time reconciliation
//! - [`Database`]: session history, task list, key-value storage
//! - [`Config`]: application configuration
//! - [`TaskApiClient`]: remote task collection client

pub mod clock;
pub mod error;
pub mod events;
pub mod storage;
pub mod sync;
pub mod task;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ApiError, ConfigError, CoreError, StorageError};
pub use events::{EventBus, EventKind, Subscription, TimerEvent};
pub use storage::{Config, Database, MemoryStateStore, SqliteStateStore, StateStore};
pub use sync::{ReplaceSummary, TaskApiClient};
pub use task::{Priority, Task};
pub use timer::{
    format_time, progress_pct, CustomDurations, Mode, PomodoroEngine, Preset, PresetName,
    TimerState, MS_PER_MINUTE, TICK_QUANTUM_MS,
};
