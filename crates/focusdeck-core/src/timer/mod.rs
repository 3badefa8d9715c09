mod engine;
mod format;
mod preset;
mod state;

pub use engine::{PomodoroEngine, TICK_QUANTUM_MS};
pub use format::{format_time, progress_pct};
pub use preset::{CustomDurations, Preset, PresetName};
pub use state::{Mode, TimerState, MS_PER_MINUTE};
