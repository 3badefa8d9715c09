use std::io::Write as _;

use clap::Subcommand;
use serde::Serialize;

use focusdeck_core::storage::Database;
use focusdeck_core::{
    format_time, Config, EventKind, Mode, PomodoroEngine, Preset, PresetName, SqliteStateStore,
    StateStore, TimerEvent, TimerState, TICK_QUANTUM_MS,
};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Toggle between running and paused
    Toggle,
    /// Restore the current phase's full duration
    Reset,
    /// Skip to the next phase (a skipped work phase still counts)
    Skip,
    /// Select a preset
    Preset {
        /// Preset name: pomodoro, deepwork, or custom
        name: String,
    },
    /// Select the custom preset with explicit durations
    Custom {
        /// Work duration in minutes
        #[arg(long)]
        work: u64,
        /// Break duration in minutes
        #[arg(long = "break")]
        break_min: u64,
    },
    /// Wipe the timer state entirely, including the session count
    ResetAll,
    /// Print the current timer state as JSON
    Status,
    /// List the preset catalog
    Presets,
    /// Run the countdown in the foreground until the phase completes.
    /// State is persisted every second; Ctrl-C and resume any time.
    Watch,
}

/// Timer state plus derived display values, as printed by most commands.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    #[serde(flatten)]
    state: TimerState,
    formatted_time: String,
    progress_pct: f64,
}

fn build_engine() -> Result<PomodoroEngine<SqliteStateStore>, Box<dyn std::error::Error>> {
    let store = SqliteStateStore::open()?;
    let fresh = store.read_record()?.is_none();
    let mut engine = PomodoroEngine::new(store);
    if fresh {
        // First run: honor the configured default preset.
        let config = Config::load_or_default();
        let preset = PresetName::parse_or_default(&config.timer.default_preset);
        if preset != PresetName::Pomodoro {
            engine.select_preset(preset, None);
        }
    }
    Ok(engine)
}

fn print_status(engine: &PomodoroEngine<SqliteStateStore>) -> Result<(), Box<dyn std::error::Error>> {
    let view = StatusView {
        state: engine.state(),
        formatted_time: engine.formatted_time(),
        progress_pct: engine.progress(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = build_engine()?;

    match action {
        TimerAction::Start => {
            engine.start();
            print_status(&engine)?;
        }
        TimerAction::Pause => {
            engine.pause();
            print_status(&engine)?;
        }
        TimerAction::Toggle => {
            engine.toggle();
            print_status(&engine)?;
        }
        TimerAction::Reset => {
            engine.reset();
            print_status(&engine)?;
        }
        TimerAction::Skip => {
            engine.skip_session();
            print_status(&engine)?;
        }
        TimerAction::Preset { name } => {
            engine.select_preset(PresetName::parse_or_default(&name), None);
            print_status(&engine)?;
        }
        TimerAction::Custom { work, break_min } => {
            engine.set_custom_durations(work, break_min);
            print_status(&engine)?;
        }
        TimerAction::ResetAll => {
            engine.reset_all();
            print_status(&engine)?;
        }
        TimerAction::Status => {
            print_status(&engine)?;
        }
        TimerAction::Presets => {
            println!("{}", serde_json::to_string_pretty(Preset::catalog())?);
        }
        TimerAction::Watch => {
            watch(engine)?;
        }
    }

    Ok(())
}

/// Foreground tick loop: the one scheduler driving the engine, once per
/// quantum, until the current phase completes or the user interrupts.
fn watch(mut engine: PomodoroEngine<SqliteStateStore>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let notify = config.notifications.enabled;
    let history = Database::open()?;

    let state = engine.state();
    let (work_min, break_min) = (state.work_duration, state.break_duration);

    engine.subscribe(EventKind::Tick, |event| {
        if let TimerEvent::Tick {
            mode, remaining_ms, ..
        } = event
        {
            print!("\r{:<5} {}  ", mode.as_str(), format_time(*remaining_ms));
            std::io::stdout().flush()?;
        }
        Ok(())
    });

    engine.subscribe(EventKind::Complete, move |event| {
        if let TimerEvent::Complete {
            completed_mode,
            next_mode,
            completed_sessions,
            at,
        } = event
        {
            let duration_min = match completed_mode {
                Mode::Work => work_min,
                Mode::Break => break_min,
            };
            history.record_session(*completed_mode, duration_min, *at)?;
            if notify {
                println!();
                println!(
                    "{} phase complete -- {} work session(s) finished. {} is ready; `timer start` to begin.",
                    completed_mode.as_str(),
                    completed_sessions,
                    next_mode.as_str()
                );
            }
        }
        Ok(())
    });

    engine.start();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(async {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_millis(TICK_QUANTUM_MS));
        interval.tick().await; // the first fire is immediate
        while engine.is_running() {
            interval.tick().await;
            engine.tick();
        }
    });

    Ok(())
}
