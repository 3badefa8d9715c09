//! The static preset catalog.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Pomodoro,
    DeepWork,
    Custom,
}

impl PresetName {
    pub fn as_str(self) -> &'static str {
        match self {
            PresetName::Pomodoro => "pomodoro",
            PresetName::DeepWork => "deepwork",
            PresetName::Custom => "custom",
        }
    }

    /// Lenient lookup: an unrecognized name falls back to pomodoro rather
    /// than failing.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "deepwork" => PresetName::DeepWork,
            "custom" => PresetName::Custom,
            _ => PresetName::Pomodoro,
        }
    }
}

impl Default for PresetName {
    fn default() -> Self {
        PresetName::Pomodoro
    }
}

// Persisted records may carry preset names written by other (or older)
// writers; an unknown name degrades to the default preset instead of
// poisoning the whole record.
impl<'de> Deserialize<'de> for PresetName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(PresetName::parse_or_default(&s))
    }
}

/// Explicit durations for the custom preset, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDurations {
    pub work_min: u64,
    pub break_min: u64,
}

/// A named timer configuration. The catalog is static; only the custom
/// preset's effective durations vary, and those live in the timer state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Preset {
    pub name: PresetName,
    pub label: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub work_min: u64,
    pub break_min: u64,
}

static CATALOG: [Preset; 3] = [
    Preset {
        name: PresetName::Pomodoro,
        label: "Pomodoro",
        description: "Classic 25 minute focus with a 5 minute break",
        icon: "🍅",
        work_min: 25,
        break_min: 5,
    },
    Preset {
        name: PresetName::DeepWork,
        label: "Deep Work",
        description: "50 minute focus block with a 10 minute break",
        icon: "🧠",
        work_min: 50,
        break_min: 10,
    },
    Preset {
        name: PresetName::Custom,
        label: "Custom",
        description: "Your own work/break durations",
        icon: "⚙️",
        work_min: 25,
        break_min: 5,
    },
];

impl Preset {
    /// The full catalog, in display order.
    pub fn catalog() -> &'static [Preset] {
        &CATALOG
    }

    /// Catalog entry for a preset name.
    pub fn get(name: PresetName) -> &'static Preset {
        match name {
            PresetName::Pomodoro => &CATALOG[0],
            PresetName::DeepWork => &CATALOG[1],
            PresetName::Custom => &CATALOG[2],
        }
    }
}
