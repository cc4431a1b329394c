use crate::CONFY_APP_NAME;
use crate::model::LoopMode;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSettings {
    pub enabled: bool,
    pub plot_dir: PathBuf,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            plot_dir: PathBuf::from("plots"),
        }
    }
}

impl PlotSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "plots").unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(err) = confy::store(CONFY_APP_NAME, "plots", self) {
            log::warn!("Could not store plot settings: {err}");
        }
    }

    /// Output directory for mix diagnostics, if export is enabled
    pub fn dir(&self) -> Option<&std::path::Path> {
        self.enabled.then_some(self.plot_dir.as_path())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackSettings {
    pub loop_mode: LoopMode,
    pub transition_steps: u32,
    pub skeleton_scale: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            loop_mode: LoopMode::ShortLoop,
            transition_steps: 20,
            skeleton_scale: 0.33,
        }
    }
}

impl PlaybackSettings {
    pub fn load() -> Self {
        confy::load(CONFY_APP_NAME, "playback").unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(err) = confy::store(CONFY_APP_NAME, "playback", self) {
            log::warn!("Could not store playback settings: {err}");
        }
    }
}

// Aggregate struct for convenience
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub plots: PlotSettings,
    pub playback: PlaybackSettings,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            plots: PlotSettings::load(),
            playback: PlaybackSettings::load(),
        }
    }
}
