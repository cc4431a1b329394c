use crate::animation::Frame;
use crate::model::skeleton::Joint;
use serde::{Deserialize, Serialize};

/// How a clip is prepared for cyclic playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LoopMode {
    /// Only the T-pose frame is dropped
    None,
    /// Trim to the most self-similar window, then close the loop
    ShortLoop,
    /// Close the loop over the whole clip
    #[default]
    FullLoop,
}

/// Clip data as read from disk, before any cleanup
#[derive(Debug, Clone)]
pub struct RawClip {
    pub joints: Vec<Joint>,
    pub frames: Vec<Frame>, // frames[0] is the synthetic T-pose
    pub time_step: f32,
}

impl Default for RawClip {
    fn default() -> Self {
        Self {
            joints: Vec::new(),
            frames: Vec::new(),
            time_step: 1.0 / 30.0,
        }
    }
}
