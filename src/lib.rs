//! Motion-capture clip engine: BVH loading, loop cleanup, clip mixing and
//! skeleton playback.

pub mod animation;
pub mod error;
pub mod model;
pub mod parser;
pub mod settings;

pub const CONFY_APP_NAME: &str = "mocap-blend";

pub use animation::{Frame, MixMap, MixTarget, Motion, MotionLibrary, Skeleton, Transform};
pub use error::{BvhError, FrameError, MotionError};
pub use model::{Channel, Joint, LoopMode, RawClip};
