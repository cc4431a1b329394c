// Animation module
// Clip processing (frames, motions, mixing) and skeleton playback

pub mod frame;
pub mod interpolation;
pub mod library;
pub mod motion;
pub mod plot;
pub mod skeleton;
pub mod transform;

pub use frame::Frame;
pub use library::MotionLibrary;
pub use motion::{MIX_BRIDGE_STEPS, MixMap, MixTarget, Motion};
pub use plot::PlotWriter;
pub use skeleton::{Skeleton, compute_pose};
pub use transform::Transform;
