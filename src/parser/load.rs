use crate::error::MotionError;
use crate::model::RawClip;
use crate::parser::bvh::parse_bvh;
use std::fs;
use std::path::Path;

pub fn load_bvh(path: impl AsRef<Path>) -> Result<RawClip, MotionError> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|err| {
        MotionError::new("bvh-read")
            .with_arg("path", path.display())
            .push_std(err)
    })?;

    let clip = parse_bvh(&content).map_err(|err| {
        MotionError::new("bvh-parse")
            .with_arg("path", path.display())
            .push_std(err)
    })?;

    log::debug!(
        "Loaded {}: {} joints, {} frames, frame time {}",
        path.display(),
        clip.joints.len(),
        clip.frames.len() - 1,
        clip.time_step
    );

    Ok(clip)
}
