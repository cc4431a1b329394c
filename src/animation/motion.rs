// Motion clips: loading, loop cleanup and cross-clip mixing

use super::frame::Frame;
use super::interpolation::{comp_distance, extract_euler_xyz, oriented_angle, unit_y, unit_z};
use super::plot::PlotWriter;
use super::transform::Transform;
use crate::error::{FrameError, MotionError};
use crate::model::{Joint, LoopMode, RawClip};
use crate::parser::load_bvh;
use nalgebra_glm as glm;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::{Rc, Weak};

/// Steps used for the bridge between two mixed frames
pub const MIX_BRIDGE_STEPS: u32 = 10;

/// Best matching frame of the other clip and the bridge leading to it
#[derive(Debug, Clone)]
pub struct MixTarget {
    pub frame: usize,
    pub transition: Rc<Motion>,
}

/// Source frame index -> match in the other clip, ascending by source frame
pub type MixMap = BTreeMap<usize, MixTarget>;

#[derive(Debug, Clone)]
pub struct Motion {
    pub name: String,
    pub frames: Vec<Frame>,
    pub joints: Rc<[Joint]>,
    pub time_step: f32,
    max_step: f32,
    linked: Option<Weak<Motion>>,
}

impl Motion {
    /// Wrap already prepared frames, no cleanup is applied
    pub fn from_frames(
        name: impl Into<String>,
        joints: Rc<[Joint]>,
        frames: Vec<Frame>,
        time_step: f32,
    ) -> Self {
        Self {
            name: name.into(),
            frames,
            joints,
            time_step,
            max_step: 0.0,
            linked: None,
        }
    }

    /// Load a BVH file and prepare it for playback with the given loop policy
    pub fn create(
        name: &str,
        path: impl AsRef<Path>,
        loop_mode: LoopMode,
        steps: u32,
    ) -> Result<Self, MotionError> {
        let raw = load_bvh(path.as_ref()).map_err(|err| {
            MotionError::new("motion-create")
                .with_arg("name", name)
                .push_motion(err)
        })?;
        Ok(Self::from_raw(name, raw, loop_mode, steps))
    }

    /// Rebase translations onto the origin floor, record the largest step,
    /// then clean. `raw.frames[0]` must be the T-pose placeholder.
    pub fn from_raw(name: &str, raw: RawClip, loop_mode: LoopMode, steps: u32) -> Self {
        let RawClip {
            joints,
            mut frames,
            time_step,
        } = raw;

        let mut max_step = 0.0f32;
        let mut min = glm::vec3(f32::MAX, f32::MAX, f32::MAX);

        let n = frames.len();
        for i in 1..n {
            let ft = frames[i].translation;

            if i + 2 < n {
                let step = glm::distance(&frames[i + 1].translation, &ft);
                if step > max_step {
                    max_step = step;
                }
            }

            min = glm::min2(&min, &ft);
        }

        for frame in frames.iter_mut().skip(1) {
            frame.translation -= min;
        }

        let mut motion = Self {
            name: name.to_string(),
            frames,
            joints: joints.into(),
            time_step,
            max_step,
            linked: None,
        };
        motion.clean(loop_mode, steps);

        log::debug!(
            "Motion '{}' ready: {} frames, max step {:.3}",
            motion.name,
            motion.frames.len(),
            motion.max_step
        );
        motion
    }

    pub fn max_step(&self) -> f32 {
        self.max_step
    }

    /// Composite clips carry an underscore in their name
    pub fn is_mix(&self) -> bool {
        self.name.contains('_')
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> f32 {
        self.frames.len() as f32 * self.time_step
    }

    pub fn link(&mut self, other: &Rc<Motion>) {
        self.linked = Some(Rc::downgrade(other));
    }

    /// The linked clip, if one was set and is still alive
    pub fn linked(&self) -> Option<Rc<Motion>> {
        let weak = self.linked.as_ref()?;
        let linked = weak.upgrade();
        if linked.is_none() {
            log::warn!("Linked motion of '{}' is no longer available", self.name);
        }
        linked
    }

    /// Blend against the linked clip at a frame scaled by the clips' length ratio.
    ///
    /// Both sides read the scaled index `floor(frame_idx * linked_len / len)`.
    /// Without a linked clip the default frame is returned.
    pub fn linked_frame(&self, frame_idx: usize, alpha: f32) -> Result<Frame, FrameError> {
        let Some(linked) = self.linked() else {
            return Ok(Frame::default());
        };

        let factor = linked.frames.len() as f32 / self.frames.len() as f32;
        let cf = (frame_idx as f32 * factor).floor() as usize;

        let own = self.frames.get(cf).ok_or(FrameError::OutOfRange {
            index: cf,
            len: self.frames.len(),
        })?;
        let other = linked.frames.get(cf).ok_or(FrameError::OutOfRange {
            index: cf,
            len: linked.frames.len(),
        })?;
        own.lerp_one(other, alpha)
    }

    /// Drop the T-pose placeholder and shape the clip for looping
    pub fn clean(&mut self, loop_mode: LoopMode, steps: u32) {
        if !self.frames.is_empty() {
            self.frames.remove(0);
        }
        if loop_mode == LoopMode::None {
            return;
        }

        if loop_mode == LoopMode::ShortLoop {
            match self.loop_window() {
                Some((begin, end)) => {
                    log::debug!("'{}' loops over frames {begin}..{end}", self.name);
                    self.frames = self.frames[begin..end].to_vec();
                }
                None => log::warn!(
                    "'{}' has too few frames to search a loop window",
                    self.name
                ),
            }
        }

        let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) else {
            log::warn!("'{}' has no frames left to loop", self.name);
            return;
        };
        let closing = last.lerp_transition(first, steps);
        self.frames.extend(closing);

        self.face_forward();
    }

    /// Most self-similar pair (first half, second half), as a half-open range
    fn loop_window(&self) -> Option<(usize, usize)> {
        let n = self.frames.len();
        let limit_a = n / 2;
        let limit_b = n - limit_a;

        let mut aux_diff = f32::MAX;
        let mut window = None;

        for f1 in 0..limit_a {
            let v1 = self.frames[f1].value();
            for f2 in limit_b..n {
                let diff = comp_distance(&v1, &self.frames[f2].value());
                if diff < aux_diff {
                    aux_diff = diff;
                    window = Some((f1, f2));
                }
            }
        }
        window
    }

    // Rewrite every root rotation so the clip starts facing +Z
    fn face_forward(&mut self) {
        for (i, frame) in self.frames.iter_mut().enumerate() {
            let Some(root) = frame.rotations.first_mut() else {
                continue;
            };

            let t1 = Transform::from_rotation(*root);
            let new_y = oriented_angle(&t1.front(), &unit_z(), &unit_y());
            let t2 = Transform::from_rotation(unit_y() * new_y.to_degrees());

            *root = glm::degrees(&extract_euler_xyz(&(t2.as_matrix() * t1.as_matrix())));
            log::trace!("[{i}] - {:?}", root);
        }
    }

    /// For every frame of this clip find the closest frame of `other` and
    /// build a bridge to it.
    ///
    /// When `plot_dir` is given the full distance table and the winners are
    /// exported there as well; export problems never affect the result.
    pub fn mix(&self, other: &Motion, plot_dir: Option<&Path>) -> MixMap {
        let mut mm = MixMap::new();
        if other.frames.is_empty() {
            log::warn!("Cannot mix '{}' with empty motion '{}'", self.name, other.name);
            return mm;
        }

        let mut plot = plot_dir.and_then(|dir| PlotWriter::open(dir, &self.name, &other.name));
        let targets: Vec<glm::Vec3> = other.frames.iter().map(Frame::value).collect();

        for (f1, frame) in self.frames.iter().enumerate() {
            let f1_value = frame.value();
            let mut aux_f2 = 0;
            let mut aux_diff = f32::INFINITY;

            for (f2, f2_value) in targets.iter().enumerate() {
                let diff = comp_distance(&f1_value, f2_value);
                if diff < aux_diff {
                    aux_diff = diff;
                    aux_f2 = f2;
                }
                if let Some(plot) = plot.as_mut() {
                    plot.distance(diff, f2 + 1 == targets.len());
                }
            }

            if let Some(plot) = plot.as_mut() {
                plot.winner(f1, aux_f2);
            }

            let transition = Rc::new(self.transition_to(other, f1, aux_f2));
            mm.insert(
                f1,
                MixTarget {
                    frame: aux_f2,
                    transition,
                },
            );
        }

        if let Some(plot) = plot {
            plot.finish();
        }

        log::debug!(
            "Mixed '{}' ({} frames) with '{}' ({} frames)",
            self.name,
            self.frames.len(),
            other.name,
            other.frames.len()
        );
        mm
    }

    fn transition_to(&self, other: &Motion, f1: usize, f2: usize) -> Motion {
        let frames = self.frames[f1].lerp_transition(&other.frames[f2], MIX_BRIDGE_STEPS);
        Motion::from_frames(
            format!("{}_{}", self.name, other.name),
            Rc::clone(&self.joints),
            frames,
            (self.time_step + other.time_step) * 0.5,
        )
    }
}
