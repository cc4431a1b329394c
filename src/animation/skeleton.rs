// Playback driver and forward kinematics

use super::frame::Frame;
use super::interpolation::rotate_xyz;
use super::library::MotionLibrary;
use super::motion::Motion;
use super::transform::Transform;
use crate::error::MotionError;
use crate::model::{Joint, LoopMode};
use nalgebra_glm as glm;
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Playback {
    motion: Rc<Motion>,
    frame: usize,
    elapsed: f32,
}

impl Playback {
    fn start(motion: Rc<Motion>, frame: usize) -> Self {
        Self {
            motion,
            frame,
            elapsed: 0.0,
        }
    }
}

/// Clip to resume once the current bridge has played out
#[derive(Debug, Clone)]
struct Pending {
    motion: Rc<Motion>,
    frame: usize,
}

/// Plays clips from its library and blends between them through mix bridges
#[derive(Debug)]
pub struct Skeleton {
    library: MotionLibrary,
    pub transform: Transform,
    pub scale: f32,
    current: Option<Playback>,
    pending: Option<Pending>,
}

impl Skeleton {
    pub fn new(library: MotionLibrary, scale: f32) -> Self {
        Self {
            library,
            transform: Transform::default(),
            scale,
            current: None,
            pending: None,
        }
    }

    pub fn library(&self) -> &MotionLibrary {
        &self.library
    }

    pub fn add_motion(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        loop_mode: LoopMode,
        steps: u32,
    ) -> Result<Rc<Motion>, MotionError> {
        self.library.add(name, path, loop_mode, steps)
    }

    pub fn insert_motion(&mut self, motion: Motion) -> Rc<Motion> {
        self.library.insert(motion)
    }

    /// Switch playback to `name`.
    ///
    /// The first clip starts at frame 0. Later switches play the mix bridge
    /// from the current frame, then continue at the matched frame of the new clip.
    pub fn set_motion(&mut self, name: &str) -> Result<(), MotionError> {
        let target = self
            .library
            .get(name)
            .ok_or_else(|| MotionError::new("unknown-motion").with_arg("name", name))?;

        // A bridge still playing is cut short; its destination becomes the base
        if let Some(pending) = self.pending.take() {
            self.current = Some(Playback::start(pending.motion, pending.frame));
        }

        let Some(current) = self.current.as_ref() else {
            log::debug!("Starting playback with '{name}'");
            self.current = Some(Playback::start(target, 0));
            return Ok(());
        };

        if current.motion.name == target.name {
            return Ok(());
        }

        let from_name = current.motion.name.clone();
        let from_frame = current.frame;
        let mm = self.library.mix(&from_name, name)?;

        match mm.get(&from_frame) {
            Some(entry) if !entry.transition.is_empty() => {
                log::debug!(
                    "Blending '{from_name}'[{from_frame}] into '{name}'[{}]",
                    entry.frame
                );
                self.current = Some(Playback::start(Rc::clone(&entry.transition), 0));
                self.pending = Some(Pending {
                    motion: target,
                    frame: entry.frame,
                });
            }
            Some(entry) => {
                self.current = Some(Playback::start(target, entry.frame));
            }
            None => {
                log::warn!("No mix entry for '{from_name}'[{from_frame}], cutting to '{name}'");
                self.current = Some(Playback::start(target, 0));
            }
        }
        Ok(())
    }

    /// Advance playback by `dt` seconds, one frame per motion time step
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let Some(play) = self.current.as_mut() else {
            return;
        };

        play.elapsed += dt;
        loop {
            let step = play.motion.time_step.max(f32::EPSILON);
            if play.elapsed < step {
                break;
            }
            play.elapsed -= step;
            play.frame += 1;

            if play.frame >= play.motion.len() {
                match self.pending.take() {
                    Some(pending) => {
                        play.motion = pending.motion;
                        play.frame = pending.frame;
                    }
                    None => play.frame = 0,
                }
            }
        }
    }

    /// Walk the transform along its front at the pace of the playing clip.
    ///
    /// While a bridge plays the pending clip sets the pace. At most one
    /// `max_step` is covered per call. Returns the distance moved.
    pub fn move_front(&mut self, dt: f32) -> f32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        let motion = match (self.pending.as_ref(), self.current.as_ref()) {
            (Some(pending), _) => &pending.motion,
            (None, Some(play)) => &play.motion,
            (None, None) => return 0.0,
        };

        let max_step = motion.max_step();
        let speed = max_step / motion.time_step.max(f32::EPSILON);
        let distance = (speed * dt).min(max_step);

        let front = self.transform.front();
        self.transform.pos += front * distance;
        distance
    }

    pub fn current_motion(&self) -> Option<&Rc<Motion>> {
        self.current.as_ref().map(|p| &p.motion)
    }

    pub fn frame_index(&self) -> Option<usize> {
        self.current.as_ref().map(|p| p.frame)
    }

    pub fn in_transition(&self) -> bool {
        self.pending.is_some()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        let play = self.current.as_ref()?;
        play.motion.frames.get(play.frame)
    }

    /// World matrix of every joint of the current frame
    pub fn pose(&self) -> Vec<glm::Mat4> {
        let (Some(play), Some(frame)) = (self.current.as_ref(), self.current_frame()) else {
            return Vec::new();
        };
        let base = glm::scale(
            &self.transform.as_matrix(),
            &glm::vec3(self.scale, self.scale, self.scale),
        );
        compute_pose(&base, &play.motion.joints, frame)
    }

    /// World position of every joint of the current frame
    pub fn joint_positions(&self) -> Vec<glm::Vec3> {
        self.pose()
            .iter()
            .map(|m| glm::vec4_to_vec3(&glm::column(m, 3)))
            .collect()
    }
}

/// Forward kinematics: parents are listed before their children
pub fn compute_pose(base: &glm::Mat4, joints: &[Joint], frame: &Frame) -> Vec<glm::Mat4> {
    let mut world: Vec<glm::Mat4> = Vec::with_capacity(joints.len());

    for (i, joint) in joints.iter().enumerate() {
        let mut offset = glm::make_vec3(&joint.offset);
        if joint.is_root() {
            offset += frame.translation;
        }
        let rotation = frame
            .rotations
            .get(i)
            .copied()
            .unwrap_or_else(glm::Vec3::zeros);
        let local = rotate_xyz(&glm::translate(&glm::identity(), &offset), &rotation);

        let parent = match joint.parent {
            Some(p) if p < world.len() => world[p],
            _ => *base,
        };
        world.push(parent * local);
    }
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawClip;
    use pretty_assertions::assert_eq;

    const EPS: f32 = 1e-4;

    fn chain() -> Rc<[Joint]> {
        vec![
            Joint {
                name: "Hips".into(),
                ..Default::default()
            },
            Joint {
                name: "Spine".into(),
                parent: Some(0),
                offset: [0.0, 2.0, 0.0],
                ..Default::default()
            },
            Joint {
                name: "Head".into(),
                parent: Some(1),
                offset: [0.0, 1.0, 0.0],
                ..Default::default()
            },
        ]
        .into()
    }

    fn clip(name: &str, angles: &[f32], time_step: f32) -> Motion {
        let frames = angles
            .iter()
            .map(|a| {
                Frame::new(
                    glm::Vec3::zeros(),
                    vec![glm::Vec3::zeros(), glm::vec3(*a, 0.0, 0.0), glm::Vec3::zeros()],
                )
            })
            .collect();
        Motion::from_frames(name, chain(), frames, time_step)
    }

    // Hips moving 1 unit along Z per frame
    fn walk() -> Motion {
        let frames = (0..6)
            .map(|i| {
                Frame::new(
                    glm::vec3(0.0, 0.0, i as f32),
                    vec![glm::Vec3::zeros(); 3],
                )
            })
            .collect();
        let raw = RawClip {
            joints: chain().to_vec(),
            frames,
            time_step: 0.1,
        };
        Motion::from_raw("walk", raw, LoopMode::None, 10)
    }

    fn skeleton() -> Skeleton {
        let mut skeleton = Skeleton::new(MotionLibrary::new(), 1.0);
        skeleton.insert_motion(clip("idle", &[0.0, 10.0, 20.0, 30.0], 0.1));
        skeleton.insert_motion(clip("run", &[40.0, 30.0, 20.0, 10.0, 0.0], 0.1));
        skeleton
    }

    #[test]
    fn forward_kinematics_stacks_offsets() {
        let frame = Frame::new(glm::vec3(1.0, 0.0, 0.0), vec![glm::Vec3::zeros(); 3]);
        let pose = compute_pose(&glm::identity(), &chain(), &frame);
        let head = glm::vec4_to_vec3(&glm::column(&pose[2], 3));
        assert!(glm::distance(&head, &glm::vec3(1.0, 3.0, 0.0)) < EPS);
    }

    #[test]
    fn forward_kinematics_applies_parent_rotation() {
        // Bending the spine 90 degrees around X swings the head from +Y to +Z
        let frame = Frame::new(
            glm::Vec3::zeros(),
            vec![glm::Vec3::zeros(), glm::vec3(90.0, 0.0, 0.0), glm::Vec3::zeros()],
        );
        let pose = compute_pose(&glm::identity(), &chain(), &frame);
        let head = glm::vec4_to_vec3(&glm::column(&pose[2], 3));
        assert!(glm::distance(&head, &glm::vec3(0.0, 2.0, 1.0)) < EPS);
    }

    #[test]
    fn update_advances_and_wraps() {
        let mut s = skeleton();
        s.set_motion("idle").unwrap();
        assert_eq!(s.frame_index(), Some(0));

        s.update(0.25);
        assert_eq!(s.frame_index(), Some(2));

        s.update(0.2);
        assert_eq!(s.frame_index(), Some(0));
    }

    #[test]
    fn switching_plays_bridge_then_target() {
        let mut s = skeleton();
        s.set_motion("idle").unwrap();
        s.update(0.15); // frame 1, limb 10

        s.set_motion("run").unwrap();
        assert!(s.in_transition());
        assert_eq!(s.current_motion().unwrap().name, "idle_run");

        // 9 bridge frames at 0.1s each, then the matched run frame (limb 10)
        s.update(0.95);
        assert!(!s.in_transition());
        assert_eq!(s.current_motion().unwrap().name, "run");
        assert_eq!(s.frame_index(), Some(3));
    }

    #[test]
    fn selecting_current_motion_is_a_no_op() {
        let mut s = skeleton();
        s.set_motion("idle").unwrap();
        s.update(0.1);
        s.set_motion("idle").unwrap();
        assert_eq!(s.frame_index(), Some(1));
        assert!(!s.in_transition());
    }

    #[test]
    fn unknown_motion_is_rejected() {
        let mut s = skeleton();
        assert_eq!(s.set_motion("fly").unwrap_err().key, "unknown-motion");
    }

    #[test]
    fn pose_is_empty_before_playback() {
        let s = skeleton();
        assert!(s.pose().is_empty());
        assert!(s.current_frame().is_none());
    }

    #[test]
    fn skeleton_scale_applies_to_positions() {
        let mut s = skeleton();
        s.scale = 0.5;
        s.set_motion("idle").unwrap();
        let positions = s.joint_positions();
        assert_eq!(positions.len(), 3);
        assert!(glm::distance(&positions[2], &glm::vec3(0.0, 1.5, 0.0)) < EPS);
    }

    #[test]
    fn move_front_follows_clip_pace() {
        let mut s = skeleton();
        s.insert_motion(walk());
        s.set_motion("walk").unwrap();

        // 1 unit per 0.1s frame
        let moved = s.move_front(0.05);
        assert!((moved - 0.5).abs() < EPS);
        assert!(glm::distance(&s.transform.pos, &glm::vec3(0.0, 0.0, 0.5)) < EPS);
    }

    #[test]
    fn move_front_is_capped_at_max_step() {
        let mut s = skeleton();
        s.insert_motion(walk());
        s.set_motion("walk").unwrap();
        s.transform.rot = glm::vec3(0.0, 90.0, 0.0);

        let moved = s.move_front(2.0);
        assert!((moved - 1.0).abs() < EPS);
        assert!(glm::distance(&s.transform.pos, &glm::vec3(1.0, 0.0, 0.0)) < EPS);
    }

    #[test]
    fn move_front_without_clip_stays_put() {
        let mut s = skeleton();
        assert_eq!(s.move_front(0.1), 0.0);
        assert_eq!(s.transform.pos, glm::Vec3::zeros());
    }

    #[test]
    fn non_finite_dt_is_ignored() {
        let mut s = skeleton();
        s.insert_motion(walk());
        s.set_motion("walk").unwrap();
        s.update(0.1);

        s.update(f32::NAN);
        s.update(f32::INFINITY);
        assert_eq!(s.frame_index(), Some(1));
        assert_eq!(s.move_front(f32::NAN), 0.0);
        assert_eq!(s.transform.pos, glm::Vec3::zeros());
    }
}
