// One timestep of a motion clip

use super::interpolation::{oriented_angle, rot_to_vec, unit_y, unit_z};
use crate::error::FrameError;
use nalgebra_glm as glm;

/// Root displacement plus one Euler rotation (degrees) per joint, root first
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub translation: glm::Vec3,
    pub rotations: Vec<glm::Vec3>,
}

impl Default for Frame {
    fn default() -> Self {
        Self {
            translation: glm::vec3(0.0, 0.0, 0.0),
            rotations: Vec::new(),
        }
    }
}

impl Frame {
    pub fn new(translation: glm::Vec3, rotations: Vec<glm::Vec3>) -> Self {
        Self {
            translation,
            rotations,
        }
    }

    fn root(&self) -> glm::Vec3 {
        self.rotations
            .first()
            .copied()
            .unwrap_or_else(glm::Vec3::zeros)
    }

    /// Pose fingerprint used for nearest-frame searches.
    ///
    /// Weighs root height and root X/Z rotation double, then adds the sum of
    /// every non-root joint rotation. Only meaningful for comparing frames.
    pub fn value(&self) -> glm::Vec3 {
        let root = self.root();
        let rt = self.translation.component_mul(&glm::vec3(0.0, 2.0, 0.0));
        let rr = root.component_mul(&glm::vec3(2.0, 0.0, 2.0));

        let jr = self
            .rotations
            .iter()
            .fold(glm::Vec3::zeros(), |acc, rot| acc + rot);

        rt + rr + (jr - root)
    }

    /// Interpolate towards `other` at `alpha`.
    ///
    /// The root joint is not blended: it keeps only this frame's heading,
    /// expressed as a rotation around +Y, so Euler flips on the root never
    /// leak into the result.
    pub fn lerp_one(&self, other: &Frame, alpha: f32) -> Result<Frame, FrameError> {
        let translation = glm::mix(&self.translation, &other.translation, alpha);

        let root_front = rot_to_vec(&self.root());
        let root_y = oriented_angle(&unit_z(), &root_front, &unit_y()).to_degrees();

        let rotations = self
            .rotations
            .iter()
            .zip(other.rotations.iter())
            .enumerate()
            .map(|(i, (a, b))| {
                if i == 0 {
                    unit_y() * root_y
                } else {
                    glm::mix(a, b, alpha)
                }
            })
            .collect();

        let frame = Frame::new(translation, rotations);
        if self.rotations.len() != other.rotations.len() {
            return Err(FrameError::JointCountMismatch {
                left: self.rotations.len(),
                right: other.rotations.len(),
                partial: frame,
            });
        }
        Ok(frame)
    }

    /// Like [`Frame::lerp_one`] but logs a joint count mismatch and keeps the partial frame
    pub fn lerp_one_lossy(&self, other: &Frame, alpha: f32) -> Frame {
        match self.lerp_one(other, alpha) {
            Ok(frame) => frame,
            Err(FrameError::JointCountMismatch {
                left,
                right,
                partial,
            }) => {
                log::warn!("Interpolating frames with {left} and {right} joints, keeping shared joints");
                partial
            }
            Err(err) => {
                log::warn!("Interpolation failed: {err}");
                self.clone()
            }
        }
    }

    /// Bridge frames from this frame towards `other`.
    ///
    /// Alpha starts at 0.1 and grows by `1 / clamp(steps, 2, 100)` while it
    /// stays at or below 1.0, so `steps = 10` yields 9 frames and the
    /// maximum yields 91.
    pub fn lerp_transition(&self, other: &Frame, steps: u32) -> Vec<Frame> {
        let mut frames = Vec::new();
        if steps < 1 {
            return frames;
        }
        let alpha_step = 1.0 / (steps as f32).clamp(2.0, 100.0);

        let mut alpha = 0.1f32;
        while alpha <= 1.0 {
            frames.push(self.lerp_one_lossy(other, alpha));
            alpha += alpha_step;
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EPS: f32 = 1e-4;

    fn close(a: &glm::Vec3, b: &glm::Vec3) -> bool {
        glm::distance(a, b) < EPS
    }

    fn frame_a() -> Frame {
        Frame::new(
            glm::vec3(0.0, 0.0, 0.0),
            vec![glm::vec3(0.0, 0.0, 0.0), glm::vec3(10.0, 0.0, 0.0)],
        )
    }

    fn frame_b() -> Frame {
        Frame::new(
            glm::vec3(10.0, 0.0, 0.0),
            vec![glm::vec3(0.0, 0.0, 0.0), glm::vec3(20.0, 0.0, 0.0)],
        )
    }

    #[test]
    fn value_weighs_root_and_height() {
        let f = Frame::new(
            glm::vec3(5.0, 3.0, 7.0),
            vec![
                glm::vec3(1.0, 2.0, 3.0),
                glm::vec3(4.0, 5.0, 6.0),
                glm::vec3(-1.0, 0.5, 0.0),
            ],
        );
        // (0,6,0) + (2,0,6) + (3,5.5,6)
        assert!(close(&f.value(), &glm::vec3(5.0, 11.5, 12.0)));
    }

    #[test]
    fn value_of_default_frame_is_zero() {
        assert_eq!(Frame::default().value(), glm::Vec3::zeros());
    }

    #[test]
    fn lerp_halfway() {
        let f = frame_a().lerp_one(&frame_b(), 0.5).unwrap();
        assert!(close(&f.translation, &glm::vec3(5.0, 0.0, 0.0)));
        assert!(close(&f.rotations[1], &glm::vec3(15.0, 0.0, 0.0)));

        // Root comes from the heading of frame A, which faces +Z
        let heading = oriented_angle(&unit_z(), &rot_to_vec(&frame_a().rotations[0]), &unit_y());
        assert!(close(&f.rotations[0], &(unit_y() * heading.to_degrees())));
    }

    #[test]
    fn lerp_endpoints_reproduce_inputs() {
        let a = frame_a();
        let b = frame_b();

        let start = a.lerp_one(&b, 0.0).unwrap();
        assert_eq!(start.translation, a.translation);
        assert_eq!(start.rotations[1..], a.rotations[1..]);

        let end = a.lerp_one(&b, 1.0).unwrap();
        assert_eq!(end.translation, b.translation);
        assert_eq!(end.rotations[1..], b.rotations[1..]);
    }

    #[test]
    fn lerp_root_keeps_heading_not_average() {
        let a = Frame::new(
            glm::vec3(0.0, 0.0, 0.0),
            vec![glm::vec3(0.0, 30.0, 0.0), glm::vec3(0.0, 0.0, 0.0)],
        );
        let b = Frame::new(
            glm::vec3(0.0, 0.0, 0.0),
            vec![glm::vec3(0.0, 90.0, 0.0), glm::vec3(0.0, 0.0, 0.0)],
        );
        let f = a.lerp_one(&b, 0.5).unwrap();
        assert!(close(&f.rotations[0], &glm::vec3(0.0, 30.0, 0.0)));
    }

    #[test]
    fn lerp_reports_joint_mismatch_with_partial_frame() {
        let a = frame_a();
        let mut b = frame_b();
        b.rotations.push(glm::vec3(1.0, 1.0, 1.0));

        match a.lerp_one(&b, 0.5) {
            Err(FrameError::JointCountMismatch {
                left,
                right,
                partial,
            }) => {
                assert_eq!((left, right), (2, 3));
                assert_eq!(partial.rotations.len(), 2);
                assert!(close(&partial.translation, &glm::vec3(5.0, 0.0, 0.0)));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }

        let lossy = a.lerp_one_lossy(&b, 0.5);
        assert_eq!(lossy.rotations.len(), 2);
    }

    #[test]
    fn transition_is_empty_without_steps() {
        assert!(frame_a().lerp_transition(&frame_b(), 0).is_empty());
    }

    #[test]
    fn transition_frame_counts() {
        let a = frame_a();
        let b = frame_b();
        assert_eq!(a.lerp_transition(&b, 1).len(), 2);
        assert_eq!(a.lerp_transition(&b, 2).len(), 2);
        assert_eq!(a.lerp_transition(&b, 10).len(), 9);
        assert_eq!(a.lerp_transition(&b, 1000).len(), 91);
    }

    #[test]
    fn transition_at_ceiling_ends_near_target() {
        let a = frame_a();
        let b = frame_b();
        let frames = a.lerp_transition(&b, 100);
        assert_eq!(frames.len(), 91);

        // First alpha is 0.1, last is just below 1.0
        assert!((frames[0].translation.x - 1.0).abs() < 1e-3);
        let last = frames.last().unwrap();
        assert!((last.translation.x - 10.0).abs() < 1e-3);
        assert!((last.rotations[1].x - 20.0).abs() < 1e-3);
    }
}
