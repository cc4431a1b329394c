// Position/rotation/scale wrapper producing pose matrices

use super::interpolation::{rotate_xyz, unit_y};
use nalgebra_glm as glm;

/// Pose of an object in space
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub pos: glm::Vec3,
    pub scl: glm::Vec3,
    pub rot: glm::Vec3,                     // Euler XYZ, degrees
    pub rot_angle: f32,                     // Degrees, used when rot_axis is non-zero
    pub rot_axis: glm::Vec3,
    pub override_matrix: Option<glm::Mat4>, // Replaces the composed matrix when set
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: glm::vec3(0.0, 0.0, 0.0),
            scl: glm::vec3(1.0, 1.0, 1.0),
            rot: glm::vec3(0.0, 0.0, 0.0),
            rot_angle: 0.0,
            rot_axis: glm::vec3(0.0, 0.0, 0.0),
            override_matrix: None,
        }
    }
}

impl Transform {
    pub fn from_rotation(rot: glm::Vec3) -> Self {
        Self {
            rot,
            ..Default::default()
        }
    }

    /// Translate, then rotate, then scale. A set, non-zero override matrix is returned as is.
    pub fn as_matrix(&self) -> glm::Mat4 {
        if let Some(m) = self.override_matrix {
            if m != glm::Mat4::zeros() {
                return m;
            }
        }

        let m = glm::translate(&glm::identity(), &self.pos);
        let m = if self.rot_axis != glm::Vec3::zeros() {
            glm::rotate(&m, self.rot_angle.to_radians(), &self.rot_axis)
        } else {
            rotate_xyz(&m, &self.rot)
        };
        glm::scale(&m, &self.scl)
    }

    pub fn front(&self) -> glm::Vec3 {
        glm::normalize(&glm::vec4_to_vec3(&glm::column(&self.as_matrix(), 2)))
    }

    pub fn right(&self) -> glm::Vec3 {
        glm::normalize(&glm::cross(&self.front(), &unit_y()))
    }

    pub fn up(&self) -> glm::Vec3 {
        glm::normalize(&glm::cross(&self.front(), &self.right()))
    }

    /// Map a vector given in (right, up, front) coordinates into world space
    pub fn ruf(&self, value: &glm::Vec3) -> glm::Vec3 {
        self.right() * value.x + self.up() * value.y + self.front() * value.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::interpolation::{unit_x, unit_z};

    const EPS: f32 = 1e-4;

    fn close(a: &glm::Vec3, b: &glm::Vec3) -> bool {
        glm::distance(a, b) < EPS
    }

    #[test]
    fn default_transform_is_identity() {
        let t = Transform::default();
        assert_eq!(t.as_matrix(), glm::Mat4::identity());
    }

    #[test]
    fn translation_lands_in_last_column() {
        let t = Transform {
            pos: glm::vec3(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let col = glm::vec4_to_vec3(&glm::column(&t.as_matrix(), 3));
        assert!(close(&col, &glm::vec3(1.0, 2.0, 3.0)));
    }

    #[test]
    fn override_matrix_wins() {
        let mut m = glm::Mat4::identity();
        m[(0, 3)] = 42.0;
        let t = Transform {
            pos: glm::vec3(1.0, 1.0, 1.0),
            override_matrix: Some(m),
            ..Default::default()
        };
        assert_eq!(t.as_matrix(), m);
    }

    #[test]
    fn zero_override_is_ignored() {
        let t = Transform {
            override_matrix: Some(glm::Mat4::zeros()),
            ..Default::default()
        };
        assert_eq!(t.as_matrix(), glm::Mat4::identity());
    }

    #[test]
    fn axis_angle_takes_precedence_over_euler() {
        let t = Transform {
            rot: glm::vec3(90.0, 0.0, 0.0),
            rot_angle: 90.0,
            rot_axis: glm::vec3(0.0, 1.0, 0.0),
            ..Default::default()
        };
        assert!(close(&t.front(), &unit_x()));
    }

    #[test]
    fn basis_vectors_for_identity() {
        let t = Transform::default();
        assert!(close(&t.front(), &unit_z()));
        // front x +Y points left, front x right points down
        assert!(close(&t.right(), &glm::vec3(-1.0, 0.0, 0.0)));
        assert!(close(&t.up(), &glm::vec3(0.0, -1.0, 0.0)));
    }

    #[test]
    fn ruf_projects_local_coordinates() {
        let t = Transform::from_rotation(glm::vec3(0.0, 90.0, 0.0));
        let world = t.ruf(&glm::vec3(0.0, 0.0, 2.0));
        assert!(close(&world, &glm::vec3(2.0, 0.0, 0.0)));
    }

    #[test]
    fn scale_does_not_change_front_direction() {
        let t = Transform {
            scl: glm::vec3(3.0, 3.0, 3.0),
            ..Default::default()
        };
        assert!(close(&t.front(), &unit_z()));
    }
}
