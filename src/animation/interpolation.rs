// Rotation helpers shared by frames, motions and the skeleton
// Euler angles are stored in degrees and applied in X, Y, Z order

use nalgebra_glm as glm;

pub fn unit_x() -> glm::Vec3 {
    glm::vec3(1.0, 0.0, 0.0)
}

pub fn unit_y() -> glm::Vec3 {
    glm::vec3(0.0, 1.0, 0.0)
}

pub fn unit_z() -> glm::Vec3 {
    glm::vec3(0.0, 0.0, 1.0)
}

/// Apply Euler rotation (degrees) to `matrix`, X first, then Y, then Z
pub fn rotate_xyz(matrix: &glm::Mat4, rotation: &glm::Vec3) -> glm::Mat4 {
    let radians = glm::radians(rotation);
    let m = glm::rotate_x(matrix, radians.x);
    let m = glm::rotate_y(&m, radians.y);
    glm::rotate_z(&m, radians.z)
}

/// Forward direction (local +Z) of an Euler rotation given in degrees
pub fn rot_to_vec(rotation: &glm::Vec3) -> glm::Vec3 {
    let m = rotate_xyz(&glm::identity(), rotation);
    glm::normalize(&glm::vec4_to_vec3(&glm::column(&m, 2)))
}

/// Signed angle in radians from `x` to `y`, positive when turning counter-clockwise around `reference`.
/// Both vectors are expected to be normalized.
pub fn oriented_angle(x: &glm::Vec3, y: &glm::Vec3, reference: &glm::Vec3) -> f32 {
    let angle = glm::dot(x, y).clamp(-1.0, 1.0).acos();
    if glm::dot(reference, &glm::cross(x, y)) < 0.0 {
        -angle
    } else {
        angle
    }
}

/// Decompose the rotation part of `m` into X, Y, Z Euler angles (radians), the inverse of [`rotate_xyz`]
pub fn extract_euler_xyz(m: &glm::Mat4) -> glm::Vec3 {
    // nalgebra indexes (row, col); glm's M[c][r] maps to m[(r, c)]
    let t1 = m[(1, 2)].atan2(m[(2, 2)]);
    let c2 = (m[(0, 0)] * m[(0, 0)] + m[(0, 1)] * m[(0, 1)]).sqrt();
    let t2 = (-m[(0, 2)]).atan2(c2);
    let s1 = t1.sin();
    let c1 = t1.cos();
    let t3 = (s1 * m[(2, 0)] - c1 * m[(1, 0)]).atan2(c1 * m[(1, 1)] - s1 * m[(2, 1)]);
    glm::vec3(-t1, -t2, -t3)
}

/// Sum of absolute component differences
pub fn comp_distance(a: &glm::Vec3, b: &glm::Vec3) -> f32 {
    glm::comp_add(&glm::abs(&(a - b)))
}
