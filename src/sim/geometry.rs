//! Positions, rotations and axis-aligned boxes
//!
//! Coordinates follow the usual 3D scene convention: Y is up, the car drives
//! on the XZ plane and "forward" is -Z before rotation.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of the given size centered on the local origin
    pub fn from_size(size: Vec3) -> Self {
        let half = size / 2.0;
        Self::new(-half, half)
    }

    /// Box moved by `offset` (local space to world space)
    pub fn translated(&self, offset: Vec3) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    /// Intersection box. Empty (see [`Aabb::is_empty`]) when the boxes are disjoint.
    pub fn intersect(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Empty when `max < min` on any axis. Touching boxes are not empty.
    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }
}

/// Position and Euler rotation (radians, XYZ order)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    pub fn quat(&self) -> Quat {
        euler_to_quat(self.rotation)
    }

    /// Rotate around the local Y axis
    pub fn rotate_y(&mut self, radians: f32) {
        self.rotation.y += radians;
    }

    /// Distance from the vertical axis through the origin
    pub fn distance_from_origin_xz(&self) -> f32 {
        (self.position.x.powi(2) + self.position.z.powi(2)).sqrt()
    }
}

#[inline]
pub fn euler_to_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

/// Displacement of `delta` units along the forward direction of `rotation`,
/// projected onto the horizontal plane.
pub fn find_delta_xz(rotation: Vec3, delta: f32) -> Vec3 {
    let mut v = find_delta_xyz(rotation, delta);
    v.y = 0.0;
    v
}

/// Displacement of `delta` units along the forward direction of `rotation`.
pub fn find_delta_xyz(rotation: Vec3, delta: f32) -> Vec3 {
    euler_to_quat(rotation) * Vec3::NEG_Z * delta
}

/// Euler rotation (yaw only) whose forward direction points along `direction`.
pub fn yaw_towards(direction: Vec3) -> Vec3 {
    if direction.x == 0.0 && direction.z == 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(0.0, (-direction.x).atan2(-direction.z), 0.0)
}
