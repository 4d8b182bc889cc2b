//! Chase camera with a free-look mode
//!
//! Attached, the camera rides behind the car at (height, distance) in the car's
//! frame. Detached, it stays where it is and keeps looking at the car.

use glam::Vec3;

use super::geometry::{Transform, find_delta_xz};
use crate::tuning::{Controls, Tunable};

/// Distance of the look-at point in first person view
const FIRST_PERSON_LOOK_AHEAD: f32 = 100.0;
const FIRST_PERSON_HEIGHT: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    attached: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            attached: true,
        }
    }
}

impl Camera {
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Place the camera behind the car according to the zoom tunable.
    ///
    /// zoom < 0 keeps the manual height and distance, zoom == 0 is a first person
    /// view, zoom > 0 derives height and distance from the zoom.
    pub fn reset(&mut self, car: &Transform, controls: &mut Controls) {
        let zoom = controls.get(Tunable::CameraZoom);
        let mut pivot = car.position;
        if zoom == 0.0 {
            controls.set(Tunable::CameraHeight, FIRST_PERSON_HEIGHT);
            controls.set(Tunable::CameraDistance, -1.0);
            pivot += find_delta_xz(car.rotation, FIRST_PERSON_LOOK_AHEAD);
        } else if zoom > 0.0 {
            controls.set(Tunable::CameraHeight, zoom);
            controls.set(Tunable::CameraDistance, zoom * (6.0 - zoom).max(3.0));
        }
        let local = Vec3::new(
            0.0,
            controls.get(Tunable::CameraHeight),
            controls.get(Tunable::CameraDistance),
        );
        self.position = car.position + car.quat() * local;
        self.target = pivot;
    }

    /// Stop following: stand `distance` behind the car and watch it
    pub fn detach(&mut self, car: &Transform, distance: f32) {
        self.attached = false;
        let behind = car.position - find_delta_xz(car.rotation, distance);
        self.position.x = behind.x;
        self.position.z = behind.z;
        self.target = car.position;
    }

    pub fn attach(&mut self, car: &Transform, controls: &mut Controls) {
        self.attached = true;
        self.reset(car, controls);
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }
}
