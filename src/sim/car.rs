//! The player's car: drop-in, movement proposals, shooting and the fall animation
//!
//! The car never commits its own motion. `move_*` and `steer_*` return the
//! intended change and the [`Game`](super::game::Game) decides whether to apply it.

use glam::Vec3;

use super::entities::{EntityId, EntityIds, EntityKind, Positioned};
use super::geometry::{Aabb, Transform, find_delta_xz};
use super::interception::Interceptable;
use crate::consts::*;
use crate::platform::scene::{NodeKind, SceneNode};
use crate::sim::color::Color;

/// Car bounding box (width, height, depth)
pub const CAR_SIZE: Vec3 = Vec3::new(1.0, 0.5, 2.0);
const CAR_COLOR: u32 = 0x0066ff;
const SHOT_COLOR: u32 = 0xff0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarMode {
    /// Dropping onto the level; movement disabled
    Descending,
    /// Movement, steering and shooting enabled
    Active,
    /// Game over animation, terminal until the next level
    Falling,
}

/// A projectile flying along the car's heading for a fixed lifetime
#[derive(Debug, Clone)]
pub struct CarShot {
    pub id: EntityId,
    pub transform: Transform,
    time_start: f64,
}

impl CarShot {
    pub fn new(id: EntityId, transform: Transform, time_start: f64) -> Self {
        Self {
            id,
            transform,
            time_start,
        }
    }

    /// Advance one tick. Returns false once the lifetime is over.
    pub fn advance(&mut self, time: f64) -> bool {
        if (self.time_start - time).abs() < SHOT_LIFETIME_MS {
            self.transform.position += find_delta_xz(self.transform.rotation, SHOT_SPEED);
            true
        } else {
            false
        }
    }

    pub fn scene_node(&self) -> SceneNode {
        SceneNode {
            id: self.id,
            kind: NodeKind::Shot,
            transform: self.transform,
            color: Color::from_hex(SHOT_COLOR),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Car {
    pub id: EntityId,
    pub transform: Transform,
    boundaries: Aabb,
    mode: CarMode,
    drop_height: f32,
    scale: f32,
    shots: Vec<CarShot>,
    last_shot_time: Option<f64>,
}

impl Car {
    /// A new car starts its drop-in immediately
    pub fn new(id: EntityId) -> Self {
        let mut car = Self {
            id,
            transform: Transform::default(),
            boundaries: Aabb::from_size(CAR_SIZE),
            mode: CarMode::Descending,
            drop_height: DROP_IN_HEIGHT,
            scale: 1.0,
            shots: Vec::new(),
            last_shot_time: None,
        };
        car.drop_in();
        car
    }

    pub fn mode(&self) -> CarMode {
        self.mode
    }

    pub fn movement_enabled(&self) -> bool {
        self.mode == CarMode::Active
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn shots(&self) -> &[CarShot] {
        &self.shots
    }

    /// Move back to the origin, facing forward, and descend from the drop-in height
    pub fn drop_in(&mut self) {
        self.transform = Transform::at(Vec3::new(0.0, DROP_IN_HEIGHT, 0.0));
        self.drop_height = DROP_IN_HEIGHT;
        self.mode = CarMode::Descending;
    }

    /// Start shrinking away; movement stays disabled
    pub fn fall_down(&mut self) {
        self.mode = CarMode::Falling;
    }

    fn delta(&self, speed: f32) -> Vec3 {
        find_delta_xz(self.transform.rotation, speed)
    }

    /// Proposed displacement along the heading
    pub fn move_forward(&self, speed: f32) -> Option<Vec3> {
        self.movement_enabled().then(|| self.delta(speed))
    }

    pub fn move_backward(&self, speed: f32) -> Option<Vec3> {
        self.movement_enabled().then(|| -self.delta(speed))
    }

    /// Proposed yaw change
    pub fn steer_left(&self, radians: f32) -> Option<f32> {
        self.movement_enabled().then_some(radians)
    }

    pub fn steer_right(&self, radians: f32) -> Option<f32> {
        self.movement_enabled().then_some(-radians)
    }

    /// Fire a projectile if under the concurrent limit and past the minimum interval
    pub fn shoot(&mut self, time: f64, ids: &mut EntityIds) -> Option<&CarShot> {
        if !self.movement_enabled() || self.shots.len() >= MAX_SHOTS {
            return None;
        }
        let too_soon = self
            .last_shot_time
            .is_some_and(|last| (last - time).abs() <= MIN_SHOT_INTERVAL_MS);
        if too_soon {
            return None;
        }
        self.last_shot_time = Some(time);
        self.shots.push(CarShot::new(ids.next_id(), self.transform, time));
        self.shots.last()
    }

    /// Per-frame animation. Returns the ids of projectiles that expired this tick.
    pub fn tick(&mut self, time: f64) -> Vec<EntityId> {
        match self.mode {
            CarMode::Descending => {
                self.drop_height -= DROP_IN_STEP;
                if self.drop_height >= 0.0 {
                    self.transform.position.y = self.drop_height;
                } else {
                    self.transform.position.y = 0.0;
                    self.mode = CarMode::Active;
                }
            }
            CarMode::Falling => self.scale *= FALL_SCALE,
            CarMode::Active => {}
        }

        let mut expired = Vec::new();
        self.shots.retain_mut(|shot| {
            let alive = shot.advance(time);
            if !alive {
                expired.push(shot.id);
            }
            alive
        });
        expired
    }

    pub fn scene_node(&self) -> SceneNode {
        SceneNode {
            id: self.id,
            kind: NodeKind::Car { scale: self.scale },
            transform: self.transform,
            color: Color::from_hex(CAR_COLOR),
        }
    }
}

impl Interceptable for Car {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Car
    }
    fn boundaries(&self) -> Aabb {
        self.boundaries
    }
    fn position(&self) -> Vec3 {
        self.transform.position
    }
}

impl Positioned for Car {
    fn transform(&self) -> &Transform {
        &self.transform
    }
    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}
