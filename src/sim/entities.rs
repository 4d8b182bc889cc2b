//! Level entities: walls and flags
//!
//! Entities own a [`Transform`] and a fixed local bounding box; they never
//! inherit from a renderer node. The scene adapter maps them to renderer nodes
//! by [`EntityId`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::color::{Color, ColorCycle};
use super::geometry::{Aabb, Transform};
use super::interception::Interceptable;
use crate::consts::*;
use crate::platform::scene::{NodeKind, Scene, SceneNode};

/// Unique identifier for an entity (and its scene node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Monotonic id source, one per game
#[derive(Debug, Clone)]
pub struct EntityIds {
    next: u32,
}

impl Default for EntityIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl EntityIds {
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Wall,
    Flag,
    Car,
    Shot,
    Grid,
}

/// Has a world transform
pub trait Positioned {
    fn transform(&self) -> &Transform;
    fn transform_mut(&mut self) -> &mut Transform;
}

/// Advanced once per rendered frame
pub trait Refreshable {
    fn refresh(&mut self, time: f64);
}

/// Owns renderer resources that must be released explicitly
pub trait Disposable {
    fn dispose(&mut self, scene: &mut dyn Scene);
    fn is_disposed(&self) -> bool;
}

/// An upright panel the car must not touch
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: EntityId,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub transform: Transform,
    boundaries: Aabb,
    cycle: ColorCycle,
    disposed: bool,
}

impl Wall {
    pub fn new(id: EntityId, width: f32, height: f32, color: Color) -> Self {
        Self {
            id,
            width,
            height,
            label: String::new(),
            transform: Transform::at(Vec3::new(0.0, height / 2.0, 0.0)),
            boundaries: Aabb::from_size(Vec3::new(width, height, WALL_DEPTH)),
            cycle: ColorCycle::new(color, COLOR_CYCLE_MS, COLOR_CYCLE_HUE_STEP),
            disposed: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Place on the ground plane at (x, z) with the given yaw
    pub fn place(&mut self, x: f32, z: f32, yaw: f32) {
        self.transform.position = Vec3::new(x, self.height / 2.0, z);
        self.transform.rotation = Vec3::new(0.0, yaw, 0.0);
    }

    pub fn color(&self) -> Color {
        self.cycle.color
    }

    /// The label is drawn in a darker shade of the panel color
    pub fn label_color(&self) -> Color {
        self.cycle.color.add_scalar(-0.4)
    }

    pub fn scene_node(&self) -> SceneNode {
        SceneNode {
            id: self.id,
            kind: NodeKind::Wall {
                width: self.width,
                height: self.height,
                label: self.label.clone(),
                label_color: self.label_color(),
            },
            transform: self.transform,
            color: self.color(),
        }
    }
}

impl Interceptable for Wall {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Wall
    }
    fn boundaries(&self) -> Aabb {
        self.boundaries
    }
    fn position(&self) -> Vec3 {
        self.transform.position
    }
}

impl Positioned for Wall {
    fn transform(&self) -> &Transform {
        &self.transform
    }
    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

impl Refreshable for Wall {
    fn refresh(&mut self, time: f64) {
        self.cycle.refresh(time);
    }
}

impl Disposable for Wall {
    fn dispose(&mut self, scene: &mut dyn Scene) {
        if !self.disposed {
            scene.dispose(self.id);
            self.disposed = true;
        }
    }
    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// A collectible flag (mushroom-shaped marker)
#[derive(Debug, Clone)]
pub struct Flag {
    pub id: EntityId,
    pub size: f32,
    pub transform: Transform,
    boundaries: Aabb,
    cycle: ColorCycle,
    disposed: bool,
}

impl Flag {
    pub fn new(id: EntityId, size: f32, color: Color) -> Self {
        Self {
            id,
            size,
            transform: Transform::default(),
            boundaries: Aabb::from_size(Vec3::splat(size)),
            cycle: ColorCycle::new(color, COLOR_CYCLE_MS, COLOR_CYCLE_HUE_STEP),
            disposed: false,
        }
    }

    pub fn place(&mut self, x: f32, z: f32) {
        self.transform.position = Vec3::new(x, 0.0, z);
    }

    pub fn color(&self) -> Color {
        self.cycle.color
    }

    /// The stem is slightly shifted in hue and darker than the cap
    pub fn stem_color(&self) -> Color {
        self.cycle.color.offset_hsl(0.025, 0.0, -0.1)
    }

    pub fn scene_node(&self) -> SceneNode {
        SceneNode {
            id: self.id,
            kind: NodeKind::Flag {
                size: self.size,
                stem_color: self.stem_color(),
            },
            transform: self.transform,
            color: self.color(),
        }
    }
}

impl Interceptable for Flag {
    fn id(&self) -> EntityId {
        self.id
    }
    fn kind(&self) -> EntityKind {
        EntityKind::Flag
    }
    fn boundaries(&self) -> Aabb {
        self.boundaries
    }
    fn position(&self) -> Vec3 {
        self.transform.position
    }
}

impl Positioned for Flag {
    fn transform(&self) -> &Transform {
        &self.transform
    }
    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }
}

impl Refreshable for Flag {
    fn refresh(&mut self, time: f64) {
        self.cycle.refresh(time);
    }
}

impl Disposable for Flag {
    fn dispose(&mut self, scene: &mut dyn Scene) {
        if !self.disposed {
            scene.dispose(self.id);
            self.disposed = true;
        }
    }
    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// An active level element
#[derive(Debug, Clone)]
pub enum Element {
    Wall(Wall),
    Flag(Flag),
}

impl Element {
    pub fn scene_node(&self) -> SceneNode {
        match self {
            Element::Wall(wall) => wall.scene_node(),
            Element::Flag(flag) => flag.scene_node(),
        }
    }

    pub fn as_wall(&self) -> Option<&Wall> {
        match self {
            Element::Wall(wall) => Some(wall),
            Element::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<&Flag> {
        match self {
            Element::Flag(flag) => Some(flag),
            Element::Wall(_) => None,
        }
    }
}

impl Interceptable for Element {
    fn id(&self) -> EntityId {
        match self {
            Element::Wall(wall) => wall.id,
            Element::Flag(flag) => flag.id,
        }
    }
    fn kind(&self) -> EntityKind {
        match self {
            Element::Wall(_) => EntityKind::Wall,
            Element::Flag(_) => EntityKind::Flag,
        }
    }
    fn boundaries(&self) -> Aabb {
        match self {
            Element::Wall(wall) => wall.boundaries(),
            Element::Flag(flag) => flag.boundaries(),
        }
    }
    fn position(&self) -> Vec3 {
        match self {
            Element::Wall(wall) => wall.position(),
            Element::Flag(flag) => flag.position(),
        }
    }
}

impl Refreshable for Element {
    fn refresh(&mut self, time: f64) {
        match self {
            Element::Wall(wall) => wall.refresh(time),
            Element::Flag(flag) => flag.refresh(time),
        }
    }
}

impl Disposable for Element {
    fn dispose(&mut self, scene: &mut dyn Scene) {
        match self {
            Element::Wall(wall) => wall.dispose(scene),
            Element::Flag(flag) => flag.dispose(scene),
        }
    }
    fn is_disposed(&self) -> bool {
        match self {
            Element::Wall(wall) => wall.is_disposed(),
            Element::Flag(flag) => flag.is_disposed(),
        }
    }
}
