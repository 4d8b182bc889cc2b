//! Scene graph seam
//!
//! The game adds, updates and removes nodes by [`EntityId`]; a renderer adapter
//! owns the actual meshes and materials.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sim::color::Color;
use crate::sim::entities::EntityId;
use crate::sim::geometry::Transform;

/// What a node looks like, enough for a renderer to build its meshes
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Wall {
        width: f32,
        height: f32,
        label: String,
        label_color: Color,
    },
    Flag {
        size: f32,
        stem_color: Color,
    },
    Car {
        scale: f32,
    },
    Shot,
    /// Ground grid, `size` x `size` cells
    Grid {
        size: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: EntityId,
    pub kind: NodeKind,
    pub transform: Transform,
    pub color: Color,
}

pub trait Scene {
    fn add(&mut self, node: &SceneNode);
    /// Push the latest transform/color of a node already in the scene
    fn update(&mut self, node: &SceneNode);
    fn remove(&mut self, id: EntityId);
    /// Release every GPU resource owned by the node subtree
    fn dispose(&mut self, id: EntityId);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneOp {
    Add(EntityId),
    Remove(EntityId),
    Dispose(EntityId),
}

#[derive(Debug, Default)]
struct SceneLog {
    ops: Vec<SceneOp>,
    nodes: Vec<SceneNode>,
}

/// In-memory scene for tests and the headless build. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct RecordingScene {
    inner: Rc<RefCell<SceneLog>>,
}

impl RecordingScene {
    pub fn ops(&self) -> Vec<SceneOp> {
        self.inner.borrow().ops.clone()
    }

    /// Nodes currently in the scene
    pub fn nodes(&self) -> Vec<SceneNode> {
        self.inner.borrow().nodes.clone()
    }

    pub fn node(&self, id: EntityId) -> Option<SceneNode> {
        self.inner.borrow().nodes.iter().find(|n| n.id == id).cloned()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.node(id).is_some()
    }

    pub fn disposed(&self) -> Vec<EntityId> {
        self.inner
            .borrow()
            .ops
            .iter()
            .filter_map(|op| match op {
                SceneOp::Dispose(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

impl Scene for RecordingScene {
    fn add(&mut self, node: &SceneNode) {
        let mut log = self.inner.borrow_mut();
        log.ops.push(SceneOp::Add(node.id));
        log.nodes.retain(|n| n.id != node.id);
        log.nodes.push(node.clone());
    }

    fn update(&mut self, node: &SceneNode) {
        let mut log = self.inner.borrow_mut();
        if let Some(existing) = log.nodes.iter_mut().find(|n| n.id == node.id) {
            *existing = node.clone();
        }
    }

    fn remove(&mut self, id: EntityId) {
        let mut log = self.inner.borrow_mut();
        log.ops.push(SceneOp::Remove(id));
        log.nodes.retain(|n| n.id != id);
    }

    fn dispose(&mut self, id: EntityId) {
        let mut log = self.inner.borrow_mut();
        log.ops.push(SceneOp::Dispose(id));
        log.nodes.retain(|n| n.id != id);
    }
}
