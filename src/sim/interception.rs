//! Interception detection between positioned entities
//!
//! Every entity carries a local-space bounding box. To test two entities the
//! boxes are moved to the entities' positions and intersected. Rotation is
//! ignored: boxes stay axis-aligned whatever the entity's yaw.

use glam::Vec3;

use super::entities::{EntityId, EntityKind};
use super::geometry::{Aabb, yaw_towards};

/// Something with a fixed local bounding box and a world position
pub trait Interceptable {
    fn id(&self) -> EntityId;
    fn kind(&self) -> EntityKind;
    /// Local-space box, fixed at construction
    fn boundaries(&self) -> Aabb;
    fn position(&self) -> Vec3;
}

/// Overlap of two world-space boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub source_box: Aabb,
    pub target_box: Aabb,
    pub intersection: Aabb,
    /// Target to source
    pub direction: Vec3,
    /// `direction` as an Euler orientation
    pub rotation: Vec3,
}

/// Test two boxes placed at two positions. `None` when they do not overlap.
pub fn intersects(
    source_bounds: &Aabb,
    source_position: Vec3,
    target_bounds: &Aabb,
    target_position: Vec3,
) -> Option<Overlap> {
    let source_box = source_bounds.translated(source_position);
    let target_box = target_bounds.translated(target_position);
    let intersection = source_box.intersect(&target_box);
    if intersection.is_empty() {
        return None;
    }
    let direction = source_position - target_position;
    Some(Overlap {
        source_box,
        target_box,
        intersection,
        direction,
        rotation: yaw_towards(direction),
    })
}

/// A detected overlap between a source entity and one of a list of candidates
#[derive(Debug, Clone, PartialEq)]
pub struct Interception {
    pub source: EntityId,
    pub target: EntityId,
    pub target_kind: EntityKind,
    /// Position of the target in the candidate list
    pub target_index: usize,
    pub overlap: Overlap,
}

impl Interception {
    pub fn rotation(&self) -> Vec3 {
        self.overlap.rotation
    }
}

/// Test `source`, placed at `position`, against a single target
pub fn intercept_one<S, T>(source: &S, target: &T, position: Vec3) -> Option<Overlap>
where
    S: Interceptable + ?Sized,
    T: Interceptable + ?Sized,
{
    intersects(
        &source.boundaries(),
        position,
        &target.boundaries(),
        target.position(),
    )
}

/// First candidate, in list order, overlapping `source` placed at `position`.
///
/// List order decides which obstacle is resolved when several overlap at once:
/// the first match wins, not the nearest.
pub fn find_first_interception<S, T>(
    source: &S,
    candidates: &[T],
    position: Vec3,
) -> Option<Interception>
where
    S: Interceptable + ?Sized,
    T: Interceptable,
{
    candidates.iter().enumerate().find_map(|(index, target)| {
        intercept_one(source, target, position).map(|overlap| Interception {
            source: source.id(),
            target: target.id(),
            target_kind: target.kind(),
            target_index: index,
            overlap,
        })
    })
}
