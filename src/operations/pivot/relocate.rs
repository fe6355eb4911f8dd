use tracing::debug;

use crate::error::Result;
use crate::math::{Point3, Vector3};
use crate::scene::{NodeId, SceneGraph};

/// Moves a node's origin to a world-space pivot without moving anything it
/// renders.
pub struct RelocatePivot {
    node: NodeId,
    pivot: Point3,
}

impl RelocatePivot {
    /// Creates a new `RelocatePivot` operation.
    #[must_use]
    pub fn new(node: NodeId, pivot: Point3) -> Self {
        Self { node, pivot }
    }

    /// Executes the relocation, modifying the node and its direct children
    /// in-place.
    ///
    /// Returns the shift: the pivot expressed in the node's frame before
    /// the move. Children are moved in world space by the opposite of the
    /// node's displacement, and geometry owned by the node itself is
    /// translated by `-shift`, so every world position stays put.
    ///
    /// Running this twice with the same pivot is not a no-op relative to
    /// the original state; always resolve a fresh pivot first.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or its world frame is singular.
    pub fn execute(&self, scene: &mut SceneGraph) -> Result<Vector3> {
        let to_local = scene.inverse_world_frame(self.node)?;
        let origin = scene.world_position(self.node)?;
        let shift = to_local.transform_point(&self.pivot).coords;
        let correction = origin - self.pivot;

        let children = scene.children(self.node)?.to_vec();
        for &child in &children {
            let world = scene.world_position(child)?;
            scene.set_world_position(child, &(world + correction))?;
        }

        let node = scene.node_mut(self.node)?;
        for geometry in &mut node.geometries {
            geometry.map_positions(|v| v - shift)?;
        }
        scene.set_world_position(self.node, &self.pivot)?;

        debug!(
            node = %scene.describe(self.node),
            pivot = ?self.pivot,
            shift = ?shift,
            children = children.len(),
            "relocated pivot"
        );
        Ok(shift)
    }
}
