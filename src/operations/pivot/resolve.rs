use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3};
use crate::operations::query::{AlignmentGrid, AlignmentIndex};
use crate::scene::{NodeId, SceneGraph};

/// Where the new pivot should go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PivotTarget {
    /// One of the 27 alignment points of the node's bounds.
    Aligned(AlignmentIndex),
    /// An offset from the node's current origin, along the node's world axes.
    Custom(Vector3),
}

/// Resolves a [`PivotTarget`] to a world-space point.
pub struct ResolvePivot<'a> {
    node: NodeId,
    target: PivotTarget,
    grid: Option<&'a AlignmentGrid>,
}

impl<'a> ResolvePivot<'a> {
    /// Creates a new `ResolvePivot` query.
    #[must_use]
    pub fn new(node: NodeId, target: PivotTarget) -> Self {
        Self {
            node,
            target,
            grid: None,
        }
    }

    /// Supplies the node's alignment grid, required for aligned targets.
    #[must_use]
    pub fn with_grid(mut self, grid: &'a AlignmentGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Executes the query.
    ///
    /// Custom offsets are rotated by the node's world rotation but not
    /// scaled. Grid points are mapped through the node's full world frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing, or if an aligned target is
    /// requested without a grid.
    pub fn execute(&self, scene: &SceneGraph) -> Result<Point3> {
        let frame = scene.world_frame(self.node)?;
        match self.target {
            PivotTarget::Custom(offset) => Ok(frame.position() + frame.rotation() * offset),
            PivotTarget::Aligned(index) => {
                let grid = self.grid.ok_or_else(|| {
                    OperationError::InvalidInput("aligned pivot needs an alignment grid".into())
                })?;
                Ok(frame.transform_point(&grid.point(index)))
            }
        }
    }
}
