//! Interactive pivot editing state.
//!
//! A [`PivotSession`] holds what an editor panel needs between frames: the
//! selected node, the chosen alignment cell, the custom offset and the
//! rebase options. Previews are recomputed on every call and never touch
//! the scene; [`PivotSession::apply`] commits one undoable change.

use tracing::debug;

use crate::error::Result;
use crate::history::History;
use crate::math::{Aabb, Point3, Vector3};
use crate::operations::pivot::{
    ChangePivot, PivotChange, PivotTarget, RebaseOptions, ResolvePivot,
};
use crate::operations::query::{AlignmentGrid, AlignmentIndex, ComputeBounds, GridLevel};
use crate::scene::{NodeId, SceneGraph};

/// What the editor draws for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotPreview {
    /// Bounds in the selected node's frame.
    pub bounds: Aabb,
    /// The 8 box corners in world space.
    pub world_corners: [Point3; 8],
    /// The 27 alignment points in world space.
    pub grid_world: Vec<Point3>,
    /// Where the pivot would go.
    pub pivot: Point3,
}

/// Selection and pivot settings of one editor panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotSession {
    selection: Option<NodeId>,
    cell: AlignmentIndex,
    custom_enabled: bool,
    custom_offset: Vector3,
    options: RebaseOptions,
}

impl Default for PivotSession {
    fn default() -> Self {
        Self {
            selection: None,
            cell: AlignmentIndex::center(GridLevel::Mid),
            custom_enabled: false,
            custom_offset: Vector3::zeros(),
            options: RebaseOptions::default(),
        }
    }
}

impl PivotSession {
    /// Creates a session with nothing selected, targeting the box center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rebase passes used by [`apply`](Self::apply).
    #[must_use]
    pub fn with_options(mut self, options: RebaseOptions) -> Self {
        self.options = options;
        self
    }

    /// Changes the active node.
    pub fn select(&mut self, node: Option<NodeId>) {
        self.selection = node;
    }

    /// The active node.
    #[must_use]
    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    /// Picks an alignment cell.
    ///
    /// # Errors
    ///
    /// Returns an error if `corner` is not in `0..9`; the previous cell is
    /// kept.
    pub fn set_cell(&mut self, level: GridLevel, corner: usize) -> Result<()> {
        self.cell = AlignmentIndex::new(level, corner)?;
        Ok(())
    }

    /// The chosen alignment cell.
    #[must_use]
    pub fn cell(&self) -> AlignmentIndex {
        self.cell
    }

    /// Switches to a custom offset from the node origin, or back to the grid.
    pub fn set_custom(&mut self, enabled: bool, offset: Vector3) {
        self.custom_enabled = enabled;
        self.custom_offset = offset;
    }

    /// The custom offset, zero after every apply.
    #[must_use]
    pub fn custom_offset(&self) -> Vector3 {
        self.custom_offset
    }

    /// The target the current settings describe.
    #[must_use]
    pub fn target(&self) -> PivotTarget {
        if self.custom_enabled {
            PivotTarget::Custom(self.custom_offset)
        } else {
            PivotTarget::Aligned(self.cell)
        }
    }

    /// Computes the preview for the selection, or `None` if nothing is
    /// selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the selection has no geometry or is no longer in
    /// the scene.
    pub fn preview(&self, scene: &SceneGraph) -> Result<Option<PivotPreview>> {
        let Some(node) = self.selection else {
            return Ok(None);
        };
        let bounds = ComputeBounds::new(node).execute(scene)?;
        let grid = AlignmentGrid::from_bounds(&bounds);
        let frame = scene.world_frame(node)?;
        let pivot = ResolvePivot::new(node, self.target())
            .with_grid(&grid)
            .execute(scene)?;
        Ok(Some(PivotPreview {
            bounds,
            world_corners: bounds.corners().map(|c| frame.transform_point(&c)),
            grid_world: grid.to_world(&frame),
            pivot,
        }))
    }

    /// Applies the current target to the selection and records it in
    /// `history`. Returns `None` if nothing is selected.
    ///
    /// The custom offset is reset to zero after a successful apply.
    ///
    /// # Errors
    ///
    /// Returns the error of the underlying [`ChangePivot`]; the scene is
    /// then unchanged.
    pub fn apply(
        &mut self,
        scene: &mut SceneGraph,
        history: &mut History,
    ) -> Result<Option<PivotChange>> {
        let Some(node) = self.selection else {
            debug!("no selection, nothing to apply");
            return Ok(None);
        };
        let change = ChangePivot::new(node, self.target())
            .with_options(self.options)
            .execute(scene, history)?;
        self.custom_offset = Vector3::zeros();
        Ok(Some(change))
    }
}
