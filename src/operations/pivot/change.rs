use tracing::{info, warn};

use crate::error::Result;
use crate::history::{EditCommand, History, SceneSnapshot};
use crate::math::{Point3, Vector3};
use crate::operations::definition::{CommitDefinition, CommitReport};
use crate::operations::query::{AlignmentGrid, ComputeBounds};
use crate::scene::{NodeId, SceneGraph};

use super::{
    PivotTarget, PropagateShift, RebaseGeometry, RebaseOptions, RebaseReport, RelocatePivot,
    ResolvePivot,
};

const EDIT_LABEL: &str = "Change pivot";

/// Everything a [`ChangePivot`] did.
#[derive(Debug)]
pub struct PivotChange {
    /// The world-space pivot the node now sits on.
    pub pivot: Point3,
    /// The pivot in the node's frame before the move.
    pub shift: Vector3,
    /// Per-child re-basing outcome.
    pub rebase: RebaseReport,
    /// Definition commit, `None` if the node is not an instance.
    pub commit: Option<CommitReport>,
    /// Other instances moved to compensate for the new origin.
    pub propagated: Vec<NodeId>,
}

/// Moves a node's pivot and carries the change through its children, its
/// definition and the definition's other instances as one undoable edit.
pub struct ChangePivot {
    node: NodeId,
    target: PivotTarget,
    options: RebaseOptions,
}

impl ChangePivot {
    /// Creates a new `ChangePivot` operation with default rebase options.
    #[must_use]
    pub fn new(node: NodeId, target: PivotTarget) -> Self {
        Self {
            node,
            target,
            options: RebaseOptions::default(),
        }
    }

    /// Sets the child re-basing passes.
    #[must_use]
    pub fn with_options(mut self, options: RebaseOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the change and records it in `history`.
    ///
    /// Order: resolve the pivot from fresh bounds, relocate, rebase the
    /// children, commit the definition, then propagate the shift to the
    /// other instances. Pre-images of every touched node and of the
    /// definition are captured before anything moves; on error they are
    /// restored and nothing is recorded.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::NoGeometry`](crate::error::BoundsError::NoGeometry)
    /// for an aligned target on a node with nothing to measure, or any error
    /// raised by the individual steps.
    pub fn execute(&self, scene: &mut SceneGraph, history: &mut History) -> Result<PivotChange> {
        let pivot = self.resolve(scene)?;
        let before = capture_touched(scene, self.node)?;

        match self.apply(scene, pivot) {
            Ok(change) => {
                let after = capture_touched(scene, self.node)?;
                history.record(EditCommand::new(EDIT_LABEL, before, after));
                info!(
                    node = %scene.describe(self.node),
                    pivot = ?change.pivot,
                    instances = change.propagated.len(),
                    "changed pivot"
                );
                Ok(change)
            }
            Err(err) => {
                warn!(node = %scene.describe(self.node), error = %err, "pivot change failed, rolling back");
                before.restore(scene)?;
                Err(err)
            }
        }
    }

    fn resolve(&self, scene: &SceneGraph) -> Result<Point3> {
        match self.target {
            PivotTarget::Aligned(_) => {
                let bounds = ComputeBounds::new(self.node).execute(scene)?;
                let grid = AlignmentGrid::from_bounds(&bounds);
                ResolvePivot::new(self.node, self.target)
                    .with_grid(&grid)
                    .execute(scene)
            }
            PivotTarget::Custom(_) => ResolvePivot::new(self.node, self.target).execute(scene),
        }
    }

    fn apply(&self, scene: &mut SceneGraph, pivot: Point3) -> Result<PivotChange> {
        let shift = RelocatePivot::new(self.node, pivot).execute(scene)?;
        let rebase = RebaseGeometry::new(self.node)
            .with_options(self.options)
            .execute(scene)?;
        let commit = CommitDefinition::new(self.node).execute(scene)?;
        let propagated = PropagateShift::new(self.node, shift).execute(scene)?;
        Ok(PivotChange {
            pivot,
            shift,
            rebase,
            commit,
            propagated,
        })
    }
}

/// The edited subtree, its definition and every other instance subtree.
fn capture_touched(scene: &SceneGraph, node: NodeId) -> Result<SceneSnapshot> {
    let mut snapshot = SceneSnapshot::new();
    snapshot.capture_subtree(scene, node)?;
    if let Some(definition) = scene.definition_of(node) {
        snapshot.capture_definition(scene, definition)?;
        for &instance in scene.instances_of(definition) {
            snapshot.capture_subtree(scene, instance)?;
        }
    }
    Ok(snapshot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::error::{BoundsError, RepivotError};
    use crate::geometry::TriangleMesh;
    use crate::math::{Aabb, Rotation, POSE_TOLERANCE};
    use crate::operations::definition::InstantiateDefinition;
    use crate::operations::query::{AlignmentIndex, GridLevel};
    use crate::scene::{DefinitionData, NodeData, Prototype};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn world_vertices(scene: &SceneGraph, root: NodeId) -> Vec<Point3> {
        let mut out = Vec::new();
        for node in scene.descendants(root).unwrap() {
            let frame = scene.world_frame(node).unwrap();
            for geometry in &scene.node(node).unwrap().geometries {
                out.extend(geometry.points().positions().iter().map(|v| frame.transform_point(v)));
            }
        }
        out
    }

    fn local_positions(scene: &SceneGraph, roots: &[NodeId]) -> Vec<Vector3> {
        roots
            .iter()
            .flat_map(|&root| scene.descendants(root).unwrap())
            .map(|node| scene.node(node).unwrap().local_position)
            .collect()
    }

    fn assert_same_points(before: &[Point3], after: &[Point3]) {
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after) {
            assert_relative_eq!(*b, *a, epsilon = POSE_TOLERANCE);
        }
    }

    fn chair() -> Prototype {
        Prototype::new("chair")
            .with_child(
                Prototype::new("seat")
                    .with_position(Vector3::new(0.0, 1.0, 0.0))
                    .with_geometry(TriangleMesh::cuboid(&Aabb::new(
                        p(-1.0, -0.1, -1.0),
                        p(1.0, 0.1, 1.0),
                    ))),
            )
            .with_child(
                Prototype::new("back")
                    .with_position(Vector3::new(0.0, 2.0, -1.0))
                    .with_geometry(TriangleMesh::cuboid(&Aabb::new(
                        p(-1.0, -1.0, -0.1),
                        p(1.0, 1.0, 0.1),
                    ))),
            )
    }

    /// Three chairs: the first is edited, the others are placed elsewhere.
    fn three_chairs() -> (SceneGraph, [NodeId; 3]) {
        let mut scene = SceneGraph::new();
        let definition = scene.add_definition(DefinitionData::new("chair").with_prototype(chair()));
        let placements = [
            (Vector3::new(0.0, 0.0, 0.0), Rotation::from_axis_angle(&Vector3::y_axis(), 0.3)),
            (Vector3::new(10.0, 0.0, 0.0), Rotation::identity()),
            (Vector3::new(0.0, 0.0, 10.0), Rotation::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2)),
        ];
        let nodes = placements.map(|(position, rotation)| {
            InstantiateDefinition::new(definition)
                .with_placement(position, rotation)
                .execute(&mut scene)
                .unwrap()
        });
        (scene, nodes)
    }

    fn bottom_corner() -> PivotTarget {
        PivotTarget::Aligned(AlignmentIndex::new(GridLevel::Bot, 0).unwrap())
    }

    #[test]
    fn every_instance_stays_visually_fixed() {
        let (mut scene, chairs) = three_chairs();
        let before: Vec<_> = chairs.iter().map(|&c| world_vertices(&scene, c)).collect();
        let roots_before: Vec<_> = chairs.iter().map(|&c| scene.world_position(c).unwrap()).collect();
        let mut history = History::new();

        let change = ChangePivot::new(chairs[0], bottom_corner())
            .execute(&mut scene, &mut history)
            .unwrap();

        assert!(change.rebase.is_clean());
        assert_eq!(change.commit.as_ref().unwrap().synced, vec![chairs[1], chairs[2]]);
        assert_eq!(change.propagated, vec![chairs[1], chairs[2]]);
        assert_relative_eq!(scene.world_position(chairs[0]).unwrap(), change.pivot, epsilon = POSE_TOLERANCE);
        for (i, &chair) in chairs.iter().enumerate() {
            assert_same_points(&before[i], &world_vertices(&scene, chair));
        }
        for (i, &chair) in chairs.iter().enumerate().skip(1) {
            let rotation = scene.world_rotation(chair).unwrap();
            assert_relative_eq!(
                scene.world_position(chair).unwrap(),
                roots_before[i] + rotation * change.shift,
                epsilon = POSE_TOLERANCE
            );
        }
        assert!(history.can_undo());
    }

    #[test]
    fn undo_restores_all_instances_and_redo_reapplies() {
        let (mut scene, chairs) = three_chairs();
        let locals_before = local_positions(&scene, &chairs);
        let mut history = History::new();
        ChangePivot::new(chairs[0], bottom_corner())
            .execute(&mut scene, &mut history)
            .unwrap();
        let locals_after = local_positions(&scene, &chairs);

        assert!(history.undo(&mut scene).unwrap());
        assert_eq!(local_positions(&scene, &chairs), locals_before);
        let definition = scene.definition_of(chairs[0]).unwrap();
        assert_eq!(scene.definition(definition).unwrap().revision(), 0);

        assert!(history.redo(&mut scene).unwrap());
        assert_eq!(local_positions(&scene, &chairs), locals_after);
        assert_eq!(scene.definition(definition).unwrap().revision(), 1);
    }

    #[test]
    fn aligned_target_without_geometry_changes_nothing() {
        let mut scene = SceneGraph::new();
        let node = scene
            .add_node(NodeData::new("empty").with_position(Vector3::x()), None)
            .unwrap();
        let mut history = History::new();

        let result = ChangePivot::new(node, bottom_corner()).execute(&mut scene, &mut history);

        assert!(matches!(
            result,
            Err(RepivotError::Bounds(BoundsError::NoGeometry))
        ));
        assert_eq!(scene.node(node).unwrap().local_position, Vector3::x());
        assert!(!history.can_undo());
    }

    #[test]
    fn custom_target_needs_no_geometry() {
        let mut scene = SceneGraph::new();
        let node = scene.add_node(NodeData::new("empty"), None).unwrap();
        let mut history = History::new();

        let change = ChangePivot::new(node, PivotTarget::Custom(Vector3::new(0.0, 2.0, 0.0)))
            .execute(&mut scene, &mut history)
            .unwrap();

        assert!(change.commit.is_none());
        assert!(change.propagated.is_empty());
        assert_relative_eq!(scene.world_position(node).unwrap(), p(0.0, 2.0, 0.0));
    }

    #[test]
    fn failure_after_relocation_rolls_everything_back() {
        let (mut scene, chairs) = three_chairs();
        let definition = scene.definition_of(chairs[0]).unwrap();
        let squashed = scene
            .add_node(
                NodeData::new("squashed").with_scale(Vector3::new(1.0, 0.0, 1.0)),
                None,
            )
            .unwrap();
        let trapped = InstantiateDefinition::new(definition)
            .with_parent(squashed)
            .execute(&mut scene)
            .unwrap();
        let before = world_vertices(&scene, chairs[0]);
        let local_before = scene.node(chairs[0]).unwrap().local_position;
        let mut history = History::new();

        let result = ChangePivot::new(chairs[0], bottom_corner()).execute(&mut scene, &mut history);

        assert!(result.is_err());
        assert!(!history.can_undo());
        assert_eq!(scene.node(chairs[0]).unwrap().local_position, local_before);
        assert_same_points(&before, &world_vertices(&scene, chairs[0]));
        assert_eq!(scene.definition(definition).unwrap().revision(), 0);
        assert!(scene.contains(trapped));
    }
}
