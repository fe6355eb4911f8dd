use tracing::{debug, warn};

use crate::error::{RepivotError, Result, SceneError};
use crate::geometry::Geometry;
use crate::math::{Frame, Point3, Rotation, Vector3, TOLERANCE};
use crate::scene::{NodeId, SceneGraph};

/// Which re-basing passes to run over a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebaseOptions {
    /// Move each child's origin onto the node's origin.
    pub align_position: bool,
    /// Give each child the node's world rotation.
    pub align_rotation: bool,
}

impl Default for RebaseOptions {
    fn default() -> Self {
        Self {
            align_position: true,
            align_rotation: false,
        }
    }
}

impl RebaseOptions {
    /// Enables or disables the position pass.
    #[must_use]
    pub fn with_position(mut self, enabled: bool) -> Self {
        self.align_position = enabled;
        self
    }

    /// Enables or disables the rotation pass.
    #[must_use]
    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.align_rotation = enabled;
        self
    }
}

/// Per-child outcome of [`RebaseGeometry`].
#[derive(Debug, Default)]
pub struct RebaseReport {
    /// Children whose geometry was re-based.
    pub rebased: Vec<NodeId>,
    /// Children without geometry, left untouched.
    pub skipped: Vec<NodeId>,
    /// Children that could not be re-based, with the reason.
    pub failed: Vec<(NodeId, RepivotError)>,
}

impl RebaseReport {
    /// Returns `true` if no child failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-bases the geometry of a node's direct children into normalized child
/// frames while keeping every vertex fixed in world space.
pub struct RebaseGeometry {
    node: NodeId,
    options: RebaseOptions,
}

impl RebaseGeometry {
    /// Creates a new `RebaseGeometry` operation with default options.
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            options: RebaseOptions::default(),
        }
    }

    /// Sets the passes to run.
    #[must_use]
    pub fn with_options(mut self, options: RebaseOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the enabled passes over each direct child.
    ///
    /// Children are independent: a failure on one child is recorded in the
    /// report and the remaining children are still processed. Each pass
    /// computes all new values for a child before writing any of them.
    ///
    /// # Errors
    ///
    /// Returns an error only if the node itself is missing.
    pub fn execute(&self, scene: &mut SceneGraph) -> Result<RebaseReport> {
        let node_frame = scene.world_frame(self.node)?;
        let children = scene.children(self.node)?.to_vec();
        let mut report = RebaseReport::default();

        for child in children {
            if scene.node(child)?.geometries.is_empty() {
                debug!(child = %scene.describe(child), "no geometry, skipping");
                report.skipped.push(child);
                continue;
            }
            match self.rebase_child(scene, &node_frame, child) {
                Ok(()) => report.rebased.push(child),
                Err(err) => {
                    warn!(child = %scene.describe(child), error = %err, "failed to rebase child");
                    report.failed.push((child, err));
                }
            }
        }

        debug!(
            node = %scene.describe(self.node),
            rebased = report.rebased.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "rebased child geometry"
        );
        Ok(report)
    }

    fn rebase_child(&self, scene: &mut SceneGraph, node_frame: &Frame, child: NodeId) -> Result<()> {
        if self.options.align_position {
            align_position(scene, node_frame, child)?;
        }
        if self.options.align_rotation {
            align_rotation(scene, node_frame, child)?;
        }
        Ok(())
    }
}

/// Zeroes the child's local position, compensating its vertices and its
/// own children for the move.
fn align_position(scene: &mut SceneGraph, node_frame: &Frame, child: NodeId) -> Result<()> {
    let data = scene.node(child)?;
    let shift = data.local_position;
    if shift == Vector3::zeros() {
        return Ok(());
    }

    let rezeroed = node_frame.compose(&Frame::from_trs(
        &Vector3::zeros(),
        &data.local_rotation,
        &data.local_scale,
    ));
    let to_child = rezeroed
        .inverse()
        .ok_or_else(|| SceneError::SingularTransform(scene.describe(child)))?;
    // Where the old origin sits in the re-zeroed frame; the new local
    // position is zero, so nothing is subtracted.
    let offset = to_child
        .transform_point(&node_frame.transform_point(&Point3::from(shift)))
        .coords;

    let geometries = remap(&data.geometries, |v| v + offset)?;
    let grandchildren = data.children.clone();

    let data = scene.node_mut(child)?;
    data.local_position = Vector3::zeros();
    data.geometries = geometries;
    for grandchild in grandchildren {
        scene.node_mut(grandchild)?.local_position += offset;
    }
    Ok(())
}

/// Gives the child the node's world rotation while keeping its world
/// position, its vertices, its vertex normals and its own children fixed in
/// world space.
fn align_rotation(scene: &mut SceneGraph, node_frame: &Frame, child: NodeId) -> Result<()> {
    let old_frame = scene.world_frame(child)?;
    let original_position = old_frame.position();
    let to_node = node_frame
        .inverse()
        .ok_or_else(|| SceneError::SingularTransform("parent of rotation-aligned child".into()))?;
    let local_position = to_node.transform_point(&original_position).coords;

    let data = scene.node(child)?;
    let realigned = node_frame.compose(&Frame::from_trs(
        &local_position,
        &Rotation::identity(),
        &data.local_scale,
    ));
    let to_realigned = realigned
        .inverse()
        .ok_or_else(|| SceneError::SingularTransform(scene.describe(child)))?;

    let to_new_local = to_realigned.compose(&old_frame);
    let normal_matrix = to_new_local
        .normal_matrix()
        .ok_or_else(|| SceneError::SingularTransform(scene.describe(child)))?;
    let mut geometries = remap(&data.geometries, |v| to_new_local.transform_point(v))?;
    for geometry in &mut geometries {
        geometry.map_normals(|n| (normal_matrix * n).try_normalize(TOLERANCE).unwrap_or(*n));
    }

    let mut grandchildren = Vec::with_capacity(data.children.len());
    for &grandchild in &data.children {
        let frame = scene.world_frame(grandchild)?;
        grandchildren.push((
            grandchild,
            to_realigned.transform_point(&frame.position()).coords,
            realigned.rotation().inverse() * frame.rotation(),
        ));
    }

    let delta = node_frame.rotation() * old_frame.rotation().inverse();
    debug!(child = %scene.describe(child), angle = delta.angle(), "aligning child rotation");

    let data = scene.node_mut(child)?;
    data.local_position = local_position;
    data.local_rotation = Rotation::identity();
    data.geometries = geometries;
    for (grandchild, position, rotation) in grandchildren {
        let data = scene.node_mut(grandchild)?;
        data.local_position = position;
        data.local_rotation = rotation;
    }
    Ok(())
}

fn remap<F>(geometries: &[Geometry], mut f: F) -> Result<Vec<Geometry>>
where
    F: FnMut(&Point3) -> Point3,
{
    let mut out = geometries.to_vec();
    for geometry in &mut out {
        geometry.map_positions(&mut f)?;
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::{PolyMesh, TriangleMesh};
    use crate::math::{Aabb, POSE_TOLERANCE};
    use crate::scene::NodeData;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube_at(min: Point3, max: Point3) -> TriangleMesh {
        TriangleMesh::cuboid(&Aabb::new(min, max))
    }

    fn world_vertices(scene: &SceneGraph, node: NodeId) -> Vec<Point3> {
        let frame = scene.world_frame(node).unwrap();
        scene
            .node(node)
            .unwrap()
            .geometries
            .iter()
            .flat_map(|g| g.points().positions().to_vec())
            .map(|v| frame.transform_point(&v))
            .collect()
    }

    fn assert_same_points(before: &[Point3], after: &[Point3]) {
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after) {
            assert_relative_eq!(*b, *a, epsilon = POSE_TOLERANCE);
        }
    }

    /// A rotated, non-uniformly scaled node with one offset, rotated child.
    fn fixture() -> (SceneGraph, NodeId, NodeId) {
        let mut scene = SceneGraph::new();
        let node = scene
            .add_node(
                NodeData::new("node")
                    .with_position(Vector3::new(1.0, 2.0, 3.0))
                    .with_rotation(Rotation::from_euler_angles(0.3, -0.4, 0.8))
                    .with_scale(Vector3::new(2.0, 1.0, 0.5)),
                None,
            )
            .unwrap();
        let child = scene
            .add_node(
                NodeData::new("child")
                    .with_position(Vector3::new(3.0, -1.0, 2.0))
                    .with_rotation(Rotation::from_euler_angles(-0.2, 0.9, 0.1))
                    .with_geometry(cube_at(p(0.0, 0.0, 0.0), p(1.0, 2.0, 1.0)))
                    .with_geometry(
                        PolyMesh::new(
                            vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
                            vec![vec![0, 1, 2]],
                        )
                        .unwrap(),
                    ),
                Some(node),
            )
            .unwrap();
        (scene, node, child)
    }

    #[test]
    fn position_pass_zeroes_child_and_keeps_vertices() {
        let (mut scene, node, child) = fixture();
        let before = world_vertices(&scene, child);

        let report = RebaseGeometry::new(node).execute(&mut scene).unwrap();

        assert_eq!(report.rebased, vec![child]);
        assert!(report.is_clean());
        assert_eq!(scene.node(child).unwrap().local_position, Vector3::zeros());
        assert_same_points(&before, &world_vertices(&scene, child));
    }

    #[test]
    fn position_pass_refreshes_bounds() {
        let (mut scene, node, child) = fixture();
        RebaseGeometry::new(node).execute(&mut scene).unwrap();
        let geometry = &scene.node(child).unwrap().geometries[0];
        let expected = Aabb::from_points(geometry.points().positions()).unwrap();
        assert_eq!(geometry.points().local_bounds(), Some(expected));
    }

    #[test]
    fn normalized_child_is_untouched() {
        let (mut scene, node, child) = fixture();
        scene.node_mut(child).unwrap().local_position = Vector3::zeros();
        let before: Vec<Point3> = scene.node(child).unwrap().geometries[0]
            .points()
            .positions()
            .to_vec();

        RebaseGeometry::new(node).execute(&mut scene).unwrap();

        let after = scene.node(child).unwrap().geometries[0].points().positions();
        assert_eq!(before.as_slice(), after);
    }

    #[test]
    fn grandchildren_stay_in_place() {
        let (mut scene, node, child) = fixture();
        let grandchild = scene
            .add_node(
                NodeData::new("grandchild")
                    .with_position(Vector3::new(0.5, 0.5, -1.0))
                    .with_geometry(cube_at(p(0.0, 0.0, 0.0), p(0.2, 0.2, 0.2))),
                Some(child),
            )
            .unwrap();
        let before = world_vertices(&scene, grandchild);

        RebaseGeometry::new(node)
            .with_options(RebaseOptions::default().with_rotation(true))
            .execute(&mut scene)
            .unwrap();

        assert_same_points(&before, &world_vertices(&scene, grandchild));
    }

    #[test]
    fn child_without_geometry_is_skipped() {
        let (mut scene, node, _) = fixture();
        let bare = scene
            .add_node(
                NodeData::new("bare").with_position(Vector3::new(4.0, 4.0, 4.0)),
                Some(node),
            )
            .unwrap();

        let report = RebaseGeometry::new(node).execute(&mut scene).unwrap();

        assert_eq!(report.skipped, vec![bare]);
        assert_eq!(
            scene.node(bare).unwrap().local_position,
            Vector3::new(4.0, 4.0, 4.0)
        );
    }

    #[test]
    fn failing_child_does_not_stop_siblings() {
        let (mut scene, node, child) = fixture();
        let flat = scene
            .add_node(
                NodeData::new("flat")
                    .with_position(Vector3::new(1.0, 0.0, 0.0))
                    .with_scale(Vector3::new(1.0, 0.0, 1.0))
                    .with_geometry(cube_at(p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0))),
                Some(node),
            )
            .unwrap();
        let before = world_vertices(&scene, child);

        let report = RebaseGeometry::new(node).execute(&mut scene).unwrap();

        assert_eq!(report.rebased, vec![child]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, flat);
        assert_eq!(
            scene.node(flat).unwrap().local_position,
            Vector3::new(1.0, 0.0, 0.0)
        );
        assert_same_points(&before, &world_vertices(&scene, child));
    }

    #[test]
    fn rotation_pass_matches_node_rotation() {
        let (mut scene, node, child) = fixture();
        let before = world_vertices(&scene, child);
        let origin = scene.world_position(child).unwrap();

        RebaseGeometry::new(node)
            .with_options(RebaseOptions::default().with_position(false).with_rotation(true))
            .execute(&mut scene)
            .unwrap();

        assert_relative_eq!(
            scene.world_rotation(child).unwrap(),
            scene.world_rotation(node).unwrap(),
            epsilon = POSE_TOLERANCE
        );
        assert_relative_eq!(scene.world_position(child).unwrap(), origin, epsilon = POSE_TOLERANCE);
        assert_same_points(&before, &world_vertices(&scene, child));
    }

    #[test]
    fn both_passes_keep_vertices() {
        let (mut scene, node, child) = fixture();
        let before = world_vertices(&scene, child);
        let count = scene.node(child).unwrap().geometries[1].points().vertex_count();

        RebaseGeometry::new(node)
            .with_options(RebaseOptions::default().with_rotation(true))
            .execute(&mut scene)
            .unwrap();

        let data = scene.node(child).unwrap();
        assert_eq!(data.local_rotation, Rotation::identity());
        assert_relative_eq!(data.local_position, Vector3::zeros(), epsilon = POSE_TOLERANCE);
        assert_eq!(data.geometries[1].points().vertex_count(), count);
        assert_same_points(&before, &world_vertices(&scene, child));
    }

    fn world_normals(scene: &SceneGraph, node: NodeId) -> Vec<Vector3> {
        let to_world = scene.world_frame(node).unwrap().normal_matrix().unwrap();
        scene
            .node(node)
            .unwrap()
            .geometries
            .iter()
            .filter_map(|g| match g {
                Geometry::Mesh(mesh) => Some(mesh.normals().to_vec()),
                Geometry::Poly(_) => None,
            })
            .flatten()
            .map(|n| (to_world * n).normalize())
            .collect()
    }

    #[test]
    fn rotation_pass_keeps_world_normals() {
        let mut scene = SceneGraph::new();
        let node = scene
            .add_node(NodeData::new("node").with_scale(Vector3::new(1.0, 1.0, 3.0)), None)
            .unwrap();
        // Counter-clockwise in the x = 0 plane, seen from +x.
        let panel = PolyMesh::new(
            vec![p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(0.0, 1.0, 1.0), p(0.0, 0.0, 1.0)],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
        .to_triangle_mesh();
        assert_relative_eq!(panel.normals()[0], Vector3::x());
        let child = scene
            .add_node(
                NodeData::new("panel")
                    .with_position(Vector3::new(2.0, 0.0, 0.0))
                    .with_rotation(Rotation::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2))
                    .with_scale(Vector3::new(1.0, 2.0, 1.0))
                    .with_geometry(panel),
                Some(node),
            )
            .unwrap();
        let before = world_normals(&scene, child);
        assert_relative_eq!(before[0], Vector3::y(), epsilon = 1e-12);

        RebaseGeometry::new(node)
            .with_options(RebaseOptions::default().with_position(false).with_rotation(true))
            .execute(&mut scene)
            .unwrap();

        assert_eq!(scene.node(child).unwrap().local_rotation, Rotation::identity());
        let after = world_normals(&scene, child);
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_relative_eq!(*b, *a, epsilon = POSE_TOLERANCE);
        }
    }
}
