use tracing::debug;

use crate::error::{BoundsError, Result, SceneError};
use crate::math::{Aabb, Point3};
use crate::scene::{NodeId, SceneGraph};

/// The local box of one geometry, tagged with the node that owns it.
///
/// Derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderExtent {
    /// Owning node.
    pub node: NodeId,
    /// Box in the owning node's local frame.
    pub local: Aabb,
}

impl RenderExtent {
    /// The 8 local corners `center ± extents`.
    #[must_use]
    pub fn local_corners(&self) -> [Point3; 8] {
        let center = self.local.center();
        let e = self.local.extents();
        std::array::from_fn(|i| {
            Point3::new(
                center.x + if i & 1 == 0 { -e.x } else { e.x },
                center.y + if i & 2 == 0 { -e.y } else { e.y },
                center.z + if i & 4 == 0 { -e.z } else { e.z },
            )
        })
    }
}

/// Collects the render extents of `root` and all of its descendants, in
/// pre-order. Geometries without vertices contribute nothing.
///
/// # Errors
///
/// Returns an error if a node in the subtree is missing.
pub fn collect_render_extents(
    scene: &SceneGraph,
    root: NodeId,
) -> std::result::Result<Vec<RenderExtent>, SceneError> {
    let mut extents = Vec::new();
    for node in scene.descendants(root)? {
        for geometry in &scene.node(node)?.geometries {
            if let Some(local) = geometry.points().local_bounds() {
                extents.push(RenderExtent { node, local });
            }
        }
    }
    Ok(extents)
}

/// Computes the bounding box of a node and its descendants, expressed in
/// the node's own local frame.
pub struct ComputeBounds {
    root: NodeId,
}

impl ComputeBounds {
    /// Creates a new `ComputeBounds` query.
    #[must_use]
    pub fn new(root: NodeId) -> Self {
        Self { root }
    }

    /// Executes the query, returning the box in the root's local frame.
    ///
    /// Every extent corner is taken to world space through its owner's
    /// world frame, then back into the root's frame.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError::NoGeometry`] if nothing in the subtree has a
    /// render extent, or a scene error if the root frame is singular.
    pub fn execute(&self, scene: &SceneGraph) -> Result<Aabb> {
        let extents = collect_render_extents(scene, self.root)?;
        let first = extents.first().ok_or(BoundsError::NoGeometry)?;
        let to_root = scene.inverse_world_frame(self.root)?;

        let seed = scene
            .world_frame(first.node)?
            .transform_point(&first.local.center());
        let mut aabb = Aabb::from_point(to_root.transform_point(&seed));

        for extent in &extents {
            let to_world = scene.world_frame(extent.node)?;
            for corner in extent.local_corners() {
                let world = to_world.transform_point(&corner);
                aabb.include(&to_root.transform_point(&world));
            }
        }

        debug!(
            root = %scene.describe(self.root),
            extents = extents.len(),
            min = ?aabb.min,
            max = ?aabb.max,
            "computed local bounds"
        );
        Ok(aabb)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::FRAC_PI_4;

    use approx::assert_relative_eq;

    use super::*;
    use crate::error::RepivotError;
    use crate::geometry::{Geometry, TriangleMesh};
    use crate::math::{Rotation, Vector3};
    use crate::scene::NodeData;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube(half: f64) -> TriangleMesh {
        TriangleMesh::cuboid(&Aabb::new(p(-half, -half, -half), p(half, half, half)))
    }

    #[test]
    fn bounds_contain_every_transformed_corner() {
        let mut scene = SceneGraph::new();
        let root = scene
            .add_node(
                NodeData::new("root")
                    .with_position(Vector3::new(3.0, 1.0, -2.0))
                    .with_rotation(Rotation::from_euler_angles(0.2, 0.5, -0.3)),
                None,
            )
            .unwrap();
        let a = scene
            .add_node(
                NodeData::new("a")
                    .with_position(Vector3::new(2.0, 0.0, 0.0))
                    .with_rotation(Rotation::from_axis_angle(&Vector3::y_axis(), FRAC_PI_4))
                    .with_geometry(cube(0.5)),
                Some(root),
            )
            .unwrap();
        scene
            .add_node(
                NodeData::new("b")
                    .with_position(Vector3::new(-1.0, 4.0, 1.0))
                    .with_scale(Vector3::new(2.0, 1.0, 3.0))
                    .with_geometry(cube(1.0)),
                Some(a),
            )
            .unwrap();

        let aabb = ComputeBounds::new(root).execute(&scene).unwrap();
        let to_root = scene.inverse_world_frame(root).unwrap();
        for extent in collect_render_extents(&scene, root).unwrap() {
            let to_world = scene.world_frame(extent.node).unwrap();
            for corner in extent.local_corners() {
                let local = to_root.transform_point(&to_world.transform_point(&corner));
                assert!(aabb.contains(&local, 1e-9), "{local:?} outside {aabb:?}");
            }
        }
    }

    #[test]
    fn bounds_are_tight_for_a_single_child() {
        let mut scene = SceneGraph::new();
        let root = scene
            .add_node(
                NodeData::new("root")
                    .with_rotation(Rotation::from_axis_angle(&Vector3::z_axis(), 0.7)),
                None,
            )
            .unwrap();
        scene
            .add_node(
                NodeData::new("child")
                    .with_position(Vector3::new(2.0, 0.0, 0.0))
                    .with_geometry(cube(1.0)),
                Some(root),
            )
            .unwrap();

        let aabb = ComputeBounds::new(root).execute(&scene).unwrap();
        assert_relative_eq!(aabb.min, p(1.0, -1.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(aabb.max, p(3.0, 1.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn root_geometry_counts() {
        let mut scene = SceneGraph::new();
        let root = scene
            .add_node(NodeData::new("root").with_geometry(cube(2.0)), None)
            .unwrap();
        let aabb = ComputeBounds::new(root).execute(&scene).unwrap();
        assert_relative_eq!(aabb.min, p(-2.0, -2.0, -2.0));
        assert_relative_eq!(aabb.max, p(2.0, 2.0, 2.0));
    }

    #[test]
    fn no_geometry_is_reported() {
        let mut scene = SceneGraph::new();
        let root = scene.add_node(NodeData::new("root"), None).unwrap();
        scene
            .add_node(
                NodeData::new("empty").with_geometry(Geometry::Mesh(TriangleMesh::default())),
                Some(root),
            )
            .unwrap();

        let result = ComputeBounds::new(root).execute(&scene);
        assert!(matches!(
            result,
            Err(RepivotError::Bounds(BoundsError::NoGeometry))
        ));
    }

    #[test]
    fn edited_vertices_are_measured_fresh() {
        let mut scene = SceneGraph::new();
        let root = scene
            .add_node(NodeData::new("root").with_geometry(cube(0.5)), None)
            .unwrap();
        ComputeBounds::new(root).execute(&scene).unwrap();

        for geometry in &mut scene.node_mut(root).unwrap().geometries {
            geometry.map_positions(|v| v + Vector3::x() * 10.0).unwrap();
        }

        let aabb = ComputeBounds::new(root).execute(&scene).unwrap();
        assert_relative_eq!(aabb.min, p(9.5, -0.5, -0.5));
        assert_relative_eq!(aabb.max, p(10.5, 0.5, 0.5));
    }
}
