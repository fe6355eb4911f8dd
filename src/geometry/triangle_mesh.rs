use crate::error::GeometryError;
use crate::math::{Aabb, Point3, Vector3};

use super::{check_count, PointBuffer};

/// A triangle mesh with optional per-vertex normals.
///
/// Fields are private so that every position write goes through
/// [`PointBuffer::set_positions`], which keeps the cached bounds current.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    normals: Vec<Vector3>,
    indices: Vec<[u32; 3]>,
    bounds: Option<Aabb>,
}

impl TriangleMesh {
    /// Creates a mesh from positions and triangles, with bounds computed.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexOutOfRange`] if a triangle references a
    /// vertex that does not exist.
    pub fn new(vertices: Vec<Point3>, indices: Vec<[u32; 3]>) -> Result<Self, GeometryError> {
        let len = vertices.len();
        if let Some(&index) = indices
            .iter()
            .flatten()
            .find(|&&i| i as usize >= len)
        {
            return Err(GeometryError::IndexOutOfRange { index, len });
        }
        Ok(Self::from_parts(vertices, Vec::new(), indices))
    }

    /// Assembles a mesh from already validated parts.
    pub(super) fn from_parts(
        vertices: Vec<Point3>,
        normals: Vec<Vector3>,
        indices: Vec<[u32; 3]>,
    ) -> Self {
        let bounds = Aabb::from_points(&vertices);
        Self {
            vertices,
            normals,
            indices,
            bounds,
        }
    }

    /// Axis-aligned box mesh between two corners (8 shared vertices, 12 triangles).
    #[must_use]
    pub fn cuboid(aabb: &Aabb) -> Self {
        // Corner index bits: x = 1, y = 2, z = 4.
        #[rustfmt::skip]
        let indices = vec![
            [0, 2, 3], [0, 3, 1], // -z
            [4, 5, 7], [4, 7, 6], // +z
            [0, 4, 6], [0, 6, 2], // -x
            [1, 3, 7], [1, 7, 5], // +x
            [0, 1, 5], [0, 5, 4], // -y
            [2, 6, 7], [2, 7, 3], // +y
        ];
        Self::from_parts(aabb.corners().to_vec(), Vec::new(), indices)
    }

    /// Per-vertex normals, empty if the mesh carries none.
    #[must_use]
    pub fn normals(&self) -> &[Vector3] {
        &self.normals
    }

    pub(super) fn normals_mut(&mut self) -> &mut [Vector3] {
        &mut self.normals
    }

    /// Triangle indices (each triple defines a triangle).
    #[must_use]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }
}

impl PointBuffer for TriangleMesh {
    fn positions(&self) -> &[Point3] {
        &self.vertices
    }

    fn set_positions(&mut self, positions: Vec<Point3>) -> Result<(), GeometryError> {
        check_count(self.vertices.len(), positions.len())?;
        self.vertices = positions;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.bounds = Aabb::from_points(&self.vertices);
    }

    fn local_bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}
