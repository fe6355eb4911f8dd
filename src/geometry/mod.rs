mod poly_mesh;
mod triangle_mesh;

pub use poly_mesh::PolyMesh;
pub use triangle_mesh::TriangleMesh;

use crate::error::GeometryError;
use crate::math::{Aabb, Point3, Vector3};

/// Access to the ordered, local-space vertex positions of a geometry.
///
/// This is the only capability pivot operations need from a vertex buffer.
/// Implementations must never change vertex count or order through
/// [`set_positions`](PointBuffer::set_positions).
pub trait PointBuffer {
    /// Vertex positions in the owning node's local frame.
    fn positions(&self) -> &[Point3];

    /// Replaces all vertex positions and refreshes cached bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::VertexCountMismatch`] if `positions` does not
    /// have exactly [`vertex_count`](PointBuffer::vertex_count) entries.
    fn set_positions(&mut self, positions: Vec<Point3>) -> Result<(), GeometryError>;

    /// Recomputes cached data derived from positions (bounds).
    ///
    /// [`set_positions`](PointBuffer::set_positions) already does this;
    /// positions cannot be written any other way.
    fn refresh(&mut self);

    /// Cached local bounds, `None` when the buffer has no vertices.
    fn local_bounds(&self) -> Option<Aabb>;

    /// Number of vertices.
    fn vertex_count(&self) -> usize {
        self.positions().len()
    }
}

/// A geometry owned by a scene node.
#[derive(Debug, Clone)]
pub enum Geometry {
    /// Indexed triangle mesh, as produced for rendering.
    Mesh(TriangleMesh),
    /// Editable polygon mesh with n-gon faces.
    Poly(PolyMesh),
}

impl Geometry {
    /// Borrows the vertex buffer behind this geometry.
    #[must_use]
    pub fn points(&self) -> &dyn PointBuffer {
        match self {
            Self::Mesh(mesh) => mesh,
            Self::Poly(poly) => poly,
        }
    }

    /// Mutably borrows the vertex buffer behind this geometry.
    pub fn points_mut(&mut self) -> &mut dyn PointBuffer {
        match self {
            Self::Mesh(mesh) => mesh,
            Self::Poly(poly) => poly,
        }
    }

    /// Applies `f` to every vertex and refreshes cached bounds.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`PointBuffer::set_positions`].
    pub fn map_positions<F>(&mut self, f: F) -> Result<(), GeometryError>
    where
        F: FnMut(&Point3) -> Point3,
    {
        let mapped = self.points().positions().iter().map(f).collect();
        self.points_mut().set_positions(mapped)
    }

    /// Applies `f` to every stored vertex normal. Geometries without
    /// normals are left as they are.
    pub fn map_normals<F>(&mut self, mut f: F)
    where
        F: FnMut(&Vector3) -> Vector3,
    {
        if let Self::Mesh(mesh) = self {
            for normal in mesh.normals_mut() {
                *normal = f(&*normal);
            }
        }
    }
}

impl From<TriangleMesh> for Geometry {
    fn from(mesh: TriangleMesh) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<PolyMesh> for Geometry {
    fn from(poly: PolyMesh) -> Self {
        Self::Poly(poly)
    }
}

/// Checks a replacement buffer against the current vertex count.
pub(crate) fn check_count(expected: usize, actual: usize) -> Result<(), GeometryError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GeometryError::VertexCountMismatch { expected, actual })
    }
}
