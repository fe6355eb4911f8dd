use crate::error::GeometryError;
use crate::math::{Aabb, Point3, Vector3, TOLERANCE};

use super::{check_count, PointBuffer, TriangleMesh};

/// An editable polygon mesh: shared positions and n-gon faces.
///
/// Faces index into `positions` and are wound counter-clockwise when seen
/// from outside. The render mesh is derived with [`PolyMesh::to_triangle_mesh`].
#[derive(Debug, Clone, Default)]
pub struct PolyMesh {
    positions: Vec<Point3>,
    faces: Vec<Vec<u32>>,
    bounds: Option<Aabb>,
}

impl PolyMesh {
    /// Creates a polygon mesh.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::IndexOutOfRange`] if a face references a
    /// vertex that does not exist.
    pub fn new(positions: Vec<Point3>, faces: Vec<Vec<u32>>) -> Result<Self, GeometryError> {
        let len = positions.len();
        if let Some(&index) = faces.iter().flatten().find(|&&i| i as usize >= len) {
            return Err(GeometryError::IndexOutOfRange { index, len });
        }
        let mut poly = Self {
            positions,
            faces,
            bounds: None,
        };
        poly.refresh();
        Ok(poly)
    }

    /// The polygon faces.
    #[must_use]
    pub fn faces(&self) -> &[Vec<u32>] {
        &self.faces
    }

    /// Unit normal of a face using Newell's method, `None` for degenerate faces.
    #[must_use]
    pub fn face_normal(&self, face: usize) -> Option<Vector3> {
        let indices = self.faces.get(face)?;
        let n = indices.len();
        if n < 3 {
            return None;
        }
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let curr = &self.positions[indices[i] as usize];
            let next = &self.positions[indices[(i + 1) % n] as usize];
            normal.x += (curr.y - next.y) * (curr.z + next.z);
            normal.y += (curr.z - next.z) * (curr.x + next.x);
            normal.z += (curr.x - next.x) * (curr.y + next.y);
        }
        let len = normal.norm();
        (len >= TOLERANCE).then(|| normal / len)
    }

    /// Fan-triangulates every face into a render mesh.
    ///
    /// Vertices stay shared; each vertex normal is the normalized sum of the
    /// normals of the faces touching it.
    #[must_use]
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let mut indices = Vec::new();
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for (face_idx, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                continue;
            }
            for k in 1..face.len() - 1 {
                indices.push([face[0], face[k], face[k + 1]]);
            }
            if let Some(normal) = self.face_normal(face_idx) {
                for &i in face {
                    normals[i as usize] += normal;
                }
            }
        }
        for normal in &mut normals {
            let len = normal.norm();
            if len >= TOLERANCE {
                *normal /= len;
            }
        }

        TriangleMesh::from_parts(self.positions.clone(), normals, indices)
    }
}

impl PointBuffer for PolyMesh {
    fn positions(&self) -> &[Point3] {
        &self.positions
    }

    fn set_positions(&mut self, positions: Vec<Point3>) -> Result<(), GeometryError> {
        check_count(self.positions.len(), positions.len())?;
        self.positions = positions;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.bounds = Aabb::from_points(&self.positions);
    }

    fn local_bounds(&self) -> Option<Aabb> {
        self.bounds
    }
}
