use super::{Matrix3, Matrix4, Point3, Rotation, Vector3};

/// A composed affine transform between two coordinate frames.
///
/// The full 4x4 matrix carries translation, rotation and (possibly
/// non-uniform) scale. The composed rotation is tracked alongside because it
/// cannot be recovered from a matrix that mixes rotation with non-uniform
/// scale; it is the product of the local rotations along the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    matrix: Matrix4,
    rotation: Rotation,
}

impl Default for Frame {
    fn default() -> Self {
        Self::identity()
    }
}

impl Frame {
    /// The identity frame.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
            rotation: Rotation::identity(),
        }
    }

    /// Builds a frame from translation, rotation and scale, applied in
    /// scale → rotate → translate order.
    #[must_use]
    pub fn from_trs(translation: &Vector3, rotation: &Rotation, scale: &Vector3) -> Self {
        let matrix = Matrix4::new_translation(translation)
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(scale);
        Self {
            matrix,
            rotation: *rotation,
        }
    }

    /// Returns `self ∘ local`: the frame `local` expressed relative to `self`.
    #[must_use]
    pub fn compose(&self, local: &Frame) -> Frame {
        Frame {
            matrix: self.matrix * local.matrix,
            rotation: self.rotation * local.rotation,
        }
    }

    /// Returns the inverse frame, or `None` if the matrix is singular
    /// (a zero scale component somewhere along the chain).
    #[must_use]
    pub fn inverse(&self) -> Option<Frame> {
        let matrix = self.matrix.try_inverse()?;
        Some(Frame {
            matrix,
            rotation: self.rotation.inverse(),
        })
    }

    /// The underlying 4x4 matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix4 {
        &self.matrix
    }

    /// Origin of the frame.
    #[must_use]
    pub fn position(&self) -> Point3 {
        Point3::new(self.matrix[(0, 3)], self.matrix[(1, 3)], self.matrix[(2, 3)])
    }

    /// Composed rotation of the frame.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Maps a point from this frame into the parent space.
    #[must_use]
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        let v = self.matrix * nalgebra::Vector4::new(point.x, point.y, point.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// The 3x3 linear part (rotation and scale, no translation).
    #[must_use]
    pub fn linear(&self) -> Matrix3 {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// The matrix that carries surface normals from this frame into the
    /// parent space: the inverse transpose of [`linear`](Self::linear).
    ///
    /// Returns `None` if the frame is singular.
    #[must_use]
    pub fn normal_matrix(&self) -> Option<Matrix3> {
        Some(self.linear().try_inverse()?.transpose())
    }
}
