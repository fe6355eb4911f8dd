use super::{Point3, Vector3};

/// An axis-aligned bounding box in some reference frame.
///
/// The frame is implied by the producer: geometry boxes are in the owning
/// node's local frame, [`ComputeBounds`](crate::operations::query::ComputeBounds)
/// yields boxes in the measured root's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a box from two corners, sorting components so `min <= max`.
    #[must_use]
    pub fn new(a: Point3, b: Point3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Creates a zero-size box at a single point.
    #[must_use]
    pub fn from_point(point: Point3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Builds the tightest box around a set of points, or `None` if empty.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = points.into_iter();
        let mut aabb = Self::from_point(*iter.next()?);
        for point in iter {
            aabb.include(point);
        }
        Some(aabb)
    }

    /// Grows the box to contain `point`.
    pub fn include(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Half-size of the box along each axis.
    #[must_use]
    pub fn extents(&self) -> Vector3 {
        (self.max - self.min) * 0.5
    }

    /// The 8 corners in binary-coded order: bit 0 selects x, bit 1 selects y,
    /// bit 2 selects z (`0` = min, `1` = max).
    #[must_use]
    pub fn corners(&self) -> [Point3; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Returns `true` if `point` lies inside the box, expanded by `tolerance`.
    #[must_use]
    pub fn contains(&self, point: &Point3, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            point[axis] >= self.min[axis] - tolerance && point[axis] <= self.max[axis] + tolerance
        })
    }

    /// Axes (0 = x, 1 = y, 2 = z) along which the box has zero size.
    ///
    /// A flat box is still a valid box; callers use this to decide whether
    /// some alignment points coincide.
    #[must_use]
    pub fn degenerate_axes(&self, tolerance: f64) -> Vec<usize> {
        (0..3)
            .filter(|&axis| self.max[axis] - self.min[axis] <= tolerance)
            .collect()
    }
}
