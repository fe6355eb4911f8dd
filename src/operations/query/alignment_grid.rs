use crate::error::OperationError;
use crate::math::{Aabb, Frame, Point3};

/// Horizontal slice of the alignment grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridLevel {
    /// The `y = max` plane.
    Top,
    /// Halfway between `Top` and `Bot`.
    Mid,
    /// The `y = min` plane.
    Bot,
}

impl GridLevel {
    /// All levels in grid order.
    pub const ALL: [GridLevel; 3] = [GridLevel::Top, GridLevel::Mid, GridLevel::Bot];

    /// Position of the level in grid order.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Mid => 1,
            Self::Bot => 2,
        }
    }

    /// Level at a grid-order position.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// What a cell of a level's 3x3 raster sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// A corner of the level plane.
    Corner,
    /// The midpoint of one edge of the level plane.
    Edge,
    /// The center of the level plane.
    Center,
}

/// Address of one of the 27 alignment points.
///
/// `corner` is a raster index within the level: column `corner % 3` runs
/// along X and row `corner / 3` runs along Z, both from min to max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlignmentIndex {
    level: GridLevel,
    corner: u8,
}

impl AlignmentIndex {
    /// Number of cells on each level.
    pub const CELLS_PER_LEVEL: usize = 9;

    /// Creates an index.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if `corner` is not in `0..9`.
    pub fn new(level: GridLevel, corner: usize) -> Result<Self, OperationError> {
        let corner = u8::try_from(corner)
            .ok()
            .filter(|&c| usize::from(c) < Self::CELLS_PER_LEVEL)
            .ok_or_else(|| {
                OperationError::InvalidInput(format!("alignment corner {corner} is not in 0..9"))
            })?;
        Ok(Self { level, corner })
    }

    /// The center cell of a level.
    #[must_use]
    pub fn center(level: GridLevel) -> Self {
        Self { level, corner: 4 }
    }

    /// Index from its position in the flattened 27-point array.
    #[must_use]
    pub fn from_flat(flat: usize) -> Option<Self> {
        let level = GridLevel::from_index(flat / Self::CELLS_PER_LEVEL)?;
        Self::new(level, flat % Self::CELLS_PER_LEVEL).ok()
    }

    /// The level.
    #[must_use]
    pub fn level(self) -> GridLevel {
        self.level
    }

    /// The raster cell within the level.
    #[must_use]
    pub fn corner(self) -> usize {
        usize::from(self.corner)
    }

    /// Position in the flattened 27-point array: `level * 9 + corner`.
    #[must_use]
    pub fn flat(self) -> usize {
        self.level.index() * Self::CELLS_PER_LEVEL + self.corner()
    }

    /// Whether the cell is a box corner, an edge midpoint or a face center.
    #[must_use]
    pub fn kind(self) -> CellKind {
        let col = self.corner() % 3;
        let row = self.corner() / 3;
        match (col == 1, row == 1) {
            (false, false) => CellKind::Corner,
            (true, true) => CellKind::Center,
            _ => CellKind::Edge,
        }
    }
}

/// The 27 candidate pivot points of a bounding box, in the box's frame.
///
/// A pure function of the box: rebuild it whenever the box changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentGrid {
    corners: [Point3; 8],
    points: [Point3; 27],
}

impl AlignmentGrid {
    /// Derives the grid from a box.
    ///
    /// Each cell is the average of the level-plane box corners it spans:
    /// one for corners, two for edge midpoints, four for the center. The
    /// `Mid` level averages `Top` and `Bot` cell by cell.
    #[must_use]
    pub fn from_bounds(aabb: &Aabb) -> Self {
        let corners = aabb.corners();
        let top = level_plane(&corners, 1);
        let bot = level_plane(&corners, 0);
        let mid: [Point3; 9] = std::array::from_fn(|c| nalgebra::center(&top[c], &bot[c]));

        let mut points = [Point3::origin(); 27];
        for (level, cells) in [top, mid, bot].iter().enumerate() {
            points[level * 9..(level + 1) * 9].copy_from_slice(cells);
        }
        Self { corners, points }
    }

    /// The 8 box corners, binary-coded as in [`Aabb::corners`].
    #[must_use]
    pub fn corners(&self) -> &[Point3; 8] {
        &self.corners
    }

    /// All 27 points, flattened as `level * 9 + corner`.
    #[must_use]
    pub fn points(&self) -> &[Point3; 27] {
        &self.points
    }

    /// The point at `index`.
    #[must_use]
    pub fn point(&self, index: AlignmentIndex) -> Point3 {
        self.points[index.flat()]
    }

    /// The 9 points of one level.
    #[must_use]
    pub fn level(&self, level: GridLevel) -> &[Point3] {
        let start = level.index() * AlignmentIndex::CELLS_PER_LEVEL;
        &self.points[start..start + AlignmentIndex::CELLS_PER_LEVEL]
    }

    /// All 27 points mapped through `frame` (typically a node's world frame).
    #[must_use]
    pub fn to_world(&self, frame: &Frame) -> Vec<Point3> {
        self.points.iter().map(|p| frame.transform_point(p)).collect()
    }
}

/// The 3x3 raster on the plane where the y bit of the corner index is `y_bit`.
fn level_plane(corners: &[Point3; 8], y_bit: usize) -> [Point3; 9] {
    let span = |i: usize| -> &'static [usize] {
        match i {
            0 => &[0],
            1 => &[0, 1],
            _ => &[1],
        }
    };
    std::array::from_fn(|cell| {
        let xs = span(cell % 3);
        let zs = span(cell / 3);
        let mut sum = Point3::origin().coords;
        for &x in xs {
            for &z in zs {
                sum += corners[x | (y_bit << 1) | (z << 2)].coords;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let count = (xs.len() * zs.len()) as f64;
        Point3::from(sum / count)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn sample_box() -> Aabb {
        Aabb::new(p(-1.0, 0.0, 2.0), p(3.0, 4.0, 6.0))
    }

    #[test]
    fn grid_is_deterministic() {
        let a = AlignmentGrid::from_bounds(&sample_box());
        let b = AlignmentGrid::from_bounds(&sample_box());
        assert_eq!(a, b);
    }

    #[test]
    fn mid_center_is_average_of_all_corners() {
        let aabb = sample_box();
        let grid = AlignmentGrid::from_bounds(&aabb);
        let sum = aabb
            .corners()
            .iter()
            .fold(Point3::origin().coords, |acc, c| acc + c.coords);
        let average = Point3::from(sum / 8.0);
        assert_relative_eq!(grid.point(AlignmentIndex::center(GridLevel::Mid)), average);
    }

    #[test]
    fn top_zero_is_min_x_max_y_min_z() {
        let grid = AlignmentGrid::from_bounds(&sample_box());
        let index = AlignmentIndex::new(GridLevel::Top, 0).unwrap();
        assert_eq!(grid.point(index), p(-1.0, 4.0, 2.0));
    }

    #[test]
    fn raster_runs_x_then_z() {
        let grid = AlignmentGrid::from_bounds(&sample_box());
        let bot = grid.level(GridLevel::Bot);
        assert_eq!(bot[0], p(-1.0, 0.0, 2.0));
        assert_eq!(bot[1], p(1.0, 0.0, 2.0));
        assert_eq!(bot[2], p(3.0, 0.0, 2.0));
        assert_eq!(bot[3], p(-1.0, 0.0, 4.0));
        assert_eq!(bot[4], p(1.0, 0.0, 4.0));
        assert_eq!(bot[8], p(3.0, 0.0, 6.0));
        for point in grid.level(GridLevel::Mid) {
            assert_relative_eq!(point.y, 2.0);
        }
    }

    #[test]
    fn cell_kinds_follow_raster_pattern() {
        use CellKind::{Center, Corner, Edge};
        let kinds: Vec<_> = (0..9)
            .map(|c| AlignmentIndex::new(GridLevel::Top, c).unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![Corner, Edge, Corner, Edge, Center, Edge, Corner, Edge, Corner]
        );
    }

    #[test]
    fn flat_index_round_trips() {
        for flat in 0..27 {
            assert_eq!(AlignmentIndex::from_flat(flat).unwrap().flat(), flat);
        }
        assert!(AlignmentIndex::from_flat(27).is_none());
        assert!(AlignmentIndex::new(GridLevel::Mid, 9).is_err());
    }

    #[test]
    fn degenerate_box_yields_coincident_levels() {
        let flat = Aabb::new(p(0.0, 1.0, 0.0), p(2.0, 1.0, 2.0));
        let grid = AlignmentGrid::from_bounds(&flat);
        for c in 0..9 {
            let top = grid.point(AlignmentIndex::new(GridLevel::Top, c).unwrap());
            let bot = grid.point(AlignmentIndex::new(GridLevel::Bot, c).unwrap());
            assert_eq!(top, bot);
        }
    }
}
