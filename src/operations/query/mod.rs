mod alignment_grid;
mod bounding_box;

pub use alignment_grid::{AlignmentGrid, AlignmentIndex, CellKind, GridLevel};
pub use bounding_box::{collect_render_extents, ComputeBounds, RenderExtent};
