mod change;
mod propagate;
mod rebase;
mod relocate;
mod resolve;

pub use change::{ChangePivot, PivotChange};
pub use propagate::PropagateShift;
pub use rebase::{RebaseGeometry, RebaseOptions, RebaseReport};
pub use relocate::RelocatePivot;
pub use resolve::{PivotTarget, ResolvePivot};
