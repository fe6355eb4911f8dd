pub mod error;
pub mod geometry;
pub mod history;
pub mod math;
pub mod operations;
pub mod scene;
pub mod session;

pub use error::{RepivotError, Result};
