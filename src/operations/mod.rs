pub mod definition;
pub mod pivot;
pub mod query;
