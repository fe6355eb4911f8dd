mod commit;
mod instantiate;

pub use commit::{CommitDefinition, CommitReport};
pub use instantiate::InstantiateDefinition;
