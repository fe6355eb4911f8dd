use thiserror::Error;

/// Top-level error type for the repivot crate.
#[derive(Debug, Error)]
pub enum RepivotError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors raised by vertex buffers.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("vertex count mismatch: expected {expected}, got {actual}")]
    VertexCountMismatch { expected: usize, actual: usize },

    #[error("vertex index {index} is out of range for {len} vertices")]
    IndexOutOfRange { index: u32, len: usize },
}

/// Errors related to the scene graph and its definitions.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("transform of {0} is not invertible")]
    SingularTransform(String),

    #[error("instance structure does not match its definition: {0}")]
    StructureMismatch(String),
}

/// Errors raised while measuring a node.
#[derive(Debug, Error)]
pub enum BoundsError {
    #[error("node has no renderable geometry")]
    NoGeometry,
}

/// Errors related to pivot operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`RepivotError`].
pub type Result<T> = std::result::Result<T, RepivotError>;
