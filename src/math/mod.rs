pub mod aabb;
pub mod frame;

pub use aabb::Aabb;
pub use frame::Frame;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix, the linear part of a transform.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// 4x4 transformation matrix.
pub type Matrix4 = nalgebra::Matrix4<f64>;

/// Orientation type.
pub type Rotation = nalgebra::UnitQuaternion<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Tolerance for "pose unchanged" checks after composed transforms.
///
/// Looser than [`TOLERANCE`]: a pose goes through several matrix products
/// and an inversion before it is compared.
pub const POSE_TOLERANCE: f64 = 1e-6;
