//! Screen-space geometry structures and the frustum clipper.

pub mod clip;
pub mod projection;

pub use self::projection::Projection;
