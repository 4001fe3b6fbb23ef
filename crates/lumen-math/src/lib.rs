pub mod color;
pub mod transform;

pub use glam::{DMat4, DVec3, Vec3};
pub use color::{denormalize_color, normalize_color};
pub use transform::{perspective, to_uniform, Pose};

pub type Point3 = DVec3;
