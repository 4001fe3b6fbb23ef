//! Geometry processing for indexed triangle meshes.
//!
//! Buffers are flat `f32` slices grouped per vertex (triples for positions,
//! normals and tangents, pairs for texture coordinates) and `u32` index
//! triples, the same layout that is later uploaded to the GPU.

pub mod buffers;
pub mod descriptor;
pub mod normals;
pub mod primitives;
pub mod tangents;

pub use descriptor::GeometryDescriptor;
pub use normals::compute_vertex_normals;
pub use tangents::compute_tangents;
