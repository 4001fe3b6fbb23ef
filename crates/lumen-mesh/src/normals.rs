use lumen_core::Result;
use lumen_math::Vec3;

use crate::buffers::{check_indices, flatten, read_vec3, vertex_count};

/// Per-vertex normals averaged from the faces around each vertex.
///
/// For every triangle `(i0, i1, i2)` the face normal is
/// `(p2 - p1) x (p0 - p1)`, left unnormalized so larger triangles weigh
/// more, and added to all three vertices. Accumulated sums are then
/// normalized. A vertex whose sum is exactly zero (unreferenced, or only
/// touched by degenerate triangles) keeps the zero vector.
///
/// The result has the same length as `vertices`.
pub fn compute_vertex_normals(vertices: &[f32], indices: &[u32]) -> Result<Vec<f32>> {
    let n = vertex_count(vertices)?;
    check_indices(indices, n)?;

    let mut sums = vec![Vec3::ZERO; n];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let p0 = read_vec3(vertices, i0);
        let p1 = read_vec3(vertices, i1);
        let p2 = read_vec3(vertices, i2);

        let normal = (p2 - p1).cross(p0 - p1);

        sums[i0] += normal;
        sums[i1] += normal;
        sums[i2] += normal;
    }

    for sum in &mut sums {
        let mut len = sum.length();
        if len == 0.0 {
            len = 1.0;
        }
        *sum /= len;
    }

    Ok(flatten(&sums))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ccw_triangle_faces_positive_z() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = compute_vertex_normals(&vertices, &[0, 1, 2]).unwrap();
        for n in normals.chunks_exact(3) {
            assert_abs_diff_eq!(n[0], 0.0);
            assert_abs_diff_eq!(n[1], 0.0);
            assert_abs_diff_eq!(n[2], 1.0);
        }
    }

    #[test]
    fn test_reversed_winding_flips_normal() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let normals = compute_vertex_normals(&vertices, &[0, 2, 1]).unwrap();
        assert_abs_diff_eq!(normals[2], -1.0);
    }

    #[test]
    fn test_larger_face_dominates_shared_vertex() {
        // Vertex 0 is shared by a large triangle in the XY plane and a small
        // one in the XZ plane.
        let vertices = [
            0.0, 0.0, 0.0, //
            4.0, 0.0, 0.0, //
            0.0, 4.0, 0.0, //
            0.0, 0.0, -1.0, //
            1.0, 0.0, 0.0, //
        ];
        let normals = compute_vertex_normals(&vertices, &[0, 1, 2, 0, 3, 4]).unwrap();
        let n0 = Vec3::from_slice(&normals[0..3]);
        // Face normals are 16 * Z and -1 * Y before normalization.
        let expected = Vec3::new(0.0, -1.0, 16.0).normalize();
        assert!((n0 - expected).length() < 1e-6, "got {:?}", n0);
    }

    #[test]
    fn test_unreferenced_vertex_is_zero() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 5.0, 5.0];
        let normals = compute_vertex_normals(&vertices, &[0, 1, 2]).unwrap();
        assert_eq!(&normals[9..12], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_index_is_error() {
        let vertices = [0.0; 9];
        assert!(compute_vertex_normals(&vertices, &[0, 1, 3]).is_err());
    }
}
