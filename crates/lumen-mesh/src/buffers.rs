//! Shared helpers for flat vertex buffers.

use lumen_core::{LumenError, Result};
use lumen_math::Vec3;

/// Number of vertices in a flat xyz buffer.
pub fn vertex_count(vertices: &[f32]) -> Result<usize> {
    if vertices.len() % 3 != 0 {
        return Err(LumenError::Geometry(format!(
            "vertex buffer length {} is not a multiple of 3",
            vertices.len()
        )));
    }
    Ok(vertices.len() / 3)
}

/// Check that `indices` forms whole triangles over `vertex_count` vertices.
pub fn check_indices(indices: &[u32], vertex_count: usize) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(LumenError::Geometry(format!(
            "index buffer length {} is not a multiple of 3",
            indices.len()
        )));
    }
    if let Some((pos, &index)) = indices
        .iter()
        .enumerate()
        .find(|&(_, &i)| i as usize >= vertex_count)
    {
        return Err(LumenError::Geometry(format!(
            "index {} at position {} is out of range for {} vertices",
            index, pos, vertex_count
        )));
    }
    Ok(())
}

pub(crate) fn read_vec3(buffer: &[f32], index: usize) -> Vec3 {
    Vec3::from_slice(&buffer[3 * index..3 * index + 3])
}

pub(crate) fn flatten(vectors: &[Vec3]) -> Vec<f32> {
    vectors.iter().flat_map(|v| v.to_array()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_count() {
        assert_eq!(vertex_count(&[0.0; 9]).unwrap(), 3);
        assert!(vertex_count(&[0.0; 8]).is_err());
    }

    #[test]
    fn test_out_of_range_index_reports_position() {
        let err = check_indices(&[0, 1, 2, 0, 2, 3], 3).unwrap_err();
        assert!(err.to_string().contains("index 3 at position 5"));
    }

    #[test]
    fn test_partial_triangle_rejected() {
        assert!(check_indices(&[0, 1], 3).is_err());
        assert!(check_indices(&[], 0).is_ok());
    }
}
