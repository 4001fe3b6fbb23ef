use std::borrow::Cow;

use lumen_core::traits::Validate;
use lumen_core::{LumenError, Result};
use serde::{Deserialize, Serialize};

use crate::buffers::{check_indices, vertex_count};
use crate::{compute_tangents, compute_vertex_normals};

/// Raw geometry plus material defaults, as produced by a model loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDescriptor {
    #[serde(default)]
    pub alias: String,
    pub vertices: Vec<f32>,
    #[serde(default)]
    pub indices: Option<Vec<u32>>,
    #[serde(default)]
    pub normals: Option<Vec<f32>>,
    #[serde(default)]
    pub tangents: Option<Vec<f32>>,
    /// RGBA per vertex.
    #[serde(default)]
    pub colors: Option<Vec<f32>>,
    #[serde(default)]
    pub texture_coords: Option<Vec<f32>>,
    #[serde(default = "default_diffuse")]
    pub diffuse: [f32; 4],
    #[serde(default)]
    pub wireframe: bool,
}

fn default_diffuse() -> [f32; 4] {
    [1.0, 1.0, 1.0, 1.0]
}

impl GeometryDescriptor {
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            alias: String::new(),
            vertices,
            indices: Some(indices),
            normals: None,
            tangents: None,
            colors: None,
            texture_coords: None,
            diffuse: default_diffuse(),
            wireframe: false,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = alias.to_string();
        self
    }

    pub fn with_diffuse(mut self, diffuse: [f32; 4]) -> Self {
        self.diffuse = diffuse;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Index data to draw with. Without an explicit index array the
    /// vertices are taken as consecutive triangles.
    pub fn index_data(&self) -> Cow<'_, [u32]> {
        match &self.indices {
            Some(indices) => Cow::Borrowed(indices.as_slice()),
            None => Cow::Owned((0..self.vertex_count() as u32).collect()),
        }
    }

    /// Fill in normals from the geometry when the descriptor has none.
    pub fn with_computed_normals(mut self) -> Result<Self> {
        if self.normals.is_none() {
            let normals = compute_vertex_normals(&self.vertices, &self.index_data())?;
            log::debug!("computed normals for '{}'", self.alias);
            self.normals = Some(normals);
        }
        Ok(self)
    }

    /// Fill in tangents when texture coordinates are available and the
    /// descriptor has no tangents of its own.
    pub fn with_computed_tangents(mut self) -> Result<Self> {
        if self.tangents.is_none() {
            if let Some(uvs) = &self.texture_coords {
                let tangents = compute_tangents(&self.vertices, uvs, &self.index_data())?;
                self.tangents = Some(tangents);
            }
        }
        Ok(self)
    }

    fn check_attribute(&self, name: &str, data: &Option<Vec<f32>>, per_vertex: usize) -> Result<()> {
        if let Some(data) = data {
            let expected = per_vertex * self.vertex_count();
            if data.len() != expected {
                return Err(LumenError::Geometry(format!(
                    "'{}': {} has {} values, expected {}",
                    self.alias,
                    name,
                    data.len(),
                    expected
                )));
            }
        }
        Ok(())
    }
}

impl Validate for GeometryDescriptor {
    fn validate(&self) -> Result<()> {
        let n = vertex_count(&self.vertices)?;
        if n == 0 {
            return Err(LumenError::Geometry(format!("'{}': no vertices", self.alias)));
        }

        match &self.indices {
            Some(indices) => check_indices(indices, n)?,
            None if n % 3 != 0 => {
                return Err(LumenError::Geometry(format!(
                    "'{}': {} unindexed vertices do not form whole triangles",
                    self.alias, n
                )));
            }
            None => {}
        }

        self.check_attribute("normals", &self.normals, 3)?;
        self.check_attribute("tangents", &self.tangents, 3)?;
        self.check_attribute("colors", &self.colors, 4)?;
        self.check_attribute("texture_coords", &self.texture_coords, 2)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GeometryDescriptor {
        GeometryDescriptor::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], vec![0, 1, 2])
            .with_alias("tri")
    }

    #[test]
    fn test_valid_triangle() {
        triangle().validate().unwrap();
    }

    #[test]
    fn test_index_out_of_range() {
        let mut d = triangle();
        d.indices = Some(vec![0, 1, 7]);
        assert!(matches!(d.validate(), Err(LumenError::Geometry(_))));
    }

    #[test]
    fn test_mismatched_color_length() {
        let mut d = triangle();
        d.colors = Some(vec![1.0; 8]);
        let err = d.validate().unwrap_err();
        assert!(err.to_string().contains("colors"));
    }

    #[test]
    fn test_unindexed_uses_sequential_triangles() {
        let mut d = triangle();
        d.indices = None;
        d.validate().unwrap();
        assert_eq!(d.index_data().as_ref(), &[0, 1, 2]);
    }

    #[test]
    fn test_computed_normals_keep_existing() {
        let mut d = triangle();
        d.normals = Some(vec![9.0; 9]);
        let d = d.with_computed_normals().unwrap();
        assert_eq!(d.normals.unwrap(), vec![9.0; 9]);
    }

    #[test]
    fn test_computed_tangents_need_uvs() {
        let d = triangle().with_computed_tangents().unwrap();
        assert!(d.tangents.is_none());
    }
}
