//! Renderer configuration.
//!
//! Everything the render loop needs before the first frame: the home pose,
//! projection parameters, clear color and the fixed lighting setup. Configs
//! are plain serde structs so they can live next to assets as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LumenError, Result};

/// Light and material terms pushed once at startup and edited by controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub light_diffuse: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_specular: [f32; 4],
    pub light_direction: [f32; 3],
    pub material_ambient: [f32; 4],
    pub material_specular: [f32; 4],
    pub shininess: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_diffuse: [1.0, 1.0, 1.0, 1.0],
            light_ambient: [0.03, 0.03, 0.03, 1.0],
            light_specular: [1.0, 1.0, 1.0, 1.0],
            light_direction: [-0.25, -0.25, -0.25],
            material_ambient: [1.0, 1.0, 1.0, 1.0],
            material_specular: [1.0, 1.0, 1.0, 1.0],
            shininess: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Position the transform pipeline starts at in world mode.
    pub home: [f64; 3],
    pub fov_y_degrees: f64,
    pub near: f64,
    pub far: f64,
    pub clear_color: [f32; 4],
    /// Rotation about Y applied every frame, scaled by elapsed time.
    pub spin_degrees_per_second: f64,
    pub lighting: LightingConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            home: [0.0, 0.0, -1.5],
            fov_y_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            spin_degrees_per_second: 0.0,
            lighting: LightingConfig::default(),
        }
    }
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::debug!("loaded renderer config from {}", path.display());
        Ok(config)
    }

    /// Reject projection parameters that would produce a degenerate frustum.
    pub fn check(&self) -> Result<()> {
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(LumenError::Config(format!(
                "clip planes must satisfy 0 < near < far, got near = {}, far = {}",
                self.near, self.far
            )));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(LumenError::Config(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }
        if self.home.iter().any(|c| !c.is_finite()) {
            return Err(LumenError::Config(format!(
                "home position must be finite, got {:?}",
                self.home
            )));
        }
        Ok(())
    }
}
