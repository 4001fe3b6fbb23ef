//! World/camera transform pipeline.
//!
//! One pose drives one of two matrices depending on the coordinate mode:
//! in world mode the pose places the model (`model_view`), in camera mode
//! it places the camera (`camera`). The other matrix is always the inverse
//! of the driven one, and the normal matrix is the transpose of `camera`.

use lumen_core::RendererConfig;
use lumen_math::{perspective, to_uniform, DMat4, DVec3, Pose};

use crate::backend::GraphicsBackend;
use crate::program::ShaderProgram;
use crate::shaders::{U_MODEL_VIEW, U_NORMAL, U_PROJECTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateMode {
    World,
    Camera,
}

/// One component of a position or rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformPipeline {
    mode: CoordinateMode,
    position: DVec3,
    rotation: DVec3,
    home: DVec3,
    initial_home: DVec3,

    fov_y_degrees: f64,
    near: f64,
    far: f64,

    model_view: DMat4,
    camera: DMat4,
    projection: DMat4,
    normal: DMat4,
}

impl TransformPipeline {
    pub fn new(config: &RendererConfig) -> Self {
        let home = DVec3::from_array(config.home);
        Self {
            mode: CoordinateMode::World,
            position: home,
            rotation: DVec3::ZERO,
            home,
            initial_home: home,
            fov_y_degrees: config.fov_y_degrees,
            near: config.near,
            far: config.far,
            model_view: DMat4::IDENTITY,
            camera: DMat4::IDENTITY,
            projection: DMat4::IDENTITY,
            normal: DMat4::IDENTITY,
        }
    }

    pub fn mode(&self) -> CoordinateMode {
        self.mode
    }

    /// Switch coordinate frames. Entering camera mode snapshots the
    /// position as home and negates it; leaving restores home. Both reset
    /// the rotation. Setting the current mode again does nothing.
    pub fn set_mode(&mut self, mode: CoordinateMode) {
        if mode == self.mode {
            return;
        }
        match mode {
            CoordinateMode::Camera => {
                self.home = self.position;
                self.position = -self.position;
            }
            CoordinateMode::World => {
                self.position = self.home;
            }
        }
        self.rotation = DVec3::ZERO;
        self.mode = mode;
        log::debug!("coordinate mode now {:?}, position {:?}", mode, self.position);
    }

    pub fn toggle_mode(&mut self) {
        self.set_mode(match self.mode {
            CoordinateMode::World => CoordinateMode::Camera,
            CoordinateMode::Camera => CoordinateMode::World,
        });
    }

    /// Back to world mode at the configured home with no rotation.
    pub fn reset(&mut self) {
        self.mode = CoordinateMode::World;
        self.position = self.initial_home;
        self.home = self.initial_home;
        self.rotation = DVec3::ZERO;
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    pub fn set_position_axis(&mut self, axis: Axis, value: f64) {
        self.position[axis.index()] = value;
    }

    /// Euler angles in degrees.
    pub fn rotation(&self) -> DVec3 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: DVec3) {
        self.rotation = degrees;
    }

    pub fn set_rotation_axis(&mut self, axis: Axis, degrees: f64) {
        self.rotation[axis.index()] = degrees;
    }

    /// Add to the Y rotation, keeping it in [0, 360).
    pub fn spin(&mut self, degrees: f64) {
        self.rotation.y = (self.rotation.y + degrees).rem_euclid(360.0);
    }

    pub fn home(&self) -> DVec3 {
        self.home
    }

    pub fn model_view(&self) -> DMat4 {
        self.model_view
    }

    pub fn camera(&self) -> DMat4 {
        self.camera
    }

    pub fn projection(&self) -> DMat4 {
        self.projection
    }

    pub fn normal_matrix(&self) -> DMat4 {
        self.normal
    }

    /// Rebuild the projection for `aspect` and the mode's driven matrix
    /// from the current pose.
    pub fn update_transforms(&mut self, aspect: f64) {
        self.projection = perspective(self.fov_y_degrees, aspect, self.near, self.far);

        let driven = Pose::new(self.position, self.rotation).to_mat4();
        match self.mode {
            CoordinateMode::World => self.model_view = driven,
            CoordinateMode::Camera => self.camera = driven,
        }
    }

    /// Derive the inverse matrix and the normal matrix from the driven one.
    pub fn derive_matrices(&mut self) {
        match self.mode {
            CoordinateMode::World => self.camera = self.model_view.inverse(),
            CoordinateMode::Camera => self.model_view = self.camera.inverse(),
        }
        // camera is model_view's inverse, so this is the usual
        // inverse-transpose without inverting a second time.
        self.normal = self.camera.transpose();
    }

    /// Derive the dependent matrices and push projection, model-view and
    /// normal matrices to the program.
    pub fn set_matrix_uniforms<B: GraphicsBackend>(&mut self, backend: &mut B, program: &ShaderProgram<B>) {
        self.derive_matrices();
        program.set_matrix4(backend, U_PROJECTION, &to_uniform(&self.projection));
        program.set_matrix4(backend, U_MODEL_VIEW, &to_uniform(&self.model_view));
        program.set_matrix4(backend, U_NORMAL, &to_uniform(&self.normal));
    }
}
