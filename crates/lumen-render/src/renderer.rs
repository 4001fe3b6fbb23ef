//! The render loop context.
//!
//! [`Renderer`] owns every piece of mutable rendering state. Callers drive
//! it one frame at a time through [`Renderer::tick`]; control callbacks
//! receive it by `&mut` between ticks.

use std::time::Duration;

use lumen_core::{LightingConfig, LumenError, RendererConfig, Result};
use lumen_mesh::GeometryDescriptor;

use crate::backend::{BufferTarget, DepthFunc, GraphicsBackend, Primitive};
use crate::bind::BindScope;
use crate::program::ShaderProgram;
use crate::scene::{SceneGraph, SceneObject};
use crate::shaders::*;
use crate::transform::TransformPipeline;

/// Surface size and time since the previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub width: u32,
    pub height: u32,
    pub elapsed: Duration,
}

impl FrameInput {
    pub fn new(width: u32, height: u32, elapsed: Duration) -> Self {
        Self { width, height, elapsed }
    }
}

/// What one tick managed to draw.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub drawn: usize,
    /// Label and error of every object whose draw failed.
    pub failed: Vec<(String, String)>,
}

impl FrameReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Renderer<B: GraphicsBackend> {
    backend: B,
    program: ShaderProgram<B>,
    scene: SceneGraph<B>,
    transforms: TransformPipeline,
    config: RendererConfig,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Build the program from the given sources, resolve the standard
    /// attribute and uniform names, and push the initial lighting.
    pub fn new(mut backend: B, config: RendererConfig, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        config.check()?;

        let mut program = ShaderProgram::create(&mut backend, vertex_source, fragment_source)?;
        program.load(&mut backend, &ATTRIBUTES, &UNIFORMS);
        backend.clear_color(config.clear_color);
        backend.clear_depth(1.0);
        backend.enable_depth_test(true);
        backend.depth_func(DepthFunc::LessEqual);

        let mut renderer = Self {
            backend,
            program,
            scene: SceneGraph::new(),
            transforms: TransformPipeline::new(&config),
            config,
        };
        renderer.init_lights();
        Ok(renderer)
    }

    /// A renderer running the built-in Phong program.
    pub fn with_phong(backend: B, config: RendererConfig) -> Result<Self> {
        Self::new(backend, config, PHONG_VERTEX, PHONG_FRAGMENT)
    }

    /// Push every lighting and material term from the config.
    pub fn init_lights(&mut self) {
        let lighting = &self.config.lighting;
        let backend = &mut self.backend;
        let program = &self.program;

        program.set_vec4(backend, U_LIGHT_DIFFUSE, lighting.light_diffuse);
        program.set_vec4(backend, U_LIGHT_AMBIENT, lighting.light_ambient);
        program.set_vec4(backend, U_LIGHT_SPECULAR, lighting.light_specular);
        program.set_vec3(backend, U_LIGHT_DIRECTION, lighting.light_direction);
        program.set_vec4(backend, U_MATERIAL_AMBIENT, lighting.material_ambient);
        program.set_vec4(backend, U_MATERIAL_SPECULAR, lighting.material_specular);
        program.set_f32(backend, U_SHININESS, lighting.shininess);
    }

    pub fn load(&mut self, descriptor: &GeometryDescriptor, label: &str) -> Result<&SceneObject<B>> {
        self.scene.load(&mut self.backend, &self.program, descriptor, label)
    }

    /// Render one frame. Objects whose draw fails are logged and reported;
    /// the rest of the frame still renders.
    pub fn tick(&mut self, frame: FrameInput) -> FrameReport {
        self.backend.viewport(0, 0, frame.width, frame.height);
        self.backend.clear();

        if self.config.spin_degrees_per_second != 0.0 {
            self.transforms
                .spin(self.config.spin_degrees_per_second * frame.elapsed.as_secs_f64());
        }

        let aspect = frame.width.max(1) as f64 / frame.height.max(1) as f64;
        self.transforms.update_transforms(aspect);
        self.transforms.set_matrix_uniforms(&mut self.backend, &self.program);

        let mut report = FrameReport::default();
        let backend = &mut self.backend;
        let program = &self.program;
        self.scene.traverse(|object| match draw_object(backend, program, object) {
            Ok(()) => report.drawn += 1,
            Err(e) => {
                log::error!("draw of '{}' failed: {}", object.label(), e);
                report.failed.push((object.label().to_string(), e.to_string()));
            }
        });
        report
    }

    pub fn lighting(&self) -> &LightingConfig {
        &self.config.lighting
    }

    /// Edit the lighting terms and push them to the program.
    pub fn update_lighting<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut LightingConfig),
    {
        edit(&mut self.config.lighting);
        self.init_lights();
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.config.clear_color
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.config.clear_color = color;
        self.backend.clear_color(color);
    }

    pub fn set_diffuse(&mut self, label: &str, diffuse: [f32; 4]) -> Result<()> {
        self.object_mut(label)?.diffuse = diffuse;
        Ok(())
    }

    pub fn set_diffuse_all(&mut self, diffuse: [f32; 4]) {
        for object in self.scene.iter_mut() {
            object.diffuse = diffuse;
        }
    }

    pub fn set_wireframe(&mut self, label: &str, wireframe: bool) -> Result<()> {
        self.object_mut(label)?.wireframe = wireframe;
        Ok(())
    }

    pub fn set_wireframe_all(&mut self, wireframe: bool) {
        for object in self.scene.iter_mut() {
            object.wireframe = wireframe;
        }
    }

    fn object_mut(&mut self, label: &str) -> Result<&mut SceneObject<B>> {
        self.scene
            .get_mut(label)
            .ok_or_else(|| LumenError::NotFound(format!("scene object '{}'", label)))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn program(&self) -> &ShaderProgram<B> {
        &self.program
    }

    pub fn scene(&self) -> &SceneGraph<B> {
        &self.scene
    }

    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut TransformPipeline {
        &mut self.transforms
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Release every GPU resource and hand the backend back.
    pub fn shutdown(self) -> B {
        let mut backend = self.backend;
        self.scene.release(&mut backend);
        self.program.delete(&mut backend);
        log::info!("renderer shut down");
        backend
    }
}

fn draw_object<B: GraphicsBackend>(backend: &mut B, program: &ShaderProgram<B>, object: &SceneObject<B>) -> Result<()> {
    program.set_vec4(backend, U_MATERIAL_DIFFUSE, object.diffuse);
    program.set_bool(backend, U_WIREFRAME, object.wireframe);

    let mut scope = BindScope::new(backend);
    scope.bind_vertex_array(object.vertex_array())?;
    scope.bind_buffer(BufferTarget::ElementArray, object.index_buffer())?;

    let mode = if object.wireframe {
        Primitive::Lines
    } else {
        Primitive::Triangles
    };
    scope.draw_elements(mode, object.index_count(), object.index_type())
}
