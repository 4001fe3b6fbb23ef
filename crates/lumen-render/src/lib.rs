//! Real-time rendering of indexed triangle meshes.
//!
//! The pieces fit together through [`Renderer`], the one context object
//! that owns the graphics backend, the shader program, the scene graph and
//! the transform pipeline. Everything runs on the thread that drives
//! [`Renderer::tick`].

pub mod backend;
pub mod bind;
pub mod controls;
pub mod headless;
pub mod program;
pub mod renderer;
pub mod scene;
pub mod shaders;
pub mod transform;

pub use backend::{BufferTarget, DepthFunc, GraphicsBackend, IndexType, Primitive};
pub use bind::BindScope;
pub use controls::{standard_controls, Control, ControlPanel, ControlState, ControlValue};
pub use headless::HeadlessBackend;
pub use program::ShaderProgram;
pub use renderer::{FrameInput, FrameReport, Renderer};
pub use scene::{SceneGraph, SceneObject};
pub use transform::{Axis, CoordinateMode, TransformPipeline};
