//! The graphics API the pipeline is written against.
//!
//! The trait mirrors a GL-style immediate API: handles are opaque, state is
//! bound before use, and lookups for names the shader does not expose come
//! back as `None` instead of failing.

use std::fmt::Debug;

use lumen_core::{Result, ShaderStage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    Lines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

/// Comparison a fragment's depth must pass against the stored depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
    Always,
}

pub trait GraphicsBackend {
    type Shader: Copy + Debug;
    type Program: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug + PartialEq;
    type VertexArray: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    // Shaders
    fn create_shader(&mut self, stage: ShaderStage) -> Result<Self::Shader>;
    fn shader_source(&mut self, shader: Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    // Programs
    fn create_program(&mut self) -> Result<Self::Program>;
    fn attach_shader(&mut self, program: Self::Program, shader: Self::Shader);
    fn link_program(&mut self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn validate_program(&mut self, program: Self::Program);
    fn program_validate_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&mut self, program: Option<Self::Program>);
    fn delete_program(&mut self, program: Self::Program);

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str) -> Option<Self::UniformLocation>;

    // Buffers and vertex arrays
    fn create_buffer(&mut self) -> Result<Self::Buffer>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<Self::Buffer>) -> Result<()>;
    fn buffer_data_f32(&mut self, target: BufferTarget, data: &[f32]) -> Result<()>;
    fn buffer_data_u16(&mut self, target: BufferTarget, data: &[u16]) -> Result<()>;
    fn buffer_data_u32(&mut self, target: BufferTarget, data: &[u32]) -> Result<()>;
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn create_vertex_array(&mut self) -> Result<Self::VertexArray>;
    fn bind_vertex_array(&mut self, vertex_array: Option<Self::VertexArray>) -> Result<()>;
    fn delete_vertex_array(&mut self, vertex_array: Self::VertexArray);
    fn enable_vertex_attrib_array(&mut self, slot: u32) -> Result<()>;
    /// Describe tightly packed `f32` components for `slot` from the bound
    /// array buffer.
    fn vertex_attrib_pointer_f32(&mut self, slot: u32, components: u32) -> Result<()>;

    // Uniforms, applied to the current program
    fn uniform_matrix4(&mut self, location: &Self::UniformLocation, value: &[f32; 16]);
    fn uniform_4f(&mut self, location: &Self::UniformLocation, value: [f32; 4]);
    fn uniform_3f(&mut self, location: &Self::UniformLocation, value: [f32; 3]);
    fn uniform_1f(&mut self, location: &Self::UniformLocation, value: f32);
    fn uniform_1i(&mut self, location: &Self::UniformLocation, value: i32);

    // Frame
    fn clear_color(&mut self, color: [f32; 4]);
    /// Value the depth buffer is reset to by `clear`. Clamped to `[0, 1]`.
    fn clear_depth(&mut self, depth: f32);
    fn enable_depth_test(&mut self, enabled: bool);
    fn depth_func(&mut self, func: DepthFunc);
    /// Clear color and depth.
    fn clear(&mut self);
    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32);
    fn draw_elements(&mut self, mode: Primitive, count: usize, index_type: IndexType, offset: usize) -> Result<()>;
}
