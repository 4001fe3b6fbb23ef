//! In-memory graphics backend.
//!
//! `HeadlessBackend` keeps every resource in CPU-side tables and enforces
//! the same rules a GL driver would: shaders must define `main`, programs
//! must be linked before use, uniforms that are declared but never read are
//! dropped at link time, and draws need a bound vertex array and index
//! buffer. Every state change is appended to a command log so callers can
//! inspect exactly what a frame submitted.

use std::collections::{BTreeSet, HashMap};

use lumen_core::{LumenError, Result, ShaderStage};
use slotmap::{new_key_type, SlotMap};

use crate::backend::{BufferTarget, DepthFunc, GraphicsBackend, IndexType, Primitive};

new_key_type! {
    pub struct ShaderKey;
    pub struct ProgramKey;
    pub struct BufferKey;
    pub struct VertexArrayKey;
}

/// Uniform location: the owning program plus the uniform's active index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessUniform {
    program: ProgramKey,
    index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Mat4([f32; 16]),
    Vec4([f32; 4]),
    Vec3([f32; 3]),
    Float(f32),
    Int(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    UseProgram(Option<ProgramKey>),
    BindVertexArray(Option<VertexArrayKey>),
    BindBuffer(BufferTarget, Option<BufferKey>),
    Uniform(String, UniformValue),
    Draw {
        vertex_array: VertexArrayKey,
        mode: Primitive,
        count: usize,
        index_type: IndexType,
    },
    Clear,
    Viewport(i32, i32, u32, u32),
    DepthTest(bool),
    DepthFunc(DepthFunc),
}

/// Commands kept before the oldest half of the log is dropped.
pub const DEFAULT_COMMAND_LIMIT: usize = 4096;

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: Vec<ShaderKey>,
    linked: bool,
    validated: bool,
    log: String,
    attributes: Vec<String>,
    uniforms: Vec<String>,
    values: HashMap<usize, UniformValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataKind {
    F32,
    U16,
    U32,
}

#[derive(Default)]
struct BufferObject {
    contents: Option<(DataKind, usize)>,
}

#[derive(Default)]
struct VertexArrayObject {
    enabled: BTreeSet<u32>,
    pointers: HashMap<u32, (BufferKey, u32)>,
}

#[derive(Default)]
pub struct HeadlessBackend {
    shaders: SlotMap<ShaderKey, ShaderObject>,
    programs: SlotMap<ProgramKey, ProgramObject>,
    buffers: SlotMap<BufferKey, BufferObject>,
    vertex_arrays: SlotMap<VertexArrayKey, VertexArrayObject>,

    current_program: Option<ProgramKey>,
    array_buffer: Option<BufferKey>,
    element_buffer: Option<BufferKey>,
    vertex_array: Option<VertexArrayKey>,

    clear_color: [f32; 4],
    clear_depth: Option<f32>,
    depth_test: bool,
    depth_func: DepthFunc,
    viewport: (i32, i32, u32, u32),

    commands: Vec<Command>,
    command_limit: Option<usize>,
    errors: Vec<String>,
    reject_validation: bool,
    failing_draws: usize,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `validate_program` fail.
    pub fn reject_validation(&mut self, reject: bool) {
        self.reject_validation = reject;
    }

    /// Make the next `count` draw calls fail with a backend error.
    pub fn fail_next_draws(&mut self, count: usize) {
        self.failing_draws = count;
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Bound the command log. When it fills up, the oldest half is
    /// discarded. A limit of 0 turns recording off.
    pub fn set_command_limit(&mut self, limit: usize) {
        self.command_limit = Some(limit);
        if self.commands.len() > limit {
            let excess = self.commands.len() - limit;
            self.commands.drain(..excess);
        }
    }

    pub fn command_limit(&self) -> usize {
        self.command_limit.unwrap_or(DEFAULT_COMMAND_LIMIT)
    }

    fn record(&mut self, command: Command) {
        let limit = self.command_limit();
        if limit == 0 {
            return;
        }
        if self.commands.len() >= limit {
            let keep = limit / 2;
            let excess = self.commands.len() - keep;
            self.commands.drain(..excess);
        }
        self.commands.push(command);
    }

    /// Draw calls in submission order.
    pub fn draws(&self) -> Vec<(VertexArrayKey, Primitive, usize)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Draw {
                    vertex_array,
                    mode,
                    count,
                    ..
                } => Some((*vertex_array, *mode, *count)),
                _ => None,
            })
            .collect()
    }

    /// Non-fatal errors a driver would have flagged (uniform writes to a
    /// foreign program, use of an unlinked program).
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn current_program(&self) -> Option<ProgramKey> {
        self.current_program
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayKey> {
        self.vertex_array
    }

    pub fn bound_buffer(&self, target: BufferTarget) -> Option<BufferKey> {
        match target {
            BufferTarget::Array => self.array_buffer,
            BufferTarget::ElementArray => self.element_buffer,
        }
    }

    /// Last value written to `name` in the current program.
    pub fn uniform_value(&self, name: &str) -> Option<&UniformValue> {
        let program = self.programs.get(self.current_program?)?;
        let index = program.uniforms.iter().position(|u| u == name)?;
        program.values.get(&index)
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn viewport_value(&self) -> (i32, i32, u32, u32) {
        self.viewport
    }

    /// Depth test flag, comparison and clear value.
    pub fn depth_state(&self) -> (bool, DepthFunc, f32) {
        (self.depth_test, self.depth_func, self.clear_depth.unwrap_or(1.0))
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Slot `slot` of the bound vertex array reads from a buffer.
    pub fn attribute_enabled(&self, vertex_array: VertexArrayKey, slot: u32) -> bool {
        self.vertex_arrays
            .get(vertex_array)
            .is_some_and(|vao| vao.enabled.contains(&slot) && vao.pointers.contains_key(&slot))
    }

    fn set_uniform(&mut self, location: &HeadlessUniform, value: UniformValue) {
        if self.current_program != Some(location.program) {
            self.errors
                .push("GL_INVALID_OPERATION: uniform location does not belong to the current program".to_string());
            return;
        }
        let Some(program) = self.programs.get_mut(location.program) else {
            return;
        };
        let name = program.uniforms[location.index].clone();
        program.values.insert(location.index, value.clone());
        self.record(Command::Uniform(name, value));
    }

    fn upload(&mut self, target: BufferTarget, kind: DataKind, len: usize) -> Result<()> {
        let key = self.bound_buffer(target).ok_or_else(|| {
            LumenError::Backend(format!("GL_INVALID_OPERATION: no buffer bound to {:?}", target))
        })?;
        let buffer = self
            .buffers
            .get_mut(key)
            .ok_or_else(|| LumenError::Backend(format!("buffer {:?} was deleted", key)))?;
        buffer.contents = Some((kind, len));
        Ok(())
    }

    fn link(&self, attached: &[ShaderKey]) -> std::result::Result<(Vec<String>, Vec<String>), String> {
        let find = |stage: ShaderStage| {
            attached
                .iter()
                .filter_map(|k| self.shaders.get(*k))
                .find(|s| s.stage == stage)
        };
        let (Some(vertex), Some(fragment)) = (find(ShaderStage::Vertex), find(ShaderStage::Fragment)) else {
            return Err("ERROR: program needs a vertex and a fragment shader".to_string());
        };
        if !vertex.compiled || !fragment.compiled {
            return Err("ERROR: attached shaders are not compiled".to_string());
        }

        let outputs = declarations(&vertex.source, &["out", "varying"]);
        if let Some(missing) = declarations(&fragment.source, &["in", "varying"])
            .into_iter()
            .find(|name| !outputs.contains(name))
        {
            return Err(format!(
                "ERROR: input '{}' of the fragment shader is not written by the vertex shader",
                missing
            ));
        }

        let sources = [vertex.source.as_str(), fragment.source.as_str()];

        let attributes = declarations(&vertex.source, &["in", "attribute"])
            .into_iter()
            .filter(|name| referenced(&sources[..1], name))
            .collect();

        let mut uniforms: Vec<String> = Vec::new();
        for source in sources {
            for name in declarations(source, &["uniform"]) {
                if !uniforms.contains(&name) && referenced(&sources, &name) {
                    uniforms.push(name);
                }
            }
        }

        Ok((attributes, uniforms))
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn is_declaration(line: &str) -> bool {
    let line = line.trim_start();
    ["uniform ", "in ", "out ", "attribute ", "varying ", "layout", "precision "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// Names declared with one of `qualifiers`, in declaration order.
fn declarations(source: &str, qualifiers: &[&str]) -> Vec<String> {
    let mut names = Vec::new();
    for line in source.lines() {
        let mut line = strip_comment(line).trim();
        if line.starts_with("layout") {
            match line.find(')') {
                Some(end) => line = line[end + 1..].trim(),
                None => continue,
            }
        }
        if line.contains('(') {
            continue;
        }
        let mut tokens = line.trim_end_matches(';').split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        if !qualifiers.contains(&first) {
            continue;
        }
        if let Some(last) = tokens.last() {
            let name = last.split('[').next().unwrap_or(last);
            names.push(name.to_string());
        }
    }
    names
}

/// `name` appears as a whole identifier outside declarations.
fn referenced(sources: &[&str], name: &str) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    sources
        .iter()
        .flat_map(|s| s.lines())
        .map(strip_comment)
        .filter(|line| !is_declaration(line))
        .any(|line| {
            line.match_indices(name).any(|(pos, _)| {
                let before = line[..pos].chars().next_back();
                let after = line[pos + name.len()..].chars().next();
                !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
            })
        })
}

fn compile_glsl(source: &str) -> std::result::Result<(), String> {
    if source.trim().is_empty() {
        return Err("ERROR: 0:0: empty shader source".to_string());
    }
    for (number, line) in source.lines().enumerate() {
        let line = line.trim_start();
        if let Some(message) = line.strip_prefix("#error") {
            return Err(format!("ERROR: 0:{}: '#error' : {}", number + 1, message.trim()));
        }
    }
    let opens = source.matches('{').count();
    let closes = source.matches('}').count();
    if opens != closes {
        return Err(format!(
            "ERROR: 0:{}: '' : syntax error, unbalanced braces",
            source.lines().count()
        ));
    }
    if !source.contains("main(") {
        return Err("ERROR: 0:0: 'main' : function not defined".to_string());
    }
    Ok(())
}

impl GraphicsBackend for HeadlessBackend {
    type Shader = ShaderKey;
    type Program = ProgramKey;
    type Buffer = BufferKey;
    type VertexArray = VertexArrayKey;
    type UniformLocation = HeadlessUniform;

    fn create_shader(&mut self, stage: ShaderStage) -> Result<ShaderKey> {
        Ok(self.shaders.insert(ShaderObject {
            stage,
            source: String::new(),
            compiled: false,
            log: String::new(),
        }))
    }

    fn shader_source(&mut self, shader: ShaderKey, source: &str) {
        if let Some(s) = self.shaders.get_mut(shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&mut self, shader: ShaderKey) {
        if let Some(s) = self.shaders.get_mut(shader) {
            match compile_glsl(&s.source) {
                Ok(()) => {
                    s.compiled = true;
                    s.log.clear();
                }
                Err(log) => {
                    s.compiled = false;
                    s.log = log;
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderKey) -> bool {
        self.shaders.get(shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderKey) -> String {
        self.shaders.get(shader).map(|s| s.log.clone()).unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ShaderKey) {
        self.shaders.remove(shader);
    }

    fn create_program(&mut self) -> Result<ProgramKey> {
        Ok(self.programs.insert(ProgramObject::default()))
    }

    fn attach_shader(&mut self, program: ProgramKey, shader: ShaderKey) {
        if let Some(p) = self.programs.get_mut(program) {
            p.attached.push(shader);
        }
    }

    fn link_program(&mut self, program: ProgramKey) {
        let Some(attached) = self.programs.get(program).map(|p| p.attached.clone()) else {
            return;
        };
        let result = self.link(&attached);
        if let Some(p) = self.programs.get_mut(program) {
            match result {
                Ok((attributes, uniforms)) => {
                    p.linked = true;
                    p.log.clear();
                    p.attributes = attributes;
                    p.uniforms = uniforms;
                    p.values.clear();
                }
                Err(log) => {
                    p.linked = false;
                    p.log = log;
                }
            }
        }
    }

    fn program_link_status(&self, program: ProgramKey) -> bool {
        self.programs.get(program).is_some_and(|p| p.linked)
    }

    fn validate_program(&mut self, program: ProgramKey) {
        let reject = self.reject_validation;
        if let Some(p) = self.programs.get_mut(program) {
            p.validated = p.linked && !reject;
            if !p.linked {
                p.log = "ERROR: program is not linked".to_string();
            } else if reject {
                p.log = "ERROR: program is not valid in the current state".to_string();
            }
        }
    }

    fn program_validate_status(&self, program: ProgramKey) -> bool {
        self.programs.get(program).is_some_and(|p| p.validated)
    }

    fn program_info_log(&self, program: ProgramKey) -> String {
        self.programs.get(program).map(|p| p.log.clone()).unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<ProgramKey>) {
        if let Some(key) = program {
            if !self.program_link_status(key) {
                self.errors
                    .push("GL_INVALID_OPERATION: use_program on an unlinked program".to_string());
                return;
            }
        }
        self.current_program = program;
        self.record(Command::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramKey) {
        self.programs.remove(program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn attrib_location(&self, program: ProgramKey, name: &str) -> Option<u32> {
        let p = self.programs.get(program).filter(|p| p.linked)?;
        p.attributes.iter().position(|a| a == name).map(|i| i as u32)
    }

    fn uniform_location(&self, program: ProgramKey, name: &str) -> Option<HeadlessUniform> {
        let p = self.programs.get(program).filter(|p| p.linked)?;
        p.uniforms
            .iter()
            .position(|u| u == name)
            .map(|index| HeadlessUniform { program, index })
    }

    fn create_buffer(&mut self) -> Result<BufferKey> {
        Ok(self.buffers.insert(BufferObject::default()))
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferKey>) -> Result<()> {
        if let Some(key) = buffer {
            if !self.buffers.contains_key(key) {
                return Err(LumenError::Backend(format!(
                    "GL_INVALID_OPERATION: bind of deleted buffer {:?}",
                    key
                )));
            }
        }
        match target {
            BufferTarget::Array => self.array_buffer = buffer,
            BufferTarget::ElementArray => self.element_buffer = buffer,
        }
        self.record(Command::BindBuffer(target, buffer));
        Ok(())
    }

    fn buffer_data_f32(&mut self, target: BufferTarget, data: &[f32]) -> Result<()> {
        self.upload(target, DataKind::F32, data.len())
    }

    fn buffer_data_u16(&mut self, target: BufferTarget, data: &[u16]) -> Result<()> {
        self.upload(target, DataKind::U16, data.len())
    }

    fn buffer_data_u32(&mut self, target: BufferTarget, data: &[u32]) -> Result<()> {
        self.upload(target, DataKind::U32, data.len())
    }

    fn delete_buffer(&mut self, buffer: BufferKey) {
        self.buffers.remove(buffer);
        if self.array_buffer == Some(buffer) {
            self.array_buffer = None;
        }
        if self.element_buffer == Some(buffer) {
            self.element_buffer = None;
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayKey> {
        Ok(self.vertex_arrays.insert(VertexArrayObject::default()))
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayKey>) -> Result<()> {
        if let Some(key) = vertex_array {
            if !self.vertex_arrays.contains_key(key) {
                return Err(LumenError::Backend(format!(
                    "GL_INVALID_OPERATION: bind of deleted vertex array {:?}",
                    key
                )));
            }
        }
        self.vertex_array = vertex_array;
        self.record(Command::BindVertexArray(vertex_array));
        Ok(())
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayKey) {
        self.vertex_arrays.remove(vertex_array);
        if self.vertex_array == Some(vertex_array) {
            self.vertex_array = None;
        }
    }

    fn enable_vertex_attrib_array(&mut self, slot: u32) -> Result<()> {
        let vao = self
            .vertex_array
            .and_then(|key| self.vertex_arrays.get_mut(key))
            .ok_or_else(|| LumenError::Backend("GL_INVALID_OPERATION: no vertex array bound".to_string()))?;
        vao.enabled.insert(slot);
        Ok(())
    }

    fn vertex_attrib_pointer_f32(&mut self, slot: u32, components: u32) -> Result<()> {
        if !(1..=4).contains(&components) {
            return Err(LumenError::Backend(format!(
                "GL_INVALID_VALUE: {} components for attribute {}",
                components, slot
            )));
        }
        let buffer = self.array_buffer.ok_or_else(|| {
            LumenError::Backend("GL_INVALID_OPERATION: no array buffer bound".to_string())
        })?;
        let vao = self
            .vertex_array
            .and_then(|key| self.vertex_arrays.get_mut(key))
            .ok_or_else(|| LumenError::Backend("GL_INVALID_OPERATION: no vertex array bound".to_string()))?;
        vao.pointers.insert(slot, (buffer, components));
        Ok(())
    }

    fn uniform_matrix4(&mut self, location: &HeadlessUniform, value: &[f32; 16]) {
        self.set_uniform(location, UniformValue::Mat4(*value));
    }

    fn uniform_4f(&mut self, location: &HeadlessUniform, value: [f32; 4]) {
        self.set_uniform(location, UniformValue::Vec4(value));
    }

    fn uniform_3f(&mut self, location: &HeadlessUniform, value: [f32; 3]) {
        self.set_uniform(location, UniformValue::Vec3(value));
    }

    fn uniform_1f(&mut self, location: &HeadlessUniform, value: f32) {
        self.set_uniform(location, UniformValue::Float(value));
    }

    fn uniform_1i(&mut self, location: &HeadlessUniform, value: i32) {
        self.set_uniform(location, UniformValue::Int(value));
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn clear_depth(&mut self, depth: f32) {
        self.clear_depth = Some(depth.clamp(0.0, 1.0));
    }

    fn enable_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.record(Command::DepthTest(enabled));
    }

    fn depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
        self.record(Command::DepthFunc(func));
    }

    fn clear(&mut self) {
        self.record(Command::Clear);
    }

    fn viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.record(Command::Viewport(x, y, width, height));
    }

    fn draw_elements(&mut self, mode: Primitive, count: usize, index_type: IndexType, offset: usize) -> Result<()> {
        if self.failing_draws > 0 {
            self.failing_draws -= 1;
            return Err(LumenError::Backend("GL_OUT_OF_MEMORY: draw rejected".to_string()));
        }
        if !self.current_program.is_some_and(|p| self.program_link_status(p)) {
            return Err(LumenError::Backend("GL_INVALID_OPERATION: no program in use".to_string()));
        }
        let vertex_array = self
            .vertex_array
            .ok_or_else(|| LumenError::Backend("GL_INVALID_OPERATION: no vertex array bound".to_string()))?;
        let element_buffer = self
            .element_buffer
            .and_then(|key| self.buffers.get(key))
            .ok_or_else(|| LumenError::Backend("GL_INVALID_OPERATION: no index buffer bound".to_string()))?;

        let expected = match index_type {
            IndexType::U16 => DataKind::U16,
            IndexType::U32 => DataKind::U32,
        };
        match element_buffer.contents {
            Some((kind, len)) if kind == expected && offset + count <= len => {}
            Some((kind, len)) => {
                return Err(LumenError::Backend(format!(
                    "GL_INVALID_OPERATION: draw of {} {:?} indices at {} from a buffer of {} {:?}",
                    count, index_type, offset, len, kind
                )));
            }
            None => {
                return Err(LumenError::Backend("GL_INVALID_OPERATION: index buffer is empty".to_string()));
            }
        }

        if let Some(vao) = self.vertex_arrays.get(vertex_array) {
            if let Some(slot) = vao.enabled.iter().find(|s| !vao.pointers.contains_key(*s)) {
                return Err(LumenError::Backend(format!(
                    "GL_INVALID_OPERATION: attribute {} enabled without a buffer",
                    slot
                )));
            }
        }

        self.record(Command::Draw {
            vertex_array,
            mode,
            count,
            index_type,
        });
        Ok(())
    }
}
