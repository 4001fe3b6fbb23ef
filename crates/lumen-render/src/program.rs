use std::collections::HashMap;

use lumen_core::{LumenError, Result, ShaderStage};

use crate::backend::GraphicsBackend;

/// A linked and validated shader program, with the attribute slots and
/// uniform locations resolved against it so far.
///
/// Lookups are permissive: a name the program does not expose (never
/// declared, or dropped by the compiler) resolves to `None`, and the typed
/// setters skip such names instead of failing.
pub struct ShaderProgram<B: GraphicsBackend> {
    handle: B::Program,
    attributes: HashMap<String, Option<u32>>,
    uniforms: HashMap<String, Option<B::UniformLocation>>,
}

fn compile<B: GraphicsBackend>(backend: &mut B, stage: ShaderStage, source: &str) -> Result<B::Shader> {
    if source.trim().is_empty() {
        return Err(LumenError::ShaderCompile {
            stage,
            log: "no shader source provided".to_string(),
        });
    }

    let shader = backend.create_shader(stage)?;
    backend.shader_source(shader, source);
    backend.compile_shader(shader);

    if !backend.shader_compile_status(shader) {
        let log = backend.shader_info_log(shader);
        backend.delete_shader(shader);
        return Err(LumenError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

fn link<B: GraphicsBackend>(backend: &mut B, vertex: B::Shader, fragment: B::Shader) -> Result<B::Program> {
    let program = backend.create_program()?;
    backend.attach_shader(program, vertex);
    backend.attach_shader(program, fragment);
    backend.link_program(program);

    if !backend.program_link_status(program) {
        let log = backend.program_info_log(program);
        backend.delete_program(program);
        return Err(LumenError::Link { log });
    }

    backend.validate_program(program);
    if !backend.program_validate_status(program) {
        let log = backend.program_info_log(program);
        backend.delete_program(program);
        return Err(LumenError::Validation { log });
    }

    Ok(program)
}

impl<B: GraphicsBackend> ShaderProgram<B> {
    /// Compile both stages, link and validate them, and make the result the
    /// current program.
    pub fn create(backend: &mut B, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        let vertex = compile(backend, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile(backend, ShaderStage::Fragment, fragment_source) {
            Ok(shader) => shader,
            Err(e) => {
                backend.delete_shader(vertex);
                return Err(e);
            }
        };

        let linked = link(backend, vertex, fragment);
        // The stages are owned by the program once linked.
        backend.delete_shader(vertex);
        backend.delete_shader(fragment);
        let handle = linked?;

        backend.use_program(Some(handle));
        log::info!("shader program {:?} linked and validated", handle);

        Ok(Self {
            handle,
            attributes: HashMap::new(),
            uniforms: HashMap::new(),
        })
    }

    pub fn handle(&self) -> B::Program {
        self.handle
    }

    /// Bind this program as the current one. Safe to call repeatedly.
    pub fn activate(&self, backend: &mut B) {
        backend.use_program(Some(self.handle));
    }

    /// Activate the program and resolve both name sets.
    pub fn load(&mut self, backend: &mut B, attributes: &[&str], uniforms: &[&str]) {
        self.activate(backend);
        self.resolve_attribute_locations(backend, attributes);
        self.resolve_uniform_locations(backend, uniforms);
    }

    pub fn resolve_attribute_locations(&mut self, backend: &B, names: &[&str]) -> HashMap<String, Option<u32>> {
        let mut resolved = HashMap::with_capacity(names.len());
        for &name in names {
            let slot = backend.attrib_location(self.handle, name);
            if slot.is_none() {
                log::debug!("attribute '{}' is not active in program {:?}", name, self.handle);
            }
            self.attributes.insert(name.to_string(), slot);
            resolved.insert(name.to_string(), slot);
        }
        resolved
    }

    pub fn resolve_uniform_locations(
        &mut self,
        backend: &B,
        names: &[&str],
    ) -> HashMap<String, Option<B::UniformLocation>> {
        let mut resolved = HashMap::with_capacity(names.len());
        for &name in names {
            let location = backend.uniform_location(self.handle, name);
            if location.is_none() {
                log::debug!("uniform '{}' is not active in program {:?}", name, self.handle);
            }
            self.uniforms.insert(name.to_string(), location.clone());
            resolved.insert(name.to_string(), location);
        }
        resolved
    }

    /// Slot of a previously resolved attribute.
    pub fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied().flatten()
    }

    /// Location of a previously resolved uniform.
    pub fn uniform(&self, name: &str) -> Option<&B::UniformLocation> {
        self.uniforms.get(name).and_then(Option::as_ref)
    }

    pub fn set_matrix4(&self, backend: &mut B, name: &str, value: &[f32; 16]) {
        if let Some(location) = self.uniform(name) {
            backend.uniform_matrix4(location, value);
        }
    }

    pub fn set_vec4(&self, backend: &mut B, name: &str, value: [f32; 4]) {
        if let Some(location) = self.uniform(name) {
            backend.uniform_4f(location, value);
        }
    }

    pub fn set_vec3(&self, backend: &mut B, name: &str, value: [f32; 3]) {
        if let Some(location) = self.uniform(name) {
            backend.uniform_3f(location, value);
        }
    }

    pub fn set_f32(&self, backend: &mut B, name: &str, value: f32) {
        if let Some(location) = self.uniform(name) {
            backend.uniform_1f(location, value);
        }
    }

    pub fn set_bool(&self, backend: &mut B, name: &str, value: bool) {
        if let Some(location) = self.uniform(name) {
            backend.uniform_1i(location, value as i32);
        }
    }

    pub fn delete(self, backend: &mut B) {
        backend.delete_program(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessBackend, UniformValue};
    use crate::shaders::{PHONG_FRAGMENT, PHONG_VERTEX, UNIFORMS};

    #[test]
    fn test_create_activates_program() {
        let mut backend = HeadlessBackend::new();
        let program = ShaderProgram::create(&mut backend, PHONG_VERTEX, PHONG_FRAGMENT).unwrap();
        assert_eq!(backend.current_program(), Some(program.handle()));
    }

    #[test]
    fn test_fragment_compile_error_carries_stage_and_log() {
        let mut backend = HeadlessBackend::new();
        let broken = "#version 300 es\nvoid main(void) {\n";
        let err = ShaderProgram::create(&mut backend, PHONG_VERTEX, broken).err().unwrap();
        match err {
            LumenError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.contains("syntax error"), "log: {}", log);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(backend.current_program(), None);
    }

    #[test]
    fn test_empty_vertex_source_rejected() {
        let mut backend = HeadlessBackend::new();
        let err = ShaderProgram::create(&mut backend, "  ", PHONG_FRAGMENT).err().unwrap();
        assert!(matches!(
            err,
            LumenError::ShaderCompile {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
    }

    #[test]
    fn test_link_error_releases_program() {
        let mut backend = HeadlessBackend::new();
        let vertex = "#version 300 es\nin vec3 aVertexPosition;\nvoid main(void) {\n  gl_Position = vec4(aVertexPosition, 1.0);\n}\n";
        let err = ShaderProgram::create(&mut backend, vertex, PHONG_FRAGMENT).err().unwrap();
        match err {
            LumenError::Link { log } => assert!(log.contains("vNormal"), "log: {}", log),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn test_validation_error() {
        let mut backend = HeadlessBackend::new();
        backend.reject_validation(true);
        let err = ShaderProgram::create(&mut backend, PHONG_VERTEX, PHONG_FRAGMENT).err().unwrap();
        assert!(matches!(err, LumenError::Validation { .. }));
        assert_eq!(backend.live_programs(), 0);
    }

    #[test]
    fn test_missing_uniform_resolves_to_none() {
        let mut backend = HeadlessBackend::new();
        let mut program = ShaderProgram::create(&mut backend, PHONG_VERTEX, PHONG_FRAGMENT).unwrap();
        let resolved = program.resolve_uniform_locations(&backend, &["uModelViewMatrix", "uDoesNotExist"]);

        assert!(resolved["uModelViewMatrix"].is_some());
        assert!(resolved["uDoesNotExist"].is_none());
        assert!(program.uniform("uDoesNotExist").is_none());

        // Writes to the missing name are skipped without a driver error.
        program.set_f32(&mut backend, "uDoesNotExist", 1.0);
        assert!(backend.errors().is_empty());
    }

    #[test]
    fn test_load_resolves_standard_names() {
        let mut backend = HeadlessBackend::new();
        let mut program = ShaderProgram::create(&mut backend, PHONG_VERTEX, PHONG_FRAGMENT).unwrap();
        program.load(&mut backend, &["aVertexPosition", "aVertexNormal", "aVertexColor"], &UNIFORMS);

        assert_eq!(program.attribute("aVertexPosition"), Some(0));
        assert_eq!(program.attribute("aVertexNormal"), Some(1));
        assert_eq!(program.attribute("aVertexColor"), None);
        for name in UNIFORMS {
            assert!(program.uniform(name).is_some(), "{} unresolved", name);
        }

        program.set_bool(&mut backend, "uWireframe", true);
        assert_eq!(backend.uniform_value("uWireframe"), Some(&UniformValue::Int(1)));
    }
}
