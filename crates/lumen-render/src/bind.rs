//! Scoped GPU bindings.
//!
//! A [`BindScope`] borrows the backend for the duration of a bind-use
//! sequence and resets the vertex array, array buffer and index buffer
//! bindings when it is dropped, on the success path and on every early
//! return alike.

use lumen_core::Result;

use crate::backend::{BufferTarget, GraphicsBackend, IndexType, Primitive};

pub struct BindScope<'a, B: GraphicsBackend> {
    backend: &'a mut B,
}

impl<'a, B: GraphicsBackend> BindScope<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }

    pub fn bind_vertex_array(&mut self, vertex_array: B::VertexArray) -> Result<()> {
        self.backend.bind_vertex_array(Some(vertex_array))
    }

    pub fn bind_buffer(&mut self, target: BufferTarget, buffer: B::Buffer) -> Result<()> {
        self.backend.bind_buffer(target, Some(buffer))
    }

    pub fn draw_elements(&mut self, mode: Primitive, count: usize, index_type: IndexType) -> Result<()> {
        self.backend.draw_elements(mode, count, index_type, 0)
    }

    /// Backend access for uploads while the scope's bindings are live.
    pub fn backend(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: GraphicsBackend> Drop for BindScope<'_, B> {
    fn drop(&mut self) {
        // Vertex array first so the index buffer reset does not leak into it.
        if let Err(e) = self.backend.bind_vertex_array(None) {
            log::warn!("failed to unbind vertex array: {}", e);
        }
        if let Err(e) = self.backend.bind_buffer(BufferTarget::Array, None) {
            log::warn!("failed to unbind array buffer: {}", e);
        }
        if let Err(e) = self.backend.bind_buffer(BufferTarget::ElementArray, None) {
            log::warn!("failed to unbind index buffer: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Command, HeadlessBackend};

    #[test]
    fn test_scope_unbinds_on_drop() {
        let mut backend = HeadlessBackend::new();
        let vao = backend.create_vertex_array().unwrap();
        let vbo = backend.create_buffer().unwrap();
        {
            let mut scope = BindScope::new(&mut backend);
            scope.bind_vertex_array(vao).unwrap();
            scope.bind_buffer(BufferTarget::Array, vbo).unwrap();
        }
        assert_eq!(backend.bound_vertex_array(), None);
        assert_eq!(backend.bound_buffer(BufferTarget::Array), None);
        assert_eq!(backend.bound_buffer(BufferTarget::ElementArray), None);
    }

    #[test]
    fn test_scope_unbinds_after_failed_draw() {
        let mut backend = HeadlessBackend::new();
        let vao = backend.create_vertex_array().unwrap();
        let result = {
            let mut scope = BindScope::new(&mut backend);
            scope.bind_vertex_array(vao).unwrap();
            scope.draw_elements(Primitive::Triangles, 3, IndexType::U16)
        };
        assert!(result.is_err());
        assert_eq!(backend.bound_vertex_array(), None);

        let tail: Vec<_> = backend.commands().iter().rev().take(3).cloned().collect();
        assert_eq!(
            tail,
            vec![
                Command::BindBuffer(BufferTarget::ElementArray, None),
                Command::BindBuffer(BufferTarget::Array, None),
                Command::BindVertexArray(None),
            ]
        );
    }
}
