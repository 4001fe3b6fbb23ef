use std::borrow::Cow;

use lumen_core::traits::Validate;
use lumen_core::{IdAllocator, LumenError, ObjectId, Result};
use lumen_mesh::{compute_vertex_normals, GeometryDescriptor};

use crate::backend::{BufferTarget, GraphicsBackend, IndexType};
use crate::bind::BindScope;
use crate::program::ShaderProgram;
use crate::shaders::{A_COLOR, A_NORMAL, A_POSITION, A_TANGENT, A_TEXTURE_COORDS};

/// A mesh resident on the GPU, with its material settings.
///
/// Objects have no transform of their own; every object in a frame is
/// drawn with the pipeline's shared matrices.
pub struct SceneObject<B: GraphicsBackend> {
    id: Option<ObjectId>,
    label: String,
    vertex_array: B::VertexArray,
    index_buffer: B::Buffer,
    attribute_buffers: Vec<B::Buffer>,
    index_count: usize,
    index_type: IndexType,
    pub diffuse: [f32; 4],
    pub wireframe: bool,
}

impl<B: GraphicsBackend> SceneObject<B> {
    /// Wrap resources built elsewhere. The index buffer must hold
    /// `index_count` indices of `index_type`.
    pub fn new(
        label: &str,
        vertex_array: B::VertexArray,
        index_buffer: B::Buffer,
        index_count: usize,
        index_type: IndexType,
    ) -> Self {
        Self {
            id: None,
            label: label.to_string(),
            vertex_array,
            index_buffer,
            attribute_buffers: Vec::new(),
            index_count,
            index_type,
            diffuse: [1.0, 1.0, 1.0, 1.0],
            wireframe: false,
        }
    }

    /// Assigned when the object joins a graph.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertex_array(&self) -> B::VertexArray {
        self.vertex_array
    }

    pub fn index_buffer(&self) -> B::Buffer {
        self.index_buffer
    }

    pub fn attribute_buffers(&self) -> &[B::Buffer] {
        &self.attribute_buffers
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    fn release(self, backend: &mut B) {
        for buffer in self.attribute_buffers {
            backend.delete_buffer(buffer);
        }
        backend.delete_buffer(self.index_buffer);
        backend.delete_vertex_array(self.vertex_array);
    }
}

/// Ordered, append-only collection of scene objects.
pub struct SceneGraph<B: GraphicsBackend> {
    objects: Vec<SceneObject<B>>,
    ids: IdAllocator,
}

impl<B: GraphicsBackend> Default for SceneGraph<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GraphicsBackend> SceneGraph<B> {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            ids: IdAllocator::new(),
        }
    }

    pub fn add(&mut self, mut object: SceneObject<B>) -> ObjectId {
        let id = self.ids.allocate();
        object.id = Some(id);
        log::debug!("scene object {} '{}' added", id, object.label);
        self.objects.push(object);
        id
    }

    /// Upload a descriptor's geometry and append the resulting object.
    ///
    /// Normals are computed when the descriptor carries none. Attribute
    /// streams the program does not consume are skipped. On failure
    /// nothing is added and any resources created so far are deleted.
    pub fn load(
        &mut self,
        backend: &mut B,
        program: &ShaderProgram<B>,
        descriptor: &GeometryDescriptor,
        label: &str,
    ) -> Result<&SceneObject<B>> {
        descriptor.validate()?;

        let indices = descriptor.index_data();
        let normals: Cow<'_, [f32]> = match &descriptor.normals {
            Some(normals) => Cow::Borrowed(normals.as_slice()),
            None => Cow::Owned(compute_vertex_normals(&descriptor.vertices, &indices)?),
        };

        let mut streams: Vec<(&str, &[f32], u32)> = vec![
            (A_POSITION, descriptor.vertices.as_slice(), 3),
            (A_NORMAL, normals.as_ref(), 3),
        ];
        if let Some(colors) = &descriptor.colors {
            streams.push((A_COLOR, colors.as_slice(), 4));
        }
        if let Some(uvs) = &descriptor.texture_coords {
            streams.push((A_TEXTURE_COORDS, uvs.as_slice(), 2));
        }
        if let Some(tangents) = &descriptor.tangents {
            streams.push((A_TANGENT, tangents.as_slice(), 3));
        }

        let vertex_array = backend.create_vertex_array()?;
        let mut owned = Vec::new();
        let (index_buffer, index_type) =
            match upload(backend, program, vertex_array, &streams, &indices, &mut owned) {
                Ok(uploaded) => uploaded,
                Err(e) => {
                    for buffer in owned {
                        backend.delete_buffer(buffer);
                    }
                    backend.delete_vertex_array(vertex_array);
                    log::warn!("failed to load '{}': {}", label, e);
                    return Err(e);
                }
            };
        owned.retain(|b| *b != index_buffer);

        let mut object = SceneObject::new(label, vertex_array, index_buffer, indices.len(), index_type);
        object.attribute_buffers = owned;
        object.diffuse = descriptor.diffuse;
        object.wireframe = descriptor.wireframe;

        log::info!(
            "loaded '{}': {} vertices, {} indices ({:?})",
            label,
            descriptor.vertex_count(),
            indices.len(),
            index_type
        );
        self.add(object);
        self.objects
            .last()
            .ok_or_else(|| LumenError::NotFound(label.to_string()))
    }

    /// Visit every object in insertion order.
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(&SceneObject<B>),
    {
        for object in &self.objects {
            visitor(object);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject<B>> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SceneObject<B>> {
        self.objects.iter_mut()
    }

    /// First object with this label.
    pub fn get(&self, label: &str) -> Option<&SceneObject<B>> {
        self.objects.iter().find(|o| o.label == label)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut SceneObject<B>> {
        self.objects.iter_mut().find(|o| o.label == label)
    }

    /// Delete every GPU resource the graph owns.
    pub fn release(self, backend: &mut B) {
        let count = self.objects.len();
        for object in self.objects {
            object.release(backend);
        }
        log::debug!("released {} scene objects", count);
    }
}

/// Fill `vertex_array` with the attribute streams and an index buffer.
/// Every buffer created is pushed to `owned` as soon as it exists.
fn upload<B: GraphicsBackend>(
    backend: &mut B,
    program: &ShaderProgram<B>,
    vertex_array: B::VertexArray,
    streams: &[(&str, &[f32], u32)],
    indices: &[u32],
    owned: &mut Vec<B::Buffer>,
) -> Result<(B::Buffer, IndexType)> {
    let mut scope = BindScope::new(backend);
    scope.bind_vertex_array(vertex_array)?;

    for &(name, data, components) in streams {
        let Some(slot) = program.attribute(name) else {
            log::debug!("no slot for {}, stream skipped", name);
            continue;
        };
        let buffer = scope.backend().create_buffer()?;
        owned.push(buffer);
        scope.bind_buffer(BufferTarget::Array, buffer)?;
        scope.backend().buffer_data_f32(BufferTarget::Array, data)?;
        scope.backend().enable_vertex_attrib_array(slot)?;
        scope.backend().vertex_attrib_pointer_f32(slot, components)?;
    }

    let index_buffer = scope.backend().create_buffer()?;
    owned.push(index_buffer);
    scope.bind_buffer(BufferTarget::ElementArray, index_buffer)?;

    let index_type = index_type_for(indices);
    match index_type {
        IndexType::U16 => {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            scope.backend().buffer_data_u16(BufferTarget::ElementArray, &narrow)?;
        }
        IndexType::U32 => scope.backend().buffer_data_u32(BufferTarget::ElementArray, indices)?,
    }

    Ok((index_buffer, index_type))
}

/// Narrowest index type that holds every index.
fn index_type_for(indices: &[u32]) -> IndexType {
    if indices.iter().all(|&i| i <= u16::MAX as u32) {
        IndexType::U16
    } else {
        IndexType::U32
    }
}
