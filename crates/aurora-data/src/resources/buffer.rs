// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vertex and index buffers.

use super::{BuildContext, Resource, ResourceBuilder, ResourceError, ResourceType};
use aurora_core::command::{DriverApi, StreamRange};
use aurora_core::driver::{BufferHandle, BufferUsage, IndexType};

/// Maximum number of separate buffers a vertex buffer can be split into.
pub const MAX_VERTEX_BUFFER_COUNT: u8 = 8;

/// The semantic of a vertex attribute.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttribute {
    Position,
    Tangents,
    Color,
    Uv0,
    Uv1,
    BoneIndices,
    BoneWeights,
}

/// The storage type of a vertex attribute.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float2,
    Float3,
    Float4,
    Half4,
    UByte4,
}

impl AttributeType {
    /// Size of one element in bytes.
    pub const fn size(self) -> u32 {
        match self {
            AttributeType::Float2 => 8,
            AttributeType::Float3 => 12,
            AttributeType::Float4 => 16,
            AttributeType::Half4 => 8,
            AttributeType::UByte4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AttributeLayout {
    attribute: VertexAttribute,
    buffer_index: u8,
    ty: AttributeType,
    offset: u32,
    stride: u32,
}

/// Builds a [`VertexBuffer`].
#[derive(Debug, Clone, Default)]
pub struct VertexBufferBuilder {
    vertex_count: u32,
    buffer_count: u8,
    attributes: Vec<AttributeLayout>,
}

impl VertexBufferBuilder {
    /// Number of vertices in every buffer.
    pub fn vertex_count(mut self, count: u32) -> Self {
        self.vertex_count = count;
        self
    }

    /// Number of separate buffers the attributes are spread over.
    pub fn buffer_count(mut self, count: u8) -> Self {
        self.buffer_count = count;
        self
    }

    /// Declares an attribute stored in buffer `buffer_index`.
    ///
    /// A `stride` of zero means the attribute is tightly packed.
    pub fn attribute(
        mut self,
        attribute: VertexAttribute,
        buffer_index: u8,
        ty: AttributeType,
        offset: u32,
        stride: u32,
    ) -> Self {
        self.attributes.push(AttributeLayout {
            attribute,
            buffer_index,
            ty,
            offset,
            stride,
        });
        self
    }
}

impl ResourceBuilder for VertexBufferBuilder {
    type Output = VertexBuffer;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<VertexBuffer, ResourceError> {
        let kind = ResourceType::VertexBuffer;
        if self.vertex_count == 0 {
            return Err(ResourceError::invalid(kind, "vertex count must be non-zero"));
        }
        if self.buffer_count == 0 || self.buffer_count > MAX_VERTEX_BUFFER_COUNT {
            return Err(ResourceError::invalid(
                kind,
                format!(
                    "buffer count {} outside of 1..={}",
                    self.buffer_count, MAX_VERTEX_BUFFER_COUNT
                ),
            ));
        }

        let mut strides = vec![0u32; self.buffer_count as usize];
        for (i, layout) in self.attributes.iter().enumerate() {
            if layout.buffer_index >= self.buffer_count {
                return Err(ResourceError::invalid(
                    kind,
                    format!(
                        "{:?} stored in buffer {} of {}",
                        layout.attribute, layout.buffer_index, self.buffer_count
                    ),
                ));
            }
            if self.attributes[..i]
                .iter()
                .any(|other| other.attribute == layout.attribute)
            {
                return Err(ResourceError::invalid(
                    kind,
                    format!("{:?} declared twice", layout.attribute),
                ));
            }
            let stride = if layout.stride == 0 {
                layout.offset + layout.ty.size()
            } else {
                layout.stride
            };
            let slot = &mut strides[layout.buffer_index as usize];
            *slot = (*slot).max(stride);
        }
        if let Some(empty) = strides.iter().position(|&stride| stride == 0) {
            return Err(ResourceError::invalid(
                kind,
                format!("buffer {} has no attribute", empty),
            ));
        }

        let buffers = strides
            .iter()
            .map(|&stride| {
                let size = stride * self.vertex_count;
                (ctx.driver.create_buffer(BufferUsage::Vertex, size), size)
            })
            .collect();

        Ok(VertexBuffer {
            vertex_count: self.vertex_count,
            attributes: self.attributes,
            buffers,
        })
    }
}

/// Per-vertex data split over one or more GPU buffers.
#[derive(Debug)]
pub struct VertexBuffer {
    vertex_count: u32,
    attributes: Vec<AttributeLayout>,
    buffers: Vec<(BufferHandle, u32)>,
}

impl VertexBuffer {
    /// Starts building a vertex buffer.
    pub fn builder() -> VertexBufferBuilder {
        VertexBufferBuilder::default()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Number of GPU buffers.
    pub fn buffer_count(&self) -> u8 {
        self.buffers.len() as u8
    }

    /// Returns `true` if the attribute was declared.
    pub fn has_attribute(&self, attribute: VertexAttribute) -> bool {
        self.attributes.iter().any(|a| a.attribute == attribute)
    }

    /// The GPU buffers, in slot order.
    pub fn hw_buffers(&self) -> Vec<BufferHandle> {
        self.buffers.iter().map(|&(handle, _)| handle).collect()
    }

    /// Uploads `data` into buffer `index` at `byte_offset`.
    pub fn set_buffer_at(
        &self,
        driver: &mut DriverApi,
        index: u8,
        data: &[u8],
        byte_offset: u32,
    ) -> Result<(), ResourceError> {
        let &(handle, size) = self.buffers.get(index as usize).ok_or_else(|| {
            ResourceError::invalid(
                ResourceType::VertexBuffer,
                format!("buffer index {} out of {}", index, self.buffers.len()),
            )
        })?;
        if byte_offset as usize + data.len() > size as usize {
            return Err(ResourceError::invalid(
                ResourceType::VertexBuffer,
                format!(
                    "{} bytes at offset {} overflow a {} byte buffer",
                    data.len(),
                    byte_offset,
                    size
                ),
            ));
        }
        driver.update_buffer(handle, byte_offset, data);
        Ok(())
    }
}

impl Resource for VertexBuffer {
    const TYPE: ResourceType = ResourceType::VertexBuffer;

    fn terminate(&mut self, driver: &mut DriverApi) {
        for (handle, _) in self.buffers.drain(..) {
            driver.destroy_buffer(handle);
        }
    }
}

impl_managed!(VertexBuffer, vertex_buffers);

/// Builds an [`IndexBuffer`].
#[derive(Debug, Clone, Default)]
pub struct IndexBufferBuilder {
    index_count: u32,
    index_type: IndexType,
}

impl IndexBufferBuilder {
    /// Number of indices.
    pub fn index_count(mut self, count: u32) -> Self {
        self.index_count = count;
        self
    }

    /// Width of the indices.
    pub fn index_type(mut self, ty: IndexType) -> Self {
        self.index_type = ty;
        self
    }
}

impl ResourceBuilder for IndexBufferBuilder {
    type Output = IndexBuffer;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<IndexBuffer, ResourceError> {
        if self.index_count == 0 {
            return Err(ResourceError::invalid(
                ResourceType::IndexBuffer,
                "index count must be non-zero",
            ));
        }
        let size = self.index_count * self.index_type.size();
        Ok(IndexBuffer {
            index_count: self.index_count,
            index_type: self.index_type,
            buffer: ctx.driver.create_buffer(BufferUsage::Index, size),
        })
    }
}

/// Primitive indices stored in one GPU buffer.
#[derive(Debug)]
pub struct IndexBuffer {
    index_count: u32,
    index_type: IndexType,
    buffer: BufferHandle,
}

impl IndexBuffer {
    /// Starts building an index buffer.
    pub fn builder() -> IndexBufferBuilder {
        IndexBufferBuilder::default()
    }

    /// Number of indices.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Width of the indices.
    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// The GPU buffer.
    pub fn hw_buffer(&self) -> BufferHandle {
        self.buffer
    }

    fn check_range(&self, len: usize, byte_offset: u32) -> Result<(), ResourceError> {
        let size = (self.index_count * self.index_type.size()) as usize;
        if byte_offset as usize + len > size {
            return Err(ResourceError::invalid(
                ResourceType::IndexBuffer,
                format!(
                    "{} bytes at offset {} overflow a {} byte buffer",
                    len, byte_offset, size
                ),
            ));
        }
        Ok(())
    }

    /// Uploads `data` at `byte_offset`.
    pub fn set_buffer(
        &self,
        driver: &mut DriverApi,
        data: &[u8],
        byte_offset: u32,
    ) -> Result<(), ResourceError> {
        self.check_range(data.len(), byte_offset)?;
        driver.update_buffer(self.buffer, byte_offset, data);
        Ok(())
    }

    /// Uploads bytes already written into the command stream.
    pub fn set_buffer_range(
        &self,
        driver: &mut DriverApi,
        range: StreamRange,
        byte_offset: u32,
    ) -> Result<(), ResourceError> {
        self.check_range(range.len as usize, byte_offset)?;
        driver.update_buffer_range(self.buffer, byte_offset, range);
        Ok(())
    }
}

impl Resource for IndexBuffer {
    const TYPE: ResourceType = ResourceType::IndexBuffer;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_buffer(self.buffer);
    }
}

impl_managed!(IndexBuffer, index_buffers);
