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

//! Plain descriptors passed to driver creation calls.

use super::handles::{BufferHandle, TextureHandle};
use serde::{Deserialize, Serialize};

/// What a GPU buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BufferUsage {
    /// Per-vertex attribute data.
    Vertex,
    /// Primitive indices.
    Index,
    /// Shader uniforms.
    Uniform,
}

/// The width of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    /// 16-bit unsigned indices.
    #[default]
    U16,
    /// 32-bit unsigned indices.
    U32,
}

impl IndexType {
    /// Size of one index in bytes.
    pub const fn size(self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// Independent points.
    Points,
    /// Independent line segments.
    Lines,
    /// Independent triangles.
    #[default]
    Triangles,
}

/// Pixel formats understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit normalized RGBA.
    #[default]
    Rgba8,
    /// 16-bit float RGBA.
    Rgba16F,
    /// 16-bit float RG.
    Rg16F,
    /// 24-bit depth.
    Depth24,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub const fn texel_size(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::Rgba16F => 8,
            TextureFormat::Rg16F => 4,
            TextureFormat::Depth24 => 4,
        }
    }
}

/// The sampler dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SamplerType {
    /// A 2D texture.
    #[default]
    Sampler2D,
    /// A cubemap with six faces.
    Cubemap,
}

/// Everything a driver needs to allocate a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureInfo {
    /// Dimensionality.
    pub sampler: SamplerType,
    /// Texel format.
    pub format: TextureFormat,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Number of mip levels.
    pub levels: u8,
}

/// Buffers bound into a render primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPrimitiveInfo {
    /// One buffer per vertex buffer slot.
    pub vertex_buffers: Vec<BufferHandle>,
    /// The index buffer.
    pub index_buffer: BufferHandle,
    /// Width of the indices in `index_buffer`.
    pub index_type: IndexType,
    /// Primitive assembly mode.
    pub primitive_type: PrimitiveType,
    /// First index to draw.
    pub offset: u32,
    /// Number of indices to draw.
    pub count: u32,
}

/// Attachments of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderTargetInfo {
    /// Color attachment.
    pub color: Option<TextureHandle>,
    /// Depth attachment.
    pub depth: Option<TextureHandle>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}
