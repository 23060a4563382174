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

use aurora_core::command::DriverApi;
use aurora_core::driver::{
    IndexType, PrimitiveType, RenderPrimitiveHandle, RenderPrimitiveInfo, SamplerType,
};
use aurora_data::resources::{
    AttributeType, BuildContext, Handle, IndexBuffer, IndirectLight, Material, MaterialPackage,
    Texture, VertexAttribute, VertexBuffer,
};
use aurora_data::{HeapAllocator, ResourceError, ResourceLists};

// A triangle covering the whole viewport once clipped.
const FULLSCREEN_TRIANGLE: [[f32; 4]; 3] = [
    [-1.0, -1.0, 1.0, 1.0],
    [3.0, -1.0, 1.0, 1.0],
    [-1.0, 3.0, 1.0, 1.0],
];
const FULLSCREEN_INDICES: [u16; 3] = [0, 1, 2];

/// Resources every engine owns from creation to shutdown.
#[derive(Debug)]
pub(super) struct BuiltIns {
    pub(super) fullscreen_vertices: Handle<VertexBuffer>,
    pub(super) fullscreen_indices: Handle<IndexBuffer>,
    pub(super) fullscreen_primitive: RenderPrimitiveHandle,
    pub(super) default_ibl_texture: Handle<Texture>,
    pub(super) default_ibl: Handle<IndirectLight>,
    pub(super) default_material: Handle<Material>,
}

impl BuiltIns {
    pub(super) fn create(
        driver: &mut DriverApi,
        lists: &mut ResourceLists,
        heap: &HeapAllocator,
    ) -> Result<Self, ResourceError> {
        let mut ctx = BuildContext::new(driver, lists, heap);

        let fullscreen_vertices = ctx.create(
            VertexBuffer::builder()
                .vertex_count(FULLSCREEN_TRIANGLE.len() as u32)
                .buffer_count(1)
                .attribute(VertexAttribute::Position, 0, AttributeType::Float4, 0, 0),
        )?;
        let fullscreen_indices = ctx.create(
            IndexBuffer::builder()
                .index_count(FULLSCREEN_INDICES.len() as u32)
                .index_type(IndexType::U16),
        )?;

        let positions: Vec<u8> = FULLSCREEN_TRIANGLE
            .iter()
            .flatten()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let indices: Vec<u8> = FULLSCREEN_INDICES
            .iter()
            .flat_map(|i| i.to_le_bytes())
            .collect();
        let info = {
            let vb = ctx.lists.require(fullscreen_vertices)?;
            vb.set_buffer_at(ctx.driver, 0, &positions, 0)?;
            let ib = ctx.lists.require(fullscreen_indices)?;
            ib.set_buffer(ctx.driver, &indices, 0)?;
            RenderPrimitiveInfo {
                vertex_buffers: vb.hw_buffers(),
                index_buffer: ib.hw_buffer(),
                index_type: ib.index_type(),
                primitive_type: PrimitiveType::Triangles,
                offset: 0,
                count: ib.index_count(),
            }
        };
        let fullscreen_primitive = ctx.driver.create_render_primitive(info);

        let default_ibl_texture =
            ctx.create(Texture::builder().sampler(SamplerType::Cubemap))?;
        {
            let texture = ctx.lists.require(default_ibl_texture)?;
            let black = vec![0u8; texture.level_size(0)];
            texture.set_image(ctx.driver, 0, &black)?;
        }
        let default_ibl = ctx.create(
            IndirectLight::builder()
                .reflections(default_ibl_texture)
                .intensity(1.0),
        )?;
        let default_material = ctx.create(Material::builder(MaterialPackage::default_material()))?;

        Ok(Self {
            fullscreen_vertices,
            fullscreen_indices,
            fullscreen_primitive,
            default_ibl_texture,
            default_ibl,
            default_material,
        })
    }
}
