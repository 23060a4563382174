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

use crate::ecs::{ComponentManager, ComponentStore, EntityManager};
use crate::resources::{
    Handle, IndexBuffer, MaterialInstance, ResourceError, ResourceLists, ResourceType,
    VertexBuffer,
};
use aurora_core::command::DriverApi;
use aurora_core::driver::{PrimitiveType, RenderPrimitiveHandle, RenderPrimitiveInfo};
use aurora_core::Entity;

/// Axis aligned bounds as a center and half extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Center of the box.
    pub center: [f32; 3],
    /// Half size along each axis.
    pub half_extent: [f32; 3],
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            center: [0.0; 3],
            half_extent: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GeometryDesc {
    primitive_type: PrimitiveType,
    vertices: Handle<VertexBuffer>,
    indices: Handle<IndexBuffer>,
    range: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, Default)]
struct PrimitiveDesc {
    geometry: Option<GeometryDesc>,
    material: Option<Handle<MaterialInstance>>,
}

/// One draw of a [`Renderable`].
#[derive(Debug, Clone, Copy)]
pub struct RenderPrimitive {
    /// The driver-side primitive.
    pub hw: RenderPrimitiveHandle,
    /// Vertex data.
    pub vertices: Handle<VertexBuffer>,
    /// Index data.
    pub indices: Handle<IndexBuffer>,
    /// The material instance drawn with, if any.
    pub material: Option<Handle<MaterialInstance>>,
}

/// Builds a [`Renderable`] from already registered geometry and materials.
#[derive(Debug, Clone)]
pub struct RenderableBuilder {
    primitives: Vec<PrimitiveDesc>,
    bounding_box: BoundingBox,
    cast_shadows: bool,
    receive_shadows: bool,
    culling: bool,
    priority: u8,
}

impl RenderableBuilder {
    /// Starts a renderable made of `count` primitives.
    pub fn new(count: usize) -> Self {
        Self {
            primitives: vec![PrimitiveDesc::default(); count],
            bounding_box: BoundingBox::default(),
            cast_shadows: false,
            receive_shadows: true,
            culling: true,
            priority: 4,
        }
    }

    /// Sets the geometry of primitive `index`, drawing every index.
    pub fn geometry(
        self,
        index: usize,
        primitive_type: PrimitiveType,
        vertices: Handle<VertexBuffer>,
        indices: Handle<IndexBuffer>,
    ) -> Self {
        self.set_geometry(index, primitive_type, vertices, indices, None)
    }

    /// Sets the geometry of primitive `index`, drawing `count` indices from `offset`.
    pub fn geometry_range(
        self,
        index: usize,
        primitive_type: PrimitiveType,
        vertices: Handle<VertexBuffer>,
        indices: Handle<IndexBuffer>,
        offset: u32,
        count: u32,
    ) -> Self {
        self.set_geometry(index, primitive_type, vertices, indices, Some((offset, count)))
    }

    fn set_geometry(
        mut self,
        index: usize,
        primitive_type: PrimitiveType,
        vertices: Handle<VertexBuffer>,
        indices: Handle<IndexBuffer>,
        range: Option<(u32, u32)>,
    ) -> Self {
        if let Some(primitive) = self.primitives.get_mut(index) {
            primitive.geometry = Some(GeometryDesc {
                primitive_type,
                vertices,
                indices,
                range,
            });
        } else {
            log::warn!(
                "renderable primitive {} out of {}, ignored",
                index,
                self.primitives.len()
            );
        }
        self
    }

    /// Sets the material of primitive `index`.
    pub fn material(mut self, index: usize, instance: Handle<MaterialInstance>) -> Self {
        if let Some(primitive) = self.primitives.get_mut(index) {
            primitive.material = Some(instance);
        } else {
            log::warn!(
                "renderable primitive {} out of {}, ignored",
                index,
                self.primitives.len()
            );
        }
        self
    }

    /// Bounds used for culling.
    pub fn bounding_box(mut self, bounds: BoundingBox) -> Self {
        self.bounding_box = bounds;
        self
    }

    /// Whether the renderable casts shadows.
    pub fn cast_shadows(mut self, enable: bool) -> Self {
        self.cast_shadows = enable;
        self
    }

    /// Whether the renderable receives shadows.
    pub fn receive_shadows(mut self, enable: bool) -> Self {
        self.receive_shadows = enable;
        self
    }

    /// Whether frustum culling applies.
    pub fn culling(mut self, enable: bool) -> Self {
        self.culling = enable;
        self
    }

    /// Draw order priority, clamped to `0..=7`.
    pub fn priority(mut self, priority: u8) -> Self {
        self.priority = priority.min(7);
        self
    }

    /// Validates every reference and records the creation of the primitives.
    pub fn build(
        self,
        lists: &ResourceLists,
        driver: &mut DriverApi,
    ) -> Result<Renderable, ResourceError> {
        let invalid = |reason: String| ResourceError::InvalidArgument {
            kind: ResourceType::VertexBuffer,
            reason,
        };

        let mut infos = Vec::with_capacity(self.primitives.len());
        for (index, primitive) in self.primitives.iter().enumerate() {
            let geometry = primitive
                .geometry
                .ok_or_else(|| invalid(format!("primitive {index} has no geometry")))?;
            let vertices = lists.require(geometry.vertices)?;
            let indices = lists.require(geometry.indices)?;
            let (offset, count) = geometry.range.unwrap_or((0, indices.index_count()));
            let in_range = offset
                .checked_add(count)
                .is_some_and(|end| end <= indices.index_count());
            if !in_range {
                return Err(invalid(format!(
                    "primitive {index} draws {offset}+{count} of {} indices",
                    indices.index_count()
                )));
            }
            if let Some(material) = primitive.material {
                lists.require(material)?;
            }
            infos.push(RenderPrimitiveInfo {
                vertex_buffers: vertices.hw_buffers(),
                index_buffer: indices.hw_buffer(),
                index_type: indices.index_type(),
                primitive_type: geometry.primitive_type,
                offset,
                count,
            });
        }

        let primitives = self
            .primitives
            .iter()
            .zip(infos)
            .filter_map(|(desc, info)| {
                let geometry = desc.geometry?;
                Some(RenderPrimitive {
                    hw: driver.create_render_primitive(info),
                    vertices: geometry.vertices,
                    indices: geometry.indices,
                    material: desc.material,
                })
            })
            .collect();

        Ok(Renderable {
            primitives,
            bounding_box: self.bounding_box,
            cast_shadows: self.cast_shadows,
            receive_shadows: self.receive_shadows,
            culling: self.culling,
            priority: self.priority,
        })
    }
}

/// Drawable geometry attached to an entity.
#[derive(Debug, Clone)]
pub struct Renderable {
    primitives: Vec<RenderPrimitive>,
    /// Bounds used for culling.
    pub bounding_box: BoundingBox,
    /// Whether the renderable casts shadows.
    pub cast_shadows: bool,
    /// Whether the renderable receives shadows.
    pub receive_shadows: bool,
    /// Whether frustum culling applies.
    pub culling: bool,
    /// Draw order priority.
    pub priority: u8,
}

impl Renderable {
    /// The primitives, in builder order.
    pub fn primitives(&self) -> &[RenderPrimitive] {
        &self.primitives
    }
}

/// Owns the renderables of every entity.
///
/// Removing a renderable does not talk to the driver: the primitives it held
/// are parked until the engine collects them with
/// [`drain_released`](Self::drain_released) and records their destruction.
/// This keeps [`ComponentManager::gc`] free of driver access.
#[derive(Debug, Default)]
pub struct RenderableManager {
    store: ComponentStore<Renderable>,
    released: Vec<RenderPrimitiveHandle>,
}

impl RenderableManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a renderable to `entity`, releasing the one it replaces.
    pub fn insert(&mut self, entity: Entity, renderable: Renderable) {
        if let Some(previous) = self.store.insert(entity, renderable) {
            self.release(previous);
        }
    }

    /// Borrows the renderable of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&Renderable> {
        self.store.get(entity)
    }

    /// Changes the material of one primitive. Returns `false` if there is no such primitive.
    pub fn set_material_at(
        &mut self,
        entity: Entity,
        index: usize,
        instance: Handle<MaterialInstance>,
    ) -> bool {
        match self
            .store
            .get_mut(entity)
            .and_then(|r| r.primitives.get_mut(index))
        {
            Some(primitive) => {
                primitive.material = Some(instance);
                true
            }
            None => false,
        }
    }

    /// Takes the primitives released since the last call.
    pub fn drain_released(&mut self) -> Vec<RenderPrimitiveHandle> {
        std::mem::take(&mut self.released)
    }

    fn release(&mut self, renderable: Renderable) {
        self.released
            .extend(renderable.primitives.iter().map(|p| p.hw));
    }
}

impl ComponentManager for RenderableManager {
    fn name(&self) -> &'static str {
        "renderable"
    }

    fn has_component(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    fn component_count(&self) -> usize {
        self.store.len()
    }

    fn destroy(&mut self, entity: Entity) -> bool {
        match self.store.remove(entity) {
            Some(renderable) => {
                self.release(renderable);
                true
            }
            None => false,
        }
    }

    fn gc(&mut self, entities: &EntityManager) -> usize {
        let removed = self.store.retain_alive(entities);
        let count = removed.len();
        for (_, renderable) in removed {
            self.release(renderable);
        }
        count
    }

    fn terminate(&mut self) {
        for (_, renderable) in self.store.drain() {
            self.release(renderable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::HeapAllocator;
    use crate::resources::{AttributeType, BuildContext, VertexAttribute};
    use aurora_core::command::{CallbackTable, CommandBufferQueue, CommandStream};
    use aurora_core::driver::IndexType;
    use std::sync::Arc;

    fn geometry(
        driver: &mut DriverApi,
        lists: &mut ResourceLists,
    ) -> (Handle<VertexBuffer>, Handle<IndexBuffer>) {
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(driver, lists, &heap);
        let vb = ctx
            .create(
                VertexBuffer::builder()
                    .vertex_count(3)
                    .buffer_count(1)
                    .attribute(VertexAttribute::Position, 0, AttributeType::Float3, 0, 0),
            )
            .unwrap();
        let ib = ctx
            .create(IndexBuffer::builder().index_count(3).index_type(IndexType::U16))
            .unwrap();
        (vb, ib)
    }

    #[test]
    fn test_gc_releases_primitives_of_dead_entities() {
        let queue = Arc::new(CommandBufferQueue::single_threaded(1024, 64 * 1024));
        let mut driver = CommandStream::new(queue, Arc::new(CallbackTable::new()));
        let mut lists = ResourceLists::new();
        let (vb, ib) = geometry(&mut driver, &mut lists);
        let mut entities = EntityManager::new();
        let entity = entities.create();
        let mut renderables = RenderableManager::new();

        let renderable = RenderableBuilder::new(2)
            .geometry(0, PrimitiveType::Triangles, vb, ib)
            .geometry_range(1, PrimitiveType::Lines, vb, ib, 1, 2)
            .build(&lists, &mut driver)
            .unwrap();
        renderables.insert(entity, renderable);
        entities.destroy(entity);

        assert_eq!(renderables.gc(&entities), 1);
        assert_eq!(renderables.drain_released().len(), 2);
        assert!(renderables.drain_released().is_empty());
    }

    #[test]
    fn test_build_rejects_missing_geometry_and_bad_range() {
        let queue = Arc::new(CommandBufferQueue::single_threaded(1024, 64 * 1024));
        let mut driver = CommandStream::new(queue, Arc::new(CallbackTable::new()));
        let mut lists = ResourceLists::new();
        let (vb, ib) = geometry(&mut driver, &mut lists);

        assert!(RenderableBuilder::new(1).build(&lists, &mut driver).is_err());
        let out_of_range = RenderableBuilder::new(1)
            .geometry_range(0, PrimitiveType::Triangles, vb, ib, 2, 2)
            .build(&lists, &mut driver);
        assert!(matches!(
            out_of_range,
            Err(ResourceError::InvalidArgument { .. })
        ));
    }
}
