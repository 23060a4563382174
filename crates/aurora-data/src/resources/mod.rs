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

//! Engine-managed resources and the lists that own them.
//!
//! Creating a resource is a two-phase protocol. A [`ResourceBuilder`] first
//! validates its parameters and constructs the resource, recording the
//! creation of its driver-side objects on the way. The engine then moves the
//! result into the [`ResourceList`] of its kind, which owns it until it is
//! destroyed. Destruction runs in the opposite order: remove from the list,
//! [`Resource::terminate`] to release driver-side objects, then free.

// Implements `Managed` for a resource stored in the given `ResourceLists` field.
macro_rules! impl_managed {
    ($ty:ty, $field:ident) => {
        impl $crate::resources::Managed for $ty {
            fn list(lists: &$crate::resources::ResourceLists) -> &$crate::resources::ResourceList<Self> {
                &lists.$field
            }

            fn list_mut(
                lists: &mut $crate::resources::ResourceLists,
            ) -> &mut $crate::resources::ResourceList<Self> {
                &mut lists.$field
            }
        }
    };
}

mod buffer;
mod error;
mod fence;
mod handle;
mod list;
mod material;
mod scene;
mod target;
mod texture;

pub use buffer::{
    AttributeType, IndexBuffer, IndexBufferBuilder, VertexAttribute, VertexBuffer,
    VertexBufferBuilder, MAX_VERTEX_BUFFER_COUNT,
};
pub use error::ResourceError;
pub use fence::{Fence, FenceBuilder, FenceSignal, FenceStatus};
pub use handle::Handle;
pub use list::ResourceList;
pub use material::{
    Material, MaterialBuilder, MaterialInstance, MaterialInstanceBuilder, MaterialPackage,
    MaterialParameter,
};
pub use scene::{
    Renderer, RendererBuilder, Scene, SceneBuilder, Skybox, SkyboxBuilder, View, ViewBuilder,
    Viewport,
};
pub use target::{
    RenderTarget, RenderTargetBuilder, Stream, StreamBuilder, SwapChain, SwapChainBuilder,
};
pub use texture::{IndirectLight, IndirectLightBuilder, Texture, TextureBuilder};

use crate::allocators::HeapAllocator;
use aurora_core::command::DriverApi;
use std::collections::HashMap;
use std::fmt;

/// Every kind of resource the engine manages.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    VertexBuffer,
    IndexBuffer,
    Texture,
    IndirectLight,
    Material,
    MaterialInstance,
    Skybox,
    Stream,
    RenderTarget,
    Renderer,
    View,
    Scene,
    Fence,
    SwapChain,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An object owned by the engine on behalf of the client.
pub trait Resource: 'static {
    /// The kind of this resource, used in diagnostics.
    const TYPE: ResourceType;

    /// Records the destruction of every driver-side object of this resource.
    ///
    /// Called exactly once, after the resource left its list and before it is
    /// freed.
    fn terminate(&mut self, driver: &mut DriverApi);
}

/// The validation and construction phase of resource creation.
pub trait ResourceBuilder {
    /// The resource this builder produces.
    type Output: Managed;

    /// Validates the builder parameters and constructs the resource.
    ///
    /// ## Arguments
    /// * `ctx` - Gives access to the driver API and to already registered resources.
    ///
    /// ## Returns
    /// The resource, not yet registered, or the reason it cannot be built.
    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Self::Output, ResourceError>;
}

/// A [`Resource`] that has a list in [`ResourceLists`].
///
/// The hooks let a kind keep indices over other kinds consistent, and refuse
/// its own destruction while dependents are alive.
pub trait Managed: Resource + Sized {
    /// The list owning resources of this kind.
    fn list(lists: &ResourceLists) -> &ResourceList<Self>;

    /// The list owning resources of this kind.
    fn list_mut(lists: &mut ResourceLists) -> &mut ResourceList<Self>;

    /// Refuses destruction while dependents are still registered.
    fn check_destroy(_lists: &ResourceLists, _handle: Handle<Self>) -> Result<(), ResourceError> {
        Ok(())
    }

    /// Called right after the resource was inserted.
    fn on_registered(_lists: &mut ResourceLists, _handle: Handle<Self>) {}

    /// Called right after the resource was removed.
    fn on_unregistered(_lists: &mut ResourceLists, _handle: Handle<Self>, _resource: &Self) {}
}

/// One [`ResourceList`] per resource kind, plus the cross-kind indices.
#[derive(Debug, Default)]
pub struct ResourceLists {
    pub(crate) vertex_buffers: ResourceList<VertexBuffer>,
    pub(crate) index_buffers: ResourceList<IndexBuffer>,
    pub(crate) textures: ResourceList<Texture>,
    pub(crate) indirect_lights: ResourceList<IndirectLight>,
    pub(crate) materials: ResourceList<Material>,
    pub(crate) material_instances: ResourceList<MaterialInstance>,
    pub(crate) skyboxes: ResourceList<Skybox>,
    pub(crate) streams: ResourceList<Stream>,
    pub(crate) render_targets: ResourceList<RenderTarget>,
    pub(crate) renderers: ResourceList<Renderer>,
    pub(crate) views: ResourceList<View>,
    pub(crate) scenes: ResourceList<Scene>,
    pub(crate) fences: ResourceList<Fence>,
    pub(crate) swap_chains: ResourceList<SwapChain>,
    pub(crate) instances_by_material: HashMap<Handle<Material>, Vec<Handle<MaterialInstance>>>,
    pub(crate) skybox_material: Option<Handle<Material>>,
}

impl ResourceLists {
    /// Creates empty lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a constructed resource.
    pub fn insert<R: Managed>(&mut self, resource: Box<R>) -> Handle<R> {
        let handle = R::list_mut(self).insert(resource);
        R::on_registered(self, handle);
        handle
    }

    /// Removes a resource and hands its ownership back, or `None` if absent.
    pub fn remove<R: Managed>(&mut self, handle: Handle<R>) -> Option<Box<R>> {
        let resource = R::list_mut(self).remove(handle)?;
        R::on_unregistered(self, handle, &resource);
        Some(resource)
    }

    /// Empties the list of `R` and returns everything it owned.
    pub fn take_all<R: Managed>(&mut self) -> Vec<(Handle<R>, Box<R>)> {
        let taken = R::list_mut(self).take_all();
        for (handle, resource) in &taken {
            R::on_unregistered(self, *handle, resource);
        }
        taken
    }

    /// Runs the destruction precondition of `R`.
    pub fn check_destroy<R: Managed>(&self, handle: Handle<R>) -> Result<(), ResourceError> {
        R::check_destroy(self, handle)
    }

    /// Borrows a live resource.
    pub fn get<R: Managed>(&self, handle: Handle<R>) -> Option<&R> {
        R::list(self).get(handle)
    }

    /// Mutably borrows a live resource.
    pub fn get_mut<R: Managed>(&mut self, handle: Handle<R>) -> Option<&mut R> {
        R::list_mut(self).get_mut(handle)
    }

    /// Returns `true` if `handle` refers to a live resource.
    pub fn contains<R: Managed>(&self, handle: Handle<R>) -> bool {
        R::list(self).contains(handle)
    }

    /// Number of live resources of kind `R`.
    pub fn len<R: Managed>(&self) -> usize {
        R::list(self).len()
    }

    /// Looks up a live resource, or fails with [`ResourceError::UnknownResource`].
    pub fn require<R: Managed>(&self, handle: Handle<R>) -> Result<&R, ResourceError> {
        self.get(handle)
            .ok_or(ResourceError::UnknownResource { kind: R::TYPE })
    }

    /// Instances currently registered for `material`.
    pub fn instances_of(&self, material: Handle<Material>) -> &[Handle<MaterialInstance>] {
        self.instances_by_material
            .get(&material)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates over every live material.
    pub fn materials_mut(&mut self) -> impl Iterator<Item = (Handle<Material>, &mut Material)> {
        self.materials.iter_mut()
    }

    /// Iterates over every live material instance.
    pub fn material_instances_mut(
        &mut self,
    ) -> impl Iterator<Item = (Handle<MaterialInstance>, &mut MaterialInstance)> {
        self.material_instances.iter_mut()
    }

    /// The skybox material, if a skybox was ever built.
    pub fn skybox_material(&self) -> Option<Handle<Material>> {
        self.skybox_material
    }

    /// Forgets the skybox material so it can be destroyed.
    pub fn take_skybox_material(&mut self) -> Option<Handle<Material>> {
        self.skybox_material.take()
    }

    /// Total number of live resources across all kinds.
    pub fn total_len(&self) -> usize {
        self.vertex_buffers.len()
            + self.index_buffers.len()
            + self.textures.len()
            + self.indirect_lights.len()
            + self.materials.len()
            + self.material_instances.len()
            + self.skyboxes.len()
            + self.streams.len()
            + self.render_targets.len()
            + self.renderers.len()
            + self.views.len()
            + self.scenes.len()
            + self.fences.len()
            + self.swap_chains.len()
    }
}

/// What a [`ResourceBuilder`] may use while constructing a resource.
pub struct BuildContext<'a> {
    /// Records driver-side object creation.
    pub driver: &'a mut DriverApi,
    /// Already registered resources, for validating references.
    pub lists: &'a mut ResourceLists,
    /// The allocator of the engine, for resources created on the side.
    pub heap: &'a HeapAllocator,
}

impl<'a> BuildContext<'a> {
    /// Bundles the state a builder may use.
    pub fn new(
        driver: &'a mut DriverApi,
        lists: &'a mut ResourceLists,
        heap: &'a HeapAllocator,
    ) -> Self {
        Self {
            driver,
            lists,
            heap,
        }
    }

    /// Builds a resource and registers it.
    pub fn create<B: ResourceBuilder>(
        &mut self,
        builder: B,
    ) -> Result<Handle<B::Output>, ResourceError> {
        let resource = builder.build(self)?;
        Ok(self.lists.insert(self.heap.make(resource)))
    }

    /// The material shared by every skybox, created on first use.
    pub fn skybox_material(&mut self) -> Result<Handle<Material>, ResourceError> {
        if let Some(material) = self.lists.skybox_material {
            if self.lists.contains(material) {
                return Ok(material);
            }
        }
        let material = self.create(Material::builder(MaterialPackage::skybox()))?;
        self.lists.skybox_material = Some(material);
        Ok(material)
    }
}
