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

use super::{execute_inline, Engine, FenceMode};
use crate::EngineError;
use aurora_core::command::DriverApi;
use aurora_data::resources::{
    BuildContext, Fence, FenceStatus, Handle, IndirectLight, Managed, Material, MaterialInstance,
    Resource, ResourceBuilder,
};
use aurora_data::ResourceError;
use std::time::Duration;

impl Engine {
    /// Builds a resource and takes ownership of it.
    ///
    /// ## Errors
    /// Whatever the builder reports. Nothing is registered on failure.
    pub fn create<B: ResourceBuilder>(
        &mut self,
        builder: B,
    ) -> Result<Handle<B::Output>, EngineError> {
        self.assert_valid();
        let mut ctx = BuildContext::new(&mut self.driver_api, &mut self.lists, &self.heap);
        Ok(ctx.create(builder)?)
    }

    /// Destroys a resource and its driver-side objects.
    ///
    /// ## Returns
    /// `Ok(false)` if `handle` does not refer to a live resource, for example
    /// because it was already destroyed.
    ///
    /// ## Errors
    /// [`ResourceError::MaterialInUse`] when destroying a material that still
    /// has instances. Nothing is destroyed in that case.
    pub fn destroy<R: Managed>(&mut self, handle: Handle<R>) -> Result<bool, EngineError> {
        self.assert_valid();
        Ok(self.destroy_resource(handle)?)
    }

    pub(super) fn destroy_resource<R: Managed>(
        &mut self,
        handle: Handle<R>,
    ) -> Result<bool, ResourceError> {
        if !self.lists.contains(handle) {
            log::warn!("object {} {} doesn't exist (destroyed already?)", R::TYPE, handle);
            return Ok(false);
        }
        self.lists.check_destroy(handle)?;
        match self.lists.remove(handle) {
            Some(resource) => {
                self.terminate_and_destroy(resource);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(super) fn terminate_and_destroy<R: Managed>(&mut self, mut resource: Box<R>) {
        resource.terminate(&mut self.driver_api);
        self.heap.destroy(resource);
    }

    /// Borrows a live resource.
    pub fn get<R: Managed>(&self, handle: Handle<R>) -> Option<&R> {
        self.assert_valid();
        self.lists.get(handle)
    }

    /// Runs `f` on a live resource with access to the command stream.
    ///
    /// ## Errors
    /// [`ResourceError::UnknownResource`] if `handle` is not live.
    pub fn update<R: Managed, T>(
        &mut self,
        handle: Handle<R>,
        f: impl FnOnce(&mut R, &mut DriverApi) -> T,
    ) -> Result<T, EngineError> {
        self.assert_valid();
        let resource = self
            .lists
            .get_mut(handle)
            .ok_or(ResourceError::UnknownResource { kind: R::TYPE })?;
        Ok(f(resource, &mut self.driver_api))
    }

    /// Returns `true` if `handle` refers to a live resource of this engine.
    pub fn is_valid_resource<R: Managed>(&self, handle: Handle<R>) -> bool {
        self.assert_valid();
        self.lists.contains(handle)
    }

    /// Number of live resources of kind `R`, built-ins included.
    pub fn resource_count<R: Managed>(&self) -> usize {
        self.assert_valid();
        self.lists.len::<R>()
    }

    /// Instances currently alive for `material`.
    pub fn instances_of(&self, material: Handle<Material>) -> &[Handle<MaterialInstance>] {
        self.assert_valid();
        self.lists.instances_of(material)
    }

    /// The material used when none is assigned.
    pub fn default_material(&self) -> Option<Handle<Material>> {
        self.assert_valid();
        self.builtins.as_ref().map(|b| b.default_material)
    }

    /// The indirect light used by scenes without one.
    pub fn default_indirect_light(&self) -> Option<Handle<IndirectLight>> {
        self.assert_valid();
        self.builtins.as_ref().map(|b| b.default_ibl)
    }

    /// The material shared by skyboxes, once a skybox was created.
    pub fn skybox_material(&self) -> Option<Handle<Material>> {
        self.assert_valid();
        self.lists.skybox_material()
    }

    /// Inserts a fence after the commands recorded so far.
    pub fn create_fence(&mut self) -> Result<Handle<Fence>, EngineError> {
        self.create(Fence::builder())
    }

    /// Waits until the commands before `fence` executed or `timeout` elapses.
    ///
    /// `None` waits forever. In single-threaded mode this never blocks: with
    /// [`FenceMode::Flush`] the pending commands are executed first, then the
    /// current status is returned. [`FenceStatus::Error`] means the driver
    /// thread stopped before reaching the fence.
    pub fn wait_fence(
        &mut self,
        fence: Handle<Fence>,
        mode: FenceMode,
        timeout: Option<Duration>,
    ) -> Result<FenceStatus, EngineError> {
        self.assert_valid();
        let signal = self
            .lists
            .get(fence)
            .map(Fence::signal)
            .ok_or(ResourceError::UnknownResource { kind: Fence::TYPE })?;
        if mode == FenceMode::Flush {
            self.driver_api.flush();
            execute_inline(&mut self.context, self.driver_api.queue());
        }
        let status = self.wait_signal(&signal, timeout);
        if status == FenceStatus::Error {
            log::error!("{} fence {} can no longer be reached.", self.id, fence);
        }
        Ok(status)
    }

    /// Waits on `fence` without timeout, then destroys it.
    pub fn wait_and_destroy_fence(
        &mut self,
        fence: Handle<Fence>,
        mode: FenceMode,
    ) -> Result<FenceStatus, EngineError> {
        let status = self.wait_fence(fence, mode, None)?;
        self.destroy(fence)?;
        Ok(status)
    }
}
