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

use super::{Engine, ExecutionContext};
use crate::driver_thread;
use aurora_data::ecs::ComponentManager;
use aurora_data::resources::{
    Fence, IndexBuffer, IndirectLight, Managed, Material, MaterialInstance, RenderTarget,
    Renderer, Scene, Skybox, Stream, SwapChain, Texture, VertexBuffer, View,
};

impl Engine {
    /// Tears the engine down. Runs at most once.
    ///
    /// Dependents are always released before what they depend on, so the
    /// order of the steps below matters.
    pub(super) fn shutdown(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        log::debug!("{} shutting down.", self.id);

        // Subsystems other resources may reference.
        self.post_process.terminate(&mut self.driver_api);
        self.dfg.terminate(&mut self.driver_api);
        self.renderables.terminate();
        self.release_render_primitives();
        self.lights.terminate();
        self.transforms.terminate();
        self.cameras.terminate();

        // Built-ins.
        if let Some(builtins) = self.builtins.take() {
            self.driver_api
                .destroy_render_primitive(builtins.fullscreen_primitive);
            self.destroy_builtin(builtins.fullscreen_vertices);
            self.destroy_builtin(builtins.fullscreen_indices);
            self.destroy_builtin(builtins.default_ibl);
            self.destroy_builtin(builtins.default_ibl_texture);
            self.destroy_builtin(builtins.default_material);
        }

        // Whatever the client leaked.
        self.cleanup_resource_list::<Renderer>();
        self.cleanup_resource_list::<View>();
        self.cleanup_resource_list::<Scene>();
        self.cleanup_resource_list::<Skybox>();
        if let Some(material) = self.lists.take_skybox_material() {
            self.destroy_builtin(material);
        }
        self.cleanup_resource_list::<IndexBuffer>();
        self.cleanup_resource_list::<VertexBuffer>();
        self.cleanup_resource_list::<IndirectLight>();
        self.cleanup_resource_list::<Texture>();
        self.cleanup_resource_list::<RenderTarget>();
        self.cleanup_resource_list::<Stream>();
        self.cleanup_resource_list::<SwapChain>();
        self.cleanup_resource_list::<MaterialInstance>();
        self.cleanup_resource_list::<Material>();
        self.cleanup_resource_list::<Fence>();

        // Run everything recorded above, then stop the driver.
        self.driver_api.flush();
        log::debug!(
            "{} command queue high watermark: {} of {} bytes.",
            self.id,
            self.driver_api.queue().high_watermark(),
            self.driver_api.queue().capacity()
        );
        match &mut self.context {
            ExecutionContext::Threaded(thread) => thread.stop(),
            ExecutionContext::Inline(slot) => {
                if let Some(mut executor) = slot.take() {
                    while driver_thread::execute(self.driver_api.queue(), &mut executor) {}
                    executor.terminate();
                }
            }
        }

        self.jobs.emancipate();
        log::debug!("{} terminated.", self.id);
    }

    // Built-ins may still have dependents, for example instances of the
    // default material; those are reclaimed by the leak sweep instead.
    fn destroy_builtin<R: Managed>(&mut self, handle: aurora_data::Handle<R>) {
        if !self.lists.contains(handle) {
            return;
        }
        if let Err(err) = self.destroy_resource(handle) {
            log::debug!("deferring built-in {}: {}", handle, err);
        }
    }

    fn cleanup_resource_list<R: Managed>(&mut self) {
        let leaked = self.lists.take_all::<R>();
        if leaked.is_empty() {
            return;
        }
        #[cfg(debug_assertions)]
        log::debug!("cleaning up {} leaked {}", leaked.len(), R::TYPE);
        for (_, resource) in leaked {
            self.terminate_and_destroy(resource);
        }
    }
}
