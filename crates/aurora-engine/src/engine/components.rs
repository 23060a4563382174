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

use super::Engine;
use crate::EngineError;
use aurora_core::jobs::RunFlags;
use aurora_core::math::Mat4;
use aurora_core::Entity;
use aurora_data::ecs::{
    Camera, ComponentManager, EntityManager, Light, Renderable, RenderableBuilder,
    TransformManager,
};
use std::sync::atomic::{AtomicUsize, Ordering};

impl Engine {
    /// Creates an entity without components.
    pub fn create_entity(&mut self) -> Entity {
        self.assert_valid();
        self.entities.create()
    }

    /// Destroys an entity and every component attached to it.
    ///
    /// ## Returns
    /// `false` if the entity was already dead.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.assert_valid();
        if !self.entities.destroy(entity) {
            return false;
        }
        self.renderables.destroy(entity);
        self.lights.destroy(entity);
        self.transforms.destroy(entity);
        self.cameras.destroy(entity);
        self.release_render_primitives();
        true
    }

    /// The entity registry.
    pub fn entities(&self) -> &EntityManager {
        self.assert_valid();
        &self.entities
    }

    /// Mutable access to the entity registry.
    ///
    /// Entities destroyed through it keep their components until the next
    /// [`gc`](Self::gc).
    pub fn entities_mut(&mut self) -> &mut EntityManager {
        self.assert_valid();
        &mut self.entities
    }

    /// Attaches a renderable to `entity`, adding an identity transform if it
    /// has none.
    pub fn create_renderable(
        &mut self,
        entity: Entity,
        builder: RenderableBuilder,
    ) -> Result<(), EngineError> {
        self.assert_valid();
        let renderable = builder.build(&self.lists, &mut self.driver_api)?;
        if !self.transforms.has_component(entity) {
            self.transforms.create(entity, None, Mat4::IDENTITY);
        }
        self.renderables.insert(entity, renderable);
        self.release_render_primitives();
        Ok(())
    }

    /// The renderable of `entity`.
    pub fn renderable(&self, entity: Entity) -> Option<&Renderable> {
        self.assert_valid();
        self.renderables.get(entity)
    }

    /// Removes the renderable of `entity`.
    pub fn destroy_renderable(&mut self, entity: Entity) -> bool {
        self.assert_valid();
        let destroyed = self.renderables.destroy(entity);
        self.release_render_primitives();
        destroyed
    }

    /// Attaches a light to `entity`, adding an identity transform if it has none.
    pub fn create_light(&mut self, entity: Entity, light: Light) {
        self.assert_valid();
        if !self.transforms.has_component(entity) {
            self.transforms.create(entity, None, Mat4::IDENTITY);
        }
        self.lights.create(entity, light);
    }

    /// The light of `entity`.
    pub fn light(&self, entity: Entity) -> Option<&Light> {
        self.assert_valid();
        self.lights.get(entity)
    }

    /// Attaches a camera to `entity`, or returns the one it has.
    pub fn create_camera(&mut self, entity: Entity) -> &mut Camera {
        self.assert_valid();
        self.cameras.create(entity)
    }

    /// The camera of `entity`.
    pub fn camera(&self, entity: Entity) -> Option<&Camera> {
        self.assert_valid();
        self.cameras.get(entity)
    }

    /// Removes the camera of `entity`.
    pub fn destroy_camera_component(&mut self, entity: Entity) -> bool {
        self.assert_valid();
        self.cameras.destroy(entity)
    }

    /// Gives `entity` a transform, relative to `parent` if given.
    pub fn create_transform(&mut self, entity: Entity, parent: Option<Entity>, local: Mat4) {
        self.assert_valid();
        self.transforms.create(entity, parent, local);
    }

    /// The transform hierarchy.
    pub fn transforms(&self) -> &TransformManager {
        self.assert_valid();
        &self.transforms
    }

    /// Mutable access to the transform hierarchy.
    pub fn transforms_mut(&mut self) -> &mut TransformManager {
        self.assert_valid();
        &mut self.transforms
    }

    /// Number of components per manager, as `(renderable, light, transform, camera)`.
    pub fn component_counts(&self) -> (usize, usize, usize, usize) {
        self.assert_valid();
        (
            self.renderables.component_count(),
            self.lights.component_count(),
            self.transforms.component_count(),
            self.cameras.component_count(),
        )
    }

    /// Removes every component whose entity is dead.
    ///
    /// The four component managers are swept in parallel on the job system;
    /// this returns once all sweeps are done.
    ///
    /// ## Returns
    /// The number of components removed.
    pub fn gc(&mut self) -> usize {
        self.assert_valid();
        let removed = AtomicUsize::new(0);
        let entities = &self.entities;
        let managers: [&mut dyn ComponentManager; 4] = [
            &mut self.renderables,
            &mut self.lights,
            &mut self.transforms,
            &mut self.cameras,
        ];

        self.jobs.scope(|s| {
            let parent = s.create_job();
            for manager in managers {
                let removed = &removed;
                let child = s.create_child(&parent, move || {
                    let count = manager.gc(entities);
                    if count > 0 {
                        log::trace!("gc removed {} {} component(s)", count, manager.name());
                    }
                    removed.fetch_add(count, Ordering::Relaxed);
                });
                s.run(child, RunFlags::DONT_SIGNAL);
            }
            s.run_and_wait(parent);
        });

        self.release_render_primitives();
        removed.into_inner()
    }

    pub(super) fn release_render_primitives(&mut self) {
        for primitive in self.renderables.drain_released() {
            self.driver_api.destroy_render_primitive(primitive);
        }
    }
}
