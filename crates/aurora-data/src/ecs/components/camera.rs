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
use aurora_core::Entity;

/// How a camera maps view space to clip space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective with a vertical field of view in degrees.
    Perspective {
        /// Vertical field of view.
        fov_degrees: f32,
        /// Width over height.
        aspect: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
    /// Orthographic with the given half extents.
    Ortho {
        /// Half width of the view volume.
        half_width: f32,
        /// Half height of the view volume.
        half_height: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
}

/// A camera attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// The projection.
    pub projection: Projection,
    /// Lens aperture in f-stops.
    pub aperture: f32,
    /// Shutter speed in seconds.
    pub shutter_speed: f32,
    /// Sensitivity in ISO.
    pub sensitivity: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective {
                fov_degrees: 45.0,
                aspect: 1.0,
                near: 0.1,
                far: 100.0,
            },
            aperture: 16.0,
            shutter_speed: 1.0 / 125.0,
            sensitivity: 100.0,
        }
    }
}

impl Camera {
    /// Sets the exposure parameters.
    pub fn set_exposure(&mut self, aperture: f32, shutter_speed: f32, sensitivity: f32) {
        self.aperture = aperture;
        self.shutter_speed = shutter_speed;
        self.sensitivity = sensitivity;
    }

    /// Exposure value at ISO 100.
    pub fn ev100(&self) -> f32 {
        let a = self.aperture;
        ((a * a) / self.shutter_speed * 100.0 / self.sensitivity).log2()
    }
}

/// Owns the cameras of every entity.
#[derive(Debug, Default)]
pub struct CameraManager {
    store: ComponentStore<Camera>,
}

impl CameraManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a default camera to `entity`, or returns the existing one.
    pub fn create(&mut self, entity: Entity) -> &mut Camera {
        self.store.get_or_insert_with(entity, Camera::default)
    }

    /// Borrows the camera of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&Camera> {
        self.store.get(entity)
    }

    /// Mutably borrows the camera of `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut Camera> {
        self.store.get_mut(entity)
    }
}

impl ComponentManager for CameraManager {
    fn name(&self) -> &'static str {
        "camera"
    }

    fn has_component(&self, entity: Entity) -> bool {
        self.store.contains(entity)
    }

    fn component_count(&self) -> usize {
        self.store.len()
    }

    fn destroy(&mut self, entity: Entity) -> bool {
        self.store.remove(entity).is_some()
    }

    fn gc(&mut self, entities: &EntityManager) -> usize {
        self.store.retain_alive(entities).len()
    }

    fn terminate(&mut self) {
        self.store.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_returns_existing_camera() {
        let mut entities = EntityManager::new();
        let entity = entities.create();
        let mut cameras = CameraManager::new();
        cameras.create(entity).set_exposure(1.0, 1.0, 100.0);

        assert_eq!(cameras.create(entity).aperture, 1.0);
        assert_eq!(cameras.component_count(), 1);
        assert_eq!(cameras.get(entity).unwrap().ev100(), 0.0);
    }
}
