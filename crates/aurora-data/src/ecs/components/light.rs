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

/// The kinds of punctual lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// A directional light with a visible sun disk.
    Sun,
    /// A light infinitely far away.
    Directional,
    /// Emits in all directions from a position.
    Point,
    /// Emits in a cone from a position.
    Spot,
}

/// A light attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// The kind of light.
    pub light_type: LightType,
    /// Linear RGB color.
    pub color: [f32; 3],
    /// Lux for directional lights, lumens otherwise.
    pub intensity: f32,
    /// Direction the light points to.
    pub direction: [f32; 3],
    /// Position of point and spot lights.
    pub position: [f32; 3],
    /// Distance at which the light has no effect.
    pub falloff: f32,
    /// Inner and outer cone angles of spot lights, in radians.
    pub spot_cone: (f32, f32),
    /// Whether the light casts shadows.
    pub cast_shadows: bool,
}

/// Builds a [`Light`].
#[derive(Debug, Clone)]
pub struct LightBuilder {
    light: Light,
}

impl LightBuilder {
    /// Starts a light of the given kind.
    pub fn new(light_type: LightType) -> Self {
        Self {
            light: Light {
                light_type,
                color: [1.0, 1.0, 1.0],
                intensity: 100_000.0,
                direction: [0.0, -1.0, 0.0],
                position: [0.0, 0.0, 0.0],
                falloff: 1.0,
                spot_cone: (std::f32::consts::FRAC_PI_4, std::f32::consts::FRAC_PI_4),
                cast_shadows: false,
            },
        }
    }

    /// Linear RGB color.
    pub fn color(mut self, color: [f32; 3]) -> Self {
        self.light.color = color;
        self
    }

    /// Intensity of the light.
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.light.intensity = intensity;
        self
    }

    /// Direction the light points to.
    pub fn direction(mut self, direction: [f32; 3]) -> Self {
        self.light.direction = direction;
        self
    }

    /// Position of point and spot lights.
    pub fn position(mut self, position: [f32; 3]) -> Self {
        self.light.position = position;
        self
    }

    /// Radius of influence.
    pub fn falloff(mut self, radius: f32) -> Self {
        self.light.falloff = radius;
        self
    }

    /// Cone of a spot light. The outer angle is clamped to at least the inner one.
    pub fn spot_light_cone(mut self, inner: f32, outer: f32) -> Self {
        self.light.spot_cone = (inner, outer.max(inner));
        self
    }

    /// Whether the light casts shadows.
    pub fn cast_shadows(mut self, enable: bool) -> Self {
        self.light.cast_shadows = enable;
        self
    }

    /// Finishes the light.
    pub fn build(self) -> Light {
        self.light
    }
}

/// Owns the lights of every entity.
#[derive(Debug, Default)]
pub struct LightManager {
    store: ComponentStore<Light>,
}

impl LightManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a light to `entity`, replacing any previous one.
    pub fn create(&mut self, entity: Entity, light: Light) {
        self.store.insert(entity, light);
    }

    /// Borrows the light of `entity`.
    pub fn get(&self, entity: Entity) -> Option<&Light> {
        self.store.get(entity)
    }

    /// Mutably borrows the light of `entity`.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut Light> {
        self.store.get_mut(entity)
    }
}

impl ComponentManager for LightManager {
    fn name(&self) -> &'static str {
        "light"
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
