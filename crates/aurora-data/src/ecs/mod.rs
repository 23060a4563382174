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

//! Entities and the component managers attached to them.
//!
//! Entities live in the [`EntityManager`]. Each component manager keeps its
//! own dense [`ComponentStore`] keyed by entity and is swept by
//! [`ComponentManager::gc`] once its owners are gone.

mod component_store;
pub mod components;
mod entity_manager;
mod manager;

pub use component_store::ComponentStore;
pub use components::{
    BoundingBox, Camera, CameraManager, Light, LightBuilder, LightManager, LightType, Projection,
    RenderPrimitive, Renderable, RenderableBuilder, RenderableManager, Transform,
    TransformManager,
};
pub use entity_manager::EntityManager;
pub use manager::ComponentManager;
