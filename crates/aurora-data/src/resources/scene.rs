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

//! Scenes, views, renderers and skyboxes.

use super::{
    BuildContext, Handle, IndirectLight, Material, Resource, ResourceBuilder, ResourceError,
    ResourceType, Texture,
};
use aurora_core::command::DriverApi;
use aurora_core::driver::{BufferHandle, BufferUsage, SamplerType};
use aurora_core::Entity;
use std::collections::BTreeSet;

/// Size of the per-view uniform block.
const VIEW_UNIFORMS_SIZE: u32 = 256;
/// Size of the per-frame uniform block of a renderer.
const FRAME_UNIFORMS_SIZE: u32 = 64;
/// Size of the skybox uniform block.
const SKYBOX_UNIFORMS_SIZE: u32 = 32;

/// Builds a [`Scene`].
#[derive(Debug, Clone, Default)]
pub struct SceneBuilder;

impl ResourceBuilder for SceneBuilder {
    type Output = Scene;

    fn build(self, _ctx: &mut BuildContext<'_>) -> Result<Scene, ResourceError> {
        Ok(Scene::default())
    }
}

/// A set of entities to render, plus their environment.
#[derive(Debug, Default)]
pub struct Scene {
    entities: BTreeSet<Entity>,
    skybox: Option<Handle<Skybox>>,
    indirect_light: Option<Handle<IndirectLight>>,
}

impl Scene {
    /// Starts building a scene.
    pub fn builder() -> SceneBuilder {
        SceneBuilder
    }

    /// Adds an entity. Returns `false` if it was already in the scene.
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        self.entities.insert(entity)
    }

    /// Removes an entity. Returns `false` if it was not in the scene.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        self.entities.remove(&entity)
    }

    /// Returns `true` if the entity is in the scene.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Number of entities in the scene.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities in the scene.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Sets or clears the skybox.
    pub fn set_skybox(&mut self, skybox: Option<Handle<Skybox>>) {
        self.skybox = skybox;
    }

    /// The skybox.
    pub fn skybox(&self) -> Option<Handle<Skybox>> {
        self.skybox
    }

    /// Sets or clears the image based light.
    pub fn set_indirect_light(&mut self, light: Option<Handle<IndirectLight>>) {
        self.indirect_light = light;
    }

    /// The image based light.
    pub fn indirect_light(&self) -> Option<Handle<IndirectLight>> {
        self.indirect_light
    }
}

impl Resource for Scene {
    const TYPE: ResourceType = ResourceType::Scene;

    fn terminate(&mut self, _driver: &mut DriverApi) {
        self.entities.clear();
    }
}

impl_managed!(Scene, scenes);

/// The region of a render target a view draws into.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub left: i32,
    pub bottom: i32,
    pub width: u32,
    pub height: u32,
}

/// Builds a [`View`].
#[derive(Debug, Clone, Default)]
pub struct ViewBuilder {
    name: Option<String>,
}

impl ViewBuilder {
    /// Names the view for diagnostics.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl ResourceBuilder for ViewBuilder {
    type Output = View;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<View, ResourceError> {
        Ok(View {
            name: self.name.unwrap_or_default(),
            scene: None,
            camera: None,
            viewport: Viewport::default(),
            uniforms: ctx
                .driver
                .create_buffer(BufferUsage::Uniform, VIEW_UNIFORMS_SIZE),
        })
    }
}

/// What to render (a scene), from where (a camera entity) and where to (a viewport).
#[derive(Debug)]
pub struct View {
    name: String,
    scene: Option<Handle<Scene>>,
    camera: Option<Entity>,
    viewport: Viewport,
    uniforms: BufferHandle,
}

impl View {
    /// Starts building a view.
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    /// Name of the view.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the scene to render.
    pub fn set_scene(&mut self, scene: Option<Handle<Scene>>) {
        self.scene = scene;
    }

    /// The scene to render.
    pub fn scene(&self) -> Option<Handle<Scene>> {
        self.scene
    }

    /// Sets the camera entity.
    pub fn set_camera(&mut self, camera: Option<Entity>) {
        self.camera = camera;
    }

    /// The camera entity.
    pub fn camera(&self) -> Option<Entity> {
        self.camera
    }

    /// Sets the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// The viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
}

impl Resource for View {
    const TYPE: ResourceType = ResourceType::View;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_buffer(self.uniforms);
    }
}

impl_managed!(View, views);

/// Builds a [`Renderer`].
#[derive(Debug, Clone, Default)]
pub struct RendererBuilder;

impl ResourceBuilder for RendererBuilder {
    type Output = Renderer;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Renderer, ResourceError> {
        Ok(Renderer {
            frame_id: 0,
            frame_uniforms: ctx
                .driver
                .create_buffer(BufferUsage::Uniform, FRAME_UNIFORMS_SIZE),
        })
    }
}

/// Drives frames for one swap chain.
#[derive(Debug)]
pub struct Renderer {
    frame_id: u64,
    frame_uniforms: BufferHandle,
}

impl Renderer {
    /// Starts building a renderer.
    pub fn builder() -> RendererBuilder {
        RendererBuilder
    }

    /// Number of frames begun so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Starts a new frame and returns its id.
    pub fn begin_frame(&mut self, driver: &mut DriverApi) -> u64 {
        self.frame_id += 1;
        driver.update_buffer(self.frame_uniforms, 0, &self.frame_id.to_le_bytes());
        self.frame_id
    }
}

impl Resource for Renderer {
    const TYPE: ResourceType = ResourceType::Renderer;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_buffer(self.frame_uniforms);
    }
}

impl_managed!(Renderer, renderers);

/// Builds a [`Skybox`].
#[derive(Debug, Clone)]
pub struct SkyboxBuilder {
    environment: Option<Handle<Texture>>,
    color: [f32; 4],
    intensity: f32,
    show_sun: bool,
}

impl Default for SkyboxBuilder {
    fn default() -> Self {
        Self {
            environment: None,
            color: [0.0, 0.0, 0.0, 1.0],
            intensity: 30_000.0,
            show_sun: false,
        }
    }
}

impl SkyboxBuilder {
    /// Cubemap drawn as the background.
    pub fn environment(mut self, cubemap: Handle<Texture>) -> Self {
        self.environment = Some(cubemap);
        self
    }

    /// Solid color used when there is no environment.
    pub fn color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Brightness of the environment, in lux.
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Draws the sun disk of the directional light.
    pub fn show_sun(mut self, show: bool) -> Self {
        self.show_sun = show;
        self
    }
}

impl ResourceBuilder for SkyboxBuilder {
    type Output = Skybox;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Skybox, ResourceError> {
        if let Some(environment) = self.environment {
            if ctx.lists.require(environment)?.sampler() != SamplerType::Cubemap {
                return Err(ResourceError::invalid(
                    ResourceType::Skybox,
                    "environment must be a cubemap",
                ));
            }
        }
        let material = ctx.skybox_material()?;
        let uniforms = ctx
            .driver
            .create_buffer(BufferUsage::Uniform, SKYBOX_UNIFORMS_SIZE);

        let mut skybox = Skybox {
            material,
            environment: self.environment,
            color: self.color,
            intensity: self.intensity,
            show_sun: self.show_sun,
            uniforms,
        };
        skybox.upload(ctx.driver);
        Ok(skybox)
    }
}

/// The background of a scene.
#[derive(Debug)]
pub struct Skybox {
    material: Handle<Material>,
    environment: Option<Handle<Texture>>,
    color: [f32; 4],
    intensity: f32,
    show_sun: bool,
    uniforms: BufferHandle,
}

impl Skybox {
    /// Starts building a skybox.
    pub fn builder() -> SkyboxBuilder {
        SkyboxBuilder::default()
    }

    /// The shared skybox material.
    pub fn material(&self) -> Handle<Material> {
        self.material
    }

    /// The environment cubemap.
    pub fn environment(&self) -> Option<Handle<Texture>> {
        self.environment
    }

    /// Changes the brightness and uploads it.
    pub fn set_intensity(&mut self, driver: &mut DriverApi, intensity: f32) {
        self.intensity = intensity;
        self.upload(driver);
    }

    /// Brightness in lux.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    fn upload(&mut self, driver: &mut DriverApi) {
        let mut bytes = Vec::with_capacity(SKYBOX_UNIFORMS_SIZE as usize);
        bytes.extend(self.color.iter().flat_map(|c| c.to_le_bytes()));
        bytes.extend(self.intensity.to_le_bytes());
        bytes.extend(u32::from(self.show_sun).to_le_bytes());
        driver.update_buffer(self.uniforms, 0, &bytes);
    }
}

impl Resource for Skybox {
    const TYPE: ResourceType = ResourceType::Skybox;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_buffer(self.uniforms);
    }
}

impl_managed!(Skybox, skyboxes);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::HeapAllocator;
    use crate::resources::{ResourceLists, TextureBuilder};
    use aurora_core::command::{CallbackTable, CommandBufferQueue, CommandStream};
    use std::sync::Arc;

    #[test]
    fn test_skyboxes_share_a_lazily_created_material() {
        let queue = Arc::new(CommandBufferQueue::single_threaded(1024, 64 * 1024));
        let mut driver = CommandStream::new(queue, Arc::new(CallbackTable::new()));
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        assert!(ctx.lists.skybox_material().is_none());
        let first = ctx.create(Skybox::builder()).unwrap();
        let second = ctx.create(Skybox::builder().color([1.0, 0.0, 0.0, 1.0])).unwrap();

        let material = lists.skybox_material().expect("created on first skybox");
        assert_eq!(lists.get(first).unwrap().material(), material);
        assert_eq!(lists.get(second).unwrap().material(), material);
        assert_eq!(lists.len::<Material>(), 1);
    }

    #[test]
    fn test_skybox_environment_must_be_a_cubemap() {
        let queue = Arc::new(CommandBufferQueue::single_threaded(1024, 64 * 1024));
        let mut driver = CommandStream::new(queue, Arc::new(CallbackTable::new()));
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        let flat = ctx.create(TextureBuilder::default().width(4).height(4)).unwrap();
        let result = ctx.create(Skybox::builder().environment(flat));
        assert!(matches!(
            result,
            Err(ResourceError::InvalidArgument {
                kind: ResourceType::Skybox,
                ..
            })
        ));
        assert!(ctx.lists.skybox_material().is_none());
    }

    #[test]
    fn test_skybox_material_is_pinned_while_skyboxes_live() {
        // ARRANGE
        let queue = Arc::new(CommandBufferQueue::single_threaded(1024, 64 * 1024));
        let mut driver = CommandStream::new(queue, Arc::new(CallbackTable::new()));
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);
        let skybox = ctx.create(Skybox::builder()).unwrap();
        let material = lists.skybox_material().unwrap();

        // ACT
        let refused = lists.check_destroy(material);
        let removed = lists.remove(skybox).unwrap();
        heap.destroy(removed);

        // ASSERT
        assert!(matches!(
            refused,
            Err(ResourceError::SkyboxMaterialInUse { skyboxes: 1, .. })
        ));
        assert!(lists.check_destroy(material).is_ok());
    }
}
