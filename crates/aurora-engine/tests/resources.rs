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

mod common;

use aurora_core::driver::{IndexType, SamplerType};
use aurora_engine::resources::{
    AttributeType, Fence, IndexBuffer, IndirectLight, Material, MaterialInstance,
    MaterialPackage, RenderTarget, Renderer, ResourceError, Scene, Skybox, Stream, SwapChain,
    Texture, VertexAttribute, VertexBuffer, View,
};
use aurora_engine::{EngineError, FenceMode, FenceStatus, ThreadingMode};
use common::noop_engine;
use std::time::Duration;

#[test]
fn test_destroying_twice_is_reported_not_fatal() {
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let texture = engine.create(Texture::builder().width(16).height(16)).unwrap();

    assert!(engine.destroy(texture).unwrap());
    assert!(!engine.destroy(texture).unwrap(), "second destroy is a no-op");
    assert!(!engine.is_valid_resource(texture));

    engine.flush_and_wait();
    assert_eq!(stats.invalid_uses(), 0, "the driver never sees the second destroy");
    engine.terminate();
}

#[test]
fn test_material_with_instances_cannot_be_destroyed() {
    // --- 1. ARRANGE ---
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let material = engine
        .create(Material::builder(
            MaterialPackage::new("lit").parameter("baseColor", 16),
        ))
        .unwrap();
    let instance = engine
        .create(MaterialInstance::builder(material).name("red"))
        .unwrap();
    assert_eq!(engine.instances_of(material), &[instance]);

    // --- 2. ACT ---
    let refused = engine.destroy(material);

    // --- 3. ASSERT ---
    assert!(matches!(
        refused,
        Err(EngineError::Resource(ResourceError::MaterialInUse { instances: 1, .. }))
    ));
    assert!(engine.is_valid_resource(material), "nothing destroyed on refusal");

    assert!(engine.destroy(instance).unwrap());
    assert!(engine.instances_of(material).is_empty());
    assert!(engine.destroy(material).unwrap());
    engine.terminate();
}

#[test]
fn test_leaked_resources_are_reclaimed_on_shutdown() {
    // --- 1. ARRANGE ---
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let color = engine.create(Texture::builder().width(64).height(32)).unwrap();
    let cubemap = engine
        .create(
            Texture::builder()
                .width(8)
                .height(8)
                .sampler(SamplerType::Cubemap),
        )
        .unwrap();
    engine
        .create(
            VertexBuffer::builder()
                .vertex_count(4)
                .buffer_count(1)
                .attribute(VertexAttribute::Position, 0, AttributeType::Float3, 0, 0),
        )
        .unwrap();
    engine
        .create(IndexBuffer::builder().index_count(6).index_type(IndexType::U16))
        .unwrap();
    engine
        .create(IndirectLight::builder().reflections(cubemap))
        .unwrap();
    engine.create(Skybox::builder().environment(cubemap)).unwrap();
    engine.create(Scene::builder()).unwrap();
    engine.create(View::builder().name("main")).unwrap();
    engine.create(Renderer::builder()).unwrap();
    engine.create(RenderTarget::builder().color(color)).unwrap();
    engine.create(SwapChain::builder().native_window(0xdead)).unwrap();
    engine.create(Stream::builder().width(640).height(480)).unwrap();
    let material = engine
        .create(Material::builder(MaterialPackage::new("unlit")))
        .unwrap();
    engine.create(MaterialInstance::builder(material)).unwrap();
    engine.create_fence().unwrap();
    engine.flush_and_wait();
    assert!(stats.live_objects() > 0);

    // --- 2. ACT ---
    engine.terminate();

    // --- 3. ASSERT ---
    assert!(stats.is_terminated());
    assert_eq!(stats.live_objects(), 0, "every leaked object is destroyed");
    assert_eq!(stats.invalid_uses(), 0);
}

#[test]
fn test_heap_returns_to_baseline() {
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    let baseline = engine.heap_stats().live_objects;

    let scene = engine.create(Scene::builder()).unwrap();
    let view = engine.create(View::builder()).unwrap();
    assert_eq!(engine.heap_stats().live_objects, baseline + 2);

    engine.destroy(view).unwrap();
    engine.destroy(scene).unwrap();
    assert_eq!(engine.heap_stats().live_objects, baseline);
    engine.terminate();
}

#[test]
fn test_invalid_builders_register_nothing() {
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    let before = engine.resource_count::<Texture>();

    let result = engine.create(Texture::builder().width(0));

    assert!(matches!(
        result,
        Err(EngineError::Resource(ResourceError::InvalidArgument { .. }))
    ));
    assert_eq!(engine.resource_count::<Texture>(), before);
    assert!(engine.create(RenderTarget::builder()).is_err());
    engine.terminate();
}

#[test]
fn test_fence_is_reached_after_preceding_commands() {
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    engine.flush_and_wait();
    let textures = stats.live_textures();
    engine.create(Texture::builder().width(2).height(2)).unwrap();
    let fence = engine.create_fence().unwrap();

    let status = engine.wait_and_destroy_fence(fence, FenceMode::Flush).unwrap();

    assert_eq!(status, FenceStatus::ConditionSatisfied);
    assert_eq!(stats.live_textures(), textures + 1);
    assert!(!engine.is_valid_resource(fence));
    engine.terminate();
}

#[test]
fn test_single_threaded_fence_never_blocks() {
    // --- 1. ARRANGE ---
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    let fence = engine.create_fence().unwrap();

    // --- 2. ACT ---
    let pending = engine
        .wait_fence(fence, FenceMode::DontFlush, Some(Duration::from_secs(60)))
        .unwrap();
    let reached = engine.wait_fence(fence, FenceMode::Flush, None).unwrap();

    // --- 3. ASSERT ---
    assert_eq!(pending, FenceStatus::TimeoutExpired);
    assert_eq!(reached, FenceStatus::ConditionSatisfied);
    assert_eq!(
        engine.get::<Fence>(fence).map(Fence::status),
        Some(FenceStatus::ConditionSatisfied)
    );
    engine.terminate();
}

#[test]
fn test_waiting_on_a_destroyed_fence_fails() {
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let fence = engine.create_fence().unwrap();
    engine.destroy(fence).unwrap();

    let result = engine.wait_fence(fence, FenceMode::Flush, None);

    assert!(matches!(
        result,
        Err(EngineError::Resource(ResourceError::UnknownResource { .. }))
    ));
    engine.terminate();
}

#[test]
fn test_stream_alloc_feeds_buffer_updates() {
    // --- 1. ARRANGE ---
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let limit = engine.config().stream_alloc_limit;
    let indices = engine
        .create(IndexBuffer::builder().index_count(3).index_type(IndexType::U16))
        .unwrap();

    // --- 2. ACT ---
    let too_big = engine.stream_alloc(limit + 1, 8);
    let misaligned = engine.stream_alloc(16, 3);
    let range = engine.stream_alloc(6, 16).expect("space in the current batch");
    engine
        .stream_data_mut(range)
        .copy_from_slice(&[0, 0, 1, 0, 2, 0]);
    engine
        .update(indices, |ib, driver| ib.set_buffer_range(driver, range, 0))
        .unwrap()
        .unwrap();
    engine.flush_and_wait();

    // --- 3. ASSERT ---
    assert!(too_big.is_none());
    assert!(misaligned.is_none());
    assert_eq!(range.offset % 16, 0);
    assert_eq!(range.len, 6);
    assert_eq!(stats.invalid_uses(), 0);
    engine.terminate();
}

#[test]
fn test_prepare_commits_modified_instances_once() {
    // --- 1. ARRANGE ---
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    engine.prepare();
    let material = engine
        .create(Material::builder(
            MaterialPackage::new("lit").parameter("roughness", 4),
        ))
        .unwrap();
    let first = engine.create(MaterialInstance::builder(material)).unwrap();
    engine.create(MaterialInstance::builder(material)).unwrap();
    assert_eq!(
        engine.prepare(),
        3,
        "new instances and the default instance start dirty"
    );

    // --- 2. ACT ---
    engine
        .update(first, |instance, _| instance.set_float("roughness", &[0.5]))
        .unwrap()
        .unwrap();
    let after_instance_edit = engine.prepare();
    engine
        .update(material, |material, _| {
            material.default_instance_mut().set_float("roughness", &[0.25])
        })
        .unwrap()
        .unwrap();
    let after_default_edit = engine.prepare();

    // --- 3. ASSERT ---
    assert_eq!(after_instance_edit, 1);
    assert_eq!(after_default_edit, 1);
    assert_eq!(engine.prepare(), 0);
    engine.terminate();
}

#[test]
fn test_skybox_material_is_created_once() {
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::Threaded);
    assert!(engine.skybox_material().is_none());

    let first = engine.create(Skybox::builder()).unwrap();
    let second = engine.create(Skybox::builder().intensity(1_000.0)).unwrap();
    let material = engine.skybox_material().expect("created by the first skybox");

    assert_eq!(engine.get(first).map(Skybox::material), Some(material));
    assert_eq!(engine.get(second).map(Skybox::material), Some(material));
    engine.destroy(first).unwrap();
    engine.destroy(second).unwrap();
    assert!(engine.is_valid_resource(material), "kept until shutdown");
    engine.terminate();
}

#[test]
fn test_skybox_material_outlives_its_skyboxes() {
    // --- 1. ARRANGE ---
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let skybox = engine.create(Skybox::builder()).unwrap();
    let material = engine.skybox_material().unwrap();

    // --- 2. ACT ---
    let refused = engine.destroy(material);
    engine.destroy(skybox).unwrap();
    let destroyed = engine.destroy(material);

    // --- 3. ASSERT ---
    assert!(matches!(
        refused,
        Err(EngineError::Resource(ResourceError::SkyboxMaterialInUse { skyboxes: 1, .. }))
    ));
    assert!(matches!(destroyed, Ok(true)));
    assert!(engine.skybox_material().is_none());
    let replacement = engine.create(Skybox::builder()).unwrap();
    assert!(engine.skybox_material().is_some_and(|m| m != material));
    engine.destroy(replacement).unwrap();
    engine.flush_and_wait();
    assert_eq!(stats.invalid_uses(), 0);
    engine.terminate();
}

#[test]
fn test_builtins_exist_for_the_engine_lifetime() {
    let (engine, _stats, _registry) = noop_engine(ThreadingMode::Threaded);

    let material = engine.default_material().unwrap();
    let ibl = engine.default_indirect_light().unwrap();

    assert!(engine.is_valid_resource(material));
    assert_eq!(engine.get(ibl).map(IndirectLight::intensity), Some(1.0));
    engine.terminate();
}
