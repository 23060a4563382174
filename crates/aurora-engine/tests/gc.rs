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

use aurora_core::driver::{IndexType, PrimitiveType};
use aurora_engine::ecs::{LightBuilder, LightType, RenderableBuilder};
use aurora_engine::resources::{
    AttributeType, Handle, IndexBuffer, VertexAttribute, VertexBuffer,
};
use aurora_engine::{Engine, Mat4, ThreadingMode};
use common::noop_engine;

fn quad(engine: &mut Engine) -> (Handle<VertexBuffer>, Handle<IndexBuffer>) {
    let vertices = engine
        .create(
            VertexBuffer::builder()
                .vertex_count(4)
                .buffer_count(1)
                .attribute(VertexAttribute::Position, 0, AttributeType::Float3, 0, 0),
        )
        .unwrap();
    let indices = engine
        .create(IndexBuffer::builder().index_count(6).index_type(IndexType::U16))
        .unwrap();
    (vertices, indices)
}

#[test]
fn test_gc_collects_components_of_dead_entities() {
    // --- 1. ARRANGE ---
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    let (vertices, indices) = quad(&mut engine);
    let entities = engine.entities_mut().create_many(8);
    for &entity in &entities {
        engine
            .create_renderable(
                entity,
                RenderableBuilder::new(1).geometry(0, PrimitiveType::Triangles, vertices, indices),
            )
            .unwrap();
        engine.create_light(entity, LightBuilder::new(LightType::Point).build());
        engine.create_camera(entity);
    }
    engine.flush_and_wait();
    assert_eq!(engine.component_counts(), (8, 8, 8, 8));
    assert_eq!(stats.live_render_primitives(), 9, "8 renderables plus the fullscreen triangle");

    // --- 2. ACT ---
    for &entity in &entities {
        engine.entities_mut().destroy(entity);
    }
    let removed = engine.gc();
    engine.flush_and_wait();

    // --- 3. ASSERT ---
    assert_eq!(removed, 32);
    assert_eq!(engine.component_counts(), (0, 0, 0, 0));
    assert_eq!(stats.live_render_primitives(), 1);
    assert_eq!(engine.gc(), 0, "nothing left to collect");
    engine.terminate();
}

#[test]
fn test_gc_keeps_components_of_live_entities() {
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    let alive = engine.create_entity();
    let dead = engine.create_entity();
    engine.create_camera(alive);
    engine.create_camera(dead);
    engine.create_transform(dead, Some(alive), Mat4::IDENTITY);

    engine.entities_mut().destroy(dead);
    let removed = engine.gc();

    assert_eq!(removed, 2);
    assert!(engine.camera(alive).is_some());
    assert!(engine.camera(dead).is_none());
    assert_eq!(engine.component_counts(), (0, 0, 0, 1));
    engine.terminate();
}

#[test]
fn test_destroy_entity_releases_primitives_immediately() {
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    let (vertices, indices) = quad(&mut engine);
    let entity = engine.create_entity();
    engine
        .create_renderable(
            entity,
            RenderableBuilder::new(2)
                .geometry(0, PrimitiveType::Triangles, vertices, indices)
                .geometry_range(1, PrimitiveType::Triangles, vertices, indices, 3, 3),
        )
        .unwrap();
    engine.execute();
    assert_eq!(stats.live_render_primitives(), 3);

    assert!(engine.destroy_entity(entity));
    assert!(!engine.destroy_entity(entity));
    engine.execute();

    assert_eq!(stats.live_render_primitives(), 1);
    assert_eq!(engine.component_counts(), (0, 0, 0, 0));
    assert_eq!(engine.gc(), 0);
    engine.terminate();
}
