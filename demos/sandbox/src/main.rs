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

// Aurora Sandbox
// Builds a small scene on the noop backend and tears it down.

use anyhow::{Context, Result};
use aurora_engine::ecs::{LightBuilder, LightType, Projection, RenderableBuilder};
use aurora_engine::resources::{
    AttributeType, IndexBuffer, MaterialInstance, Renderer, Scene, Skybox, SwapChain,
    VertexAttribute, VertexBuffer, View,
};
use aurora_engine::{
    Backend, Engine, EngineConfig, FenceMode, FenceStatus, IndexType, Mat4, PrimitiveType,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
}

const VERTICES: &[Vertex] = &[
    Vertex {
        position: [0.0, 0.5, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
    },
];

const INDICES: &[u16] = &[0, 1, 2];

const FRAMES: usize = 3;

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::var("AURORA_CONFIG") {
        Ok(json) => EngineConfig::from_json(&json).context("invalid AURORA_CONFIG")?,
        Err(_) => EngineConfig {
            backend: Backend::Noop,
            ..Default::default()
        },
    };
    let mut engine = Engine::with_config(config).context("engine creation failed")?;
    let result = render(&mut engine);
    engine.terminate();
    result
}

fn render(engine: &mut Engine) -> Result<()> {
    // Geometry
    let vertices = engine.create(
        VertexBuffer::builder()
            .vertex_count(VERTICES.len() as u32)
            .buffer_count(1)
            .attribute(VertexAttribute::Position, 0, AttributeType::Float3, 0, 0),
    )?;
    let indices = engine.create(
        IndexBuffer::builder()
            .index_count(INDICES.len() as u32)
            .index_type(IndexType::U16),
    )?;
    engine.update(vertices, |vb, driver| {
        vb.set_buffer_at(driver, 0, bytemuck::cast_slice(VERTICES), 0)
    })??;
    engine.update(indices, |ib, driver| {
        ib.set_buffer(driver, bytemuck::cast_slice(INDICES), 0)
    })??;

    let material = engine
        .default_material()
        .context("engine has no default material")?;
    engine.update(material, |material, _| {
        material
            .default_instance_mut()
            .set_float("baseColor", &[0.8, 0.8, 0.8, 1.0])
    })??;
    let instance = engine.create(MaterialInstance::builder(material).name("triangle"))?;

    // Scene
    let triangle = engine.create_entity();
    engine.create_renderable(
        triangle,
        RenderableBuilder::new(1)
            .geometry(0, PrimitiveType::Triangles, vertices, indices)
            .material(0, instance),
    )?;
    let sun = engine.create_entity();
    engine.create_light(
        sun,
        LightBuilder::new(LightType::Sun)
            .direction([0.0, -1.0, -0.5])
            .cast_shadows(true)
            .build(),
    );
    let eye = engine.create_entity();
    engine.create_transform(eye, None, Mat4::from_translation(0.0, 0.0, 3.0));
    let camera = engine.create_camera(eye);
    camera.projection = Projection::Perspective {
        fov_degrees: 60.0,
        aspect: 16.0 / 9.0,
        near: 0.1,
        far: 100.0,
    };
    camera.set_exposure(16.0, 1.0 / 125.0, 100.0);

    let skybox = engine.create(Skybox::builder().color([0.1, 0.1, 0.2, 1.0]))?;
    let scene = engine.create(Scene::builder())?;
    let ibl = engine.default_indirect_light();
    engine.update(scene, |scene, _| {
        scene.add_entity(triangle);
        scene.add_entity(sun);
        scene.set_skybox(Some(skybox));
        scene.set_indirect_light(ibl);
    })?;
    let view = engine.create(View::builder().name("main"))?;
    engine.update(view, |view, _| {
        view.set_scene(Some(scene));
        view.set_camera(Some(eye));
    })?;
    let swap_chain = engine.create(SwapChain::builder())?;
    let renderer = engine.create(Renderer::builder())?;

    // Frames
    for _ in 0..FRAMES {
        let committed = engine.prepare();
        let frame = engine.update(renderer, |renderer, driver| renderer.begin_frame(driver))?;
        log::info!("frame {} ({} material instance(s) committed)", frame, committed);
        engine.flush();
    }
    let fence = engine.create_fence()?;
    if engine.wait_and_destroy_fence(fence, FenceMode::Flush)? != FenceStatus::ConditionSatisfied {
        log::warn!("fence was not reached");
    }

    // Teardown. The swap chain is left for the engine to reclaim.
    engine.destroy(renderer)?;
    engine.destroy(view)?;
    engine.destroy(scene)?;
    engine.destroy(skybox)?;
    engine.destroy_entity(triangle);
    engine.destroy_entity(sun);
    engine.destroy_entity(eye);
    engine.destroy(instance)?;
    engine.destroy(indices)?;
    engine.destroy(vertices)?;
    log::info!(
        "{:?} swap chain left alive, uptime {:?}",
        swap_chain,
        engine.uptime()
    );
    Ok(())
}
