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

use aurora_core::driver::DriverError;
use aurora_engine::resources::Texture;
use aurora_engine::{
    Backend, DriverThreadState, Engine, EngineError, EngineRegistry, ThreadingMode,
};
use common::{noop_engine, test_config, FailingPlatform};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

#[test]
fn test_create_then_terminate_joins_the_driver_thread() {
    // --- 1. ARRANGE ---
    let (engine, stats, registry) = noop_engine(ThreadingMode::Threaded);
    assert_eq!(registry.len(), 1);
    assert_eq!(engine.backend(), Backend::Noop);
    assert_eq!(engine.driver_state(), DriverThreadState::Running);

    // --- 2. ACT ---
    engine.terminate();

    // --- 3. ASSERT ---
    assert!(registry.is_empty());
    assert!(stats.is_terminated(), "driver should be terminated on shutdown");
    assert_eq!(stats.live_objects(), 0, "built-ins should all be destroyed");
    assert_eq!(stats.invalid_uses(), 0);
}

#[test]
fn test_driver_failure_registers_nothing() {
    for threading in [ThreadingMode::Threaded, ThreadingMode::SingleThreaded] {
        // --- 1. ARRANGE ---
        common::init_logger();
        let registry = Arc::new(EngineRegistry::new());

        // --- 2. ACT ---
        let result = Engine::builder()
            .config(test_config(threading))
            .platform(FailingPlatform)
            .registry(Arc::clone(&registry))
            .build();

        // --- 3. ASSERT ---
        assert!(matches!(
            result,
            Err(EngineError::DriverInitialization(DriverError::CreationFailed(_)))
        ));
        assert!(registry.is_empty(), "{:?}: no partial registration", threading);
    }
}

#[test]
fn test_unsupported_backend_is_reported() {
    let registry = Arc::new(EngineRegistry::new());
    let mut config = test_config(ThreadingMode::Threaded);
    config.backend = Backend::Vulkan;

    let result = Engine::builder()
        .config(config)
        .registry(Arc::clone(&registry))
        .build();

    assert!(matches!(
        result,
        Err(EngineError::DriverInitialization(DriverError::UnsupportedBackend(Backend::Vulkan)))
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_single_threaded_commands_run_on_execute() {
    // --- 1. ARRANGE ---
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::SingleThreaded);
    assert_eq!(stats.commands(), 0, "nothing runs before execute()");

    // --- 2. ACT ---
    engine.execute();
    let textures = stats.live_textures();
    let texture = engine.create(Texture::builder().width(8).height(8)).unwrap();
    engine.execute();

    // --- 3. ASSERT ---
    assert!(textures >= 2, "DFG table and default IBL are built in");
    assert_eq!(stats.live_textures(), textures + 1);
    assert!(engine.destroy(texture).unwrap());
    engine.terminate();
    assert_eq!(stats.live_objects(), 0);
    assert!(stats.is_terminated());
}

#[test]
#[should_panic(expected = "single-threaded")]
fn test_execute_is_refused_on_threaded_engines() {
    let (mut engine, _stats, _registry) = noop_engine(ThreadingMode::Threaded);
    engine.execute();
}

#[test]
fn test_flush_and_wait_is_a_cut_point() {
    let (mut engine, stats, _registry) = noop_engine(ThreadingMode::Threaded);
    engine.flush_and_wait();
    let before = stats.live_textures();

    let texture = engine.create(Texture::builder().width(4).height(4)).unwrap();
    engine.flush_and_wait();
    assert_eq!(stats.live_textures(), before + 1);

    engine.destroy(texture).unwrap();
    engine.flush_and_wait();
    assert_eq!(stats.live_textures(), before);
    engine.terminate();
}

#[test]
fn test_dropping_an_engine_shuts_it_down() {
    // --- 1. ARRANGE ---
    let (engine, stats, registry) = noop_engine(ThreadingMode::Threaded);

    // --- 2. ACT ---
    let dropped = panic::catch_unwind(AssertUnwindSafe(move || drop(engine)));

    // --- 3. ASSERT ---
    // Forgetting terminate() is a bug that debug builds report loudly.
    assert_eq!(dropped.is_err(), cfg!(debug_assertions));
    assert!(registry.is_empty());
    assert!(stats.is_terminated());
    assert_eq!(stats.live_objects(), 0);
}

#[test]
#[should_panic(expected = "after it's been destroyed")]
fn test_use_after_unregister_is_fatal() {
    let (mut engine, _stats, registry) = noop_engine(ThreadingMode::Threaded);
    registry.unregister(engine.id());

    engine.flush();
}

#[test]
#[should_panic(expected = "after it's been destroyed")]
fn test_reading_resources_after_unregister_is_fatal() {
    let (engine, _stats, registry) = noop_engine(ThreadingMode::SingleThreaded);
    registry.unregister(engine.id());

    engine.resource_count::<Texture>();
}

#[test]
#[should_panic(expected = "after it's been destroyed")]
fn test_mutable_transforms_after_unregister_are_fatal() {
    let (mut engine, _stats, registry) = noop_engine(ThreadingMode::Threaded);
    registry.unregister(engine.id());

    engine.transforms_mut();
}

#[test]
#[should_panic(expected = "after it's been destroyed")]
fn test_stream_data_after_unregister_is_fatal() {
    let (mut engine, _stats, registry) = noop_engine(ThreadingMode::Threaded);
    let range = engine.stream_alloc(16, 4).expect("space in the batch");
    registry.unregister(engine.id());

    engine.stream_data_mut(range);
}

#[test]
fn test_engines_are_independent() {
    let (first, first_stats, registry) = noop_engine(ThreadingMode::Threaded);
    let (second, second_stats, _) = noop_engine(ThreadingMode::SingleThreaded);

    first.terminate();

    assert!(registry.is_empty());
    assert!(first_stats.is_terminated());
    assert!(!second_stats.is_terminated());
    second.terminate();
    assert!(second_stats.is_terminated());
}
